//! Renders a build descriptor as a container build file.
//!
//! The rendered file follows the same stage order as the local pipeline:
//!
//! ```text
//! FROM        base environment
//! ENV         runtime flags
//! WORKDIR     working directory
//! RUN         system packages + cache purge (one layer)
//! COPY        dependency manifest only
//! RUN         dependency install
//! COPY . .    source tree
//! EXPOSE      declared port
//! CMD         entry command (exec form)
//! ```

use berth_manifest::BuildDescriptor;
use std::fmt::Write as _;
use std::path::{Component, Path};

const APT_CACHE_DIR: &str = "/var/lib/apt/lists/*";

pub struct DockerfileGenerator<'a> {
    descriptor: &'a BuildDescriptor,
}

impl<'a> DockerfileGenerator<'a> {
    pub fn new(descriptor: &'a BuildDescriptor) -> Self {
        Self { descriptor }
    }

    pub fn render(&self) -> String {
        let d = self.descriptor;
        let mut out = String::new();

        let _ = writeln!(out, "FROM {}", d.base);
        out.push('\n');

        for (key, value) in d.runtime.env_vars() {
            let _ = writeln!(out, "ENV {}={}", key, value);
        }
        let _ = writeln!(out, "WORKDIR {}", unix_path(&d.workdir));
        out.push('\n');

        if !d.system_packages.is_empty() {
            let _ = writeln!(
                out,
                "RUN apt-get update \\\n    && apt-get install -y --no-install-recommends {} \\\n    && rm -rf {}",
                d.system_packages.join(" "),
                APT_CACHE_DIR
            );
            out.push('\n');
        }

        let manifest = unix_path(&d.manifest);
        let _ = writeln!(out, "COPY {} {}", manifest, manifest_destination(&d.manifest));
        let _ = writeln!(out, "RUN pip install --no-cache-dir -r {}", manifest);
        out.push('\n');

        out.push_str("COPY . .\n\n");

        let _ = writeln!(out, "EXPOSE {}", d.expose);
        let _ = writeln!(out, "CMD {}", exec_form(&d.entrypoint.0));

        out
    }

    /// `.dockerignore` matching the local source copy's ignore list.
    pub fn render_ignore(&self) -> String {
        let mut out = String::new();
        for name in &self.descriptor.ignore {
            let _ = writeln!(out, "{}", name);
        }
        out
    }
}

/// `COPY requirements.txt .` for a top-level manifest, the same relative path otherwise.
fn manifest_destination(manifest: &Path) -> String {
    let nested = manifest
        .parent()
        .is_some_and(|p| p.components().any(|c| matches!(c, Component::Normal(_))));
    if nested {
        unix_path(manifest)
    } else {
        ".".to_string()
    }
}

fn unix_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// JSON array form so no shell sits between the runtime and the process.
fn exec_form(args: &[String]) -> String {
    serde_json::to_string(args).unwrap_or_else(|_| "[]".to_string())
}
