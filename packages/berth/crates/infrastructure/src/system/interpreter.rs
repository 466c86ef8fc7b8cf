use domain::entities::environment::ResolvedEnvironment;
use domain::manifest::BaseEnvironment;
use domain::ports::resolver::{EnvironmentResolver, ResolveError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::adapters::command;

/// Resolves a base environment to an interpreter on `PATH`.
///
/// For `python:3.10-slim` the candidates are `python3.10`, `python3` and
/// `python`, in that order; the first whose `--version` matches the pin wins.
pub struct InterpreterResolver {
    search_path: Option<OsString>,
}

impl InterpreterResolver {
    pub fn new() -> Self {
        Self { search_path: None }
    }

    /// Search `path` instead of the process `PATH`.
    pub fn with_search_path(path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(path.into()),
        }
    }

    fn candidates(runtime: &str, version: &str) -> Vec<String> {
        let mut names = vec![format!("{}{}", runtime, version)];
        if let Some(major) = version.split('.').next() {
            if major != version {
                names.push(format!("{}{}", runtime, major));
            }
        }
        names.push(runtime.to_string());
        names
    }

    fn locate(&self, name: &str) -> Option<PathBuf> {
        match &self.search_path {
            Some(paths) => {
                let cwd = std::env::current_dir().ok()?;
                which::which_in(name, Some(paths), cwd).ok()
            }
            None => which::which(name).ok(),
        }
    }

    fn probe_version(path: &Path) -> Result<String, ResolveError> {
        let output = command::run(Command::new(path).arg("--version")).map_err(|e| {
            ResolveError::Probe {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        // Some interpreters print their version on stderr.
        let text = if output.stdout.trim().is_empty() {
            output.stderr
        } else {
            output.stdout
        };
        parse_version(&text).ok_or_else(|| ResolveError::Probe {
            path: path.to_path_buf(),
            reason: format!("unrecognised version output '{}'", text.trim()),
        })
    }
}

impl Default for InterpreterResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvironmentResolver for InterpreterResolver {
    fn resolve(&self, base: &BaseEnvironment) -> Result<ResolvedEnvironment, ResolveError> {
        let runtime = base.runtime();
        let wanted = base
            .version()
            .ok_or_else(|| ResolveError::NotFound(base.to_string()))?;

        let mut mismatch = None;
        for name in Self::candidates(runtime, wanted) {
            let Some(path) = self.locate(&name) else {
                continue;
            };
            let found = Self::probe_version(&path)?;
            if ResolvedEnvironment::satisfies(wanted, &found) {
                tracing::info!(interpreter = %path.display(), version = %found, "resolved base environment");
                return Ok(ResolvedEnvironment::new(base.clone(), path, &found));
            }
            tracing::debug!(candidate = %path.display(), version = %found, "version mismatch");
            mismatch.get_or_insert(ResolveError::VersionMismatch {
                wanted: wanted.to_string(),
                found,
                path,
            });
        }

        Err(mismatch.unwrap_or_else(|| ResolveError::NotFound(runtime.to_string())))
    }
}

/// `Python 3.10.14` → `3.10.14`, `v20.11.0` → `20.11.0`.
fn parse_version(text: &str) -> Option<String> {
    text.split_whitespace()
        .map(|token| token.trim_start_matches('v'))
        .find(|token| {
            token.chars().next().is_some_and(|c| c.is_ascii_digit()) && token.contains('.')
        })
        .map(str::to_string)
}
