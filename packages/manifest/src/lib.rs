pub mod types;
pub use types::*;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Build descriptor with multi-format support (JSON, YAML, TOML).
///
/// Describes one service: the pinned base environment it runs on, the native
/// packages and third-party dependencies it needs, where its sources live at
/// runtime and how it is started.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct BuildDescriptor {
    /// Pinned base environment, written `name:tag` (e.g. `python:3.10-slim`).
    #[serde(default = "default_base")]
    #[schemars(with = "String")]
    pub base: BaseEnvironment,

    /// Working directory for both copied files and the running process.
    #[serde(default = "default_workdir")]
    pub workdir: PathBuf,

    /// Native OS packages, installed in the order listed.
    #[serde(default = "default_system_packages")]
    pub system_packages: Vec<String>,

    /// Dependency manifest, relative to the source tree.
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,

    /// File and directory names left out of the source copy.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// Port the entry command binds. Metadata only.
    #[serde(default = "default_expose")]
    pub expose: u16,

    /// Argument vector used to start the service.
    #[serde(default)]
    pub entrypoint: EntryCommand,

    /// Optional `KEY=VALUE` file loaded into the launched process environment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env_file: Option<PathBuf>,

    /// Interpreter behaviour flags applied to the launched process.
    #[serde(default)]
    pub runtime: RuntimeFlags,
}

impl BuildDescriptor {
    /// Bind address embedded in the entry command, checked against `expose`.
    pub fn checked_bind(&self) -> Result<BindAddress, BindError> {
        let bind = self.entrypoint.bind_address()?;
        if !bind.is_wildcard() {
            return Err(BindError::NotWildcard(bind.to_string()));
        }
        if bind.port != self.expose {
            return Err(BindError::PortMismatch {
                exposed: self.expose,
                bound: bind.port,
            });
        }
        Ok(bind)
    }
}

impl Default for BuildDescriptor {
    fn default() -> Self {
        Self {
            base: default_base(),
            workdir: default_workdir(),
            system_packages: default_system_packages(),
            manifest: default_manifest(),
            ignore: default_ignore(),
            expose: default_expose(),
            entrypoint: EntryCommand::default(),
            env_file: None,
            runtime: RuntimeFlags::default(),
        }
    }
}

fn default_base() -> BaseEnvironment {
    BaseEnvironment::new("python", Some("3.10-slim"))
}

fn default_workdir() -> PathBuf {
    PathBuf::from("/app")
}

fn default_system_packages() -> Vec<String> {
    [
        "gcc",
        "musl-dev",
        "default-libmysqlclient-dev",
        "pkg-config",
        "libffi-dev",
        "make",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_manifest() -> PathBuf {
    PathBuf::from("requirements.txt")
}

fn default_ignore() -> Vec<String> {
    [".git", "__pycache__", ".venv", ".berth", "target"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_expose() -> u16 {
    8000
}
