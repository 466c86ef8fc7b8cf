use std::path::Path;
use thiserror::Error;

use crate::entities::environment::ResolvedEnvironment;
use crate::entities::requirements::Requirement;

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("no distribution found for '{0}'")]
    NotFound(String),
    #[error("'{package}' failed to compile: {detail}")]
    Compilation { package: String, detail: String },
    #[error("{0}")]
    Failed(String),
    #[error("installer unavailable: {0}")]
    Unavailable(String),
}

/// Third-party dependency installer (pip for Python bases).
pub trait DependencyInstaller {
    /// Checks a single requirement can be resolved without installing it.
    fn resolve(&self, env: &ResolvedEnvironment, requirement: &Requirement)
        -> Result<(), InstallError>;

    /// Installs everything listed in `manifest` into the isolated `target` directory.
    fn install(
        &self,
        env: &ResolvedEnvironment,
        manifest: &Path,
        target: &Path,
    ) -> Result<(), InstallError>;
}
