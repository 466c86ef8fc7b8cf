use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("Package not found: {0}")]
    NotFound(String),
    #[error("Installation failed: {0}")]
    InstallFailed(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Package manager unavailable: {0}")]
    Unavailable(String),
}

/// Native OS package manager (apt, apk, ...).
pub trait PackageManager {
    fn is_installed(&self, package: &str) -> Result<bool, PackageError>;

    /// Installs every package in a single invocation, then purges the
    /// package manager's caches in that same invocation.
    fn install_all(&self, packages: &[String]) -> Result<(), PackageError>;
}
