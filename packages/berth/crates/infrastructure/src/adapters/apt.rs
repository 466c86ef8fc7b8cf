use domain::ports::package_manager::{PackageError, PackageManager};
use std::fs;
use std::path::PathBuf;
use std::process::Command;

use super::command::{self, tail};

const APT_LISTS: &str = "/var/lib/apt/lists";

pub struct AptAdapter {
    lists_dir: PathBuf,
}

impl AptAdapter {
    pub fn new() -> Self {
        Self {
            lists_dir: PathBuf::from(APT_LISTS),
        }
    }

    fn apt_get(&self) -> Result<PathBuf, PackageError> {
        which::which("apt-get").map_err(|e| PackageError::Unavailable(format!("apt-get: {}", e)))
    }

    /// `rm -rf /var/lib/apt/lists/*`
    fn purge_lists(&self) -> Result<(), PackageError> {
        let entries = match fs::read_dir(&self.lists_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(PackageError::InstallFailed(e.to_string())),
        };

        for entry in entries {
            let path = entry
                .map_err(|e| PackageError::InstallFailed(e.to_string()))?
                .path();
            let removed = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            removed.map_err(|e| {
                PackageError::InstallFailed(format!("purging {}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }
}

impl Default for AptAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageManager for AptAdapter {
    fn is_installed(&self, package: &str) -> Result<bool, PackageError> {
        // dpkg-query exits non-zero for unknown packages, which just means "not installed"
        let output = command::run(
            Command::new("dpkg-query")
                .arg("-W")
                .arg("-f=${Status}")
                .arg(package),
        )
        .map_err(|e| PackageError::Unavailable(format!("dpkg-query: {}", e)))?;

        Ok(output.success && output.stdout.contains("install ok installed"))
    }

    fn install_all(&self, packages: &[String]) -> Result<(), PackageError> {
        if packages.is_empty() {
            return Ok(());
        }
        let apt_get = self.apt_get()?;

        tracing::info!(count = packages.len(), "apt-get install");

        let update = command::run(
            Command::new(&apt_get)
                .arg("update")
                .env("DEBIAN_FRONTEND", "noninteractive"),
        )
        .map_err(|e| PackageError::InstallFailed(e.to_string()))?;
        if !update.success {
            return Err(classify_apt_failure(&update.stderr));
        }

        let install = command::run(
            Command::new(&apt_get)
                .args(["install", "-y", "--no-install-recommends"])
                .args(packages)
                .env("DEBIAN_FRONTEND", "noninteractive"),
        )
        .map_err(|e| PackageError::InstallFailed(e.to_string()))?;
        if !install.success {
            return Err(classify_apt_failure(&install.stderr));
        }

        self.purge_lists()
    }
}

fn classify_apt_failure(stderr: &str) -> PackageError {
    const NOT_FOUND: &str = "Unable to locate package ";

    if let Some(idx) = stderr.find(NOT_FOUND) {
        let name = stderr[idx + NOT_FOUND.len()..]
            .split_whitespace()
            .next()
            .unwrap_or_default();
        return PackageError::NotFound(name.to_string());
    }

    if stderr.contains("Temporary failure resolving")
        || stderr.contains("Could not resolve")
        || stderr.contains("Failed to fetch")
    {
        return PackageError::NetworkError(tail(stderr, 3));
    }

    PackageError::InstallFailed(tail(stderr, 5))
}
