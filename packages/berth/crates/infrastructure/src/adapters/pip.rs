use domain::entities::environment::ResolvedEnvironment;
use domain::entities::requirements::Requirement;
use domain::ports::installer::{DependencyInstaller, InstallError};
use std::path::Path;
use std::process::Command;

use super::command::{self, tail};

/// Installs Python dependencies with the resolved interpreter's own pip.
pub struct PipAdapter;

impl PipAdapter {
    pub fn new() -> Self {
        Self
    }

    fn pip(env: &ResolvedEnvironment) -> Command {
        let mut cmd = Command::new(&env.interpreter);
        cmd.args(["-m", "pip"])
            .arg("--disable-pip-version-check")
            .env("PIP_NO_INPUT", "1");
        cmd
    }
}

impl Default for PipAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyInstaller for PipAdapter {
    fn resolve(
        &self,
        env: &ResolvedEnvironment,
        requirement: &Requirement,
    ) -> Result<(), InstallError> {
        let output = command::run(
            Self::pip(env)
                .args(["install", "--dry-run", "--no-deps", "--quiet", "--no-cache-dir"])
                .arg(&requirement.raw),
        )
        .map_err(|e| InstallError::Unavailable(e.to_string()))?;

        if output.success {
            Ok(())
        } else {
            Err(classify_pip_failure(&output.stderr, &requirement.name))
        }
    }

    fn install(
        &self,
        env: &ResolvedEnvironment,
        manifest: &Path,
        target: &Path,
    ) -> Result<(), InstallError> {
        tracing::info!(manifest = %manifest.display(), target = %target.display(), "pip install");

        let output = command::run(
            Self::pip(env)
                .args(["install", "--no-cache-dir", "--target"])
                .arg(target)
                .arg("-r")
                .arg(manifest),
        )
        .map_err(|e| InstallError::Unavailable(e.to_string()))?;

        if output.success {
            Ok(())
        } else {
            Err(classify_pip_failure(&output.stderr, "requirements"))
        }
    }
}

/// Maps pip's stderr onto the installer error taxonomy.
pub fn classify_pip_failure(stderr: &str, fallback: &str) -> InstallError {
    const NO_DIST: &str = "No matching distribution found for ";
    const BUILD_FAILED: [&str; 3] = [
        "Failed building wheel for ",
        "Failed to build ",
        "Building wheel for ",
    ];

    if let Some(idx) = stderr.find(NO_DIST) {
        let name = stderr[idx + NO_DIST.len()..]
            .split_whitespace()
            .next()
            .unwrap_or(fallback);
        return InstallError::NotFound(name.to_string());
    }

    let compile_markers = [
        "error: command '",
        "Failed building wheel",
        "Failed to build",
        "mysql_config not found",
        "pkg-config: not found",
        "Python.h: No such file",
        "ffi.h: No such file",
    ];
    if compile_markers.iter().any(|m| stderr.contains(m)) {
        let package = BUILD_FAILED
            .iter()
            .find_map(|marker| {
                let idx = stderr.find(marker)?;
                stderr[idx + marker.len()..]
                    .split(|c: char| c.is_whitespace() || c == '(')
                    .next()
            })
            .filter(|p| !p.is_empty())
            .unwrap_or(fallback);
        return InstallError::Compilation {
            package: package.to_string(),
            detail: tail(stderr, 4),
        };
    }

    InstallError::Failed(tail(stderr, 5))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_missing_distribution() {
        let stderr = "ERROR: Could not find a version that satisfies the requirement djangoo (from versions: none)\nERROR: No matching distribution found for djangoo\n";
        match classify_pip_failure(stderr, "x") {
            InstallError::NotFound(name) => assert_eq!(name, "djangoo"),
            other => panic!("Expected NotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_native_build_failure() {
        let stderr = "  Building wheel for mysqlclient (pyproject.toml): finished with status 'error'\n  error: subprocess-exited-with-error\n  /bin/sh: 1: mysql_config: not found\n  mysql_config not found\nERROR: Failed building wheel for mysqlclient\n";
        match classify_pip_failure(stderr, "requirements") {
            InstallError::Compilation { package, .. } => assert_eq!(package, "mysqlclient"),
            other => panic!("Expected Compilation, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_other_failure() {
        assert!(matches!(
            classify_pip_failure("ERROR: network down\n", "requirements"),
            InstallError::Failed(_)
        ));
    }
}
