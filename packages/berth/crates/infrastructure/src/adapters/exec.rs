use domain::ports::launcher::{LaunchError, LaunchPlan, Launcher};
use std::io::ErrorKind;
use std::process::Command;

/// Hands the current process over to the entry command.
///
/// On Unix this is a real `exec`: the tool's PID, signals and exit code become
/// the served process's. Elsewhere the child is spawned and its exit code is
/// forwarded.
pub struct ExecLauncher;

impl ExecLauncher {
    pub fn new() -> Self {
        Self
    }

    fn command(plan: &LaunchPlan) -> Command {
        let mut cmd = Command::new(&plan.program);
        cmd.args(&plan.args)
            .current_dir(&plan.workdir)
            .envs(plan.env.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        cmd
    }

    fn map_error(plan: &LaunchPlan, source: std::io::Error) -> LaunchError {
        let program = plan.program.display().to_string();
        if source.kind() == ErrorKind::NotFound {
            LaunchError::NotFound(program)
        } else {
            LaunchError::Exec { program, source }
        }
    }
}

impl Default for ExecLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl Launcher for ExecLauncher {
    fn launch(&self, plan: &LaunchPlan) -> Result<(), LaunchError> {
        if !plan.workdir.is_dir() {
            return Err(LaunchError::NotFound(plan.workdir.display().to_string()));
        }

        tracing::info!(program = %plan.program.display(), args = ?plan.args, "handing off");
        let mut cmd = Self::command(plan);

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            // Only returns on failure.
            let err = cmd.exec();
            Err(Self::map_error(plan, err))
        }

        #[cfg(not(unix))]
        {
            let status = cmd.status().map_err(|e| Self::map_error(plan, e))?;
            std::process::exit(status.code().unwrap_or(1));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_program_reported() {
        let dir = tempfile::tempdir().unwrap();
        let plan = LaunchPlan {
            program: PathBuf::from("/nonexistent/berth-test-binary"),
            args: vec![],
            workdir: dir.path().to_path_buf(),
            env: vec![],
        };

        let err = ExecLauncher::new().launch(&plan).unwrap_err();
        assert!(matches!(err, LaunchError::NotFound(_)));
    }

    #[test]
    fn test_missing_workdir_reported() {
        let plan = LaunchPlan {
            program: PathBuf::from("true"),
            args: vec![],
            workdir: PathBuf::from("/nonexistent/berth-workdir"),
            env: vec![],
        };

        assert!(matches!(
            ExecLauncher::new().launch(&plan),
            Err(LaunchError::NotFound(_))
        ));
    }
}
