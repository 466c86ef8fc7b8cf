use berth::application::BuildFailure;
use berth::domain::ports::installer::InstallError;
use berth::domain::BuildError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("No build descriptor found in {}", .0.display())]
    DescriptorNotFound(PathBuf),

    #[error("Build descriptor {} is invalid: {reason}", path.display())]
    DescriptorParse { path: PathBuf, reason: String },

    #[error("Build descriptor has {0} error(s)")]
    InvalidDescriptor(usize),

    #[error("{} already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Could not determine a home directory")]
    NoHome,

    #[error(transparent)]
    Build(#[from] BuildFailure),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Returns a themed, actionable suggestion for the error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            CliError::DescriptorNotFound(_) => Some(
                "Run `berth init` to create berth.toml, or point at one with -f <path>."
                    .to_string(),
            ),
            CliError::DescriptorParse { .. } => Some(
                "Check field names against `berth schema`; unknown fields are rejected."
                    .to_string(),
            ),
            CliError::InvalidDescriptor(_) => {
                Some("Fix the errors above, then run `berth check` again.".to_string())
            }
            CliError::AlreadyExists(_) => Some("Pass --force to overwrite it.".to_string()),
            CliError::NoHome => Some("Set BERTH_HOME to a writable directory.".to_string()),
            CliError::Build(failure) => build_suggestion(&failure.error),
            CliError::Io(_) => None,
        }
    }

    pub fn render(&self) {
        eprintln!("\n{} {}", console::style("Error:").red().bold(), self);
        if let CliError::Build(failure) = self {
            let completed: Vec<&str> = failure.completed.iter().map(|s| s.label()).collect();
            if !completed.is_empty() {
                eprintln!(
                    "{} {}",
                    console::style("  completed:").dim(),
                    completed.join(", ")
                );
            }
        }
        if let Some(s) = self.suggestion() {
            eprintln!("{} {}", console::style("  help:").dim(), s);
        }
    }
}

fn build_suggestion(error: &BuildError) -> Option<String> {
    let text = match error {
        BuildError::EnvironmentResolution { .. } => {
            "Install an interpreter matching the pinned base (e.g. python3.10) and put it on PATH."
        }
        BuildError::NativeDependencyInstall(_) => {
            "Check the system-packages names and that the package mirrors are reachable."
        }
        BuildError::ManifestDependencyInstall(InstallError::Compilation { .. }) => {
            "A native extension failed to build; add its headers (e.g. default-libmysqlclient-dev) to system-packages."
        }
        BuildError::ManifestDependencyInstall(InstallError::NotFound(_)) => {
            "Check the package name and version pin in the dependency manifest."
        }
        BuildError::ManifestParse(_) => "Fix the line reported above in the dependency manifest.",
        BuildError::Network(_) => {
            "The entrypoint must bind 0.0.0.0 on the same port as `expose`."
        }
        BuildError::Launch(_) => {
            "Check that the entrypoint program exists in the working directory or on PATH."
        }
        BuildError::Workdir { .. } => "Pass --workdir to build into a writable directory.",
        _ => return None,
    };
    Some(text.to_string())
}

/// Prints any error from a command, themed when it is one of ours.
pub fn report(err: &anyhow::Error) {
    match err.downcast_ref::<CliError>() {
        Some(cli) => cli.render(),
        None => {
            eprintln!("\n{} {}", console::style("Error:").red().bold(), err);
            for cause in err.chain().skip(1) {
                eprintln!("{} {}", console::style("  caused by:").dim(), cause);
            }
        }
    }
}
