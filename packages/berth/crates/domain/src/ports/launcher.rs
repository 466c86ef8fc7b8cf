use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("entry command is empty")]
    EmptyCommand,
    #[error("'{0}' not found")]
    NotFound(String),
    #[error("failed to read env file {}: {reason}", path.display())]
    EnvFile { path: PathBuf, reason: String },
    #[error("failed to start '{program}': {source}")]
    Exec {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything needed to hand control to the served process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaunchPlan {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub workdir: PathBuf,
    pub env: Vec<(String, String)>,
}

impl LaunchPlan {
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Starts the single long-running process. Implementations that replace the
/// current process only return on failure.
pub trait Launcher {
    fn launch(&self, plan: &LaunchPlan) -> Result<(), LaunchError>;
}
