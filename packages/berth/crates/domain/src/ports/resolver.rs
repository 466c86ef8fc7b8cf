use berth_manifest::BaseEnvironment;
use std::path::PathBuf;
use thiserror::Error;

use crate::entities::environment::ResolvedEnvironment;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("no interpreter for '{0}' found on PATH")]
    NotFound(String),
    #[error("{} reports version {found}, expected {wanted}", path.display())]
    VersionMismatch {
        wanted: String,
        found: String,
        path: PathBuf,
    },
    #[error("failed to probe {}: {reason}", path.display())]
    Probe { path: PathBuf, reason: String },
}

/// Turns a pinned base environment into something runnable.
pub trait EnvironmentResolver {
    fn resolve(&self, base: &BaseEnvironment) -> Result<ResolvedEnvironment, ResolveError>;
}
