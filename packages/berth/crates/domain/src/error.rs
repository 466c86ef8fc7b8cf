use std::path::PathBuf;
use thiserror::Error;

use crate::entities::requirements::RequirementsError;
use crate::pipeline::{BuildState, StageKind};
use crate::ports::copier::CopyError;
use crate::ports::installer::InstallError;
use crate::ports::launcher::LaunchError;
use crate::ports::package_manager::PackageError;
use crate::ports::resolver::ResolveError;
use crate::system::store::StoreError;
use berth_manifest::BindError;

/// Every way a build can stop. None of these are retried.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Base environment '{base}' could not be resolved: {source}")]
    EnvironmentResolution {
        base: String,
        #[source]
        source: ResolveError,
    },

    #[error("Could not prepare working directory {}: {source}", path.display())]
    Workdir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("System package installation failed: {0}")]
    NativeDependencyInstall(#[from] PackageError),

    #[error("Dependency manifest is invalid: {0}")]
    ManifestParse(#[from] RequirementsError),

    #[error("Dependency installation failed: {0}")]
    ManifestDependencyInstall(#[from] InstallError),

    #[error("Source copy failed: {0}")]
    SourceCopy(#[from] CopyError),

    #[error("Layer store error: {0}")]
    LayerStore(#[from] StoreError),

    #[error("Network contract violated: {0}")]
    Network(#[from] BindError),

    #[error("Launch failed: {0}")]
    Launch(#[from] LaunchError),

    #[error("Stage '{stage}' cannot run in state {state:?} (next expected: {expected:?})")]
    StageOrder {
        stage: StageKind,
        expected: Option<StageKind>,
        state: BuildState,
    },
}

impl BuildError {
    /// Stable short code for machine-readable output.
    pub fn code(&self) -> &'static str {
        match self {
            BuildError::EnvironmentResolution { .. } => "environment-resolution",
            BuildError::Workdir { .. } => "workdir",
            BuildError::NativeDependencyInstall(_) => "native-dependency-install",
            BuildError::ManifestParse(_) | BuildError::ManifestDependencyInstall(_) => {
                "manifest-dependency-install"
            }
            BuildError::SourceCopy(_) => "source-copy",
            BuildError::LayerStore(_) => "layer-store",
            BuildError::Network(_) => "network-contract",
            BuildError::Launch(_) => "launch",
            BuildError::StageOrder { .. } => "stage-order",
        }
    }
}
