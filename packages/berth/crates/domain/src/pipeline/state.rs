use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::BuildError;

/// Lifecycle of one build, strictly linear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BuildState {
    Unconfigured,
    BaseSelected,
    SystemDepsInstalled,
    ManifestInstalled,
    SourceCopied,
    Launched,
}

/// The named stages of the build/launch pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
    SelectBase,
    ConfigureRuntime,
    EstablishWorkdir,
    InstallSystemPackages,
    InstallManifest,
    CopySource,
    DeclarePort,
    Launch,
}

impl StageKind {
    /// Canonical execution order. `InstallManifest` precedes `CopySource` so the
    /// dependency layer only depends on the manifest, never on the source tree.
    pub const ORDER: [StageKind; 8] = [
        StageKind::SelectBase,
        StageKind::ConfigureRuntime,
        StageKind::EstablishWorkdir,
        StageKind::InstallSystemPackages,
        StageKind::InstallManifest,
        StageKind::CopySource,
        StageKind::DeclarePort,
        StageKind::Launch,
    ];

    pub fn precondition(&self) -> BuildState {
        match self {
            StageKind::SelectBase => BuildState::Unconfigured,
            StageKind::ConfigureRuntime
            | StageKind::EstablishWorkdir
            | StageKind::InstallSystemPackages => BuildState::BaseSelected,
            StageKind::InstallManifest => BuildState::SystemDepsInstalled,
            StageKind::CopySource => BuildState::ManifestInstalled,
            StageKind::DeclarePort | StageKind::Launch => BuildState::SourceCopied,
        }
    }

    pub fn postcondition(&self) -> BuildState {
        match self {
            StageKind::SelectBase | StageKind::ConfigureRuntime | StageKind::EstablishWorkdir => {
                BuildState::BaseSelected
            }
            StageKind::InstallSystemPackages => BuildState::SystemDepsInstalled,
            StageKind::InstallManifest => BuildState::ManifestInstalled,
            StageKind::CopySource | StageKind::DeclarePort => BuildState::SourceCopied,
            StageKind::Launch => BuildState::Launched,
        }
    }

    pub fn position(&self) -> usize {
        Self::ORDER
            .iter()
            .position(|s| s == self)
            .unwrap_or(Self::ORDER.len())
    }

    pub fn label(&self) -> &'static str {
        match self {
            StageKind::SelectBase => "Select base environment",
            StageKind::ConfigureRuntime => "Configure runtime flags",
            StageKind::EstablishWorkdir => "Establish working directory",
            StageKind::InstallSystemPackages => "Install system packages",
            StageKind::InstallManifest => "Install dependency manifest",
            StageKind::CopySource => "Copy source tree",
            StageKind::DeclarePort => "Declare exposed port",
            StageKind::Launch => "Launch entry command",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tracks progress through [`StageKind::ORDER`] and rejects anything out of turn.
#[derive(Debug, Clone)]
pub struct StateMachine {
    state: BuildState,
    completed: Vec<StageKind>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: BuildState::Unconfigured,
            completed: Vec::new(),
        }
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn completed(&self) -> &[StageKind] {
        &self.completed
    }

    /// The stage allowed to run next, if any.
    pub fn next_stage(&self) -> Option<StageKind> {
        StageKind::ORDER.get(self.completed.len()).copied()
    }

    /// Checks that `stage` is next in order and its precondition holds.
    pub fn begin(&self, stage: StageKind) -> Result<(), BuildError> {
        let expected = self.next_stage();
        if expected != Some(stage) || stage.precondition() != self.state {
            return Err(BuildError::StageOrder {
                stage,
                expected,
                state: self.state,
            });
        }
        Ok(())
    }

    pub fn complete(&mut self, stage: StageKind) -> Result<(), BuildError> {
        self.begin(stage)?;
        self.state = stage.postcondition();
        self.completed.push(stage);
        Ok(())
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
