use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

use domain::system::store::LayerStore;
use domain::{BuildError, BuildState, StageKind, StateMachine};
use infrastructure::{AptAdapter, ExecLauncher, FsCopier, InterpreterResolver, PipAdapter};

use crate::stages::{
    standard_stages, BuildContext, BuildInputs, BuildOutputs, Stage, StageOutcome, Toolchain,
};

/// Receives stage progress. Every method defaults to a no-op.
pub trait BuildObserver {
    fn stage_started(&self, _stage: StageKind) {}
    fn stage_finished(&self, _stage: StageKind, _outcome: &StageOutcome) {}
    fn stage_failed(&self, _stage: StageKind, _error: &BuildError) {}
}

pub struct SilentObserver;

impl BuildObserver for SilentObserver {}

/// A build that stopped. `completed` lists the stages that finished before `stage` failed.
#[derive(Error, Debug)]
#[error("{stage} failed: {error}")]
pub struct BuildFailure {
    pub stage: StageKind,
    pub completed: Vec<StageKind>,
    #[source]
    pub error: BuildError,
}

#[derive(Debug, Serialize)]
pub struct StageRecord {
    pub stage: StageKind,
    #[serde(flatten)]
    pub outcome: StageOutcome,
}

#[derive(Debug, Serialize)]
pub struct BuildReport {
    pub state: BuildState,
    pub stages: Vec<StageRecord>,
    pub outputs: BuildOutputs,
}

impl BuildReport {
    pub fn cache_hit(&self) -> bool {
        self.outputs.layer.as_ref().is_some_and(|l| l.cache_hit)
    }
}

/// Runs the stage pipeline against one toolchain and layer store.
pub struct BuildService {
    toolchain: Toolchain,
    store: LayerStore,
    stages: Vec<Box<dyn Stage>>,
    observer: Box<dyn BuildObserver>,
}

impl BuildService {
    pub fn new(toolchain: Toolchain, store: LayerStore) -> Self {
        Self {
            toolchain,
            store,
            stages: standard_stages(),
            observer: Box::new(SilentObserver),
        }
    }

    /// Wires the host adapters: PATH interpreter lookup, apt, pip, file copy and exec.
    pub fn local(layers_root: PathBuf) -> Self {
        let toolchain = Toolchain::new(
            InterpreterResolver::new(),
            AptAdapter::new(),
            PipAdapter::new(),
            FsCopier::new(),
            ExecLauncher::new(),
        );
        Self::new(toolchain, LayerStore::new(layers_root))
    }

    pub fn with_observer(mut self, observer: impl BuildObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    /// Replaces the stage list. Order is still enforced by the state machine.
    pub fn with_stages(mut self, stages: Vec<Box<dyn Stage>>) -> Self {
        self.stages = stages;
        self
    }

    pub fn store(&self) -> &LayerStore {
        &self.store
    }

    /// Every stage up to and including `DeclarePort`; nothing is started.
    pub fn build(&self, inputs: &BuildInputs) -> Result<BuildReport, BuildFailure> {
        self.run(inputs, StageKind::DeclarePort)
    }

    /// The full pipeline. With an exec launcher a successful call does not return.
    pub fn up(&self, inputs: &BuildInputs) -> Result<BuildReport, BuildFailure> {
        self.run(inputs, StageKind::Launch)
    }

    /// Runs stages in order until `until` has completed.
    pub fn run(&self, inputs: &BuildInputs, until: StageKind) -> Result<BuildReport, BuildFailure> {
        let mut machine = StateMachine::new();
        let mut ctx = BuildContext::new(inputs, &self.toolchain, &self.store);
        let mut records = Vec::new();

        for stage in &self.stages {
            let kind = stage.kind();
            if kind.position() > until.position() {
                break;
            }

            let fail = |error: BuildError, machine: &StateMachine| BuildFailure {
                stage: kind,
                completed: machine.completed().to_vec(),
                error,
            };

            if let Err(error) = machine.begin(kind) {
                self.observer.stage_failed(kind, &error);
                return Err(fail(error, &machine));
            }

            self.observer.stage_started(kind);
            let _span = tracing::info_span!("stage", stage = %kind).entered();

            match stage.run(&mut ctx) {
                Ok(outcome) => {
                    tracing::info!(detail = %outcome.detail, cached = outcome.cached, "stage complete");
                    machine.complete(kind).map_err(|e| fail(e, &machine))?;
                    self.observer.stage_finished(kind, &outcome);
                    records.push(StageRecord {
                        stage: kind,
                        outcome,
                    });
                }
                Err(error) => {
                    tracing::error!(error = %error, "stage failed");
                    self.observer.stage_failed(kind, &error);
                    return Err(fail(error, &machine));
                }
            }
        }

        Ok(BuildReport {
            state: machine.state(),
            stages: records,
            outputs: ctx.outputs,
        })
    }
}
