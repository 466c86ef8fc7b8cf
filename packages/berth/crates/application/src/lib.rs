pub mod build_service;
pub mod stages;

pub use build_service::{BuildFailure, BuildObserver, BuildReport, BuildService, SilentObserver};
pub use stages::{BuildInputs, BuildOutputs, LayerOutcome, StageOutcome, Toolchain};
