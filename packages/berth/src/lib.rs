//! Build and launch a single network service from a declarative build descriptor.
//!
//! This crate only re-exports the layers underneath it:
//!
//! - [`domain`]: descriptor parsing, the stage state machine, ports and the layer store
//! - [`infrastructure`]: host adapters (PATH interpreter lookup, apt, pip, file copy, exec)
//! - [`application`]: the stage pipeline and [`BuildService`]

pub use application;
pub use domain;
pub use infrastructure;

pub use application::{BuildFailure, BuildInputs, BuildObserver, BuildReport, BuildService};
pub use domain::entities::parser::{
    DescriptorError, DescriptorFormat, DescriptorParser, LoadedDescriptor,
};
pub use domain::manifest::BuildDescriptor;
pub use domain::{BuildError, BuildState, StageKind};
