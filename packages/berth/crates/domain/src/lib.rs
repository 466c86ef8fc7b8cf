pub mod entities;
pub mod error;
pub mod pipeline;
pub mod ports;
pub mod render;
pub mod system;

pub use berth_manifest as manifest;
pub use error::BuildError;
pub use pipeline::{BuildState, StageKind, StateMachine};
pub use ports::package_manager::PackageManager;
