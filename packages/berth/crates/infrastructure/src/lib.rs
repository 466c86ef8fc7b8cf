pub mod adapters;
pub mod system;

pub use adapters::apt::AptAdapter;
pub use adapters::exec::ExecLauncher;
pub use adapters::fs::FsCopier;
pub use adapters::pip::PipAdapter;
pub use system::interpreter::InterpreterResolver;
