pub mod base;
pub mod entry;
pub mod runtime;
pub mod validation;

pub use base::*;
pub use entry::*;
pub use runtime::*;
pub use validation::*;
