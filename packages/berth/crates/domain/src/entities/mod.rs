pub mod environment;
pub mod parser;
pub mod requirements;

pub use berth_manifest::types::validation::*;
pub use environment::*;
pub use parser::*;
pub use requirements::*;
