pub mod apt;
pub mod command;
pub mod exec;
pub mod fs;
pub mod pip;
