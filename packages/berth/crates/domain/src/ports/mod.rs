pub mod copier;
pub mod installer;
pub mod launcher;
pub mod package_manager;
pub mod resolver;
