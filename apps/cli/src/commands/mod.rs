pub mod build;
pub mod check;
pub mod init;
pub mod layers;
pub mod render;
pub mod schema;
pub mod up;
