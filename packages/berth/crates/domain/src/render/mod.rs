pub mod dockerfile;

pub use dockerfile::DockerfileGenerator;
