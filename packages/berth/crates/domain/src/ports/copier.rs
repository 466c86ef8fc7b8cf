use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
#[error("{}: {source}", path.display())]
pub struct CopyError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

impl CopyError {
    pub fn new(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Moves files from the source tree into the working directory.
pub trait SourceCopier {
    fn copy_file(&self, from: &Path, to: &Path) -> Result<(), CopyError>;

    /// Copies `from` into `to`, skipping entries whose file name is in
    /// `ignore`. Returns the number of files copied.
    fn copy_tree(&self, from: &Path, to: &Path, ignore: &[String]) -> Result<usize, CopyError>;
}
