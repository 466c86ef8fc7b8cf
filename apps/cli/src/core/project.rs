use clap::Args;
use std::path::{Path, PathBuf};

use berth::domain::entities::parser::{DescriptorError, DescriptorParser, LoadedDescriptor};
use berth::domain::manifest::BuildDescriptor;

use crate::core::error::CliError;

/// Where to find the descriptor and the source tree it describes.
#[derive(Args, Debug, Clone, Default)]
pub struct ProjectArgs {
    /// Build descriptor (default: berth.toml, berth.json, berth.yaml or berth.yml in the current directory)
    #[arg(short = 'f', long = "file")]
    pub file: Option<PathBuf>,

    /// Source tree to build (default: the descriptor's directory)
    #[arg(long)]
    pub source: Option<PathBuf>,
}

/// A parsed descriptor plus the text it came from, kept for diagnostics.
pub struct Project {
    pub path: PathBuf,
    pub text: String,
    pub descriptor: BuildDescriptor,
    pub source_dir: PathBuf,
}

impl Project {
    pub fn load(args: &ProjectArgs) -> Result<Self, CliError> {
        let cwd = std::env::current_dir()?;
        let path = match &args.file {
            Some(file) => file.clone(),
            None => DescriptorParser::locate(&cwd)
                .ok_or_else(|| CliError::DescriptorNotFound(cwd.clone()))?,
        };

        let LoadedDescriptor {
            path,
            format,
            text,
            descriptor,
        } = DescriptorParser::load(&path).map_err(|e| match e {
            DescriptorError::Read { source, .. } => CliError::Io(source),
            other => CliError::DescriptorParse {
                path: path.clone(),
                reason: other.to_string(),
            },
        })?;

        let source_dir = match &args.source {
            Some(dir) => dir.clone(),
            None => descriptor_dir(&path, &cwd),
        };
        let source_dir = std::fs::canonicalize(&source_dir).unwrap_or(source_dir);

        tracing::debug!(descriptor = %path.display(), format = ?format, source = %source_dir.display(), "loaded project");
        Ok(Self {
            path,
            text,
            descriptor,
            source_dir,
        })
    }

    pub fn display_name(&self) -> String {
        self.path.display().to_string()
    }
}

fn descriptor_dir(path: &Path, cwd: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => cwd.to_path_buf(),
    }
}
