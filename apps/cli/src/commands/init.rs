use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use berth::domain::entities::parser::{DescriptorFormat, DescriptorParser};
use berth::domain::manifest::BuildDescriptor;

use crate::core::error::CliError;
use crate::ui::{self, Icon, Theme};

const MANIFEST_TEMPLATE: &str = "# One requirement per line, e.g.\n# Django==4.2.7\n# mysqlclient==2.2.0\n";

#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum InitFormat {
    #[default]
    Toml,
    Json,
    Yaml,
}

impl InitFormat {
    fn descriptor(self) -> (DescriptorFormat, &'static str) {
        match self {
            InitFormat::Toml => (DescriptorFormat::Toml, "berth.toml"),
            InitFormat::Json => (DescriptorFormat::Json, "berth.json"),
            InitFormat::Yaml => (DescriptorFormat::Yaml, "berth.yaml"),
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct InitCommand {
    /// Directory to initialize (default: current directory)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Descriptor format to write
    #[arg(long, value_enum, default_value_t = InitFormat::Toml)]
    pub format: InitFormat,

    /// Overwrite an existing descriptor
    #[arg(long, short)]
    pub force: bool,
}

impl InitCommand {
    pub async fn execute(self) -> Result<()> {
        let root = match self.path {
            Some(path) => path,
            None => std::env::current_dir()?,
        };
        std::fs::create_dir_all(&root)?;

        let (format, filename) = self.format.descriptor();
        let descriptor_path = root.join(filename);
        if descriptor_path.exists() && !self.force {
            return Err(CliError::AlreadyExists(descriptor_path).into());
        }

        let descriptor = BuildDescriptor::default();
        let content = DescriptorParser::serialize(&descriptor, format)?;
        std::fs::write(&descriptor_path, content)?;
        ui::success(format!("Wrote {}", descriptor_path.display()));

        let manifest_path = root.join(&descriptor.manifest);
        if manifest_path.exists() {
            ui::info(format!(
                "Keeping existing {}",
                Theme::muted(manifest_path.display())
            ));
        } else {
            std::fs::write(&manifest_path, MANIFEST_TEMPLATE)?;
            ui::success(format!("Wrote {}", manifest_path.display()));
        }

        ui::println(format!(
            "\n{} Next: {} then {}",
            Icon::Rocket,
            Theme::primary("berth check"),
            Theme::primary("berth up")
        ));
        Ok(())
    }
}
