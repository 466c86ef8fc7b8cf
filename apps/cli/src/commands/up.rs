use anyhow::Result;
use clap::Parser;

use crate::commands::build::PipelineArgs;
use crate::core::error::CliError;
use crate::ui::{self, Icon, Theme};

/// Builds, then replaces this process with the entry command.
#[derive(Parser, Debug, Clone)]
pub struct UpCommand {
    #[command(flatten)]
    pub pipeline: PipelineArgs,
}

impl UpCommand {
    pub async fn execute(self) -> Result<()> {
        let (service, inputs) = self.pipeline.prepare(true)?;

        ui::println(format!(
            "{} {} {} {}",
            Icon::Rocket,
            Theme::bold("Bringing up"),
            inputs.descriptor.base,
            Theme::muted(format!("(port {})", inputs.descriptor.expose))
        ));

        service.up(&inputs).map_err(CliError::from)?;
        Ok(())
    }
}
