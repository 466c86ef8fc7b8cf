use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use berth::domain::render::DockerfileGenerator;

use crate::core::project::{Project, ProjectArgs};
use crate::ui;

#[derive(Parser, Debug, Clone)]
pub struct RenderCommand {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Write the Dockerfile here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also write a .dockerignore next to the output
    #[arg(long, requires = "output")]
    pub ignore_file: bool,
}

impl RenderCommand {
    pub async fn execute(self) -> Result<()> {
        let project = Project::load(&self.project)?;
        let generator = DockerfileGenerator::new(&project.descriptor);
        let dockerfile = generator.render();

        let Some(output) = self.output else {
            print!("{}", dockerfile);
            return Ok(());
        };

        std::fs::write(&output, dockerfile)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        ui::success(format!("Wrote {}", output.display()));

        if self.ignore_file {
            let ignore_path = output
                .parent()
                .map(|p| p.join(".dockerignore"))
                .unwrap_or_else(|| PathBuf::from(".dockerignore"));
            std::fs::write(&ignore_path, generator.render_ignore())
                .with_context(|| format!("Failed to write {}", ignore_path.display()))?;
            ui::success(format!("Wrote {}", ignore_path.display()));
        }
        Ok(())
    }
}
