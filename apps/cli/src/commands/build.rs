use anyhow::Result;
use clap::{Args, Parser};
use std::path::PathBuf;

use berth::application::{BuildInputs, BuildReport, BuildService};

use crate::commands::check;
use crate::core::config;
use crate::core::error::CliError;
use crate::core::project::{Project, ProjectArgs};
use crate::ui::progress::StageProgress;
use crate::ui::{self, Icon, Theme};

/// Flags shared by `build` and `up`.
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Working directory to build into (default: the descriptor's workdir)
    #[arg(long)]
    pub workdir: Option<PathBuf>,

    /// Env file loaded into the launched process (overrides the descriptor)
    #[arg(long)]
    pub env_file: Option<PathBuf>,
}

impl PipelineArgs {
    /// Loads and validates the project, then wires the local build service.
    pub fn prepare(&self, show_progress: bool) -> Result<(BuildService, BuildInputs)> {
        let mut project = Project::load(&self.project)?;

        if let Some(env_file) = &self.env_file {
            let absolute = std::fs::canonicalize(env_file)
                .unwrap_or_else(|_| std::env::current_dir().unwrap_or_default().join(env_file));
            project.descriptor.env_file = Some(absolute);
        }

        let result = check::validate(&project);
        if result.has_errors() || result.has_warnings() {
            check::print_issues(&project, &result);
        }
        let errors = result.errors().count();
        if errors > 0 {
            return Err(CliError::InvalidDescriptor(errors).into());
        }

        let mut inputs = BuildInputs::new(project.descriptor, project.source_dir);
        if let Some(workdir) = &self.workdir {
            inputs = inputs.with_workdir(workdir);
        }

        let layers = config::layers_dir()?;
        tracing::debug!(layers = %layers.display(), workdir = %inputs.workdir.display(), "build service ready");

        let mut service = BuildService::local(layers);
        if show_progress {
            service = service.with_observer(StageProgress::new());
        }
        Ok((service, inputs))
    }
}

#[derive(Parser, Debug, Clone)]
pub struct BuildCommand {
    #[command(flatten)]
    pub pipeline: PipelineArgs,

    /// Print the build report as JSON
    #[arg(long)]
    pub json: bool,
}

impl BuildCommand {
    pub async fn execute(self) -> Result<()> {
        let (service, inputs) = self.pipeline.prepare(!self.json)?;
        let report = service.build(&inputs).map_err(CliError::from)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            summarize(&report, &inputs);
        }
        Ok(())
    }
}

fn summarize(report: &BuildReport, inputs: &BuildInputs) {
    let layer = match &report.outputs.layer {
        Some(layer) if layer.cache_hit => format!("layer {} (cached)", layer.key.short()),
        Some(layer) => format!("layer {}", layer.key.short()),
        None => "no layer".to_string(),
    };

    ui::println(format!(
        "\n{} {} {}",
        Icon::Package,
        Theme::success("Built"),
        Theme::muted(format!(
            "{} into {}, {}",
            inputs.descriptor.base,
            inputs.workdir.display(),
            layer
        ))
    ));
    ui::println(format!(
        "   Run {} to start it on port {}",
        Theme::primary("berth up"),
        inputs.descriptor.expose
    ));
}
