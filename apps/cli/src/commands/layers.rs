use anyhow::Result;
use clap::Parser;

use berth::domain::entities::requirements::ManifestBundle;
use berth::domain::system::store::{LayerKey, LayerStore};

use crate::core::config;
use crate::core::project::{Project, ProjectArgs};
use crate::ui::{self, Theme};

/// Lists or prunes the dependency layer store.
#[derive(Parser, Debug, Clone)]
pub struct LayersCommand {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Remove every layer except the one the current project uses
    #[arg(long)]
    pub prune: bool,
}

impl LayersCommand {
    pub async fn execute(self) -> Result<()> {
        let store = LayerStore::new(config::layers_dir()?);
        let current = current_key(&self.project);

        if self.prune {
            if current.is_none() {
                ui::warn("No project found here; pruning every layer");
            }
            let removed = store.prune(current.as_ref())?;
            ui::success(format!("Removed {} layer(s)", removed));
            return Ok(());
        }

        let layers = store.list()?;
        if layers.is_empty() {
            ui::info(format!("No layers in {}", store.root().display()));
            return Ok(());
        }

        for layer in layers {
            let marker = if current.as_ref() == Some(&layer.key) {
                Theme::success("current")
            } else {
                String::new()
            };
            ui::println(format!(
                "{}  {:<20} {:>4} pkg  {}  {}",
                Theme::primary(layer.key.short()),
                layer.base,
                layer.requirements,
                Theme::muted(layer.created_at.format("%Y-%m-%d %H:%M")),
                marker
            ));
        }
        Ok(())
    }
}

/// Key of the layer the project in `args` would build, if it can be loaded.
fn current_key(args: &ProjectArgs) -> Option<LayerKey> {
    let project = Project::load(args).ok()?;
    let bundle = ManifestBundle::load(&project.source_dir, &project.descriptor.manifest).ok()?;
    Some(LayerKey::compute(
        &project.descriptor.base,
        &project.descriptor.system_packages,
        bundle.contents(),
    ))
}
