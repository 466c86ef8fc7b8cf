mod commands;
mod core;
mod ui;

use clap::{ArgAction, Parser, Subcommand};
use dotenv::dotenv;

use commands::build::BuildCommand;
use commands::check::CheckCommand;
use commands::init::InitCommand;
use commands::layers::LayersCommand;
use commands::render::RenderCommand;
use commands::schema::SchemaCommand;
use commands::up::UpCommand;

#[derive(Parser)]
#[command(name = "berth")]
#[command(about = "Build and launch a service from a build descriptor", long_about = None)]
#[command(version)]
struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default berth.toml and requirements.txt
    Init(InitCommand),
    /// Validate the build descriptor
    Check(CheckCommand),
    /// Render the descriptor as a Dockerfile
    Render(RenderCommand),
    /// Run every stage up to the port declaration
    Build(BuildCommand),
    /// Build, then hand off to the entry command
    Up(UpCommand),
    /// Inspect or prune cached dependency layers
    Layers(LayersCommand),
    /// Print the descriptor JSON Schema
    Schema(SchemaCommand),
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();
    crate::core::logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Init(cmd) => cmd.execute().await,
        Commands::Check(cmd) => cmd.execute().await,
        Commands::Render(cmd) => cmd.execute().await,
        Commands::Build(cmd) => cmd.execute().await,
        Commands::Up(cmd) => cmd.execute().await,
        Commands::Layers(cmd) => cmd.execute().await,
        Commands::Schema(cmd) => cmd.execute().await,
    };

    if let Err(err) = result {
        crate::core::error::report(&err);
        std::process::exit(1);
    }
}
