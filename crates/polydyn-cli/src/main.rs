//! Polydyn CLI - render note sequences through a track and list parameters.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "polydyn")]
#[command(author, version, about = "Polydyn synthesizer and dynamics CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a note sequence offline and report output levels
    Render(commands::render::RenderArgs),

    /// List synthesizer parameters and dynamics topologies
    Params(commands::params::ParamsArgs),
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so reports on stdout stay machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(args) => commands::render::run(args),
        Commands::Params(args) => commands::params::run(args),
    }
}
