//! HEXLOOP CLI - Command-line interface
//!
//! Commands:
//! - play: Play a match interactively on stdin
//! - replay: Run a command script and report the result
//! - layout: Generate a layout descriptor

mod layout_cmd;
mod play_cmd;
mod render;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hexloop")]
#[command(about = "HEXLOOP hex-grid strategy game")]
struct Cli {
    /// Seed for layout generation and random moves
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a match interactively
    Play(play_cmd::PlayArgs),
    /// Replay a command script
    Replay(play_cmd::ReplayArgs),
    /// Write a generated layout descriptor
    Layout(layout_cmd::LayoutArgs),
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so the board on stdout stays readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => play_cmd::run_play(args, cli.seed),
        Commands::Replay(args) => play_cmd::run_replay(args, cli.seed),
        Commands::Layout(args) => layout_cmd::run(args, cli.seed),
    }
}
