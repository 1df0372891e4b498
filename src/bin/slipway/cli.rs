//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Slipway - A declarative build orchestrator for native C/C++ code
#[derive(Parser)]
#[command(name = "slipway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the configured artifact
    Build(BuildArgs),

    /// Remove build artifacts
    Clean(CleanArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Path to the manifest (defaults to Slipway.toml in the current directory)
    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    /// Number of parallel jobs, or "auto"
    #[arg(short, long)]
    pub jobs: Option<String>,

    /// Recompile everything regardless of timestamps
    #[arg(long)]
    pub no_incremental: bool,

    /// Emit compile_commands.json
    #[arg(long)]
    pub emit_compile_commands: bool,
}

#[derive(Args)]
pub struct CleanArgs {
    /// Path to the manifest (defaults to Slipway.toml in the current directory)
    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
