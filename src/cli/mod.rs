//! Command-line surface for the jump-threading update engine.

pub mod cmds;
mod fixture;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "jtupdate",
    version,
    about = "Jump-threading update engine for a mid-level CFG/SSA representation",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format for structured results.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub output: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one jump-threading pass over a CFG/path fixture and print the result.
    Thread(ThreadArgs),
    /// Register a fixture's paths and print the path store's diagnostic dump.
    Dump(DumpArgs),
    /// Check a fixture's structural invariants without threading anything.
    Validate(ValidateArgs),
}

#[derive(clap::Args, Debug)]
pub struct ThreadArgs {
    /// Path to the input fixture (JSON).
    pub input: PathBuf,

    /// Write the result here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Cancel any path that would require duplicating more than the block
    /// directly being threaded.
    #[arg(long)]
    pub optimize_for_size: bool,

    /// Skip the loop-header threader even for blocks marked as loop headers.
    #[arg(long)]
    pub no_loop_headers: bool,

    /// Emit Graphviz DOT instead of JSON.
    #[arg(long)]
    pub dot: bool,
}

#[derive(clap::Args, Debug)]
pub struct DumpArgs {
    /// Path to the input fixture (JSON).
    pub input: PathBuf,
}

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Path to the input fixture (JSON).
    pub input: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}
