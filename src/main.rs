// jtupdate: CLI front-end for the jump-threading update engine.
//
// Drives the engine from JSON CFG/path fixtures: register paths, run one
// `thread_through_all_blocks` pass, and report the rewritten CFG plus
// statistics.

#![allow(dead_code)]

use anyhow::Result;
use clap::Parser;

mod cfg;
mod cli;
mod output;
mod platform;
mod ssa;
mod threading;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    platform::check_platform_support();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    run_command(cli)
}

fn run_command(cli: Cli) -> Result<()> {
    match &cli.command {
        Commands::Thread(args) => cli::cmds::thread(args, &cli),
        Commands::Dump(args) => cli::cmds::dump(args, &cli),
        Commands::Validate(args) => cli::cmds::validate(args, &cli),
    }
}
