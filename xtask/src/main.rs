// Licensed under the Apache-2.0 license

//! Developer entry point for the board support generator.

use anyhow::{Context, Result};
use board_codegen::BoardContext;
use board_kconfig::Change;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Generate board support artifacts from declaration files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate all artifacts for a board
    Generate(BoardArgs),
    /// Report pending sdkconfig changes without writing anything
    Check(BoardArgs),
    /// Report unsatisfied device dependencies
    Resolve(BoardArgs),
}

#[derive(Args)]
struct BoardArgs {
    /// Board directory containing board.toml and the declaration files
    #[arg(long, value_name = "DIR")]
    board: PathBuf,

    /// Output directory for generated artifacts
    #[arg(long, value_name = "DIR", default_value = "generated")]
    output: PathBuf,
}

impl BoardArgs {
    fn context(&self) -> Result<BoardContext> {
        BoardContext::load(&self.board, &self.output)
            .with_context(|| format!("failed to load board `{}`", self.board.display()))
    }
}

fn describe(change: &Change) -> String {
    match change {
        Change::Added(key) => format!("add {}", key),
        Change::Updated(key) => format!("update {}", key),
        Change::Removed(key) => format!("remove {}", key),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate(args) => {
            let ctx = args.context()?;
            let report = board_codegen::generate(&ctx)?;
            println!(
                "Generated {} peripheral(s) and {} device(s) for board `{}`",
                report.peripherals, report.devices, ctx.board.name
            );
            for change in &report.sdkconfig_changes {
                println!("sdkconfig: {}", describe(change));
            }
        }
        Commands::Check(args) => {
            let ctx = args.context()?;
            let changes = board_codegen::check(&ctx)?;
            if changes.is_empty() {
                println!("sdkconfig is up to date");
            } else {
                for change in &changes {
                    println!("sdkconfig: {}", describe(change));
                }
                std::process::exit(1);
            }
        }
        Commands::Resolve(args) => {
            let ctx = args.context()?;
            let resolution = board_codegen::resolve(&ctx)?;
            if resolution.all_satisfied {
                println!("all device dependencies satisfied");
            } else {
                for (device, requirement) in &resolution.missing {
                    println!("device `{}` is missing `{}`", device, requirement);
                }
                std::process::exit(1);
            }
        }
    }
    Ok(())
}
