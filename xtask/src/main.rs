// Desktop/tooling crate: unwrap/expect/panic acceptable in non-embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod cargo;
mod check;
mod doc;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Target the driver must build for without `std` (RP2040, Cortex-M0+).
pub const EMBEDDED_TARGET: &str = "thumbv6m-none-eabi";

/// The driver crate.
pub const DRIVER: &str = "dotstar";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "dotstar development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// no_std target build, host feature builds, clippy and rustfmt
    Check {
        /// Skip the embedded target (no thumbv6m toolchain installed)
        #[arg(long)]
        host_only: bool,
    },
    /// Run unit, integration and doc tests
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
    /// Build and optionally open documentation
    Doc {
        /// Open documentation in browser
        #[arg(long)]
        open: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { host_only } => check::run(host_only),
        Commands::Test { unit, integration } => test::run(unit, integration),
        Commands::Doc { open } => doc::run(open),
    }
}
