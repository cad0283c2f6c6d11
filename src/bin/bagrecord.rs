// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! # bagrecord CLI
//!
//! Command-line front end for reading ROS 2 recordings as records.
//!
//! ## Usage
//!
//! ```sh
//! # Summary of a bag directory
//! bagrecord info talker/
//!
//! # Topic to type mapping
//! bagrecord types run.mcap
//!
//! # Records of one topic as JSON lines
//! bagrecord records talker/ --topic /chatter --limit 10
//!
//! # Fields of a message type
//! bagrecord schema talker/ --target /chatter
//! ```

mod cmd;
mod common;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use cmd::{InfoCmd, RecordsCmd, SchemaCmd, TopicsCmd, TypesCmd};
use common::Result;
use tracing_subscriber::{fmt, EnvFilter};

/// bagrecord - ROS 2 recordings as records
///
/// Reads rosbag2 SQLite and MCAP storage. The backend is detected from the
/// path unless `--storage` is given.
#[derive(Parser, Clone)]
#[command(name = "bagrecord")]
#[command(about = "Read ROS 2 bag recordings as ordered field records", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "ArcheBase")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Reader options file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Clone)]
enum Commands {
    /// Show storage, duration and per-topic counts
    Info(InfoCmd),

    /// List topic names
    Topics(TopicsCmd),

    /// Print the topic to type mapping
    Types(TypesCmd),

    /// Print records
    Records(RecordsCmd),

    /// Show the fields of a message type or topic
    Schema(SchemaCmd),
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Info(cmd) => cmd.run(config),
        Commands::Topics(cmd) => cmd.run(config),
        Commands::Types(cmd) => cmd.run(config),
        Commands::Records(cmd) => cmd.run(config),
        Commands::Schema(cmd) => cmd.run(config),
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
