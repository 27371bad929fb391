//! dynaform CLI
//!
//! Loads a stack declaration and renders the IAM policies and CloudWatch
//! metrics its `DynamoDB` tables produce.

mod commands;
mod config;
mod stack;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

/// dynaform CLI: render grants and metrics for declared `DynamoDB` tables.
#[derive(Parser, Debug)]
#[command(name = "dynaform", version, about)]
struct Cli {
    /// Path to the stack declaration (TOML).
    #[arg(
        long,
        env = "DYNAFORM_CONFIG",
        default_value = "dynaform.toml",
        global = true
    )]
    config: PathBuf,

    /// Output format.
    #[arg(long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every role's identity policy.
    Policy,
    /// Print every declared metric.
    Metrics,
    /// Build the stack and report what it contains.
    Check,
}

fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = config::load(&cli.config)?;
    let stack = stack::Stack::build(&config)?;

    match cli.command {
        Command::Policy => commands::policy::run(&stack, &cli.format),
        Command::Metrics => commands::metrics::run(&stack, &cli.format),
        Command::Check => commands::check::run(&stack, &cli.format),
    }
}
