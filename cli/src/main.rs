//! CLI entry point for the pricing engine: `run` and `replay` subcommands.
//!
//! A thin wrapper over `pricing_runner::batch` — no decision logic lives
//! here. `generate` (synthetic event generation) is intentionally not
//! implemented; this binary is a consumer of event logs, not a producer.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "donizo-engine", about = "The Donizo Truth Engine")]
struct Cli {
    /// Enable debug-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process events and update state.
    Run {
        #[arg(long)]
        events: PathBuf,
        #[arg(long)]
        state: PathBuf,
        #[arg(long)]
        audit: PathBuf,
    },
    /// Replay events from a clean state and verify the final hash.
    Replay {
        #[arg(long)]
        events: PathBuf,
        #[arg(long)]
        state: PathBuf,
        #[arg(long)]
        audit: PathBuf,
        #[arg(long)]
        verify: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Run { events, state, audit } => match pricing_runner::batch::run(&events, &state, &audit) {
            Ok(hash) => {
                println!("RUN OK — Final state hash: {hash}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::error!(error = %e, "run failed");
                eprintln!("ERROR: {e}");
                ExitCode::FAILURE
            }
        },
        Command::Replay { events, state, audit, verify } => {
            match pricing_runner::batch::replay(&events, &state, &audit, &verify) {
                Ok(true) => {
                    println!("REPLAY OK: hash matches");
                    ExitCode::SUCCESS
                }
                Ok(false) => {
                    eprintln!("REPLAY FAILED: hash does NOT match");
                    ExitCode::FAILURE
                }
                Err(e) => {
                    tracing::error!(error = %e, "replay failed");
                    eprintln!("ERROR: {e}");
                    ExitCode::FAILURE
                }
            }
        }
    }
}
