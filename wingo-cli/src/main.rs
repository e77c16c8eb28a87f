mod commands;
mod config;
mod render;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wingo_core::HarnessError;

#[derive(Parser)]
#[command(name = "wingo")]
#[command(about = "Wingo harness - verify a number-guessing game service end to end")]
#[command(version)]
struct Cli {
    /// Harness config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register, fund, place bets and check the win rate
    Run(commands::RunArgs),

    /// Print the effective configuration
    Config,

    /// Classify a win/loss tally against an acceptance band
    Evaluate(commands::EvaluateArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for the report
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "wingo={},wingo_core={}",
            log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Commands::Run(args) => commands::run(cli.config.as_deref(), args).await,
        Commands::Config => commands::show_config(cli.config.as_deref()),
        Commands::Evaluate(args) => commands::evaluate(args),
    };

    match result {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            match e.downcast_ref::<HarnessError>() {
                Some(HarnessError::Config(msg)) => {
                    eprintln!("Error: Invalid configuration: {}", msg);
                    eprintln!("Use 'wingo config' to inspect the effective settings");
                }
                Some(HarnessError::Io(io)) => {
                    eprintln!("Error: Could not read config file: {}", io);
                }
                _ => {
                    eprintln!("Error: {:#}", e);
                }
            }
            std::process::exit(1);
        }
    }
}
