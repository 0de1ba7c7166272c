mod commands;
mod config;
mod input;
mod oracle;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::batch::BatchArgs;
use commands::combinations::CombinationsArgs;
use commands::payoff::PayoffArgs;
use commands::preview::PreviewArgs;

/// Fixed Coupon Note quoting
#[derive(Parser)]
#[command(
    name = "fcn",
    version,
    about = "Fixed Coupon Note previews, payoff curves and ranked basket quotes",
    long_about = "A CLI for structuring worst-of Fixed Coupon Notes with decimal precision. \
                  Prices single notes with a local heuristic, draws payoff curves, \
                  enumerates baskets from a stock pool and ranks oracle-priced quotes."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Engine configuration file (YAML or JSON)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log engine activity at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Indicative coupon from the local heuristic
    Preview(PreviewArgs),
    /// Redemption at maturity across underlying performance
    Payoff(PayoffArgs),
    /// Enumerate baskets drawn from a stock pool
    Combinations(CombinationsArgs),
    /// Price every basket from a pool and rank the quotes
    Batch(BatchArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let engine_config = match config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(2);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Preview(args) => commands::preview::run_preview(args, &engine_config),
        Commands::Payoff(args) => commands::payoff::run_payoff(args, &engine_config),
        Commands::Combinations(args) => {
            commands::combinations::run_combinations(args, &engine_config)
        }
        Commands::Batch(args) => commands::batch::run_batch(args, engine_config),
        Commands::Version => {
            println!("fcn {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
