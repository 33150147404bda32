mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::mortgage::LoanArgs;

/// Mortgage amortization schedules
#[derive(Parser)]
#[command(
    name = "mortgage",
    version,
    about = "Mortgage amortization schedules",
    long_about = "A CLI for computing mortgage repayments with decimal precision. \
                  Derives the periodic payment, simulates the balance with repayment \
                  changes and lump sums, and exports the per-period schedule."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Full calculation: summary results, chart series and schedule
    Calculate(LoanArgs),
    /// Baseline periodic payment only
    Payment(LoanArgs),
    /// Per-period schedule (use --output csv for a spreadsheet export)
    Schedule(LoanArgs),
    /// Yearly balance series for charting
    Chart(LoanArgs),
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

/// Log to stderr so stdout stays parseable. Level from RUST_LOG, default warn.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Calculate(args) => commands::mortgage::run_calculate(args),
        Commands::Payment(args) => commands::mortgage::run_payment(args),
        Commands::Schedule(args) => commands::mortgage::run_schedule(args),
        Commands::Chart(args) => commands::mortgage::run_chart(args),
        Commands::Version => {
            println!("mortgage {}", env!("CARGO_PKG_VERSION"));
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
