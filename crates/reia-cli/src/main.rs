mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::analysis::AnalyzeArgs;
use commands::scenarios::{CompareArgs, SensitivityArgs};
use config::AssumptionDefaults;

/// Real-estate investment analysis
#[derive(Parser)]
#[command(
    name = "reia",
    version,
    about = "Real-estate investment analysis",
    long_about = "A CLI for analysing income-producing property with decimal precision. \
                  Projects a levered holding period and reports cap rate, cash-on-cash, \
                  DSCR, IRR, equity multiple and a viability score, compares scenarios \
                  and runs sensitivity tables."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Default assumptions file (JSON or YAML)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log pipeline stages to stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a single property over its holding period
    Analyze(AnalyzeArgs),
    /// Rank scenarios by IRR, equity multiple and average cash-on-cash
    Compare(CompareArgs),
    /// One-way sensitivity tables for growth, exit cap and financing drivers
    Sensitivity(SensitivityArgs),
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
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => AssumptionDefaults::load(cli.config.as_deref())
            .and_then(|defaults| commands::analysis::run_analyze(args, &defaults)),
        Commands::Compare(args) => commands::scenarios::run_compare(args),
        Commands::Sensitivity(args) => commands::scenarios::run_sensitivity(args),
        Commands::Version => {
            println!("reia {}", env!("CARGO_PKG_VERSION"));
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
