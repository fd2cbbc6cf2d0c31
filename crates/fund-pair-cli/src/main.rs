mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::allocation::AllocateArgs;
use commands::pairing::{AnalyzeArgs, FrontierArgs, RankArgs, SummaryArgs};

/// Two-asset fund pairing and incremental allocation
#[derive(Parser)]
#[command(
    name = "fpo",
    version,
    about = "Two-asset fund pairing and incremental allocation",
    long_about = "A CLI that pairs a held fund with the candidate giving the best \
                  minimum-variance blend, traces the pair's efficient frontier and \
                  plans how to invest new capital, all with decimal precision."
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
    /// Per-fund mean, variance, Sharpe ratio and the covariance matrix
    Summary(SummaryArgs),
    /// Rank every candidate fund against the target
    Rank(RankArgs),
    /// Efficient frontier of a target/candidate pair
    Frontier(FrontierArgs),
    /// Split new capital toward a target weight without selling
    Allocate(AllocateArgs),
    /// Rank, trace the best pair's frontier and plan an allocation
    Analyze(AnalyzeArgs),
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

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Summary(args) => commands::pairing::run_summary(args),
        Commands::Rank(args) => commands::pairing::run_rank(args),
        Commands::Frontier(args) => commands::pairing::run_frontier(args),
        Commands::Allocate(args) => commands::allocation::run_allocate(args),
        Commands::Analyze(args) => commands::pairing::run_analyze(args),
        Commands::Version => {
            println!("fpo {}", env!("CARGO_PKG_VERSION"));
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
