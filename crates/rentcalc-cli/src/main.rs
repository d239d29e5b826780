mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::irr::IrrArgs;
use commands::projection::ProjectArgs;
use commands::sensitivity::SensitivityArgs;

/// Buy-to-let investment projections
#[derive(Parser)]
#[command(
    name = "rentcalc",
    version,
    about = "Buy-to-let investment projections",
    long_about = "A CLI for projecting leveraged rental-property investments year by year \
                  with decimal precision. Supports full projections, timeline export, \
                  standalone IRR and sensitivity sweeps over any numeric input."
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
    /// Project an investment and report all metrics
    Project(ProjectArgs),
    /// Project an investment and emit only the year-by-year timeline
    Timeline(ProjectArgs),
    /// Internal rate of return of a periodic cash-flow stream
    Irr(IrrArgs),
    /// Sweep one or two inputs and tabulate a chosen metric
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

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Project(args) => commands::projection::run_project(args),
        Commands::Timeline(args) => commands::projection::run_timeline(args),
        Commands::Irr(args) => commands::irr::run_irr(args),
        Commands::Sensitivity(args) => commands::sensitivity::run_sensitivity(args),
        Commands::Version => {
            println!("rentcalc {}", env!("CARGO_PKG_VERSION"));
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
