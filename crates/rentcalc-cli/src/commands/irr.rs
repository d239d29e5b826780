use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use rentcalc_core::time_value::{self, IrrInput};

use crate::input;

/// Arguments for a standalone IRR
#[derive(Args)]
pub struct IrrArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Periodic cash flows, outlay first (comma-separated, e.g. "-24000,-3000,500,95000")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    /// Starting rate as a decimal fraction (default 0.10)
    #[arg(long, allow_hyphen_values = true)]
    pub guess: Option<Decimal>,
}

pub fn run_irr(args: IrrArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let irr_input: IrrInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(cash_flows) = args.cash_flows {
        IrrInput {
            cash_flows,
            guess: args.guess,
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--cash-flows, --input <file.json> or stdin required for IRR".into());
    };

    let result = time_value::calculate_irr(&irr_input)?;
    Ok(serde_json::to_value(result)?)
}
