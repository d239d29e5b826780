use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use rentcalc_core::projection::InvestmentInputs;
use rentcalc_core::sensitivity::{self, OutputMetric, SensitivityInput};
use rentcalc_core::{ProjectionConfig, SensitivityVariable};

use crate::input;

/// Arguments for sensitivity analysis
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to a complete sensitivity document (base inputs, variables, metric)
    #[arg(long)]
    pub input: Option<String>,

    /// Path to base-case investment inputs, used with --var1 and --metric
    #[arg(long)]
    pub base_inputs: Option<String>,

    /// First sensitivity variable in format name:min:max:step
    /// (e.g. "interest_rate_percent:3:6:0.5")
    #[arg(long)]
    pub var1: Option<String>,

    /// Second sensitivity variable (optional, creates a 2D table)
    #[arg(long)]
    pub var2: Option<String>,

    /// Metric to tabulate, e.g. irr, cash_on_cash_avg, net_yield
    #[arg(long)]
    pub metric: Option<String>,

    /// Path to a projection config overriding the tax-regime defaults
    #[arg(long)]
    pub config: Option<String>,
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sens_input: SensitivityInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(ref base_path) = args.base_inputs {
        from_flags(&args, base_path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json>, --base-inputs with --var1, or stdin required for sensitivity".into());
    };

    let result = sensitivity::run_sensitivity(&sens_input)?;
    Ok(serde_json::to_value(result)?)
}

fn from_flags(
    args: &SensitivityArgs,
    base_path: &str,
) -> Result<SensitivityInput, Box<dyn std::error::Error>> {
    let base_inputs: InvestmentInputs = input::file::read_input(base_path)?;
    let var1 = args
        .var1
        .as_deref()
        .ok_or("--var1 is required (or provide --input)")?;
    let metric = args
        .metric
        .as_deref()
        .ok_or("--metric is required (or provide --input)")?;

    let config = match args.config {
        Some(ref path) => input::file::read_input(path)?,
        None => ProjectionConfig::default(),
    };

    Ok(SensitivityInput {
        base_inputs,
        variable_1: parse_sens_var(var1)?,
        variable_2: args.var2.as_deref().map(parse_sens_var).transpose()?,
        output_metric: parse_metric(metric)?,
        config,
    })
}

fn parse_sens_var(spec: &str) -> Result<SensitivityVariable, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 4 {
        return Err(format!(
            "Sensitivity variable must be name:min:max:step, got '{}'",
            spec
        )
        .into());
    }
    Ok(SensitivityVariable {
        name: parts[0].to_string(),
        min: parts[1].parse::<Decimal>()?,
        max: parts[2].parse::<Decimal>()?,
        step: parts[3].parse::<Decimal>()?,
    })
}

fn parse_metric(name: &str) -> Result<OutputMetric, Box<dyn std::error::Error>> {
    serde_json::from_value(Value::String(name.to_string()))
        .map_err(|_| format!("Unknown metric '{}'", name).into())
}
