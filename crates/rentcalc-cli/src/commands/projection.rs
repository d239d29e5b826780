use clap::Args;
use log::debug;
use serde_json::Value;

use rentcalc_core::projection::{self, InvestmentInputs};
use rentcalc_core::ProjectionConfig;

use crate::input;

/// Arguments shared by `project` and `timeline`
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to JSON or YAML investment inputs (stdin if omitted)
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a projection config overriding the tax-regime defaults
    #[arg(long)]
    pub config: Option<String>,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (inputs, config) = load(&args)?;
    let result = projection::project_with_config(&inputs, &config)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_timeline(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let (inputs, config) = load(&args)?;
    // Warnings are already logged by the core; the envelope is dropped here.
    let result = projection::project_with_config(&inputs, &config)?;
    Ok(serde_json::to_value(result.result.return_metrics.timeline)?)
}

fn load(args: &ProjectArgs) -> Result<(InvestmentInputs, ProjectionConfig), Box<dyn std::error::Error>> {
    let inputs: InvestmentInputs = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input <file.json> or stdin required for projection".into());
    };

    let config = match args.config {
        Some(ref path) => {
            let config: ProjectionConfig = input::file::read_input(path)?;
            config.validate()?;
            debug!("Using projection config from {path}: {config:?}");
            config
        }
        None => ProjectionConfig::default(),
    };

    Ok((inputs, config))
}
