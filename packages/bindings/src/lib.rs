use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;

use rentcalc_core::projection::{self, InvestmentInputs};
use rentcalc_core::sensitivity::{self, SensitivityInput};
use rentcalc_core::time_value::{self, IrrInput};
use rentcalc_core::ProjectionConfig;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_config(config_json: Option<String>) -> NapiResult<ProjectionConfig> {
    match config_json {
        Some(json) => ProjectionConfig::from_json(&json).map_err(to_napi_error),
        None => Ok(ProjectionConfig::default()),
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

#[napi]
pub fn project(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: InvestmentInputs = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let output = projection::project_with_config(&input, &config).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn project_timeline(input_json: String, config_json: Option<String>) -> NapiResult<String> {
    let input: InvestmentInputs = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let config = parse_config(config_json)?;
    let output = projection::project_with_config(&input, &config).map_err(to_napi_error)?;
    serde_json::to_string(&output.result.return_metrics.timeline).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// IRR
// ---------------------------------------------------------------------------

/// `cash_flows_json` is a JSON array of amounts; `guess` a decimal-fraction string.
#[napi]
pub fn find_rate(cash_flows_json: String, guess: Option<String>) -> NapiResult<String> {
    let cash_flows: Vec<Decimal> =
        serde_json::from_str(&cash_flows_json).map_err(to_napi_error)?;
    let guess = guess
        .map(|g| g.parse::<Decimal>())
        .transpose()
        .map_err(to_napi_error)?;
    let output = time_value::calculate_irr(&IrrInput { cash_flows, guess }).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Sensitivity
// ---------------------------------------------------------------------------

#[napi]
pub fn sensitivity(input_json: String) -> NapiResult<String> {
    let input: SensitivityInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = sensitivity::run_sensitivity(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
