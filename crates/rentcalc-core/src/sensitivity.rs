use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;

use crate::config::ProjectionConfig;
use crate::error::RentcalcError;
use crate::projection::{project_with_config, InvestmentInputs, MetricsResult};
use crate::types::*;
use crate::RentcalcResult;

const MAX_SWEEP_POINTS: usize = 500;

/// Projection output measured at every grid point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMetric {
    Irr,
    CashOnCashAvg,
    RoeAvg,
    RoiAnnualized,
    EquityMultiple,
    NetYield,
    WealthAccumulation,
    TotalEconomicBenefit,
    CashFlowPostTaxYear1,
}

impl OutputMetric {
    /// `None` only for an undefined IRR.
    pub fn extract(&self, result: &MetricsResult) -> Option<Decimal> {
        let r = &result.return_metrics;
        match self {
            OutputMetric::Irr => r.irr,
            OutputMetric::CashOnCashAvg => Some(r.cash_on_cash_avg),
            OutputMetric::RoeAvg => Some(r.roe_avg),
            OutputMetric::RoiAnnualized => Some(r.roi_annualized),
            OutputMetric::EquityMultiple => Some(r.equity_multiple),
            OutputMetric::NetYield => Some(result.operations.net_yield),
            OutputMetric::WealthAccumulation => Some(result.wealth.wealth_accumulation),
            OutputMetric::TotalEconomicBenefit => Some(result.wealth.total_economic_benefit),
            OutputMetric::CashFlowPostTaxYear1 => Some(r.cash_flow_post_tax_year1),
        }
    }
}

/// Input for a one- or two-way sweep over projection inputs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    pub base_inputs: InvestmentInputs,
    /// Swept along the rows. `name` is an `InvestmentInputs` field.
    pub variable_1: SensitivityVariable,
    /// Swept along the columns; a single column when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_2: Option<SensitivityVariable>,
    pub output_metric: OutputMetric,
    #[serde(default)]
    pub config: ProjectionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub variable_1_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_2_name: Option<String>,
    pub variable_1_values: Vec<Decimal>,
    pub variable_2_values: Vec<Decimal>,
    pub output_metric: OutputMetric,
    /// Matrix[i][j] = output when variable_1 = variable_1_values[i], variable_2 = variable_2_values[j]
    pub matrix: Vec<Vec<Option<Decimal>>>,
    /// Output for the unmodified base inputs
    pub base_case_value: Option<Decimal>,
}

/// Re-run the projection over the sweep grid and collect one metric.
pub fn run_sensitivity(
    input: &SensitivityInput,
) -> RentcalcResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.config.validate()?;

    let v1_values = generate_sweep_values(&input.variable_1)?;
    let v2_values = match &input.variable_2 {
        Some(var) => generate_sweep_values(var)?,
        None => Vec::new(),
    };

    let base = project_with_config(&input.base_inputs, &input.config)?;
    let base_case_value = input.output_metric.extract(&base.result);

    let mut matrix = Vec::with_capacity(v1_values.len());
    for v1 in &v1_values {
        let row_inputs = apply_override(&input.base_inputs, &input.variable_1.name, *v1)?;
        let row = match &input.variable_2 {
            None => vec![evaluate(&row_inputs, input, &mut warnings)],
            Some(var2) => {
                let mut row = Vec::with_capacity(v2_values.len());
                for v2 in &v2_values {
                    let cell_inputs = apply_override(&row_inputs, &var2.name, *v2)?;
                    row.push(evaluate(&cell_inputs, input, &mut warnings));
                }
                row
            }
        };
        matrix.push(row);
    }

    debug!(
        "Sensitivity {:?}: {} x {} grid",
        input.output_metric,
        v1_values.len(),
        v2_values.len().max(1)
    );

    let output = SensitivityOutput {
        variable_1_name: input.variable_1.name.clone(),
        variable_2_name: input.variable_2.as_ref().map(|v| v.name.clone()),
        variable_1_values: v1_values,
        variable_2_values: v2_values,
        output_metric: input.output_metric,
        matrix,
        base_case_value,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Projection Sensitivity Analysis",
        &serde_json::json!({
            "variable_1": input.variable_1.name,
            "variable_2": input.variable_2.as_ref().map(|v| &v.name),
            "output_metric": input.output_metric,
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn evaluate(
    inputs: &InvestmentInputs,
    input: &SensitivityInput,
    warnings: &mut Vec<String>,
) -> Option<Decimal> {
    match project_with_config(inputs, &input.config) {
        Ok(out) => input.output_metric.extract(&out.result),
        Err(e) => {
            warnings.push(format!("Evaluation failed: {e}"));
            None
        }
    }
}

/// Generate the sweep values for a sensitivity variable from min to max with step.
fn generate_sweep_values(var: &SensitivityVariable) -> RentcalcResult<Vec<Decimal>> {
    if var.step <= Decimal::ZERO {
        return Err(RentcalcError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Step must be positive".into(),
        });
    }
    if var.min > var.max {
        return Err(RentcalcError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Min must be <= max".into(),
        });
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        if values.len() >= MAX_SWEEP_POINTS {
            return Err(RentcalcError::InvalidInput {
                field: format!("variable:{}", var.name),
                reason: format!("Sweep exceeds {MAX_SWEEP_POINTS} points"),
            });
        }
        values.push(current);
        current += var.step;
    }
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }

    Ok(values)
}

/// Copy of `base` with one numeric field replaced.
fn apply_override(
    base: &InvestmentInputs,
    field: &str,
    value: Decimal,
) -> RentcalcResult<InvestmentInputs> {
    let mut json = serde_json::to_value(base)?;
    let slot = json
        .as_object_mut()
        .and_then(|map| map.get_mut(field))
        .ok_or_else(|| RentcalcError::InvalidInput {
            field: field.into(),
            reason: "Not an input field".into(),
        })?;

    let replacement = match &*slot {
        // Decimal fields serialize as strings.
        Value::String(s) if s.parse::<Decimal>().is_ok() => Value::String(value.to_string()),
        // Year counts serialize as integers.
        Value::Number(_) => {
            let years = if value.fract().is_zero() { value.to_u32() } else { None };
            let years = years.ok_or_else(|| RentcalcError::InvalidInput {
                field: field.into(),
                reason: format!("{value} is not a whole, non-negative number of years"),
            })?;
            Value::from(years)
        }
        _ => {
            return Err(RentcalcError::InvalidInput {
                field: field.into(),
                reason: "Only numeric fields can be swept".into(),
            })
        }
    };
    *slot = replacement;

    Ok(serde_json::from_value(json)?)
}
