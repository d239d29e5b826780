use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RentcalcError;
use crate::RentcalcResult;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimal fractions (0.05 = 5%). Used inside the solver.
pub type Rate = Decimal;

/// Rates expressed in percent units (4.5 = 4.5%). Every user-facing
/// percentage is stored this way and divided by 100 only at point of use.
pub type Percent = Decimal;

/// Multiples (e.g., 2.1x equity multiple)
pub type Multiple = Decimal;

/// Floor area in square metres
pub type SquareMeters = Decimal;

/// Sensitivity variable specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityVariable {
    pub name: String,
    pub min: Decimal,
    pub max: Decimal,
    pub step: Decimal,
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

/// Percentage to decimal fraction (4.5 -> 0.045).
pub(crate) fn pct(value: Percent) -> Rate {
    value / Decimal::ONE_HUNDRED
}

/// `a × b`, or `ArithmeticOverflow` naming `context`.
pub(crate) fn checked_mul(a: Decimal, b: Decimal, context: &str) -> RentcalcResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| RentcalcError::ArithmeticOverflow {
        context: context.to_string(),
    })
}

/// Sum of `values`, or `ArithmeticOverflow` naming `context`.
pub(crate) fn checked_sum(values: &[Decimal], context: &str) -> RentcalcResult<Decimal> {
    values.iter().try_fold(Decimal::ZERO, |acc, v| {
        acc.checked_add(*v).ok_or_else(|| RentcalcError::ArithmeticOverflow {
            context: context.to_string(),
        })
    })
}

/// `numerator / denominator`, or zero when the denominator is zero.
pub(crate) fn ratio_or_zero(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}
