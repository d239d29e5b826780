use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RentcalcError;
use crate::types::{with_metadata, ComputationOutput, Money, Percent, Rate};
use crate::RentcalcResult;

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 1000;

/// Starting point for Newton-Raphson when the caller has no better guess.
pub const DEFAULT_IRR_GUESS: Rate = dec!(0.10);

// Iterates are kept inside this band so (1 + r) stays positive and the
// compounded discount factors stay representable.
const RATE_FLOOR: Rate = dec!(-0.99);
const RATE_CEILING: Rate = dec!(100.0);

/// Net Present Value of a series of cash flows
pub fn npv(rate: Rate, cash_flows: &[Money]) -> RentcalcResult<Money> {
    if rate <= dec!(-1) {
        return Err(RentcalcError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let mut result = Decimal::ZERO;
    let one_plus_r = Decimal::ONE + rate;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount
                .checked_mul(one_plus_r)
                .ok_or_else(|| RentcalcError::ArithmeticOverflow {
                    context: format!("NPV discount factor at period {t}"),
                })?;
        }
        if discount.is_zero() {
            return Err(RentcalcError::DivisionByZero {
                context: format!("NPV discount factor at period {t}"),
            });
        }
        result += cf / discount;
    }

    Ok(result)
}

/// Internal rate of return of a periodic cash-flow stream, in percent.
///
/// `cash_flows[0]` is the initial outlay (usually negative), `cash_flows[t]`
/// the flow at the end of period `t`. Newton-Raphson starting from `guess`
/// (default [`DEFAULT_IRR_GUESS`]).
///
/// Returns `None` when no root is found: a flat derivative, the iteration cap,
/// or an iterate whose discount factors cannot be represented. A stream whose
/// flows are all (close to) zero has a rate of 0 by convention.
pub fn find_rate(cash_flows: &[Money], guess: Option<Rate>) -> Option<Percent> {
    let magnitude: Decimal = cash_flows.iter().map(|cf| cf.abs()).sum();
    if magnitude < CONVERGENCE_THRESHOLD {
        return Some(Decimal::ZERO);
    }

    let mut rate = guess.unwrap_or(DEFAULT_IRR_GUESS);

    for i in 0..MAX_IRR_ITERATIONS {
        let Some((npv_val, dnpv)) = npv_and_derivative(cash_flows, rate) else {
            debug!("IRR abandoned at iteration {i}: discounting overflowed at rate {rate}");
            return None;
        };

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            debug!("IRR converged after {i} iterations: {rate}");
            return Some(rate * Decimal::ONE_HUNDRED);
        }

        if dnpv.abs() < CONVERGENCE_THRESHOLD {
            debug!("IRR abandoned at iteration {i}: flat derivative (npv {npv_val})");
            return None;
        }

        let step = npv_val.checked_div(dnpv)?;
        rate = rate.checked_sub(step)?.clamp(RATE_FLOOR, RATE_CEILING);
    }

    debug!("IRR did not converge after {MAX_IRR_ITERATIONS} iterations");
    None
}

/// NPV and dNPV/dr at `rate`, or `None` if any term overflows or the
/// discount factor collapses to zero.
fn npv_and_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r <= Decimal::ZERO {
        return None;
    }

    let mut npv_val = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = discount.checked_mul(one_plus_r)?;
        }
        npv_val = npv_val.checked_add(cf.checked_div(discount)?)?;
        if t > 0 {
            let next = discount.checked_mul(one_plus_r)?;
            let term = Decimal::from(t as u64).checked_mul(*cf)?.checked_div(next)?;
            dnpv = dnpv.checked_sub(term)?;
        }
    }

    Some((npv_val, dnpv))
}

// ---------------------------------------------------------------------------
// Standalone IRR
// ---------------------------------------------------------------------------

/// A periodic cash-flow stream to solve for its IRR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrInput {
    pub cash_flows: Vec<Money>,
    /// Starting rate as a decimal fraction.
    #[serde(default)]
    pub guess: Option<Rate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IrrOutput {
    /// Percent; `None` when no root was found.
    pub irr: Option<Percent>,
    pub periods: usize,
    pub total_inflows: Money,
    pub total_outflows: Money,
}

/// Solve a stream for its IRR and wrap the answer in the standard envelope.
pub fn calculate_irr(input: &IrrInput) -> RentcalcResult<ComputationOutput<IrrOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.cash_flows.is_empty() {
        return Err(RentcalcError::InsufficientData(
            "At least one cash flow is required".into(),
        ));
    }
    if let Some(guess) = input.guess {
        if guess <= dec!(-1) {
            return Err(RentcalcError::InvalidInput {
                field: "guess".into(),
                reason: "IRR guess must be greater than -100%".into(),
            });
        }
    }

    let total_inflows: Money = input.cash_flows.iter().filter(|cf| cf.is_sign_positive()).sum();
    let total_outflows: Money = input.cash_flows.iter().filter(|cf| cf.is_sign_negative()).sum();
    if total_inflows.is_zero() || total_outflows.is_zero() {
        warnings.push("Cash flows do not change sign — IRR is undefined unless all are zero".into());
    }

    let irr = find_rate(&input.cash_flows, input.guess);
    if irr.is_none() {
        warnings.push("IRR did not converge — reported as undefined".into());
    }

    let output = IrrOutput {
        irr,
        periods: input.cash_flows.len(),
        total_inflows,
        total_outflows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Newton-Raphson IRR",
        &serde_json::json!({
            "guess": input.guess.unwrap_or(DEFAULT_IRR_GUESS),
            "tolerance": CONVERGENCE_THRESHOLD,
            "max_iterations": MAX_IRR_ITERATIONS,
        }),
        warnings,
        elapsed,
        output,
    ))
}
