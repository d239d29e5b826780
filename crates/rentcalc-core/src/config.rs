use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RentcalcError;
use crate::types::{Money, Percent, Rate};
use crate::RentcalcResult;

/// Engine parameters that are rules of the tax regime rather than
/// properties of a particular deal.
///
/// Every field has a default, so a partial JSON document (or `{}`) is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// The nominal marginal tax rate is divided by this factor to obtain the
    /// rate applied to rental profits and losses. The default of 1.09 was
    /// calibrated against a third-party calculator and should be confirmed
    /// for the jurisdiction being modelled.
    pub tax_surcharge_factor: Decimal,
    /// Bonus depreciation taken per year, as a percent of the capped base.
    pub bonus_depreciation_rate_percent: Percent,
    /// Number of years (starting with year 1) in which bonus depreciation applies.
    pub bonus_depreciation_years: u32,
    /// Ceiling on the depreciable building cost per m² for the bonus base.
    pub bonus_cost_cap_per_sqm: Money,
    /// Straight-line useful life of furniture and fittings.
    pub furniture_useful_life_years: u32,
    /// Sales within this many years are subject to capital-gains tax.
    pub speculation_period_years: u32,
    /// Newton-Raphson starting rate for the IRR (decimal fraction).
    pub irr_guess: Rate,
    /// Longest projection horizon accepted.
    pub max_holding_period_years: u32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            tax_surcharge_factor: dec!(1.09),
            bonus_depreciation_rate_percent: dec!(5),
            bonus_depreciation_years: 4,
            bonus_cost_cap_per_sqm: dec!(4000),
            furniture_useful_life_years: 10,
            speculation_period_years: 10,
            irr_guess: dec!(0.10),
            max_holding_period_years: 100,
        }
    }
}

impl ProjectionConfig {
    /// Parse a configuration from JSON, falling back to defaults for any
    /// missing key.
    pub fn from_json(json: &str) -> RentcalcResult<Self> {
        let config: ProjectionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the tax computation meaningless.
    pub fn validate(&self) -> RentcalcResult<()> {
        if self.tax_surcharge_factor <= Decimal::ZERO {
            return Err(RentcalcError::InvalidInput {
                field: "tax_surcharge_factor".into(),
                reason: "Surcharge factor must be positive".into(),
            });
        }
        if self.bonus_cost_cap_per_sqm < Decimal::ZERO {
            return Err(RentcalcError::InvalidInput {
                field: "bonus_cost_cap_per_sqm".into(),
                reason: "Bonus cost cap cannot be negative".into(),
            });
        }
        if self.irr_guess <= dec!(-1) {
            return Err(RentcalcError::InvalidInput {
                field: "irr_guess".into(),
                reason: "IRR guess must be greater than -100%".into(),
            });
        }
        Ok(())
    }
}
