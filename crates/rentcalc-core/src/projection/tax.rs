use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::ProjectionConfig;
use crate::types::{pct, Money, Percent, Rate};

/// Rate applied to rental profit or loss: the marginal rate divided by the
/// configured surcharge factor.
pub fn effective_tax_rate(tax_rate_percent: Percent, config: &ProjectionConfig) -> Rate {
    if config.tax_surcharge_factor.is_zero() {
        return pct(tax_rate_percent);
    }
    pct(tax_rate_percent) / config.tax_surcharge_factor
}

/// Tax consequence of one year's rental result. At most one side is non-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxEffect {
    pub payable: Money,
    /// Relief on the investor's other income from a rental loss.
    pub saved: Money,
}

impl TaxEffect {
    pub fn on(taxable_income: Money, effective_rate: Rate) -> Self {
        if taxable_income > Decimal::ZERO {
            Self {
                payable: taxable_income * effective_rate,
                saved: Decimal::ZERO,
            }
        } else {
            Self {
                payable: Decimal::ZERO,
                saved: -taxable_income * effective_rate,
            }
        }
    }
}

/// Capital-gains tax on the exit, only inside the speculation period.
pub fn exit_tax(
    sale_price: Money,
    cost_basis: Money,
    holding_period_years: u32,
    capital_gains_tax_percent: Percent,
    config: &ProjectionConfig,
) -> Money {
    if holding_period_years >= config.speculation_period_years
        || capital_gains_tax_percent <= Decimal::ZERO
    {
        return Decimal::ZERO;
    }
    let gain = sale_price - cost_basis;
    if gain > Decimal::ZERO {
        gain * pct(capital_gains_tax_percent)
    } else {
        Decimal::ZERO
    }
}
