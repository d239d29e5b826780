use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::inputs::DepreciationMethod;
use crate::config::ProjectionConfig;
use crate::types::{pct, Money, Percent, SquareMeters};

/// Time-limited additional allowance on top of base depreciation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BonusAllowance {
    pub annual_amount: Money,
    /// Last year (inclusive) in which the allowance is taken.
    pub final_year: u32,
}

impl BonusAllowance {
    /// `rate × min(base / m², cap / m²) × m²`. Undefined (and therefore
    /// `None`) for a property without a floor area.
    pub fn for_building(
        depreciation_base: Money,
        size_sqm: SquareMeters,
        config: &ProjectionConfig,
    ) -> Option<Self> {
        if size_sqm <= Decimal::ZERO {
            return None;
        }
        let cost_per_sqm = (depreciation_base / size_sqm).min(config.bonus_cost_cap_per_sqm);
        Some(Self {
            annual_amount: cost_per_sqm * size_sqm * pct(config.bonus_depreciation_rate_percent),
            final_year: config.bonus_depreciation_years,
        })
    }

    fn amount_in(&self, year: u32) -> Money {
        if year <= self.final_year {
            self.annual_amount
        } else {
            Decimal::ZERO
        }
    }
}

/// Depreciation taken on the building in one year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DepreciationYear {
    pub base: Money,
    pub bonus: Money,
}

impl DepreciationYear {
    pub fn total(&self) -> Money {
        self.base + self.bonus
    }
}

/// Running book value of the building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepreciationSchedule {
    pub original_base: Money,
    pub book_value: Money,
    pub method: DepreciationMethod,
    pub rate_percent: Percent,
    pub bonus: Option<BonusAllowance>,
}

impl DepreciationSchedule {
    pub fn new(
        original_base: Money,
        method: DepreciationMethod,
        rate_percent: Percent,
        bonus: Option<BonusAllowance>,
    ) -> Self {
        Self {
            original_base,
            book_value: original_base.max(Decimal::ZERO),
            method,
            rate_percent,
            bonus,
        }
    }

    /// Take `year`'s depreciation and reduce the book value by it. The
    /// deduction is the full base plus bonus every year; only the book value
    /// is floored at zero.
    pub fn step(&mut self, year: u32) -> DepreciationYear {
        let base = match self.method {
            DepreciationMethod::Linear => self.original_base * pct(self.rate_percent),
            DepreciationMethod::Declining => self.book_value * pct(self.rate_percent),
        };
        let bonus = self.bonus.map_or(Decimal::ZERO, |b| b.amount_in(year));

        self.book_value = (self.book_value - base - bonus).max(Decimal::ZERO);

        DepreciationYear { base, bonus }
    }
}

/// Straight-line depreciation of furniture over its useful life.
pub fn furniture_depreciation(furniture_cost: Money, year: u32, useful_life_years: u32) -> Money {
    if furniture_cost <= Decimal::ZERO || useful_life_years == 0 || year > useful_life_years {
        return Decimal::ZERO;
    }
    furniture_cost / Decimal::from(useful_life_years)
}

/// Renovation is expensed in full in the first year.
pub fn renovation_deduction(renovation_cost: Money, year: u32) -> Money {
    if year == 1 && renovation_cost > Decimal::ZERO {
        renovation_cost
    } else {
        Decimal::ZERO
    }
}
