use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::inputs::InvestmentInputs;
use crate::types::{Money, Multiple, Percent};

/// Debt service coverage. `Unbounded` when there is no debt service but the
/// property earns a positive NOI; it is not a number and must not enter
/// aggregate arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dscr {
    Ratio(Decimal),
    Unbounded,
}

impl Dscr {
    pub fn compute(noi: Money, debt_service: Money) -> Self {
        if debt_service > Decimal::ZERO {
            Dscr::Ratio(noi / debt_service)
        } else if noi > Decimal::ZERO {
            Dscr::Unbounded
        } else {
            Dscr::Ratio(Decimal::ZERO)
        }
    }

    pub fn ratio(&self) -> Option<Decimal> {
        match self {
            Dscr::Ratio(r) => Some(*r),
            Dscr::Unbounded => None,
        }
    }
}

/// Snapshot of one simulated year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineYear {
    pub year: u32,
    pub potential_rent: Money,
    /// Rent after vacancy loss.
    pub rental_income: Money,
    pub noi: Money,
    pub operating_costs: Money,
    pub interest_payment: Money,
    pub principal_payment: Money,
    /// Building depreciation (base plus bonus).
    pub depreciation: Money,
    pub taxable_income: Money,
    pub tax_payable: Money,
    pub tax_saved: Money,
    pub cash_flow_pre_tax: Money,
    pub cash_flow_post_tax: Money,
    /// Repayment subsidy written off the secondary balance this year.
    pub subsidy_applied: Money,
    /// Combined balance of both facilities at year end.
    pub loan_balance: Money,
    pub book_value: Money,
    pub property_value: Money,
    /// Loan balance over property value, as a fraction.
    pub ltv: Decimal,
}

impl TimelineYear {
    pub fn debt_service(&self) -> Money {
        self.interest_payment + self.principal_payment
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionMetrics {
    pub purchase_costs: Money,
    pub total_investment: Money,
    pub equity_required: Money,
    pub depreciation_base: Money,
    pub price_per_sqm: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatingMetrics {
    /// Year-1 NOI
    pub noi: Money,
    pub net_yield: Percent,
    pub gross_yield: Percent,
    /// Potential rent over total investment.
    pub gross_yield_on_investment: Percent,
    pub expense_ratio: Percent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancingMetrics {
    pub debt_service_year1: Money,
    pub initial_dscr: Dscr,
    pub loan_amount_total: Money,
    pub loan_amount_primary: Money,
    pub loan_amount_secondary: Money,
    pub blended_interest_rate: Percent,
    pub repayment_subsidy: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnMetrics {
    pub cash_flow_pre_tax_year1: Money,
    pub cash_flow_post_tax_year1: Money,
    pub cash_on_cash_avg: Percent,
    pub roe_avg: Percent,
    pub roi_total: Percent,
    pub roi_annualized: Percent,
    pub break_even_rent_monthly: Money,
    pub equity_multiple: Multiple,
    /// `None` when the solver did not converge.
    pub irr: Option<Percent>,
    pub timeline: Vec<TimelineYear>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WealthMetrics {
    pub exit_sale_price: Money,
    pub remaining_debt: Money,
    pub exit_tax: Money,
    pub net_exit_proceeds: Money,
    pub wealth_accumulation: Money,
    pub cumulative_tax_savings: Money,
    pub total_economic_benefit: Money,
    pub holding_years: u32,
    pub exit_price_per_sqm: Money,
}

/// Complete projection result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    pub inputs: InvestmentInputs,
    pub acquisition: AcquisitionMetrics,
    pub operations: OperatingMetrics,
    pub financing: FinancingMetrics,
    pub return_metrics: ReturnMetrics,
    pub wealth: WealthMetrics,
}
