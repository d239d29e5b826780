use serde::{Deserialize, Serialize};

use crate::types::{Money, Percent, SquareMeters};

// ---------------------------------------------------------------------------
// Tagged choices
// ---------------------------------------------------------------------------

/// How the building's base depreciation is computed each year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepreciationMethod {
    /// Fixed percentage of the original depreciation base.
    #[default]
    Linear,
    /// Fixed percentage of the current book value.
    Declining,
}

/// Programme of the secondary (subsidised) facility.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryLoanType {
    /// Renovation programme (code 261): the only type that carries a
    /// repayment subsidy.
    #[default]
    #[serde(alias = "261")]
    Renovation261,
    /// Climate-friendly new build with sustainability seal.
    Qng40,
    /// Any other promotional loan without a principal write-down.
    Standard,
}

impl SecondaryLoanType {
    pub fn carries_repayment_subsidy(self) -> bool {
        matches!(self, SecondaryLoanType::Renovation261)
    }
}

/// Terms of the secondary facility.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryLoan {
    pub loan_type: SecondaryLoanType,
    /// Requested amount; capped at the total financing need.
    pub amount: Money,
    pub interest_rate_percent: Percent,
    pub repayment_rate_percent: Percent,
    /// Initial years in which only interest is paid.
    pub grace_period_years: u32,
    /// Principal write-down granted by the programme, percent of the amount.
    pub repayment_subsidy_percent: Percent,
}

/// Whether a secondary facility is drawn alongside the primary loan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecondaryFacility {
    #[default]
    None,
    Enabled(SecondaryLoan),
}

impl SecondaryFacility {
    pub fn terms(&self) -> Option<&SecondaryLoan> {
        match self {
            SecondaryFacility::None => None,
            SecondaryFacility::Enabled(loan) => Some(loan),
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Assumptions for one buy-to-let projection. All percentages are in percent
/// units; missing numeric fields deserialize as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestmentInputs {
    // Acquisition
    pub purchase_price: Money,
    pub transfer_tax_percent: Percent,
    pub notary_percent: Percent,
    pub broker_percent: Percent,
    pub size_sqm: SquareMeters,
    /// Share of the price attributable to the depreciable building.
    pub building_share_percent: Percent,

    // Operating
    pub monthly_cold_rent: Money,
    pub vacancy_rate_percent: Percent,
    /// Operating costs that cannot be passed on to the tenant.
    pub operating_costs_monthly: Money,
    pub management_costs_monthly: Money,
    pub maintenance_reserve_monthly: Money,

    // Growth
    pub rent_increase_percent: Percent,
    pub cost_increase_percent: Percent,
    pub appreciation_percent: Percent,

    // Primary financing
    pub loan_percent: Percent,
    pub interest_rate_percent: Percent,
    pub repayment_rate_percent: Percent,
    /// Fixed-rate period of the primary loan.
    pub loan_term_years: u32,

    // Secondary financing
    pub secondary: SecondaryFacility,

    // Depreciation
    pub depreciation_method: DepreciationMethod,
    pub bonus_depreciation: bool,
    pub depreciation_rate_percent: Percent,

    // Tax
    pub tax_rate_percent: Percent,
    pub holding_period_years: u32,
    /// Applied to the exit gain only inside the speculation period.
    pub capital_gains_tax_percent: Percent,
    pub renovation_cost: Money,
    pub furniture_cost: Money,
}

impl InvestmentInputs {
    /// Combined transfer tax, notary and broker percentage.
    pub fn purchase_cost_percent(&self) -> Percent {
        self.transfer_tax_percent + self.notary_percent + self.broker_percent
    }

    /// Monthly non-recoverable, management and maintenance costs.
    pub fn monthly_costs(&self) -> Money {
        self.operating_costs_monthly + self.management_costs_monthly + self.maintenance_reserve_monthly
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_missing_fields_default_to_zero() {
        let inputs: InvestmentInputs =
            serde_json::from_str(r#"{"purchase_price": 250000, "holding_period_years": 5}"#).unwrap();
        assert_eq!(inputs.purchase_price, dec!(250000));
        assert_eq!(inputs.monthly_cold_rent, Decimal::ZERO);
        assert_eq!(inputs.secondary, SecondaryFacility::None);
        assert_eq!(inputs.depreciation_method, DepreciationMethod::Linear);
    }

    #[test]
    fn test_secondary_facility_tagged_json() {
        let json = r#"{
            "secondary": {
                "enabled": {
                    "loan_type": "261",
                    "amount": 100000,
                    "interest_rate_percent": 1.0,
                    "repayment_rate_percent": 3.0,
                    "grace_period_years": 1,
                    "repayment_subsidy_percent": 5.0
                }
            },
            "depreciation_method": "declining"
        }"#;
        let inputs: InvestmentInputs = serde_json::from_str(json).unwrap();
        let terms = inputs.secondary.terms().unwrap();
        assert_eq!(terms.loan_type, SecondaryLoanType::Renovation261);
        assert!(terms.loan_type.carries_repayment_subsidy());
        assert_eq!(terms.amount, dec!(100000));
        assert_eq!(inputs.depreciation_method, DepreciationMethod::Declining);
    }

    #[test]
    fn test_only_renovation_programme_carries_subsidy() {
        assert!(!SecondaryLoanType::Qng40.carries_repayment_subsidy());
        assert!(!SecondaryLoanType::Standard.carries_repayment_subsidy());
    }

    #[test]
    fn test_purchase_cost_percent_sums_components() {
        let inputs = InvestmentInputs {
            transfer_tax_percent: dec!(6),
            notary_percent: dec!(2),
            broker_percent: dec!(3.57),
            ..Default::default()
        };
        assert_eq!(inputs.purchase_cost_percent(), dec!(11.57));
    }
}
