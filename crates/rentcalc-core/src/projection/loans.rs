use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::inputs::InvestmentInputs;
use crate::types::{checked_mul, checked_sum, pct, Money, Percent};
use crate::RentcalcResult;

/// One annual debt-service split.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoanYear {
    pub interest: Money,
    pub principal: Money,
}

impl LoanYear {
    pub fn debt_service(&self) -> Money {
        self.interest + self.principal
    }
}

/// An amortizing facility with an annuity fixed at origination
/// (`principal × (interest% + repayment%)`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTranche {
    pub principal: Money,
    pub balance: Money,
    pub annuity: Money,
    pub interest_rate_percent: Percent,
    /// Years (from year 1) in which no principal is due.
    pub grace_period_years: u32,
}

impl LoanTranche {
    pub fn new(
        principal: Money,
        interest_rate_percent: Percent,
        repayment_rate_percent: Percent,
        grace_period_years: u32,
    ) -> RentcalcResult<Self> {
        let annuity_rate = checked_sum(&[interest_rate_percent, repayment_rate_percent], "annuity rate")?;
        Ok(Self {
            principal,
            balance: principal,
            annuity: checked_mul(principal, pct(annuity_rate), "loan annuity")?,
            interest_rate_percent,
            grace_period_years,
        })
    }

    /// Interest and principal due in `year` on the current balance.
    /// Principal never exceeds the balance and is never negative.
    pub fn step(&self, year: u32) -> LoanYear {
        if self.balance <= Decimal::ZERO {
            return LoanYear::default();
        }

        let interest = self.balance * pct(self.interest_rate_percent);
        let principal = if year <= self.grace_period_years {
            Decimal::ZERO
        } else {
            (self.annuity - interest)
                .min(self.balance)
                .max(Decimal::ZERO)
        };

        LoanYear {
            interest,
            principal,
        }
    }

    pub fn repay(&mut self, principal: Money) {
        self.balance = (self.balance - principal).max(Decimal::ZERO);
    }

    /// Reduce the balance by a non-cash write-down, returning the amount
    /// actually applied.
    pub fn write_down(&mut self, amount: Money) -> Money {
        let applied = amount.min(self.balance).max(Decimal::ZERO);
        self.balance -= applied;
        applied
    }
}

/// The split of the total financing need across both facilities.
#[derive(Debug, Clone, PartialEq)]
pub struct FinancingPlan {
    /// Price × loan% plus financed renovation and furniture.
    pub total: Money,
    pub primary: LoanTranche,
    pub secondary: Option<LoanTranche>,
    /// Programme write-down on the secondary facility, applied in year 1.
    pub repayment_subsidy: Money,
    /// True when the requested secondary amount exceeded the total need.
    pub secondary_capped: bool,
}

impl FinancingPlan {
    pub fn from_inputs(inputs: &InvestmentInputs) -> RentcalcResult<Self> {
        let purchase_loan = checked_mul(inputs.purchase_price, pct(inputs.loan_percent), "purchase loan")?;
        let total = checked_sum(
            &[purchase_loan, inputs.renovation_cost, inputs.furniture_cost],
            "total financing",
        )?;

        let mut secondary_capped = false;
        let mut repayment_subsidy = Decimal::ZERO;
        let secondary = match inputs.secondary.terms() {
            Some(terms) => {
                let mut amount = terms.amount.max(Decimal::ZERO);
                if amount > total {
                    amount = total.max(Decimal::ZERO);
                    secondary_capped = true;
                }
                if terms.loan_type.carries_repayment_subsidy() {
                    repayment_subsidy =
                        checked_mul(amount, pct(terms.repayment_subsidy_percent), "repayment subsidy")?;
                }
                Some(LoanTranche::new(
                    amount,
                    terms.interest_rate_percent,
                    terms.repayment_rate_percent,
                    terms.grace_period_years,
                )?)
            }
            None => None,
        };

        let secondary_amount = secondary.as_ref().map_or(Decimal::ZERO, |s| s.principal);
        let primary = LoanTranche::new(
            total - secondary_amount,
            inputs.interest_rate_percent,
            inputs.repayment_rate_percent,
            0,
        )?;

        Ok(Self {
            total,
            primary,
            secondary,
            repayment_subsidy,
            secondary_capped,
        })
    }

    pub fn balance(&self) -> Money {
        self.primary.balance + self.secondary.as_ref().map_or(Decimal::ZERO, |s| s.balance)
    }

    pub fn drawn(&self) -> Money {
        self.primary.principal + self.secondary.as_ref().map_or(Decimal::ZERO, |s| s.principal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::inputs::{SecondaryFacility, SecondaryLoan, SecondaryLoanType};
    use rust_decimal_macros::dec;

    #[test]
    fn test_annuity_fixed_from_original_principal() {
        let loan = LoanTranche::new(dec!(100000), dec!(4), dec!(2), 0).unwrap();
        assert_eq!(loan.annuity, dec!(6000));
        let y1 = loan.step(1);
        assert_eq!(y1.interest, dec!(4000));
        assert_eq!(y1.principal, dec!(2000));
        assert_eq!(y1.debt_service(), dec!(6000));
    }

    #[test]
    fn test_full_amortization_conserves_principal() {
        let mut loan = LoanTranche::new(dec!(100000), dec!(5), dec!(20), 0).unwrap();
        let mut repaid = Decimal::ZERO;
        for year in 1..=10 {
            let y = loan.step(year);
            assert!(y.principal >= Decimal::ZERO);
            repaid += y.principal;
            loan.repay(y.principal);
        }
        assert_eq!(loan.balance, Decimal::ZERO);
        assert_eq!(repaid, dec!(100000));
    }

    #[test]
    fn test_principal_capped_at_balance() {
        let mut loan = LoanTranche::new(dec!(1000), dec!(0), dec!(60), 0).unwrap();
        let y1 = loan.step(1);
        loan.repay(y1.principal);
        let y2 = loan.step(2);
        assert_eq!(y2.principal, dec!(400));
        loan.repay(y2.principal);
        assert_eq!(loan.step(3), LoanYear::default());
    }

    #[test]
    fn test_principal_floored_at_zero() {
        // Annuity below interest: negative amortization is not modelled.
        let mut loan = LoanTranche::new(dec!(1000), dec!(5), dec!(1), 0).unwrap();
        loan.interest_rate_percent = dec!(10);
        assert_eq!(loan.step(1).principal, Decimal::ZERO);
    }

    #[test]
    fn test_grace_period_is_interest_only() {
        let loan = LoanTranche::new(dec!(50000), dec!(1), dec!(3), 2).unwrap();
        assert_eq!(loan.step(1).principal, Decimal::ZERO);
        assert_eq!(loan.step(2).principal, Decimal::ZERO);
        assert_eq!(loan.step(2).interest, dec!(500));
        assert_eq!(loan.step(3).principal, dec!(1500));
    }

    #[test]
    fn test_secondary_capped_at_total_need() {
        let inputs = InvestmentInputs {
            purchase_price: dec!(100000),
            loan_percent: dec!(50),
            secondary: SecondaryFacility::Enabled(SecondaryLoan {
                loan_type: SecondaryLoanType::Standard,
                amount: dec!(80000),
                ..Default::default()
            }),
            ..Default::default()
        };
        let plan = FinancingPlan::from_inputs(&inputs).unwrap();
        assert!(plan.secondary_capped);
        assert_eq!(plan.total, dec!(50000));
        assert_eq!(plan.secondary.as_ref().unwrap().principal, dec!(50000));
        assert_eq!(plan.primary.principal, Decimal::ZERO);
    }

    #[test]
    fn test_subsidy_only_for_renovation_programme() {
        let mut inputs = InvestmentInputs {
            purchase_price: dec!(300000),
            loan_percent: dec!(100),
            renovation_cost: dec!(20000),
            secondary: SecondaryFacility::Enabled(SecondaryLoan {
                loan_type: SecondaryLoanType::Renovation261,
                amount: dec!(100000),
                repayment_subsidy_percent: dec!(5),
                ..Default::default()
            }),
            ..Default::default()
        };
        let plan = FinancingPlan::from_inputs(&inputs).unwrap();
        assert_eq!(plan.total, dec!(320000));
        assert_eq!(plan.primary.principal, dec!(220000));
        assert_eq!(plan.repayment_subsidy, dec!(5000));

        if let SecondaryFacility::Enabled(ref mut terms) = inputs.secondary {
            terms.loan_type = SecondaryLoanType::Qng40;
        }
        let plan = FinancingPlan::from_inputs(&inputs).unwrap();
        assert_eq!(plan.repayment_subsidy, Decimal::ZERO);
    }

    #[test]
    fn test_write_down_never_exceeds_balance() {
        let mut loan = LoanTranche::new(dec!(1000), dec!(1), dec!(1), 0).unwrap();
        assert_eq!(loan.write_down(dec!(1500)), dec!(1000));
        assert_eq!(loan.balance, Decimal::ZERO);
    }

    #[test]
    fn test_overflowing_financing_is_an_error() {
        let inputs = InvestmentInputs {
            purchase_price: Decimal::MAX,
            loan_percent: dec!(100),
            renovation_cost: Decimal::MAX,
            ..Default::default()
        };
        assert!(matches!(
            FinancingPlan::from_inputs(&inputs),
            Err(crate::RentcalcError::ArithmeticOverflow { .. })
        ));
    }
}
