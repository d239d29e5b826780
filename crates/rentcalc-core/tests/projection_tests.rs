use pretty_assertions::assert_eq;
use rentcalc_core::projection::{
    project, DepreciationMethod, Dscr, InvestmentInputs, SecondaryFacility, SecondaryLoan,
    SecondaryLoanType,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// 300k flat, 100% financed at 4.5% + 1.5%, 10-year hold.
fn reference_flat() -> InvestmentInputs {
    InvestmentInputs {
        purchase_price: dec!(300000),
        transfer_tax_percent: dec!(6),
        notary_percent: dec!(2),
        size_sqm: dec!(80),
        building_share_percent: dec!(80),
        monthly_cold_rent: dec!(1200),
        vacancy_rate_percent: dec!(0),
        operating_costs_monthly: dec!(60),
        management_costs_monthly: dec!(30),
        maintenance_reserve_monthly: dec!(50),
        rent_increase_percent: dec!(2),
        cost_increase_percent: dec!(0),
        appreciation_percent: dec!(2),
        loan_percent: dec!(100),
        interest_rate_percent: dec!(4.5),
        repayment_rate_percent: dec!(1.5),
        loan_term_years: 10,
        depreciation_method: DepreciationMethod::Linear,
        depreciation_rate_percent: dec!(2),
        tax_rate_percent: dec!(42),
        holding_period_years: 10,
        capital_gains_tax_percent: dec!(0),
        ..Default::default()
    }
}

// ===========================================================================
// End-to-end scenario
// ===========================================================================

#[test]
fn test_reference_flat_ten_year_projection() {
    let output = project(&reference_flat()).unwrap();
    let out = &output.result;
    let timeline = &out.return_metrics.timeline;

    assert_eq!(timeline.len(), 10);
    assert_eq!(
        timeline.iter().map(|y| y.year).collect::<Vec<_>>(),
        (1..=10).collect::<Vec<u32>>()
    );

    for pair in timeline.windows(2) {
        assert!(
            pair[1].loan_balance < pair[0].loan_balance,
            "balance must fall every year: {} -> {}",
            pair[0].loan_balance,
            pair[1].loan_balance
        );
    }

    assert!(timeline[0].noi < timeline[0].potential_rent);
    assert!(out.return_metrics.irr.is_some(), "IRR should converge");
    assert!(output.warnings.iter().all(|w| !w.contains("IRR")));
}

#[test]
fn test_fully_financed_flat_without_purchase_costs() {
    let inputs = InvestmentInputs {
        purchase_price: dec!(300000),
        monthly_cold_rent: dec!(1200),
        vacancy_rate_percent: dec!(0),
        rent_increase_percent: dec!(2),
        cost_increase_percent: dec!(0),
        appreciation_percent: dec!(2),
        loan_percent: dec!(100),
        interest_rate_percent: dec!(4.5),
        repayment_rate_percent: dec!(1.5),
        depreciation_method: DepreciationMethod::Linear,
        depreciation_rate_percent: dec!(2),
        building_share_percent: dec!(80),
        operating_costs_monthly: dec!(60),
        tax_rate_percent: dec!(42),
        holding_period_years: 10,
        capital_gains_tax_percent: dec!(0),
        ..Default::default()
    };
    let out = project(&inputs).unwrap().result;
    let timeline = &out.return_metrics.timeline;

    assert_eq!(out.acquisition.equity_required, Decimal::ZERO);
    assert_eq!(timeline.len(), 10);
    for pair in timeline.windows(2) {
        assert!(pair[1].loan_balance < pair[0].loan_balance);
    }
    assert!(timeline[0].noi < timeline[0].potential_rent);

    let irr = out.return_metrics.irr.expect("IRR should be finite with zero equity");
    assert!(irr > Decimal::ZERO, "got {irr}");
    // Equity-based ratios stay guarded at zero.
    assert_eq!(out.return_metrics.equity_multiple, Decimal::ZERO);
}

#[test]
fn test_reference_flat_is_deterministic() {
    let a = project(&reference_flat()).unwrap().result;
    let b = project(&reference_flat()).unwrap().result;
    assert_eq!(a, b);
}

#[test]
fn test_result_keeps_copy_of_inputs() {
    let inputs = reference_flat();
    let out = project(&inputs).unwrap().result;
    assert_eq!(out.inputs, inputs);
}

#[test]
fn test_irr_stream_reprices_to_zero_npv() {
    let out = project(&reference_flat()).unwrap().result;
    let irr = out.return_metrics.irr.unwrap() / dec!(100);

    let mut flows = vec![-out.acquisition.equity_required];
    flows.extend(out.return_metrics.timeline.iter().map(|y| y.cash_flow_post_tax));
    *flows.last_mut().unwrap() += out.wealth.net_exit_proceeds;

    let npv = rentcalc_core::time_value::npv(irr, &flows).unwrap();
    assert!(npv.abs() < dec!(0.0001), "NPV at IRR should be ~0, got {npv}");
}

#[test]
fn test_ltv_tracks_appreciated_value() {
    let out = project(&reference_flat()).unwrap().result;
    let y1 = &out.return_metrics.timeline[0];
    assert_eq!(y1.property_value, dec!(306000));
    assert_eq!(y1.ltv, y1.loan_balance / dec!(306000));
    let last = out.return_metrics.timeline.last().unwrap();
    assert_eq!(last.property_value, out.wealth.exit_sale_price);
}

#[test]
fn test_total_economic_benefit_adds_tax_savings() {
    let out = project(&reference_flat()).unwrap().result;
    let savings: Decimal = out.return_metrics.timeline.iter().map(|y| y.tax_saved).sum();
    assert_eq!(out.wealth.cumulative_tax_savings, savings);
    assert_eq!(
        out.wealth.total_economic_benefit,
        out.wealth.wealth_accumulation + savings
    );
}

// ===========================================================================
// Amortization
// ===========================================================================

#[test]
fn test_single_facility_principal_conservation() {
    let out = project(&reference_flat()).unwrap().result;
    let repaid: Decimal = out
        .return_metrics
        .timeline
        .iter()
        .map(|y| y.principal_payment)
        .sum();
    let drift = (repaid + out.wealth.remaining_debt - out.financing.loan_amount_total).abs();
    assert!(drift < dec!(0.000001), "principal not conserved, drift {drift}");
}

#[test]
fn test_correctly_sized_annuity_repays_to_zero() {
    let mut inputs = reference_flat();
    inputs.interest_rate_percent = dec!(3);
    inputs.repayment_rate_percent = dec!(12);
    let out = project(&inputs).unwrap().result;
    let timeline = &out.return_metrics.timeline;

    let repaid: Decimal = timeline.iter().map(|y| y.principal_payment).sum();
    assert_eq!(repaid, dec!(300000));
    assert_eq!(out.wealth.remaining_debt, Decimal::ZERO);
    assert!(timeline.iter().all(|y| y.loan_balance >= Decimal::ZERO));
    // Once repaid, no more debt service.
    assert_eq!(timeline[9].interest_payment, Decimal::ZERO);
    assert_eq!(timeline[9].principal_payment, Decimal::ZERO);
}

// ===========================================================================
// Depreciation
// ===========================================================================

#[test]
fn test_declining_balance_book_value_monotone() {
    let mut inputs = reference_flat();
    inputs.depreciation_method = DepreciationMethod::Declining;
    inputs.depreciation_rate_percent = dec!(5);
    inputs.holding_period_years = 40;
    let out = project(&inputs).unwrap().result;

    let mut previous = out.acquisition.depreciation_base;
    for year in &out.return_metrics.timeline {
        assert!(year.book_value <= previous, "book value rose in year {}", year.year);
        assert!(year.book_value >= Decimal::ZERO);
        previous = year.book_value;
    }
    // Declining depreciation shrinks with the book value.
    let t = &out.return_metrics.timeline;
    assert!(t[1].depreciation < t[0].depreciation);
}

#[test]
fn test_bonus_depreciation_first_four_years_only() {
    let mut inputs = reference_flat();
    inputs.bonus_depreciation = true;
    let out = project(&inputs).unwrap().result;
    let t = &out.return_metrics.timeline;

    // Base 259200 over 80 m² = 3240 per m², below the cap; 5% bonus = 12960.
    let linear = dec!(259200) * dec!(0.02);
    for year in &t[0..4] {
        assert_eq!(year.depreciation, linear + dec!(12960));
    }
    for year in &t[4..] {
        assert_eq!(year.depreciation, linear);
    }
}

#[test]
fn test_furniture_and_renovation_deductions() {
    let mut inputs = reference_flat();
    inputs.renovation_cost = dec!(20000);
    inputs.furniture_cost = dec!(10000);
    let base = project(&reference_flat()).unwrap().result;
    let out = project(&inputs).unwrap().result;

    // Both are financed on top of the purchase loan.
    assert_eq!(out.financing.loan_amount_total, dec!(330000));
    assert_eq!(out.acquisition.total_investment, dec!(354000));
    assert_eq!(out.acquisition.equity_required, base.acquisition.equity_required);

    let y1 = &out.return_metrics.timeline[0];
    let y2 = &out.return_metrics.timeline[1];
    let extra_interest_y1 = dec!(30000) * dec!(0.045);
    assert_eq!(
        y1.taxable_income,
        base.return_metrics.timeline[0].taxable_income - extra_interest_y1 - dec!(20000) - dec!(1000)
    );
    // Year 2 only carries furniture depreciation, not the renovation.
    assert!(y2.taxable_income > y1.taxable_income);
}

// ===========================================================================
// Secondary facility and subsidy
// ===========================================================================

fn with_renovation_loan(grace_period_years: u32) -> InvestmentInputs {
    let mut inputs = reference_flat();
    inputs.secondary = SecondaryFacility::Enabled(SecondaryLoan {
        loan_type: SecondaryLoanType::Renovation261,
        amount: dec!(100000),
        interest_rate_percent: dec!(1),
        repayment_rate_percent: dec!(3),
        grace_period_years,
        repayment_subsidy_percent: dec!(5),
    });
    inputs
}

#[test]
fn test_subsidy_applied_only_in_year_one() {
    let out = project(&with_renovation_loan(1)).unwrap().result;
    let t = &out.return_metrics.timeline;
    assert_eq!(out.financing.repayment_subsidy, dec!(5000));
    assert_eq!(t[0].subsidy_applied, dec!(5000));
    assert!(t[1..].iter().all(|y| y.subsidy_applied == Decimal::ZERO));
}

#[test]
fn test_secondary_balance_after_year_one() {
    let out = project(&with_renovation_loan(0)).unwrap().result;
    let y1 = &out.return_metrics.timeline[0];

    // Primary 200000: 9000 interest, 3000 principal. Secondary: 1000 interest, 3000 principal.
    assert_eq!(y1.interest_payment, dec!(10000));
    assert_eq!(y1.principal_payment, dec!(6000));

    let primary_after = dec!(200000) - dec!(3000);
    let secondary_after = dec!(100000) - dec!(5000) - dec!(3000);
    assert_eq!(y1.loan_balance, primary_after + secondary_after);
}

#[test]
fn test_grace_period_defers_secondary_principal() {
    let out = project(&with_renovation_loan(2)).unwrap().result;
    let t = &out.return_metrics.timeline;
    // Only the primary amortizes during grace.
    assert_eq!(t[0].principal_payment, dec!(3000));
    assert!(t[2].principal_payment > t[1].principal_payment + dec!(2000));
}

#[test]
fn test_subsidy_is_not_a_cash_inflow() {
    let with = project(&with_renovation_loan(1)).unwrap().result;
    let mut inputs = with_renovation_loan(1);
    if let SecondaryFacility::Enabled(ref mut loan) = inputs.secondary {
        loan.repayment_subsidy_percent = Decimal::ZERO;
    }
    let without = project(&inputs).unwrap().result;
    assert_eq!(
        with.return_metrics.timeline[0].cash_flow_post_tax,
        without.return_metrics.timeline[0].cash_flow_post_tax
    );
    assert_eq!(with.acquisition.equity_required, without.acquisition.equity_required);
    assert!(with.wealth.remaining_debt < without.wealth.remaining_debt);
}

// ===========================================================================
// Guarded ratios
// ===========================================================================

#[test]
fn test_zero_equity_ratios_are_zero() {
    let inputs = InvestmentInputs {
        purchase_price: dec!(200000),
        monthly_cold_rent: dec!(900),
        loan_percent: dec!(100),
        interest_rate_percent: dec!(4),
        repayment_rate_percent: dec!(2),
        appreciation_percent: dec!(2),
        holding_period_years: 10,
        ..Default::default()
    };
    let out = project(&inputs).unwrap().result;
    assert_eq!(out.acquisition.equity_required, Decimal::ZERO);

    let r = &out.return_metrics;
    assert_eq!(r.cash_on_cash_avg, Decimal::ZERO);
    assert_eq!(r.roe_avg, Decimal::ZERO);
    assert_eq!(r.roi_total, Decimal::ZERO);
    assert_eq!(r.roi_annualized, Decimal::ZERO);
    assert_eq!(r.equity_multiple, Decimal::ZERO);
}

#[test]
fn test_zero_price_does_not_error() {
    let inputs = InvestmentInputs {
        monthly_cold_rent: dec!(500),
        holding_period_years: 5,
        ..Default::default()
    };
    let out = project(&inputs).unwrap().result;
    assert_eq!(out.operations.gross_yield, Decimal::ZERO);
    assert_eq!(out.operations.net_yield, Decimal::ZERO);
    assert_eq!(out.acquisition.price_per_sqm, Decimal::ZERO);
    assert_eq!(out.wealth.exit_price_per_sqm, Decimal::ZERO);
    assert_eq!(out.financing.initial_dscr, Dscr::Unbounded);
}

#[test]
fn test_json_inputs_end_to_end() {
    let json = r#"{
        "purchase_price": 300000,
        "transfer_tax_percent": 6,
        "notary_percent": 2,
        "building_share_percent": 80,
        "monthly_cold_rent": 1200,
        "operating_costs_monthly": 100,
        "rent_increase_percent": 2,
        "appreciation_percent": 2,
        "loan_percent": 100,
        "interest_rate_percent": 4.5,
        "repayment_rate_percent": 1.5,
        "depreciation_rate_percent": 2,
        "tax_rate_percent": 42,
        "holding_period_years": 10
    }"#;
    let inputs: InvestmentInputs = serde_json::from_str(json).unwrap();
    let output = project(&inputs).unwrap();
    let value = serde_json::to_value(&output).unwrap();
    assert_eq!(value["result"]["return_metrics"]["timeline"].as_array().unwrap().len(), 10);
    assert!(value["result"]["return_metrics"]["irr"].is_string());
    assert_eq!(value["metadata"]["precision"], "rust_decimal_128bit");
}
