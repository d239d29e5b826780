use log::{debug, trace, warn};
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use std::time::Instant;

use super::depreciation::{
    furniture_depreciation, renovation_deduction, BonusAllowance, DepreciationSchedule,
};
use super::inputs::InvestmentInputs;
use super::loans::{FinancingPlan, LoanYear};
use super::metrics::{
    AcquisitionMetrics, Dscr, FinancingMetrics, MetricsResult, OperatingMetrics, ReturnMetrics,
    TimelineYear, WealthMetrics,
};
use super::tax::{effective_tax_rate, exit_tax, TaxEffect};
use crate::config::ProjectionConfig;
use crate::error::RentcalcError;
use crate::time_value::find_rate;
use crate::types::{
    checked_mul, checked_sum, pct, ratio_or_zero, with_metadata, ComputationOutput, Money, Percent,
    Rate,
};
use crate::RentcalcResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project a buy-to-let investment with the default tax-regime parameters.
pub fn project(inputs: &InvestmentInputs) -> RentcalcResult<ComputationOutput<MetricsResult>> {
    project_with_config(inputs, &ProjectionConfig::default())
}

/// Project a buy-to-let investment year by year and derive its return
/// metrics.
///
/// Never fails for out-of-domain values such as a zero price, zero equity or
/// a zero holding period; ratios whose denominator is zero are reported as 0
/// and a non-convergent IRR as `None`. The only errors are a holding period
/// beyond `config.max_holding_period_years` and an arithmetic overflow for
/// inputs too large for 96-bit decimals.
pub fn project_with_config(
    inputs: &InvestmentInputs,
    config: &ProjectionConfig,
) -> RentcalcResult<ComputationOutput<MetricsResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    check_horizon(inputs, config)?;
    check_inputs(inputs, config, &mut warnings);

    // --- Loan setup ---
    let mut plan = FinancingPlan::from_inputs(inputs)?;
    check_financing(inputs, &plan, &mut warnings);

    // --- Acquisition ---
    let acquisition = acquisition_metrics(inputs, &plan)?;

    // --- Year loop ---
    let effective_rate = effective_tax_rate(inputs.tax_rate_percent, config);
    let run = run_timeline(inputs, config, &mut plan, acquisition.depreciation_base, effective_rate)?;

    // --- Exit ---
    let wealth = exit_analysis(inputs, config, &acquisition, &plan, &run);

    // --- Returns ---
    let year1 = run.timeline.first().cloned().unwrap_or_else(|| empty_year(inputs));
    let operations = operating_metrics(inputs, &acquisition, &year1);
    let financing = financing_metrics(inputs, &plan, &year1);
    let return_metrics = return_metrics(inputs, config, &acquisition, &wealth, &year1, run)?;

    if year1.noi < Decimal::ZERO && inputs.holding_period_years > 0 {
        warnings.push(format!(
            "Year-1 NOI of {:.2} is negative — rent does not cover operating costs",
            year1.noi
        ));
    }
    if return_metrics.irr.is_none() {
        warnings.push("IRR did not converge — reported as undefined".into());
    }

    for w in &warnings {
        warn!("{w}");
    }
    debug!(
        "Projected {} years: equity {}, irr {:?}, wealth {}",
        inputs.holding_period_years,
        acquisition.equity_required,
        return_metrics.irr,
        wealth.wealth_accumulation
    );

    let output = MetricsResult {
        inputs: inputs.clone(),
        acquisition,
        operations,
        financing,
        return_metrics,
        wealth,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Buy-to-Let Projection (dual-facility amortization, depreciation, marginal tax, exit)",
        &serde_json::json!({
            "config": config,
            "effective_tax_rate": effective_rate,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn check_horizon(inputs: &InvestmentInputs, config: &ProjectionConfig) -> RentcalcResult<()> {
    if inputs.holding_period_years > config.max_holding_period_years {
        return Err(RentcalcError::InvalidInput {
            field: "holding_period_years".into(),
            reason: format!(
                "Holding period of {} years exceeds the supported maximum of {}",
                inputs.holding_period_years, config.max_holding_period_years
            ),
        });
    }
    Ok(())
}

fn check_inputs(inputs: &InvestmentInputs, config: &ProjectionConfig, warnings: &mut Vec<String>) {
    if inputs.holding_period_years == 0 {
        warnings.push("Holding period is 0 years — timeline is empty".into());
    }

    if inputs.loan_term_years > 0 && inputs.holding_period_years > inputs.loan_term_years {
        warnings.push(format!(
            "Holding period of {} years exceeds the {}-year fixed-rate term — the rate is held constant after refinancing",
            inputs.holding_period_years, inputs.loan_term_years
        ));
    }

    if inputs.bonus_depreciation && inputs.size_sqm <= Decimal::ZERO {
        warnings.push("Bonus depreciation requires a floor area — no bonus taken".into());
    }

    if inputs.vacancy_rate_percent > dec!(15) {
        warnings.push(format!(
            "Vacancy rate {:.1}% exceeds 15% — above typical market norms",
            inputs.vacancy_rate_percent
        ));
    }

    if config.tax_surcharge_factor != ProjectionConfig::default().tax_surcharge_factor {
        debug!("Using non-default tax surcharge factor {}", config.tax_surcharge_factor);
    }
}

fn check_financing(inputs: &InvestmentInputs, plan: &FinancingPlan, warnings: &mut Vec<String>) {
    if plan.secondary_capped {
        warnings.push(format!(
            "Secondary loan capped at the total financing need of {:.2}",
            plan.total
        ));
    }

    if let Some(terms) = inputs.secondary.terms() {
        if terms.repayment_subsidy_percent > Decimal::ZERO && !terms.loan_type.carries_repayment_subsidy() {
            warnings.push(format!(
                "Repayment subsidy ignored — loan type {:?} carries no principal write-down",
                terms.loan_type
            ));
        }
    }

    if inputs.purchase_price > Decimal::ZERO && plan.total > inputs.purchase_price {
        warnings.push(format!(
            "Financing of {:.2} exceeds the purchase price — initial LTV above 100%",
            plan.total
        ));
    }
}

// ---------------------------------------------------------------------------
// Acquisition
// ---------------------------------------------------------------------------

fn acquisition_metrics(
    inputs: &InvestmentInputs,
    plan: &FinancingPlan,
) -> RentcalcResult<AcquisitionMetrics> {
    let purchase_costs = checked_mul(inputs.purchase_price, pct(inputs.purchase_cost_percent()), "purchase costs")?;
    let total_investment = checked_sum(
        &[inputs.purchase_price, purchase_costs, inputs.renovation_cost, inputs.furniture_cost],
        "total investment",
    )?;
    // Subsidy is excluded: the full secondary amount is paid out.
    let equity_required = total_investment - plan.drawn();
    // Acquisition costs follow the building/land split.
    let depreciation_base = checked_mul(
        checked_sum(&[inputs.purchase_price, purchase_costs], "depreciation base")?,
        pct(inputs.building_share_percent),
        "depreciation base",
    )?;

    Ok(AcquisitionMetrics {
        purchase_costs,
        total_investment,
        equity_required,
        depreciation_base,
        price_per_sqm: ratio_or_zero(inputs.purchase_price, inputs.size_sqm),
    })
}

// ---------------------------------------------------------------------------
// Year loop
// ---------------------------------------------------------------------------

struct TimelineRun {
    timeline: Vec<TimelineYear>,
    cumulative_cash_flow: Money,
    cumulative_tax_savings: Money,
    book_value: Money,
    property_value: Money,
}

fn run_timeline(
    inputs: &InvestmentInputs,
    config: &ProjectionConfig,
    plan: &mut FinancingPlan,
    depreciation_base: Money,
    effective_rate: Rate,
) -> RentcalcResult<TimelineRun> {
    let years = inputs.holding_period_years;

    let bonus = if inputs.bonus_depreciation {
        BonusAllowance::for_building(depreciation_base, inputs.size_sqm, config)
    } else {
        None
    };
    let mut schedule = DepreciationSchedule::new(
        depreciation_base,
        inputs.depreciation_method,
        inputs.depreciation_rate_percent,
        bonus,
    );

    let mut annual_rent = checked_mul(inputs.monthly_cold_rent, MONTHS_PER_YEAR, "annual rent")?;
    let mut operating = checked_mul(inputs.operating_costs_monthly, MONTHS_PER_YEAR, "operating costs")?;
    let mut management = checked_mul(inputs.management_costs_monthly, MONTHS_PER_YEAR, "management costs")?;
    let mut maintenance = checked_mul(inputs.maintenance_reserve_monthly, MONTHS_PER_YEAR, "maintenance reserve")?;
    let mut property_value = inputs.purchase_price;

    let occupancy = Decimal::ONE - pct(inputs.vacancy_rate_percent);

    let mut timeline = Vec::new();
    let mut cumulative_cash_flow = Decimal::ZERO;
    let mut cumulative_tax_savings = Decimal::ZERO;

    for year in 1..=years {
        // Operations
        let potential_rent = annual_rent;
        let rental_income = potential_rent * occupancy;
        let operating_costs = operating + management + maintenance;
        let noi = rental_income - operating_costs;

        // Debt service
        let primary = plan.primary.step(year);
        let secondary = plan
            .secondary
            .as_ref()
            .map_or(LoanYear::default(), |loan| loan.step(year));
        let interest_payment = primary.interest + secondary.interest;
        let principal_payment = primary.principal + secondary.principal;
        let debt_service = interest_payment + principal_payment;

        // Tax
        let depreciation = schedule.step(year).total();
        let taxable_income = noi + maintenance
            - interest_payment
            - depreciation
            - furniture_depreciation(inputs.furniture_cost, year, config.furniture_useful_life_years)
            - renovation_deduction(inputs.renovation_cost, year);
        let tax = TaxEffect::on(taxable_income, effective_rate);

        // Cash flow
        let cash_flow_pre_tax = noi - debt_service;
        let cash_flow_post_tax = cash_flow_pre_tax - tax.payable + tax.saved;
        cumulative_cash_flow += cash_flow_post_tax;
        cumulative_tax_savings += tax.saved;

        // Balances
        plan.primary.repay(primary.principal);
        let mut subsidy_applied = Decimal::ZERO;
        if let Some(loan) = plan.secondary.as_mut() {
            loan.repay(secondary.principal);
            if year == 1 {
                subsidy_applied = loan.write_down(plan.repayment_subsidy);
            }
        }

        property_value = grow(property_value, inputs.appreciation_percent, "property value")?;
        let loan_balance = plan.balance();

        trace!("year {year}: noi {noi}, debt service {debt_service}, cf post-tax {cash_flow_post_tax}");

        timeline.push(TimelineYear {
            year,
            potential_rent,
            rental_income,
            noi,
            operating_costs,
            interest_payment,
            principal_payment,
            depreciation,
            taxable_income,
            tax_payable: tax.payable,
            tax_saved: tax.saved,
            cash_flow_pre_tax,
            cash_flow_post_tax,
            subsidy_applied,
            loan_balance,
            book_value: schedule.book_value,
            property_value,
            ltv: ratio_or_zero(loan_balance, property_value),
        });

        annual_rent = grow(annual_rent, inputs.rent_increase_percent, "rent")?;
        operating = grow(operating, inputs.cost_increase_percent, "operating costs")?;
        management = grow(management, inputs.cost_increase_percent, "management costs")?;
        maintenance = grow(maintenance, inputs.cost_increase_percent, "maintenance reserve")?;
    }

    Ok(TimelineRun {
        timeline,
        cumulative_cash_flow,
        cumulative_tax_savings,
        book_value: schedule.book_value,
        property_value,
    })
}

/// One year of compound growth at `rate_percent`.
fn grow(value: Money, rate_percent: Percent, context: &str) -> RentcalcResult<Money> {
    value
        .checked_mul(Decimal::ONE + pct(rate_percent))
        .ok_or_else(|| RentcalcError::ArithmeticOverflow {
            context: format!("{context} growth"),
        })
}

/// Year-1 stand-in when the holding period is zero.
fn empty_year(inputs: &InvestmentInputs) -> TimelineYear {
    TimelineYear {
        year: 0,
        potential_rent: Decimal::ZERO,
        rental_income: Decimal::ZERO,
        noi: Decimal::ZERO,
        operating_costs: Decimal::ZERO,
        interest_payment: Decimal::ZERO,
        principal_payment: Decimal::ZERO,
        depreciation: Decimal::ZERO,
        taxable_income: Decimal::ZERO,
        tax_payable: Decimal::ZERO,
        tax_saved: Decimal::ZERO,
        cash_flow_pre_tax: Decimal::ZERO,
        cash_flow_post_tax: Decimal::ZERO,
        subsidy_applied: Decimal::ZERO,
        loan_balance: Decimal::ZERO,
        book_value: Decimal::ZERO,
        property_value: inputs.purchase_price,
        ltv: Decimal::ZERO,
    }
}

// ---------------------------------------------------------------------------
// Exit
// ---------------------------------------------------------------------------

fn exit_analysis(
    inputs: &InvestmentInputs,
    config: &ProjectionConfig,
    acquisition: &AcquisitionMetrics,
    plan: &FinancingPlan,
    run: &TimelineRun,
) -> WealthMetrics {
    let exit_sale_price = run.property_value;
    let remaining_debt = plan.balance();

    let land_value = (inputs.purchase_price + acquisition.purchase_costs)
        * (Decimal::ONE - pct(inputs.building_share_percent));
    let exit_tax = exit_tax(
        exit_sale_price,
        land_value + run.book_value,
        inputs.holding_period_years,
        inputs.capital_gains_tax_percent,
        config,
    );

    let net_exit_proceeds = exit_sale_price - exit_tax - remaining_debt;
    let wealth_accumulation = exit_sale_price - remaining_debt;

    WealthMetrics {
        exit_sale_price,
        remaining_debt,
        exit_tax,
        net_exit_proceeds,
        wealth_accumulation,
        cumulative_tax_savings: run.cumulative_tax_savings,
        total_economic_benefit: wealth_accumulation + run.cumulative_tax_savings,
        holding_years: inputs.holding_period_years,
        exit_price_per_sqm: ratio_or_zero(exit_sale_price, inputs.size_sqm),
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

fn operating_metrics(
    inputs: &InvestmentInputs,
    acquisition: &AcquisitionMetrics,
    year1: &TimelineYear,
) -> OperatingMetrics {
    OperatingMetrics {
        noi: year1.noi,
        net_yield: ratio_or_zero(year1.noi, acquisition.total_investment) * Decimal::ONE_HUNDRED,
        gross_yield: ratio_or_zero(year1.potential_rent, inputs.purchase_price) * Decimal::ONE_HUNDRED,
        gross_yield_on_investment: ratio_or_zero(year1.potential_rent, acquisition.total_investment)
            * Decimal::ONE_HUNDRED,
        expense_ratio: ratio_or_zero(year1.operating_costs, year1.rental_income) * Decimal::ONE_HUNDRED,
    }
}

fn financing_metrics(
    inputs: &InvestmentInputs,
    plan: &FinancingPlan,
    year1: &TimelineYear,
) -> FinancingMetrics {
    let loan_amount_secondary = plan.secondary.as_ref().map_or(Decimal::ZERO, |s| s.principal);

    let blended_interest_rate = match inputs.secondary.terms() {
        Some(terms) if plan.total > Decimal::ZERO => {
            ratio_or_zero(plan.primary.principal, plan.total) * inputs.interest_rate_percent
                + ratio_or_zero(loan_amount_secondary, plan.total) * terms.interest_rate_percent
        }
        _ => Decimal::ZERO,
    };

    let debt_service_year1 = year1.debt_service();

    FinancingMetrics {
        debt_service_year1,
        initial_dscr: Dscr::compute(year1.noi, debt_service_year1),
        loan_amount_total: plan.total,
        loan_amount_primary: plan.primary.principal,
        loan_amount_secondary,
        blended_interest_rate,
        repayment_subsidy: plan.repayment_subsidy,
    }
}

fn return_metrics(
    inputs: &InvestmentInputs,
    config: &ProjectionConfig,
    acquisition: &AcquisitionMetrics,
    wealth: &WealthMetrics,
    year1: &TimelineYear,
    run: TimelineRun,
) -> RentcalcResult<ReturnMetrics> {
    let equity = acquisition.equity_required;
    let years = Decimal::from(inputs.holding_period_years);

    // IRR stream: outlay, annual post-tax cash flows, exit proceeds on the last period.
    let mut stream: Vec<Money> = Vec::with_capacity(run.timeline.len() + 1);
    stream.push(-equity);
    stream.extend(run.timeline.iter().map(|y| y.cash_flow_post_tax));
    if let Some(last) = stream.last_mut() {
        *last += wealth.net_exit_proceeds;
    }
    let irr = find_rate(&stream, Some(config.irr_guess));

    // Averages smooth out year-1 subsidies and one-off deductions.
    let avg_cash_flow = ratio_or_zero(run.timeline.iter().map(|y| y.cash_flow_post_tax).sum(), years);
    let avg_principal = ratio_or_zero(run.timeline.iter().map(|y| y.principal_payment).sum(), years);

    let equity_positive = equity > Decimal::ZERO;
    let on_equity = |value: Decimal| {
        if equity_positive {
            value / equity
        } else {
            Decimal::ZERO
        }
    };

    let cash_on_cash_avg = on_equity(avg_cash_flow) * Decimal::ONE_HUNDRED;
    let roe_avg = on_equity(avg_cash_flow + avg_principal) * Decimal::ONE_HUNDRED;
    let roi_total = on_equity(wealth.total_economic_benefit - equity) * Decimal::ONE_HUNDRED;
    let equity_multiple = on_equity(run.cumulative_cash_flow + wealth.net_exit_proceeds);

    let roi_annualized = if equity_positive && inputs.holding_period_years > 0 {
        annualized_return(wealth.total_economic_benefit / equity, years)?
    } else {
        Decimal::ZERO
    };

    Ok(ReturnMetrics {
        cash_flow_pre_tax_year1: year1.cash_flow_pre_tax,
        cash_flow_post_tax_year1: year1.cash_flow_post_tax,
        cash_on_cash_avg,
        roe_avg,
        roi_total,
        roi_annualized,
        break_even_rent_monthly: inputs.monthly_costs() + year1.debt_service() / MONTHS_PER_YEAR,
        equity_multiple,
        irr,
        timeline: run.timeline,
    })
}

/// Compound annual growth rate, in percent, of a `multiple` earned over
/// `years`. A non-positive multiple is a total loss (-100%).
fn annualized_return(multiple: Decimal, years: Decimal) -> RentcalcResult<Percent> {
    if multiple <= Decimal::ZERO {
        return Ok(-Decimal::ONE_HUNDRED);
    }
    let growth = multiple
        .checked_powd(Decimal::ONE / years)
        .ok_or_else(|| RentcalcError::ArithmeticOverflow {
            context: "annualized ROI".into(),
        })?;
    Ok((growth - Decimal::ONE) * Decimal::ONE_HUNDRED)
}
