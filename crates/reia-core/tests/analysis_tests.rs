use pretty_assertions::assert_eq;
use reia_core::analysis::{
    analyze, analyze_property, analyze_with_terminal, amortization, metrics, FinancialInputs,
    TerminalValue, ViabilityRating,
};
use reia_core::time_value;
use reia_core::ReiaError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn reference_property() -> FinancialInputs {
    FinancialInputs {
        purchase_price: dec!(1000000),
        gross_income: dec!(120000),
        operating_expenses: dec!(45000),
        vacancy_rate: dec!(5),
        loan_amount: dec!(750000),
        interest_rate: dec!(5),
        loan_term_years: 30,
        cash_invested: dec!(250000),
        appreciation_rate: dec!(3),
        rent_growth_rate: dec!(3),
        expense_growth_rate: dec!(3),
        holding_period_years: 10,
        exit_cap_rate: dec!(6.5),
    }
}

// ===========================================================================
// Headline metrics
// ===========================================================================

#[test]
fn test_reference_property_headline_metrics() {
    let result = analyze(&reference_property());
    assert_eq!(result.noi, dec!(69000));
    assert_eq!(result.cap_rate, dec!(6.9));
    assert_eq!(result.ltv, dec!(75));
    assert_eq!(result.expense_ratio, dec!(37.5));
    assert_eq!(result.projections.len(), 10);
}

#[test]
fn test_reference_property_returns() {
    let result = analyze(&reference_property());
    // $750k at 5% over 30 years: 4026.16/month, 48313.95/year
    assert!((result.annual_debt_service - dec!(48313.95)).abs() < dec!(0.01));
    // 20686.05 / 250000
    assert!((result.cash_on_cash_return - dec!(8.27)).abs() < dec!(0.01));
    // Equity-value terminal: IRR ≈ 18.87%, equity multiple ≈ 4.15x
    assert!((result.irr - dec!(18.87)).abs() < dec!(0.01), "irr {}", result.irr);
    assert!((result.equity_multiple - dec!(4.151)).abs() < dec!(0.001));
    assert_eq!(result.viability_score, 82);
    assert_eq!(result.viability_rating, ViabilityRating::VeryGood);
}

#[test]
fn test_exit_cap_terminal_values_sale_on_noi() {
    let result = analyze_with_terminal(&reference_property(), TerminalValue::ExitCap);
    assert!((result.irr - dec!(19.33)).abs() < dec!(0.01), "irr {}", result.irr);
    assert!((result.equity_multiple - dec!(4.316)).abs() < dec!(0.001));

    let last = result.projections.last().unwrap();
    let expected = last.noi / dec!(0.065) - last.loan_balance;
    assert_eq!(result.terminal_value, expected);
}

#[test]
fn test_zero_purchase_price() {
    let mut inputs = reference_property();
    inputs.purchase_price = Decimal::ZERO;
    let result = analyze(&inputs);
    assert_eq!(result.cap_rate, Decimal::ZERO);
    assert_eq!(result.ltv, Decimal::ZERO);
    assert!(result.viability_score <= 100);
}

#[test]
fn test_metric_identities_hold_across_projection() {
    let inputs = reference_property();
    let result = analyze(&inputs);
    let mut running = Decimal::ZERO;
    let mut prior_balance = inputs.loan_amount;
    for p in &result.projections {
        running += p.cash_flow;
        assert_eq!(p.cumulative_cash_flow, running);
        assert_eq!(
            p.noi,
            metrics::noi(p.gross_income, p.operating_expenses, inputs.vacancy_rate)
        );
        assert!(p.loan_balance <= prior_balance);
        prior_balance = p.loan_balance;
    }
}

// ===========================================================================
// Building blocks
// ===========================================================================

#[test]
fn test_amortization_schedule_matches_projection() {
    let inputs = reference_property();
    let payment = amortization::annual_debt_service(
        inputs.loan_amount,
        inputs.interest_rate,
        inputs.loan_term_years,
    );
    let schedule = amortization::balance_schedule(
        inputs.loan_amount,
        inputs.interest_rate,
        payment,
        inputs.holding_period_years,
    );
    let result = analyze(&inputs);
    let balances: Vec<Decimal> = result.projections.iter().map(|p| p.loan_balance).collect();
    assert_eq!(schedule, balances);
}

#[test]
fn test_irr_textbook_series() {
    let rate = time_value::irr(&[dec!(-1000), dec!(400), dec!(400), dec!(400)]);
    assert!((rate - dec!(9.70)).abs() < dec!(0.01));
}

// ===========================================================================
// Validated boundary
// ===========================================================================

#[test]
fn test_analyze_property_from_json() {
    // Decimals arrive as strings or numbers; exit_cap_rate may be omitted
    let json = r#"{
        "purchase_price": "1000000",
        "gross_income": 120000,
        "operating_expenses": "45000",
        "vacancy_rate": 5,
        "loan_amount": "750000",
        "interest_rate": "5",
        "loan_term_years": 30,
        "cash_invested": "250000",
        "appreciation_rate": "3",
        "rent_growth_rate": "3",
        "expense_growth_rate": "3",
        "holding_period_years": 10
    }"#;
    let inputs: FinancialInputs = serde_json::from_str(json).unwrap();
    assert_eq!(inputs.exit_cap_rate, Decimal::ZERO);

    let output = analyze_property(&inputs).unwrap();
    assert_eq!(output.methodology, "Levered Hold-Period Investment Analysis");
    assert_eq!(output.result.noi, dec!(69000));
    assert!(output.warnings.is_empty(), "{:?}", output.warnings);
    assert_eq!(output.assumptions["holding_period_years"], 10);

    let value = serde_json::to_value(&output.result).unwrap();
    assert_eq!(value["viability_rating"], "Very Good");
    assert_eq!(value["projections"].as_array().unwrap().len(), 10);
}

#[test]
fn test_analyze_property_flags_high_leverage() {
    let mut inputs = reference_property();
    inputs.loan_amount = dec!(900000);
    inputs.cash_invested = dec!(100000);
    let output = analyze_property(&inputs).unwrap();
    assert!(output.warnings.iter().any(|w| w.contains("DSCR")));
    assert!(output.warnings.iter().any(|w| w.contains("LTV")));
}

#[test]
fn test_analyze_property_rejects_out_of_range() {
    let mut inputs = reference_property();
    inputs.holding_period_years = 0;
    match analyze_property(&inputs) {
        Err(ReiaError::InvalidInput { field, .. }) => assert_eq!(field, "holding_period_years"),
        other => panic!("expected InvalidInput, got {other:?}"),
    }

    let mut inputs = reference_property();
    inputs.vacancy_rate = dec!(120);
    assert!(analyze_property(&inputs).is_err());

    let mut inputs = reference_property();
    inputs.loan_amount = dec!(-1);
    assert!(analyze_property(&inputs).is_err());
}

#[test]
fn test_analyze_property_rejects_decimal_limits() {
    let extremes = [
        ("rent_growth_rate", Decimal::MAX),
        ("appreciation_rate", Decimal::MIN),
        ("interest_rate", Decimal::MAX),
        ("purchase_price", Decimal::MAX),
    ];
    for (name, value) in extremes {
        let mut inputs = reference_property();
        match name {
            "rent_growth_rate" => inputs.rent_growth_rate = value,
            "appreciation_rate" => inputs.appreciation_rate = value,
            "interest_rate" => inputs.interest_rate = value,
            _ => inputs.purchase_price = value,
        }
        match analyze_property(&inputs) {
            Err(ReiaError::InvalidInput { field, .. }) => assert_eq!(field, name),
            other => panic!("{name}: expected InvalidInput, got {other:?}"),
        }
    }
}
