use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use super::amortization::annual_debt_service;
use super::inputs::FinancialInputs;
use super::metrics;
use super::projection::{project_with_debt_service, summarize, FinancialProjection, ProjectionSummary};
use super::viability::{self, ViabilityRating};
use crate::error::ReiaError;
use crate::time_value::{solve_irr, IrrOutcome, StopReason, DEFAULT_IRR_GUESS};
use crate::types::{pct_to_rate, with_metadata, ComputationOutput, Money, Multiple, Percent};
use crate::ReiaResult;

/// Upper bounds accepted at the validation boundary. Inside these the
/// decimal arithmetic of a full pipeline run cannot leave its range.
pub const MAX_HOLDING_PERIOD_YEARS: u32 = 50;
pub const MAX_LOAN_TERM_YEARS: u32 = 50;
pub const MAX_MONEY: Money = dec!(1000000000000);
pub const MAX_GROWTH_PCT: Percent = dec!(100);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How sale proceeds at the end of the hold are valued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TerminalValue {
    /// Final-year equity value (appreciated price less loan balance)
    #[default]
    EquityValue,
    /// Final-year NOI capitalised at the exit cap rate, less loan balance.
    /// Falls back to `EquityValue` when the exit cap rate is zero.
    ExitCap,
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Year-one NOI
    pub noi: Money,
    pub cap_rate: Percent,
    /// Year-one cash flow over cash invested
    pub cash_on_cash_return: Percent,
    /// Levered IRR on cash invested, percent
    pub irr: Percent,
    pub equity_multiple: Multiple,
    pub dscr: Multiple,
    pub ltv: Percent,
    pub break_even_occupancy: Percent,
    pub viability_score: u8,
    pub viability_rating: ViabilityRating,
    pub projections: Vec<FinancialProjection>,
    pub annual_debt_service: Money,
    /// Sale proceeds added to the final year's cash flow
    pub terminal_value: Money,
    pub expense_ratio: Percent,
    pub noi_margin: Percent,
    pub gross_rent_multiplier: Multiple,
    pub summary: ProjectionSummary,
}

/// An [`AnalysisResult`] together with the solver diagnostics behind its IRR.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub result: AnalysisResult,
    pub irr: IrrOutcome,
    pub cash_flows: Vec<Money>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Run the full pipeline with equity-value terminal proceeds.
pub fn analyze(inputs: &FinancialInputs) -> AnalysisResult {
    analyze_with_terminal(inputs, TerminalValue::EquityValue)
}

pub fn analyze_with_terminal(inputs: &FinancialInputs, terminal: TerminalValue) -> AnalysisResult {
    evaluate(inputs, terminal).result
}

/// Run the pipeline and keep the IRR outcome and the cash-flow vector it solved.
///
/// Never fails: zero denominators degrade to zero and a non-convergent IRR is
/// returned as the solver's last estimate.
pub fn evaluate(inputs: &FinancialInputs, terminal: TerminalValue) -> Evaluation {
    let debt_service = annual_debt_service(
        inputs.loan_amount,
        inputs.interest_rate,
        inputs.loan_term_years,
    );
    debug!(%debt_service, "annual debt service");

    let projections = project_with_debt_service(inputs, debt_service);
    let summary = summarize(&projections);
    let sale_proceeds = terminal_value(inputs, &projections, terminal);

    let cash_flows = equity_cash_flows(inputs.cash_invested, &projections, sale_proceeds);
    let irr_outcome = solve_irr(&cash_flows, DEFAULT_IRR_GUESS);
    let irr = irr_outcome.percent();
    debug!(years = projections.len(), %irr, converged = irr_outcome.is_converged(), "projection solved");

    let noi = metrics::noi(
        inputs.gross_income,
        inputs.operating_expenses,
        inputs.vacancy_rate,
    );
    let year_one_cash_flow = noi.saturating_sub(debt_service);
    let total_cash_returned = summary.total_cash_flow.saturating_add(sale_proceeds);

    let cap_rate = metrics::cap_rate(noi, inputs.purchase_price);
    let cash_on_cash_return = metrics::cash_on_cash(year_one_cash_flow, inputs.cash_invested);
    let equity_multiple = metrics::equity_multiple(total_cash_returned, inputs.cash_invested);
    let dscr = metrics::dscr(noi, debt_service);
    let ltv = metrics::ltv(inputs.loan_amount, inputs.purchase_price);

    let viability = viability::score(cap_rate, cash_on_cash_return, irr, dscr, ltv, equity_multiple);
    debug!(score = viability.score, rating = %viability.rating, "viability scored");

    let result = AnalysisResult {
        noi,
        cap_rate,
        cash_on_cash_return,
        irr,
        equity_multiple,
        dscr,
        ltv,
        break_even_occupancy: metrics::break_even_occupancy(
            inputs.operating_expenses,
            debt_service,
            inputs.gross_income,
        ),
        viability_score: viability.score,
        viability_rating: viability.rating,
        projections,
        annual_debt_service: debt_service,
        terminal_value: sale_proceeds,
        expense_ratio: metrics::expense_ratio(inputs.operating_expenses, inputs.gross_income),
        noi_margin: metrics::noi_margin(noi, inputs.gross_income),
        gross_rent_multiplier: metrics::gross_rent_multiplier(
            inputs.purchase_price,
            inputs.gross_income,
        ),
        summary,
    };

    Evaluation {
        result,
        irr: irr_outcome,
        cash_flows,
    }
}

/// Sale proceeds at the end of the hold. Zero for an empty projection.
pub fn terminal_value(
    inputs: &FinancialInputs,
    projections: &[FinancialProjection],
    method: TerminalValue,
) -> Money {
    let last = match projections.last() {
        Some(p) => p,
        None => return Decimal::ZERO,
    };

    match method {
        TerminalValue::ExitCap if !inputs.exit_cap_rate.is_zero() => last
            .noi
            .checked_div(pct_to_rate(inputs.exit_cap_rate))
            .map(|value| value.saturating_sub(last.loan_balance))
            .unwrap_or(last.equity_value),
        _ => last.equity_value,
    }
}

/// Outlay at t=0, yearly cash flows, sale proceeds folded into the final year.
fn equity_cash_flows(
    cash_invested: Money,
    projections: &[FinancialProjection],
    sale_proceeds: Money,
) -> Vec<Money> {
    let mut flows = Vec::with_capacity(projections.len() + 1);
    flows.push(-cash_invested);
    flows.extend(projections.iter().map(|p| p.cash_flow));
    if !projections.is_empty() {
        if let Some(last) = flows.last_mut() {
            *last = last.saturating_add(sale_proceeds);
        }
    }
    flows
}

// ---------------------------------------------------------------------------
// Validated entry point
// ---------------------------------------------------------------------------

/// Validate, analyse and wrap the result with warnings and metadata.
pub fn analyze_property(
    input: &FinancialInputs,
) -> ReiaResult<ComputationOutput<AnalysisResult>> {
    let start = Instant::now();
    validate_inputs(input)?;

    let evaluation = evaluate(input, TerminalValue::EquityValue);
    let warnings = collect_warnings(input, &evaluation);

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Levered Hold-Period Investment Analysis",
        input,
        warnings,
        elapsed,
        evaluation.result,
    ))
}

/// Range checks the hosting layer applies before invoking the pipeline.
pub fn validate_inputs(input: &FinancialInputs) -> ReiaResult<()> {
    if input.holding_period_years < 1 || input.holding_period_years > MAX_HOLDING_PERIOD_YEARS {
        return Err(ReiaError::invalid(
            "holding_period_years",
            format!("Holding period must be between 1 and {MAX_HOLDING_PERIOD_YEARS} years"),
        ));
    }

    if input.loan_term_years > MAX_LOAN_TERM_YEARS {
        return Err(ReiaError::invalid(
            "loan_term_years",
            format!("Loan term must not exceed {MAX_LOAN_TERM_YEARS} years"),
        ));
    }

    let money_fields = [
        ("purchase_price", input.purchase_price),
        ("gross_income", input.gross_income),
        ("operating_expenses", input.operating_expenses),
        ("loan_amount", input.loan_amount),
        ("cash_invested", input.cash_invested),
    ];
    for (field, value) in money_fields {
        if value < Decimal::ZERO {
            return Err(ReiaError::invalid(field, "Must be non-negative"));
        }
        if value > MAX_MONEY {
            return Err(ReiaError::invalid(
                field,
                format!("Must not exceed {MAX_MONEY}"),
            ));
        }
    }

    if input.vacancy_rate < Decimal::ZERO || input.vacancy_rate > dec!(100) {
        return Err(ReiaError::invalid(
            "vacancy_rate",
            "Vacancy rate must be between 0 and 100 percent",
        ));
    }

    let growth_fields = [
        ("interest_rate", input.interest_rate),
        ("appreciation_rate", input.appreciation_rate),
        ("rent_growth_rate", input.rent_growth_rate),
        ("expense_growth_rate", input.expense_growth_rate),
    ];
    for (field, value) in growth_fields {
        if value <= dec!(-100) || value > MAX_GROWTH_PCT {
            return Err(ReiaError::invalid(
                field,
                format!("Rate must be greater than -100% and at most {MAX_GROWTH_PCT}%"),
            ));
        }
    }

    if input.exit_cap_rate < Decimal::ZERO || input.exit_cap_rate > dec!(100) {
        return Err(ReiaError::invalid(
            "exit_cap_rate",
            "Exit cap rate must be between 0 and 100 percent",
        ));
    }

    Ok(())
}

/// Data-quality and risk flags for report consumers.
pub(crate) fn collect_warnings(input: &FinancialInputs, evaluation: &Evaluation) -> Vec<String> {
    let mut warnings = Vec::new();
    let result = &evaluation.result;

    if let IrrOutcome::BestEffort {
        iterations, reason, ..
    } = evaluation.irr
    {
        let why = match reason {
            StopReason::MaxIterations => "iteration limit reached",
            StopReason::FlatDerivative => "NPV derivative near zero",
            StopReason::NumericOverflow => "search left the representable range",
        };
        warnings.push(format!(
            "IRR did not converge after {iterations} iterations ({why}) — treat {:.2}% as an estimate",
            result.irr
        ));
    }

    if result.dscr > Decimal::ZERO && result.dscr < dec!(1.2) {
        warnings.push(format!(
            "DSCR of {:.2} is below 1.20x — lender covenant risk",
            result.dscr
        ));
    }

    if result.ltv > dec!(80) {
        warnings.push(format!("LTV of {:.1}% exceeds 80% — high leverage", result.ltv));
    }

    if input.vacancy_rate > dec!(15) {
        warnings.push(format!(
            "Vacancy rate {:.1}% exceeds 15% — above typical market norms",
            input.vacancy_rate
        ));
    }

    if let Some(first) = result.projections.first() {
        if first.cash_flow < Decimal::ZERO {
            warnings.push(format!(
                "Year 1 cash flow is negative ({:.0}) — debt service exceeds NOI",
                first.cash_flow
            ));
        }
    }

    if !input.loan_amount.is_zero() {
        if let Some(paid_off) = result.projections.iter().find(|p| p.loan_balance.is_zero()) {
            warnings.push(format!(
                "Loan is fully repaid in year {} of the holding period",
                paid_off.year
            ));
        }
    }

    if input.purchase_price.is_zero() {
        warnings.push("Purchase price is zero — cap rate and LTV reported as 0".into());
    }

    if input.cash_invested.is_zero() {
        warnings.push(
            "Cash invested is zero — cash-on-cash and equity multiple reported as 0".into(),
        );
    }

    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_inputs() -> FinancialInputs {
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

    #[test]
    fn test_headline_ratios() {
        let result = analyze(&sample_inputs());
        assert_eq!(result.noi, dec!(69000));
        assert_eq!(result.cap_rate, dec!(6.9));
        assert_eq!(result.ltv, dec!(75));
        assert_eq!(result.projections.len(), 10);
    }

    #[test]
    fn test_debt_metrics() {
        let result = analyze(&sample_inputs());
        // Annual debt service ≈ 48,313.95
        assert!((result.annual_debt_service - dec!(48313.93)).abs() < dec!(0.05));
        // DSCR ≈ 69000 / 48313.95 ≈ 1.428
        assert!((result.dscr - dec!(1.428)).abs() < dec!(0.001));
        // Break-even ≈ (45000 + 48313.95) / 120000 ≈ 77.76%
        assert!((result.break_even_occupancy - dec!(77.76)).abs() < dec!(0.01));
        // Cash-on-cash ≈ 20686.05 / 250000 ≈ 8.27%
        assert!((result.cash_on_cash_return - dec!(8.27)).abs() < dec!(0.01));
    }

    #[test]
    fn test_irr_matches_cash_flow_vector() {
        let inputs = sample_inputs();
        let evaluation = evaluate(&inputs, TerminalValue::EquityValue);
        let last = evaluation.result.projections.last().unwrap();

        assert_eq!(evaluation.cash_flows.len(), 11);
        assert_eq!(evaluation.cash_flows[0], dec!(-250000));
        assert_eq!(evaluation.cash_flows[10], last.cash_flow + last.equity_value);
        assert_eq!(evaluation.result.terminal_value, last.equity_value);
        assert!(evaluation.irr.is_converged());
        assert_eq!(evaluation.result.irr, evaluation.irr.percent());
    }

    #[test]
    fn test_equity_multiple_counts_sale_proceeds() {
        let result = analyze(&sample_inputs());
        let last = result.projections.last().unwrap();
        let expected = (last.cumulative_cash_flow + last.equity_value) / dec!(250000);
        assert_eq!(result.equity_multiple, expected);
    }

    #[test]
    fn test_exit_cap_terminal_value() {
        let inputs = sample_inputs();
        let rows = crate::analysis::projection::project(&inputs);
        let last = rows.last().unwrap();
        let tv = terminal_value(&inputs, &rows, TerminalValue::ExitCap);
        assert_eq!(tv, last.noi / dec!(0.065) - last.loan_balance);
    }

    #[test]
    fn test_exit_cap_falls_back_without_cap_rate() {
        let mut inputs = sample_inputs();
        inputs.exit_cap_rate = Decimal::ZERO;
        let rows = crate::analysis::projection::project(&inputs);
        let tv = terminal_value(&inputs, &rows, TerminalValue::ExitCap);
        assert_eq!(tv, rows.last().unwrap().equity_value);
    }

    #[test]
    fn test_zero_purchase_price_sentinels() {
        let mut inputs = sample_inputs();
        inputs.purchase_price = Decimal::ZERO;
        let result = analyze(&inputs);
        assert_eq!(result.cap_rate, Decimal::ZERO);
        assert_eq!(result.ltv, Decimal::ZERO);
        assert_eq!(result.gross_rent_multiplier, Decimal::ZERO);
    }

    #[test]
    fn test_degenerate_inputs_still_produce_result() {
        let inputs = FinancialInputs {
            purchase_price: Decimal::ZERO,
            gross_income: Decimal::ZERO,
            operating_expenses: Decimal::ZERO,
            vacancy_rate: Decimal::ZERO,
            loan_amount: Decimal::ZERO,
            interest_rate: Decimal::ZERO,
            loan_term_years: 0,
            cash_invested: Decimal::ZERO,
            appreciation_rate: Decimal::ZERO,
            rent_growth_rate: Decimal::ZERO,
            expense_growth_rate: Decimal::ZERO,
            holding_period_years: 1,
            exit_cap_rate: Decimal::ZERO,
        };
        let evaluation = evaluate(&inputs, TerminalValue::EquityValue);
        assert_eq!(evaluation.result.noi, Decimal::ZERO);
        assert_eq!(evaluation.result.dscr, Decimal::ZERO);
        assert_eq!(evaluation.result.break_even_occupancy, Decimal::ZERO);
        assert!(evaluation.result.viability_score <= 100);
    }

    #[test]
    fn test_validation_rejects_zero_holding_period() {
        let mut inputs = sample_inputs();
        inputs.holding_period_years = 0;
        let err = analyze_property(&inputs).unwrap_err();
        match err {
            ReiaError::InvalidInput { field, .. } => assert_eq!(field, "holding_period_years"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validation_rejects_negative_money_and_bad_vacancy() {
        let mut inputs = sample_inputs();
        inputs.operating_expenses = dec!(-1);
        assert!(validate_inputs(&inputs).is_err());

        let mut inputs = sample_inputs();
        inputs.vacancy_rate = dec!(101);
        assert!(validate_inputs(&inputs).is_err());

        let mut inputs = sample_inputs();
        inputs.rent_growth_rate = dec!(-100);
        assert!(validate_inputs(&inputs).is_err());
    }

    #[test]
    fn test_analyze_property_envelope() {
        let output = analyze_property(&sample_inputs()).unwrap();
        assert_eq!(output.result.noi, dec!(69000));
        assert_eq!(output.methodology, "Levered Hold-Period Investment Analysis");
        assert_eq!(output.assumptions["holding_period_years"], 10);
    }

    #[test]
    fn test_high_leverage_warnings() {
        let mut inputs = sample_inputs();
        inputs.loan_amount = dec!(900000);
        inputs.cash_invested = dec!(100000);
        let output = analyze_property(&inputs).unwrap();
        assert!(output.warnings.iter().any(|w| w.contains("LTV")));
        assert!(output.warnings.iter().any(|w| w.contains("DSCR")));
    }
}
