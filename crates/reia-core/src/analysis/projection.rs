use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use super::amortization::{annual_debt_service, next_balance};
use super::inputs::FinancialInputs;
use super::metrics;
use crate::types::{pct_to_rate, Money, Percent, HUNDRED};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One projected year of the holding period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialProjection {
    /// 1-indexed holding year
    pub year: u32,
    /// Gross potential income after rent growth
    pub gross_income: Money,
    /// Gross income net of vacancy
    pub effective_income: Money,
    /// Operating expenses after expense growth
    pub operating_expenses: Money,
    pub noi: Money,
    /// Constant annual debt service
    pub debt_service: Money,
    /// NOI less debt service
    pub cash_flow: Money,
    /// Running sum of cash flow through this year
    pub cumulative_cash_flow: Money,
    /// Cash flow over cash invested, percent
    pub cash_on_cash: Percent,
    /// Purchase price appreciated through year end
    pub property_value: Money,
    /// Loan balance at year end
    pub loan_balance: Money,
    /// Property value less loan balance
    pub equity_value: Money,
}

/// Roll-up of a projection series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionSummary {
    pub total_years: u32,
    pub year_one_noi: Money,
    pub final_year_noi: Money,
    /// Final-year NOI over year-one NOI, less one, percent (0 when year-one NOI <= 0)
    pub total_noi_growth: Percent,
    pub average_annual_noi: Money,
    pub total_projected_noi: Money,
    pub total_cash_flow: Money,
    /// Mean of the yearly cash-on-cash returns
    pub average_cash_on_cash: Percent,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Project the holding period year by year.
///
/// Income and expenses compound from year 1 (exponent `year - 1`), property
/// value compounds through year end (exponent `year`). Debt service is fixed
/// for the whole hold.
pub fn project(inputs: &FinancialInputs) -> Vec<FinancialProjection> {
    let debt_service = annual_debt_service(
        inputs.loan_amount,
        inputs.interest_rate,
        inputs.loan_term_years,
    );
    project_with_debt_service(inputs, debt_service)
}

/// Project with a debt-service figure the caller already computed.
pub fn project_with_debt_service(
    inputs: &FinancialInputs,
    debt_service: Money,
) -> Vec<FinancialProjection> {
    let years = inputs.holding_period_years;
    let mut rows = Vec::with_capacity(years as usize);
    let mut cumulative_cash_flow = Decimal::ZERO;
    let mut loan_balance = inputs.loan_amount;

    for year in 1..=years {
        let gross_income = inputs
            .gross_income
            .saturating_mul(growth_factor(inputs.rent_growth_rate, year - 1));
        let operating_expenses = inputs
            .operating_expenses
            .saturating_mul(growth_factor(inputs.expense_growth_rate, year - 1));

        let effective_income = metrics::effective_income(gross_income, inputs.vacancy_rate);
        let noi = metrics::noi(gross_income, operating_expenses, inputs.vacancy_rate);
        let cash_flow = noi.saturating_sub(debt_service);
        cumulative_cash_flow = cumulative_cash_flow.saturating_add(cash_flow);

        let property_value = inputs
            .purchase_price
            .saturating_mul(growth_factor(inputs.appreciation_rate, year));
        loan_balance = next_balance(loan_balance, debt_service, inputs.interest_rate);

        rows.push(FinancialProjection {
            year,
            gross_income,
            effective_income,
            operating_expenses,
            noi,
            debt_service,
            cash_flow,
            cumulative_cash_flow,
            cash_on_cash: metrics::cash_on_cash(cash_flow, inputs.cash_invested),
            property_value,
            loan_balance,
            equity_value: property_value.saturating_sub(loan_balance),
        });
    }

    rows
}

/// Summarise a projection series. An empty series summarises to zeros.
pub fn summarize(projections: &[FinancialProjection]) -> ProjectionSummary {
    let (first, last) = match (projections.first(), projections.last()) {
        (Some(f), Some(l)) => (f, l),
        _ => {
            return ProjectionSummary {
                total_years: 0,
                year_one_noi: Decimal::ZERO,
                final_year_noi: Decimal::ZERO,
                total_noi_growth: Decimal::ZERO,
                average_annual_noi: Decimal::ZERO,
                total_projected_noi: Decimal::ZERO,
                total_cash_flow: Decimal::ZERO,
                average_cash_on_cash: Decimal::ZERO,
            }
        }
    };

    let count = Decimal::from(projections.len() as u64);
    let total_projected_noi = projections
        .iter()
        .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.noi));
    let total_coc = projections
        .iter()
        .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p.cash_on_cash));

    let total_noi_growth = if first.noi > Decimal::ZERO {
        last.noi
            .checked_div(first.noi)
            .and_then(|growth| (growth - Decimal::ONE).checked_mul(HUNDRED))
            .unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    ProjectionSummary {
        total_years: projections.len() as u32,
        year_one_noi: first.noi,
        final_year_noi: last.noi,
        total_noi_growth,
        average_annual_noi: total_projected_noi / count,
        total_projected_noi,
        total_cash_flow: last.cumulative_cash_flow,
        average_cash_on_cash: total_coc / count,
    }
}

/// (1 + pct/100)^periods, saturating at the decimal bound with the sign of the true power.
fn growth_factor(rate_pct: Percent, periods: u32) -> Decimal {
    let base = Decimal::ONE.saturating_add(pct_to_rate(rate_pct));
    base.checked_powi(i64::from(periods)).unwrap_or_else(|| {
        if base.is_sign_negative() && periods % 2 == 1 {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    })
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
    fn test_projection_length_and_years() {
        let rows = project(&sample_inputs());
        assert_eq!(rows.len(), 10);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.year, i as u32 + 1);
        }
    }

    #[test]
    fn test_year_one_is_uncompounded() {
        let rows = project(&sample_inputs());
        let y1 = &rows[0];
        assert_eq!(y1.gross_income, dec!(120000));
        assert_eq!(y1.operating_expenses, dec!(45000));
        assert_eq!(y1.effective_income, dec!(114000));
        assert_eq!(y1.noi, dec!(69000));
        // Value appreciates through the first year end
        assert_eq!(y1.property_value, dec!(1030000));
    }

    #[test]
    fn test_year_two_growth() {
        let rows = project(&sample_inputs());
        let y2 = &rows[1];
        // 120000 * 1.03 = 123600; 45000 * 1.03 = 46350
        assert_eq!(y2.gross_income, dec!(123600));
        assert_eq!(y2.operating_expenses, dec!(46350));
        // 123600 * 0.95 - 46350 = 71070
        assert_eq!(y2.noi, dec!(71070));
        assert_eq!(y2.property_value, dec!(1060900));
    }

    #[test]
    fn test_cumulative_is_running_sum() {
        let rows = project(&sample_inputs());
        let mut running = Decimal::ZERO;
        for row in &rows {
            running += row.cash_flow;
            assert_eq!(row.cumulative_cash_flow, running);
            assert_eq!(row.cash_flow, row.noi - row.debt_service);
            assert_eq!(row.equity_value, row.property_value - row.loan_balance);
        }
    }

    #[test]
    fn test_debt_service_constant_and_balance_non_increasing() {
        let rows = project(&sample_inputs());
        let ds = rows[0].debt_service;
        let mut prior = dec!(750000);
        for row in &rows {
            assert_eq!(row.debt_service, ds);
            assert!(row.loan_balance <= prior);
            assert!(row.loan_balance >= Decimal::ZERO);
            prior = row.loan_balance;
        }
    }

    #[test]
    fn test_short_loan_pays_off_within_hold() {
        let mut inputs = sample_inputs();
        inputs.loan_term_years = 3;
        let rows = project(&inputs);
        assert_eq!(rows.last().unwrap().loan_balance, Decimal::ZERO);
        assert_eq!(rows.last().unwrap().equity_value, rows.last().unwrap().property_value);
    }

    #[test]
    fn test_all_cash_purchase() {
        let mut inputs = sample_inputs();
        inputs.loan_amount = Decimal::ZERO;
        inputs.cash_invested = dec!(1000000);
        let rows = project(&inputs);
        assert_eq!(rows[0].debt_service, Decimal::ZERO);
        assert_eq!(rows[0].cash_flow, rows[0].noi);
        assert_eq!(rows[0].cash_on_cash, dec!(6.9));
        assert!(rows.iter().all(|r| r.loan_balance.is_zero()));
    }

    #[test]
    fn test_summary() {
        let rows = project(&sample_inputs());
        let summary = summarize(&rows);
        assert_eq!(summary.total_years, 10);
        assert_eq!(summary.year_one_noi, dec!(69000));
        assert_eq!(summary.final_year_noi, rows[9].noi);
        assert_eq!(summary.total_cash_flow, rows[9].cumulative_cash_flow);
        // Everything grows at 3%, so NOI grows 1.03^9 - 1 ≈ 30.48%
        assert!((summary.total_noi_growth - dec!(30.48)).abs() < dec!(0.01));
        let avg_coc: Decimal =
            rows.iter().map(|r| r.cash_on_cash).sum::<Decimal>() / dec!(10);
        assert_eq!(summary.average_cash_on_cash, avg_coc);
    }

    #[test]
    fn test_summary_of_empty_series() {
        let summary = summarize(&[]);
        assert_eq!(summary.total_years, 0);
        assert_eq!(summary.average_annual_noi, Decimal::ZERO);
    }

    #[test]
    fn test_zero_holding_period_projects_nothing() {
        let mut inputs = sample_inputs();
        inputs.holding_period_years = 0;
        assert!(project(&inputs).is_empty());
    }

    #[test]
    fn test_growth_factor_overflow_keeps_sign() {
        // 1 + (-1000%) = -9; 9^31 and 9^32 are beyond the decimal range
        assert_eq!(growth_factor(dec!(-1000), 31), Decimal::MIN);
        assert_eq!(growth_factor(dec!(-1000), 32), Decimal::MAX);
        assert_eq!(growth_factor(dec!(1000), 31), Decimal::MAX);
        assert_eq!(growth_factor(dec!(-1000), 3), dec!(-729));
    }
}
