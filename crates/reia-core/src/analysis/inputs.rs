use serde::{Deserialize, Serialize};

use crate::types::{Money, Percent};

/// Caller-supplied assumptions for one analysis run.
///
/// Every rate is a percentage (5 = 5%). Monetary fields are annual figures
/// except `purchase_price`, `loan_amount` and `cash_invested`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialInputs {
    /// Acquisition price
    pub purchase_price: Money,
    /// Gross potential income in year 1
    pub gross_income: Money,
    /// Operating expenses in year 1
    pub operating_expenses: Money,
    /// Vacancy and collection loss, 0-100
    pub vacancy_rate: Percent,
    /// Mortgage principal
    pub loan_amount: Money,
    /// Annual mortgage interest rate
    pub interest_rate: Percent,
    /// Amortization period in years
    pub loan_term_years: u32,
    /// Equity invested at close
    pub cash_invested: Money,
    /// Annual property value appreciation
    pub appreciation_rate: Percent,
    /// Annual gross income growth
    pub rent_growth_rate: Percent,
    /// Annual operating expense growth
    pub expense_growth_rate: Percent,
    /// Number of projected years, at least 1
    pub holding_period_years: u32,
    /// Reversion cap rate for exit-cap terminal valuation
    #[serde(default)]
    pub exit_cap_rate: Percent,
}
