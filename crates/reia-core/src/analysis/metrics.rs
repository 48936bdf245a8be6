//! Single-period ratio formulas.
//!
//! Each ratio comes in two forms. `try_*` returns `None` when the denominator
//! is zero (or the quotient leaves the decimal range), so callers can tell an
//! undefined ratio from a legitimate zero. The plain form maps `None` to zero,
//! which is what reports and the scoring stages consume.

use rust_decimal::Decimal;

use crate::types::{pct_to_rate, Money, Multiple, Percent, HUNDRED};

fn ratio(numerator: Decimal, denominator: Decimal) -> Option<Decimal> {
    if denominator.is_zero() {
        return None;
    }
    numerator.checked_div(denominator)
}

fn ratio_pct(numerator: Decimal, denominator: Decimal) -> Option<Percent> {
    ratio(numerator, denominator).and_then(|r| r.checked_mul(HUNDRED))
}

/// Net operating income: effective income after vacancy, less operating expenses.
pub fn noi(gross_income: Money, operating_expenses: Money, vacancy_pct: Percent) -> Money {
    effective_income(gross_income, vacancy_pct).saturating_sub(operating_expenses)
}

/// Gross income net of vacancy and collection loss.
pub fn effective_income(gross_income: Money, vacancy_pct: Percent) -> Money {
    gross_income.saturating_mul(Decimal::ONE - pct_to_rate(vacancy_pct))
}

pub fn try_cap_rate(noi: Money, purchase_price: Money) -> Option<Percent> {
    ratio_pct(noi, purchase_price)
}

/// NOI over purchase price, as a percentage.
pub fn cap_rate(noi: Money, purchase_price: Money) -> Percent {
    try_cap_rate(noi, purchase_price).unwrap_or(Decimal::ZERO)
}

pub fn try_cash_on_cash(annual_cash_flow: Money, cash_invested: Money) -> Option<Percent> {
    ratio_pct(annual_cash_flow, cash_invested)
}

/// Annual cash flow over equity invested, as a percentage.
pub fn cash_on_cash(annual_cash_flow: Money, cash_invested: Money) -> Percent {
    try_cash_on_cash(annual_cash_flow, cash_invested).unwrap_or(Decimal::ZERO)
}

pub fn try_dscr(noi: Money, annual_debt_service: Money) -> Option<Multiple> {
    ratio(noi, annual_debt_service)
}

/// Debt service coverage: NOI over annual debt service.
pub fn dscr(noi: Money, annual_debt_service: Money) -> Multiple {
    try_dscr(noi, annual_debt_service).unwrap_or(Decimal::ZERO)
}

pub fn try_ltv(loan_amount: Money, purchase_price: Money) -> Option<Percent> {
    ratio_pct(loan_amount, purchase_price)
}

/// Loan-to-value, as a percentage.
pub fn ltv(loan_amount: Money, purchase_price: Money) -> Percent {
    try_ltv(loan_amount, purchase_price).unwrap_or(Decimal::ZERO)
}

pub fn try_break_even_occupancy(
    operating_expenses: Money,
    annual_debt_service: Money,
    gross_potential_income: Money,
) -> Option<Percent> {
    ratio_pct(
        operating_expenses.saturating_add(annual_debt_service),
        gross_potential_income,
    )
}

/// Occupancy needed for income to cover expenses plus debt service.
pub fn break_even_occupancy(
    operating_expenses: Money,
    annual_debt_service: Money,
    gross_potential_income: Money,
) -> Percent {
    try_break_even_occupancy(operating_expenses, annual_debt_service, gross_potential_income)
        .unwrap_or(Decimal::ZERO)
}

pub fn try_equity_multiple(total_cash_returned: Money, cash_invested: Money) -> Option<Multiple> {
    ratio(total_cash_returned, cash_invested)
}

/// Total cash returned over the hold divided by cash invested.
pub fn equity_multiple(total_cash_returned: Money, cash_invested: Money) -> Multiple {
    try_equity_multiple(total_cash_returned, cash_invested).unwrap_or(Decimal::ZERO)
}

/// Operating expenses as a percentage of gross income.
pub fn expense_ratio(operating_expenses: Money, gross_income: Money) -> Percent {
    ratio_pct(operating_expenses, gross_income).unwrap_or(Decimal::ZERO)
}

/// NOI as a percentage of gross income.
pub fn noi_margin(noi: Money, gross_income: Money) -> Percent {
    ratio_pct(noi, gross_income).unwrap_or(Decimal::ZERO)
}

/// Purchase price over gross income.
pub fn gross_rent_multiplier(purchase_price: Money, gross_income: Money) -> Multiple {
    ratio(purchase_price, gross_income).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_noi_identity() {
        // 120000 * 0.95 - 45000 = 69000
        assert_eq!(noi(dec!(120000), dec!(45000), dec!(5)), dec!(69000));
        assert_eq!(noi(dec!(80000), dec!(30000), dec!(0)), dec!(50000));
        // Full vacancy leaves only the expenses
        assert_eq!(noi(dec!(80000), dec!(30000), dec!(100)), dec!(-30000));
    }

    #[test]
    fn test_cap_rate_and_ltv() {
        assert_eq!(cap_rate(dec!(69000), dec!(1000000)), dec!(6.9));
        assert_eq!(ltv(dec!(750000), dec!(1000000)), dec!(75));
    }

    #[test]
    fn test_zero_denominators_degrade_to_zero() {
        assert_eq!(cap_rate(dec!(69000), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(cash_on_cash(dec!(20000), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(dscr(dec!(69000), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(ltv(dec!(750000), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(
            break_even_occupancy(dec!(45000), dec!(48000), Decimal::ZERO),
            Decimal::ZERO
        );
        assert_eq!(equity_multiple(dec!(500000), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(expense_ratio(dec!(45000), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(gross_rent_multiplier(dec!(1000000), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_try_forms_distinguish_undefined_from_zero() {
        assert_eq!(try_cap_rate(Decimal::ZERO, dec!(1000000)), Some(Decimal::ZERO));
        assert_eq!(try_cap_rate(dec!(69000), Decimal::ZERO), None);
        assert_eq!(try_dscr(dec!(69000), Decimal::ZERO), None);
        assert_eq!(try_equity_multiple(dec!(1), Decimal::ZERO), None);
    }

    #[test]
    fn test_dscr_and_break_even() {
        assert_eq!(dscr(dec!(60000), dec!(48000)), dec!(1.25));
        // (45000 + 45000) / 120000 = 75%
        assert_eq!(
            break_even_occupancy(dec!(45000), dec!(45000), dec!(120000)),
            dec!(75)
        );
    }

    #[test]
    fn test_cash_on_cash_and_equity_multiple() {
        assert_eq!(cash_on_cash(dec!(20000), dec!(250000)), dec!(8));
        assert_eq!(equity_multiple(dec!(500000), dec!(250000)), dec!(2));
    }

    #[test]
    fn test_operating_ratios() {
        assert_eq!(expense_ratio(dec!(45000), dec!(120000)), dec!(37.5));
        assert_eq!(noi_margin(dec!(69000), dec!(120000)), dec!(57.5));
        assert_eq!(
            gross_rent_multiplier(dec!(1000000), dec!(125000)),
            dec!(8)
        );
    }
}
