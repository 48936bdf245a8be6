use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::types::{pct_to_rate, Money, Percent};

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Level monthly payment on a fixed-rate, fully amortizing loan.
///
/// Zero principal, zero rate or a zero term all yield a zero payment.
pub fn monthly_payment(loan_amount: Money, annual_rate_pct: Percent, term_years: u32) -> Money {
    if loan_amount.is_zero() || annual_rate_pct.is_zero() || term_years == 0 {
        return Decimal::ZERO;
    }

    let monthly_rate = pct_to_rate(annual_rate_pct) / MONTHS_PER_YEAR;
    let periods = i64::from(term_years) * 12;

    // P * r / (1 - (1+r)^-n), written against the discount factor so long
    // terms underflow toward zero instead of overflowing the compound factor.
    let one_plus_r = Decimal::ONE + monthly_rate;
    let payment = Decimal::ONE
        .checked_div(one_plus_r)
        .and_then(|v| v.checked_powi(periods))
        .and_then(|vn| {
            let denominator = Decimal::ONE - vn;
            loan_amount
                .checked_mul(monthly_rate)
                .and_then(|num| num.checked_div(denominator))
        });

    payment.unwrap_or(Decimal::ZERO)
}

/// Annual debt service: twelve level monthly payments.
///
/// Computed once per analysis and held constant across the holding period.
pub fn annual_debt_service(loan_amount: Money, annual_rate_pct: Percent, term_years: u32) -> Money {
    monthly_payment(loan_amount, annual_rate_pct, term_years).saturating_mul(MONTHS_PER_YEAR)
}

/// Balance after one more year of payments.
///
/// Interest accrues on the prior balance at the annual rate; whatever the
/// payment does not absorb retires principal. The balance never rises and
/// never drops below zero.
pub fn next_balance(prior_balance: Money, annual_payment: Money, annual_rate_pct: Percent) -> Money {
    let interest = prior_balance.saturating_mul(pct_to_rate(annual_rate_pct));
    let principal_paid = annual_payment.saturating_sub(interest).max(Decimal::ZERO);
    prior_balance.saturating_sub(principal_paid).max(Decimal::ZERO)
}

/// End-of-year balances for years `1..=years`.
pub fn balance_schedule(
    loan_amount: Money,
    annual_rate_pct: Percent,
    annual_payment: Money,
    years: u32,
) -> Vec<Money> {
    let mut balances = Vec::with_capacity(years as usize);
    let mut balance = loan_amount;
    for _ in 0..years {
        balance = next_balance(balance, annual_payment, annual_rate_pct);
        balances.push(balance);
    }
    balances
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zero_principal_or_rate_has_no_debt_service() {
        assert_eq!(annual_debt_service(dec!(0), dec!(5), 30), Decimal::ZERO);
        assert_eq!(annual_debt_service(dec!(750000), dec!(0), 30), Decimal::ZERO);
        assert_eq!(annual_debt_service(dec!(750000), dec!(5), 0), Decimal::ZERO);
    }

    #[test]
    fn test_thirty_year_mortgage_payment() {
        // $750k at 5% over 30 years: ~$4,026.16 / month
        let pmt = monthly_payment(dec!(750000), dec!(5), 30);
        assert!((pmt - dec!(4026.16)).abs() < dec!(0.01), "got {pmt}");

        let annual = annual_debt_service(dec!(750000), dec!(5), 30);
        assert_eq!(annual, pmt * dec!(12));
    }

    #[test]
    fn test_one_year_loan_payment_covers_principal() {
        // 12 payments must retire at least the principal
        let annual = annual_debt_service(dec!(120000), dec!(6), 1);
        assert!(annual > dec!(120000));
        assert!(annual < dec!(124000));
    }

    #[test]
    fn test_balance_decays_and_floors_at_zero() {
        let payment = annual_debt_service(dec!(100000), dec!(7), 5);
        let schedule = balance_schedule(dec!(100000), dec!(7), payment, 10);
        assert_eq!(schedule.len(), 10);

        let mut prior = dec!(100000);
        for bal in &schedule {
            assert!(*bal <= prior);
            assert!(*bal >= Decimal::ZERO);
            prior = *bal;
        }
        // Paid off before the ten-year horizon
        assert_eq!(*schedule.last().unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_first_year_principal_recurrence() {
        // 750000 * 5% = 37500 interest; principal = payment - 37500
        let payment = annual_debt_service(dec!(750000), dec!(5), 30);
        let bal = next_balance(dec!(750000), payment, dec!(5));
        assert_eq!(bal, dec!(750000) - (payment - dec!(37500)));
    }

    #[test]
    fn test_unpaid_interest_never_grows_balance() {
        // Zero payment against a positive rate leaves the balance untouched
        assert_eq!(next_balance(dec!(50000), dec!(0), dec!(8)), dec!(50000));
    }
}
