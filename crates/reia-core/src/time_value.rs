use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{Money, Percent, Rate, HUNDRED};

const CONVERGENCE_THRESHOLD: Decimal = dec!(0.0000001);
const DERIVATIVE_FLOOR: Decimal = dec!(0.0000001);
const MAX_IRR_ITERATIONS: u32 = 100;

/// Default starting point for the Newton-Raphson search (10%).
pub const DEFAULT_IRR_GUESS: Rate = dec!(0.10);

/// Why the solver stopped without reaching the convergence threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// Iteration budget exhausted
    MaxIterations,
    /// |dNPV/dr| fell below the floor; stepping would divide by ~0
    FlatDerivative,
    /// NPV or the Newton step left the representable decimal range,
    /// or the discount base 1 + r reached zero
    NumericOverflow,
}

/// Outcome of an IRR search. `rate` is a decimal rate (0.10 = 10%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IrrOutcome {
    Converged {
        rate: Rate,
        iterations: u32,
    },
    BestEffort {
        rate: Rate,
        iterations: u32,
        reason: StopReason,
    },
}

impl IrrOutcome {
    pub fn rate(&self) -> Rate {
        match self {
            IrrOutcome::Converged { rate, .. } | IrrOutcome::BestEffort { rate, .. } => *rate,
        }
    }

    /// The rate as a percentage, saturating at the decimal bounds.
    pub fn percent(&self) -> Percent {
        self.rate().saturating_mul(HUNDRED)
    }

    pub fn is_converged(&self) -> bool {
        matches!(self, IrrOutcome::Converged { .. })
    }

    pub fn iterations(&self) -> u32 {
        match self {
            IrrOutcome::Converged { iterations, .. } | IrrOutcome::BestEffort { iterations, .. } => {
                *iterations
            }
        }
    }
}

/// Net Present Value of a series of cash flows; index 0 is undiscounted.
///
/// Returns `None` when `1 + rate` is zero or the sum leaves the decimal range.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> Option<Money> {
    npv_and_derivative(cash_flows, rate).map(|(npv, _)| npv)
}

/// Internal Rate of Return as a percentage, starting from a 10% guess.
///
/// Best-effort results are returned as-is; use [`solve_irr`] to tell them apart.
pub fn irr(cash_flows: &[Money]) -> Percent {
    solve_irr(cash_flows, DEFAULT_IRR_GUESS).percent()
}

/// Newton-Raphson search for the rate where NPV(rate) = 0.
pub fn solve_irr(cash_flows: &[Money], guess: Rate) -> IrrOutcome {
    let mut rate = guess;

    for i in 0..MAX_IRR_ITERATIONS {
        let (npv_val, dnpv) = match npv_and_derivative(cash_flows, rate) {
            Some(pair) => pair,
            None => return best_effort(rate, i, StopReason::NumericOverflow),
        };

        if npv_val.abs() < CONVERGENCE_THRESHOLD {
            return IrrOutcome::Converged {
                rate,
                iterations: i,
            };
        }

        if dnpv.abs() < DERIVATIVE_FLOOR {
            return best_effort(rate, i, StopReason::FlatDerivative);
        }

        match npv_val
            .checked_div(dnpv)
            .and_then(|step| rate.checked_sub(step))
        {
            Some(next) => rate = next,
            None => return best_effort(rate, i, StopReason::NumericOverflow),
        }
    }

    best_effort(rate, MAX_IRR_ITERATIONS, StopReason::MaxIterations)
}

fn best_effort(rate: Rate, iterations: u32, reason: StopReason) -> IrrOutcome {
    warn!(%rate, iterations, ?reason, "IRR search stopped before convergence");
    IrrOutcome::BestEffort {
        rate,
        iterations,
        reason,
    }
}

/// NPV(r) = sum CF_t / (1+r)^t and its derivative d(NPV)/dr.
fn npv_and_derivative(cash_flows: &[Money], rate: Rate) -> Option<(Decimal, Decimal)> {
    let one_plus_r = Decimal::ONE + rate;
    if one_plus_r.is_zero() {
        return None;
    }

    let mut npv = Decimal::ZERO;
    let mut dnpv = Decimal::ZERO;
    let mut discount = Decimal::ONE; // (1+r)^-t

    for (t, cf) in cash_flows.iter().enumerate() {
        let term = cf.checked_mul(discount)?;
        npv = npv.checked_add(term)?;
        if t > 0 {
            // d/dr of CF_t / (1+r)^t = -t * CF_t / (1+r)^(t+1)
            let slope = Decimal::from(t as u64)
                .checked_mul(term)?
                .checked_div(one_plus_r)?;
            dnpv = dnpv.checked_sub(slope)?;
        }
        discount = discount.checked_div(one_plus_r)?;
    }

    Some((npv, dnpv))
}
