use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Multiple, Percent, HUNDRED};

// ---------------------------------------------------------------------------
// Weights & reference points
// ---------------------------------------------------------------------------

const W_CAP_RATE: Decimal = dec!(0.15);
const W_CASH_ON_CASH: Decimal = dec!(0.20);
const W_IRR: Decimal = dec!(0.25);
const W_DSCR: Decimal = dec!(0.15);
const W_LTV: Decimal = dec!(0.10);
const W_EQUITY_MULTIPLE: Decimal = dec!(0.15);

/// (value scoring 0, value scoring 100). A reversed pair means lower is better.
const CAP_RATE_RANGE: (Decimal, Decimal) = (dec!(0), dec!(8));
const CASH_ON_CASH_RANGE: (Decimal, Decimal) = (dec!(0), dec!(12));
const IRR_RANGE: (Decimal, Decimal) = (dec!(0), dec!(15));
const DSCR_RANGE: (Decimal, Decimal) = (dec!(1.0), dec!(1.5));
const LTV_RANGE: (Decimal, Decimal) = (dec!(80), dec!(60));
const EQUITY_MULTIPLE_RANGE: (Decimal, Decimal) = (dec!(1.0), dec!(2.0));

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Categorical reading of the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ViabilityRating {
    Poor,
    Marginal,
    Fair,
    Good,
    #[serde(rename = "Very Good")]
    VeryGood,
    Excellent,
}

impl std::fmt::Display for ViabilityRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViabilityRating::Poor => write!(f, "Poor"),
            ViabilityRating::Marginal => write!(f, "Marginal"),
            ViabilityRating::Fair => write!(f, "Fair"),
            ViabilityRating::Good => write!(f, "Good"),
            ViabilityRating::VeryGood => write!(f, "Very Good"),
            ViabilityRating::Excellent => write!(f, "Excellent"),
        }
    }
}

impl ViabilityRating {
    /// Bucket a 0-100 score; each lower bound is inclusive.
    pub fn from_score(score: u8) -> Self {
        match score {
            85..=u8::MAX => ViabilityRating::Excellent,
            70..=84 => ViabilityRating::VeryGood,
            55..=69 => ViabilityRating::Good,
            40..=54 => ViabilityRating::Fair,
            25..=39 => ViabilityRating::Marginal,
            _ => ViabilityRating::Poor,
        }
    }
}

/// Per-metric sub-scores, each in [0, 100].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViabilityBreakdown {
    pub cap_rate: Decimal,
    pub cash_on_cash: Decimal,
    pub irr: Decimal,
    pub dscr: Decimal,
    pub ltv: Decimal,
    pub equity_multiple: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViabilityScore {
    pub score: u8,
    pub rating: ViabilityRating,
    pub breakdown: ViabilityBreakdown,
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Weighted composite of six normalised return and risk metrics.
///
/// This score describes a single deal. Ranking scenarios against each other
/// uses the scenario comparator's own rank score, never this one.
pub fn score(
    cap_rate: Percent,
    cash_on_cash: Percent,
    irr: Percent,
    dscr: Multiple,
    ltv: Percent,
    equity_multiple: Multiple,
) -> ViabilityScore {
    let breakdown = ViabilityBreakdown {
        cap_rate: sub_score(cap_rate, CAP_RATE_RANGE),
        cash_on_cash: sub_score(cash_on_cash, CASH_ON_CASH_RANGE),
        irr: sub_score(irr, IRR_RANGE),
        dscr: sub_score(dscr, DSCR_RANGE),
        ltv: sub_score(ltv, LTV_RANGE),
        equity_multiple: sub_score(equity_multiple, EQUITY_MULTIPLE_RANGE),
    };

    let weighted = breakdown.cap_rate * W_CAP_RATE
        + breakdown.cash_on_cash * W_CASH_ON_CASH
        + breakdown.irr * W_IRR
        + breakdown.dscr * W_DSCR
        + breakdown.ltv * W_LTV
        + breakdown.equity_multiple * W_EQUITY_MULTIPLE;

    let score = weighted
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .clamp(Decimal::ZERO, HUNDRED)
        .to_u8()
        .unwrap_or(0);

    ViabilityScore {
        score,
        rating: ViabilityRating::from_score(score),
        breakdown,
    }
}

/// Linear map of `value` onto [0, 100] between the two reference points.
///
/// The value is clamped into the reference interval before scaling, which is
/// the same as clamping the scaled result and cannot overflow.
fn sub_score(value: Decimal, (zero_at, full_at): (Decimal, Decimal)) -> Decimal {
    let (lo, hi) = if zero_at <= full_at {
        (zero_at, full_at)
    } else {
        (full_at, zero_at)
    };
    let bounded = value.clamp(lo, hi);
    (bounded - zero_at) / (full_at - zero_at) * HUNDRED
}
