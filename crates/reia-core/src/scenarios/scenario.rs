use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::analysis::engine::collect_warnings;
use crate::analysis::{
    evaluate, validate_inputs, AnalysisResult, Evaluation, FinancialInputs, TerminalValue,
    ViabilityRating,
};
use crate::error::ReiaError;
use crate::types::{with_metadata, ComputationOutput, Money, Multiple, Percent};
use crate::ReiaResult;

const RANK_WEIGHT_IRR: Decimal = dec!(0.4);
const RANK_WEIGHT_EQUITY_MULTIPLE: Decimal = dec!(0.3);
const RANK_WEIGHT_CASH_ON_CASH: Decimal = dec!(0.3);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Field-by-field replacements applied on top of base inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gross_income: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_expenses: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vacancy_rate: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_rate: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_term_years: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cash_invested: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appreciation_rate: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rent_growth_rate: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expense_growth_rate: Option<Percent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holding_period_years: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_cap_rate: Option<Percent>,
}

impl ScenarioOverrides {
    pub fn apply(&self, base: &FinancialInputs) -> FinancialInputs {
        FinancialInputs {
            purchase_price: self.purchase_price.unwrap_or(base.purchase_price),
            gross_income: self.gross_income.unwrap_or(base.gross_income),
            operating_expenses: self.operating_expenses.unwrap_or(base.operating_expenses),
            vacancy_rate: self.vacancy_rate.unwrap_or(base.vacancy_rate),
            loan_amount: self.loan_amount.unwrap_or(base.loan_amount),
            interest_rate: self.interest_rate.unwrap_or(base.interest_rate),
            loan_term_years: self.loan_term_years.unwrap_or(base.loan_term_years),
            cash_invested: self.cash_invested.unwrap_or(base.cash_invested),
            appreciation_rate: self.appreciation_rate.unwrap_or(base.appreciation_rate),
            rent_growth_rate: self.rent_growth_rate.unwrap_or(base.rent_growth_rate),
            expense_growth_rate: self.expense_growth_rate.unwrap_or(base.expense_growth_rate),
            holding_period_years: self.holding_period_years.unwrap_or(base.holding_period_years),
            exit_cap_rate: self.exit_cap_rate.unwrap_or(base.exit_cap_rate),
        }
    }
}

/// A named set of overrides, as supplied by callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,
    #[serde(default)]
    pub overrides: ScenarioOverrides,
}

/// A fully resolved scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedScenario {
    pub name: String,
    pub inputs: FinancialInputs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub name: String,
    /// Index of the scenario in the caller's list
    pub position: usize,
    /// 0.4 * IRR + 0.3 * equity multiple + 0.3 * average cash-on-cash
    pub rank_score: Decimal,
    pub irr: Percent,
    pub equity_multiple: Multiple,
    pub average_cash_on_cash: Percent,
    pub viability_score: u8,
    pub viability_rating: ViabilityRating,
    pub analysis: AnalysisResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    /// Name of the top-ranked scenario; `None` when nothing was compared
    pub best: Option<String>,
    /// Outcomes by descending rank score, ties in caller order
    pub ranked: Vec<ScenarioOutcome>,
}

/// Input for the validated comparison entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioComparisonInput {
    pub base_inputs: FinancialInputs,
    /// Omitted: Conservative / Base Case / Aggressive around the base
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<Vec<ScenarioDefinition>>,
}

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Scenario ranking rule. Deliberately independent of the viability score.
pub fn scenario_rank_score(
    irr: Percent,
    equity_multiple: Multiple,
    average_cash_on_cash: Percent,
) -> Decimal {
    irr.saturating_mul(RANK_WEIGHT_IRR)
        .saturating_add(equity_multiple.saturating_mul(RANK_WEIGHT_EQUITY_MULTIPLE))
        .saturating_add(average_cash_on_cash.saturating_mul(RANK_WEIGHT_CASH_ON_CASH))
}

/// Run every scenario through the pipeline (exit-cap terminal value) and rank them.
pub fn compare(scenarios: &[NamedScenario]) -> ScenarioComparison {
    let outcomes = scenarios
        .iter()
        .enumerate()
        .map(|(position, scenario)| {
            let evaluation = evaluate(&scenario.inputs, TerminalValue::ExitCap);
            outcome(position, &scenario.name, evaluation)
        })
        .collect();
    rank(outcomes)
}

fn outcome(position: usize, name: &str, evaluation: Evaluation) -> ScenarioOutcome {
    let analysis = evaluation.result;
    let average_cash_on_cash = analysis.summary.average_cash_on_cash;
    let rank_score =
        scenario_rank_score(analysis.irr, analysis.equity_multiple, average_cash_on_cash);
    debug!(scenario = name, %rank_score, "scenario evaluated");

    ScenarioOutcome {
        name: name.to_string(),
        position,
        rank_score,
        irr: analysis.irr,
        equity_multiple: analysis.equity_multiple,
        average_cash_on_cash,
        viability_score: analysis.viability_score,
        viability_rating: analysis.viability_rating,
        analysis,
    }
}

fn rank(mut outcomes: Vec<ScenarioOutcome>) -> ScenarioComparison {
    // sort_by is stable: equal scores keep caller order
    outcomes.sort_by(|a, b| b.rank_score.cmp(&a.rank_score));
    ScenarioComparison {
        best: outcomes.first().map(|o| o.name.clone()),
        ranked: outcomes,
    }
}

// ---------------------------------------------------------------------------
// Presets
// ---------------------------------------------------------------------------

/// Conservative, Base Case and Aggressive variants of `base`.
///
/// Conservative: rent growth -1pt, expense growth +0.5pt, appreciation -1pt,
/// vacancy +2pt, exit cap +0.5pt, interest +0.5pt. Aggressive mirrors it.
/// Rates that would go negative (vacancy, exit cap, interest) floor at zero.
pub fn standard_scenarios(base: &FinancialInputs) -> Vec<NamedScenario> {
    vec![
        NamedScenario {
            name: "Conservative".into(),
            inputs: shifted(base, Decimal::NEGATIVE_ONE),
        },
        NamedScenario {
            name: "Base Case".into(),
            inputs: base.clone(),
        },
        NamedScenario {
            name: "Aggressive".into(),
            inputs: shifted(base, Decimal::ONE),
        },
    ]
}

/// `direction` = +1 for upside, -1 for downside.
fn shifted(base: &FinancialInputs, direction: Decimal) -> FinancialInputs {
    let half = dec!(0.5) * direction;
    let floor = |v: Decimal| v.max(Decimal::ZERO);
    ScenarioOverrides {
        rent_growth_rate: Some(base.rent_growth_rate.saturating_add(direction)),
        expense_growth_rate: Some(base.expense_growth_rate.saturating_sub(half)),
        appreciation_rate: Some(base.appreciation_rate.saturating_add(direction)),
        vacancy_rate: Some(
            floor(base.vacancy_rate.saturating_sub(dec!(2) * direction)).min(dec!(100)),
        ),
        exit_cap_rate: Some(if base.exit_cap_rate.is_zero() {
            Decimal::ZERO
        } else {
            floor(base.exit_cap_rate.saturating_sub(half))
        }),
        interest_rate: Some(if base.interest_rate.is_zero() {
            Decimal::ZERO
        } else {
            floor(base.interest_rate.saturating_sub(half))
        }),
        ..ScenarioOverrides::default()
    }
    .apply(base)
}

// ---------------------------------------------------------------------------
// Validated entry point
// ---------------------------------------------------------------------------

/// Resolve, validate, compare and wrap with warnings and metadata.
pub fn compare_scenarios(
    input: &ScenarioComparisonInput,
) -> ReiaResult<ComputationOutput<ScenarioComparison>> {
    let start = Instant::now();
    validate_inputs(&input.base_inputs)?;

    let scenarios = match &input.scenarios {
        None => standard_scenarios(&input.base_inputs),
        Some(defs) if defs.is_empty() => {
            return Err(ReiaError::InsufficientData(
                "At least one scenario required".into(),
            ));
        }
        Some(defs) => defs
            .iter()
            .map(|d| NamedScenario {
                name: d.name.clone(),
                inputs: d.overrides.apply(&input.base_inputs),
            })
            .collect(),
    };

    let mut warnings = Vec::new();
    let mut outcomes = Vec::with_capacity(scenarios.len());
    for (position, scenario) in scenarios.iter().enumerate() {
        validate_inputs(&scenario.inputs).map_err(|e| match e {
            ReiaError::InvalidInput { field, reason } => ReiaError::InvalidInput {
                field: format!("scenario:{} {field}", scenario.name),
                reason,
            },
            other => other,
        })?;

        let evaluation = evaluate(&scenario.inputs, TerminalValue::ExitCap);
        warnings.extend(
            collect_warnings(&scenario.inputs, &evaluation)
                .into_iter()
                .map(|w| format!("{}: {w}", scenario.name)),
        );
        outcomes.push(outcome(position, &scenario.name, evaluation));
    }

    let comparison = rank(outcomes);
    if let [first, second, ..] = comparison.ranked.as_slice() {
        if first.rank_score == second.rank_score {
            warnings.push(format!(
                "'{}' and '{}' tie on rank score; the earlier-listed scenario is preferred",
                first.name, second.name
            ));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Multi-Scenario Investment Comparison (0.4 IRR + 0.3 EM + 0.3 avg CoC)",
        &serde_json::json!({
            "num_scenarios": scenarios.len(),
            "scenario_names": scenarios.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            "terminal_value": "exit_cap",
        }),
        warnings,
        elapsed,
        comparison,
    ))
}
