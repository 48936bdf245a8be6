use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

use crate::analysis::engine::collect_warnings;
use crate::analysis::{evaluate, validate_inputs, FinancialInputs, TerminalValue};
use crate::error::ReiaError;
use crate::types::*;
use crate::ReiaResult;

/// Upper bound on the number of points a generated sweep may contain.
pub const MAX_SWEEP_POINTS: usize = 201;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Assumption varied by a one-way sensitivity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityDriver {
    RentGrowth,
    ExpenseGrowth,
    ExitCapRate,
    Appreciation,
    InterestRate,
    VacancyRate,
}

impl std::fmt::Display for SensitivityDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensitivityDriver::RentGrowth => write!(f, "Rent Growth"),
            SensitivityDriver::ExpenseGrowth => write!(f, "Expense Growth"),
            SensitivityDriver::ExitCapRate => write!(f, "Exit Cap Rate"),
            SensitivityDriver::Appreciation => write!(f, "Appreciation"),
            SensitivityDriver::InterestRate => write!(f, "Interest Rate"),
            SensitivityDriver::VacancyRate => write!(f, "Vacancy Rate"),
        }
    }
}

impl SensitivityDriver {
    pub const ALL: [SensitivityDriver; 6] = [
        SensitivityDriver::RentGrowth,
        SensitivityDriver::ExpenseGrowth,
        SensitivityDriver::ExitCapRate,
        SensitivityDriver::Appreciation,
        SensitivityDriver::InterestRate,
        SensitivityDriver::VacancyRate,
    ];

    /// The current value of this driver in `inputs`.
    pub fn value_in(&self, inputs: &FinancialInputs) -> Percent {
        match self {
            SensitivityDriver::RentGrowth => inputs.rent_growth_rate,
            SensitivityDriver::ExpenseGrowth => inputs.expense_growth_rate,
            SensitivityDriver::ExitCapRate => inputs.exit_cap_rate,
            SensitivityDriver::Appreciation => inputs.appreciation_rate,
            SensitivityDriver::InterestRate => inputs.interest_rate,
            SensitivityDriver::VacancyRate => inputs.vacancy_rate,
        }
    }

    /// Copy of `base` with this driver set to `value`.
    pub fn apply(&self, base: &FinancialInputs, value: Percent) -> FinancialInputs {
        let mut inputs = base.clone();
        match self {
            SensitivityDriver::RentGrowth => inputs.rent_growth_rate = value,
            SensitivityDriver::ExpenseGrowth => inputs.expense_growth_rate = value,
            SensitivityDriver::ExitCapRate => inputs.exit_cap_rate = value,
            SensitivityDriver::Appreciation => inputs.appreciation_rate = value,
            SensitivityDriver::InterestRate => inputs.interest_rate = value,
            SensitivityDriver::VacancyRate => inputs.vacancy_rate = value,
        }
        inputs
    }

    /// Standard sweep used when the caller supplies no values.
    pub fn default_values(&self) -> Vec<Percent> {
        match self {
            SensitivityDriver::RentGrowth => vec![dec!(-1), dec!(0), dec!(2), dec!(3), dec!(5)],
            SensitivityDriver::ExpenseGrowth => {
                vec![dec!(1), dec!(2), dec!(2.5), dec!(3), dec!(4)]
            }
            SensitivityDriver::ExitCapRate => {
                vec![dec!(4.5), dec!(5.5), dec!(6), dec!(6.5), dec!(7.5)]
            }
            SensitivityDriver::Appreciation => vec![dec!(0), dec!(1), dec!(2), dec!(3), dec!(5)],
            SensitivityDriver::InterestRate => vec![dec!(4), dec!(5), dec!(6), dec!(7), dec!(8)],
            SensitivityDriver::VacancyRate => vec![dec!(0), dec!(3), dec!(5), dec!(8), dec!(12)],
        }
    }
}

/// Pipeline outputs at one value of the driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityPoint {
    pub value: Percent,
    pub final_year_noi: Money,
    /// Final-year NOI capitalised at the exit cap rate; 0 when the cap is 0
    pub exit_value: Money,
    pub irr: Percent,
    pub equity_multiple: Multiple,
    pub viability_score: u8,
    pub irr_converged: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityTable {
    pub driver: SensitivityDriver,
    /// Driver value in the base inputs
    pub base_value: Percent,
    /// Index of the point closest to the base value
    pub base_index: usize,
    pub points: Vec<SensitivityPoint>,
}

/// Input for the validated sensitivity entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensitivityInput {
    pub base_inputs: FinancialInputs,
    /// Omitted: the rent growth, exit cap and expense growth tables
    #[serde(default)]
    pub driver: Option<SensitivityDriver>,
    /// Explicit driver values; mutually exclusive with `range`
    #[serde(default)]
    pub values: Option<Vec<Percent>>,
    #[serde(default)]
    pub range: Option<SweepRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityOutput {
    pub tables: Vec<SensitivityTable>,
}

// ---------------------------------------------------------------------------
// Sweeps
// ---------------------------------------------------------------------------

/// Inclusive sweep from `min` to `max`. `max` is appended when the step
/// overshoots it.
pub fn sweep_values(min: Decimal, max: Decimal, step: Decimal) -> ReiaResult<Vec<Decimal>> {
    if step <= Decimal::ZERO {
        return Err(ReiaError::invalid("range.step", "Step must be positive"));
    }
    if min > max {
        return Err(ReiaError::invalid("range.min", "Min must be <= max"));
    }

    let too_many = || {
        ReiaError::invalid(
            "range.step",
            format!("Sweep would exceed {MAX_SWEEP_POINTS} points"),
        )
    };
    let span = max
        .checked_sub(min)
        .and_then(|width| width.checked_div(step))
        .ok_or_else(too_many)?;
    if span >= Decimal::from(MAX_SWEEP_POINTS as u64) {
        return Err(too_many());
    }

    let mut values = Vec::new();
    let mut next = Some(min);
    while let Some(current) = next.filter(|c| *c <= max) {
        values.push(current);
        next = current.checked_add(step);
    }
    if let Some(&last) = values.last() {
        if last < max {
            values.push(max);
        }
    }

    Ok(values)
}

/// Rent growth, exit cap and expense growth tables with their standard values.
pub fn default_sweeps() -> Vec<(SensitivityDriver, Vec<Percent>)> {
    [
        SensitivityDriver::RentGrowth,
        SensitivityDriver::ExitCapRate,
        SensitivityDriver::ExpenseGrowth,
    ]
    .into_iter()
    .map(|d| (d, d.default_values()))
    .collect()
}

fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| v.saturating_sub(target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Re-run the pipeline (exit-cap terminal value) once per driver value.
pub fn sensitivity(
    base: &FinancialInputs,
    driver: SensitivityDriver,
    values: &[Percent],
) -> Vec<SensitivityPoint> {
    values
        .iter()
        .map(|&value| {
            let inputs = driver.apply(base, value);
            let evaluation = evaluate(&inputs, TerminalValue::ExitCap);
            let result = &evaluation.result;
            let final_year_noi = result.summary.final_year_noi;
            let exit_value = if inputs.exit_cap_rate.is_zero() {
                Decimal::ZERO
            } else {
                final_year_noi
                    .checked_div(pct_to_rate(inputs.exit_cap_rate))
                    .unwrap_or(Decimal::ZERO)
            };

            SensitivityPoint {
                value,
                final_year_noi,
                exit_value,
                irr: result.irr,
                equity_multiple: result.equity_multiple,
                viability_score: result.viability_score,
                irr_converged: evaluation.irr.is_converged(),
            }
        })
        .collect()
}

fn table(base: &FinancialInputs, driver: SensitivityDriver, values: &[Percent]) -> SensitivityTable {
    let base_value = driver.value_in(base);
    debug!(%driver, points = values.len(), "building sensitivity table");
    SensitivityTable {
        driver,
        base_value,
        base_index: closest_index(values, base_value),
        points: sensitivity(base, driver, values),
    }
}

// ---------------------------------------------------------------------------
// Validated entry point
// ---------------------------------------------------------------------------

/// Validate, sweep and wrap with warnings and metadata.
pub fn run_sensitivity(input: &SensitivityInput) -> ReiaResult<ComputationOutput<SensitivityOutput>> {
    let start = Instant::now();
    validate_inputs(&input.base_inputs)?;

    let sweeps = match (input.driver, &input.values, &input.range) {
        (_, Some(_), Some(_)) => {
            return Err(ReiaError::invalid(
                "values",
                "Provide either values or range, not both",
            ));
        }
        (None, Some(_), None) | (None, None, Some(_)) => {
            return Err(ReiaError::invalid(
                "driver",
                "A driver is required when values or range are given",
            ));
        }
        (Some(driver), Some(values), None) => {
            if values.is_empty() {
                return Err(ReiaError::InsufficientData(
                    "At least one sensitivity value required".into(),
                ));
            }
            vec![(driver, values.clone())]
        }
        (Some(driver), None, Some(range)) => {
            vec![(driver, sweep_values(range.min, range.max, range.step)?)]
        }
        (Some(driver), None, None) => vec![(driver, driver.default_values())],
        (None, None, None) => default_sweeps(),
    };

    for (driver, values) in &sweeps {
        for &value in values {
            validate_inputs(&driver.apply(&input.base_inputs, value)).map_err(|e| match e {
                ReiaError::InvalidInput { field, reason } => ReiaError::InvalidInput {
                    field: format!("driver:{driver} value {value} ({field})"),
                    reason,
                },
                other => other,
            })?;
        }
    }

    let base_eval = evaluate(&input.base_inputs, TerminalValue::ExitCap);
    let mut warnings = collect_warnings(&input.base_inputs, &base_eval);

    let tables: Vec<SensitivityTable> = sweeps
        .iter()
        .map(|(driver, values)| table(&input.base_inputs, *driver, values))
        .collect();

    for t in &tables {
        for p in t.points.iter().filter(|p| !p.irr_converged) {
            warnings.push(format!(
                "{} at {}%: IRR is a best-effort estimate",
                t.driver, p.value
            ));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "One-Way Sensitivity Analysis (exit-cap terminal value)",
        &serde_json::json!({
            "drivers": tables.iter().map(|t| t.driver).collect::<Vec<_>>(),
            "points": tables.iter().map(|t| t.points.len()).sum::<usize>(),
        }),
        warnings,
        elapsed,
        SensitivityOutput { tables },
    ))
}
