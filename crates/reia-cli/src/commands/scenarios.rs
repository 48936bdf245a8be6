use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use reia_core::analysis::FinancialInputs;
use reia_core::scenarios::scenario::{self, ScenarioComparisonInput};
use reia_core::scenarios::sensitivity::{self, SensitivityDriver, SensitivityInput};
use reia_core::SweepRange;

use crate::input;

/// Arguments for scenario comparison
#[derive(Args)]
pub struct CompareArgs {
    /// Path to JSON file with `base_inputs` and optional `scenarios`
    #[arg(long)]
    pub input: Option<String>,

    /// Treat the input as bare property inputs and compare the standard
    /// Conservative / Base Case / Aggressive set
    #[arg(long)]
    pub presets: bool,
}

/// Arguments for one-way sensitivity analysis
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct SensitivityArgs {
    /// Path to JSON file with `base_inputs` (and optionally driver/values/range)
    #[arg(long)]
    pub input: Option<String>,

    /// Assumption to vary; omit for the rent growth, exit cap and expense growth tables
    #[arg(long, value_enum)]
    pub driver: Option<DriverArg>,

    /// Sweep in format min:max:step (e.g. "4:8:0.5")
    #[arg(long)]
    pub range: Option<String>,

    /// Comma-separated driver values (e.g. "-1,0,2,3,5")
    #[arg(long)]
    pub values: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DriverArg {
    RentGrowth,
    ExpenseGrowth,
    ExitCap,
    Appreciation,
    InterestRate,
    Vacancy,
}

impl From<DriverArg> for SensitivityDriver {
    fn from(arg: DriverArg) -> Self {
        match arg {
            DriverArg::RentGrowth => SensitivityDriver::RentGrowth,
            DriverArg::ExpenseGrowth => SensitivityDriver::ExpenseGrowth,
            DriverArg::ExitCap => SensitivityDriver::ExitCapRate,
            DriverArg::Appreciation => SensitivityDriver::Appreciation,
            DriverArg::InterestRate => SensitivityDriver::InterestRate,
            DriverArg::Vacancy => SensitivityDriver::VacancyRate,
        }
    }
}

fn read_input(path: Option<&str>, what: &str) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        input::file::read_json(path)
    } else if let Some(data) = input::stdin::read_stdin::<Value>()? {
        Ok(data)
    } else {
        Err(format!("--input <file.json> or stdin required for {what}").into())
    }
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data = read_input(args.input.as_deref(), "scenario comparison")?;
    let comparison_input = if args.presets {
        let base: FinancialInputs = serde_json::from_value(data)?;
        ScenarioComparisonInput {
            base_inputs: base,
            scenarios: None,
        }
    } else {
        serde_json::from_value(data)?
    };

    let result = scenario::compare_scenarios(&comparison_input)?;
    Ok(serde_json::to_value(result)?)
}

fn parse_range(spec: &str) -> Result<SweepRange, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 3 {
        return Err(format!("Range must be min:max:step, got '{}'", spec).into());
    }
    Ok(SweepRange {
        min: parts[0].trim().parse()?,
        max: parts[1].trim().parse()?,
        step: parts[2].trim().parse()?,
    })
}

fn parse_values(list: &str) -> Result<Vec<Decimal>, Box<dyn std::error::Error>> {
    list.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.trim()
                .parse::<Decimal>()
                .map_err(|e| -> Box<dyn std::error::Error> {
                    format!("Invalid value '{}': {}", s.trim(), e).into()
                })
        })
        .collect()
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let data = read_input(args.input.as_deref(), "sensitivity analysis")?;

    // Accept either a full request or bare property inputs
    let mut request: SensitivityInput = if data.get("base_inputs").is_some() {
        serde_json::from_value(data)?
    } else {
        SensitivityInput {
            base_inputs: serde_json::from_value(data)?,
            driver: None,
            values: None,
            range: None,
        }
    };

    if let Some(driver) = args.driver {
        request.driver = Some(driver.into());
    }
    if let Some(ref spec) = args.range {
        request.range = Some(parse_range(spec)?);
        request.values = None;
    }
    if let Some(ref list) = args.values {
        request.values = Some(parse_values(list)?);
        request.range = None;
    }

    let result = sensitivity::run_sensitivity(&request)?;
    Ok(serde_json::to_value(result)?)
}
