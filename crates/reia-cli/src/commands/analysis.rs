use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use reia_core::analysis::{self, FinancialInputs};

use crate::config::AssumptionDefaults;
use crate::input;

/// Arguments for a single-property analysis
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AnalyzeArgs {
    /// Purchase price
    #[arg(long)]
    pub purchase_price: Option<Decimal>,

    /// Year-one gross potential income
    #[arg(long)]
    pub gross_income: Option<Decimal>,

    /// Year-one operating expenses
    #[arg(long)]
    pub operating_expenses: Option<Decimal>,

    /// Vacancy and collection loss, percent (e.g. 5 for 5%)
    #[arg(long)]
    pub vacancy_rate: Option<Decimal>,

    /// Loan principal (0 for an all-cash purchase)
    #[arg(long, default_value = "0")]
    pub loan_amount: Decimal,

    /// Annual interest rate, percent
    #[arg(long, default_value = "0")]
    pub interest_rate: Decimal,

    /// Amortisation term in years
    #[arg(long)]
    pub loan_term: Option<u32>,

    /// Equity invested (defaults to purchase price less loan)
    #[arg(long)]
    pub cash_invested: Option<Decimal>,

    /// Annual property appreciation, percent
    #[arg(long)]
    pub appreciation: Option<Decimal>,

    /// Annual rent growth, percent
    #[arg(long)]
    pub rent_growth: Option<Decimal>,

    /// Annual expense growth, percent
    #[arg(long)]
    pub expense_growth: Option<Decimal>,

    /// Holding period in years
    #[arg(long)]
    pub hold_period: Option<u32>,

    /// Exit cap rate, percent
    #[arg(long)]
    pub exit_cap: Option<Decimal>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_analyze(
    args: AnalyzeArgs,
    defaults: &AssumptionDefaults,
) -> Result<Value, Box<dyn std::error::Error>> {
    let inputs: FinancialInputs = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(inputs) = input::stdin::read_stdin()? {
        inputs
    } else {
        inputs_from_flags(args, defaults)?
    };

    let result = analysis::analyze_property(&inputs)?;
    Ok(serde_json::to_value(result)?)
}

fn inputs_from_flags(
    args: AnalyzeArgs,
    defaults: &AssumptionDefaults,
) -> Result<FinancialInputs, Box<dyn std::error::Error>> {
    let purchase_price = args
        .purchase_price
        .ok_or("--purchase-price is required (or provide --input)")?;
    let cash_invested = match args.cash_invested {
        Some(cash) => cash,
        None => (purchase_price - args.loan_amount).max(Decimal::ZERO),
    };

    Ok(FinancialInputs {
        purchase_price,
        gross_income: args
            .gross_income
            .ok_or("--gross-income is required (or provide --input)")?,
        operating_expenses: args
            .operating_expenses
            .ok_or("--operating-expenses is required (or provide --input)")?,
        vacancy_rate: args.vacancy_rate.unwrap_or(defaults.vacancy_rate),
        loan_amount: args.loan_amount,
        interest_rate: args.interest_rate,
        loan_term_years: args.loan_term.unwrap_or(defaults.loan_term_years),
        cash_invested,
        appreciation_rate: args.appreciation.unwrap_or(defaults.appreciation_rate),
        rent_growth_rate: args.rent_growth.unwrap_or(defaults.rent_growth_rate),
        expense_growth_rate: args.expense_growth.unwrap_or(defaults.expense_growth_rate),
        holding_period_years: args.hold_period.unwrap_or(defaults.holding_period_years),
        exit_cap_rate: args.exit_cap.unwrap_or(defaults.exit_cap_rate),
    })
}
