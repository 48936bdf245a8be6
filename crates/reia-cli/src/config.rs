use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::input;

/// Assumptions applied to `analyze` flags the user leaves unset.
///
/// Resolution order: built-in defaults, then the `--config` file (JSON or
/// YAML, partial files allowed), then `REIA_*` environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssumptionDefaults {
    pub holding_period_years: u32,
    pub exit_cap_rate: Decimal,
    pub rent_growth_rate: Decimal,
    pub expense_growth_rate: Decimal,
    pub vacancy_rate: Decimal,
    pub appreciation_rate: Decimal,
    pub loan_term_years: u32,
}

impl Default for AssumptionDefaults {
    fn default() -> Self {
        Self {
            holding_period_years: 5,
            exit_cap_rate: dec!(6.5),
            rent_growth_rate: dec!(3),
            expense_growth_rate: dec!(2.5),
            vacancy_rate: dec!(5),
            appreciation_rate: dec!(3),
            loan_term_years: 30,
        }
    }
}

impl AssumptionDefaults {
    pub fn load(path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut defaults = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        defaults.apply_env(|key| std::env::var(key).ok())?;
        debug!(?defaults, "assumption defaults resolved");
        Ok(defaults)
    }

    fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let (canonical, contents) = input::file::read_text(path)?;
        let is_yaml = canonical
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);
        let parsed = if is_yaml {
            Self::from_yaml(&contents)
        } else {
            Self::from_json(&contents)
        };
        parsed.map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e).into())
    }

    pub fn from_json(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(serde_json::from_str(contents)?)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(serde_yaml::from_str(contents)?)
    }

    /// Override fields from `REIA_*` variables, looked up through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), Box<dyn std::error::Error>>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("REIA_HOLD_PERIOD") {
            self.holding_period_years = parse_env("REIA_HOLD_PERIOD", &v)?;
        }
        if let Some(v) = lookup("REIA_LOAN_TERM_YEARS") {
            self.loan_term_years = parse_env("REIA_LOAN_TERM_YEARS", &v)?;
        }

        let rates: [(&str, &mut Decimal); 5] = [
            ("REIA_EXIT_CAP_RATE", &mut self.exit_cap_rate),
            ("REIA_RENT_GROWTH", &mut self.rent_growth_rate),
            ("REIA_EXPENSE_GROWTH", &mut self.expense_growth_rate),
            ("REIA_VACANCY_RATE", &mut self.vacancy_rate),
            ("REIA_APPRECIATION_RATE", &mut self.appreciation_rate),
        ];
        for (key, slot) in rates {
            if let Some(v) = lookup(key) {
                *slot = parse_env(key, &v)?;
            }
        }
        Ok(())
    }
}

fn parse_env<T>(key: &str, raw: &str) -> Result<T, Box<dyn std::error::Error>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| format!("{key}='{raw}' is not valid: {e}").into())
}
