pub mod analysis;
pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "scenarios")]
pub mod scenarios;

pub use analysis::{analyze, analyze_property, AnalysisResult, FinancialInputs};
pub use error::ReiaError;
pub use types::*;

/// Standard result type for the validated entry points
pub type ReiaResult<T> = Result<T, ReiaError>;
