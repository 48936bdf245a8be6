pub mod amortization;
pub mod engine;
pub mod inputs;
pub mod metrics;
pub mod projection;
pub mod viability;

pub use engine::{
    analyze, analyze_property, analyze_with_terminal, evaluate, terminal_value, validate_inputs,
    AnalysisResult, Evaluation, TerminalValue,
};
pub use inputs::FinancialInputs;
pub use projection::{project, summarize, FinancialProjection, ProjectionSummary};
pub use viability::{score, ViabilityBreakdown, ViabilityRating, ViabilityScore};
