pub mod scenario;
#[cfg(feature = "sensitivity")]
pub mod sensitivity;

pub use scenario::{
    compare, compare_scenarios, scenario_rank_score, standard_scenarios, NamedScenario,
    ScenarioComparison, ScenarioComparisonInput, ScenarioDefinition, ScenarioOutcome,
    ScenarioOverrides,
};
