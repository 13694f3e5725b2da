//! # index-config-app
//!
//! Use cases that create, verify and exercise vector index configurations.
//! This crate depends on `ports`, `domain`, and `shared`.

pub mod deps;
pub mod recreate_class;
pub mod scenario;
pub mod verify_class;

pub use deps::SchemaDeps;
pub use recreate_class::{RecreateOutcome, recreate_class};
pub use scenario::{
    PROPERTY_VECTORIZER, Scenario, ScenarioReport, ScenarioStatus, ScenarioSummary, run_scenario,
    run_scenarios, scenario_catalog, select_scenarios,
};
pub use verify_class::{ClassExpectation, VerifyOutcome, ensure_no_mismatches, verify_class};

/// Returns the app crate version.
#[must_use]
pub const fn app_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
