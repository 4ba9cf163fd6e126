//! Scenario storage
//!
//! Scenarios are Selenium IDE `.side` documents kept as plain files in a
//! single directory. Nothing is cached: every read goes back to disk and
//! re-validates, so edits made behind our back are always observed.

mod format;
mod store;

pub use format::{check_scenario, SCENARIO_EXTENSION};
pub use store::{ScenarioInfo, ScenarioStore};
