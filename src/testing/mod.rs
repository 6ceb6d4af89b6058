//! E2E Test Runner
//!
//! Runs scenarios (built in or loaded from YAML) against the app in a real
//! browser. Assertions are made on structured DOM queries (element counts and
//! text content) rather than on screenshots.

mod config;
mod events;
mod harness;
mod report;
mod runner;

pub use config::*;
pub use events::{EventRegistry, RuntimeEvent};
pub use harness::Harness;
pub use report::{Reporter, RunReport, TestReport};
pub use runner::{run_scenario, TestResult};
