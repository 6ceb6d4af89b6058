//! Board E2E - browser checks for a falling-block puzzle web app
//!
//! Loads a configuration, opens the app in headless Chrome and asserts on the
//! rendered DOM: board size, upcoming-piece preview, rows-completed counter
//! and level indicator.

pub mod browser;
pub mod cli;
pub mod commands;
pub mod common;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Config, Error, Result};
pub use testing::{Harness, TestScenario, TestStep};
