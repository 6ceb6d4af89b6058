//! Error types for the e2e harness
//!
//! Scenario failures come in two flavours: navigation errors (the app never
//! loaded) and assertion errors (the DOM did not match). Everything else is
//! harness infrastructure going wrong.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the e2e harness
#[derive(Error, Debug)]
pub enum Error {
    // === Scenario Errors ===
    #[error("Navigation to '{url}' did not complete within {timeout:?}")]
    Navigation { url: String, timeout: Duration },

    #[error("Assertion failed for '{selector}': expected {expected}, got {actual}")]
    Assertion {
        selector: String,
        expected: String,
        actual: String,
    },

    // === Server Errors ===
    #[error("Could not reach '{url}' after {attempts} attempts. Is the app server running?")]
    ServerNotRunning { url: String, attempts: u32 },

    // === Browser Errors ===
    #[error("Failed to launch browser: {0}")]
    BrowserLaunch(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Browser session is already closed")]
    BrowserClosed,

    #[error("Script evaluation failed: {0}")]
    Script(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    #[error("Invalid scenario '{name}': {reason}")]
    InvalidScenario { name: String, reason: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // === Run Errors ===
    #[error("{0} scenario(s) failed")]
    ScenariosFailed(usize),
}

impl Error {
    /// Create an assertion error
    pub fn assertion(selector: &str, expected: impl ToString, actual: impl ToString) -> Self {
        Self::Assertion {
            selector: selector.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an invalid scenario error
    pub fn invalid_scenario(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidScenario {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Short machine-readable code, used in JSON reports
    pub fn code(&self) -> &'static str {
        match self {
            Error::Navigation { .. } => "NAVIGATION_ERROR",
            Error::Assertion { .. } => "ASSERTION_ERROR",
            Error::ServerNotRunning { .. } => "SERVER_NOT_RUNNING",
            Error::BrowserLaunch(_) | Error::Browser(_) | Error::BrowserClosed => "BROWSER_ERROR",
            Error::Script(_) => "SCRIPT_ERROR",
            Error::Config(_) | Error::ConfigParse(_) | Error::InvalidScenario { .. } => {
                "CONFIG_ERROR"
            }
            _ => "INTERNAL_ERROR",
        }
    }
}
