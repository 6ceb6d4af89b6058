//! Test scenario configuration types
//!
//! Defines the data structures for deserializing YAML test scenarios, plus
//! the built-in scenario that checks a freshly started game.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::common::{Error, Result};

/// A complete test scenario
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TestScenario {
    /// Name of the test scenario
    pub name: String,
    /// Optional description of what the test verifies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Steps run once before the checks, typically a `visit`
    #[serde(default)]
    pub setup: Vec<TestStep>,
    /// The sequence of checks to execute
    pub steps: Vec<TestStep>,
}

/// A single step in a scenario
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a path relative to the base URL
    Visit {
        #[serde(default = "default_path")]
        path: String,
    },
    /// Count the elements matching a selector
    AssertCount {
        selector: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        equals: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        greater_than: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        less_than: Option<usize>,
    },
    /// Check some element matching a selector contains the given text
    AssertContains { selector: String, text: String },
}

fn default_path() -> String {
    "/".to_string()
}

/// Predicate on an element count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CountExpectation {
    pub equals: Option<usize>,
    pub greater_than: Option<usize>,
    pub less_than: Option<usize>,
}

impl CountExpectation {
    pub fn is_empty(&self) -> bool {
        self.equals.is_none() && self.greater_than.is_none() && self.less_than.is_none()
    }

    /// All configured bounds hold for `count`
    pub fn matches(&self, count: usize) -> bool {
        self.equals.is_none_or(|n| count == n)
            && self.greater_than.is_none_or(|n| count > n)
            && self.less_than.is_none_or(|n| count < n)
    }
}

impl fmt::Display for CountExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(n) = self.equals {
            parts.push(n.to_string());
        }
        if let Some(n) = self.greater_than {
            parts.push(format!(">{}", n));
        }
        if let Some(n) = self.less_than {
            parts.push(format!("<{}", n));
        }
        f.write_str(&parts.join(" and "))
    }
}

impl TestStep {
    pub fn visit(path: &str) -> Self {
        Self::Visit {
            path: path.to_string(),
        }
    }

    pub fn count_equals(selector: &str, n: usize) -> Self {
        Self::AssertCount {
            selector: selector.to_string(),
            equals: Some(n),
            greater_than: None,
            less_than: None,
        }
    }

    pub fn count_greater_than(selector: &str, n: usize) -> Self {
        Self::AssertCount {
            selector: selector.to_string(),
            equals: None,
            greater_than: Some(n),
            less_than: None,
        }
    }

    pub fn contains(selector: &str, text: &str) -> Self {
        Self::AssertContains {
            selector: selector.to_string(),
            text: text.to_string(),
        }
    }

    /// Count predicate of an `assert_count` step
    pub fn count_expectation(&self) -> Option<CountExpectation> {
        match self {
            Self::AssertCount {
                equals,
                greater_than,
                less_than,
                ..
            } => Some(CountExpectation {
                equals: *equals,
                greater_than: *greater_than,
                less_than: *less_than,
            }),
            _ => None,
        }
    }

    fn validate(&self) -> std::result::Result<(), String> {
        match self {
            Self::Visit { path } if path.contains("://") => Err(format!(
                "visit path '{}' must be relative to base_url",
                path
            )),
            Self::Visit { .. } => Ok(()),
            Self::AssertCount { selector, .. } | Self::AssertContains { selector, .. }
                if selector.trim().is_empty() =>
            {
                Err("selector must not be empty".to_string())
            }
            Self::AssertCount { selector, .. } => {
                let expect = self.count_expectation().unwrap_or_default();
                if expect.is_empty() {
                    return Err(format!(
                        "assert_count on '{}' needs one of equals, greater_than or less_than",
                        selector
                    ));
                }
                let satisfiable = match (expect.equals, expect.greater_than, expect.less_than) {
                    (Some(n), _, _) => expect.matches(n),
                    (None, _, Some(0)) => false,
                    (None, Some(low), Some(high)) => high > low.saturating_add(1),
                    _ => true,
                };
                if !satisfiable {
                    return Err(format!(
                        "assert_count on '{}' can never pass: {}",
                        selector, expect
                    ));
                }
                Ok(())
            }
            Self::AssertContains { .. } => Ok(()),
        }
    }
}

impl fmt::Display for TestStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Visit { path } => write!(f, "visit {}", path),
            Self::AssertCount { selector, .. } => {
                let expect = self.count_expectation().unwrap_or_default();
                write!(f, "{} has length {}", selector, expect)
            }
            Self::AssertContains { selector, text } => {
                write!(f, "{} contains \"{}\"", selector, text)
            }
        }
    }
}

impl TestScenario {
    /// The board-and-meta check against a freshly started game
    ///
    /// Assumes a 10x20 board, a preview panel with more than three squares,
    /// a rows-completed counter starting at 0 and a level starting at 1.
    pub fn basic_app_flow() -> Self {
        Self {
            name: "basic app flow and use".to_string(),
            description: Some("has a board and meta".to_string()),
            setup: vec![TestStep::visit("/")],
            steps: vec![
                TestStep::count_equals(".square", 200),
                TestStep::count_greater_than(".upcoming-piece-square", 3),
                TestStep::contains(".rows-completed", "0"),
                TestStep::contains(".level", "1"),
            ],
        }
    }

    /// Parse and validate a scenario from YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        let scenario: Self = serde_yaml::from_str(content)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Load a scenario from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_yaml(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_scenario(&self.name, "name must not be empty"));
        }
        if self.steps.is_empty() {
            return Err(Error::invalid_scenario(&self.name, "no steps to run"));
        }
        for step in self.setup.iter().chain(&self.steps) {
            step.validate()
                .map_err(|reason| Error::invalid_scenario(&self.name, reason))?;
        }
        Ok(())
    }
}
