//! Console and JSON reporting of scenario progress

use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

use super::config::TestScenario;
use super::runner::TestResult;
use crate::common::Result;

/// Where progress goes: colored lines on stdout, or one JSON document at the end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reporter {
    json: bool,
    verbose: bool,
}

impl Reporter {
    pub fn pretty(verbose: bool) -> Self {
        Self {
            json: false,
            verbose,
        }
    }

    pub fn json() -> Self {
        Self {
            json: true,
            verbose: false,
        }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    pub fn scenario_started(&self, scenario: &TestScenario) {
        if self.json {
            return;
        }
        println!(
            "\n{} {}",
            "Running Test:".blue().bold(),
            scenario.name.white().bold()
        );
        if let Some(desc) = &scenario.description {
            println!("  {}", desc.dimmed());
        }
    }

    pub fn section(&self, title: &str) {
        if !self.json {
            println!("\n{}", title.cyan());
        }
    }

    pub fn step_passed(&self, label: &str, detail: Option<&str>) {
        if self.json {
            return;
        }
        println!("  {} {}", "✓".green(), label.dimmed());
        if let (true, Some(detail)) = (self.verbose, detail) {
            println!("      {}", detail.dimmed());
        }
    }

    pub fn step_failed(&self, label: &str, reason: &str) {
        if !self.json {
            println!("  {} {}: {}", "✗".red(), label, reason);
        }
    }

    pub fn artifact(&self, kind: &str, path: &std::path::Path) {
        if !self.json {
            println!("  {} {}", kind.yellow(), path.display());
        }
    }

    pub fn scenario_finished(&self, result: &TestResult) {
        if self.json {
            return;
        }
        if result.passed {
            println!("\n{} {}", "✓".green().bold(), "Test Passed".green().bold());
        } else {
            println!(
                "\n{} {} ({}/{} steps run)",
                "✗".red().bold(),
                "Test Failed".red().bold(),
                result.steps_run,
                result.steps_total
            );
        }
    }

    /// Print the final summary; in JSON mode this is the whole output
    pub fn summary(&self, results: &[TestResult]) -> Result<()> {
        let passed = results.iter().filter(|r| r.passed).count();
        let failed = results.len() - passed;

        if self.json {
            let report = RunReport {
                passed,
                failed,
                scenarios: results.iter().map(TestReport::from).collect(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
            return Ok(());
        }

        println!("\n{}", "Summary:".cyan());
        for result in results {
            let mark = if result.passed {
                "✓".green()
            } else {
                "✗".red()
            };
            println!("  {} {}", mark, result.name);
        }
        let line = format!("{} passed, {} failed", passed, failed);
        if failed == 0 {
            println!("\n{}\n", line.green().bold());
        } else {
            println!("\n{}\n", line.red().bold());
        }
        Ok(())
    }
}

/// Serializable outcome of a whole run
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub passed: usize,
    pub failed: usize,
    pub scenarios: Vec<TestReport>,
}

/// Serializable outcome of one scenario
#[derive(Debug, Serialize)]
pub struct TestReport {
    pub name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub steps_total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<PathBuf>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub code: String,
    pub message: String,
}

impl From<&TestResult> for TestReport {
    fn from(result: &TestResult) -> Self {
        Self {
            name: result.name.clone(),
            passed: result.passed,
            steps_run: result.steps_run,
            steps_total: result.steps_total,
            error: result.error.as_ref().map(|e| ErrorReport {
                code: e.code().to_string(),
                message: e.to_string(),
            }),
            screenshot: result.screenshot.clone(),
            frames: result.frames.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;

    #[test]
    fn test_report_from_failed_result() {
        let result = TestResult {
            name: "basic app flow and use".to_string(),
            passed: false,
            steps_run: 1,
            steps_total: 4,
            error: Some(Error::assertion(".square", 200, 199)),
            screenshot: Some(PathBuf::from("e2e/screenshots/x.png")),
            frames: Vec::new(),
        };

        let json = serde_json::to_value(TestReport::from(&result)).unwrap();
        assert_eq!(json["passed"], false);
        assert_eq!(json["error"]["code"], "ASSERTION_ERROR");
        assert_eq!(json["screenshot"], "e2e/screenshots/x.png");
        assert!(json.get("frames").is_none());
    }
}
