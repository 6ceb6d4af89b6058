//! Test runner implementation
//!
//! Executes a scenario against a [`PageDriver`]: setup steps first, then the
//! checks in order. The first failing step ends the scenario; the remaining
//! steps are not run.

use std::path::{Path, PathBuf};

use crate::browser::{poll_until, AppServer, DevServer, Outcome, PageDriver};
use crate::common::paths::{ensure_parent_dir, failure_screenshot_path, frame_path, slugify};
use crate::common::{Config, Error, Result};

use super::config::{TestScenario, TestStep};
use super::events::{EventRegistry, RuntimeEvent};
use super::report::Reporter;

/// Result of a test run
#[derive(Debug)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    /// Checks attempted, including the one that failed
    pub steps_run: usize,
    pub steps_total: usize,
    /// First error; `None` when the scenario passed
    pub error: Option<Error>,
    /// Failure screenshot, when enabled and captured
    pub screenshot: Option<PathBuf>,
    /// Recorded frames, when video is enabled
    pub frames: Vec<PathBuf>,
}

/// Run one scenario on an already opened page
pub async fn run_scenario(
    page: &dyn PageDriver,
    config: &Config,
    scenario: &TestScenario,
    events: &EventRegistry,
    reporter: &Reporter,
) -> TestResult {
    let steps_total = scenario.steps.len();
    let mut recorder = config
        .video
        .then(|| FrameRecorder::new(&config.videos_folder, &scenario.name));

    reporter.scenario_started(scenario);
    events.emit(&RuntimeEvent::BeforeScenario {
        name: scenario.name.clone(),
    });

    let mut result = TestResult {
        name: scenario.name.clone(),
        passed: false,
        steps_run: 0,
        steps_total,
        error: None,
        screenshot: None,
        frames: Vec::new(),
    };

    if let Err(e) = run_steps(page, config, scenario, events, reporter, &mut recorder, &mut result)
        .await
    {
        tracing::info!(scenario = %scenario.name, "Scenario failed: {}", e);
        if config.screenshot_on_run_failure {
            let path = failure_screenshot_path(&config.screenshots_folder, &scenario.name);
            match save_screenshot(page, &path).await {
                Ok(()) => {
                    reporter.artifact("Screenshot:", &path);
                    result.screenshot = Some(path);
                }
                Err(err) => tracing::warn!("Failed to capture failure screenshot: {}", err),
            }
        }
        result.error = Some(e);
    } else {
        result.passed = true;
    }

    if let Some(recorder) = recorder {
        result.frames = recorder.frames;
    }

    reporter.scenario_finished(&result);
    events.emit(&RuntimeEvent::AfterScenario {
        name: scenario.name.clone(),
        passed: result.passed,
    });

    result
}

/// Fail a scenario without opening a page because the app never answered
///
/// Reported as a navigation failure of its setup `visit`.
pub fn unreachable_scenario(
    config: &Config,
    scenario: &TestScenario,
    events: &EventRegistry,
    reporter: &Reporter,
) -> TestResult {
    reporter.scenario_started(scenario);
    events.emit(&RuntimeEvent::BeforeScenario {
        name: scenario.name.clone(),
    });

    let visit = scenario.setup.iter().find_map(|step| match step {
        TestStep::Visit { path } => Some((step, AppServer::new(config.base_url()).url(path))),
        _ => None,
    });
    let url = visit
        .as_ref()
        .map(|(_, url)| url.clone())
        .unwrap_or_else(|| config.base_url().to_string());
    let error = Error::Navigation {
        url,
        timeout: config.page_load_timeout(),
    };

    reporter.section("Setup:");
    let label = visit.map(|(step, _)| step.to_string());
    reporter.step_failed(label.as_deref().unwrap_or("visit"), &error.to_string());

    let result = TestResult {
        name: scenario.name.clone(),
        passed: false,
        steps_run: 0,
        steps_total: scenario.steps.len(),
        error: Some(error),
        screenshot: None,
        frames: Vec::new(),
    };

    reporter.scenario_finished(&result);
    events.emit(&RuntimeEvent::AfterScenario {
        name: scenario.name.clone(),
        passed: false,
    });

    result
}

async fn run_steps(
    page: &dyn PageDriver,
    config: &Config,
    scenario: &TestScenario,
    events: &EventRegistry,
    reporter: &Reporter,
    recorder: &mut Option<FrameRecorder>,
    result: &mut TestResult,
) -> Result<()> {
    if !scenario.setup.is_empty() {
        reporter.section("Setup:");
        for step in &scenario.setup {
            let label = step.to_string();
            match execute_step(page, config, step).await {
                Ok(detail) => reporter.step_passed(&label, Some(detail.as_str())),
                Err(e) => {
                    reporter.step_failed(&label, &e.to_string());
                    return Err(e);
                }
            }
        }
        if let Some(recorder) = recorder {
            recorder.capture(page).await;
        }
    }

    reporter.section("Steps:");
    for (i, step) in scenario.steps.iter().enumerate() {
        let step_num = i + 1;
        let label = format!("Step {}: {}", step_num, step);
        result.steps_run = step_num;

        let outcome = execute_step(page, config, step).await;

        if let Some(recorder) = recorder {
            recorder.capture(page).await;
        }

        events.emit(&RuntimeEvent::AfterStep {
            scenario: scenario.name.clone(),
            step: step_num,
            description: step.to_string(),
            passed: outcome.is_ok(),
        });

        match outcome {
            Ok(detail) => reporter.step_passed(&label, Some(detail.as_str())),
            Err(e) => {
                reporter.step_failed(&label, &e.to_string());
                return Err(e);
            }
        }
    }

    Ok(())
}

/// Execute a single step, returning a short description of what was observed
async fn execute_step(page: &dyn PageDriver, config: &Config, step: &TestStep) -> Result<String> {
    match step {
        TestStep::Visit { path } => {
            let url = AppServer::new(config.base_url()).url(path);
            page.navigate(&url, config.page_load_timeout()).await?;
            Ok(format!("loaded {}", url))
        }
        TestStep::AssertCount { selector, .. } => {
            let expect = step.count_expectation().unwrap_or_default();
            let outcome = poll_until(
                || page.count(selector),
                |n| expect.matches(*n),
                config.wait_config(),
            )
            .await;

            match outcome {
                Outcome::Satisfied(n) => Ok(format!("found {} element(s)", n)),
                Outcome::TimedOut {
                    last: Some(n), ..
                } => Err(Error::assertion(selector, expect, n)),
                Outcome::TimedOut {
                    last_error: Some(e),
                    ..
                } => Err(Error::assertion(selector, expect, format!("query failed: {e}"))),
                Outcome::TimedOut { .. } => {
                    Err(Error::assertion(selector, expect, "no result"))
                }
            }
        }
        TestStep::AssertContains { selector, text } => {
            let outcome = poll_until(
                || page.texts(selector),
                |texts| texts.iter().any(|t| t.contains(text.as_str())),
                config.wait_config(),
            )
            .await;

            let expected = format!("contains \"{}\"", text);
            match outcome {
                Outcome::Satisfied(texts) => Ok(format!("text: {}", describe_texts(&texts))),
                Outcome::TimedOut {
                    last: Some(texts), ..
                } => Err(Error::assertion(selector, expected, describe_texts(&texts))),
                Outcome::TimedOut {
                    last_error: Some(e),
                    ..
                } => Err(Error::assertion(selector, expected, format!("query failed: {e}"))),
                Outcome::TimedOut { .. } => {
                    Err(Error::assertion(selector, expected, "no result"))
                }
            }
        }
    }
}

fn describe_texts(texts: &[String]) -> String {
    if texts.is_empty() {
        return "no elements matched".to_string();
    }
    texts
        .iter()
        .map(|t| format!("\"{}\"", t.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

async fn save_screenshot(page: &dyn PageDriver, path: &Path) -> Result<()> {
    let png = page.screenshot().await?;
    ensure_parent_dir(path)?;
    tokio::fs::write(path, png).await?;
    Ok(())
}

/// Records a scenario as numbered PNG frames
struct FrameRecorder {
    folder: PathBuf,
    scenario: String,
    frames: Vec<PathBuf>,
}

impl FrameRecorder {
    /// Frames from a previous run of the same scenario are removed
    fn new(folder: &Path, scenario: &str) -> Self {
        let dir = folder.join(slugify(scenario));
        if dir.exists() {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                tracing::warn!(dir = %dir.display(), "Could not clear old frames: {}", e);
            }
        }
        Self {
            folder: folder.to_path_buf(),
            scenario: scenario.to_string(),
            frames: Vec::new(),
        }
    }

    async fn capture(&mut self, page: &dyn PageDriver) {
        let path = frame_path(&self.folder, &self.scenario, self.frames.len());
        match save_screenshot(page, &path).await {
            Ok(()) => self.frames.push(path),
            Err(e) => tracing::warn!("Failed to record frame: {}", e),
        }
    }
}
