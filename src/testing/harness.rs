//! Run orchestration
//!
//! Checks the app server is up, launches Chrome, runs each scenario in its
//! own tab and shuts the browser down again, whatever the outcome.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::browser::{AppServer, DevServer, TestBrowser};
use crate::common::{Config, Result};

use super::config::TestScenario;
use super::events::{EventRegistry, RuntimeEvent};
use super::report::Reporter;
use super::runner::{run_scenario, unreachable_scenario, TestResult};

/// Owns the immutable config and the listeners derived from it
#[derive(Debug)]
pub struct Harness {
    config: Arc<Config>,
    events: EventRegistry,
}

impl Harness {
    /// Validate the config and run its setup-events hook
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let events = config.event_registry();
        tracing::debug!(listeners = events.len(), "Harness configured");
        Ok(Self {
            config: Arc::new(config),
            events,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run scenarios in order, one fresh tab each
    ///
    /// Scenario failures are reported in the returned results, including an
    /// app server that never answers. An `Err` means the browser could not
    /// be driven at all.
    pub async fn run(
        &self,
        scenarios: &[TestScenario],
        reporter: &Reporter,
    ) -> Result<Vec<TestResult>> {
        self.events.emit(&RuntimeEvent::BeforeRun {
            base_url: self.config.base_url().to_string(),
            scenarios: scenarios.len(),
        });

        if let Err(e) = self.verify_server(reporter).await {
            tracing::warn!("{}", e);
            let results: Vec<_> = scenarios
                .iter()
                .map(|scenario| {
                    unreachable_scenario(&self.config, scenario, &self.events, reporter)
                })
                .collect();
            self.finish(&results);
            return Ok(results);
        }

        tracing::info!("Launching browser");
        let browser = TestBrowser::launch(&self.config.browser).await?;

        let mut results = Vec::with_capacity(scenarios.len());
        for scenario in scenarios {
            let page = match browser.new_page().await {
                Ok(page) => page,
                Err(e) => {
                    if let Err(close_err) = browser.close().await {
                        tracing::warn!("Failed to close browser: {}", close_err);
                    }
                    self.finish(&results);
                    return Err(e);
                }
            };

            let result = run_scenario(&page, &self.config, scenario, &self.events, reporter).await;

            if let Err(e) = page.close().await {
                tracing::warn!("Failed to close page: {}", e);
            }
            results.push(result);
        }

        if let Err(e) = browser.close().await {
            tracing::warn!("Failed to close browser: {}", e);
        }

        self.finish(&results);
        Ok(results)
    }

    fn finish(&self, results: &[TestResult]) {
        let passed = results.iter().filter(|r| r.passed).count();
        self.events.emit(&RuntimeEvent::AfterRun {
            passed,
            failed: results.len() - passed,
        });
    }

    async fn verify_server(&self, reporter: &Reporter) -> Result<()> {
        let server = AppServer::new(self.config.base_url());

        let spinner = (!reporter.is_json()).then(|| {
            let pb = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
                pb.set_style(style);
            }
            pb.set_message(format!("Waiting for {}", server.base_url()));
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });

        let checked = server.health_check().await;

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }
        checked
    }
}
