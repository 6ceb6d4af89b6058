//! CLI command handling
//!
//! Loads configuration and scenarios, dispatches to the harness and formats
//! output.

use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::commands::Commands;
use crate::common::{Config, Error, Result};
use crate::testing::{Harness, Reporter, TestScenario};

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            scenarios,
            config,
            base_url,
            headed,
            verbose,
            json,
        } => {
            let mut config = Config::load(config.as_deref())?;
            if let Some(base_url) = base_url {
                config = config.with_base_url(base_url);
            }
            if headed {
                config = config.with_headless(false);
            }

            let scenarios = load_scenarios(&scenarios)?;
            let reporter = if json {
                Reporter::json()
            } else {
                Reporter::pretty(verbose)
            };

            let harness = Harness::new(config)?;
            tracing::info!(
                base_url = harness.config().base_url(),
                scenarios = scenarios.len(),
                "Starting run"
            );

            let results = harness.run(&scenarios, &reporter).await?;
            reporter.summary(&results)?;

            let failed = results.iter().filter(|r| !r.passed).count();
            if failed > 0 {
                return Err(Error::ScenariosFailed(failed));
            }
            Ok(())
        }

        Commands::Config { config, json } => {
            let config = Config::load(config.as_deref())?;
            config.validate()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                let toml = toml::to_string_pretty(&config)
                    .map_err(|e| Error::Config(format!("Failed to render config: {}", e)))?;
                print!("{}", toml);
            }
            Ok(())
        }

        Commands::List { scenarios } => {
            for scenario in load_scenarios(&scenarios)? {
                print_scenario(&scenario);
            }
            Ok(())
        }
    }
}

/// Load scenario files, or the built-in scenario when none are given
pub fn load_scenarios(paths: &[PathBuf]) -> Result<Vec<TestScenario>> {
    if paths.is_empty() {
        return Ok(vec![TestScenario::basic_app_flow()]);
    }
    paths.iter().map(|p| load_scenario(p)).collect()
}

fn load_scenario(path: &Path) -> Result<TestScenario> {
    tracing::debug!(path = %path.display(), "Loading scenario");
    TestScenario::from_file(path)
}

fn print_scenario(scenario: &TestScenario) {
    println!("{}", scenario.name.white().bold());
    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }
    for step in &scenario.setup {
        println!("  {} {}", "setup".cyan(), step);
    }
    for (i, step) in scenario.steps.iter().enumerate() {
        println!("  {:>5} {}", (i + 1).to_string().cyan(), step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_paths_gives_builtin_scenario() {
        let scenarios = load_scenarios(&[]).unwrap();
        assert_eq!(scenarios, vec![TestScenario::basic_app_flow()]);
    }

    #[test]
    fn test_missing_scenario_file() {
        let err = load_scenarios(&[PathBuf::from("/nonexistent/scenario.yml")]).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }
}
