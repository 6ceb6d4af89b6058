//! Configuration file handling
//!
//! The configuration record is built once at startup (from defaults, a TOML
//! file and CLI overrides), validated, and then shared read-only for the rest
//! of the run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use super::paths::{config_path, local_config_path};
use super::{Error, Result};
use crate::browser::WaitConfig;
use crate::testing::EventRegistry;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Record each scenario as a sequence of frames
    #[serde(default)]
    pub video: bool,

    /// Save a screenshot of the page when a scenario fails
    #[serde(default)]
    pub screenshot_on_run_failure: bool,

    /// Where failure screenshots are written
    #[serde(default = "default_screenshots_folder")]
    pub screenshots_folder: PathBuf,

    /// Where recorded frames are written
    #[serde(default = "default_videos_folder")]
    pub videos_folder: PathBuf,

    /// End-to-end testing settings
    #[serde(default)]
    pub e2e: E2eConfig,

    /// Browser launch settings
    #[serde(default)]
    pub browser: BrowserSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            video: false,
            screenshot_on_run_failure: false,
            screenshots_folder: default_screenshots_folder(),
            videos_folder: default_videos_folder(),
            e2e: E2eConfig::default(),
            browser: BrowserSettings::default(),
        }
    }
}

fn default_screenshots_folder() -> PathBuf {
    PathBuf::from("e2e/screenshots")
}
fn default_videos_folder() -> PathBuf {
    PathBuf::from("e2e/videos")
}

/// Hook used to register runtime event listeners before a run starts
#[derive(Clone)]
pub struct SetupEvents(Arc<dyn Fn(&mut EventRegistry, &Config) + Send + Sync>);

impl SetupEvents {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut EventRegistry, &Config) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invoke the hook
    pub fn call(&self, registry: &mut EventRegistry, config: &Config) {
        (self.0)(registry, config)
    }
}

impl fmt::Debug for SetupEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SetupEvents(..)")
    }
}

/// End-to-end settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct E2eConfig {
    /// Root address every `visit` is resolved against
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// How long a DOM check keeps retrying before it fails
    #[serde(default = "default_command_timeout")]
    pub default_command_timeout_ms: u64,

    /// How long a navigation may take to reach `document.readyState == "complete"`
    #[serde(default = "default_page_load_timeout")]
    pub page_load_timeout_ms: u64,

    /// Delay between retries of a DOM check
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Optional listener registration, never read from a file
    #[serde(skip)]
    pub setup_events: Option<SetupEvents>,
}

impl Default for E2eConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_command_timeout_ms: default_command_timeout(),
            page_load_timeout_ms: default_page_load_timeout(),
            poll_interval_ms: default_poll_interval(),
            setup_events: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:9500".to_string()
}
fn default_command_timeout() -> u64 {
    4_000
}
fn default_page_load_timeout() -> u64 {
    60_000
}
fn default_poll_interval() -> u64 {
    100
}

/// Browser launch settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrowserSettings {
    /// Run Chrome without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,

    /// Chrome executable (None = auto-detect)
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,

    /// Extra Chrome command-line arguments
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            chrome_path: None,
            args: Vec::new(),
        }
    }
}

fn default_headless() -> bool {
    true
}
fn default_viewport_width() -> u32 {
    1000
}
fn default_viewport_height() -> u32 {
    660
}

impl Config {
    /// Load configuration
    ///
    /// Looks at `path` if given, then `./e2e.toml`, then the per-user config
    /// file. Returns default configuration if none of them exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let local = local_config_path();
        if local.exists() {
            return Self::from_file(&local);
        }

        if let Some(path) = config_path() {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        tracing::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load and validate a specific TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "Loaded config file");
        Self::from_toml(&content)
    }

    /// Parse and validate TOML content
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the record is usable before a browser session is created
    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.e2e.base_url).map_err(|e| {
            Error::Config(format!("Invalid base_url '{}': {}", self.e2e.base_url, e))
        })?;

        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(Error::Config(format!(
                "base_url must be an absolute http(s) URL, got '{}'",
                self.e2e.base_url
            )));
        }

        if self.e2e.default_command_timeout_ms == 0 || self.e2e.page_load_timeout_ms == 0 {
            return Err(Error::Config("Timeouts must be greater than zero".to_string()));
        }

        Ok(())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.e2e.base_url = base_url.into();
        self
    }

    pub fn with_video(mut self, enabled: bool) -> Self {
        self.video = enabled;
        self
    }

    pub fn with_screenshot_on_run_failure(mut self, enabled: bool) -> Self {
        self.screenshot_on_run_failure = enabled;
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.browser.headless = headless;
        self
    }

    /// Register listeners for runtime events
    pub fn with_setup_events<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut EventRegistry, &Config) + Send + Sync + 'static,
    {
        self.e2e.setup_events = Some(SetupEvents::new(f));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.e2e.base_url
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.e2e.default_command_timeout_ms)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.e2e.page_load_timeout_ms)
    }

    /// Wait settings used by DOM checks
    pub fn wait_config(&self) -> WaitConfig {
        WaitConfig::new(
            self.command_timeout(),
            Duration::from_millis(self.e2e.poll_interval_ms.max(1)),
        )
    }

    /// Build the listener registry, running the setup hook if there is one
    pub fn event_registry(&self) -> EventRegistry {
        let mut registry = EventRegistry::new();
        if let Some(hook) = &self.e2e.setup_events {
            hook.call(&mut registry, self);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_defaults_match_project_config() {
        let config = Config::default();
        assert_eq!(config.base_url(), "http://localhost:9500");
        assert!(!config.video);
        assert!(!config.screenshot_on_run_failure);
        assert!(config.e2e.setup_events.is_none());
        assert_eq!(config.command_timeout(), Duration::from_secs(4));
        assert_eq!(config.page_load_timeout(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let config = Config::from_toml(
            r#"
            video = true
            screenshot_on_run_failure = true

            [e2e]
            base_url = "http://127.0.0.1:8080"
            default_command_timeout_ms = 1500

            [browser]
            headless = false
            args = ["--mute-audio"]
            "#,
        )
        .unwrap();

        assert!(config.video);
        assert!(config.screenshot_on_run_failure);
        assert_eq!(config.base_url(), "http://127.0.0.1:8080");
        assert_eq!(config.command_timeout(), Duration::from_millis(1500));
        assert_eq!(config.page_load_timeout(), Duration::from_secs(60));
        assert!(!config.browser.headless);
        assert_eq!(config.browser.args, vec!["--mute-audio".to_string()]);
        assert_eq!(config.browser.viewport_width, 1000);
    }

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.base_url(), "http://localhost:9500");
        assert_eq!(config.screenshots_folder, PathBuf::from("e2e/screenshots"));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = Config::from_toml("video = maybe").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        for bad in ["localhost:9500", "ftp://example.com", "not a url", "file:///tmp/x"] {
            let config = Config::default().with_base_url(bad);
            assert!(
                matches!(config.validate(), Err(Error::Config(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = Config::from_toml("[e2e]\ndefault_command_timeout_ms = 0").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = Config::load(Some(Path::new("/nonexistent/e2e.toml"))).unwrap_err();
        assert!(matches!(err, Error::FileRead { .. }));
    }

    #[test]
    fn test_load_explicit_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("e2e.toml");
        std::fs::write(&path, "[e2e]\nbase_url = \"http://localhost:3000\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.base_url(), "http://localhost:3000");
    }

    #[test]
    fn test_setup_events_hook_runs_once_per_registry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let config = Config::default().with_setup_events(move |_on, config| {
            assert_eq!(config.base_url(), "http://localhost:9500");
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let _registry = config.event_registry();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_without_hook_registry_is_empty() {
        let registry = Config::default().event_registry();
        assert!(registry.is_empty());
    }
}
