//! Chrome process lifecycle and the CDP-backed page
//!
//! `TestBrowser` owns the Chrome process and its throwaway profile directory;
//! `ChromePage` is one tab. Call `close()` on both when done. Dropping a
//! `TestBrowser` still kills Chrome through chromiumoxide's own Drop and
//! removes the profile, but without a graceful shutdown.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::{Page, ScreenshotParams};
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::wait::{poll_until, Outcome, WaitConfig};
use super::{js_string, PageDriver};
use crate::common::config::BrowserSettings;
use crate::common::{Error, Result};

/// Executables tried, in order, when no Chrome path is configured
const CHROME_CANDIDATES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
];

/// Interval for polling `document.readyState` during navigation
const LOAD_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Locate a Chrome executable
///
/// An explicitly configured path wins; otherwise searches PATH. `None`
/// leaves detection to chromiumoxide.
pub fn find_chrome(settings: &BrowserSettings) -> Option<PathBuf> {
    if let Some(path) = &settings.chrome_path {
        return Some(path.clone());
    }
    CHROME_CANDIDATES
        .iter()
        .find_map(|name| which::which(name).ok())
}

/// Create an empty Chrome profile directory under the system temp dir
fn profile_dir() -> Result<TempDir> {
    tempfile::Builder::new()
        .prefix("board-e2e-")
        .tempdir()
        .map_err(|e| Error::BrowserLaunch(format!("failed to create profile directory: {e}")))
}

fn to_browser_config(settings: &BrowserSettings, user_data_dir: &Path) -> Result<BrowserConfig> {
    let mut builder = BrowserConfig::builder()
        .window_size(settings.viewport_width, settings.viewport_height);

    if !settings.headless {
        builder = builder.with_head();
    }

    // A fresh profile per launch avoids ProcessSingleton lock conflicts
    builder = builder.arg(format!("--user-data-dir={}", user_data_dir.display()));

    // Required where user namespaces are unavailable (containers, CI)
    builder = builder
        .arg("--no-sandbox")
        .arg("--disable-dev-shm-usage");

    for arg in &settings.args {
        builder = builder.arg(arg.clone());
    }

    if let Some(path) = find_chrome(settings) {
        debug!(path = %path.display(), "Using Chrome executable");
        builder = builder.chrome_executable(path);
    }

    builder
        .build()
        .map_err(|e| Error::BrowserLaunch(format!("invalid browser configuration: {e}")))
}

/// A managed Chrome instance
pub struct TestBrowser {
    inner: Arc<Mutex<Option<Browser>>>,
    profile: TempDir,
}

impl TestBrowser {
    /// Spawn Chrome and connect to it over CDP
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        debug!("Launching browser with settings: {:?}", settings);

        let profile = profile_dir()?;
        let config = to_browser_config(settings, profile.path())?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::BrowserLaunch(e.to_string()))?;

        // chromiumoxide only makes progress while its handler is polled
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        debug!("Browser launched");

        Ok(Self {
            inner: Arc::new(Mutex::new(Some(browser))),
            profile,
        })
    }

    /// Chrome's `--user-data-dir` for this launch
    pub fn profile_path(&self) -> &Path {
        self.profile.path()
    }

    /// Open a new blank tab
    pub async fn new_page(&self) -> Result<ChromePage> {
        let guard = self.inner.lock().await;
        let browser = guard.as_ref().ok_or(Error::BrowserClosed)?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| Error::Browser(e.to_string()))?;

        Ok(ChromePage { inner: page })
    }

    /// Close the browser, wait for the process to exit and remove its profile
    pub async fn close(self) -> Result<()> {
        let Self { inner, profile } = self;

        let browser = inner.lock().await.take();
        if let Some(mut browser) = browser {
            debug!("Closing browser");
            browser
                .close()
                .await
                .map_err(|e| Error::Browser(e.to_string()))?;
            if let Err(e) = browser.wait().await {
                warn!("Failed to wait for browser exit: {}", e);
            }
        }

        let path = profile.path().to_path_buf();
        if let Err(e) = profile.close() {
            warn!(path = %path.display(), "Failed to remove browser profile: {}", e);
        }

        Ok(())
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.is_none()
    }
}

/// One browser tab
#[derive(Debug)]
pub struct ChromePage {
    inner: Page,
}

impl ChromePage {
    /// Evaluate a JavaScript expression and deserialize its value
    pub async fn evaluate<T>(&self, script: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let result = self
            .inner
            .evaluate(script)
            .await
            .map_err(|e| Error::Script(e.to_string()))?;

        result
            .into_value()
            .map_err(|e| Error::Script(e.to_string()))
    }

    pub async fn close(self) -> Result<()> {
        self.inner
            .close()
            .await
            .map_err(|e| Error::Browser(e.to_string()))
    }

    async fn load(&self, url: &str, deadline: Instant) -> Result<()> {
        self.inner
            .goto(url)
            .await
            .map_err(|e| Error::Browser(e.to_string()))?;

        let remaining = deadline.saturating_duration_since(Instant::now());
        let outcome = poll_until(
            || self.evaluate::<String>("document.readyState"),
            |state| state == "complete",
            WaitConfig::new(remaining, LOAD_POLL_INTERVAL),
        )
        .await;

        match outcome {
            Outcome::Satisfied(_) => Ok(()),
            Outcome::TimedOut { last, .. } => Err(Error::Browser(format!(
                "document never became ready (last readyState: {})",
                last.as_deref().unwrap_or("unknown")
            ))),
        }
    }
}

#[async_trait]
impl PageDriver for ChromePage {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        debug!(url, "Navigating");
        let deadline = Instant::now() + timeout;

        match tokio::time::timeout(timeout, self.load(url, deadline)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                warn!(url, "Navigation failed: {}", e);
                Err(Error::Navigation {
                    url: url.to_string(),
                    timeout,
                })
            }
            Err(_) => Err(Error::Navigation {
                url: url.to_string(),
                timeout,
            }),
        }
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        let script = format!(
            "document.querySelectorAll({}).length",
            js_string(selector)?
        );
        self.evaluate(&script).await
    }

    async fn texts(&self, selector: &str) -> Result<Vec<String>> {
        let script = format!(
            "Array.from(document.querySelectorAll({}), el => el.textContent || '')",
            js_string(selector)?
        );
        self.evaluate(&script).await
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.inner
            .screenshot(ScreenshotParams::default())
            .await
            .map_err(|e| Error::Browser(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_chrome_path_wins() {
        let settings = BrowserSettings {
            chrome_path: Some(PathBuf::from("/opt/chrome/chrome")),
            ..BrowserSettings::default()
        };
        assert_eq!(find_chrome(&settings), Some(PathBuf::from("/opt/chrome/chrome")));
    }

    #[test]
    fn test_profile_dir_is_removed_on_drop() {
        let profile = profile_dir().unwrap();
        let path = profile.path().to_path_buf();
        assert!(path.is_dir());
        assert!(path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("board-e2e-")));

        drop(profile);
        assert!(!path.exists());
    }

    #[tokio::test]
    #[ignore] // Requires Chrome to be installed
    async fn browser_launch_and_close() {
        let browser = TestBrowser::launch(&BrowserSettings::default())
            .await
            .expect("failed to launch browser");

        assert!(!browser.is_closed().await);
        let profile = browser.profile_path().to_path_buf();
        assert!(profile.is_dir());

        let page = browser.new_page().await.expect("failed to create page");
        page.navigate("about:blank", Duration::from_secs(10))
            .await
            .expect("failed to navigate");
        page.close().await.expect("failed to close page");

        browser.close().await.expect("failed to close browser");
        assert!(!profile.exists());
    }
}
