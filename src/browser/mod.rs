//! Browser automation
//!
//! The scenario runner only talks to a [`PageDriver`]: something that can
//! navigate, count elements matching a selector, read their text and take a
//! screenshot. [`ChromePage`] is the real implementation, driven over the
//! Chrome DevTools Protocol by chromiumoxide.

mod chrome;
mod server;
mod wait;

pub use chrome::{find_chrome, ChromePage, TestBrowser};
pub use server::{AppServer, DevServer};
pub use wait::{poll_until, Outcome, WaitConfig};

use async_trait::async_trait;
use std::time::Duration;

use crate::common::Result;

/// DOM-level operations a scenario needs from a browser tab
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Load `url` and wait until the document has finished loading
    ///
    /// Fails with `Error::Navigation` if that takes longer than `timeout`.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Number of elements currently matching `selector`
    async fn count(&self, selector: &str) -> Result<usize>;

    /// Text content of every element currently matching `selector`
    async fn texts(&self, selector: &str) -> Result<Vec<String>>;

    /// PNG screenshot of the current viewport
    async fn screenshot(&self) -> Result<Vec<u8>>;
}

/// Quote a selector as a JavaScript string literal
///
/// JSON string syntax is valid JavaScript, so this handles quotes, backticks
/// and newlines without hand-rolled escaping.
pub(crate) fn js_string(s: &str) -> Result<String> {
    Ok(serde_json::to_string(s)?)
}
