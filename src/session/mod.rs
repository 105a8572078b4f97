//! Browser session abstraction.
//!
//! Traversals only see [`BrowserSession`]; the live implementation drives a
//! headless Chromium through chromiumoxide. Element reads are captured as
//! [`ElementSnapshot`]s so that per-element failures become data instead of
//! aborting a traversal.

pub mod chromium;
#[cfg(test)]
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;

/// What a traversal needs to know about one rendered element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSnapshot {
    /// Rendered text; `None` when it could not be read.
    pub text: Option<String>,
    /// Number of star glyphs inside the element; `None` when the lookup failed.
    pub stars: Option<usize>,
}

impl ElementSnapshot {
    #[cfg(test)]
    pub fn new(text: impl Into<String>, stars: usize) -> Self {
        ElementSnapshot {
            text: Some(text.into()),
            stars: Some(stars),
        }
    }
}

/// A single exclusively owned browser tab.
#[async_trait]
pub trait BrowserSession: Send {
    /// Load `url` and wait for the navigation to finish.
    async fn navigate(&mut self, url: &str) -> Result<()>;
    /// Snapshot every element matching `selector`, counting `star_selector`
    /// matches inside each.
    async fn query(&mut self, selector: &str, star_selector: &str) -> Result<Vec<ElementSnapshot>>;
    async fn scroll_to_bottom(&mut self) -> Result<()>;
    /// Current `document.body.scrollHeight`.
    async fn document_height(&mut self) -> Result<i64>;
    /// Click the first element matching `selector` if it exists and is
    /// displayed. Returns whether a click happened.
    async fn click_if_visible(&mut self, selector: &str) -> Result<bool>;
    /// Release the browser. Called exactly once per run.
    async fn close(self: Box<Self>) -> Result<()>;
}
