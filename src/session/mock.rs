//! Scripted in-memory session for traversal and engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::{BrowserSession, ElementSnapshot};

const ROW_HEIGHT: i64 = 100;

/// Content of one URL. Elements are revealed in batches: the first batch on
/// load, the next one per load-more click (`load_more = true`) or per scroll
/// (`load_more = false`). Revealed batches stay in the DOM.
#[derive(Debug, Clone, Default)]
pub struct MockPage {
    batches: Vec<Vec<ElementSnapshot>>,
    revealed: usize,
    load_more: bool,
    fail_query: bool,
    fail_click: bool,
}

impl MockPage {
    pub fn single(elements: Vec<ElementSnapshot>) -> Self {
        MockPage {
            batches: vec![elements],
            ..Default::default()
        }
    }

    pub fn with_load_more(batches: Vec<Vec<ElementSnapshot>>) -> Self {
        MockPage {
            batches,
            load_more: true,
            ..Default::default()
        }
    }

    pub fn infinite(batches: Vec<Vec<ElementSnapshot>>) -> Self {
        MockPage {
            batches,
            ..Default::default()
        }
    }

    pub fn failing_query() -> Self {
        MockPage {
            fail_query: true,
            ..Default::default()
        }
    }

    /// Looking up the load-more control errors.
    pub fn failing_click(mut self) -> Self {
        self.fail_click = true;
        self
    }

    fn visible(&self) -> Vec<ElementSnapshot> {
        self.batches
            .iter()
            .take(self.revealed + 1)
            .flatten()
            .cloned()
            .collect()
    }

    fn has_more(&self) -> bool {
        self.revealed + 1 < self.batches.len()
    }
}

/// Everything the mock observed, shared with the test after the session is
/// moved into the code under test.
#[derive(Debug, Default)]
pub struct MockLog {
    pub navigations: Mutex<Vec<String>>,
    pub scrolls: AtomicUsize,
    pub clicks: AtomicUsize,
    pub closes: AtomicUsize,
}

impl MockLog {
    pub fn navigations(&self) -> Vec<String> {
        self.navigations.lock().unwrap().clone()
    }
}

#[derive(Debug, Default)]
pub struct MockSession {
    pages: HashMap<String, MockPage>,
    broken: HashSet<String>,
    current: Option<String>,
    panic_at: Option<String>,
    pub log: Arc<MockLog>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, page: MockPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    /// Navigating to `url` returns an error.
    pub fn broken(mut self, url: &str) -> Self {
        self.broken.insert(url.to_string());
        self
    }

    /// Querying while on `url` panics.
    pub fn panic_at(mut self, url: &str) -> Self {
        self.panic_at = Some(url.to_string());
        self
    }

    pub fn log(&self) -> Arc<MockLog> {
        Arc::clone(&self.log)
    }

    fn current_page(&mut self) -> Option<&mut MockPage> {
        let url = self.current.as_ref()?;
        self.pages.get_mut(url)
    }
}

#[async_trait]
impl BrowserSession for MockSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.log.navigations.lock().unwrap().push(url.to_string());
        if self.broken.contains(url) {
            bail!("connection reset while loading {}", url);
        }
        if let Some(page) = self.pages.get_mut(url) {
            page.revealed = 0;
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    async fn query(&mut self, _selector: &str, _star_selector: &str) -> Result<Vec<ElementSnapshot>> {
        if self.current.is_some() && self.current == self.panic_at {
            panic!("renderer crashed");
        }
        match self.current_page() {
            Some(page) if page.fail_query => bail!("session disconnected"),
            Some(page) => Ok(page.visible()),
            None => Ok(Vec::new()),
        }
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.log.scrolls.fetch_add(1, Ordering::SeqCst);
        if let Some(page) = self.current_page() {
            if !page.load_more && page.has_more() {
                page.revealed += 1;
            }
        }
        Ok(())
    }

    async fn document_height(&mut self) -> Result<i64> {
        let rows = self.current_page().map_or(0, |p| p.visible().len());
        Ok(rows as i64 * ROW_HEIGHT)
    }

    async fn click_if_visible(&mut self, _selector: &str) -> Result<bool> {
        let log = Arc::clone(&self.log);
        match self.current_page() {
            Some(page) if page.fail_click => bail!("load-more lookup failed"),
            Some(page) if page.load_more && page.has_more() => {
                page.revealed += 1;
                log.clicks.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn close(self: Box<Self>) -> Result<()> {
        self.log.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
