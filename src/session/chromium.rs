use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{BrowserSession, ElementSnapshot};
use crate::config::Settings;

const CHROME_BINARIES: &[&str] = &["google-chrome", "chromium", "chromium-browser"];

/// Configured path first, then the usual binaries on PATH.
pub fn find_chrome(settings: &Settings) -> Option<PathBuf> {
    if let Some(path) = settings.chrome_path.as_ref().filter(|p| p.exists()) {
        return Some(path.clone());
    }
    CHROME_BINARIES.iter().find_map(|bin| which::which(bin).ok())
}

/// One Chromium process with a single tab.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromiumSession {
    pub async fn launch(settings: &Settings) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");
        if !settings.headless {
            builder = builder.with_head();
        }
        match find_chrome(settings) {
            Some(path) => {
                info!("Using browser at {}", path.display());
                builder = builder.chrome_executable(path);
            }
            None => warn!("No browser found on PATH, relying on chromiumoxide detection"),
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to open browser tab")?;

        Ok(ChromiumSession {
            browser,
            page,
            handler,
        })
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T> {
        self.page
            .evaluate(script)
            .await
            .with_context(|| format!("Script failed: {}", script))?
            .into_value()
            .map_err(|e| anyhow::anyhow!("Unexpected script result: {:?}", e))
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Navigation to {} failed", url))?;
        self.page
            .wait_for_navigation()
            .await
            .with_context(|| format!("Page {} never finished loading", url))?;
        Ok(())
    }

    async fn query(&mut self, selector: &str, star_selector: &str) -> Result<Vec<ElementSnapshot>> {
        let elements = self
            .page
            .find_elements(selector)
            .await
            .with_context(|| format!("Query '{}' failed", selector))?;

        let mut snapshots = Vec::with_capacity(elements.len());
        for element in elements {
            let text = match element.inner_text().await {
                Ok(text) => text,
                Err(e) => {
                    debug!("Unreadable element text: {}", e);
                    None
                }
            };
            let stars = match element.find_elements(star_selector).await {
                Ok(found) => Some(found.len()),
                Err(e) => {
                    debug!("Star lookup failed: {}", e);
                    None
                }
            };
            snapshots.push(ElementSnapshot { text, stars });
        }
        Ok(snapshots)
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .context("Scroll failed")?;
        Ok(())
    }

    async fn document_height(&mut self) -> Result<i64> {
        self.eval("document.body.scrollHeight").await
    }

    async fn click_if_visible(&mut self, selector: &str) -> Result<bool> {
        let literal = serde_json::to_string(selector)?;
        let script = format!(
            "(() => {{ const el = document.querySelector({}); \
             if (!el || el.offsetParent === null) return false; \
             el.click(); return true; }})()",
            literal
        );
        self.eval(&script).await
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let ChromiumSession {
            mut browser,
            page,
            handler,
        } = *self;
        if let Err(e) = page.close().await {
            debug!("Tab close failed: {}", e);
        }
        browser.close().await.context("Failed to close browser")?;
        if let Err(e) = browser.wait().await {
            warn!("Browser did not exit cleanly: {}", e);
        }
        handler.abort();
        Ok(())
    }
}
