use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "scraper";
const ENV_PREFIX: &str = "SCRAPER";

/// Effective run settings: defaults, then `scraper.toml`, then `SCRAPER_*` env.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub output_dir: PathBuf,
    /// Reviews dated before this year end the review traversal.
    pub stale_cutoff_year: i32,
    pub max_pages: u32,
    pub max_clicks: u32,
    pub max_scrolls: u32,
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
    pub pacing: Pacing,
    pub selectors: Selectors,
    pub name_stoplist: Vec<String>,
    pub exclusion_phrases: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_url: "https://web-scraping.dev".into(),
            output_dir: PathBuf::from("scraped_data"),
            stale_cutoff_year: 2023,
            max_pages: 10,
            max_clicks: 15,
            max_scrolls: 10,
            headless: true,
            chrome_path: None,
            pacing: Pacing::default(),
            selectors: Selectors::default(),
            name_stoplist: vec!["log in".into(), "sign up".into(), "products".into()],
            exclusion_phrases: vec!["take a look".into(), "collection".into(), "navigation".into()],
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("name_stoplist")
                    .with_list_parse_key("exclusion_phrases")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read scraper settings")?;
        settings
            .try_deserialize()
            .context("Invalid scraper settings")
    }

    /// Defaults pointed at `base_url` with every delay zeroed.
    #[cfg(test)]
    pub fn for_tests(base_url: &str) -> Self {
        Settings {
            base_url: base_url.into(),
            pacing: Pacing::none(),
            ..Settings::default()
        }
    }

    /// Absolute URL for a site path such as `/reviews`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// Delays between traversal steps, in milliseconds. These throttle requests to
/// the site and give lazily loaded content time to render.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Pacing {
    pub page_load_ms: u64,
    pub initial_settle_ms: u64,
    pub scroll_ms: u64,
    pub click_ms: u64,
    pub scroll_load_ms: u64,
}

impl Default for Pacing {
    fn default() -> Self {
        Pacing {
            page_load_ms: 2000,
            initial_settle_ms: 3000,
            scroll_ms: 1000,
            click_ms: 2000,
            scroll_load_ms: 2000,
        }
    }
}

impl Pacing {
    /// All delays zeroed; used by tests.
    #[cfg(test)]
    pub fn none() -> Self {
        Pacing {
            page_load_ms: 0,
            initial_settle_ms: 0,
            scroll_ms: 0,
            click_ms: 0,
            scroll_load_ms: 0,
        }
    }
}

/// Waits for `ms` milliseconds.
pub async fn pause(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// CSS markers the site is expected to keep stable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub product: String,
    pub review: String,
    pub testimonial: String,
    pub star: String,
    pub load_more: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Selectors {
            product: "div[class*='product']".into(),
            review: ".review".into(),
            testimonial: "div[class*='testimonial']".into(),
            star: "path[fill='#ffce31']".into(),
            load_more: "#page-load-more".into(),
        }
    }
}

// ── Tests ──
