use anyhow::Result;
use tracing::info;

use super::{harvest, Step, StopReason, Tally};
use crate::config::pause;
use crate::context::RunContext;
use crate::records::Product;
use crate::session::BrowserSession;

/// Walks `/products?page=N` until the page cap, an empty page, or a page
/// that adds nothing new.
#[derive(Debug)]
pub struct ProductPager {
    page: u32,
}

impl Default for ProductPager {
    fn default() -> Self {
        ProductPager { page: 1 }
    }
}

impl ProductPager {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn step(
        &mut self,
        session: &mut dyn BrowserSession,
        ctx: &mut RunContext,
        tally: &mut Tally,
    ) -> Result<Step> {
        if self.page > ctx.settings.max_pages {
            return Ok(Step::Stop(StopReason::PageCap));
        }

        let url = ctx.settings.url(&format!("products?page={}", self.page));
        session.navigate(&url).await?;
        pause(ctx.settings.pacing.page_load_ms).await;

        let selector = ctx.settings.selectors.product.clone();
        let h = harvest::<Product>(session, ctx, tally, &selector).await?;
        if h.found == 0 {
            info!("products: page {} is empty", self.page);
            return Ok(Step::Stop(StopReason::Exhausted));
        }

        info!(
            "products: page {} +{} | total {}",
            self.page,
            h.admitted,
            ctx.products().len()
        );
        if h.admitted == 0 {
            return Ok(Step::Stop(StopReason::NoNewContent));
        }

        self.page += 1;
        Ok(Step::Continue)
    }
}

// ── Tests ──
