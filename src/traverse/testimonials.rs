use anyhow::Result;
use tracing::info;

use super::{harvest, Step, StopReason, Tally};
use crate::config::pause;
use crate::context::RunContext;
use crate::records::Testimonial;
use crate::session::BrowserSession;

/// Scrolls `/testimonials` until the document height stops growing. Element
/// counts are unreliable on a virtualized list, height is not.
#[derive(Debug, Default)]
pub struct TestimonialScroller {
    last_height: i64,
    scrolls: u32,
}

impl TestimonialScroller {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn open(&mut self, session: &mut dyn BrowserSession, ctx: &RunContext) -> Result<()> {
        session.navigate(&ctx.settings.url("testimonials")).await?;
        pause(ctx.settings.pacing.initial_settle_ms).await;
        Ok(())
    }

    pub async fn step(
        &mut self,
        session: &mut dyn BrowserSession,
        ctx: &mut RunContext,
        tally: &mut Tally,
    ) -> Result<Step> {
        if self.scrolls >= ctx.settings.max_scrolls {
            return Ok(Step::Stop(StopReason::ScrollCap));
        }

        session.scroll_to_bottom().await?;
        pause(ctx.settings.pacing.scroll_load_ms).await;
        let height = session.document_height().await?;

        let selector = ctx.settings.selectors.testimonial.clone();
        let h = harvest::<Testimonial>(session, ctx, tally, &selector).await?;
        if h.admitted > 0 {
            info!(
                "testimonials: scroll {} +{} | total {}",
                self.scrolls + 1,
                h.admitted,
                ctx.testimonials().len()
            );
        }

        if height == self.last_height {
            return Ok(Step::Stop(StopReason::Plateau));
        }
        self.last_height = height;
        self.scrolls += 1;
        Ok(Step::Continue)
    }
}

// ── Tests ──
