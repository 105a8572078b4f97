use anyhow::Result;
use tracing::{info, warn};

use super::{harvest, Step, StopReason, Tally};
use crate::config::pause;
use crate::context::RunContext;
use crate::records::Review;
use crate::session::BrowserSession;

/// Reads `/reviews`, pressing "load more" between passes. Reviews render
/// newest first, so the first review older than the cutoff ends the whole
/// traversal; anything after it is assumed stale too.
#[derive(Debug, Default)]
pub struct ReviewLoader {
    clicks: u32,
}

impl ReviewLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn open(&mut self, session: &mut dyn BrowserSession, ctx: &RunContext) -> Result<()> {
        session.navigate(&ctx.settings.url("reviews")).await?;
        pause(ctx.settings.pacing.initial_settle_ms).await;
        Ok(())
    }

    pub async fn step(
        &mut self,
        session: &mut dyn BrowserSession,
        ctx: &mut RunContext,
        tally: &mut Tally,
    ) -> Result<Step> {
        if self.clicks >= ctx.settings.max_clicks {
            return Ok(Step::Stop(StopReason::ClickCap));
        }

        // Loaded reviews stay in the DOM, so every pass sees all of them again.
        let selector = ctx.settings.selectors.review.clone();
        let h = harvest::<Review>(session, ctx, tally, &selector).await?;
        if h.admitted > 0 {
            info!("reviews: +{} | total {}", h.admitted, ctx.reviews().len());
        }
        if let Some(year) = h.stale {
            info!("reviews: found review from {}, stopping", year);
            return Ok(Step::Stop(StopReason::Stale { year }));
        }

        session.scroll_to_bottom().await?;
        pause(ctx.settings.pacing.scroll_ms).await;

        let load_more = ctx.settings.selectors.load_more.clone();
        match session.click_if_visible(&load_more).await {
            Ok(true) => {
                self.clicks += 1;
                pause(ctx.settings.pacing.click_ms).await;
                Ok(Step::Continue)
            }
            Ok(false) => Ok(Step::Stop(StopReason::Exhausted)),
            Err(e) => {
                warn!("reviews: load more unavailable: {:#}", e);
                Ok(Step::Stop(StopReason::Exhausted))
            }
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use crate::config::Settings;
    use crate::context::RunContext;
    use crate::records::Entity;
    use crate::session::mock::{MockPage, MockSession};
    use crate::session::ElementSnapshot;
    use crate::traverse::{PhaseOutcome, StopReason, Traversal};

    const BASE: &str = "https://shop.test";
    const REVIEWS: &str = "https://shop.test/reviews";

    fn review(date: &str, body: &str, stars: usize) -> ElementSnapshot {
        ElementSnapshot::new(format!("{}\n{}", date, body), stars)
    }

    async fn run(session: &mut MockSession, settings: Settings) -> (RunContext, PhaseOutcome) {
        let mut ctx = RunContext::new(settings);
        let report = Traversal::for_entity(Entity::Review).run(session, &mut ctx).await;
        (ctx, report.outcome)
    }

    #[tokio::test]
    async fn stops_before_record_older_than_cutoff() {
        let mut session = MockSession::new().page(
            REVIEWS,
            MockPage::with_load_more(vec![
                vec![review("2024-03-02", "Brilliant energy potion, tastes great", 5)],
                vec![review("2023-11-20", "Good value for the price, will reorder", 4)],
                vec![review("2022-01-15", "Used to be better a few years back", 2)],
                vec![review("2024-05-05", "Out of order newer review after stale", 5)],
            ]),
        );
        let log = session.log();

        let (ctx, outcome) = run(&mut session, Settings::for_tests(BASE)).await;

        assert_eq!(outcome, PhaseOutcome::Finished(StopReason::Stale { year: 2022 }));
        let dates: Vec<&str> = ctx.reviews().iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, ["2024-03-02", "2023-11-20"]);
        // Two clicks revealed the stale batch; no further load was attempted.
        assert_eq!(log.clicks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cumulative_dom_does_not_duplicate() {
        let mut session = MockSession::new().page(
            REVIEWS,
            MockPage::with_load_more(vec![
                vec![
                    review("2024-01-01", "First batch review number one here", 5),
                    review("2024-01-02", "First batch review number two here", 3),
                ],
                vec![review("2024-01-03", "Second batch review appears later", 4)],
            ]),
        );

        let (ctx, outcome) = run(&mut session, Settings::for_tests(BASE)).await;

        assert_eq!(outcome, PhaseOutcome::Finished(StopReason::Exhausted));
        assert_eq!(ctx.reviews().len(), 3);
        assert_eq!(ctx.reviews()[1].rating, 3);
    }

    #[tokio::test]
    async fn undated_reviews_are_dropped() {
        let mut session = MockSession::new().page(
            REVIEWS,
            MockPage::single(vec![
                ElementSnapshot::new("Anonymous\nNo date on this review whatsoever", 5),
                review("2023-07-07", "Dated review that should be kept", 5),
            ]),
        );

        let (ctx, _) = run(&mut session, Settings::for_tests(BASE)).await;

        assert_eq!(ctx.reviews().len(), 1);
        assert_eq!(ctx.reviews()[0].date, "2023-07-07");
    }

    #[tokio::test]
    async fn click_cap_limits_loads() {
        let batches = (0..30)
            .map(|i| vec![review("2024-02-02", &format!("Endless review stream entry {}", i), 5)])
            .collect();
        let mut session = MockSession::new().page(REVIEWS, MockPage::with_load_more(batches));
        let log = session.log();
        let mut settings = Settings::for_tests(BASE);
        settings.max_clicks = 3;

        let (ctx, outcome) = run(&mut session, settings).await;

        assert_eq!(outcome, PhaseOutcome::Finished(StopReason::ClickCap));
        assert_eq!(log.clicks.load(Ordering::SeqCst), 3);
        assert_eq!(ctx.reviews().len(), 3);
    }

    #[tokio::test]
    async fn load_more_error_ends_phase_as_exhausted() {
        let mut session = MockSession::new().page(
            REVIEWS,
            MockPage::with_load_more(vec![
                vec![review("2024-04-04", "Reviews shown before the button broke", 4)],
                vec![review("2024-04-03", "Never revealed because the click failed", 5)],
            ])
            .failing_click(),
        );
        let log = session.log();

        let (ctx, outcome) = run(&mut session, Settings::for_tests(BASE)).await;

        assert_eq!(outcome, PhaseOutcome::Finished(StopReason::Exhausted));
        assert_eq!(ctx.reviews().len(), 1);
        assert_eq!(log.clicks.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fixture_reviews_respect_cutoff() {
        let raw = std::fs::read_to_string("tests/fixtures/reviews.json").unwrap();
        let fixture: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
        let elements: Vec<ElementSnapshot> = fixture
            .iter()
            .map(|v| ElementSnapshot {
                text: v["text"].as_str().map(String::from),
                stars: v["stars"].as_u64().map(|n| n as usize),
            })
            .collect();
        let mut session = MockSession::new().page(REVIEWS, MockPage::single(elements));

        let (ctx, outcome) = run(&mut session, Settings::for_tests(BASE)).await;

        assert!(matches!(outcome, PhaseOutcome::Finished(StopReason::Stale { .. })));
        assert!(!ctx.reviews().is_empty());
        assert!(ctx.reviews().iter().all(|r| !r.date.contains("2022")));
        assert!(ctx.reviews().iter().all(|r| (1..=5).contains(&r.rating)));
    }
}
