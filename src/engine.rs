use std::any::Any;
use std::panic::AssertUnwindSafe;

use anyhow::{Context, Result};
use futures::FutureExt;
use tracing::{error, info, warn};

use crate::config::Settings;
use crate::context::RunContext;
use crate::records::Entity;
use crate::session::chromium::ChromiumSession;
use crate::session::BrowserSession;
use crate::sink::{self, SinkReport};
use crate::traverse::{PhaseOutcome, PhaseReport, Traversal};

/// Everything that happened in one run.
#[derive(Debug)]
pub struct RunReport {
    pub phases: Vec<PhaseReport>,
    pub sinks: Vec<SinkReport>,
}

/// Launch the browser and crawl `entities` in order.
pub async fn run(settings: Settings, entities: &[Entity]) -> Result<RunReport> {
    let session = ChromiumSession::launch(&settings)
        .await
        .context("Could not start browser session")?;
    Ok(run_with(Box::new(session), settings, entities).await)
}

/// Crawl with an already acquired session. A panic inside one phase fails
/// that phase only. The session is closed exactly once and whatever was
/// collected is persisted.
pub async fn run_with(
    mut session: Box<dyn BrowserSession>,
    settings: Settings,
    entities: &[Entity],
) -> RunReport {
    let mut ctx = RunContext::new(settings);
    let mut phases = Vec::with_capacity(entities.len());

    for &entity in entities {
        let before = ctx.count(entity);
        let phase = AssertUnwindSafe(Traversal::for_entity(entity).run(session.as_mut(), &mut ctx))
            .catch_unwind()
            .await;
        let report = phase.unwrap_or_else(|payload| {
            let msg = panic_message(payload.as_ref());
            error!("{}: phase panicked: {}", entity, msg);
            PhaseReport {
                entity,
                outcome: PhaseOutcome::Failed(format!("panicked: {}", msg)),
                admitted: ctx.count(entity) - before,
                skipped: 0,
                steps: 0,
            }
        });
        phases.push(report);
    }

    match session.close().await {
        Ok(()) => info!("Browser closed"),
        Err(e) => warn!("Browser teardown failed: {:#}", e),
    }

    let sinks = sink::persist_all(&ctx.settings.output_dir, &ctx);
    RunReport { phases, sinks }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::session::mock::{MockPage, MockSession};
    use crate::session::ElementSnapshot;
    use crate::sink::SinkOutcome;
    use crate::traverse::StopReason;

    const BASE: &str = "https://shop.test";

    fn settings(out: &std::path::Path) -> Settings {
        let mut s = Settings::for_tests(BASE);
        s.output_dir = out.to_path_buf();
        s
    }

    fn site() -> MockSession {
        MockSession::new()
            .page(
                "https://shop.test/products?page=1",
                MockPage::single(vec![ElementSnapshot::new("Box of Chocolate Candy\n$24.99", 0)]),
            )
            .page(
                "https://shop.test/reviews",
                MockPage::single(vec![ElementSnapshot::new("2023-08-08\nCandy arrived fresh and tasty", 4)]),
            )
            .page(
                "https://shop.test/testimonials",
                MockPage::infinite(vec![vec![ElementSnapshot::new("Wonderful shop, quick shipping!", 5)]]),
            )
    }

    #[tokio::test]
    async fn full_run_persists_all_entities_and_closes_once() {
        let dir = tempfile::tempdir().unwrap();
        let session = site();
        let log = session.log();

        let report = run_with(Box::new(session), settings(dir.path()), &Entity::ALL).await;

        assert_eq!(log.closes.load(Ordering::SeqCst), 1);
        assert_eq!(report.phases.len(), 3);
        assert!(report.phases.iter().all(|p| !p.failed()));
        assert!(report
            .sinks
            .iter()
            .all(|s| matches!(s.outcome, SinkOutcome::Written { records: 1, .. })));
        for stem in ["products", "reviews", "testimonials"] {
            assert!(dir.path().join(format!("{}.json", stem)).exists());
            assert!(dir.path().join(format!("{}.csv", stem)).exists());
        }
    }

    #[tokio::test]
    async fn failed_phase_does_not_block_later_phases() {
        let dir = tempfile::tempdir().unwrap();
        let session = site().broken("https://shop.test/products?page=1");
        let log = session.log();

        let report = run_with(Box::new(session), settings(dir.path()), &Entity::ALL).await;

        assert_eq!(log.closes.load(Ordering::SeqCst), 1);
        assert!(report.phases[0].failed());
        assert_eq!(
            report.phases[1].outcome,
            PhaseOutcome::Finished(StopReason::Exhausted)
        );
        assert!(matches!(report.sinks[0].outcome, SinkOutcome::Empty));
        assert!(dir.path().join("reviews.json").exists());
        assert!(dir.path().join("testimonials.csv").exists());
    }

    #[tokio::test]
    async fn panicking_phase_does_not_stop_later_phases() {
        let dir = tempfile::tempdir().unwrap();
        let session = site().panic_at("https://shop.test/reviews");
        let log = session.log();

        let report = run_with(Box::new(session), settings(dir.path()), &Entity::ALL).await;

        assert_eq!(log.closes.load(Ordering::SeqCst), 1);
        assert_eq!(report.phases.len(), 3);
        assert!(!report.phases[0].failed());
        match &report.phases[1].outcome {
            PhaseOutcome::Failed(msg) => assert!(msg.contains("renderer crashed")),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(report.phases[2].admitted, 1);
        assert!(dir.path().join("products.json").exists());
        assert!(!dir.path().join("reviews.json").exists());
        assert!(dir.path().join("testimonials.json").exists());
    }

    #[tokio::test]
    async fn only_requested_entities_are_crawled() {
        let dir = tempfile::tempdir().unwrap();
        let session = site();
        let log = session.log();

        let report = run_with(Box::new(session), settings(dir.path()), &[Entity::Testimonial]).await;

        assert_eq!(report.phases.len(), 1);
        assert_eq!(log.navigations(), ["https://shop.test/testimonials"]);
    }
}
