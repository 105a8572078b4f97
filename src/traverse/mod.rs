//! Traversal strategies.
//!
//! Each entity type is pulled by one variant of [`Traversal`]. The variants
//! differ only in how they move through the site and when they stop; the
//! driver loop, ledger admission and error handling are shared.

pub mod products;
pub mod reviews;
pub mod testimonials;

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::context::RunContext;
use crate::extract::{records, SkipReason};
use crate::records::{Entity, Product, Review, Testimonial};
use crate::session::{BrowserSession, ElementSnapshot};

pub use products::ProductPager;
pub use reviews::ReviewLoader;
pub use testimonials::TestimonialScroller;

/// Outcome of one traversal step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Continue,
    Stop(StopReason),
}

/// Why a traversal ended normally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Page limit reached.
    PageCap,
    /// Nothing (more) to load: empty page or no load-more control.
    Exhausted,
    /// A page contributed no new records.
    NoNewContent,
    /// Hit a review older than the cutoff.
    Stale { year: i32 },
    ClickCap,
    /// Document height did not change after scrolling.
    Plateau,
    ScrollCap,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::PageCap => write!(f, "page limit reached"),
            StopReason::Exhausted => write!(f, "no more content"),
            StopReason::NoNewContent => write!(f, "page added nothing new"),
            StopReason::Stale { year } => write!(f, "reached content from {}", year),
            StopReason::ClickCap => write!(f, "load-more limit reached"),
            StopReason::Plateau => write!(f, "page height stopped growing"),
            StopReason::ScrollCap => write!(f, "scroll limit reached"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome {
    Finished(StopReason),
    /// The phase was cut short by a session error. Records admitted before
    /// the failure are kept.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct PhaseReport {
    pub entity: Entity,
    pub outcome: PhaseOutcome,
    pub admitted: usize,
    pub skipped: usize,
    pub steps: u32,
}

impl PhaseReport {
    pub fn failed(&self) -> bool {
        matches!(self.outcome, PhaseOutcome::Failed(_))
    }
}

/// Per-phase counters maintained by the driver and the harvest helper.
#[derive(Debug, Default)]
pub struct Tally {
    pub steps: u32,
    pub skipped: usize,
}

/// A record type that can be recovered from an element and admitted into
/// the run context.
pub trait Harvestable: Sized {
    fn recover(el: &ElementSnapshot, settings: &Settings) -> Result<Self, SkipReason>;
    fn admit(self, ctx: &mut RunContext) -> bool;
}

impl Harvestable for Product {
    fn recover(el: &ElementSnapshot, settings: &Settings) -> Result<Self, SkipReason> {
        records::product(el, &settings.name_stoplist)
    }
    fn admit(self, ctx: &mut RunContext) -> bool {
        ctx.admit_product(self)
    }
}

impl Harvestable for Review {
    fn recover(el: &ElementSnapshot, settings: &Settings) -> Result<Self, SkipReason> {
        records::review(el, settings.stale_cutoff_year)
    }
    fn admit(self, ctx: &mut RunContext) -> bool {
        ctx.admit_review(self)
    }
}

impl Harvestable for Testimonial {
    fn recover(el: &ElementSnapshot, settings: &Settings) -> Result<Self, SkipReason> {
        records::testimonial(el, &settings.exclusion_phrases)
    }
    fn admit(self, ctx: &mut RunContext) -> bool {
        ctx.admit_testimonial(self)
    }
}

/// Result of one pass over the currently rendered elements.
#[derive(Debug, Default)]
pub struct Harvest {
    pub found: usize,
    pub admitted: usize,
    /// Set when a stale element ended the pass early.
    pub stale: Option<i32>,
}

/// Query `selector`, recover every element and admit the results. A stale
/// element ends the pass immediately; any other skip is counted and ignored.
pub async fn harvest<R: Harvestable>(
    session: &mut dyn BrowserSession,
    ctx: &mut RunContext,
    tally: &mut Tally,
    selector: &str,
) -> Result<Harvest> {
    let star = ctx.settings.selectors.star.clone();
    let elements = session.query(selector, &star).await?;
    let mut harvest = Harvest {
        found: elements.len(),
        ..Default::default()
    };

    for el in &elements {
        match R::recover(el, &ctx.settings) {
            Ok(record) => {
                if record.admit(ctx) {
                    harvest.admitted += 1;
                }
            }
            Err(SkipReason::Stale { year }) => {
                harvest.stale = Some(year);
                break;
            }
            Err(reason) => {
                debug!("Skipped element: {}", reason);
                tally.skipped += 1;
            }
        }
    }
    Ok(harvest)
}

pub enum Traversal {
    Paged(ProductPager),
    Incremental(ReviewLoader),
    Scroll(TestimonialScroller),
}

impl Traversal {
    pub fn for_entity(entity: Entity) -> Self {
        match entity {
            Entity::Product => Traversal::Paged(ProductPager::new()),
            Entity::Review => Traversal::Incremental(ReviewLoader::new()),
            Entity::Testimonial => Traversal::Scroll(TestimonialScroller::new()),
        }
    }

    pub fn entity(&self) -> Entity {
        match self {
            Traversal::Paged(_) => Entity::Product,
            Traversal::Incremental(_) => Entity::Review,
            Traversal::Scroll(_) => Entity::Testimonial,
        }
    }

    /// Run to completion. Session errors end the phase but are reported, not
    /// returned, so later phases still run.
    pub async fn run(mut self, session: &mut dyn BrowserSession, ctx: &mut RunContext) -> PhaseReport {
        let entity = self.entity();
        let before = ctx.count(entity);
        let mut tally = Tally::default();
        let spinner = spinner(entity);

        info!("{}: scraping", entity);
        let outcome = match self.drive(session, ctx, &mut tally, &spinner).await {
            Ok(reason) => {
                info!("{}: stopped, {}", entity, reason);
                PhaseOutcome::Finished(reason)
            }
            Err(e) => {
                warn!("{}: phase aborted: {:#}", entity, e);
                PhaseOutcome::Failed(format!("{:#}", e))
            }
        };
        spinner.finish_and_clear();

        let admitted = ctx.count(entity) - before;
        info!("{}: {} records ({} skipped elements)", entity, admitted, tally.skipped);
        PhaseReport {
            entity,
            outcome,
            admitted,
            skipped: tally.skipped,
            steps: tally.steps,
        }
    }

    async fn drive(
        &mut self,
        session: &mut dyn BrowserSession,
        ctx: &mut RunContext,
        tally: &mut Tally,
        spinner: &ProgressBar,
    ) -> Result<StopReason> {
        let entity = self.entity();
        match self {
            Traversal::Paged(_) => {}
            Traversal::Incremental(t) => t.open(session, ctx).await?,
            Traversal::Scroll(t) => t.open(session, ctx).await?,
        }

        loop {
            let step = match self {
                Traversal::Paged(t) => t.step(session, ctx, tally).await?,
                Traversal::Incremental(t) => t.step(session, ctx, tally).await?,
                Traversal::Scroll(t) => t.step(session, ctx, tally).await?,
            };
            tally.steps += 1;
            spinner.set_message(format!(
                "{}: step {} | {} records",
                entity,
                tally.steps,
                ctx.count(entity)
            ));
            if let Step::Stop(reason) = step {
                return Ok(reason);
            }
        }
    }
}

fn spinner(entity: Entity) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("{}: starting", entity));
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

// ── Tests ──
