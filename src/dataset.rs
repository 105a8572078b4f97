//! Reading the output files back the way downstream consumers do: missing
//! files are empty collections and unparseable review dates fall back to a
//! fixed default.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::records::{Entity, Product, Review, Testimonial};

const DATE_FORMATS: &[&str] = &["%B %d, %Y", "%b %d, %Y", "%Y-%m-%d", "%d.%m.%Y"];
const DEFAULT_MONTH: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub date: NaiveDate,
    /// True when the raw date could not be parsed.
    pub defaulted: bool,
}

/// Parse a raw review date, substituting June 1 of `reference_year`.
pub fn parse_review_date(raw: &str, reference_year: i32) -> ParsedDate {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .map(|date| ParsedDate {
            date,
            defaulted: false,
        })
        .unwrap_or_else(|| ParsedDate {
            date: NaiveDate::from_ymd_opt(reference_year, DEFAULT_MONTH, 1).unwrap_or_default(),
            defaulted: true,
        })
}

#[derive(Debug, Clone)]
pub struct DatedReview {
    pub review: Review,
    pub parsed: ParsedDate,
}

#[derive(Debug, Default)]
pub struct Dataset {
    pub products: Vec<Product>,
    pub reviews: Vec<DatedReview>,
    pub testimonials: Vec<Testimonial>,
}

impl Dataset {
    /// Review counts keyed by (year, month).
    pub fn monthly_counts(&self) -> BTreeMap<(i32, u32), usize> {
        let mut counts = BTreeMap::new();
        for r in &self.reviews {
            *counts.entry((r.parsed.date.year(), r.parsed.date.month())).or_insert(0) += 1;
        }
        counts
    }

    pub fn average_rating(&self, entity: Entity) -> Option<f64> {
        let ratings: Vec<u8> = match entity {
            Entity::Product => return None,
            Entity::Review => self.reviews.iter().map(|r| r.review.rating).collect(),
            Entity::Testimonial => self.testimonials.iter().map(|t| t.rating).collect(),
        };
        if ratings.is_empty() {
            return None;
        }
        Some(ratings.iter().map(|&r| f64::from(r)).sum::<f64>() / ratings.len() as f64)
    }
}

/// Load all three JSON files from `dir`. Never fails.
pub fn load(dir: &Path, reference_year: i32) -> Dataset {
    let reviews = read_records::<Review>(dir, Entity::Review)
        .into_iter()
        .map(|review| DatedReview {
            parsed: parse_review_date(&review.date, reference_year),
            review,
        })
        .collect();
    Dataset {
        products: read_records(dir, Entity::Product),
        reviews,
        testimonials: read_records(dir, Entity::Testimonial),
    }
}

fn read_records<T: DeserializeOwned>(dir: &Path, entity: Entity) -> Vec<T> {
    let path = dir.join(format!("{}.json", entity.stem()));
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(_) => return Vec::new(),
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!("Ignoring unreadable {}: {}", path.display(), e);
        Vec::new()
    })
}

// ── Tests ──
