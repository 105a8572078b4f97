use super::{fields, lines, normalize_whitespace, SkipReason};
use crate::records::{Product, Review, Testimonial};
use crate::session::ElementSnapshot;

const MIN_PRODUCT_TEXT: usize = 5;
const TESTIMONIAL_LEN: std::ops::RangeInclusive<usize> = 10..=400;

fn text(el: &ElementSnapshot) -> Result<&str, SkipReason> {
    match el.text.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t),
        _ => Err(SkipReason::Unreadable),
    }
}

pub fn product(el: &ElementSnapshot, stoplist: &[String]) -> Result<Product, SkipReason> {
    let text = text(el)?;
    if text.chars().count() < MIN_PRODUCT_TEXT {
        return Err(SkipReason::TooShort);
    }
    let lines = lines(text);
    Ok(Product {
        name: fields::name(&lines, stoplist)?,
        price: fields::price(&lines),
    })
}

/// A review dated before `cutoff_year` yields `SkipReason::Stale`, which the
/// loader treats as the end of relevant content.
pub fn review(el: &ElementSnapshot, cutoff_year: i32) -> Result<Review, SkipReason> {
    let lines = lines(text(el)?);
    let (date, year) = fields::date(&lines).ok_or(SkipReason::MissingDate)?;
    if year < cutoff_year {
        return Err(SkipReason::Stale { year });
    }
    Ok(Review {
        date,
        review_text: fields::longest_line(&lines)?,
        rating: fields::rating(el.stars),
    })
}

pub fn testimonial(el: &ElementSnapshot, excluded: &[String]) -> Result<Testimonial, SkipReason> {
    let text = text(el)?;
    let len = text.chars().count();
    if !TESTIMONIAL_LEN.contains(&len) {
        return Err(SkipReason::OutOfRange { len });
    }
    let lowered = text.to_lowercase();
    if let Some(phrase) = excluded.iter().find(|p| lowered.contains(&p.to_lowercase())) {
        return Err(SkipReason::Excluded {
            phrase: phrase.clone(),
        });
    }
    Ok(Testimonial {
        text: normalize_whitespace(text),
        rating: fields::rating(el.stars),
    })
}

// ── Tests ──
