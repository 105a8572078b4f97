use std::fmt;

use serde::{Deserialize, Serialize};

/// The three record types pulled from the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Entity {
    Product,
    Review,
    Testimonial,
}

impl Entity {
    pub const ALL: [Entity; 3] = [Entity::Product, Entity::Review, Entity::Testimonial];

    /// File stem used for both output encodings.
    pub fn stem(self) -> &'static str {
        match self {
            Entity::Product => "products",
            Entity::Review => "reviews",
            Entity::Testimonial => "testimonials",
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.stem())
    }
}

impl std::str::FromStr for Entity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().trim_end_matches('s') {
            "product" => Ok(Entity::Product),
            "review" => Ok(Entity::Review),
            "testimonial" => Ok(Entity::Testimonial),
            other => anyhow::bail!("unknown entity '{}' (expected products, reviews or testimonials)", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub price: String,
}

impl Product {
    pub fn key(&self) -> String {
        format!("{}_{}", self.name, self.price)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Raw date line as rendered; parsing belongs to consumers.
    pub date: String,
    pub review_text: String,
    pub rating: u8,
}

impl Review {
    /// First 30 characters of the body plus the raw date.
    pub fn key(&self) -> String {
        let prefix: String = self.review_text.chars().take(30).collect();
        format!("{}_{}", prefix, self.date)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testimonial {
    pub text: String,
    pub rating: u8,
}

impl Testimonial {
    pub fn key(&self) -> String {
        self.text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

// ── Tests ──
