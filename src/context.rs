use crate::config::Settings;
use crate::ledger::Ledger;
use crate::records::{Entity, Product, Review, Testimonial};

/// Run-scoped state handed to every traversal: settings, the dedup ledger
/// and the three append-only accumulators.
#[derive(Debug)]
pub struct RunContext {
    pub settings: Settings,
    ledger: Ledger,
    products: Vec<Product>,
    reviews: Vec<Review>,
    testimonials: Vec<Testimonial>,
}

impl RunContext {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ledger: Ledger::new(),
            products: Vec::new(),
            reviews: Vec::new(),
            testimonials: Vec::new(),
        }
    }

    pub fn admit_product(&mut self, product: Product) -> bool {
        let fresh = self.ledger.admit(Entity::Product, product.key());
        if fresh {
            self.products.push(product);
        }
        fresh
    }

    pub fn admit_review(&mut self, review: Review) -> bool {
        let fresh = self.ledger.admit(Entity::Review, review.key());
        if fresh {
            self.reviews.push(review);
        }
        fresh
    }

    pub fn admit_testimonial(&mut self, testimonial: Testimonial) -> bool {
        let fresh = self.ledger.admit(Entity::Testimonial, testimonial.key());
        if fresh {
            self.testimonials.push(testimonial);
        }
        fresh
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    pub fn testimonials(&self) -> &[Testimonial] {
        &self.testimonials
    }

    pub fn count(&self, entity: Entity) -> usize {
        match entity {
            Entity::Product => self.products.len(),
            Entity::Review => self.reviews.len(),
            Entity::Testimonial => self.testimonials.len(),
        }
    }
}

// ── Tests ──
