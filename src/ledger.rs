use std::collections::{HashMap, HashSet};

use crate::records::Entity;

/// Per-run set of identity keys, one set per entity type.
#[derive(Debug, Default)]
pub struct Ledger {
    seen: HashMap<Entity, HashSet<String>>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key` for `entity`. Returns false if it was already admitted.
    pub fn admit(&mut self, entity: Entity, key: impl Into<String>) -> bool {
        self.seen.entry(entity).or_default().insert(key.into())
    }
}

// ── Tests ──
