//! Per-search cache of discovered regions.

use std::collections::HashMap;
use std::rc::Rc;

use crate::geometry::{Facet, Polytope};
use crate::pattern::ActivationKey;

/// A region discovered during one search: its polytope and the facets
/// (regular and decision) generated for it.
#[derive(Clone, Debug)]
pub struct RegionEntry {
    pub polytope: Rc<Polytope>,
    pub facets: Vec<Rc<Facet>>,
}

/// Maps activation keys to regions already derived, so re-encountering a key
/// never re-derives the region. Scoped to one search invocation; entries are
/// never evicted within a run.
#[derive(Debug, Default)]
pub struct RegionMemo {
    regions: HashMap<ActivationKey, RegionEntry>,
}

impl RegionMemo {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn contains(&self, key: &ActivationKey) -> bool {
        self.regions.contains_key(key)
    }

    pub fn get(&self, key: &ActivationKey) -> Option<&RegionEntry> {
        self.regions.get(key)
    }

    pub fn insert(&mut self, key: ActivationKey, entry: RegionEntry) {
        self.regions.insert(key, entry);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}
