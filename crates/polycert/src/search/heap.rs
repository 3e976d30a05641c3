//! Priority-queue entries for the best-first search.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::geometry::{DistMode, Facet};

/// A facet with its best-known distance. Entries are immutable: a sharper
/// distance is pushed as a new element under a bumped generation, and the
/// superseded one is recognized and dropped when popped.
#[derive(Clone, Debug)]
pub struct HeapElement {
    pub dist: f64,
    pub mode: DistMode,
    pub facet: Rc<Facet>,
    /// Matches the engine's per-facet generation counter while current.
    pub generation: u64,
    /// Insertion counter; breaks distance ties deterministically.
    pub seq: u64,
}

// `BinaryHeap` pops its greatest element, so order by descending distance;
// among equal distances the earliest insertion wins.
impl Ord for HeapElement {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .partial_cmp(&self.dist)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for HeapElement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for HeapElement {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapElement {}
