//! The best-first engine: Init → Expand → Terminate.
//!
//! Dijkstra-style invariant: every queue entry's distance is a true lower
//! bound for its facet (estimates never exceed exact values), so the first
//! exact decision entry popped is the certified global minimum. Estimate
//! entries are tightened and re-pushed before being trusted for anything;
//! entries superseded by a sharper re-push are detected by generation and
//! dropped on pop.

use std::collections::{BinaryHeap, HashMap};
use std::rc::Rc;
use std::time::{Duration, Instant};

use nalgebra::DVector;
use tracing::{debug, trace};

use crate::error::CertError;
use crate::geometry::{generate_facets, DistMode, Facet, GeomCfg, Polytope};
use crate::pattern::ActivationKey;
use crate::region::{RegionEntry, RegionMemo, RegionOracle};

use super::heap::HeapElement;

/// Incremental search configuration.
#[derive(Clone, Debug)]
pub struct SearchCfg {
    /// Queue pops before the search fails with `BudgetExhausted`.
    pub max_pops: usize,
    /// Optional wall-clock budget.
    pub timeout: Option<Duration>,
    /// Step taken past a facet's interior witness when probing the
    /// neighboring region.
    pub step: f64,
    pub geom: GeomCfg,
}

impl Default for SearchCfg {
    fn default() -> Self {
        Self {
            max_pops: 100_000,
            timeout: None,
            step: 1e-6,
            geom: GeomCfg::default(),
        }
    }
}

/// The certificate committed by a terminating search: the nearest decision
/// facet, its exact L∞ distance, and run statistics.
#[derive(Clone, Debug)]
pub struct Certificate {
    pub distance: f64,
    pub facet: Rc<Facet>,
    /// Regions expanded (memo size at termination).
    pub regions: usize,
    pub pops: usize,
    pub stale_drops: usize,
    pub tightened: usize,
}

/// Identity of a facet across re-pushes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct FacetHandle {
    key: Option<ActivationKey>,
    index: usize,
    decision: bool,
}

impl FacetHandle {
    fn of(facet: &Facet) -> Self {
        Self {
            key: facet.poly.key.clone(),
            index: facet.index,
            decision: facet.decision_boundary,
        }
    }
}

/// Certified L∞ distance from `x` to the decision boundary of the
/// classifier behind `oracle`.
pub fn certify<O: RegionOracle>(
    oracle: &O,
    x: &DVector<f64>,
    cfg: SearchCfg,
) -> Result<Certificate, CertError> {
    let label = oracle.classify(x)?;
    let mut search = BoundarySearch {
        oracle,
        x: x.clone(),
        label,
        cfg,
        memo: RegionMemo::new(),
        queue: BinaryHeap::new(),
        generations: HashMap::new(),
        seq: 0,
        pops: 0,
        stale_drops: 0,
        tightened: 0,
    };
    search.run()
}

/// One search invocation: memo, queue, and generation counters live and die
/// with this value.
struct BoundarySearch<'a, O: RegionOracle> {
    oracle: &'a O,
    x: DVector<f64>,
    label: usize,
    cfg: SearchCfg,
    memo: RegionMemo,
    queue: BinaryHeap<HeapElement>,
    generations: HashMap<FacetHandle, u64>,
    seq: u64,
    pops: usize,
    stale_drops: usize,
    tightened: usize,
}

impl<O: RegionOracle> BoundarySearch<'_, O> {
    fn run(&mut self) -> Result<Certificate, CertError> {
        let (poly, key) = self.oracle.region_at(&self.x)?;
        if !poly.contains_eps(&self.x, self.cfg.geom.eps_feas) {
            return Err(CertError::PointNotContained);
        }
        // Init: the starting region's entries carry exact distances.
        self.expand_region(poly, key, DistMode::Exact)?;
        let deadline = self.cfg.timeout.map(|t| Instant::now() + t);
        loop {
            if self.pops >= self.cfg.max_pops {
                return Err(CertError::BudgetExhausted { pops: self.pops });
            }
            if let Some(d) = deadline {
                if Instant::now() >= d {
                    return Err(CertError::BudgetExhausted { pops: self.pops });
                }
            }
            let Some(el) = self.queue.pop() else {
                return Err(CertError::SearchExhausted { pops: self.pops });
            };
            self.pops += 1;
            if !self.is_current(&el) {
                self.stale_drops += 1;
                trace!(seq = el.seq, "dropping superseded queue entry");
                continue;
            }
            if el.mode == DistMode::Estimate {
                // A lower bound only: tighten before trusting it.
                let exact = el.facet.linf_dist(&self.x, DistMode::Exact, &self.cfg.geom)?;
                self.tightened += 1;
                self.push(el.facet, exact, DistMode::Exact);
                continue;
            }
            if el.facet.decision_boundary {
                debug!(
                    distance = el.dist,
                    pops = self.pops,
                    regions = self.memo.len(),
                    "decision boundary certified"
                );
                return Ok(Certificate {
                    distance: el.dist,
                    facet: el.facet,
                    regions: self.memo.len(),
                    pops: self.pops,
                    stale_drops: self.stale_drops,
                    tightened: self.tightened,
                });
            }
            // The globally nearest undominated facet is a region boundary:
            // cross it and discover the neighbor.
            let Some(anchor) = el.facet.interior.clone() else {
                // Facets enter this queue with witnesses; without one there
                // is nothing to cross from.
                continue;
            };
            let dir = &el.facet.plane.n / el.facet.plane.n.norm();
            let probe = anchor + dir * self.cfg.step;
            match self.oracle.region_at(&probe) {
                Ok((npoly, nkey)) => {
                    if !self.memo.contains(&nkey) {
                        self.expand_region(npoly, nkey, DistMode::Estimate)?;
                    }
                }
                Err(CertError::PointNotContained) => {
                    trace!(index = el.facet.index, "facet borders the exterior");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Generate a region's feasible facets and decision constraints, push
    /// them all, and memoize the region. `mode` picks exact distances for
    /// the initial region and cheap estimates for expanded ones.
    fn expand_region(
        &mut self,
        poly: Polytope,
        key: ActivationKey,
        mode: DistMode,
    ) -> Result<(), CertError> {
        let poly = Rc::new(poly);
        let mut facets: Vec<Rc<Facet>> = generate_facets(&poly, &self.cfg.geom, true)?
            .into_iter()
            .map(Rc::new)
            .collect();
        for (j, plane) in self
            .oracle
            .decision_constraints(&key, self.label)?
            .into_iter()
            .enumerate()
        {
            if let Some(f) = Facet::decision(&poly, plane, j, &self.cfg.geom)? {
                facets.push(Rc::new(f));
            }
        }
        for f in &facets {
            let dist = f.linf_dist(&self.x, mode, &self.cfg.geom)?;
            self.push(Rc::clone(f), dist, mode);
        }
        debug!(region = ?key, facets = facets.len(), ?mode, "expanded region");
        self.memo.insert(
            key,
            RegionEntry {
                polytope: poly,
                facets,
            },
        );
        Ok(())
    }

    fn push(&mut self, facet: Rc<Facet>, dist: f64, mode: DistMode) {
        let g = self.generations.entry(FacetHandle::of(&facet)).or_insert(0);
        *g += 1;
        let generation = *g;
        self.queue.push(HeapElement {
            dist,
            mode,
            facet,
            generation,
            seq: self.seq,
        });
        self.seq += 1;
    }

    fn is_current(&self, el: &HeapElement) -> bool {
        self.generations.get(&FacetHandle::of(&el.facet)) == Some(&el.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instances::axis_box;
    use crate::region::{Layer, ReluNet};
    use nalgebra::{dvector, DMatrix, DVector};

    #[test]
    fn superseded_entries_are_detected_by_generation() {
        let net = ReluNet::new(vec![Layer {
            w: DMatrix::identity(2, 2),
            b: DVector::zeros(2),
        }]);
        let mut search = BoundarySearch {
            oracle: &net,
            x: dvector![0.0, 0.0],
            label: 0,
            cfg: SearchCfg::default(),
            memo: RegionMemo::new(),
            queue: BinaryHeap::new(),
            generations: HashMap::new(),
            seq: 0,
            pops: 0,
            stale_drops: 0,
            tightened: 0,
        };
        let poly = Rc::new(axis_box(&[0.0, 0.0], &[1.0, 1.0]));
        let facet = Rc::new(
            generate_facets(&poly, &GeomCfg::default(), true)
                .unwrap()
                .remove(0),
        );
        search.push(Rc::clone(&facet), 0.5, DistMode::Estimate);
        search.push(facet, 0.25, DistMode::Exact);
        let sharper = search.queue.pop().unwrap();
        let superseded = search.queue.pop().unwrap();
        assert_eq!(sharper.generation, 2);
        assert!(search.is_current(&sharper));
        assert!(!search.is_current(&superseded));
    }
}
