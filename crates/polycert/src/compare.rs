//! Facet identity: is a facet of one region the same hyperplane segment as
//! a facet of an adjacent region?
//!
//! One capability, three interchangeable strategies selected by
//! [`CompareStrategy`]:
//! - exact: canonical-plane check plus mutual containment via support LPs;
//! - fast: canonical direction/offset comparison with tolerance — may
//!   produce false positives for coplanar but disjoint facets;
//! - pattern: activation-key adjacency, valid only for facets that came
//!   from a piecewise-linear activation structure.
//!
//! All three agree on unambiguous inputs (literally the same constraint of
//! two glued regions); they may disagree near degeneracies, which callers
//! accept when they pick a cheaper strategy.

use crate::error::GeomError;
use crate::geometry::{lp, Facet, GeomCfg};

/// Pluggable facet-equality test.
pub trait FacetComparator {
    fn same_facet(&self, a: &Facet, b: &Facet) -> Result<bool, GeomError>;
}

/// Strategy selector; `comparator` instantiates the implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CompareStrategy {
    #[default]
    Exact,
    Fast,
    Pattern,
}

impl CompareStrategy {
    pub fn comparator(self, cfg: GeomCfg) -> Box<dyn FacetComparator> {
        match self {
            CompareStrategy::Exact => Box::new(ExactComparator { cfg }),
            CompareStrategy::Fast => Box::new(FastComparator { cfg }),
            CompareStrategy::Pattern => Box::new(PatternComparator),
        }
    }
}

/// Canonical-plane check plus mutual containment of the restricted facets,
/// one support LP per parent constraint. Most expensive, numerically robust.
pub struct ExactComparator {
    pub cfg: GeomCfg,
}

impl ExactComparator {
    /// Every point of `inner`'s facet satisfies `outer`'s region system.
    fn contained_in(&self, inner: &Facet, outer: &Facet) -> Result<bool, GeomError> {
        for r in 0..outer.poly.num_constraints() {
            let h = outer.poly.halfspace(r);
            match lp::support(
                &h.n,
                &inner.poly.a,
                &inner.poly.b,
                (&inner.plane.n, inner.plane.c),
                &self.cfg,
            ) {
                Ok(s) => {
                    if s > h.c + self.cfg.eps_par {
                        return Ok(false);
                    }
                }
                // Unbounded support sticks out of any half-space.
                Err(GeomError::LpUnbounded) => return Ok(false),
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }
}

impl FacetComparator for ExactComparator {
    fn same_facet(&self, a: &Facet, b: &Facet) -> Result<bool, GeomError> {
        if !same_plane(a, b, &self.cfg)? {
            return Ok(false);
        }
        Ok(self.contained_in(a, b)? && self.contained_in(b, a)?)
    }
}

/// Canonical direction/offset comparison only. Fast, but treats any two
/// facets on the same hyperplane as equal.
pub struct FastComparator {
    pub cfg: GeomCfg,
}

impl FacetComparator for FastComparator {
    fn same_facet(&self, a: &Facet, b: &Facet) -> Result<bool, GeomError> {
        same_plane(a, b, &self.cfg)
    }
}

/// Activation-key adjacency: equal iff the facets name the same constraint
/// index and their regions are identical or glued across exactly that unit.
/// Only valid for facets carrying keys.
pub struct PatternComparator;

impl FacetComparator for PatternComparator {
    fn same_facet(&self, a: &Facet, b: &Facet) -> Result<bool, GeomError> {
        let (Some(ka), Some(kb)) = (&a.poly.key, &b.poly.key) else {
            return Err(GeomError::ComparisonUnsupported {
                strategy: "pattern",
            });
        };
        if a.decision_boundary != b.decision_boundary || a.index != b.index {
            return Ok(false);
        }
        if ka == kb {
            return Ok(true);
        }
        if a.decision_boundary {
            // Decision facets are not glued across regions.
            return Ok(false);
        }
        Ok(ka.single_diff(kb) == Some(a.index))
    }
}

fn same_plane(a: &Facet, b: &Facet, cfg: &GeomCfg) -> Result<bool, GeomError> {
    let ca = a.plane.canonicalized(cfg.eps_lp)?;
    let cb = b.plane.canonicalized(cfg.eps_lp)?;
    Ok((&ca.n - &cb.n).amax() <= cfg.eps_par && (ca.c - cb.c).abs() <= cfg.eps_par)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::generate_facets;
    use crate::geometry::Polytope;
    use crate::instances::axis_box;
    use crate::region::{Layer, ReluNet};
    use nalgebra::{DMatrix, DVector};
    use std::rc::Rc;

    fn facets_of(poly: Polytope) -> Vec<Facet> {
        let rc = Rc::new(poly);
        generate_facets(&rc, &GeomCfg::default(), true).unwrap()
    }

    /// Facet whose canonical plane is `x = c`.
    fn facet_on_x(facets: &[Facet], c: f64) -> Facet {
        facets
            .iter()
            .find(|f| {
                let p = f.plane.canonicalized(1e-12).unwrap();
                (p.n[0] - 1.0).abs() < 1e-9 && (p.c - c).abs() < 1e-9
            })
            .cloned()
            .unwrap()
    }

    #[test]
    fn glued_square_edges_match_under_exact_and_fast() {
        let cfg = GeomCfg::default();
        let left = facets_of(axis_box(&[0.0, 0.0], &[1.0, 1.0]));
        let right = facets_of(axis_box(&[1.0, 0.0], &[2.0, 1.0]));
        let shared_l = facet_on_x(&left, 1.0);
        let shared_r = facet_on_x(&right, 1.0);
        for strategy in [CompareStrategy::Exact, CompareStrategy::Fast] {
            let cmp = strategy.comparator(cfg);
            assert!(cmp.same_facet(&shared_l, &shared_r).unwrap());
            let outer_l = facet_on_x(&left, 0.0);
            let outer_r = facet_on_x(&right, 2.0);
            assert!(!cmp.same_facet(&outer_l, &outer_r).unwrap());
        }
    }

    #[test]
    fn fast_accepts_coplanar_disjoint_edges_where_exact_refuses() {
        // Both squares have an edge on the line x = 1, but the edges span
        // disjoint y-intervals: not a shared facet of a glued union.
        let cfg = GeomCfg::default();
        let low = facets_of(axis_box(&[0.0, 0.0], &[1.0, 1.0]));
        let high = facets_of(axis_box(&[1.0, 2.0], &[2.0, 3.0]));
        let e_low = facet_on_x(&low, 1.0);
        let e_high = facet_on_x(&high, 1.0);
        let fast = CompareStrategy::Fast.comparator(cfg);
        let exact = CompareStrategy::Exact.comparator(cfg);
        assert!(fast.same_facet(&e_low, &e_high).unwrap());
        assert!(!exact.same_facet(&e_low, &e_high).unwrap());
    }

    #[test]
    fn pattern_matches_facets_glued_across_one_unit() {
        let cfg = GeomCfg::default();
        let net = ReluNet::new(vec![
            Layer {
                w: DMatrix::identity(2, 2),
                b: DVector::zeros(2),
            },
            Layer {
                w: DMatrix::identity(2, 2),
                b: DVector::zeros(2),
            },
        ]);
        let key = net.activation_key(&nalgebra::dvector![0.5, -0.5]);
        let this = facets_of(net.polytope_for(&key));
        let neighbor = facets_of(net.polytope_for(&key.flipped(0)));
        let cmp = CompareStrategy::Pattern.comparator(cfg);
        // Same unit across the glued boundary: equal.
        assert!(cmp.same_facet(&this[0], &neighbor[0]).unwrap());
        // Different units: not equal.
        assert!(!cmp.same_facet(&this[0], &neighbor[1]).unwrap());
    }

    #[test]
    fn pattern_requires_keys() {
        let cfg = GeomCfg::default();
        let unkeyed = facets_of(axis_box(&[0.0, 0.0], &[1.0, 1.0]));
        let cmp = CompareStrategy::Pattern.comparator(cfg);
        assert!(matches!(
            cmp.same_facet(&unkeyed[0], &unkeyed[1]),
            Err(GeomError::ComparisonUnsupported { .. })
        ));
    }

    #[test]
    fn strategies_agree_on_relu_region_facets() {
        let cfg = GeomCfg::default();
        let net = ReluNet::new(vec![
            Layer {
                w: DMatrix::identity(2, 2),
                b: DVector::zeros(2),
            },
            Layer {
                w: DMatrix::identity(2, 2),
                b: DVector::zeros(2),
            },
        ]);
        let key = net.activation_key(&nalgebra::dvector![0.5, -0.5]);
        let this = facets_of(net.polytope_for(&key));
        let neighbor = facets_of(net.polytope_for(&key.flipped(0)));
        for strategy in [
            CompareStrategy::Exact,
            CompareStrategy::Fast,
            CompareStrategy::Pattern,
        ] {
            let cmp = strategy.comparator(cfg);
            assert!(
                cmp.same_facet(&this[0], &neighbor[0]).unwrap(),
                "{strategy:?} must accept the glued facet"
            );
        }
    }
}
