//! Facets: one inequality of a polytope as a bounding hyperplane segment.

use std::rc::Rc;

use nalgebra::DVector;

use crate::error::GeomError;

use super::lp;
use super::types::{GeomCfg, Halfspace, Polytope};

/// Distance mode for the L∞ oracle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistMode {
    /// True distance to the facet's bounded extent.
    Exact,
    /// Distance to the unrestricted hyperplane; never exceeds the exact
    /// value, so it is a safe lower bound for best-first ordering.
    Estimate,
}

/// One bounding hyperplane segment of a convex region.
///
/// Invariants:
/// - `plane` restricted to `poly` is the facet's extent.
/// - `interior`, when present, is the relative-interior witness produced by
///   the feasibility check (also the anchor for neighbor probes).
/// - Never mutated after creation; shared behind `Rc` by the memo and queue.
#[derive(Clone, Debug)]
pub struct Facet {
    pub plane: Halfspace,
    pub poly: Rc<Polytope>,
    /// Constraint index: the defining row for region facets, the rival
    /// label's position for decision facets.
    pub index: usize,
    pub interior: Option<DVector<f64>>,
    /// Crossing this facet changes the predicted label (as opposed to
    /// entering an adjacent linear region of the same label).
    pub decision_boundary: bool,
}

impl Facet {
    /// Facet from row `index` of `poly`'s inequality system. `None` when the
    /// restricted hyperplane has no relative interior (infeasible facets are
    /// dropped, not escalated).
    pub fn of_region(
        poly: &Rc<Polytope>,
        index: usize,
        cfg: &GeomCfg,
    ) -> Result<Option<Facet>, GeomError> {
        let plane = poly.halfspace(index);
        let rest = strip_row(poly, index);
        Self::restricted(plane, rest, poly, index, false, cfg)
    }

    /// Decision facet: an extra hyperplane (label-flip constraint) restricted
    /// to the whole region.
    pub fn decision(
        poly: &Rc<Polytope>,
        plane: Halfspace,
        index: usize,
        cfg: &GeomCfg,
    ) -> Result<Option<Facet>, GeomError> {
        let rest = (poly.a.clone(), poly.b.clone());
        Self::restricted(plane, rest, poly, index, true, cfg)
    }

    fn restricted(
        plane: Halfspace,
        (a, b): (nalgebra::DMatrix<f64>, DVector<f64>),
        poly: &Rc<Polytope>,
        index: usize,
        decision_boundary: bool,
        cfg: &GeomCfg,
    ) -> Result<Option<Facet>, GeomError> {
        let norm = plane.n.norm();
        if !norm.is_finite() || norm <= cfg.eps_lp {
            return Ok(None);
        }
        match lp::max_uniform_slack(&a, &b, Some((&plane.n, plane.c)), cfg) {
            Ok((slack, witness)) => {
                if slack <= cfg.eps_feas {
                    return Ok(None);
                }
                Ok(Some(Facet {
                    plane,
                    poly: Rc::clone(poly),
                    index,
                    interior: Some(witness),
                    decision_boundary,
                }))
            }
            // The hyperplane misses the region entirely.
            Err(GeomError::LpInfeasible) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Unchecked facet (no feasibility LP, no interior witness).
    fn unchecked(poly: &Rc<Polytope>, index: usize) -> Facet {
        Facet {
            plane: poly.halfspace(index),
            poly: Rc::clone(poly),
            index,
            interior: None,
            decision_boundary: false,
        }
    }

    /// L∞ distance from `x` to this facet.
    pub fn linf_dist(
        &self,
        x: &DVector<f64>,
        mode: DistMode,
        cfg: &GeomCfg,
    ) -> Result<f64, GeomError> {
        match mode {
            DistMode::Estimate => {
                // Distance to the unrestricted hyperplane under the L∞ norm
                // is |n·x - c| / ‖n‖₁.
                let l1: f64 = self.plane.n.iter().map(|v| v.abs()).sum();
                if !l1.is_finite() || l1 <= cfg.eps_lp {
                    return Err(GeomError::DegenerateHyperplane { norm: l1 });
                }
                Ok(self.plane.eval(x).abs() / l1)
            }
            DistMode::Exact => lp::linf_distance(
                x,
                &self.poly.a,
                &self.poly.b,
                (&self.plane.n, self.plane.c),
                cfg,
            ),
        }
    }
}

/// Facets of `poly`, one per inequality row. With `check_feasible`, rows
/// whose restriction to the region is empty are filtered out (and each kept
/// facet carries its relative-interior witness); without it, only rows with
/// degenerate normals are skipped.
pub fn generate_facets(
    poly: &Rc<Polytope>,
    cfg: &GeomCfg,
    check_feasible: bool,
) -> Result<Vec<Facet>, GeomError> {
    let mut out = Vec::with_capacity(poly.num_constraints());
    for i in 0..poly.num_constraints() {
        if check_feasible {
            if let Some(f) = Facet::of_region(poly, i, cfg)? {
                out.push(f);
            }
        } else {
            let f = Facet::unchecked(poly, i);
            let norm = f.plane.n.norm();
            if norm.is_finite() && norm > cfg.eps_lp {
                out.push(f);
            }
        }
    }
    Ok(out)
}

fn strip_row(poly: &Polytope, index: usize) -> (nalgebra::DMatrix<f64>, DVector<f64>) {
    let m = poly.num_constraints();
    let n = poly.dim();
    let mut a = nalgebra::DMatrix::zeros(m.saturating_sub(1), n);
    let mut b = DVector::zeros(m.saturating_sub(1));
    let mut out = 0;
    for r in 0..m {
        if r == index {
            continue;
        }
        for j in 0..n {
            a[(out, j)] = poly.a[(r, j)];
        }
        b[out] = poly.b[r];
        out += 1;
    }
    (a, b)
}
