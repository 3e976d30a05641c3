//! Batch boundary extraction over an explicit union of polytopes.
//!
//! A facet interior to the union appears in exactly two member polytopes and
//! cancels; a facet appearing once bounds the union from outside. The
//! partition feeds the batch distance certificate.

use std::rc::Rc;

use nalgebra::DVector;
use tracing::debug;

use crate::compare::FacetComparator;
use crate::error::CertError;
use crate::geometry::{generate_facets, DistMode, Facet, GeomCfg, Polytope};

/// Facets of a union split into true boundary (`unshared`) and interior
/// (`shared`) sets.
#[derive(Clone, Debug, Default)]
pub struct BoundaryPartition {
    pub unshared: Vec<Rc<Facet>>,
    pub shared: Vec<Rc<Facet>>,
}

/// Partition every feasible facet of every polytope.
///
/// Each facet is compared against both running sets, so the cost is
/// quadratic in the total facet count per comparison call. Explicit
/// enumeration is only viable for small unions, which makes this acceptable.
pub fn compute_boundary_batch(
    polytopes: &[Rc<Polytope>],
    comparator: &dyn FacetComparator,
    cfg: &GeomCfg,
) -> Result<BoundaryPartition, CertError> {
    let mut part = BoundaryPartition::default();
    let mut total = 0usize;
    for poly in polytopes {
        for facet in generate_facets(poly, cfg, true)? {
            total += 1;
            let facet = Rc::new(facet);
            if any_match(comparator, &part.shared, &facet)?.is_some() {
                // Third or later occurrence of an interior facet: absorbed.
                continue;
            }
            if let Some(i) = any_match(comparator, &part.unshared, &facet)? {
                // Exactly two regions meet here: the facet cancels.
                let matched = part.unshared.remove(i);
                part.shared.push(matched);
                continue;
            }
            part.unshared.push(facet);
        }
    }
    debug!(
        total,
        unshared = part.unshared.len(),
        shared = part.shared.len(),
        "boundary partition"
    );
    Ok(part)
}

fn any_match(
    comparator: &dyn FacetComparator,
    set: &[Rc<Facet>],
    facet: &Rc<Facet>,
) -> Result<Option<usize>, CertError> {
    for (i, other) in set.iter().enumerate() {
        if comparator.same_facet(facet, other)? {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

/// Result of the batch entry point: certified distance, the facet attaining
/// it, and the full partition for inspection.
#[derive(Clone, Debug)]
pub struct BatchCertificate {
    pub distance: f64,
    pub nearest: Rc<Facet>,
    pub partition: BoundaryPartition,
}

/// Certified L∞ distance from `x` to the boundary of the union.
///
/// Fails with [`CertError::PointNotContained`] when `x` lies in no member
/// polytope — a typed error, distinguishable from a genuine zero distance —
/// and with [`CertError::NoBoundary`] when every facet cancels.
pub fn compute_l_inf_ball_batch(
    polytopes: &[Rc<Polytope>],
    x: &DVector<f64>,
    comparator: &dyn FacetComparator,
    cfg: &GeomCfg,
) -> Result<BatchCertificate, CertError> {
    if !polytopes.iter().any(|p| p.contains_eps(x, cfg.eps_feas)) {
        return Err(CertError::PointNotContained);
    }
    let partition = compute_boundary_batch(polytopes, comparator, cfg)?;
    let mut best: Option<(f64, Rc<Facet>)> = None;
    for facet in &partition.unshared {
        let d = facet.linf_dist(x, DistMode::Exact, cfg)?;
        if best.as_ref().is_none_or(|(bd, _)| d < *bd) {
            best = Some((d, Rc::clone(facet)));
        }
    }
    let Some((distance, nearest)) = best else {
        return Err(CertError::NoBoundary);
    };
    Ok(BatchCertificate {
        distance,
        nearest,
        partition,
    })
}
