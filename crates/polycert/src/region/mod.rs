//! Linear-region discovery: the oracle contract, a dense ReLU
//! implementation, and the per-search region memo.
//!
//! The search engine only ever talks to [`RegionOracle`]; the network's
//! forward pass and local-polytope algebra stay behind this seam.

mod memo;
mod net;

pub use memo::{RegionEntry, RegionMemo};
pub use net::{Layer, ReluNet};

use nalgebra::DVector;

use crate::error::CertError;
use crate::geometry::{Halfspace, Polytope};
use crate::pattern::ActivationKey;

/// Source of local linear regions: a piecewise-linear classifier queried at
/// points and activation keys.
pub trait RegionOracle {
    /// Ambient input dimension.
    fn dim(&self) -> usize;

    /// Predicted label at `x` (ties resolved deterministically).
    fn classify(&self, x: &DVector<f64>) -> Result<usize, CertError>;

    /// The polytope of the linear region containing `x`, with its canonical
    /// activation key. `Err(PointNotContained)` when `x` lies outside every
    /// region the oracle covers.
    fn region_at(&self, x: &DVector<f64>) -> Result<(Polytope, ActivationKey), CertError>;

    /// Half-spaces whose violation flips the predicted label away from
    /// `label` anywhere inside the region named by `key`.
    fn decision_constraints(
        &self,
        key: &ActivationKey,
        label: usize,
    ) -> Result<Vec<Halfspace>, CertError>;
}
