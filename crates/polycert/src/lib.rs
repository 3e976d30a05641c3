//! Certified L∞ distances to piecewise-linear decision boundaries.
//!
//! A piecewise-linear classifier (a ReLU network, or any perfectly glued
//! union of polytopes) partitions its input space into convex regions on
//! which it is affine. This crate finds the nearest facet whose crossing
//! changes the predicted label, and certifies the L∞ distance to it:
//! - `boundary`: batch variant — the full polytope collection is given up
//!   front; facets shared by adjacent regions cancel, the rest bound the
//!   union.
//! - `search`: incremental variant — regions are discovered lazily through a
//!   [`region::RegionOracle`], driven by a best-first priority queue whose
//!   first committed decision facet is provably the globally nearest one.
//!
//! Supporting layers: `geometry` (H-rep polytopes, facet enumeration, a
//! dense simplex LP, the L∞ distance oracle), `compare` (three facet
//! identity strategies), `pattern` (activation keys), `instances` (seeded
//! fixtures for tests and benches).

pub mod boundary;
pub mod compare;
pub mod error;
pub mod geometry;
pub mod instances;
pub mod pattern;
pub mod region;
pub mod search;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::boundary::{
        compute_boundary_batch, compute_l_inf_ball_batch, BatchCertificate, BoundaryPartition,
    };
    pub use crate::compare::{CompareStrategy, FacetComparator};
    pub use crate::error::{CertError, GeomError};
    pub use crate::geometry::{generate_facets, DistMode, Facet, GeomCfg, Halfspace, Polytope};
    pub use crate::pattern::ActivationKey;
    pub use crate::region::{Layer, RegionMemo, RegionOracle, ReluNet};
    pub use crate::search::{certify, Certificate, SearchCfg};
    pub use nalgebra::{DMatrix, DVector};
}
