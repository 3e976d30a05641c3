//! N-dimensional convex geometry: half-spaces, H-rep polytopes, facets.
//!
//! Purpose
//! - Provide the polytope/facet substrate for boundary extraction and the
//!   incremental search: facet enumeration with feasibility filtering and
//!   L∞ distances in exact and estimate modes.
//!
//! Why this design
//! - H-representation only (`A x <= b`): regions arrive as inequality
//!   systems from the region oracle and are never converted to vertices.
//! - All feasibility and exact-distance questions reduce to small dense
//!   linear programs solved by `lp` (two-phase simplex); tolerances are
//!   centralized in `GeomCfg` and passed explicitly.

pub mod facet;
pub mod lp;
mod types;

pub use facet::{generate_facets, DistMode, Facet};
pub use types::{GeomCfg, Halfspace, Polytope};

#[cfg(test)]
mod tests;
