//! Typed errors shared by the geometry, region, and search layers.

/// Failure inside a geometry primitive (LP, distance, comparison).
///
/// These propagate to the caller of the affected operation; the search
/// engine does not continue past them.
#[derive(Debug, thiserror::Error)]
pub enum GeomError {
    /// A hyperplane normal with (near-)zero norm cannot support a facet.
    #[error("degenerate hyperplane: normal norm {norm:.3e}")]
    DegenerateHyperplane { norm: f64 },

    /// The linear program has no feasible point.
    #[error("linear program infeasible")]
    LpInfeasible,

    /// The linear program is unbounded below.
    #[error("linear program unbounded")]
    LpUnbounded,

    /// The simplex pivot budget was exhausted (cycling or ill-conditioning).
    #[error("simplex stalled after {pivots} pivots")]
    LpStalled { pivots: usize },

    /// A comparison strategy was asked about facets it cannot judge
    /// (pattern comparison needs activation keys on both sides).
    #[error("{strategy} comparison requires activation keys on both facets")]
    ComparisonUnsupported { strategy: &'static str },
}

/// Failure of a certification entry point.
#[derive(Debug, thiserror::Error)]
pub enum CertError {
    /// The query point lies in none of the supplied (or reachable) polytopes.
    #[error("query point lies in none of the supplied polytopes")]
    PointNotContained,

    /// Every facet of the union cancelled against a neighbor; there is no
    /// boundary to measure against.
    #[error("polytope union has no boundary facets")]
    NoBoundary,

    /// The queue drained without reaching a decision boundary.
    #[error("queue drained after {pops} pops without reaching a decision boundary")]
    SearchExhausted { pops: usize },

    /// The configured pop or wall-clock budget ran out.
    #[error("search budget exhausted after {pops} pops")]
    BudgetExhausted { pops: usize },

    #[error(transparent)]
    Geometry(#[from] GeomError),
}
