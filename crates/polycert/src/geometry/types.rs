//! Half-spaces, polytopes, and the shared tolerance configuration.

use nalgebra::{DMatrix, DVector};

use crate::error::GeomError;
use crate::pattern::ActivationKey;

use super::lp;

/// Geometry configuration (tolerances).
#[derive(Clone, Copy, Debug)]
pub struct GeomCfg {
    /// Membership slack and the threshold below which a facet's relative
    /// interior counts as empty.
    pub eps_feas: f64,
    /// Tolerance for canonical-form plane comparison (fast strategy).
    pub eps_par: f64,
    /// Pivot tolerance for the simplex solver.
    pub eps_lp: f64,
}

impl Default for GeomCfg {
    fn default() -> Self {
        Self {
            eps_feas: 1e-9,
            eps_par: 1e-7,
            eps_lp: 1e-10,
        }
    }
}

/// Closed half-space `n · x <= c` in R^d (no normalization required).
#[derive(Clone, Debug)]
pub struct Halfspace {
    pub n: DVector<f64>,
    pub c: f64,
}

impl Halfspace {
    #[inline]
    pub fn new(n: DVector<f64>, c: f64) -> Self {
        Self { n, c }
    }

    /// Signed slack `n·p - c`; non-positive inside.
    #[inline]
    pub fn eval(&self, p: &DVector<f64>) -> f64 {
        self.n.dot(p) - self.c
    }

    #[inline]
    pub fn satisfies_eps(&self, p: &DVector<f64>, eps: f64) -> bool {
        self.eval(p) <= eps
    }

    /// Canonical form: unit normal, sign fixed so the first component with
    /// magnitude above `eps` is positive. Two half-spaces describe the same
    /// hyperplane iff their canonical forms agree (up to tolerance).
    pub fn canonicalized(&self, eps: f64) -> Result<Halfspace, GeomError> {
        let norm = self.n.norm();
        if !norm.is_finite() || norm <= eps {
            return Err(GeomError::DegenerateHyperplane { norm });
        }
        let mut n = &self.n / norm;
        let mut c = self.c / norm;
        let lead = n.iter().find(|v| v.abs() > eps).copied().unwrap_or(0.0);
        if lead < 0.0 {
            n = -n;
            c = -c;
        }
        Ok(Halfspace::new(n, c))
    }
}

/// Convex region `A x <= b` with an optional activation key naming the
/// linear region it came from.
///
/// Invariants:
/// - Row `i` of `a` and entry `i` of `b` form one separating half-space.
/// - Immutable after creation; the region memo shares it behind `Rc`.
#[derive(Clone, Debug)]
pub struct Polytope {
    pub a: DMatrix<f64>,
    pub b: DVector<f64>,
    pub key: Option<ActivationKey>,
}

impl Polytope {
    pub fn new(a: DMatrix<f64>, b: DVector<f64>) -> Self {
        debug_assert_eq!(a.nrows(), b.len());
        Self { a, b, key: None }
    }

    pub fn with_key(a: DMatrix<f64>, b: DVector<f64>, key: ActivationKey) -> Self {
        debug_assert_eq!(a.nrows(), b.len());
        Self {
            a,
            b,
            key: Some(key),
        }
    }

    /// Ambient dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.a.ncols()
    }

    #[inline]
    pub fn num_constraints(&self) -> usize {
        self.a.nrows()
    }

    /// Materialize constraint `i` as a half-space.
    pub fn halfspace(&self, i: usize) -> Halfspace {
        Halfspace::new(self.a.row(i).transpose(), self.b[i])
    }

    /// Membership with slack `eps` (positive = permissive).
    pub fn contains_eps(&self, x: &DVector<f64>, eps: f64) -> bool {
        let r = &self.a * x - &self.b;
        r.iter().all(|v| *v <= eps)
    }

    /// Largest uniform slack over all constraints (capped at 1). Negative
    /// means the region is empty at that tolerance.
    pub fn uniform_slack(&self, cfg: &GeomCfg) -> Result<f64, GeomError> {
        let (slack, _) = lp::max_uniform_slack(&self.a, &self.b, None, cfg)?;
        Ok(slack)
    }

    /// Whether the region has no interior at tolerance `eps_feas`.
    pub fn is_empty(&self, cfg: &GeomCfg) -> Result<bool, GeomError> {
        Ok(self.uniform_slack(cfg)? < cfg.eps_feas)
    }
}
