//! Dense two-phase simplex for the small linear programs behind facet
//! feasibility, exact L∞ distances, and exact facet comparison.
//!
//! Problems here are tiny (tens of rows, input dimension + 1 variables), so
//! a dense tableau with Bland's rule is simpler and more predictable than an
//! external solver. Free variables are split `x = u - v`; inequality rows get
//! slack variables; phase 1 drives artificial variables to zero.

use nalgebra::{DMatrix, DVector};

use crate::error::GeomError;

use super::types::GeomCfg;

/// Pivot budget per phase, scaled by tableau size. Bland's rule already
/// guarantees termination; the cap turns pathological conditioning into a
/// typed `LpStalled` instead of a long stall.
const PIVOT_FACTOR: usize = 64;

/// Residual above which phase 1 declares the program infeasible.
const PHASE1_TOL: f64 = 1e-7;

/// Solution of a linear program.
#[derive(Clone, Debug)]
pub struct LpSolution {
    pub x: DVector<f64>,
    pub objective: f64,
}

/// Minimize `c · x` subject to `a_ub x <= b_ub` and optionally
/// `a_eq x = b_eq`, with `x` free.
pub fn solve(
    c: &DVector<f64>,
    a_ub: &DMatrix<f64>,
    b_ub: &DVector<f64>,
    a_eq: Option<(&DMatrix<f64>, &DVector<f64>)>,
    cfg: &GeomCfg,
) -> Result<LpSolution, GeomError> {
    let n = c.len();
    let m_ub = a_ub.nrows();
    let m_eq = a_eq.map_or(0, |(m, _)| m.nrows());
    let m = m_ub + m_eq;
    // Structural columns: x = u - v (2n), then one slack per inequality.
    let n_struct = 2 * n + m_ub;
    let ncols = n_struct + m; // + artificials
    let rhs = ncols;

    let mut tab = DMatrix::<f64>::zeros(m + 1, ncols + 1);
    for r in 0..m_ub {
        for j in 0..n {
            tab[(r, j)] = a_ub[(r, j)];
            tab[(r, n + j)] = -a_ub[(r, j)];
        }
        tab[(r, 2 * n + r)] = 1.0;
        tab[(r, rhs)] = b_ub[r];
    }
    if let Some((ae, be)) = a_eq {
        for i in 0..m_eq {
            let r = m_ub + i;
            for j in 0..n {
                tab[(r, j)] = ae[(i, j)];
                tab[(r, n + j)] = -ae[(i, j)];
            }
            tab[(r, rhs)] = be[i];
        }
    }
    // Make every right-hand side non-negative before adding artificials.
    for r in 0..m {
        if tab[(r, rhs)] < 0.0 {
            for col in 0..=ncols {
                tab[(r, col)] = -tab[(r, col)];
            }
        }
    }
    let mut basis: Vec<usize> = (0..m).map(|r| n_struct + r).collect();
    for r in 0..m {
        tab[(r, n_struct + r)] = 1.0;
    }

    // Phase 1: minimize the sum of artificials, starting from the canonical
    // objective row (artificial costs eliminated against the basis).
    for r in 0..m {
        tab[(m, n_struct + r)] = 1.0;
    }
    for r in 0..m {
        for col in 0..=ncols {
            let v = tab[(r, col)];
            tab[(m, col)] -= v;
        }
    }
    let budget = PIVOT_FACTOR * (m + ncols + 1);
    run_simplex(&mut tab, &mut basis, ncols, cfg.eps_lp, budget)?;
    if -tab[(m, rhs)] > PHASE1_TOL {
        return Err(GeomError::LpInfeasible);
    }
    // Pivot lingering artificials out of the basis where possible; rows that
    // resist are redundant and stay pinned at zero.
    for r in 0..m {
        if basis[r] >= n_struct {
            if let Some(j) = (0..n_struct).find(|&j| tab[(r, j)].abs() > cfg.eps_lp) {
                pivot(&mut tab, &mut basis, r, j);
            }
        }
    }

    // Phase 2: real objective over structural columns only.
    let mut cost = vec![0.0f64; n_struct];
    for j in 0..n {
        cost[j] = c[j];
        cost[n + j] = -c[j];
    }
    for col in 0..=ncols {
        tab[(m, col)] = 0.0;
    }
    for (j, cj) in cost.iter().enumerate() {
        tab[(m, j)] = *cj;
    }
    for r in 0..m {
        let b = basis[r];
        if b < n_struct && cost[b] != 0.0 {
            let f = cost[b];
            for col in 0..=ncols {
                let v = tab[(r, col)];
                tab[(m, col)] -= f * v;
            }
        }
    }
    run_simplex(&mut tab, &mut basis, n_struct, cfg.eps_lp, budget)?;

    let mut vals = vec![0.0f64; n_struct];
    for r in 0..m {
        if basis[r] < n_struct {
            vals[basis[r]] = tab[(r, rhs)];
        }
    }
    let x = DVector::from_fn(n, |j, _| vals[j] - vals[n + j]);
    let objective = c.dot(&x);
    Ok(LpSolution { x, objective })
}

/// Bland-rule simplex on a canonical tableau. Columns `>= enter_limit`
/// (artificials in phase 2) never enter the basis.
fn run_simplex(
    tab: &mut DMatrix<f64>,
    basis: &mut [usize],
    enter_limit: usize,
    eps: f64,
    budget: usize,
) -> Result<(), GeomError> {
    let m = basis.len();
    let rhs = tab.ncols() - 1;
    for _ in 0..budget {
        let Some(j) = (0..enter_limit).find(|&j| tab[(m, j)] < -eps) else {
            return Ok(());
        };
        let mut leave: Option<(usize, f64)> = None;
        for r in 0..m {
            let a = tab[(r, j)];
            if a <= eps {
                continue;
            }
            let ratio = tab[(r, rhs)] / a;
            leave = match leave {
                None => Some((r, ratio)),
                Some((l, best)) => {
                    if ratio < best - eps {
                        Some((r, ratio))
                    } else if ratio <= best + eps && basis[r] < basis[l] {
                        Some((r, best.min(ratio)))
                    } else {
                        Some((l, best))
                    }
                }
            };
        }
        let Some((r, _)) = leave else {
            return Err(GeomError::LpUnbounded);
        };
        pivot(tab, basis, r, j);
    }
    Err(GeomError::LpStalled { pivots: budget })
}

fn pivot(tab: &mut DMatrix<f64>, basis: &mut [usize], r: usize, j: usize) {
    let m = basis.len();
    let ncols = tab.ncols();
    let p = tab[(r, j)];
    for col in 0..ncols {
        tab[(r, col)] /= p;
    }
    for row in 0..=m {
        if row == r {
            continue;
        }
        let f = tab[(row, j)];
        if f == 0.0 {
            continue;
        }
        for col in 0..ncols {
            let v = tab[(r, col)];
            tab[(row, col)] -= f * v;
        }
        tab[(row, j)] = 0.0;
    }
    basis[r] = j;
}

/// Largest uniform slack `eps <= 1` with `a y <= b - eps` and optionally
/// `plane.0 · y = plane.1`. Returns the slack and the witness point.
///
/// Negative slack means the (restricted) region is empty at that margin;
/// slack above the feasibility tolerance certifies a relative interior.
pub fn max_uniform_slack(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    plane: Option<(&DVector<f64>, f64)>,
    cfg: &GeomCfg,
) -> Result<(f64, DVector<f64>), GeomError> {
    let n = a.ncols();
    let m = a.nrows();
    let mut c = DVector::zeros(n + 1);
    c[n] = -1.0;
    let mut a2 = DMatrix::zeros(m + 1, n + 1);
    let mut b2 = DVector::zeros(m + 1);
    for r in 0..m {
        for j in 0..n {
            a2[(r, j)] = a[(r, j)];
        }
        a2[(r, n)] = 1.0;
        b2[r] = b[r];
    }
    a2[(m, n)] = 1.0;
    b2[m] = 1.0;
    let eq_storage;
    let eq = match plane {
        Some((pn, pc)) => {
            let mut ae = DMatrix::zeros(1, n + 1);
            for j in 0..n {
                ae[(0, j)] = pn[j];
            }
            eq_storage = (ae, DVector::from_element(1, pc));
            Some((&eq_storage.0, &eq_storage.1))
        }
        None => None,
    };
    let sol = solve(&c, &a2, &b2, eq, cfg)?;
    Ok((sol.x[n], sol.x.rows(0, n).into_owned()))
}

/// Support value `max obj · y` over `a y <= b` restricted to
/// `plane.0 · y = plane.1`. `Err(LpUnbounded)` when the facet is unbounded
/// in the `obj` direction.
pub fn support(
    obj: &DVector<f64>,
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    plane: (&DVector<f64>, f64),
    cfg: &GeomCfg,
) -> Result<f64, GeomError> {
    let ae = DMatrix::from_rows(&[plane.0.transpose()]);
    let be = DVector::from_element(1, plane.1);
    let sol = solve(&(-obj), a, b, Some((&ae, &be)), cfg)?;
    Ok(-sol.objective)
}

/// Exact L∞ distance from `x` to the hyperplane `plane` restricted to
/// `a y <= b`: minimize `t` with `|y_k - x_k| <= t` for every coordinate.
pub fn linf_distance(
    x: &DVector<f64>,
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    plane: (&DVector<f64>, f64),
    cfg: &GeomCfg,
) -> Result<f64, GeomError> {
    let d = x.len();
    let m = a.nrows();
    // Variables (y, t).
    let mut c = DVector::zeros(d + 1);
    c[d] = 1.0;
    let mut a2 = DMatrix::zeros(m + 2 * d, d + 1);
    let mut b2 = DVector::zeros(m + 2 * d);
    for r in 0..m {
        for j in 0..d {
            a2[(r, j)] = a[(r, j)];
        }
        b2[r] = b[r];
    }
    for k in 0..d {
        // y_k - t <= x_k and -y_k - t <= -x_k
        a2[(m + 2 * k, k)] = 1.0;
        a2[(m + 2 * k, d)] = -1.0;
        b2[m + 2 * k] = x[k];
        a2[(m + 2 * k + 1, k)] = -1.0;
        a2[(m + 2 * k + 1, d)] = -1.0;
        b2[m + 2 * k + 1] = -x[k];
    }
    let mut ae = DMatrix::zeros(1, d + 1);
    for j in 0..d {
        ae[(0, j)] = plane.0[j];
    }
    let be = DVector::from_element(1, plane.1);
    let sol = solve(&c, &a2, &b2, Some((&ae, &be)), cfg)?;
    Ok(sol.objective.max(0.0))
}
