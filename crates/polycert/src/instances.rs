//! Seeded fixtures: axis-aligned boxes, glued box unions, and random ReLU
//! classifiers for tests and benchmarks.
//!
//! Determinism matters more than distribution quality here: the same
//! `(cfg, seed)` always replays the same instance.

use nalgebra::{DMatrix, DVector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geometry::Polytope;
use crate::region::{Layer, ReluNet};

/// Axis-aligned box `lo <= x <= hi` as an H-rep polytope (two rows per
/// coordinate, upper bound first).
pub fn axis_box(lo: &[f64], hi: &[f64]) -> Polytope {
    debug_assert_eq!(lo.len(), hi.len());
    let d = lo.len();
    let mut a = DMatrix::zeros(2 * d, d);
    let mut b = DVector::zeros(2 * d);
    for k in 0..d {
        a[(2 * k, k)] = 1.0;
        b[2 * k] = hi[k];
        a[(2 * k + 1, k)] = -1.0;
        b[2 * k + 1] = -lo[k];
    }
    Polytope::new(a, b)
}

/// Row of `count` unit squares glued along vertical edges:
/// `[i, i+1] × [0, 1]`.
pub fn box_row(count: usize) -> Vec<Polytope> {
    (0..count)
        .map(|i| axis_box(&[i as f64, 0.0], &[i as f64 + 1.0, 1.0]))
        .collect()
}

/// Shape of a random dense ReLU classifier.
#[derive(Clone, Debug)]
pub struct NetCfg {
    pub input_dim: usize,
    /// Hidden layer widths.
    pub hidden: Vec<usize>,
    pub labels: usize,
    /// Weight/bias amplitude.
    pub scale: f64,
}

impl Default for NetCfg {
    fn default() -> Self {
        Self {
            input_dim: 2,
            hidden: vec![8],
            labels: 3,
            scale: 1.0,
        }
    }
}

/// Draw a random ReLU classifier; replayable from `(cfg, seed)`.
pub fn draw_relu_net(cfg: &NetCfg, seed: u64) -> ReluNet {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut dims = vec![cfg.input_dim];
    dims.extend(cfg.hidden.iter().copied());
    dims.push(cfg.labels);
    let mut layers = Vec::with_capacity(dims.len() - 1);
    for pair in dims.windows(2) {
        let (ins, outs) = (pair[0], pair[1]);
        let w = DMatrix::from_fn(outs, ins, |_, _| rng.gen_range(-cfg.scale..cfg.scale));
        let b = DVector::from_fn(outs, |_, _| rng.gen_range(-cfg.scale..cfg.scale));
        layers.push(Layer { w, b });
    }
    ReluNet::new(layers)
}
