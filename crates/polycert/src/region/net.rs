//! Dense ReLU classifier and its linear-region algebra.
//!
//! On the region named by an activation key the network is affine; the
//! region itself is the conjunction of one sign constraint per hidden unit.
//! `unroll` walks the layers once and produces both the inequality system
//! (rows in canonical unit order, so row index == unit index) and the output
//! affine map used for decision constraints.

use nalgebra::{DMatrix, DVector};

use crate::error::CertError;
use crate::geometry::{Halfspace, Polytope};
use crate::pattern::ActivationKey;

use super::RegionOracle;

/// One dense layer `z ↦ W z + b`.
#[derive(Clone, Debug)]
pub struct Layer {
    pub w: DMatrix<f64>,
    pub b: DVector<f64>,
}

/// Dense ReLU classifier: ReLU after every layer but the last, argmax over
/// the final logits.
#[derive(Clone, Debug)]
pub struct ReluNet {
    layers: Vec<Layer>,
}

impl ReluNet {
    /// Layers must chain: each layer's input width equals the previous
    /// layer's output width.
    pub fn new(layers: Vec<Layer>) -> Self {
        assert!(!layers.is_empty(), "a classifier needs at least one layer");
        for l in &layers {
            assert_eq!(l.w.nrows(), l.b.len(), "bias width must match the layer");
        }
        for pair in layers.windows(2) {
            assert_eq!(pair[1].w.ncols(), pair[0].w.nrows(), "layer widths must chain");
        }
        Self { layers }
    }

    /// Input dimension.
    #[inline]
    pub fn dim(&self) -> usize {
        self.layers[0].w.ncols()
    }

    /// Number of output labels.
    #[inline]
    pub fn num_labels(&self) -> usize {
        self.layers[self.layers.len() - 1].w.nrows()
    }

    /// Total hidden units; equals the activation-key length.
    pub fn num_units(&self) -> usize {
        self.layers[..self.layers.len() - 1]
            .iter()
            .map(|l| l.w.nrows())
            .sum()
    }

    /// Raw logits at `x`.
    pub fn forward(&self, x: &DVector<f64>) -> DVector<f64> {
        let last = self.layers.len() - 1;
        let mut h = x.clone();
        for (i, layer) in self.layers.iter().enumerate() {
            let mut z = &layer.w * &h + &layer.b;
            if i < last {
                z.apply(|v| *v = v.max(0.0));
            }
            h = z;
        }
        h
    }

    /// Activation key at `x`: one bit per hidden unit in canonical order.
    pub fn activation_key(&self, x: &DVector<f64>) -> ActivationKey {
        let last = self.layers.len() - 1;
        let mut signs = Vec::with_capacity(self.num_units());
        let mut h = x.clone();
        for layer in &self.layers[..last] {
            let z = &layer.w * &h + &layer.b;
            for v in z.iter() {
                signs.push(*v > 0.0);
            }
            h = z.map(|v| v.max(0.0));
        }
        ActivationKey::from_signs(signs)
    }

    /// The polytope of the linear region named by `key`.
    pub fn polytope_for(&self, key: &ActivationKey) -> Polytope {
        let (a, b, _, _) = self.unroll(key);
        Polytope::with_key(a, b, key.clone())
    }

    /// Affine logits `x ↦ C x + d` valid on the region named by `key`.
    pub fn output_affine(&self, key: &ActivationKey) -> (DMatrix<f64>, DVector<f64>) {
        let (_, _, cw, cd) = self.unroll(key);
        (cw, cd)
    }

    /// Walk the layers once under `key`'s signs: collect the region's
    /// inequality rows and the composed output affine map.
    ///
    /// Sign convention per unit with pre-activation `a·x + c`:
    /// active (`z >= 0`) gives `-a·x <= c`, inactive gives `a·x <= -c`.
    fn unroll(
        &self,
        key: &ActivationKey,
    ) -> (DMatrix<f64>, DVector<f64>, DMatrix<f64>, DVector<f64>) {
        debug_assert_eq!(key.len(), self.num_units());
        let d = self.dim();
        let last = self.layers.len() - 1;
        let mut rows_a = DMatrix::<f64>::zeros(self.num_units(), d);
        let mut rows_b = DVector::<f64>::zeros(self.num_units());
        let mut m = DMatrix::<f64>::identity(d, d);
        let mut t = DVector::<f64>::zeros(d);
        let mut unit = 0usize;
        for layer in &self.layers[..last] {
            let zm = &layer.w * &m;
            let zt = &layer.w * &t + &layer.b;
            let width = zm.nrows();
            for i in 0..width {
                let active = key.get(unit);
                for j in 0..d {
                    rows_a[(unit, j)] = if active { -zm[(i, j)] } else { zm[(i, j)] };
                }
                rows_b[unit] = if active { zt[i] } else { -zt[i] };
                unit += 1;
            }
            // ReLU mask: inactive units contribute nothing downstream.
            let mut hm = zm;
            let mut ht = zt;
            let base = unit - width;
            for i in 0..width {
                if !key.get(base + i) {
                    for j in 0..d {
                        hm[(i, j)] = 0.0;
                    }
                    ht[i] = 0.0;
                }
            }
            m = hm;
            t = ht;
        }
        let out = &self.layers[last];
        let cw = &out.w * &m;
        let cd = &out.w * &t + &out.b;
        (rows_a, rows_b, cw, cd)
    }
}

impl RegionOracle for ReluNet {
    fn dim(&self) -> usize {
        ReluNet::dim(self)
    }

    fn classify(&self, x: &DVector<f64>) -> Result<usize, CertError> {
        let logits = self.forward(x);
        let mut best = 0usize;
        for (i, v) in logits.iter().enumerate() {
            if *v > logits[best] {
                best = i;
            }
        }
        Ok(best)
    }

    fn region_at(&self, x: &DVector<f64>) -> Result<(Polytope, ActivationKey), CertError> {
        let key = self.activation_key(x);
        Ok((self.polytope_for(&key), key))
    }

    fn decision_constraints(
        &self,
        key: &ActivationKey,
        label: usize,
    ) -> Result<Vec<Halfspace>, CertError> {
        let (cw, cd) = self.output_affine(key);
        let mut out = Vec::with_capacity(cw.nrows().saturating_sub(1));
        for j in 0..cw.nrows() {
            if j == label {
                continue;
            }
            // Label flips where logit_j overtakes logit_label.
            let n = (cw.row(j) - cw.row(label)).transpose();
            let c = cd[label] - cd[j];
            out.push(Halfspace::new(n, c));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    /// Two inputs passed through ReLU and then straight to two logits.
    fn identity_net() -> ReluNet {
        ReluNet::new(vec![
            Layer {
                w: DMatrix::identity(2, 2),
                b: DVector::zeros(2),
            },
            Layer {
                w: DMatrix::identity(2, 2),
                b: DVector::zeros(2),
            },
        ])
    }

    #[test]
    fn forward_matches_relu_by_hand() {
        let net = identity_net();
        let y = net.forward(&dvector![0.3, -0.4]);
        assert!((y[0] - 0.3).abs() < 1e-12);
        assert!(y[1].abs() < 1e-12);
    }

    #[test]
    fn key_tracks_preactivation_signs() {
        let net = identity_net();
        let key = net.activation_key(&dvector![0.3, -0.4]);
        assert!(key.get(0));
        assert!(!key.get(1));
    }

    #[test]
    fn region_rows_have_the_right_orientation() {
        let net = identity_net();
        let x = dvector![0.3, -0.4];
        let key = net.activation_key(&x);
        let poly = net.polytope_for(&key);
        assert_eq!(poly.num_constraints(), 2);
        // The defining point satisfies its own region strictly.
        assert!(poly.contains_eps(&x, 0.0));
        // A point with the opposite sign pattern does not.
        assert!(!poly.contains_eps(&dvector![-0.3, 0.4], -1e-12));
    }

    #[test]
    fn output_affine_agrees_with_forward() {
        let net = identity_net();
        let x = dvector![0.7, -0.2];
        let key = net.activation_key(&x);
        let (cw, cd) = net.output_affine(&key);
        let lin = cw * &x + cd;
        let fwd = net.forward(&x);
        assert!((lin - fwd).amax() < 1e-12);
    }

    #[test]
    fn decision_constraints_hold_inside_the_region() {
        let net = identity_net();
        let x = dvector![0.3, -0.4];
        let key = net.activation_key(&x);
        let label = net.classify(&x).unwrap();
        assert_eq!(label, 0);
        let planes = net.decision_constraints(&key, label).unwrap();
        assert_eq!(planes.len(), 1);
        // Inside the region the winning label's constraint is satisfied.
        assert!(planes[0].satisfies_eps(&x, 0.0));
    }
}
