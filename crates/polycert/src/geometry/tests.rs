use super::*;
use crate::error::GeomError;
use crate::instances::axis_box;
use nalgebra::{dmatrix, dvector};
use proptest::prelude::*;
use std::rc::Rc;

#[test]
fn canonical_form_fixes_scale_and_sign() {
    let h = Halfspace::new(dvector![-2.0, 0.0], -4.0);
    let c = h.canonicalized(1e-12).unwrap();
    assert!((c.n[0] - 1.0).abs() < 1e-12);
    assert!(c.n[1].abs() < 1e-12);
    assert!((c.c - 2.0).abs() < 1e-12);

    let zero = Halfspace::new(dvector![0.0, 0.0], 1.0);
    assert!(matches!(
        zero.canonicalized(1e-12),
        Err(GeomError::DegenerateHyperplane { .. })
    ));
}

#[test]
fn square_facets_are_feasibility_filtered() {
    let cfg = GeomCfg::default();
    // Unit square plus a redundant constraint x <= 5 and a degenerate row.
    let a = dmatrix![
        1.0, 0.0;
        -1.0, 0.0;
        0.0, 1.0;
        0.0, -1.0;
        1.0, 0.0;
        0.0, 0.0
    ];
    let b = dvector![1.0, 0.0, 1.0, 0.0, 5.0, 1.0];
    let poly = Rc::new(Polytope::new(a, b));
    let facets = generate_facets(&poly, &cfg, true).unwrap();
    let indices: Vec<usize> = facets.iter().map(|f| f.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    for f in &facets {
        assert!(f.interior.is_some());
    }
}

#[test]
fn facet_witness_sits_on_the_plane_inside_the_region() {
    let cfg = GeomCfg::default();
    let poly = Rc::new(axis_box(&[0.0, 0.0], &[1.0, 1.0]));
    let facets = generate_facets(&poly, &cfg, true).unwrap();
    let right = &facets[0]; // row 0: x <= 1
    let w = right.interior.as_ref().unwrap();
    assert!((w[0] - 1.0).abs() < 1e-8);
    assert!((w[1] - 0.5).abs() < 1e-8);
    assert!(right.plane.eval(w).abs() < 1e-8);
    assert!(poly.contains_eps(w, 1e-8));
}

#[test]
fn estimate_equals_exact_when_the_projection_stays_on_the_facet() {
    let cfg = GeomCfg::default();
    let poly = Rc::new(axis_box(&[0.0, 0.0], &[1.0, 1.0]));
    let facets = generate_facets(&poly, &cfg, true).unwrap();
    let x = dvector![0.2, 0.5];
    let est = facets[0].linf_dist(&x, DistMode::Estimate, &cfg).unwrap();
    let exact = facets[0].linf_dist(&x, DistMode::Exact, &cfg).unwrap();
    assert!((est - 0.8).abs() < 1e-8);
    assert!((exact - 0.8).abs() < 1e-8);
}

#[test]
fn estimate_is_strictly_below_exact_past_the_facet_extent() {
    let cfg = GeomCfg::default();
    // Triangle {x + y <= 2, y >= 1, x >= 0}; its hypotenuse facet spans
    // (1, 1) to (0, 2).
    let a = dmatrix![1.0, 1.0; 0.0, -1.0; -1.0, 0.0];
    let b = dvector![2.0, -1.0, 0.0];
    let poly = Rc::new(Polytope::new(a, b));
    let facets = generate_facets(&poly, &cfg, true).unwrap();
    let hyp = facets.iter().find(|f| f.index == 0).unwrap();
    // (2, 0) lies on the unrestricted hyperplane but far from the facet.
    let x = dvector![2.0, 0.0];
    let est = hyp.linf_dist(&x, DistMode::Estimate, &cfg).unwrap();
    let exact = hyp.linf_dist(&x, DistMode::Exact, &cfg).unwrap();
    assert!(est.abs() < 1e-8);
    assert!((exact - 1.0).abs() < 1e-8);
}

#[test]
fn emptiness_is_detectable() {
    let cfg = GeomCfg::default();
    let empty = Polytope::new(dmatrix![1.0; -1.0], dvector![0.0, -1.0]);
    assert!(empty.is_empty(&cfg).unwrap());
    let square = axis_box(&[0.0, 0.0], &[1.0, 1.0]);
    assert!(!square.is_empty(&cfg).unwrap());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Estimate-mode distances are lower bounds for exact-mode distances.
    #[test]
    fn estimate_never_exceeds_exact(
        lo in prop::array::uniform2(-2.0f64..0.0),
        hi in prop::array::uniform2(0.5f64..2.0),
        q in prop::array::uniform2(-3.0f64..3.0),
    ) {
        let cfg = GeomCfg::default();
        let poly = Rc::new(axis_box(&lo, &hi));
        let x = dvector![q[0], q[1]];
        for f in generate_facets(&poly, &cfg, true).unwrap() {
            let est = f.linf_dist(&x, DistMode::Estimate, &cfg).unwrap();
            let exact = f.linf_dist(&x, DistMode::Exact, &cfg).unwrap();
            prop_assert!(est <= exact + 1e-9);
        }
    }
}
