//! Property-based tests for the transform algebra.
//!
//! Run with: cargo test -p arbor-spatial -- proptest

use approx::relative_eq;
use arbor_spatial::transform::{
    Transform, adjoint, iadjoint, inv, is_homogeneous_matrix, rotzyx, transl, z_aligned,
};
use arbor_spatial::twist::{Twist, exp};
use nalgebra::{Matrix6, Vector3};
use proptest::prelude::*;

// =============================================================================
// Strategies
// =============================================================================

fn arb_angles() -> impl Strategy<Value = [f64; 3]> {
    prop::array::uniform3(-3.1..3.1f64)
}

fn arb_translation() -> impl Strategy<Value = [f64; 3]> {
    prop::array::uniform3(-10.0..10.0f64)
}

fn arb_transform() -> impl Strategy<Value = Transform> {
    (arb_angles(), arb_translation())
        .prop_map(|([az, ay, ax], [x, y, z])| transl(x, y, z) * rotzyx(az, ay, ax))
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_inverse_is_involutive(h in arb_transform()) {
        prop_assert!(relative_eq!(inv(&inv(&h)), h, epsilon = 1e-12));
    }

    #[test]
    fn proptest_inverse_cancels(h in arb_transform()) {
        prop_assert!(relative_eq!(h * inv(&h), Transform::identity(), epsilon = 1e-12));
    }

    #[test]
    fn proptest_iadjoint_is_adjoint_of_inverse(h in arb_transform()) {
        prop_assert!(relative_eq!(adjoint(&inv(&h)), iadjoint(&h), epsilon = 1e-12));
        prop_assert!(relative_eq!(adjoint(&h) * iadjoint(&h), Matrix6::identity(), epsilon = 1e-10));
    }

    #[test]
    fn proptest_constructed_transforms_are_rigid(h in arb_transform()) {
        prop_assert!(is_homogeneous_matrix(&h, 1e-9));
    }

    #[test]
    fn proptest_exp_is_rigid(v in prop::array::uniform6(-2.0..2.0f64)) {
        let h = exp(&Twist::from_row_slice(&v));
        prop_assert!(is_homogeneous_matrix(&h, 1e-9));
    }

    #[test]
    fn proptest_z_aligned_has_requested_axis(v in arb_translation()) {
        let n = Vector3::from(v);
        prop_assume!(n.norm() > 1e-3);
        let n = n.normalize();
        let h = z_aligned(&n).unwrap();
        prop_assert!(is_homogeneous_matrix(&h, 1e-9));
        prop_assert!(relative_eq!(h.fixed_view::<3, 1>(0, 2).into_owned(), n, epsilon = 1e-12));
    }
}
