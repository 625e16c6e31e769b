//! Property tests for the tensor layout laws.
//!
//! These use proptest to generate random shapes and dtypes and verify the
//! invariants the validator must hold for any input.

use gate_core::validate::{check_data_size, check_dims, check_rank, expected_data_size};
use gate_core::{DType, MAX_TENSOR_DIMS, Shape};
use proptest::prelude::*;

// ── Strategies ───────────────────────────────────────────────────────────

/// Generate a random dimension value (1..=16 to keep products small).
fn dim() -> impl Strategy<Value = i64> {
    1i64..=16
}

/// Generate a valid shape with rank 1..=MAX_TENSOR_DIMS.
fn valid_shape() -> impl Strategy<Value = Shape> {
    prop::collection::vec(dim(), 1..=MAX_TENSOR_DIMS).prop_map(Shape::new)
}

/// Generate a random DType.
fn arb_dtype() -> impl Strategy<Value = DType> {
    prop_oneof![
        Just(DType::F32),
        Just(DType::I32),
        Just(DType::I8),
        Just(DType::U8),
    ]
}

// ── Layout law property tests ────────────────────────────────────────────

proptest! {
    /// The size law: element count times element width is the accepted size.
    #[test]
    fn size_law_holds(shape in valid_shape(), dtype in arb_dtype()) {
        let size = shape.element_count() * dtype.size_bytes();
        prop_assert_eq!(expected_data_size(&shape, dtype), size);
        prop_assert!(check_data_size(&shape, dtype, size).is_ok());
    }

    /// Any nonzero deviation from the expected size is rejected.
    #[test]
    fn size_off_by_any_amount_rejected(
        shape in valid_shape(),
        dtype in arb_dtype(),
        delta in 1usize..=4096,
    ) {
        let expected = expected_data_size(&shape, dtype);
        prop_assert!(check_data_size(&shape, dtype, expected + delta).is_err());
        if expected >= delta {
            prop_assert!(check_data_size(&shape, dtype, expected - delta).is_err());
        }
    }

    /// Every valid shape passes the structural check.
    #[test]
    fn valid_shapes_accepted(shape in valid_shape()) {
        prop_assert!(check_dims(&shape).is_ok());
        prop_assert!(shape.element_count() > 0);
    }

    /// Poisoning any single dimension with a non-positive value is rejected
    /// and the element count collapses to zero.
    #[test]
    fn nonpositive_dim_rejected(
        shape in valid_shape(),
        idx in any::<prop::sample::Index>(),
        bad in -4i64..=0,
    ) {
        let mut dims: Vec<i64> = shape.0.to_vec();
        let i = idx.index(dims.len());
        dims[i] = bad;
        let poisoned = Shape::new(dims);
        prop_assert!(check_dims(&poisoned).is_err());
        prop_assert_eq!(poisoned.element_count(), 0);
    }

    /// Ranks outside [1, MAX_TENSOR_DIMS] are rejected.
    #[test]
    fn out_of_range_rank_rejected(extra in 1i64..=8) {
        prop_assert!(check_rank(0).is_err());
        prop_assert!(check_rank(MAX_TENSOR_DIMS as i64 + extra).is_err());
    }

    /// element_count is invariant under dim permutation (it is a product).
    #[test]
    fn element_count_order_independent(shape in valid_shape()) {
        let mut dims: Vec<i64> = shape.0.to_vec();
        dims.reverse();
        prop_assert_eq!(Shape::new(dims).element_count(), shape.element_count());
    }
}
