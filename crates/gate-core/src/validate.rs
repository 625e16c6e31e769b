//! Layout validation for tensors arriving at the boundary.
//!
//! These are pure predicates plus diagnostics: nothing here mutates the
//! tensor. Structural checks run before the size check, since the expected
//! size of an invalid shape is meaningless. Pointer-level checks (null
//! descriptor, null data) belong to the C surface in `gate-sys` and run
//! before any of this is trusted.

use crate::types::{DType, MAX_TENSOR_DIMS, Shape};
use crate::{GateError, Result};

/// Rank bound check, usable before a shape can even be materialized from a
/// raw descriptor.
pub fn check_rank(ndim: i64) -> Result<()> {
    if ndim < 1 || ndim > MAX_TENSOR_DIMS as i64 {
        return Err(GateError::Validation(format!(
            "invalid number of dimensions: {ndim} (must be 1-{MAX_TENSOR_DIMS})"
        )));
    }
    Ok(())
}

/// Structural check: rank within bounds and every dimension strictly
/// positive. The error names the offending index and value.
pub fn check_dims(shape: &Shape) -> Result<()> {
    check_rank(shape.ndim() as i64)?;
    for (i, &dim) in shape.0.iter().enumerate() {
        if dim <= 0 {
            return Err(GateError::Validation(format!(
                "invalid dimension size at index {i}: {dim} (must be > 0)"
            )));
        }
    }
    Ok(())
}

/// Expected byte length of a tensor with the given layout.
pub fn expected_data_size(shape: &Shape, dtype: DType) -> usize {
    shape.element_count() * dtype.size_bytes()
}

/// Size consistency check: the stated byte length must equal the length
/// recomputed from shape and dtype. Call only on a shape that passed
/// `check_dims`.
pub fn check_data_size(shape: &Shape, dtype: DType, data_size: usize) -> Result<()> {
    let expected = expected_data_size(shape, dtype);
    if data_size != expected {
        return Err(GateError::Validation(format!(
            "tensor data size mismatch: got {data_size} bytes, expected {expected} bytes"
        )));
    }
    Ok(())
}
