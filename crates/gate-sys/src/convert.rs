//! Tensor conversion between the flat descriptors and the engine types.
//!
//! The two directions are deliberately asymmetric:
//! - host → engine is zero-copy: the engine view borrows the host buffer,
//!   which must stay alive and unmutated until the call returns;
//! - engine → host is an owning deep copy: the engine tensor's backing
//!   memory is not guaranteed to outlive the call, so outputs get fresh
//!   boxed allocations that the host releases via
//!   `tgate_free_forward_output`.

use std::sync::atomic::{AtomicIsize, Ordering};

use libc::c_void;

use gate_core::validate::{check_data_size, check_dims, check_rank};
use gate_core::{DType, GateError, Result, Shape};
use gate_engine::{EngineTensor, ScalarType, TensorView};

use crate::{
    TGATE_MAX_TENSOR_DIMS, TGATE_TENSOR_NAME_MAX_LEN, tgate_dtype_t, tgate_shape_t, tgate_tensor_t,
};

// Live count of output allocations (descriptor structs plus data buffers).
// The partial-failure tests use this to prove that an aborted conversion
// releases everything it allocated.
static LIVE_OUTPUT_ALLOCS: AtomicIsize = AtomicIsize::new(0);

/// Number of currently live output allocations (descriptor structs and data
/// buffers) handed out by forward calls and not yet freed.
pub fn live_output_allocations() -> isize {
    LIVE_OUTPUT_ALLOCS.load(Ordering::SeqCst)
}

// ── Type mapping ────────────────────────────────────────────────────────

pub(crate) fn dtype_from_abi(dtype: tgate_dtype_t) -> DType {
    match dtype {
        tgate_dtype_t::F32 => DType::F32,
        tgate_dtype_t::I32 => DType::I32,
        tgate_dtype_t::I8 => DType::I8,
        tgate_dtype_t::U8 => DType::U8,
    }
}

pub(crate) fn dtype_to_abi(dtype: DType) -> tgate_dtype_t {
    match dtype {
        DType::F32 => tgate_dtype_t::F32,
        DType::I32 => tgate_dtype_t::I32,
        DType::I8 => tgate_dtype_t::I8,
        DType::U8 => tgate_dtype_t::U8,
    }
}

/// Engine scalar tag for a boundary dtype. Total: every boundary dtype has
/// an engine representation.
pub(crate) fn scalar_of_dtype(dtype: DType) -> ScalarType {
    match dtype {
        DType::F32 => ScalarType::F32,
        DType::I32 => ScalarType::I32,
        DType::I8 => ScalarType::I8,
        DType::U8 => ScalarType::U8,
    }
}

/// Boundary dtype for an engine scalar tag. Partial: the engine's type
/// space is wider, and an unmappable tag aborts output conversion rather
/// than guessing a representation.
pub(crate) fn dtype_of_scalar(scalar: ScalarType) -> Option<DType> {
    match scalar {
        ScalarType::F32 => Some(DType::F32),
        ScalarType::I32 => Some(DType::I32),
        ScalarType::I8 => Some(DType::I8),
        ScalarType::U8 => Some(DType::U8),
        ScalarType::F16 | ScalarType::BF16 | ScalarType::I64 | ScalarType::Bool => None,
    }
}

// ── Validation ──────────────────────────────────────────────────────────

/// Validate a descriptor and return its materialized shape.
///
/// Check order matters: rank bound (the raw count may exceed what the dims
/// array can represent), then dimension positivity, then the data pointer,
/// then the size law — size recomputation is meaningless on a bad shape.
pub(crate) fn validate_tensor(tensor: &tgate_tensor_t) -> Result<Shape> {
    check_rank(i64::from(tensor.shape.num_dims))?;
    let ndim = tensor.shape.num_dims as usize;
    let shape = Shape::new(tensor.shape.dims[..ndim].iter().copied());
    check_dims(&shape)?;
    if tensor.data.is_null() {
        return Err(GateError::InvalidArgument(
            "tensor data pointer is NULL".into(),
        ));
    }
    check_data_size(&shape, dtype_from_abi(tensor.dtype), tensor.data_size)?;
    Ok(shape)
}

// ── Host → engine (zero-copy) ───────────────────────────────────────────

/// Build an engine view over a validated descriptor's buffer. No bytes are
/// copied; the view aliases the host allocation.
///
/// # Safety
/// `tensor.data` must point to `tensor.data_size` readable bytes that stay
/// alive and unmutated for the lifetime of the returned view.
pub(crate) unsafe fn view_from_tensor<'a>(tensor: &'a tgate_tensor_t) -> Result<TensorView<'a>> {
    let shape = validate_tensor(tensor)?;
    let dtype = dtype_from_abi(tensor.dtype);
    // SAFETY: non-null and correctly sized per the validation above plus
    // the caller's lifetime contract.
    let data =
        unsafe { std::slice::from_raw_parts(tensor.data as *const u8, tensor.data_size) };
    Ok(TensorView {
        scalar_type: scalar_of_dtype(dtype),
        dims: shape.0.to_vec(),
        data,
    })
}

// ── Engine → host (owning deep copy) ────────────────────────────────────

/// Convert an engine tensor into a heap-allocated descriptor.
///
/// Returns `None` when the scalar type has no boundary representation; the
/// caller treats that like an allocation failure and unwinds the whole
/// output set. Rank above the cap is clamped — dims and count together, so
/// the descriptor stays self-consistent — which callers must treat as a
/// design limitation of the boundary.
pub(crate) fn tensor_from_engine(tensor: &EngineTensor) -> Option<*mut tgate_tensor_t> {
    let dtype = dtype_of_scalar(tensor.scalar_type)?;

    let ndim = tensor.dims.len().min(TGATE_MAX_TENSOR_DIMS);
    let mut shape = tgate_shape_t {
        num_dims: ndim as i32,
        dims: [0; TGATE_MAX_TENSOR_DIMS],
    };
    shape.dims[..ndim].copy_from_slice(&tensor.dims[..ndim]);

    let data_size =
        Shape::new(tensor.dims[..ndim].iter().copied()).element_count() * dtype.size_bytes();

    let data = if data_size > 0 {
        let mut buf = vec![0u8; data_size].into_boxed_slice();
        let n = data_size.min(tensor.data.len());
        buf[..n].copy_from_slice(&tensor.data[..n]);
        LIVE_OUTPUT_ALLOCS.fetch_add(1, Ordering::SeqCst);
        Box::into_raw(buf) as *mut c_void
    } else {
        std::ptr::null_mut()
    };

    let out = Box::new(tgate_tensor_t {
        shape,
        dtype: dtype_to_abi(dtype),
        data,
        data_size,
        name: [0; TGATE_TENSOR_NAME_MAX_LEN],
    });
    LIVE_OUTPUT_ALLOCS.fetch_add(1, Ordering::SeqCst);
    Some(Box::into_raw(out))
}

/// Free a descriptor previously produced by `tensor_from_engine`: data
/// buffer first, then the descriptor itself. Null is a no-op.
///
/// # Safety
/// `tensor` must be null or a pointer from `tensor_from_engine` that has
/// not been freed yet.
pub(crate) unsafe fn free_output_tensor(tensor: *mut tgate_tensor_t) {
    if tensor.is_null() {
        return;
    }
    // SAFETY: caller contract — the pointer came from Box::into_raw in
    // tensor_from_engine and is freed exactly once.
    let boxed = unsafe { Box::from_raw(tensor) };
    if !boxed.data.is_null() {
        let slice = std::ptr::slice_from_raw_parts_mut(boxed.data as *mut u8, boxed.data_size);
        // SAFETY: data was allocated as a boxed slice of data_size bytes.
        drop(unsafe { Box::from_raw(slice) });
        LIVE_OUTPUT_ALLOCS.fetch_sub(1, Ordering::SeqCst);
    }
    LIVE_OUTPUT_ALLOCS.fetch_sub(1, Ordering::SeqCst);
}
