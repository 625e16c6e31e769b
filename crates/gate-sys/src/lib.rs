//! Flat C ABI for the tensorGate inference boundary.
//!
//! This crate is the stable binary surface a managed host runtime drives:
//! flat `#[repr(C)]` structs, `tgate_*` functions, and a bounded error
//! record embedded in every result envelope. No panic unwinds out of this
//! crate; engine failures and panics are converted to status codes at the
//! call sites in `api`.
//!
//! # Memory ownership
//!
//! - Input tensors: host allocates, this crate reads (zero-copy), host owns.
//! - Output tensors: this crate allocates, host copies the data out, then
//!   releases them via [`tgate_free_forward_output`] — never through a
//!   host-side allocator.
//! - Model handles: this crate allocates; the host controls lifetime via
//!   [`tgate_dispose_model`].
//!
//! # Threading
//!
//! All functions are synchronous. A model handle supports at most one
//! in-flight call; distinct handles are independent and may be driven from
//! different threads concurrently.

#![allow(non_camel_case_types)]

use libc::{c_char, c_void, size_t};

mod api;
mod convert;
mod error;

pub use api::{
    tgate_dispose_model, tgate_dtype_name, tgate_dtype_size, tgate_forward,
    tgate_free_forward_output, tgate_load_model, tgate_shape_element_count, tgate_status_name,
    tgate_validate_tensor, tgate_version,
};
pub use convert::live_output_allocations;
pub use error::{clear_error, set_error};

// ── Contract constants ──────────────────────────────────────────────────
// Hard caps of the boundary, fixed at compile time. Oversized collections
// are rejected, never truncated; oversized strings are truncated, never
// overrun.

/// Maximum tensor rank.
pub const TGATE_MAX_TENSOR_DIMS: usize = gate_core::MAX_TENSOR_DIMS;

/// Maximum number of input tensors per forward call.
pub const TGATE_MAX_INPUTS: usize = gate_core::MAX_INPUTS;

/// Maximum number of output tensors per forward call.
pub const TGATE_MAX_OUTPUTS: usize = gate_core::MAX_OUTPUTS;

/// Error message capacity in bytes, including the NUL terminator.
pub const TGATE_ERROR_MESSAGE_MAX_LEN: usize = 256;

/// Tensor name capacity in bytes, including the NUL terminator.
pub const TGATE_TENSOR_NAME_MAX_LEN: usize = 64;

/// File path capacity in bytes, including the NUL terminator.
pub const TGATE_FILE_PATH_MAX_LEN: usize = 512;

// ── Status and error record ─────────────────────────────────────────────

/// Status codes reported over the boundary.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum tgate_status_t {
    /// Operation completed successfully.
    OK = 0,
    /// Model loading failed (bad program, engine init error).
    MODEL_LOAD = 1,
    /// Forward execution failed inside the engine.
    INFERENCE = 2,
    /// Tensor validation failed (shape, size, conversion).
    VALIDATION = 3,
    /// Allocation failed while building outputs.
    MEMORY = 4,
    /// File I/O failed (missing or unreadable path).
    IO = 5,
    /// Platform-specific failure.
    PLATFORM = 6,
    /// Null, disposed, or corrupted model handle.
    INVALID_HANDLE = 7,
    /// Null pointer or out-of-range argument.
    INVALID_ARGUMENT = 8,
}

/// Error record embedded in every result envelope.
///
/// Invariant: `code == OK` implies an empty message; any other code implies
/// a non-empty, NUL-terminated message.
#[repr(C)]
pub struct tgate_error_t {
    pub code: tgate_status_t,
    pub message: [c_char; TGATE_ERROR_MESSAGE_MAX_LEN],
}

impl tgate_error_t {
    /// A cleared (OK, empty-message) record.
    pub fn cleared() -> Self {
        Self {
            code: tgate_status_t::OK,
            message: [0; TGATE_ERROR_MESSAGE_MAX_LEN],
        }
    }
}

// ── Tensor descriptors ──────────────────────────────────────────────────

/// Element data types crossing the boundary. Mirrors `gate_core::DType`
/// value for value.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum tgate_dtype_t {
    F32 = 0,
    I32 = 1,
    I8 = 2,
    U8 = 3,
}

/// Tensor shape: `num_dims` leading entries of `dims` are meaningful.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct tgate_shape_t {
    pub num_dims: i32,
    pub dims: [i64; TGATE_MAX_TENSOR_DIMS],
}

/// Tensor descriptor passed across the boundary.
///
/// Ownership of `data` depends on direction: host-owned for inputs,
/// boundary-allocated (and freed via [`tgate_free_forward_output`]) for
/// outputs.
#[repr(C)]
pub struct tgate_tensor_t {
    pub shape: tgate_shape_t,
    pub dtype: tgate_dtype_t,
    pub data: *mut c_void,
    pub data_size: size_t,
    pub name: [c_char; TGATE_TENSOR_NAME_MAX_LEN],
}

/// Opaque model handle. Meaningful only to this crate; the host passes it
/// back without interpretation.
#[repr(C)]
pub struct tgate_model_t {
    _private: [u8; 0],
}

/// Result envelope for [`tgate_load_model`].
#[repr(C)]
pub struct tgate_load_result_t {
    pub error: tgate_error_t,
    /// Live handle on success, null on failure.
    pub model: *mut tgate_model_t,
    /// Echoed (truncated) model path, for diagnostics.
    pub file_path: [c_char; TGATE_FILE_PATH_MAX_LEN],
}

/// Input envelope for [`tgate_forward`].
#[repr(C)]
pub struct tgate_forward_input_t {
    pub num_inputs: i32,
    pub inputs: [*const tgate_tensor_t; TGATE_MAX_INPUTS],
}

/// Output envelope for [`tgate_forward`].
///
/// Slots may be null even on success: a non-tensor engine value keeps its
/// position as a null slot and is still counted in `num_outputs`, so hosts
/// must null-check each slot. On any error `num_outputs` is 0.
#[repr(C)]
pub struct tgate_forward_output_t {
    pub error: tgate_error_t,
    pub num_outputs: i32,
    pub outputs: [*mut tgate_tensor_t; TGATE_MAX_OUTPUTS],
}
