//! Bounded error records: set, clear, status mapping, static names.
//!
//! Records are written in place, never allocated, and hold at most one
//! failure per operation (first failure wins — callers return immediately
//! after setting one). Messages are truncated to the record's capacity and
//! are always NUL-terminated.

use std::ffi::CStr;
use std::fmt::Display;

use libc::c_char;

use gate_core::GateError;

use crate::{tgate_error_t, tgate_status_t};

/// Reset a record to OK with an empty message.
pub fn clear_error(error: &mut tgate_error_t) {
    error.code = tgate_status_t::OK;
    error.message[0] = 0;
}

/// Write a status and a pre-rendered message into a record.
pub fn set_error(error: &mut tgate_error_t, code: tgate_status_t, message: impl Display) {
    error.code = code;
    write_bounded(&mut error.message, &message.to_string());
}

/// Record a boundary error: status from the variant, text from `Display`.
pub(crate) fn set_gate_error(error: &mut tgate_error_t, err: &GateError) {
    set_error(error, status_of(err), err);
}

/// Copy a string into a bounded C buffer, truncating and NUL-terminating.
pub(crate) fn write_bounded(buf: &mut [c_char], text: &str) {
    let max_copy = buf.len().saturating_sub(1);
    let to_copy = text.len().min(max_copy);
    for (dst, &src) in buf.iter_mut().zip(text.as_bytes()[..to_copy].iter()) {
        *dst = src as c_char;
    }
    buf[to_copy] = 0;
}

/// Wire status for a boundary error variant.
pub(crate) fn status_of(err: &GateError) -> tgate_status_t {
    match err {
        GateError::ModelLoad(_) => tgate_status_t::MODEL_LOAD,
        GateError::Inference(_) => tgate_status_t::INFERENCE,
        GateError::Validation(_) => tgate_status_t::VALIDATION,
        GateError::Memory(_) => tgate_status_t::MEMORY,
        GateError::Io(_) => tgate_status_t::IO,
        GateError::Platform(_) => tgate_status_t::PLATFORM,
        GateError::InvalidHandle(_) => tgate_status_t::INVALID_HANDLE,
        GateError::InvalidArgument(_) => tgate_status_t::INVALID_ARGUMENT,
    }
}

/// Static name for a status code.
pub(crate) fn status_name(code: tgate_status_t) -> &'static CStr {
    match code {
        tgate_status_t::OK => c"TGATE_OK",
        tgate_status_t::MODEL_LOAD => c"TGATE_MODEL_LOAD",
        tgate_status_t::INFERENCE => c"TGATE_INFERENCE",
        tgate_status_t::VALIDATION => c"TGATE_VALIDATION",
        tgate_status_t::MEMORY => c"TGATE_MEMORY",
        tgate_status_t::IO => c"TGATE_IO",
        tgate_status_t::PLATFORM => c"TGATE_PLATFORM",
        tgate_status_t::INVALID_HANDLE => c"TGATE_INVALID_HANDLE",
        tgate_status_t::INVALID_ARGUMENT => c"TGATE_INVALID_ARGUMENT",
    }
}

#[cfg(test)]
pub(crate) fn message_str(error: &tgate_error_t) -> &str {
    // Test helper: the record invariant guarantees NUL termination.
    unsafe { CStr::from_ptr(error.message.as_ptr()) }
        .to_str()
        .expect("error messages are UTF-8")
}
