//! Exported boundary functions: model lifecycle, forward, utilities.
//!
//! Every fallible function returns its outcome by value in a result
//! envelope; nothing unwinds across the boundary. The engine is invoked in
//! exactly two places (load and forward), and both run under
//! `catch_unwind` so a panicking module surfaces as a status code instead
//! of aborting the host process.

use std::any::Any;
use std::ffi::CStr;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use libc::{c_char, size_t};
use tracing::debug;

use gate_core::{GateError, Shape, platform};
use gate_engine::{LoadMode, Module, Value};

use crate::convert::{
    dtype_from_abi, free_output_tensor, tensor_from_engine, validate_tensor, view_from_tensor,
};
use crate::error::{clear_error, set_error, set_gate_error, status_name, write_bounded};
use crate::{
    TGATE_FILE_PATH_MAX_LEN, TGATE_MAX_INPUTS, TGATE_MAX_OUTPUTS, TGATE_MAX_TENSOR_DIMS,
    tgate_dtype_t, tgate_error_t, tgate_forward_input_t, tgate_forward_output_t,
    tgate_load_result_t, tgate_model_t, tgate_shape_t, tgate_status_t, tgate_tensor_t,
};

/// Backing state for an opaque model handle.
pub(crate) struct ModelData {
    pub(crate) module: Box<dyn Module>,
    pub(crate) file_path: String,
}

// ── Debug liveness registry ─────────────────────────────────────────────
// Debug builds track live handle addresses so use-after-dispose and
// double-dispose are detected instead of undefined. Release builds do no
// tracking and take no lock on the inference path.

#[cfg(debug_assertions)]
mod liveness {
    use std::collections::HashSet;
    use std::sync::LazyLock;

    use parking_lot::Mutex;

    static LIVE: LazyLock<Mutex<HashSet<usize>>> = LazyLock::new(|| Mutex::new(HashSet::new()));

    pub(super) fn insert(addr: usize) {
        LIVE.lock().insert(addr);
    }

    pub(super) fn remove(addr: usize) -> bool {
        LIVE.lock().remove(&addr)
    }

    pub(super) fn contains(addr: usize) -> bool {
        LIVE.lock().contains(&addr)
    }
}

/// Move model state onto the heap and hand out its address as the opaque
/// handle.
pub(crate) fn install_model(data: ModelData) -> *mut tgate_model_t {
    let ptr = Box::into_raw(Box::new(data)) as *mut tgate_model_t;
    #[cfg(debug_assertions)]
    liveness::insert(ptr as usize);
    ptr
}

/// Best-effort text of a panic payload.
fn panic_text(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

// ── Model lifecycle ─────────────────────────────────────────────────────

/// Load a model from a NUL-terminated UTF-8 path.
///
/// On success the result carries a live handle (release it with
/// [`tgate_dispose_model`]) and the echoed, truncated path. On failure the
/// handle is null and `error` names the cause: `INVALID_ARGUMENT` for a
/// bad path argument, `IO` for a missing or unreadable file, `MODEL_LOAD`
/// for an engine initialization failure.
///
/// # Safety
/// `file_path` must be null or a valid NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tgate_load_model(file_path: *const c_char) -> tgate_load_result_t {
    let mut result = tgate_load_result_t {
        error: tgate_error_t::cleared(),
        model: std::ptr::null_mut(),
        file_path: [0; TGATE_FILE_PATH_MAX_LEN],
    };

    if file_path.is_null() {
        set_error(
            &mut result.error,
            tgate_status_t::INVALID_ARGUMENT,
            "file_path is NULL",
        );
        return result;
    }
    // SAFETY: non-null and NUL-terminated per the caller contract.
    let path = match unsafe { CStr::from_ptr(file_path) }.to_str() {
        Ok(p) => p,
        Err(_) => {
            set_error(
                &mut result.error,
                tgate_status_t::INVALID_ARGUMENT,
                "file_path is not valid UTF-8",
            );
            return result;
        }
    };

    if !platform::file_exists(Path::new(path)) {
        set_error(
            &mut result.error,
            tgate_status_t::IO,
            format_args!("model file not found: {path}"),
        );
        return result;
    }
    if !platform::file_readable(Path::new(path)) {
        set_error(
            &mut result.error,
            tgate_status_t::IO,
            format_args!("model file not readable: {path}"),
        );
        return result;
    }

    // Engine init: open memory-mapped, then program load, then entry-point
    // load. A failure in either step releases the partially constructed
    // module by dropping it. Panics stop here.
    let loaded = panic::catch_unwind(AssertUnwindSafe(
        || -> gate_core::Result<Box<dyn Module>> {
            let mut module = gate_engine::open(Path::new(path), LoadMode::Mmap)
                .map_err(|e| GateError::ModelLoad(format!("failed to open module: {e}")))?;
            module.load().map_err(|e| {
                GateError::ModelLoad(format!("failed to load program: engine code {}", e.code))
            })?;
            module.load_entry_point().map_err(|e| {
                GateError::ModelLoad(format!(
                    "failed to load entry point: engine code {}",
                    e.code
                ))
            })?;
            Ok(module)
        },
    ));

    match loaded {
        Ok(Ok(module)) => {
            result.model = install_model(ModelData {
                module,
                file_path: path.to_string(),
            });
            write_bounded(&mut result.file_path, path);
            debug!(path, "model loaded");
        }
        Ok(Err(err)) => set_gate_error(&mut result.error, &err),
        Err(payload) => set_error(
            &mut result.error,
            tgate_status_t::MODEL_LOAD,
            format_args!("panic during model load: {}", panic_text(payload.as_ref())),
        ),
    }
    result
}

/// Dispose a model handle and free its resources. Null is a safe no-op.
///
/// The handle is invalid afterwards. Double-dispose is undefined in
/// release builds; debug builds detect and ignore it.
///
/// # Safety
/// `model` must be null or a handle from [`tgate_load_model`] that has not
/// been disposed.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tgate_dispose_model(model: *mut tgate_model_t) {
    if model.is_null() {
        return;
    }
    #[cfg(debug_assertions)]
    if !liveness::remove(model as usize) {
        debug!("ignoring dispose of a non-live model handle");
        return;
    }
    // SAFETY: the pointer originated from install_model and is live.
    let data = unsafe { Box::from_raw(model as *mut ModelData) };
    debug!(path = %data.file_path, "model disposed");
}

// ── Forward ─────────────────────────────────────────────────────────────

/// Run a forward pass over an ordered set of input tensors.
///
/// Input buffers are borrowed for the duration of the call and never
/// mutated or freed; they must stay alive until this returns. Output
/// tensors are allocated by this call and must be released with
/// [`tgate_free_forward_output`]. On any error `num_outputs` is 0 and no
/// output memory remains allocated — partial results are never returned.
///
/// # Safety
/// `model` must be null or a live handle; `input` must be null or a valid
/// envelope whose first `num_inputs` entries point to valid tensors.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tgate_forward(
    model: *mut tgate_model_t,
    input: *const tgate_forward_input_t,
) -> tgate_forward_output_t {
    let mut output = tgate_forward_output_t {
        error: tgate_error_t::cleared(),
        num_outputs: 0,
        outputs: [std::ptr::null_mut(); TGATE_MAX_OUTPUTS],
    };

    if model.is_null() {
        set_error(
            &mut output.error,
            tgate_status_t::INVALID_HANDLE,
            "model handle is NULL",
        );
        return output;
    }
    #[cfg(debug_assertions)]
    if !liveness::contains(model as usize) {
        set_error(
            &mut output.error,
            tgate_status_t::INVALID_HANDLE,
            "model handle is not live (disposed or never loaded)",
        );
        return output;
    }
    if input.is_null() {
        set_error(
            &mut output.error,
            tgate_status_t::INVALID_ARGUMENT,
            "input is NULL",
        );
        return output;
    }
    // SAFETY: non-null per the check above.
    let input = unsafe { &*input };
    if input.num_inputs <= 0 {
        set_error(
            &mut output.error,
            tgate_status_t::INVALID_ARGUMENT,
            "input has no tensors",
        );
        return output;
    }
    if input.num_inputs as usize > TGATE_MAX_INPUTS {
        set_error(
            &mut output.error,
            tgate_status_t::INVALID_ARGUMENT,
            format_args!(
                "too many inputs: {} (limit {TGATE_MAX_INPUTS})",
                input.num_inputs
            ),
        );
        return output;
    }

    // Converting inputs: in order, first failure aborts and names the
    // failing index. No engine call happens on invalid input.
    let mut views = Vec::with_capacity(input.num_inputs as usize);
    for i in 0..input.num_inputs as usize {
        let tensor = input.inputs[i];
        if tensor.is_null() {
            set_error(
                &mut output.error,
                tgate_status_t::VALIDATION,
                format_args!("input tensor {i} is NULL"),
            );
            return output;
        }
        // SAFETY: non-null; the buffer outlives this call per the input
        // ownership contract.
        match unsafe { view_from_tensor(&*tensor) } {
            Ok(view) => views.push(view),
            Err(err) => {
                set_error(
                    &mut output.error,
                    tgate_status_t::VALIDATION,
                    format_args!("failed to convert input tensor {i}: {err}"),
                );
                return output;
            }
        }
    }

    // SAFETY: liveness was checked above; the handle contract allows one
    // in-flight call, so the exclusive borrow is sound.
    let model_data = unsafe { &mut *(model as *mut ModelData) };

    // Executing: the single place engine panics are absorbed.
    let forward_result =
        panic::catch_unwind(AssertUnwindSafe(|| model_data.module.forward(&views)));

    let values = match forward_result {
        Ok(Ok(values)) => values,
        Ok(Err(err)) => {
            set_error(
                &mut output.error,
                tgate_status_t::INFERENCE,
                format_args!("forward pass failed: engine code {}", err.code),
            );
            return output;
        }
        Err(payload) => {
            set_error(
                &mut output.error,
                tgate_status_t::INFERENCE,
                format_args!(
                    "panic during forward pass: {}",
                    panic_text(payload.as_ref())
                ),
            );
            return output;
        }
    };

    if values.len() > TGATE_MAX_OUTPUTS {
        set_error(
            &mut output.error,
            tgate_status_t::INFERENCE,
            format_args!(
                "model produced {} outputs (limit {TGATE_MAX_OUTPUTS})",
                values.len()
            ),
        );
        return output;
    }

    // Converting outputs: all-or-nothing. A failed slot frees everything
    // allocated before it in this same call. Non-tensor values keep their
    // position as a counted null slot.
    for (i, value) in values.iter().enumerate() {
        let Value::Tensor(tensor) = value else {
            continue;
        };
        match tensor_from_engine(tensor) {
            Some(ptr) => output.outputs[i] = ptr,
            None => {
                for slot in &mut output.outputs[..i] {
                    // SAFETY: slots hold null or pointers allocated above.
                    unsafe { free_output_tensor(*slot) };
                    *slot = std::ptr::null_mut();
                }
                set_error(
                    &mut output.error,
                    tgate_status_t::MEMORY,
                    format_args!("failed to allocate output tensor {i}"),
                );
                return output;
            }
        }
    }
    output.num_outputs = values.len() as i32;
    output
}

/// Free output tensors produced by [`tgate_forward`]. Null is a safe
/// no-op.
///
/// Frees each slot's data buffer, then its descriptor, in order; nulls the
/// slots and resets the count, so calling this twice on the same envelope
/// is safe.
///
/// # Safety
/// `output` must be null or an envelope whose slots were populated by
/// [`tgate_forward`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tgate_free_forward_output(output: *mut tgate_forward_output_t) {
    if output.is_null() {
        return;
    }
    // SAFETY: non-null per the check above.
    let output = unsafe { &mut *output };
    let count = (output.num_outputs.max(0) as usize).min(TGATE_MAX_OUTPUTS);
    for slot in &mut output.outputs[..count] {
        // SAFETY: slots hold null or live pointers from tgate_forward.
        unsafe { free_output_tensor(*slot) };
        *slot = std::ptr::null_mut();
    }
    output.num_outputs = 0;
}

// ── Utilities ───────────────────────────────────────────────────────────

/// Size in bytes of one element of `dtype`.
#[unsafe(no_mangle)]
pub extern "C" fn tgate_dtype_size(dtype: tgate_dtype_t) -> size_t {
    dtype_from_abi(dtype).size_bytes()
}

/// Static lowercase name of `dtype`.
#[unsafe(no_mangle)]
pub extern "C" fn tgate_dtype_name(dtype: tgate_dtype_t) -> *const c_char {
    let name = match dtype {
        tgate_dtype_t::F32 => c"float32",
        tgate_dtype_t::I32 => c"int32",
        tgate_dtype_t::I8 => c"int8",
        tgate_dtype_t::U8 => c"uint8",
    };
    name.as_ptr()
}

/// Number of elements described by `shape`; 0 for a null or invalid shape.
///
/// # Safety
/// `shape` must be null or a valid shape pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tgate_shape_element_count(shape: *const tgate_shape_t) -> size_t {
    if shape.is_null() {
        return 0;
    }
    // SAFETY: non-null per the check above.
    let shape = unsafe { &*shape };
    if shape.num_dims < 1 || shape.num_dims as usize > TGATE_MAX_TENSOR_DIMS {
        return 0;
    }
    Shape::new(shape.dims[..shape.num_dims as usize].iter().copied()).element_count()
}

/// Validate a tensor descriptor. Populates `error` (when non-null) and
/// returns the status.
///
/// # Safety
/// `tensor` and `error` must each be null or valid pointers.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn tgate_validate_tensor(
    tensor: *const tgate_tensor_t,
    error: *mut tgate_error_t,
) -> tgate_status_t {
    let mut scratch = tgate_error_t::cleared();
    let record = if error.is_null() {
        &mut scratch
    } else {
        // SAFETY: non-null per the check above.
        unsafe { &mut *error }
    };
    clear_error(record);

    if tensor.is_null() {
        set_error(
            record,
            tgate_status_t::INVALID_ARGUMENT,
            "tensor pointer is NULL",
        );
        return tgate_status_t::INVALID_ARGUMENT;
    }
    // SAFETY: non-null per the check above.
    match validate_tensor(unsafe { &*tensor }) {
        Ok(_) => tgate_status_t::OK,
        Err(err) => {
            set_gate_error(record, &err);
            record.code
        }
    }
}

/// Library version as a static NUL-terminated string.
#[unsafe(no_mangle)]
pub extern "C" fn tgate_version() -> *const c_char {
    const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");
    VERSION.as_ptr() as *const c_char
}

/// Static name of a status code.
#[unsafe(no_mangle)]
pub extern "C" fn tgate_status_name(code: tgate_status_t) -> *const c_char {
    status_name(code).as_ptr()
}
