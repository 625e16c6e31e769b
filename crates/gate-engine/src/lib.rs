//! Engine facade: the module interface the boundary drives.
//!
//! The inference engine has its own scalar-type space (wider than the
//! boundary's `DType`) and its own numeric error-code space; this crate
//! defines both, plus the `Module` trait covering the engine lifecycle
//! (open → load → load_entry_point → forward). The in-process reference
//! module in `reference` is an identity pass-through used as a
//! deterministic oracle by the boundary's tests and CLI.

use std::path::Path;

pub mod reference;

pub use reference::ReferenceModule;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Error raised inside the engine, in the engine's own code space. The
/// boundary wraps this into its status taxonomy; the numeric code is
/// preserved for diagnostics.
#[derive(thiserror::Error, Debug)]
#[error("{message} (engine code {code})")]
pub struct EngineError {
    pub code: i32,
    pub message: String,
}

impl EngineError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Engine error codes surfaced through [`EngineError::code`].
pub mod code {
    /// Program bytes are missing, unmapped, or malformed.
    pub const INVALID_PROGRAM: i32 = 0x01;
    /// Lifecycle step invoked out of order.
    pub const INVALID_STATE: i32 = 0x02;
    /// Program source could not be opened.
    pub const NOT_FOUND: i32 = 0x03;
    /// Requested operation is not supported by this module.
    pub const UNSUPPORTED: i32 = 0x04;
}

/// Scalar types understood by the engine.
///
/// Deliberately wider than the boundary's `DType`: real models carry
/// half-precision and wide-integer tensors internally, and the boundary
/// must refuse to guess a representation for them (see gate-sys).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarType {
    F32,
    F16,
    BF16,
    I8,
    I32,
    I64,
    U8,
    Bool,
}

impl ScalarType {
    /// Size in bytes of a single element.
    pub fn size_bytes(self) -> usize {
        match self {
            ScalarType::F32 | ScalarType::I32 => 4,
            ScalarType::F16 | ScalarType::BF16 => 2,
            ScalarType::I64 => 8,
            ScalarType::I8 | ScalarType::U8 | ScalarType::Bool => 1,
        }
    }
}

/// Borrowed view of host tensor data handed to the engine.
///
/// Zero-copy by construction: `data` aliases the host's buffer, which must
/// outlive the engine invocation and must not be mutated during it.
pub struct TensorView<'a> {
    pub scalar_type: ScalarType,
    pub dims: Vec<i64>,
    pub data: &'a [u8],
}

/// Tensor owned by the engine, produced by a forward pass. Its backing
/// memory is only guaranteed to live until the call returns, so consumers
/// deep-copy what they keep.
#[derive(Clone, Debug)]
pub struct EngineTensor {
    pub scalar_type: ScalarType,
    pub dims: Vec<i64>,
    pub data: Vec<u8>,
}

impl EngineTensor {
    /// Number of elements, taking dims at face value.
    pub fn numel(&self) -> usize {
        self.dims.iter().product::<i64>().max(0) as usize
    }
}

/// A value produced by a forward pass. Not every output slot is a tensor;
/// models may also emit scalars.
#[derive(Clone, Debug)]
pub enum Value {
    Tensor(EngineTensor),
    Scalar(f64),
}

/// How program bytes are brought into memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadMode {
    /// Memory-map the file; avoids a full read for large models.
    Mmap,
    /// Read the whole file into an owned buffer.
    Read,
}

/// A loaded (or loading) model instance.
///
/// Lifecycle: `open` → `load` → `load_entry_point` → `forward`*. Modules
/// are `Send` but support at most one in-flight call each.
pub trait Module: Send {
    /// Parse and verify the program.
    fn load(&mut self) -> EngineResult<()>;

    /// Resolve the program's entry point.
    fn load_entry_point(&mut self) -> EngineResult<()>;

    /// Execute the entry point over `inputs`.
    fn forward(&mut self, inputs: &[TensorView<'_>]) -> EngineResult<Vec<Value>>;
}

/// Open a module from a file path. The returned module still needs its
/// `load` and `load_entry_point` steps before `forward` may run.
pub fn open(path: &Path, mode: LoadMode) -> EngineResult<Box<dyn Module>> {
    Ok(Box::new(ReferenceModule::open(path, mode)?))
}
