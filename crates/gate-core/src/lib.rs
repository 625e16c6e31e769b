//! Boundary-side core types for the tensorGate inference boundary.
//!
//! `gate-core` provides the value types (`DType`, `Shape`), the boundary
//! error taxonomy, tensor layout validation, and the platform filesystem
//! probe used by the model loader. It contains no unsafe code; the flat C
//! surface lives in `gate-sys`.

pub mod platform;
pub mod types;
pub mod validate;

pub use types::{DType, MAX_INPUTS, MAX_OUTPUTS, MAX_TENSOR_DIMS, Shape};

pub type Result<T> = std::result::Result<T, GateError>;

/// Boundary error taxonomy. One variant per wire status code; the flat C
/// surface maps each variant to its numeric status.
#[derive(thiserror::Error, Debug)]
pub enum GateError {
    #[error("model load failed: {0}")]
    ModelLoad(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("{0}")]
    Validation(String),

    #[error("allocation failed: {0}")]
    Memory(String),

    #[error("{0}")]
    Io(String),

    #[error("platform error: {0}")]
    Platform(String),

    #[error("invalid model handle: {0}")]
    InvalidHandle(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl From<std::io::Error> for GateError {
    fn from(err: std::io::Error) -> Self {
        GateError::Io(err.to_string())
    }
}
