//! In-process reference module: an identity pass-through oracle.
//!
//! `forward` echoes each input tensor back as an owned output, preserving
//! scalar type, dims, and bytes. This gives the boundary a deterministic
//! engine for round-trip and lifecycle tests without linking a real
//! runtime, the same way a pure CPU backend serves as a correctness oracle
//! for accelerated ones.

use std::fs;
use std::path::Path;

use memmap2::Mmap;
use tracing::info;

use crate::{
    EngineError, EngineResult, EngineTensor, LoadMode, Module, TensorView, Value, code,
};

#[derive(Debug)]
enum Program {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl Program {
    fn bytes(&self) -> &[u8] {
        match self {
            Program::Mapped(m) => m,
            Program::Owned(v) => v,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Stage {
    Opened,
    Loaded,
    Ready,
}

/// Identity pass-through module over an opaque program file.
#[derive(Debug)]
pub struct ReferenceModule {
    program: Program,
    stage: Stage,
}

impl ReferenceModule {
    /// Bring program bytes into memory without interpreting them.
    pub fn open(path: &Path, mode: LoadMode) -> EngineResult<Self> {
        let program = match mode {
            LoadMode::Mmap => {
                let file = fs::File::open(path).map_err(|e| {
                    EngineError::new(code::NOT_FOUND, format!("cannot open program: {e}"))
                })?;
                // SAFETY: the file must not be modified while the mmap is
                // alive. This is the standard pattern for read-only model
                // files.
                let mmap = unsafe { Mmap::map(&file) }.map_err(|e| {
                    EngineError::new(code::INVALID_PROGRAM, format!("cannot map program: {e}"))
                })?;
                Program::Mapped(mmap)
            }
            LoadMode::Read => Program::Owned(fs::read(path).map_err(|e| {
                EngineError::new(code::NOT_FOUND, format!("cannot read program: {e}"))
            })?),
        };
        Ok(Self {
            program,
            stage: Stage::Opened,
        })
    }

    /// Raw program bytes.
    pub fn program_bytes(&self) -> &[u8] {
        self.program.bytes()
    }
}

impl Module for ReferenceModule {
    fn load(&mut self) -> EngineResult<()> {
        if self.program.bytes().is_empty() {
            return Err(EngineError::new(code::INVALID_PROGRAM, "program is empty"));
        }
        self.stage = Stage::Loaded;
        info!(bytes = self.program.bytes().len(), "reference program loaded");
        Ok(())
    }

    fn load_entry_point(&mut self) -> EngineResult<()> {
        if self.stage == Stage::Opened {
            return Err(EngineError::new(code::INVALID_STATE, "program not loaded"));
        }
        self.stage = Stage::Ready;
        Ok(())
    }

    fn forward(&mut self, inputs: &[TensorView<'_>]) -> EngineResult<Vec<Value>> {
        if self.stage != Stage::Ready {
            return Err(EngineError::new(
                code::INVALID_STATE,
                "entry point not loaded",
            ));
        }
        Ok(inputs
            .iter()
            .map(|view| {
                Value::Tensor(EngineTensor {
                    scalar_type: view.scalar_type,
                    dims: view.dims.clone(),
                    data: view.data.to_vec(),
                })
            })
            .collect())
    }
}
