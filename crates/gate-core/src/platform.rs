//! Filesystem probe used by the model loader and the test harness.
//!
//! Load-time preconditions (existence, readability) are checked here so the
//! loader can report an I/O problem naming the path before the engine ever
//! sees the file. Temp-file support exists for hosts that only hold a model
//! as an in-memory buffer and need a path to hand to the loader.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::Result;

/// True if `path` exists.
pub fn file_exists(path: &Path) -> bool {
    path.exists()
}

/// True if `path` can be opened for reading.
pub fn file_readable(path: &Path) -> bool {
    fs::File::open(path).is_ok()
}

/// Size of the file at `path` in bytes.
pub fn file_size(path: &Path) -> Result<u64> {
    Ok(fs::metadata(path)?.len())
}

static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Write `bytes` to a fresh file under the system temp directory and return
/// its path. Names are unique per process and per call.
pub fn write_temp_file(bytes: &[u8]) -> Result<PathBuf> {
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!("tgate-{}-{seq}.bin", process::id()));
    fs::write(&path, bytes)?;
    Ok(path)
}

/// Remove a file previously produced by `write_temp_file`.
pub fn delete_temp_file(path: &Path) -> Result<()> {
    fs::remove_file(path)?;
    Ok(())
}
