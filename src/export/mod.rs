//! Document export: Word package, preview region and rasterised PDF.
//!
//! Both exporters consume the final markup and the paper size, never the
//! live editing surface. They produce bytes; [`save_artifact`] puts them on
//! disk.

pub mod pdf;
pub mod preview;
pub mod word;

use crate::error::DocMimicError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Write `bytes` to `dir/file_name` atomically.
///
/// The data goes to a temporary file in `dir` first and is renamed into
/// place, so a failed export never leaves a truncated artifact behind.
pub fn save_artifact(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, DocMimicError> {
    let target = dir.join(file_name);
    let write_err = |source: std::io::Error| DocMimicError::OutputWriteFailed {
        path: target.clone(),
        source,
    };

    std::fs::create_dir_all(dir).map_err(write_err)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(bytes).map_err(write_err)?;
    tmp.persist(&target).map_err(|e| write_err(e.error))?;

    info!("Wrote {} ({} bytes)", target.display(), bytes.len());
    Ok(target)
}
