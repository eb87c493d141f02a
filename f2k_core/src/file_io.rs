//! # File I/O Module
//!
//! Reading interchange sources and writing serialized output:
//! - **Lossy decoding**: legacy exporters write code-page text, so sources
//!   are decoded as UTF-8 with replacement instead of being rejected
//! - **Atomic saves**: write to `.tmp`, sync, rename over the destination
//!
//! I/O failures are returned as [`InterchangeError::Io`] with the original
//! `std::io::Error` as source.
//!
//! ## Example
//!
//! ```rust,no_run
//! use f2k_core::file_io::{read_source, write_atomic};
//! use std::path::Path;
//!
//! let text = read_source(Path::new("model.f2k"))?;
//! write_atomic(Path::new("model_out.f2k"), &text)?;
//! # Ok::<(), f2k_core::errors::InterchangeError>(())
//! ```

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::errors::{InterchangeError, InterchangeResult};

/// Read a source file as text.
pub fn read_source(path: &Path) -> InterchangeResult<String> {
    let bytes = fs::read(path).map_err(|e| InterchangeError::io("read", path, e))?;
    Ok(match String::from_utf8_lossy(&bytes) {
        Cow::Borrowed(text) => text.to_string(),
        Cow::Owned(text) => {
            warn!(path = %path.display(), "source is not valid UTF-8; invalid bytes replaced");
            text
        }
    })
}

/// Temp file used while saving to `path`
fn temp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Write `text` to `path` with atomic replace semantics.
///
/// 1. Write to `<path>.tmp`
/// 2. Sync to disk (fsync)
/// 3. Rename over `path`
///
/// An interrupted save leaves the previous file untouched.
pub fn write_atomic(path: &Path, text: &str) -> InterchangeResult<()> {
    let tmp_path = temp_path_for(path);

    let mut tmp_file =
        File::create(&tmp_path).map_err(|e| InterchangeError::io("create temp file", &tmp_path, e))?;

    tmp_file
        .write_all(text.as_bytes())
        .map_err(|e| InterchangeError::io("write temp file", &tmp_path, e))?;

    tmp_file
        .sync_all()
        .map_err(|e| InterchangeError::io("sync temp file", &tmp_path, e))?;
    drop(tmp_file);

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        InterchangeError::io("rename to final", path, e)
    })?;

    Ok(())
}
