//! Writing generated files.
//!
//! Output is written atomically: the text goes to a temporary file in the
//! destination directory, which is then renamed over the target. A failed
//! write never leaves a partial file at the output path.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// What to do when the output path already holds content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Refuse to replace a non-empty file.
    #[default]
    Fail,
    /// Replace whatever is there.
    Overwrite,
}

/// Returns true if `path` is a file with at least one byte.
///
/// A missing path has no content.
pub fn has_content(path: &Path) -> io::Result<bool> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.is_file() && meta.len() > 0),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Creates the parent directory of `path` if it does not exist.
pub fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Writes `contents` to `path` through a temporary file.
///
/// Under [`OverwritePolicy::Fail`] the final rename refuses to replace a
/// non-empty file that appeared after validation; the returned error then has
/// kind [`io::ErrorKind::AlreadyExists`]. An existing empty file is replaced.
///
/// # Errors
///
/// Returns the underlying I/O error if the temp file cannot be created,
/// written, or persisted.
pub fn write_atomic(path: &Path, contents: &str, policy: OverwritePolicy) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.as_file().sync_all()?;

    let replace = match policy {
        OverwritePolicy::Overwrite => true,
        OverwritePolicy::Fail => path.is_file() && !has_content(path)?,
    };

    if replace {
        tmp.persist(path).map_err(|e| e.error)?;
    } else {
        tmp.persist_noclobber(path).map_err(|e| e.error)?;
    }
    Ok(())
}
