//! File helpers.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

/// Writes `contents` to `path` by way of a temporary file in the same
/// directory that is renamed over the target.
///
/// An interrupted run leaves either the old file or the new one, never a
/// truncated mix. Permissions of an existing target are carried over.
pub fn write_atomic<P: AsRef<Path>>(path: P, contents: &str) -> Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    temp.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write temporary file for {}", path.display()))?;
    temp.as_file()
        .sync_all()
        .with_context(|| format!("Failed to flush temporary file for {}", path.display()))?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())
            .with_context(|| format!("Failed to copy permissions of {}", path.display()))?;
    }

    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {}", path.display()))?;

    Ok(())
}
