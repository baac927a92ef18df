//! Archival of the changelog before old releases are dropped.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::changelog::Release;
use crate::error::VerlogError;
use crate::utils::fs::write_atomic;

/// Receives the latest release and the full changelog text.
pub type ArchiveCallback = Box<dyn FnMut(&Release, &str)>;

/// Where the full changelog is kept before the retention window trims it.
pub enum Retention {
    /// Writes `{dir}/{version}.md`.
    Directory(PathBuf),
    /// Hands the release and text to caller code.
    Callback(ArchiveCallback),
}

impl Retention {
    /// Archives `text` under `release`.
    pub fn archive(&mut self, release: &Release, text: &str) -> Result<()> {
        match self {
            Self::Directory(dir) => {
                let path = archive_path(dir, &release.version)?;
                fs::create_dir_all(&*dir)
                    .with_context(|| format!("Failed to create archive directory: {}", dir.display()))?;
                write_atomic(&path, text)?;
                info!(version = %release.version, file = %path.display(), "Archived changelog");
                Ok(())
            }
            Self::Callback(callback) => {
                callback(release, text);
                Ok(())
            }
        }
    }
}

impl fmt::Debug for Retention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory(dir) => f.debug_tuple("Directory").field(dir).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// Path of the archive file for `version` in `dir`.
///
/// Versions that would name a file outside `dir` are rejected.
pub fn archive_path(dir: &Path, version: &str) -> Result<PathBuf, VerlogError> {
    let version = version.trim();
    if version.is_empty()
        || version.starts_with('.')
        || version.contains(['/', '\\'])
        || version.contains("..")
    {
        return Err(VerlogError::Format(format!(
            "version '{version}' cannot name an archive file"
        )));
    }
    Ok(dir.join(format!("{version}.md")))
}
