//! Fragment files in a directory.
//!
//! A fragment is a file named `{id}.{section}.{ext}` whose trimmed content is
//! one changelog entry, e.g. `42.fixed.md`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::sections::SectionSet;
use crate::changelog::Changes;

/// Reads and clears fragment files in one directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    sections: SectionSet,
}

impl DirectorySource {
    /// Creates a source for `dir` accepting `sections`.
    pub fn new<P: Into<PathBuf>>(dir: P, sections: SectionSet) -> Self {
        Self {
            dir: dir.into(),
            sections,
        }
    }

    /// The fragment directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Collects entries from all valid fragment files, ordered by file name.
    ///
    /// A missing or unreadable directory yields no entries.
    pub fn read(&self) -> Changes {
        let mut changes = Changes::new();

        for (path, section) in self.fragment_files() {
            let Some(section) = self.sections.resolve(section.as_str()) else {
                debug!(file = %path.display(), section = %section, "Skipping fragment with unknown section");
                continue;
            };

            let content = match fs::read_to_string(&path) {
                Ok(content) => content,
                Err(e) => {
                    debug!(file = %path.display(), error = %e, "Skipping unreadable fragment");
                    continue;
                }
            };

            let content = content.trim();
            if content.is_empty() {
                debug!(file = %path.display(), "Skipping empty fragment");
                continue;
            }

            changes.push(&section, content);
        }

        changes
    }

    /// Deletes every file that follows the fragment naming pattern, whatever
    /// its section. Other files are left alone.
    ///
    /// Returns the number of deleted files.
    pub fn clear(&self) -> Result<usize> {
        let files = self.fragment_files();
        for (path, _) in &files {
            fs::remove_file(path)
                .with_context(|| format!("Failed to delete fragment: {}", path.display()))?;
        }
        if !files.is_empty() {
            info!(dir = %self.dir.display(), count = files.len(), "Cleared fragments");
        }
        Ok(files.len())
    }

    fn fragment_files(&self) -> Vec<(PathBuf, String)> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %self.dir.display(), error = %e, "Fragment directory unavailable");
                return Vec::new();
            }
        };

        let mut files: Vec<(PathBuf, String)> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
            .filter_map(|entry| {
                let name = entry.file_name();
                let section = fragment_section(name.to_str()?)?.to_string();
                Some((entry.path(), section))
            })
            .collect();
        files.sort_by(|a, b| a.0.file_name().cmp(&b.0.file_name()));
        files
    }
}

/// Returns the section part of a `{id}.{section}.{ext}` file name.
fn fragment_section(file_name: &str) -> Option<&str> {
    let parts: Vec<&str> = file_name.split('.').collect();
    match parts.as_slice() {
        [id, section, ext] if !id.is_empty() && !section.is_empty() && !ext.is_empty() => {
            Some(*section)
        }
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) {
        fs::write(dir.path().join(name), contents).unwrap();
    }

    #[test]
    fn fragment_section_requires_three_parts() {
        assert_eq!(fragment_section("1.added.md"), Some("added"));
        assert_eq!(fragment_section("feature.FIXED.txt"), Some("FIXED"));
        assert_eq!(fragment_section("README.md"), None);
        assert_eq!(fragment_section("1.2.added.md"), None);
        assert_eq!(fragment_section(".added.md"), None);
    }

    #[test]
    fn reads_fragments_grouped_by_section() {
        let dir = TempDir::new().unwrap();
        write(&dir, "2.added.md", "Second feature\n");
        write(&dir, "1.added.md", "  First feature  ");
        write(&dir, "3.FIXED.md", "A fix");

        let changes = DirectorySource::new(dir.path(), SectionSet::default()).read();

        assert_eq!(
            changes.get("Added").unwrap(),
            ["First feature", "Second feature"]
        );
        assert_eq!(changes.get("Fixed").unwrap(), ["A fix"]);
    }

    #[test]
    fn unknown_sections_contribute_nothing() {
        let dir = TempDir::new().unwrap();
        write(&dir, "1.invalid.md", "Nope");

        let changes = DirectorySource::new(dir.path(), SectionSet::default()).read();

        assert!(changes.is_empty());
    }

    #[test]
    fn custom_whitelist_accepts_its_names_only() {
        let dir = TempDir::new().unwrap();
        write(&dir, "1.performance.md", "Faster");
        write(&dir, "2.added.md", "Feature");

        let source = DirectorySource::new(dir.path(), SectionSet::new(["performance"]));
        let changes = source.read();

        assert_eq!(changes.get("Performance").unwrap(), ["Faster"]);
        assert!(changes.get("Added").is_none());
    }

    #[test]
    fn skips_empty_fragments_and_other_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "1.added.md", "   \n");
        write(&dir, "notes.md", "not a fragment");
        fs::create_dir(dir.path().join("4.added.md")).unwrap();

        let changes = DirectorySource::new(dir.path(), SectionSet::default()).read();

        assert!(changes.is_empty());
    }

    #[test]
    fn missing_directory_reads_empty_and_clears_nothing() {
        let dir = TempDir::new().unwrap();
        let source = DirectorySource::new(dir.path().join("absent"), SectionSet::default());

        assert!(source.read().is_empty());
        assert_eq!(source.clear().unwrap(), 0);
    }

    #[test]
    fn clear_removes_only_fragment_files() {
        let dir = TempDir::new().unwrap();
        write(&dir, "1.added.md", "Feature");
        write(&dir, "2.invalid.md", "Unknown section");
        write(&dir, "README.md", "keep me");

        let removed = DirectorySource::new(dir.path(), SectionSet::default())
            .clear()
            .unwrap();

        assert_eq!(removed, 2);
        assert!(dir.path().join("README.md").exists());
        assert!(!dir.path().join("1.added.md").exists());
    }
}
