//! Changelog entries harvested from commit message trailers.
//!
//! A commit message line such as `Fixed: crash on empty input` adds an entry
//! to the `Fixed` section of the next release. The range scanned is every
//! commit since the most recently created tag matching the tag pattern.

use std::sync::LazyLock;

use anyhow::Result;
use regex::Regex;
use tracing::debug;

use super::sections::SectionSet;
use crate::changelog::Changes;
use crate::error::VerlogError;
use crate::git::{CommitHistory, CommitMessage, GitHistory};
use crate::version::Segment;

/// Tag pattern used when none is configured.
pub const DEFAULT_TAG_PATTERN: &str = r"^v(\d+\.\d+\.[0-9A-Za-z]+.*)$";

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static TRAILER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9-]*):\s*(.*)$").unwrap());

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static VERSION_TRAILER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^version:\s*(major|minor|patch)\s*$").unwrap());

/// Fragment source reading `Section: text` trailers from git history.
pub struct TrailerSource {
    history: Option<Box<dyn CommitHistory>>,
    sections: SectionSet,
    tag_pattern: Regex,
}

impl TrailerSource {
    /// Creates a source over the repository containing the current directory.
    ///
    /// When no repository can be opened the source stays usable and reports
    /// nothing.
    pub fn open(sections: SectionSet, tag_pattern: Option<&str>) -> Result<Self, VerlogError> {
        let history = match GitHistory::open() {
            Ok(history) => Some(Box::new(history) as Box<dyn CommitHistory>),
            Err(e) => {
                debug!(error = %e, "Git history unavailable");
                None
            }
        };
        Self::with_history(history, sections, tag_pattern)
    }

    /// Creates a source over an explicit history.
    pub fn with_history(
        history: Option<Box<dyn CommitHistory>>,
        sections: SectionSet,
        tag_pattern: Option<&str>,
    ) -> Result<Self, VerlogError> {
        let pattern = tag_pattern.unwrap_or(DEFAULT_TAG_PATTERN);
        let tag_pattern = Regex::new(pattern).map_err(|source| VerlogError::InvalidTagPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            history,
            sections,
            tag_pattern,
        })
    }

    /// The configured tag pattern.
    pub fn tag_pattern(&self) -> &Regex {
        &self.tag_pattern
    }

    /// Entries from commits after the boundary tag, in commit order.
    pub fn read(&self) -> Changes {
        let mut changes = Changes::new();
        for commit in self.commits() {
            self.collect_trailers(&commit, &mut changes);
        }
        changes
    }

    /// Nothing to clear; history is immutable.
    pub fn clear(&self) {}

    /// The boundary tag: the most recently created tag matching the pattern.
    pub fn last_tag(&self) -> Option<String> {
        let history = self.history.as_ref()?;
        match history.list_tags_matching(&self.tag_pattern) {
            Ok(tags) => tags.into_iter().next().map(|tag| tag.name),
            Err(e) => {
                debug!(error = %e, "Failed to list tags");
                None
            }
        }
    }

    /// The version carried by the boundary tag: the first capture group of
    /// the tag pattern, or the whole name when the pattern has no group.
    pub fn last_tag_version(&self) -> Option<String> {
        let tag = self.last_tag()?;
        let captures = self.tag_pattern.captures(&tag)?;
        captures
            .get(1)
            .or_else(|| captures.get(0))
            .map(|m| m.as_str().to_string())
    }

    /// The highest `Version: major|minor|patch` trailer since the boundary.
    pub fn read_version_bump(&self) -> Option<Segment> {
        self.commits()
            .iter()
            .flat_map(|commit| commit.message.lines())
            .filter_map(|line| VERSION_TRAILER.captures(line.trim()))
            .filter_map(|captures| captures[1].parse::<Segment>().ok())
            .max_by_key(|segment| segment.precedence())
    }

    fn commits(&self) -> Vec<CommitMessage> {
        let Some(history) = self.history.as_ref() else {
            return Vec::new();
        };
        let boundary = self.last_tag();
        match history.commits_since(boundary.as_deref()) {
            Ok(commits) => commits,
            Err(e) => {
                debug!(error = %e, tag = ?boundary, "Failed to list commits");
                Vec::new()
            }
        }
    }

    fn collect_trailers(&self, commit: &CommitMessage, changes: &mut Changes) {
        let mut current: Option<(String, String)> = None;

        for line in commit.message.lines() {
            let line = line.trim();

            if let Some(captures) = TRAILER.captures(line) {
                let (key, value) = (&captures[1], captures[2].trim());
                let section = self.sections.resolve(key);
                if section.is_some() || key.eq_ignore_ascii_case("version") {
                    flush(&mut current, &commit.id, changes);
                    current = section
                        .filter(|_| !value.is_empty())
                        .map(|section| (section, value.to_string()));
                    continue;
                }
            }

            if line.is_empty() {
                flush(&mut current, &commit.id, changes);
                continue;
            }

            if let Some((_, text)) = current.as_mut() {
                text.push(' ');
                text.push_str(line);
            }
        }

        flush(&mut current, &commit.id, changes);
    }
}

fn flush(current: &mut Option<(String, String)>, id: &str, changes: &mut Changes) {
    if let Some((section, text)) = current.take() {
        changes.push(&section, format!("{text} ({id})"));
    }
}

impl std::fmt::Debug for TrailerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrailerSource")
            .field("history", &self.history.is_some())
            .field("sections", &self.sections)
            .field("tag_pattern", &self.tag_pattern.as_str())
            .finish()
    }
}
