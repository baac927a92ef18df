//! In-memory changelog document.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::version::VersionToken;

/// Release label for a version that has not shipped yet.
pub const UNRELEASED: &str = "Unreleased";

/// Title used when a document has none.
pub const DEFAULT_TITLE: &str = "Changelog";

/// Preamble used when a document has none.
pub const DEFAULT_PREAMBLE: &str = "All notable changes to this project will be documented in this file.";

/// Ordered mapping of section name to entries.
///
/// Sections keep the order in which they were first added and entries keep
/// insertion order. Section names are stored verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changes {
    sections: Vec<(String, Vec<String>)>,
}

impl Changes {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether there are no sections at all.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Total number of entries across all sections.
    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|(_, entries)| entries.len()).sum()
    }

    /// Entries of the section called `name`.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.sections
            .iter()
            .find(|(section, _)| section == name)
            .map(|(_, entries)| entries.as_slice())
    }

    /// Whether a section called `name` exists.
    pub fn contains_section(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the entries of `name`, adding an empty section at the end if
    /// it does not exist yet.
    pub fn section_mut(&mut self, name: &str) -> &mut Vec<String> {
        let index = match self.sections.iter().position(|(section, _)| section == name) {
            Some(index) => index,
            None => {
                self.sections.push((name.to_string(), Vec::new()));
                self.sections.len() - 1
            }
        };
        &mut self.sections[index].1
    }

    /// Appends `entry` to `section` without any duplicate check.
    pub fn push<S: Into<String>>(&mut self, section: &str, entry: S) {
        self.section_mut(section).push(entry.into());
    }

    /// Merges `other` into `self`.
    ///
    /// Every section of `other` is ensured to exist, then each entry is
    /// appended unless that section already holds the exact same text.
    pub fn merge(&mut self, other: &Self) {
        for (name, entries) in &other.sections {
            let target = self.section_mut(name);
            for entry in entries {
                if !target.contains(entry) {
                    target.push(entry.clone());
                }
            }
        }
    }

    /// Iterates over `(section, entries)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.sections
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.as_slice()))
    }

    /// Section names in order.
    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|(name, _)| name.as_str())
    }
}

impl<S, E> FromIterator<(S, E)> for Changes
where
    S: Into<String>,
    E: IntoIterator,
    E::Item: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (S, E)>>(iter: I) -> Self {
        let mut changes = Self::new();
        for (section, entries) in iter {
            let section = section.into();
            let target = changes.section_mut(&section);
            target.extend(entries.into_iter().map(Into::into));
        }
        changes
    }
}

impl Serialize for Changes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for (name, entries) in &self.sections {
            map.serialize_entry(name, entries)?;
        }
        map.end()
    }
}

/// One version record of the changelog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Release {
    /// Version text as written in the header, without brackets.
    pub version: String,
    /// Release date, or [`UNRELEASED`].
    pub date: String,
    /// Changes grouped by section.
    pub changes: Changes,
}

impl Release {
    /// Creates a record with no changes.
    pub fn new<V: Into<String>, D: Into<String>>(version: V, date: D) -> Self {
        Self {
            version: version.into(),
            date: date.into(),
            changes: Changes::new(),
        }
    }

    /// Attaches `changes` to the record.
    pub fn with_changes(mut self, changes: Changes) -> Self {
        self.changes = changes;
        self
    }

    /// Whether the record has no release date yet.
    pub fn is_unreleased(&self) -> bool {
        let date = self.date.trim();
        date.is_empty() || date.eq_ignore_ascii_case(UNRELEASED)
    }

    /// The version parsed for comparison, if it is a valid version.
    pub fn version_token(&self) -> Option<VersionToken> {
        self.version.parse().ok()
    }
}

/// A parsed changelog: title, preamble and releases newest-first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Changelog {
    /// Text of the H1 heading.
    pub title: String,
    /// Free text between the title and the first release.
    pub preamble: String,
    /// Releases, newest first.
    pub releases: Vec<Release>,
    /// Link reference definitions (`[1.0.0]: https://…`) kept after the last
    /// release.
    pub links: Vec<String>,
}

impl Changelog {
    /// Parses Markdown text; never fails.
    pub fn parse(text: &str) -> Self {
        super::parser::parse(text)
    }

    /// Renders the canonical Markdown text.
    pub fn to_markdown(&self) -> String {
        super::printer::print(self)
    }

    /// The record waiting for a release date, if any.
    pub fn unreleased(&self) -> Option<&Release> {
        self.releases.iter().find(|release| release.is_unreleased())
    }

    /// Mutable access to the record waiting for a release date.
    pub fn unreleased_mut(&mut self) -> Option<&mut Release> {
        self.releases.iter_mut().find(|release| release.is_unreleased())
    }

    /// The record with the highest version.
    ///
    /// Records whose version cannot be parsed are only chosen when no record
    /// has a valid version, in which case the first record wins.
    pub fn latest(&self) -> Option<&Release> {
        self.releases
            .iter()
            .filter_map(|release| release.version_token().map(|token| (token, release)))
            .reduce(|best, candidate| if candidate.0 > best.0 { candidate } else { best })
            .map(|(_, release)| release)
            .or_else(|| self.releases.first())
    }

    /// Adds `release` as the newest record.
    pub fn prepend(&mut self, release: Release) {
        self.releases.insert(0, release);
    }

    /// Keeps only the `limit` newest records.
    pub fn truncate(&mut self, limit: usize) {
        self.releases.truncate(limit);
    }
}

impl fmt::Display for Changelog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_markdown())
    }
}
