//! Changelog updates across a release cycle.
//!
//! [`ChangelogUpdater`] owns the policies of an update (fragment source,
//! retention window, archival) and applies them either to an in-memory
//! [`Changelog`] or to a file, which is only written once the in-memory work
//! has succeeded.

pub mod retention;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

pub use retention::{archive_path, ArchiveCallback, Retention};

use crate::changelog::{Changelog, Changes, Release, UNRELEASED};
use crate::error::VerlogError;
use crate::fragments::FragmentSource;
use crate::utils::fs::write_atomic;
use crate::version::{Segment, VersionToken};

/// Number of releases kept in the changelog by default.
pub const DEFAULT_VERSION_LIMIT: usize = 2;

/// Version used for a new changelog when none can be read.
pub const INITIAL_VERSION: &str = "0.1.0";

/// Applies release updates to changelogs.
#[derive(Debug)]
pub struct ChangelogUpdater {
    fragments: FragmentSource,
    limit: usize,
    retention: Option<Retention>,
}

impl Default for ChangelogUpdater {
    fn default() -> Self {
        Self {
            fragments: FragmentSource::Null,
            limit: DEFAULT_VERSION_LIMIT,
            retention: None,
        }
    }
}

impl ChangelogUpdater {
    /// Creates an updater with no fragments, the default retention window
    /// and no archival.
    pub fn new() -> Self {
        Self::default()
    }

    /// Harvests pending entries from `fragments`.
    pub fn with_fragments(mut self, fragments: FragmentSource) -> Self {
        self.fragments = fragments;
        self
    }

    /// Keeps at most `limit` releases. Zero is treated as one.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    /// Archives the full changelog before trimming it.
    pub fn with_retention(mut self, retention: Retention) -> Self {
        self.retention = Some(retention);
        self
    }

    /// The configured fragment source.
    pub fn fragments(&self) -> &FragmentSource {
        &self.fragments
    }

    /// The retention window.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Adds a release for `version` to `changelog`.
    ///
    /// The new record holds `changes`, then the entries of any record it
    /// replaces, then pending fragments, each skipped when its section
    /// already holds the same text. A record with the same version, and an
    /// unreleased head record for another version, are replaced.
    pub fn update(
        &mut self,
        changelog: &mut Changelog,
        version: &str,
        date: &str,
        changes: &Changes,
    ) -> Result<()> {
        let fragments = self.fragments.read();
        debug!(
            entries = fragments.entry_count(),
            source = %self.fragments.describe(),
            "Read fragments"
        );

        let mut merged = changes.clone();
        for replaced in take_superseded(changelog, version) {
            debug!(version = %replaced.version, "Replacing existing release record");
            merged.merge(&replaced.changes);
        }
        merged.merge(&fragments);

        changelog.prepend(Release::new(version, date).with_changes(merged));
        self.retain(changelog)?;

        info!(version = %version, date = %date, "Added release to changelog");
        Ok(())
    }

    /// Dates the unreleased record, merging pending fragments into it first.
    ///
    /// Returns the finalized version and date. Without an unreleased record
    /// nothing changes and the latest release is returned.
    pub fn finalize(&self, changelog: &mut Changelog, date: &str) -> Result<(String, String)> {
        let fragments = if self.fragments.is_null() {
            Changes::new()
        } else {
            self.fragments.read()
        };

        if let Some(release) = changelog.unreleased_mut() {
            release.changes.merge(&fragments);
            release.date = date.to_string();
            info!(version = %release.version, date = %date, "Finalized release");
            return Ok((release.version.clone(), release.date.clone()));
        }

        let latest = changelog
            .latest()
            .ok_or_else(|| VerlogError::Format("changelog has no releases".to_string()))?;
        debug!(version = %latest.version, "No unreleased record to finalize");
        Ok((latest.version.clone(), latest.date.clone()))
    }

    /// Applies only the retention window.
    pub fn reformat(&self, changelog: &mut Changelog) {
        changelog.truncate(self.limit);
    }

    fn retain(&mut self, changelog: &mut Changelog) -> Result<()> {
        if let Some(retention) = self.retention.as_mut() {
            if let Some(latest) = changelog.latest() {
                let text = changelog.to_markdown();
                retention.archive(latest, &text)?;
            }
        }
        changelog.truncate(self.limit);
        Ok(())
    }

    /// Reads `path` and adds a release in memory without writing the file.
    ///
    /// A missing file starts from an empty changelog. Archival still
    /// happens, since it precedes trimming.
    pub fn prepare_update<P: AsRef<Path>>(
        &mut self,
        path: P,
        version: &str,
        date: &str,
        changes: &Changes,
    ) -> Result<Changelog> {
        let path = path.as_ref();
        let mut changelog = if path.exists() {
            read_changelog(path)?
        } else {
            debug!(file = %path.display(), "Changelog missing, starting a new one");
            Changelog::default()
        };
        self.update(&mut changelog, version, date, changes)?;
        Ok(changelog)
    }

    /// Reads `path`, adds a release and writes the result back.
    pub fn update_file<P: AsRef<Path>>(
        &mut self,
        path: P,
        version: &str,
        date: &str,
        changes: &Changes,
    ) -> Result<Changelog> {
        let path = path.as_ref();
        let changelog = self.prepare_update(path, version, date, changes)?;
        write_changelog(path, &changelog)?;
        Ok(changelog)
    }

    /// Finalizes the unreleased record of `path`, writing only when a record
    /// was dated.
    pub fn finalize_file<P: AsRef<Path>>(&self, path: P, date: &str) -> Result<(String, String)> {
        let path = path.as_ref();
        let mut changelog = read_changelog(path)?;
        let had_unreleased = changelog.unreleased().is_some();

        let finalized = self.finalize(&mut changelog, date)?;
        if had_unreleased {
            write_changelog(path, &changelog)?;
        }
        Ok(finalized)
    }

    /// Rewrites `path` in canonical form within the retention window.
    ///
    /// A missing file is generated with an initial release.
    pub fn reformat_file<P: AsRef<Path>>(&self, path: P, initial_version: &str) -> Result<Changelog> {
        let path = path.as_ref();
        if !path.exists() {
            info!(file = %path.display(), "Changelog missing, generating a new one");
            return generate_changelog(path, initial_version, None);
        }

        let mut changelog = read_changelog(path)?;
        self.reformat(&mut changelog);
        write_changelog(path, &changelog)?;
        Ok(changelog)
    }
}

/// Removes and returns the records a new `version` replaces.
fn take_superseded(changelog: &mut Changelog, version: &str) -> Vec<Release> {
    let mut taken = Vec::new();

    if let Some(first) = changelog.releases.first() {
        if first.is_unreleased() && first.version != version {
            taken.push(changelog.releases.remove(0));
        }
    }

    let mut index = 0;
    while index < changelog.releases.len() {
        if changelog.releases[index].version == version {
            taken.push(changelog.releases.remove(index));
        } else {
            index += 1;
        }
    }

    taken
}

/// Default entries of a generated changelog.
pub fn initial_changes() -> Changes {
    [("Added", ["Initial release"])].into_iter().collect()
}

/// Writes a new changelog holding one unreleased record for `version`.
pub fn generate_changelog<P: AsRef<Path>>(
    path: P,
    version: &str,
    changes: Option<Changes>,
) -> Result<Changelog> {
    let path = path.as_ref();
    let mut changelog = Changelog::default();
    changelog.prepend(
        Release::new(version, UNRELEASED).with_changes(changes.unwrap_or_else(initial_changes)),
    );
    write_changelog(path, &changelog)?;
    info!(file = %path.display(), version = %version, "Generated changelog");
    Ok(changelog)
}

/// Reads and parses a changelog file.
pub fn read_changelog<P: AsRef<Path>>(path: P) -> Result<Changelog> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read changelog: {}", path.display()))?;
    Ok(Changelog::parse(&text))
}

/// Prints and writes a changelog file.
pub fn write_changelog<P: AsRef<Path>>(path: P, changelog: &Changelog) -> Result<()> {
    let path = path.as_ref();
    write_atomic(path, &changelog.to_markdown())
        .with_context(|| format!("Failed to write changelog: {}", path.display()))
}

/// Decision for a bump requested by `Version:` trailers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrailerBump {
    /// No trailer asks for a bump.
    NotRequested,
    /// Bump the current version by this segment.
    Bump(Segment),
    /// The current version already reaches what the trailer asks for.
    AlreadyBumped {
        /// Segment asked for.
        segment: Segment,
        /// Version already in the version file.
        current: String,
    },
}

/// Decides whether a trailer-requested bump still has to happen.
///
/// When the last release tag differs from the current version, the version
/// file has already been bumped since the release, so the bump only happens
/// when the tag bumped by `requested` would exceed the current version.
pub fn plan_trailer_bump(
    current: &VersionToken,
    tag_version: Option<&str>,
    requested: Option<Segment>,
) -> Result<TrailerBump, VerlogError> {
    let Some(segment) = requested else {
        return Ok(TrailerBump::NotRequested);
    };

    let tag = match tag_version.map(VersionToken::parse) {
        None => return Ok(TrailerBump::Bump(segment)),
        Some(Err(e)) => {
            debug!(error = %e, "Tag version unparseable, bumping from current version");
            return Ok(TrailerBump::Bump(segment));
        }
        Some(Ok(tag)) => tag,
    };

    if &tag == current {
        return Ok(TrailerBump::Bump(segment));
    }

    let desired = tag.bump(segment)?;
    if &desired > current {
        Ok(TrailerBump::Bump(segment))
    } else {
        Ok(TrailerBump::AlreadyBumped {
            segment,
            current: current.to_string(),
        })
    }
}
