//! Rewrites the version embedded in a source file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, info};

use super::token::{Segment, VersionToken, VERSION_PATTERN};
use crate::changelog::UNRELEASED;
use crate::error::VerlogError;
use crate::utils::fs::write_atomic;

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static RELEASE_DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?P<lead>RELEASE_DATE\s*=\s*)(?P<quote>["'])[^"'\n]*["']"#).unwrap()
});

/// Caller-supplied replacement for the built-in bump rules.
///
/// Receives the current version and the raw segment selector and returns the
/// new version text, which is written verbatim.
pub type CustomBump = Box<dyn Fn(&VersionToken, &str) -> String>;

/// Computes next versions, either with the built-in segment rules or with a
/// caller override.
#[derive(Default)]
pub struct VersionBumper {
    custom: Option<CustomBump>,
}

impl VersionBumper {
    /// Creates a bumper that uses the built-in segment rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bumper that delegates every bump to `custom`.
    pub fn with_custom(custom: CustomBump) -> Self {
        Self {
            custom: Some(custom),
        }
    }

    /// Returns the text of the version following `current` in `selector`.
    pub fn next(&self, current: &VersionToken, selector: &str) -> Result<String, VerlogError> {
        match &self.custom {
            Some(custom) => Ok(custom(current, selector)),
            None => {
                let segment: Segment = selector.parse()?;
                Ok(current.bump(segment)?.to_string())
            }
        }
    }
}

impl fmt::Debug for VersionBumper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionBumper")
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

/// Result of bumping a version file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BumpOutcome {
    /// Version found in the file before the bump.
    pub previous: String,
    /// Version written to the file.
    pub current: String,
}

/// A source file that carries the project version.
#[derive(Debug)]
pub struct VersionFile {
    path: PathBuf,
    bumper: VersionBumper,
}

impl VersionFile {
    /// Creates a handle for the file at `path`.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            bumper: VersionBumper::new(),
        }
    }

    /// Replaces the built-in bump rules with `bumper`.
    pub fn with_bumper(mut self, bumper: VersionBumper) -> Self {
        self.bumper = bumper;
        self
    }

    /// Path of the version file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String> {
        fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read version file: {}", self.path.display()))
    }

    /// Returns the first version found in the file.
    pub fn current(&self) -> Result<VersionToken> {
        let body = self.read()?;
        VersionToken::parse(&body)
            .with_context(|| format!("No version found in {}", self.path.display()))
    }

    /// Returns the version a bump by `selector` would produce without
    /// touching the file.
    pub fn preview(&self, selector: &str) -> Result<String> {
        let current = self.current()?;
        Ok(self.bumper.next(&current, selector)?)
    }

    /// Bumps the version in place.
    pub fn bump(&self, selector: &str) -> Result<BumpOutcome> {
        self.bump_into(selector, &self.path)
    }

    /// Reads this file, bumps the first version occurrence and writes the
    /// result to `destination`.
    ///
    /// A `RELEASE_DATE` constant, when present, is reset to `Unreleased`.
    pub fn bump_into<P: AsRef<Path>>(&self, selector: &str, destination: P) -> Result<BumpOutcome> {
        let destination = destination.as_ref();
        let body = self.read()?;
        let found = VERSION_PATTERN.find(&body).ok_or_else(|| {
            VerlogError::Format(format!("no version pattern in {}", self.path.display()))
        })?;
        let previous = VersionToken::parse(found.as_str())?;
        let current = self.bumper.next(&previous, selector)?;

        let mut updated = String::with_capacity(body.len());
        updated.push_str(&body[..found.start()]);
        updated.push_str(&current);
        updated.push_str(&body[found.end()..]);
        let updated = replace_release_date(&updated, UNRELEASED);

        write_atomic(destination, &updated)?;
        info!(
            previous = %previous,
            current = %current,
            file = %destination.display(),
            "Bumped version"
        );

        Ok(BumpOutcome {
            previous: previous.to_string(),
            current,
        })
    }

    /// Sets the `RELEASE_DATE` constant, if the file has one.
    ///
    /// Returns whether the file was changed.
    pub fn set_release_date(&self, date: &str) -> Result<bool> {
        let body = self.read()?;
        if !RELEASE_DATE_PATTERN.is_match(&body) {
            debug!(file = %self.path.display(), "No RELEASE_DATE constant to update");
            return Ok(false);
        }

        let updated = replace_release_date(&body, date);
        if updated == body {
            return Ok(false);
        }
        write_atomic(&self.path, &updated)?;
        Ok(true)
    }
}

fn replace_release_date(body: &str, date: &str) -> String {
    RELEASE_DATE_PATTERN
        .replace(body, |caps: &regex::Captures<'_>| {
            format!("{}{quote}{date}{quote}", &caps["lead"], quote = &caps["quote"])
        })
        .into_owned()
}
