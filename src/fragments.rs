//! Sources of pending changelog entries.

pub mod directory;
pub mod sections;
pub mod trailers;

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub use directory::DirectorySource;
pub use sections::{capitalize, display_rank, SectionSet, CANONICAL_SECTIONS};
pub use trailers::{TrailerSource, DEFAULT_TAG_PATTERN};

use crate::changelog::Changes;
use crate::error::VerlogError;

/// Where pending entries come from, as written in configuration.
///
/// Accepted forms are `none`, `git` and `dir:<path>`; a bare path is read
/// as a directory.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FragmentSetting {
    /// Fragment harvesting disabled.
    #[default]
    Disabled,
    /// Fragment files in a directory.
    Directory(PathBuf),
    /// Commit message trailers.
    Git,
}

impl FromStr for FragmentSetting {
    type Err = VerlogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        match value.to_ascii_lowercase().as_str() {
            "" | "none" | "off" | "false" => return Ok(Self::Disabled),
            "git" | "trailers" => return Ok(Self::Git),
            _ => {}
        }

        if let Some(path) = value.strip_prefix("dir:") {
            let path = path.trim();
            if path.is_empty() {
                return Err(VerlogError::InvalidFragmentSource(value.to_string()));
            }
            return Ok(Self::Directory(PathBuf::from(path)));
        }

        if value.contains(':') {
            return Err(VerlogError::InvalidFragmentSource(value.to_string()));
        }
        Ok(Self::Directory(PathBuf::from(value)))
    }
}

impl fmt::Display for FragmentSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("none"),
            Self::Directory(path) => write!(f, "dir:{}", path.display()),
            Self::Git => f.write_str("git"),
        }
    }
}

impl Serialize for FragmentSetting {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FragmentSetting {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Flag(false) => Ok(Self::Disabled),
            Raw::Flag(true) => Err(serde::de::Error::custom(
                "fragments: true is ambiguous, use `git` or `dir:<path>`",
            )),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// A configured source of pending entries.
#[derive(Debug)]
pub enum FragmentSource {
    /// Yields nothing.
    Null,
    /// Fragment files in a directory.
    Directory(DirectorySource),
    /// Commit message trailers since the last release tag.
    Trailers(TrailerSource),
}

impl FragmentSource {
    /// Builds the source described by `setting`.
    pub fn from_setting(
        setting: &FragmentSetting,
        sections: SectionSet,
        tag_pattern: Option<&str>,
    ) -> Result<Self, VerlogError> {
        Ok(match setting {
            FragmentSetting::Disabled => Self::Null,
            FragmentSetting::Directory(dir) => {
                Self::Directory(DirectorySource::new(dir.clone(), sections))
            }
            FragmentSetting::Git => Self::Trailers(TrailerSource::open(sections, tag_pattern)?),
        })
    }

    /// Pending entries grouped by section.
    pub fn read(&self) -> Changes {
        match self {
            Self::Null => Changes::new(),
            Self::Directory(source) => source.read(),
            Self::Trailers(source) => source.read(),
        }
    }

    /// Removes consumed fragments. Returns the number of deleted files.
    pub fn clear(&self) -> Result<usize> {
        match self {
            Self::Null => Ok(0),
            Self::Directory(source) => source.clear(),
            Self::Trailers(source) => {
                source.clear();
                Ok(0)
            }
        }
    }

    /// Whether this source never yields anything.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short human description used in messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Null => "disabled".to_string(),
            Self::Directory(source) => format!("directory {}", source.dir().display()),
            Self::Trailers(_) => "git commit trailers".to_string(),
        }
    }
}
