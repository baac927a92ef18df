//! Parsed dotted version strings.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use super::successor::{greek_index, successor};
use crate::error::VerlogError;

/// Matches a version embedded in arbitrary text: a numeric group followed by
/// one or more dot-separated alphanumeric groups.
#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
pub static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+(?:\.[0-9A-Za-z]+)+\b").unwrap());

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static EXACT_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.[0-9A-Za-z]+)*$").unwrap());

/// Which part of a version to advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// First group; resets minor and patch.
    Major,
    /// Second group; resets patch.
    Minor,
    /// Last group from the third onward.
    Patch,
    /// Last group from the fourth onward (pre-release identifiers).
    Pre,
}

impl Segment {
    /// Rank used when several bump requests are combined; higher wins.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Pre => 0,
            Self::Patch => 1,
            Self::Minor => 2,
            Self::Major => 3,
        }
    }
}

impl FromStr for Segment {
    type Err = VerlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            "pre" => Ok(Self::Pre),
            _ => Err(VerlogError::InvalidSegment(s.to_string())),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Major => "major",
            Self::Minor => "minor",
            Self::Patch => "patch",
            Self::Pre => "pre",
        };
        f.write_str(name)
    }
}

/// An immutable dotted version such as `1.2.3`, `0.1.B` or `2.32.beta`.
///
/// Each segment keeps its original text, so unchanged segments are written
/// back exactly as they were read (`2026.02.A` stays zero-padded).
#[derive(Debug, Clone)]
pub struct VersionToken {
    segments: Vec<String>,
}

impl VersionToken {
    /// Extracts the first version found anywhere in `text`.
    pub fn parse(text: &str) -> Result<Self, VerlogError> {
        VERSION_PATTERN
            .find(text)
            .map(|m| Self::from_segments(m.as_str()))
            .ok_or_else(|| {
                VerlogError::Format(format!(
                    "no version pattern in {:?}",
                    text.chars().take(60).collect::<String>()
                ))
            })
    }

    fn from_segments(version: &str) -> Self {
        Self {
            segments: version.split('.').map(str::to_string).collect(),
        }
    }

    /// Raw text of each dot-separated group.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    fn segment(&self, index: usize) -> &str {
        self.segments.get(index).map_or("0", String::as_str)
    }

    /// Returns the version that follows this one in `segment`.
    pub fn bump(&self, segment: Segment) -> Result<Self, VerlogError> {
        let segments = match segment {
            Segment::Major => vec![successor(self.segment(0))?, "0".into(), "0".into()],
            Segment::Minor => vec![
                self.segment(0).to_string(),
                successor(self.segment(1))?,
                "0".into(),
            ],
            Segment::Patch => self.advance_last_from(2)?,
            Segment::Pre => {
                if self.segments.len() < 4 {
                    return Err(VerlogError::Format(format!(
                        "'{self}' has no pre-release group to advance"
                    )));
                }
                self.advance_last_from(3)?
            }
        };

        Ok(Self { segments })
    }

    /// Keeps every group, padding with zeros up to `anchor`, and advances the
    /// last one.
    fn advance_last_from(&self, anchor: usize) -> Result<Vec<String>, VerlogError> {
        let mut segments = self.segments.clone();
        while segments.len() <= anchor {
            segments.push("0".to_string());
        }
        if let Some(last) = segments.last_mut() {
            *last = successor(last)?;
        }
        Ok(segments)
    }
}

impl FromStr for VersionToken {
    type Err = VerlogError;

    /// Parses a string that is exactly a version (no surrounding text).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if EXACT_VERSION.is_match(s) {
            Ok(Self::from_segments(s))
        } else {
            Err(VerlogError::Format(format!("'{s}' is not a version")))
        }
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl PartialEq for VersionToken {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for VersionToken {}

impl PartialOrd for VersionToken {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionToken {
    /// Numbers compare numerically, Greek names by alphabet position, other
    /// text lexically, and text sorts below numbers so `1.1.0.pre1` < `1.1.0`.
    /// Missing groups count as `0`.
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        (0..len)
            .map(|i| compare_segments(self.segment(i), other.segment(i)))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn compare_segments(a: &str, b: &str) -> Ordering {
    match (is_numeric(a), is_numeric(b)) {
        (true, true) => {
            let a = a.trim_start_matches('0');
            let b = b.trim_start_matches('0');
            a.len().cmp(&b.len()).then_with(|| a.cmp(b))
        }
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match (greek_index(a), greek_index(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => a.cmp(b),
        },
    }
}
