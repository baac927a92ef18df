//! Lenient Keep a Changelog reader.
//!
//! Parsing never fails. Anything that is not a title, a version header, a
//! section header, a bullet or a link reference definition is either folded
//! into the surrounding entry or dropped.

use std::iter::Peekable;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::model::{Changelog, Changes, Release, UNRELEASED};

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static LINK_DEFINITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[[^\]]+\]:\s*\S").unwrap());

/// Parses changelog Markdown into a [`Changelog`].
pub fn parse(text: &str) -> Changelog {
    let mut text = text.replace("\r\n", "\n");
    if !text.ends_with('\n') {
        text.push('\n');
    }

    let mut lines = text.lines().peekable();
    let mut changelog = Changelog::default();

    let mut title_seen = false;
    let mut preamble = Vec::new();
    while let Some(line) = lines.next_if(|line| !is_version_header(line)) {
        if !title_seen {
            if let Some(title) = line.strip_prefix("# ") {
                changelog.title = title.trim().to_string();
                title_seen = true;
                continue;
            }
        }
        preamble.push(line);
    }
    changelog.preamble = preamble.join("\n").trim().to_string();

    while let Some(header) = lines.next() {
        let mut release = parse_version_header(&header[3..]);
        parse_release_body(&mut lines, &mut release.changes, &mut changelog.links);
        debug!(
            version = %release.version,
            date = %release.date,
            sections = release.changes.len(),
            "Parsed release"
        );
        changelog.releases.push(release);
    }

    changelog
}

fn is_version_header(line: &str) -> bool {
    line.starts_with("## ")
}

fn parse_version_header(header: &str) -> Release {
    let header = header.trim();
    let (version, date) = match header.split_once(" - ") {
        Some((version, date)) => (version, date.trim()),
        None => (header, UNRELEASED),
    };
    let version: String = version
        .chars()
        .filter(|c| *c != '[' && *c != ']')
        .collect();
    let date = if date.is_empty() { UNRELEASED } else { date };

    Release::new(version.trim(), date)
}

/// Strips a bullet marker, returning the entry text.
fn bullet(trimmed: &str) -> Option<&str> {
    if trimmed == "-" || trimmed == "*" {
        return Some("");
    }
    trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("* "))
}

fn parse_release_body<'a, I>(
    lines: &mut Peekable<I>,
    changes: &mut Changes,
    links: &mut Vec<String>,
) where
    I: Iterator<Item = &'a str>,
{
    let mut section: Option<String> = None;
    let mut entry: Option<String> = None;

    while let Some(line) = lines.next_if(|line| !is_version_header(line)) {
        let trimmed = line.trim();

        if let Some(name) = line.strip_prefix("### ") {
            flush(changes, section.as_deref(), entry.take());
            let name = name.trim().to_string();
            changes.section_mut(&name);
            section = Some(name);
        } else if trimmed.is_empty() {
            continue;
        } else if LINK_DEFINITION.is_match(trimmed) {
            flush(changes, section.as_deref(), entry.take());
            links.push(trimmed.to_string());
        } else if let Some(text) = bullet(trimmed) {
            flush(changes, section.as_deref(), entry.take());
            entry = Some(text.trim().to_string());
        } else if let Some(current) = entry.as_mut() {
            if current.is_empty() {
                current.push_str(trimmed);
            } else {
                current.push_str("\n  ");
                current.push_str(trimmed);
            }
        } else if section.is_some() {
            entry = Some(trimmed.to_string());
        } else {
            debug!(line = %trimmed, "Dropping text outside of a section");
        }
    }

    flush(changes, section.as_deref(), entry);
}

fn flush(changes: &mut Changes, section: Option<&str>, entry: Option<String>) {
    let (Some(section), Some(entry)) = (section, entry) else {
        return;
    };
    if entry.is_empty() {
        return;
    }
    changes.push(section, entry);
}
