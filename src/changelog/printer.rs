//! Canonical Markdown writer.

use super::model::{Changelog, Release, DEFAULT_PREAMBLE, DEFAULT_TITLE, UNRELEASED};

/// Renders `changelog` in canonical form.
///
/// The output ends with exactly one newline and re-parses to the same
/// document.
pub fn print(changelog: &Changelog) -> String {
    let title = non_empty_or(&changelog.title, DEFAULT_TITLE);
    let preamble = non_empty_or(&changelog.preamble, DEFAULT_PREAMBLE);

    let mut lines = vec![format!("# {title}"), String::new(), preamble.to_string(), String::new()];

    if changelog.releases.is_empty() {
        lines.push(format!("## [0.0.0] - {UNRELEASED}"));
    }

    for (index, release) in changelog.releases.iter().enumerate() {
        if index > 0 {
            lines.push(String::new());
        }
        push_release(&mut lines, release);
    }

    if !changelog.links.is_empty() {
        lines.push(String::new());
        lines.extend(changelog.links.iter().cloned());
    }

    let mut text = lines.join("\n");
    text.push('\n');
    text
}

/// Renders a single release block without the document header.
pub fn print_release(release: &Release) -> String {
    let mut lines = Vec::new();
    push_release(&mut lines, release);
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn push_release(lines: &mut Vec<String>, release: &Release) {
    let date = non_empty_or(&release.date, UNRELEASED);
    lines.push(format!("## [{}] - {date}", release.version));

    for (section, entries) in release.changes.iter() {
        lines.push(String::new());
        lines.push(format!("### {section}"));
        if entries.is_empty() {
            continue;
        }
        lines.push(String::new());
        for entry in entries {
            if let Some(entry) = format_entry(entry) {
                lines.push(entry);
            }
        }
    }
}

/// Formats one bullet, indenting continuation lines by two spaces.
fn format_entry(entry: &str) -> Option<String> {
    let mut parts = entry.lines().map(str::trim).filter(|line| !line.is_empty());
    let first = parts.next()?;
    let mut text = format!("- {first}");
    for line in parts {
        text.push_str("\n  ");
        text.push_str(line);
    }
    Some(text)
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    let value = value.trim();
    if value.is_empty() {
        fallback
    } else {
        value
    }
}
