//! `verlog preview` and `verlog clear-fragments`.

use std::io;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use super::common::ConfigArgs;
use crate::changelog::Changes;
use crate::fragments::{display_rank, FragmentSource};

/// Output format of the preview.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewFormat {
    /// Colored, human-readable listing.
    #[default]
    Text,
    /// YAML mapping of section to entries.
    Yaml,
    /// JSON object of section to entries.
    Json,
}

/// Lists the entries the next bump would add, without changing anything.
#[derive(Parser)]
pub struct PreviewCommand {
    /// Output format.
    #[arg(long, value_enum, default_value_t = PreviewFormat::Text)]
    pub format: PreviewFormat,

    /// Configuration overrides.
    #[command(flatten)]
    pub config: ConfigArgs,
}

impl PreviewCommand {
    /// Executes the preview command.
    pub fn execute(self) -> Result<()> {
        let config = self.config.resolve()?;
        let source = config.fragment_source()?;
        let changes = source.read();

        match self.format {
            PreviewFormat::Text => {
                let mut stdout = StandardStream::stdout(ColorChoice::Auto);
                render_preview(&mut stdout, &source, &changes)
                    .context("Failed to write preview")?;
            }
            PreviewFormat::Yaml => {
                print!("{}", serde_yaml::to_string(&changes).context("Failed to serialize preview")?);
            }
            PreviewFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&changes).context("Failed to serialize preview")?
                );
            }
        }
        Ok(())
    }
}

/// Writes pending entries grouped by section, canonical sections first.
pub fn render_preview<W: WriteColor>(
    out: &mut W,
    source: &FragmentSource,
    changes: &Changes,
) -> io::Result<()> {
    if let FragmentSource::Trailers(trailers) = source {
        match trailers.last_tag() {
            Some(tag) => writeln!(out, "Changes since {tag}")?,
            None => writeln!(out, "No release tag found, showing all commits")?,
        }
        writeln!(out)?;
    }

    if changes.entry_count() == 0 {
        writeln!(out, "No changelog entries found ({})", source.describe())?;
        return Ok(());
    }

    let mut sections: Vec<(&str, &[String])> = changes
        .iter()
        .filter(|(_, entries)| !entries.is_empty())
        .collect();
    sections.sort_by_key(|(name, _)| display_rank(name));

    let mut heading = ColorSpec::new();
    heading.set_fg(Some(Color::Green)).set_bold(true);

    for (name, entries) in sections {
        out.set_color(&heading)?;
        write!(out, "{name}")?;
        out.reset()?;
        writeln!(out)?;
        for entry in entries {
            writeln!(out, "  - {}", entry.replace('\n', "\n  "))?;
        }
        writeln!(out)?;
    }

    writeln!(out, "Total: {} entries", changes.entry_count())
}

/// Deletes fragment files from the configured directory.
#[derive(Parser)]
pub struct ClearFragmentsCommand {
    /// Configuration overrides.
    #[command(flatten)]
    pub config: ConfigArgs,
}

impl ClearFragmentsCommand {
    /// Executes the clear-fragments command.
    pub fn execute(self) -> Result<()> {
        let config = self.config.resolve()?;
        let source = config.fragment_source()?;
        let FragmentSource::Directory(directory) = &source else {
            println!("Nothing to clear ({})", source.describe());
            return Ok(());
        };

        let cleared = directory.clear()?;
        println!(
            "Cleared {cleared} fragment file(s) from {}",
            directory.dir().display()
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::fragments::{DirectorySource, SectionSet};
    use termcolor::NoColor;

    fn render(source: &FragmentSource, changes: &Changes) -> String {
        let mut out = NoColor::new(Vec::new());
        render_preview(&mut out, source, changes).unwrap();
        String::from_utf8(out.into_inner()).unwrap()
    }

    #[test]
    fn preview_lists_sections_in_conventional_order() {
        let changes: Changes = [
            ("Security", vec!["Patched CVE"]),
            ("Added", vec!["New flag", "Second line\n  wrapped"]),
            ("Changed", vec![]),
        ]
        .into_iter()
        .collect();

        insta::assert_snapshot!(render(&FragmentSource::Null, &changes), @r"
        Added
          - New flag
          - Second line
            wrapped

        Security
          - Patched CVE

        Total: 3 entries
        ");
    }

    #[test]
    fn preview_names_source_when_empty() {
        let source = FragmentSource::Directory(DirectorySource::new(
            "changelog.d",
            SectionSet::default(),
        ));

        assert_eq!(
            render(&source, &Changes::new()),
            "No changelog entries found (directory changelog.d)\n"
        );
    }
}
