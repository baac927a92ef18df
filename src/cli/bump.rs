//! `verlog bump`: advance the version and open a changelog record for it.

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use super::common::{parse_changes, require_version_file, ConfigArgs, Publish};
use crate::changelog::UNRELEASED;
use crate::fragments::{FragmentSetting, FragmentSource};
use crate::release::{plan_trailer_bump, write_changelog, TrailerBump};
use crate::version::VersionFile;

/// Bumps the version file and adds the new version to the changelog.
#[derive(Parser)]
pub struct BumpCommand {
    /// Segment to bump: major, minor, patch or pre.
    #[arg(value_name = "SEGMENT", conflicts_with = "from_trailers")]
    pub segment: Option<String>,

    /// Date recorded for the new version.
    #[arg(long, default_value = UNRELEASED)]
    pub date: String,

    /// Changelog entry as SECTION=TEXT; may be repeated.
    #[arg(long = "change", value_name = "SECTION=TEXT")]
    pub changes: Vec<String>,

    /// Bump by the highest `Version:` trailer since the last release tag.
    #[arg(long)]
    pub from_trailers: bool,

    /// Skips the commit even when configured.
    #[arg(long)]
    pub no_commit: bool,

    /// Configuration overrides.
    #[command(flatten)]
    pub config: ConfigArgs,
}

impl BumpCommand {
    /// Executes the bump command.
    pub fn execute(self) -> Result<()> {
        let config = self.config.resolve()?;
        let version_path = require_version_file(&config)?;
        let version_file = VersionFile::new(version_path);
        let mut updater = config.updater()?;

        let segment = if self.from_trailers {
            let FragmentSource::Trailers(trailers) = updater.fragments() else {
                anyhow::bail!("--from-trailers requires `fragments: git`");
            };
            let current = version_file.current()?;
            let plan = plan_trailer_bump(
                &current,
                trailers.last_tag_version().as_deref(),
                trailers.read_version_bump(),
            )?;
            debug!(plan = ?plan, "Planned trailer bump");
            match plan {
                TrailerBump::NotRequested => {
                    println!("No Version: trailer since the last release tag, nothing to bump");
                    return Ok(());
                }
                TrailerBump::AlreadyBumped { segment, current } => {
                    println!("Version already bumped to {current} ({segment} requested), skipping");
                    return Ok(());
                }
                TrailerBump::Bump(segment) => segment.to_string(),
            }
        } else {
            self.segment.unwrap_or_else(|| "patch".to_string())
        };

        let changes = parse_changes(&self.changes)?;
        let next = version_file.preview(&segment)?;
        let changelog =
            updater.prepare_update(&config.changelog_file, &next, &self.date, &changes)?;
        write_changelog(&config.changelog_file, &changelog)?;
        let outcome = version_file.bump(&segment)?;
        println!("Bumped {} -> {}", outcome.previous, outcome.current);

        if config.clear_fragments {
            let cleared = updater.fragments().clear()?;
            if cleared > 0 {
                println!("Cleared {cleared} fragment file(s)");
            }
        }

        let mut paths = vec![version_path, config.changelog_file.as_path()];
        if let FragmentSetting::Directory(dir) = &config.fragments {
            if config.clear_fragments && dir.exists() {
                paths.push(dir.as_path());
            }
        }
        if let Some(dir) = config.retain_changelogs.as_deref().filter(|dir| dir.exists()) {
            paths.push(dir);
        }

        Publish {
            branch: config
                .branch
                .then(|| format!("release/{}", outcome.current)),
            commit_message: (config.commit && !self.no_commit)
                .then(|| format!("Bump version to {}", outcome.current)),
            paths,
            push: config.push,
        }
        .run()
    }
}
