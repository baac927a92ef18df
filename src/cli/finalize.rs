//! `verlog finalize`: date the unreleased changelog record.

use anyhow::Result;
use chrono::Local;
use clap::Parser;

use super::common::{ConfigArgs, Publish};
use crate::version::VersionFile;

/// Sets the release date of the unreleased changelog record.
#[derive(Parser)]
pub struct FinalizeCommand {
    /// Release date; defaults to today.
    #[arg(value_name = "DATE")]
    pub date: Option<String>,

    /// Skips the commit even when configured.
    #[arg(long)]
    pub no_commit: bool,

    /// Configuration overrides.
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Today's date as `YYYY-MM-DD`.
pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

impl FinalizeCommand {
    /// Executes the finalize command.
    pub fn execute(self) -> Result<()> {
        let config = self.config.resolve()?;
        let date = self.date.unwrap_or_else(today);
        let updater = config.updater()?;

        let (version, date) = updater.finalize_file(&config.changelog_file, &date)?;
        println!("Finalized {version} on {date}");

        let mut paths = vec![config.changelog_file.as_path()];
        if let Some(path) = config.version_file.as_deref() {
            if VersionFile::new(path).set_release_date(&date)? {
                println!("Set release date in {}", path.display());
            }
            paths.push(path);
        }

        Publish {
            branch: config.branch.then(|| format!("finalize/{version}")),
            commit_message: (config.commit_finalize && !self.no_commit)
                .then(|| format!("Finalize the changelog for version {version} on {date}")),
            paths,
            push: config.push,
        }
        .run()
    }
}
