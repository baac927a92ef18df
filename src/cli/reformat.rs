//! `verlog reformat` and `verlog init`.

use anyhow::{bail, Result};
use clap::Parser;
use tracing::debug;

use super::common::{parse_changes, ConfigArgs};
use crate::config::Config;
use crate::release::{generate_changelog, INITIAL_VERSION};
use crate::version::VersionFile;

/// Rewrites the changelog in canonical form.
#[derive(Parser)]
pub struct ReformatCommand {
    /// Number of releases to keep; defaults to `version_limit`.
    #[arg(value_name = "LIMIT")]
    pub limit: Option<usize>,

    /// Configuration overrides.
    #[command(flatten)]
    pub config: ConfigArgs,
}

impl ReformatCommand {
    /// Executes the reformat command.
    pub fn execute(self) -> Result<()> {
        let mut config = self.config.resolve()?;
        if let Some(limit) = self.limit {
            config.version_limit = limit;
        }

        let changelog = config
            .updater()?
            .reformat_file(&config.changelog_file, &initial_version(&config))?;
        println!(
            "Reformatted {} ({} release(s))",
            config.changelog_file.display(),
            changelog.releases.len()
        );
        Ok(())
    }
}

/// Creates a changelog for the current version.
#[derive(Parser)]
pub struct InitCommand {
    /// Initial changelog entry as SECTION=TEXT; may be repeated.
    #[arg(long = "change", value_name = "SECTION=TEXT")]
    pub changes: Vec<String>,

    /// Overwrites an existing changelog.
    #[arg(long)]
    pub force: bool,

    /// Configuration overrides.
    #[command(flatten)]
    pub config: ConfigArgs,
}

impl InitCommand {
    /// Executes the init command.
    pub fn execute(self) -> Result<()> {
        let config = self.config.resolve()?;
        let path = &config.changelog_file;
        if path.exists() && !self.force {
            bail!("{} already exists; pass --force to overwrite it", path.display());
        }

        let changes = parse_changes(&self.changes)?;
        let version = initial_version(&config);
        generate_changelog(path, &version, (!changes.is_empty()).then_some(changes))?;
        println!("Created {} for version {version}", path.display());
        Ok(())
    }
}

/// Version read from the configured version file, or the initial version.
pub fn initial_version(config: &Config) -> String {
    let Some(path) = config.version_file.as_deref() else {
        return INITIAL_VERSION.to_string();
    };
    match VersionFile::new(path).current() {
        Ok(version) => version.to_string(),
        Err(e) => {
            debug!(error = %e, "Falling back to the initial version");
            INITIAL_VERSION.to_string()
        }
    }
}
