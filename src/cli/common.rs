//! Options and steps shared by the release commands.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::changelog::Changes;
use crate::config::Config;
use crate::fragments::FragmentSetting;
use crate::git::GitCommand;

/// Command-line overrides for the loaded configuration.
#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    /// File carrying the project version.
    #[arg(long, value_name = "PATH")]
    pub version_file: Option<PathBuf>,
    /// Changelog to maintain.
    #[arg(long, value_name = "PATH")]
    pub changelog_file: Option<PathBuf>,
    /// Fragment source: `none`, `git` or `dir:<path>`.
    #[arg(long, value_name = "SOURCE")]
    pub fragments: Option<FragmentSetting>,
    /// Regex selecting release tags when reading commit trailers.
    #[arg(long, value_name = "REGEX")]
    pub tag_pattern: Option<String>,
}

impl ConfigArgs {
    /// Loads the configuration and applies these overrides.
    pub fn resolve(&self) -> Result<Config> {
        let mut config = Config::load()?;
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// Applies the overrides to `config`.
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.version_file {
            config.version_file = Some(path.clone());
        }
        if let Some(path) = &self.changelog_file {
            config.changelog_file = path.clone();
        }
        if let Some(fragments) = &self.fragments {
            config.fragments = fragments.clone();
        }
        if let Some(pattern) = &self.tag_pattern {
            config.tag_pattern = Some(pattern.clone());
        }
    }
}

/// Returns the configured version file or explains how to set one.
pub fn require_version_file(config: &Config) -> Result<&Path> {
    config
        .version_file
        .as_deref()
        .context("No version file configured; set `version_file` in .verlog.yaml or pass --version-file")
}

/// Parses repeated `Section=Text` arguments into changes.
pub fn parse_changes(values: &[String]) -> Result<Changes> {
    let mut changes = Changes::new();
    for value in values {
        let Some((section, text)) = value.split_once('=') else {
            bail!("Invalid change '{value}', expected SECTION=TEXT");
        };
        let (section, text) = (section.trim(), text.trim());
        if section.is_empty() || text.is_empty() {
            bail!("Invalid change '{value}', section and text must not be empty");
        }
        let section = crate::fragments::capitalize(section);
        if !changes.get(&section).is_some_and(|entries| entries.iter().any(|e| e == text)) {
            changes.push(&section, text);
        }
    }
    Ok(changes)
}

/// Branch, commit and push steps that follow a file update.
#[derive(Debug)]
pub struct Publish<'a> {
    /// Branch to create before committing.
    pub branch: Option<String>,
    /// Commit message, when committing.
    pub commit_message: Option<String>,
    /// Paths to stage.
    pub paths: Vec<&'a Path>,
    /// Push the branch afterwards.
    pub push: bool,
}

impl Publish<'_> {
    /// Runs the configured steps in the current directory.
    pub fn run(&self) -> Result<()> {
        if self.branch.is_none() && self.commit_message.is_none() && !self.push {
            return Ok(());
        }

        let git = GitCommand::new(".");
        if let Some(branch) = &self.branch {
            git.create_branch(branch)?;
            println!("Switched to branch {branch}");
        }
        if let Some(message) = &self.commit_message {
            git.commit_paths(&self.paths, message)?;
            println!("Committed: {message}");
        }
        if self.push {
            git.push_current_branch()?;
            println!("Pushed to origin");
        }
        Ok(())
    }
}
