//! Release configuration.
//!
//! Values are resolved in increasing order of precedence: built-in defaults,
//! the YAML config file, `VERLOG_*` environment variables (or their fallback
//! in `~/.verlog/settings.json`), then command-line flags applied by the
//! caller.
//!
//! ```yaml
//! version_file: lib/my_gem/version.rb
//! changelog_file: CHANGELOG.md
//! version_limit: 2
//! fragments: dir:changelog.d   # or `git`, or `none`
//! tag_pattern: '^v(\d+\.\d+\.\d+)$'
//! sections: [Added, Changed, Fixed]
//! retain_changelogs: doc/releases
//! clear_fragments: true
//! commit: true
//! commit_finalize: true
//! branch: true
//! push: false
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::VerlogError;
use crate::fragments::{FragmentSetting, FragmentSource, SectionSet};
use crate::release::{ChangelogUpdater, Retention, DEFAULT_VERSION_LIMIT};
use crate::utils::settings::Settings;

/// Project config file name, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = ".verlog.yaml";

/// Default changelog path.
pub const DEFAULT_CHANGELOG_FILE: &str = "CHANGELOG.md";

/// Environment variable overriding `version_file`.
pub const ENV_VERSION_FILE: &str = "VERLOG_VERSION_FILE";
/// Environment variable overriding `changelog_file`.
pub const ENV_CHANGELOG_FILE: &str = "VERLOG_CHANGELOG_FILE";
/// Environment variable overriding `version_limit`.
pub const ENV_VERSION_LIMIT: &str = "VERLOG_VERSION_LIMIT";
/// Environment variable overriding `fragments`.
pub const ENV_FRAGMENTS: &str = "VERLOG_FRAGMENTS";
/// Environment variable overriding `tag_pattern`.
pub const ENV_TAG_PATTERN: &str = "VERLOG_TAG_PATTERN";

/// Config file contents; every key is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// File carrying the project version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_file: Option<PathBuf>,
    /// Changelog path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changelog_file: Option<PathBuf>,
    /// Number of releases kept in the changelog.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_limit: Option<usize>,
    /// Fragment source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragments: Option<FragmentSetting>,
    /// Pattern selecting release tags for trailer harvesting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_pattern: Option<String>,
    /// Accepted fragment sections.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<String>>,
    /// Directory receiving a full changelog copy per release.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retain_changelogs: Option<PathBuf>,
    /// Delete directory fragments after a bump.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clear_fragments: Option<bool>,
    /// Commit after a bump.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<bool>,
    /// Commit after finalizing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_finalize: Option<bool>,
    /// Work on a release branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<bool>,
    /// Push after committing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push: Option<bool>,
}

impl FileConfig {
    /// Renders the config as YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize config")
    }

    /// Parses YAML config text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("Failed to parse config YAML")
    }

    /// Reads a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("Invalid config file: {}", path.display()))
    }
}

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// File carrying the project version, if any.
    pub version_file: Option<PathBuf>,
    /// Changelog path.
    pub changelog_file: PathBuf,
    /// Number of releases kept in the changelog.
    pub version_limit: usize,
    /// Fragment source.
    pub fragments: FragmentSetting,
    /// Pattern selecting release tags; `None` uses the built-in pattern.
    pub tag_pattern: Option<String>,
    /// Accepted fragment sections.
    pub sections: SectionSet,
    /// Archive directory for full changelog copies.
    pub retain_changelogs: Option<PathBuf>,
    /// Delete directory fragments after a bump.
    pub clear_fragments: bool,
    /// Commit after a bump.
    pub commit: bool,
    /// Commit after finalizing.
    pub commit_finalize: bool,
    /// Work on a release branch.
    pub branch: bool,
    /// Push after committing.
    pub push: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version_file: None,
            changelog_file: PathBuf::from(DEFAULT_CHANGELOG_FILE),
            version_limit: DEFAULT_VERSION_LIMIT,
            fragments: FragmentSetting::Disabled,
            tag_pattern: None,
            sections: SectionSet::canonical(),
            retain_changelogs: None,
            clear_fragments: false,
            commit: false,
            commit_finalize: false,
            branch: false,
            push: false,
        }
    }
}

impl Config {
    /// Loads configuration for the current directory.
    pub fn load() -> Result<Self> {
        let settings = Settings::load()?;
        Self::load_from(Path::new("."), |key| settings.get_env_var(key))
    }

    /// Loads configuration for `dir`, reading overrides through `env`.
    pub fn load_from<F>(dir: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match locate_config(dir) {
            Some(path) => {
                debug!(file = %path.display(), "Loading config");
                FileConfig::load(&path)?
            }
            None => FileConfig::default(),
        };

        let mut config = Self::from_file(file);
        config.apply_env(env)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies config file values over the defaults.
    pub fn from_file(file: FileConfig) -> Self {
        let defaults = Self::default();
        Self {
            version_file: file.version_file,
            changelog_file: file.changelog_file.unwrap_or(defaults.changelog_file),
            version_limit: file.version_limit.unwrap_or(defaults.version_limit),
            fragments: file.fragments.unwrap_or(defaults.fragments),
            tag_pattern: file.tag_pattern,
            sections: file.sections.map(SectionSet::new).unwrap_or(defaults.sections),
            retain_changelogs: file.retain_changelogs,
            clear_fragments: file.clear_fragments.unwrap_or(defaults.clear_fragments),
            commit: file.commit.unwrap_or(defaults.commit),
            commit_finalize: file.commit_finalize.unwrap_or(defaults.commit_finalize),
            branch: file.branch.unwrap_or(defaults.branch),
            push: file.push.unwrap_or(defaults.push),
        }
    }

    /// Every resolved value in config file form.
    pub fn to_file_config(&self) -> FileConfig {
        FileConfig {
            version_file: self.version_file.clone(),
            changelog_file: Some(self.changelog_file.clone()),
            version_limit: Some(self.version_limit),
            fragments: Some(self.fragments.clone()),
            tag_pattern: self.tag_pattern.clone(),
            sections: Some(self.sections.names().to_vec()),
            retain_changelogs: self.retain_changelogs.clone(),
            clear_fragments: Some(self.clear_fragments),
            commit: Some(self.commit),
            commit_finalize: Some(self.commit_finalize),
            branch: Some(self.branch),
            push: Some(self.push),
        }
    }

    /// Applies `VERLOG_*` overrides.
    pub fn apply_env<F>(&mut self, env: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = env(ENV_VERSION_FILE) {
            self.version_file = Some(PathBuf::from(value));
        }
        if let Some(value) = env(ENV_CHANGELOG_FILE) {
            self.changelog_file = PathBuf::from(value);
        }
        if let Some(value) = env(ENV_VERSION_LIMIT) {
            self.version_limit = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid {ENV_VERSION_LIMIT}: {value}"))?;
        }
        if let Some(value) = env(ENV_FRAGMENTS) {
            self.fragments = value
                .parse()
                .with_context(|| format!("Invalid {ENV_FRAGMENTS}: {value}"))?;
        }
        if let Some(value) = env(ENV_TAG_PATTERN) {
            self.tag_pattern = Some(value);
        }
        Ok(())
    }

    /// Checks values that can only be judged after all layers are applied.
    pub fn validate(&self) -> Result<(), VerlogError> {
        if let Some(pattern) = &self.tag_pattern {
            Regex::new(pattern).map_err(|source| VerlogError::InvalidTagPattern {
                pattern: pattern.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Builds the configured fragment source.
    pub fn fragment_source(&self) -> Result<FragmentSource, VerlogError> {
        FragmentSource::from_setting(
            &self.fragments,
            self.sections.clone(),
            self.tag_pattern.as_deref(),
        )
    }

    /// Builds an updater with the configured fragments, window and archive.
    pub fn updater(&self) -> Result<ChangelogUpdater> {
        let mut updater = ChangelogUpdater::new()
            .with_fragments(self.fragment_source()?)
            .with_limit(self.version_limit);
        if let Some(dir) = &self.retain_changelogs {
            updater = updater.with_retention(Retention::Directory(dir.clone()));
        }
        Ok(updater)
    }
}

/// Finds the config file for `dir`: the project file, then the user file.
pub fn locate_config(dir: &Path) -> Option<PathBuf> {
    let project = dir.join(PROJECT_CONFIG_FILE);
    if project.is_file() {
        return Some(project);
    }
    let user = dirs::config_dir()?.join("verlog").join("config.yaml");
    user.is_file().then_some(user)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_without_file() {
        let config = Config::from_file(FileConfig::default());

        assert_eq!(config, Config::default());
        assert_eq!(config.changelog_file, PathBuf::from("CHANGELOG.md"));
        assert_eq!(config.version_limit, 2);
        assert_eq!(config.fragments, FragmentSetting::Disabled);
    }

    #[test]
    fn parses_full_yaml() {
        let file = FileConfig::from_yaml(
            r#"
version_file: lib/gem/version.rb
changelog_file: HISTORY.md
version_limit: 5
fragments: dir:changelog.d
tag_pattern: '^release-(\d+\.\d+\.\d+)$'
sections: [added, Performance]
retain_changelogs: doc/releases
clear_fragments: true
commit: true
push: true
"#,
        )
        .unwrap();

        let config = Config::from_file(file);

        assert_eq!(config.version_file, Some(PathBuf::from("lib/gem/version.rb")));
        assert_eq!(config.changelog_file, PathBuf::from("HISTORY.md"));
        assert_eq!(config.version_limit, 5);
        assert_eq!(
            config.fragments,
            FragmentSetting::Directory(PathBuf::from("changelog.d"))
        );
        assert_eq!(config.sections.names(), ["Added", "Performance"]);
        assert!(config.clear_fragments && config.commit && config.push);
        assert!(!config.branch && !config.commit_finalize);
        config.validate().unwrap();
    }

    #[test]
    fn rejects_unknown_keys_and_sources() {
        assert!(FileConfig::from_yaml("changelog: x.md").is_err());
        assert!(FileConfig::from_yaml("fragments: svn:trunk").is_err());
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(FileConfig::from_yaml("\n").unwrap(), FileConfig::default());
    }

    #[test]
    fn env_overrides_file_values() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(PROJECT_CONFIG_FILE),
            "changelog_file: FILE.md\nversion_limit: 4\n",
        )
        .unwrap();
        let env: HashMap<&str, &str> = [
            (ENV_CHANGELOG_FILE, "ENV.md"),
            (ENV_FRAGMENTS, "git"),
            (ENV_VERSION_FILE, "VERSION"),
        ]
        .into_iter()
        .collect();

        let config =
            Config::load_from(dir.path(), |key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.changelog_file, PathBuf::from("ENV.md"));
        assert_eq!(config.version_limit, 4);
        assert_eq!(config.fragments, FragmentSetting::Git);
        assert_eq!(config.version_file, Some(PathBuf::from("VERSION")));
    }

    #[test]
    fn invalid_env_limit_is_an_error() {
        let mut config = Config::default();
        let err = config
            .apply_env(|key| (key == ENV_VERSION_LIMIT).then(|| "many".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_VERSION_LIMIT));
    }

    #[test]
    fn invalid_tag_pattern_fails_validation() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(PROJECT_CONFIG_FILE), "tag_pattern: 'v('\n").unwrap();

        let err = Config::load_from(dir.path(), no_env).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<VerlogError>(),
            Some(VerlogError::InvalidTagPattern { .. })
        ));
    }

    #[test]
    fn resolved_config_renders_as_loadable_yaml() {
        let config = Config {
            fragments: FragmentSetting::Directory(PathBuf::from("changelog.d")),
            commit: true,
            ..Config::default()
        };

        let yaml = config.to_file_config().to_yaml().unwrap();

        assert!(yaml.contains("dir:changelog.d"));
        assert!(!yaml.contains("version_file"));
        let reloaded = Config::from_file(FileConfig::from_yaml(&yaml).unwrap());
        assert_eq!(reloaded, config);
    }

    #[test]
    fn updater_uses_configured_window() {
        let config = Config {
            version_limit: 7,
            ..Config::default()
        };
        let updater = config.updater().unwrap();

        assert_eq!(updater.limit(), 7);
        assert!(updater.fragments().is_null());
    }
}
