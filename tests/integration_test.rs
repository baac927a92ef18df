use anyhow::Result;
use git2::{Repository, Signature};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Temporary project directory backed by a git repository.
struct TestRepo {
    _temp_dir: TempDir,
    repo_path: PathBuf,
    repo: Repository,
}

impl TestRepo {
    fn new() -> Result<Self> {
        let temp_dir = tempfile::tempdir()?;
        let repo_path = temp_dir.path().to_path_buf();

        let repo = Repository::init(&repo_path)?;

        let mut config = repo.config()?;
        config.set_str("user.name", "Test User")?;
        config.set_str("user.email", "test@example.com")?;

        Ok(Self {
            _temp_dir: temp_dir,
            repo_path,
            repo,
        })
    }

    fn path(&self) -> &Path {
        &self.repo_path
    }

    fn write(&self, name: &str, content: &str) -> Result<()> {
        let path = self.repo_path.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    fn read(&self, name: &str) -> String {
        fs::read_to_string(self.repo_path.join(name)).unwrap_or_default()
    }

    fn add_commit(&self, message: &str, file: &str, content: &str) -> Result<git2::Oid> {
        self.write(file, content)?;

        let mut index = self.repo.index()?;
        index.add_path(Path::new(file))?;
        index.write()?;

        let signature = Signature::now("Test User", "test@example.com")?;
        let tree = self.repo.find_tree(index.write_tree()?)?;
        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        Ok(self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?)
    }

    fn tag(&self, name: &str, oid: git2::Oid) -> Result<()> {
        let object = self.repo.find_object(oid, None)?;
        self.repo.tag_lightweight(name, &object, false)?;
        Ok(())
    }

    fn head_message(&self) -> Result<String> {
        let commit = self.repo.head()?.peel_to_commit()?;
        Ok(commit.message().unwrap_or_default().trim().to_string())
    }

    /// Runs the verlog binary inside the repository with an isolated
    /// environment.
    fn verlog(&self, args: &[&str]) -> Output {
        let mut command = Command::new(env!("CARGO_BIN_EXE_verlog"));
        command
            .args(args)
            .current_dir(&self.repo_path)
            .env("HOME", &self.repo_path)
            .env("XDG_CONFIG_HOME", self.repo_path.join(".config"))
            .env("RUST_LOG", "warn");
        for key in [
            "VERLOG_VERSION_FILE",
            "VERLOG_CHANGELOG_FILE",
            "VERLOG_VERSION_LIMIT",
            "VERLOG_FRAGMENTS",
            "VERLOG_TAG_PATTERN",
        ] {
            command.env_remove(key);
        }
        command.output().expect("failed to run verlog")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "verlog failed\nstdout: {}\nstderr: {}",
        stdout(output),
        stderr(output)
    );
}

#[test]
fn init_creates_changelog_once() -> Result<()> {
    let repo = TestRepo::new()?;
    repo.write("version.rb", "VERSION = \"1.2.3\"\n")?;
    repo.write(".verlog.yaml", "version_file: version.rb\n")?;

    let output = repo.verlog(&["init", "--change", "added=First cut"]);
    assert_success(&output);
    assert!(stdout(&output).contains("for version 1.2.3"));

    let changelog = repo.read("CHANGELOG.md");
    assert!(changelog.starts_with("# Changelog\n"));
    assert!(changelog.contains("## [1.2.3] - Unreleased\n\n### Added\n\n- First cut\n"));

    let again = repo.verlog(&["init"]);
    assert!(!again.status.success());
    assert!(stderr(&again).contains("already exists"));

    let forced = repo.verlog(&["init", "--force"]);
    assert_success(&forced);
    assert!(repo.read("CHANGELOG.md").contains("- Initial release"));
    Ok(())
}

#[test]
fn bump_merges_changes_and_fragments() -> Result<()> {
    let repo = TestRepo::new()?;
    repo.write("version.rb", "VERSION = \"1.2.3\"\nRELEASE_DATE = \"2024-01-01\"\n")?;
    repo.write(
        ".verlog.yaml",
        "version_file: version.rb\nfragments: dir:changelog.d\nclear_fragments: true\n",
    )?;
    repo.write("changelog.d/1.fixed.md", "Crash on empty input\n")?;
    repo.write("changelog.d/2.bogus.md", "Ignored section\n")?;

    let output = repo.verlog(&["bump", "minor", "--change", "added=New flag"]);
    assert_success(&output);
    assert!(stdout(&output).contains("Bumped 1.2.3 -> 1.3.0"));

    let version = repo.read("version.rb");
    assert!(version.contains("VERSION = \"1.3.0\""));
    assert!(version.contains("RELEASE_DATE = \"Unreleased\""));

    let changelog = repo.read("CHANGELOG.md");
    assert!(changelog.contains("## [1.3.0] - Unreleased"));
    assert!(changelog.contains("### Added\n\n- New flag\n"));
    assert!(changelog.contains("### Fixed\n\n- Crash on empty input\n"));
    assert!(!changelog.contains("Ignored section"));

    assert!(!repo.path().join("changelog.d/1.fixed.md").exists());
    assert!(!repo.path().join("changelog.d/2.bogus.md").exists());
    Ok(())
}

#[test]
fn bump_requires_version_file() -> Result<()> {
    let repo = TestRepo::new()?;

    let output = repo.verlog(&["bump"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("No version file configured"));
    Ok(())
}

#[test]
fn failed_bump_leaves_files_unchanged() -> Result<()> {
    let repo = TestRepo::new()?;
    repo.write("version.rb", "VERSION = \"1.0.0\"\n")?;
    repo.write(
        ".verlog.yaml",
        "version_file: version.rb\nretain_changelogs: archive\n",
    )?;
    repo.write("archive", "a file where the archive directory should be\n")?;
    let changelog = "# Changelog\n\n## [1.0.0] - 2024-01-01\n\n### Added\n\n- Initial release\n";
    repo.write("CHANGELOG.md", changelog)?;

    let output = repo.verlog(&["bump", "minor"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("archive"));
    assert_eq!(repo.read("version.rb"), "VERSION = \"1.0.0\"\n");
    assert_eq!(repo.read("CHANGELOG.md"), changelog);
    Ok(())
}

#[test]
fn finalize_dates_unreleased_record() -> Result<()> {
    let repo = TestRepo::new()?;
    repo.write("version.rb", "VERSION = \"2.0.0\"\nRELEASE_DATE = \"Unreleased\"\n")?;
    repo.write(".verlog.yaml", "version_file: version.rb\n")?;
    repo.write(
        "CHANGELOG.md",
        "# Changelog\n\n## [2.0.0] - Unreleased\n\n### Changed\n\n- Rewrote parser\n\n## [1.0.0] - 2023-01-01\n\n### Added\n\n- Initial release\n",
    )?;

    let output = repo.verlog(&["finalize", "2024-05-01"]);
    assert_success(&output);
    assert!(stdout(&output).contains("Finalized 2.0.0 on 2024-05-01"));

    let changelog = repo.read("CHANGELOG.md");
    assert!(changelog.contains("## [2.0.0] - 2024-05-01"));
    assert!(changelog.contains("## [1.0.0] - 2023-01-01"));
    assert!(repo
        .read("version.rb")
        .contains("RELEASE_DATE = \"2024-05-01\""));

    let again = repo.verlog(&["finalize", "2024-06-01"]);
    assert_success(&again);
    assert!(stdout(&again).contains("Finalized 2.0.0 on 2024-05-01"));
    Ok(())
}

#[test]
fn reformat_applies_limit_and_canonical_layout() -> Result<()> {
    let repo = TestRepo::new()?;
    repo.write(
        "CHANGELOG.md",
        "# Change Log\r\nNotes.\r\n## 3.0.0 - 2024-03-01\r\n### Added\r\n* Third\r\n## 2.0.0 - 2024-02-01\r\n### Added\r\n* Second\r\n## 1.0.0 - 2024-01-01\r\n### Added\r\n* First\r\n",
    )?;

    let output = repo.verlog(&["reformat", "1"]);
    assert_success(&output);
    assert!(stdout(&output).contains("(1 release(s))"));

    assert_eq!(
        repo.read("CHANGELOG.md"),
        "# Change Log\n\nNotes.\n\n## [3.0.0] - 2024-03-01\n\n### Added\n\n- Third\n"
    );
    Ok(())
}

#[test]
fn reformat_generates_missing_changelog() -> Result<()> {
    let repo = TestRepo::new()?;

    let output = repo.verlog(&["reformat"]);
    assert_success(&output);

    let changelog = repo.read("CHANGELOG.md");
    assert!(changelog.contains("## [0.1.0] - Unreleased"));
    assert!(changelog.contains("- Initial release"));
    Ok(())
}

#[test]
fn preview_reports_pending_fragments_as_json() -> Result<()> {
    let repo = TestRepo::new()?;
    repo.write("changes/1.added.md", "Preview me\n")?;

    let output = repo.verlog(&["preview", "--fragments", "dir:changes", "--format", "json"]);
    assert_success(&output);

    let value: serde_json::Value = serde_json::from_str(&stdout(&output))?;
    assert_eq!(value["Added"][0], "Preview me");
    assert!(repo.path().join("changes/1.added.md").exists());

    let cleared = repo.verlog(&["clear-fragments", "--fragments", "dir:changes"]);
    assert_success(&cleared);
    assert!(stdout(&cleared).contains("Cleared 1 fragment file(s)"));
    assert!(!repo.path().join("changes/1.added.md").exists());
    Ok(())
}

#[test]
fn bump_from_trailers_uses_commits_since_last_tag() -> Result<()> {
    let repo = TestRepo::new()?;
    repo.write(".verlog.yaml", "version_file: version.rb\nfragments: git\n")?;
    let released = repo.add_commit("Release 1.0.0", "version.rb", "VERSION = \"1.0.0\"\n")?;
    repo.tag("v1.0.0", released)?;
    repo.add_commit(
        "Teach the parser tables\n\nAdded: Table support\nVersion: minor\n",
        "src.txt",
        "tables\n",
    )?;

    let preview = repo.verlog(&["preview"]);
    assert_success(&preview);
    assert!(stdout(&preview).contains("Changes since v1.0.0"));
    assert!(stdout(&preview).contains("Table support"));

    let output = repo.verlog(&["bump", "--from-trailers"]);
    assert_success(&output);
    assert!(stdout(&output).contains("Bumped 1.0.0 -> 1.1.0"));
    assert!(repo.read("CHANGELOG.md").contains("- Table support ("));

    let again = repo.verlog(&["bump", "--from-trailers"]);
    assert_success(&again);
    assert!(stdout(&again).contains("already bumped"));
    assert!(repo.read("version.rb").contains("1.1.0"));
    Ok(())
}

#[test]
fn bump_commits_when_configured() -> Result<()> {
    let repo = TestRepo::new()?;
    repo.write(".verlog.yaml", "version_file: version.rb\ncommit: true\n")?;
    repo.add_commit("Start", "version.rb", "VERSION = \"0.4.9\"\n")?;

    let output = repo.verlog(&["bump"]);
    assert_success(&output);
    assert!(stdout(&output).contains("Committed: Bump version to 0.4.10"));
    assert_eq!(repo.head_message()?, "Bump version to 0.4.10");

    let skipped = repo.verlog(&["bump", "--no-commit"]);
    assert_success(&skipped);
    assert_eq!(repo.head_message()?, "Bump version to 0.4.10");
    Ok(())
}

#[test]
fn config_show_prints_resolved_values() -> Result<()> {
    let repo = TestRepo::new()?;
    repo.write(".verlog.yaml", "changelog_file: HISTORY.md\nversion_limit: 4\n")?;

    let output = repo.verlog(&["config", "show", "--fragments", "git"]);
    assert_success(&output);

    let text = stdout(&output);
    assert!(text.contains("changelog_file: HISTORY.md"));
    assert!(text.contains("version_limit: 4"));
    assert!(text.contains("fragments: git"));
    Ok(())
}

#[test]
fn invalid_config_is_reported() -> Result<()> {
    let repo = TestRepo::new()?;
    repo.write(".verlog.yaml", "unknown_key: 1\n")?;

    let output = repo.verlog(&["preview"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Error: "));
    Ok(())
}
