//! Read-only access to tags and commit messages.

use std::path::Path;

use anyhow::{Context, Result};
use git2::{ObjectType, Repository, Sort};
use regex::Regex;
use tracing::debug;

/// Number of hex characters used when git cannot abbreviate an id itself.
pub const SHORT_HASH_LEN: usize = 7;

/// A tag together with the time it was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    /// Short tag name, e.g. `v1.2.0`.
    pub name: String,
    /// Creation time in seconds since the epoch. Annotated tags use the
    /// tagger time, lightweight tags the time of the tagged commit.
    pub created: i64,
}

/// A commit message with its abbreviated id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
    /// Abbreviated commit id.
    pub id: String,
    /// Full commit message.
    pub message: String,
}

/// The version-control queries fragment harvesting depends on.
pub trait CommitHistory {
    /// Tags whose name matches `pattern`, most recently created first.
    fn list_tags_matching(&self, pattern: &Regex) -> Result<Vec<TagRef>>;

    /// Commits reachable from HEAD but not from `tag`, oldest first.
    ///
    /// With no tag every commit reachable from HEAD is returned.
    fn commits_since(&self, tag: Option<&str>) -> Result<Vec<CommitMessage>>;
}

/// [`CommitHistory`] backed by a git repository.
pub struct GitHistory {
    repo: Repository,
}

impl GitHistory {
    /// Opens the repository containing the current directory.
    pub fn open() -> Result<Self> {
        Self::discover(".")
    }

    /// Opens the repository containing `path`, searching parent directories.
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::discover(path)
            .with_context(|| format!("Not in a git repository: {}", path.display()))?;
        Ok(Self { repo })
    }

    /// Access to the underlying repository.
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    fn tag_created(&self, name: &str) -> Result<i64> {
        let object = self
            .repo
            .revparse_single(&format!("refs/tags/{name}"))
            .with_context(|| format!("Failed to resolve tag: {name}"))?;

        if object.kind() == Some(ObjectType::Tag) {
            if let Some(tagger) = object.as_tag().and_then(|tag| tag.tagger()) {
                return Ok(tagger.when().seconds());
            }
        }

        let commit = object
            .peel_to_commit()
            .with_context(|| format!("Tag does not point at a commit: {name}"))?;
        Ok(commit.time().seconds())
    }
}

impl CommitHistory for GitHistory {
    fn list_tags_matching(&self, pattern: &Regex) -> Result<Vec<TagRef>> {
        let names = self.repo.tag_names(None).context("Failed to list tags")?;

        let mut tags = Vec::new();
        for name in names.iter().flatten() {
            if !pattern.is_match(name) {
                continue;
            }
            match self.tag_created(name) {
                Ok(created) => tags.push(TagRef {
                    name: name.to_string(),
                    created,
                }),
                Err(e) => debug!(tag = %name, error = %e, "Ignoring unresolvable tag"),
            }
        }

        tags.sort_by(|a, b| b.created.cmp(&a.created).then_with(|| b.name.cmp(&a.name)));
        Ok(tags)
    }

    fn commits_since(&self, tag: Option<&str>) -> Result<Vec<CommitMessage>> {
        let mut walker = self.repo.revwalk().context("Failed to create revwalk")?;
        walker
            .set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)
            .context("Failed to set revwalk order")?;
        walker.push_head().context("Failed to push HEAD")?;

        if let Some(tag) = tag {
            let boundary = self
                .repo
                .revparse_single(&format!("refs/tags/{tag}"))
                .and_then(|object| object.peel_to_commit())
                .with_context(|| format!("Failed to resolve tag: {tag}"))?;
            walker
                .hide(boundary.id())
                .context("Failed to hide tagged commit")?;
        }

        let mut commits = Vec::new();
        for oid in walker {
            let oid = oid.context("Failed to get commit OID from walker")?;
            let commit = self.repo.find_commit(oid).context("Failed to find commit")?;
            let id = commit
                .as_object()
                .short_id()
                .ok()
                .and_then(|buf| buf.as_str().map(str::to_string))
                .unwrap_or_else(|| oid.to_string()[..SHORT_HASH_LEN].to_string());

            commits.push(CommitMessage {
                id,
                message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            });
        }

        Ok(commits)
    }
}
