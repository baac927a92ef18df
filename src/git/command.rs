//! External `git` invocations used by the release commands.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::error::VerlogError;

/// Runs `git` in a fixed working directory.
#[derive(Debug, Clone)]
pub struct GitCommand {
    workdir: PathBuf,
}

impl GitCommand {
    /// Creates a runner for `workdir`.
    pub fn new<P: Into<PathBuf>>(workdir: P) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Working directory of every invocation.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Runs `git args…`, returning trimmed stdout.
    ///
    /// A non-zero exit becomes [`VerlogError::ExternalProcess`] carrying
    /// `message`, the command line and both output streams.
    pub fn run(&self, args: &[&str], message: &str) -> Result<String> {
        let command_line = format!("git {}", args.join(" "));
        debug!(command = %command_line, dir = %self.workdir.display(), "Running git");

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("Failed to execute {command_line}"))?;

        if !output.status.success() {
            return Err(VerlogError::ExternalProcess {
                message: message.to_string(),
                command: command_line,
                status: output.status.code().unwrap_or(-1),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }
            .into());
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Creates `name` at HEAD and checks it out, replacing any existing
    /// branch of that name.
    pub fn create_branch(&self, name: &str) -> Result<()> {
        let reference = format!("refs/heads/{name}");
        let exists = Command::new("git")
            .args(["rev-parse", "--verify", "--quiet", reference.as_str()])
            .current_dir(&self.workdir)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false);

        if exists {
            info!(branch = %name, "Recreating existing branch");
            self.run(&["checkout", "--detach"], "Failed to detach HEAD")?;
            self.run(&["branch", "-D", name], &format!("Failed to delete branch {name}"))?;
        }

        self.run(&["checkout", "-b", name], &format!("Failed to create branch {name}"))?;
        Ok(())
    }

    /// Stages `paths` and commits them with `message`.
    pub fn commit_paths(&self, paths: &[&Path], message: &str) -> Result<()> {
        let mut args: Vec<String> = vec!["add".to_string(), "--".to_string()];
        args.extend(paths.iter().map(|p| p.display().to_string()));
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&args, "Failed to stage release files")?;

        self.run(&["commit", "-m", message], "Failed to commit release files")?;
        info!(message = %message, "Committed release files");
        Ok(())
    }

    /// Pushes the current branch to `origin`, setting its upstream.
    pub fn push_current_branch(&self) -> Result<()> {
        let branch = self.run(
            &["rev-parse", "--abbrev-ref", "HEAD"],
            "Failed to determine current branch",
        )?;
        self.run(
            &["push", "--set-upstream", "origin", &branch],
            &format!("Failed to push branch {branch}"),
        )?;
        info!(branch = %branch, "Pushed branch");
        Ok(())
    }
}
