//! Typed errors for the version, fragment and git layers.

use thiserror::Error;

/// Errors raised by the release core.
#[derive(Error, Debug)]
pub enum VerlogError {
    /// No recognizable version where one was required.
    #[error("Version format error: {0}")]
    Format(String),

    /// Bump requested with an unknown segment selector.
    #[error("Invalid segment '{0}'. Expected one of: major, minor, patch, pre")]
    InvalidSegment(String),

    /// A successor ran past the end of its sequence (e.g. `omega`).
    #[error("Cannot advance '{0}': no successor defined")]
    SuccessorOverflow(String),

    /// Fragment source selector that is not `none`, `git` or `dir:<path>`.
    #[error("Invalid fragment option '{0}'. Expected none, git or dir:<path>")]
    InvalidFragmentSource(String),

    /// Tag pattern that does not compile.
    #[error("Invalid tag pattern '{pattern}': {source}")]
    InvalidTagPattern {
        /// The rejected pattern.
        pattern: String,
        /// Regex compile error.
        #[source]
        source: regex::Error,
    },

    /// An external `git` command exited unsuccessfully.
    #[error("{message}\nCommand: {command}\nExit status: {status}{}{}", fmt_stream("STDOUT", .stdout), fmt_stream("STDERR", .stderr))]
    ExternalProcess {
        /// What the command was meant to do.
        message: String,
        /// The command line that ran.
        command: String,
        /// Exit code, or -1 when terminated by a signal.
        status: i32,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },
}

fn fmt_stream(label: &str, content: &str) -> String {
    let content = content.trim();
    if content.is_empty() {
        String::new()
    } else {
        format!("\n{label}: {content}")
    }
}
