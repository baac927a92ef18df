//! Git history queries and external git commands.

pub mod command;
pub mod history;

pub use command::GitCommand;
pub use history::{CommitHistory, CommitMessage, GitHistory, TagRef, SHORT_HASH_LEN};
