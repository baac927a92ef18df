//! Version tokens and the files that embed them.

pub mod file;
pub mod successor;
pub mod token;

pub use file::{BumpOutcome, CustomBump, VersionBumper, VersionFile};
pub use successor::{successor, GREEK_LETTERS};
pub use token::{Segment, VersionToken};
