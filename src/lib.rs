//! # verlog
//!
//! Keeps a Keep-a-Changelog file and an embedded version string in step
//! across releases.
//!
//! ## Quick Start
//!
//! ```rust
//! use verlog::changelog::Changelog;
//! use verlog::release::ChangelogUpdater;
//! use verlog::changelog::Changes;
//!
//! let mut changelog = Changelog::default();
//! let changes: Changes = [("Added", vec!["First feature"])].into_iter().collect();
//! ChangelogUpdater::new()
//!     .update(&mut changelog, "0.1.0", "2024-01-01", &changes)
//!     .unwrap();
//! assert!(changelog.to_markdown().contains("## [0.1.0] - 2024-01-01"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod changelog;
pub mod cli;
pub mod config;
pub mod error;
pub mod fragments;
pub mod git;
pub mod release;
pub mod utils;
pub mod version;

pub use crate::cli::Cli;

/// The current version of verlog.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
