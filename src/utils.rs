//! Utility functions and helpers.

pub mod fs;
pub mod settings;

pub use fs::write_atomic;
pub use settings::Settings;
