//! Keep a Changelog document model, parser and printer.

pub mod model;
pub mod parser;
pub mod printer;

pub use model::{Changelog, Changes, Release, DEFAULT_PREAMBLE, DEFAULT_TITLE, UNRELEASED};
pub use parser::parse;
pub use printer::{print, print_release};
