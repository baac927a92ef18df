//! CLI interface for verlog.

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod bump;
pub mod common;
pub mod config;
pub mod finalize;
pub mod fragments;
pub mod help;
pub mod reformat;

/// verlog: keeps a changelog and a version file in step.
#[derive(Parser)]
#[command(name = "verlog")]
#[command(
    about = "Keeps a changelog and a version file in step across releases",
    long_about = None
)]
#[command(version)]
pub struct Cli {
    /// The main command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Bumps the version and records a new changelog release.
    Bump(bump::BumpCommand),
    /// Dates the unreleased changelog record.
    Finalize(finalize::FinalizeCommand),
    /// Rewrites the changelog in canonical form.
    Reformat(reformat::ReformatCommand),
    /// Lists pending entries without changing anything.
    Preview(fragments::PreviewCommand),
    /// Deletes consumed fragment files.
    #[command(name = "clear-fragments")]
    ClearFragments(fragments::ClearFragmentsCommand),
    /// Creates a changelog with an initial release.
    Init(reformat::InitCommand),
    /// Configuration inspection.
    Config(config::ConfigCommand),
    /// Displays comprehensive help for all commands.
    #[command(name = "help-all")]
    HelpAll(help::HelpCommand),
}

impl Cli {
    /// Executes the CLI command.
    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Bump(bump_cmd) => bump_cmd.execute(),
            Commands::Finalize(finalize_cmd) => finalize_cmd.execute(),
            Commands::Reformat(reformat_cmd) => reformat_cmd.execute(),
            Commands::Preview(preview_cmd) => preview_cmd.execute(),
            Commands::ClearFragments(clear_cmd) => clear_cmd.execute(),
            Commands::Init(init_cmd) => init_cmd.execute(),
            Commands::Config(config_cmd) => config_cmd.execute(),
            Commands::HelpAll(help_cmd) => help_cmd.execute(),
        }
    }
}
