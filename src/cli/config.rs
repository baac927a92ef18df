//! Configuration-related CLI commands.

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::common::ConfigArgs;
use crate::config::{locate_config, PROJECT_CONFIG_FILE};

/// Configuration operations.
#[derive(Parser)]
pub struct ConfigCommand {
    /// Configuration subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

/// Configuration subcommands.
#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Shows the resolved configuration as YAML.
    Show(ShowCommand),
}

/// Show command options.
#[derive(Parser)]
pub struct ShowCommand {
    /// Configuration overrides.
    #[command(flatten)]
    pub config: ConfigArgs,
}

impl ConfigCommand {
    /// Executes the config command.
    pub fn execute(self) -> Result<()> {
        match self.command {
            ConfigSubcommands::Show(show_cmd) => show_cmd.execute(),
        }
    }
}

impl ShowCommand {
    /// Executes the show command.
    pub fn execute(self) -> Result<()> {
        let config = self.config.resolve()?;
        match locate_config(std::path::Path::new(".")) {
            Some(path) => println!("# Loaded from {}", path.display()),
            None => println!("# No {PROJECT_CONFIG_FILE} found, using defaults"),
        }
        print!("{}", config.to_file_config().to_yaml()?);
        Ok(())
    }
}
