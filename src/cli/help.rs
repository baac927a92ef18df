//! Help command implementation for comprehensive CLI documentation.

use anyhow::Result;
use clap::{Command, CommandFactory, Parser};

/// Help command for displaying every command's usage at once.
#[derive(Parser)]
pub struct HelpCommand {}

/// Renders help for the whole command tree.
pub struct HelpGenerator {
    app: Command,
}

impl HelpGenerator {
    /// Creates a generator for the verlog command tree.
    pub fn new() -> Self {
        Self {
            app: crate::cli::Cli::command(),
        }
    }

    /// Generates help for the root command and every subcommand.
    pub fn generate_all_help(&self) -> Result<String> {
        let mut help_sections = vec![self.render_command_help(&self.app, "")];
        self.collect_help_recursive(&self.app, "", &mut help_sections);

        let separator = format!("\n\n{}\n\n", "=".repeat(80));
        Ok(help_sections.join(&separator))
    }

    /// Collects help for subcommands, sorted by name so output is stable.
    fn collect_help_recursive(&self, cmd: &Command, prefix: &str, help_sections: &mut Vec<String>) {
        let mut subcommands: Vec<_> = cmd.get_subcommands().collect();
        subcommands.sort_by(|a, b| a.get_name().cmp(b.get_name()));

        for subcmd in subcommands {
            if subcmd.get_name() == "help" {
                continue;
            }

            let current_path = if prefix.is_empty() {
                subcmd.get_name().to_string()
            } else {
                format!("{} {}", prefix, subcmd.get_name())
            };

            help_sections.push(self.render_command_help(subcmd, &current_path));
            self.collect_help_recursive(subcmd, &current_path, help_sections);
        }
    }

    fn render_command_help(&self, cmd: &Command, path: &str) -> String {
        let cmd_name = if path.is_empty() {
            cmd.get_name().to_string()
        } else {
            format!("verlog {path}")
        };
        let about = cmd
            .get_about()
            .map_or_else(|| "No description available".to_string(), ToString::to_string);

        format!("{cmd_name} - {about}\n\n{}", cmd.clone().render_help())
    }
}

impl Default for HelpGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl HelpCommand {
    /// Executes the help command.
    pub fn execute(self) -> Result<()> {
        println!("{}", HelpGenerator::new().generate_all_help()?);
        Ok(())
    }
}
