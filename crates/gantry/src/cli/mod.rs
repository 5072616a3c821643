//! CLI definition and command handling

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use gantry_core::types::Command as PipelineCommand;
use gantry_core::{GantryError, Result};

use commands::{CompletionsCommand, InitCommand, PipelineArgs};

/// Gantry - Declarative release pipeline CLI
#[derive(Debug, Parser)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Suppress console output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    pub directory: Option<std::path::PathBuf>,

    /// Configuration file; discovered from the working directory when omitted
    #[arg(short = 'c', long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a starter configuration
    Init(InitCommand),

    /// Resolve the changelog
    Changelog(PipelineArgs),

    /// Compute artifact checksums
    Checksum(PipelineArgs),

    /// Sign artifacts and checksums
    Sign(PipelineArgs),

    /// Upload the release file set
    Upload(PipelineArgs),

    /// Create the release
    Release(PipelineArgs),

    /// Download configured assets
    Download(PipelineArgs),

    /// Deploy staged artifacts
    Deploy(PipelineArgs),

    /// Catalog artifacts (SBOMs)
    Catalog(PipelineArgs),

    /// Render packager templates
    Prepare(PipelineArgs),

    /// Stage prepared packager files
    Package(PipelineArgs),

    /// Publish packages
    Publish(PipelineArgs),

    /// Announce the release
    Announce(PipelineArgs),

    /// Run the whole pipeline end to end
    FullRelease(PipelineArgs),

    /// Generate shell completions
    Completions(CompletionsCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(&self) -> Result<()> {
        if let Some(dir) = &self.directory {
            std::env::set_current_dir(dir).map_err(GantryError::Io)?;
        }

        match &self.command {
            Commands::Init(cmd) => cmd.execute(self),
            Commands::Completions(cmd) => cmd.execute(),
            Commands::Changelog(args) => self.pipeline(PipelineCommand::Changelog, args),
            Commands::Checksum(args) => self.pipeline(PipelineCommand::Checksum, args),
            Commands::Sign(args) => self.pipeline(PipelineCommand::Sign, args),
            Commands::Upload(args) => self.pipeline(PipelineCommand::Upload, args),
            Commands::Release(args) => self.pipeline(PipelineCommand::Release, args),
            Commands::Download(args) => self.pipeline(PipelineCommand::Download, args),
            Commands::Deploy(args) => self.pipeline(PipelineCommand::Deploy, args),
            Commands::Catalog(args) => self.pipeline(PipelineCommand::Catalog, args),
            Commands::Prepare(args) => self.pipeline(PipelineCommand::Prepare, args),
            Commands::Package(args) => self.pipeline(PipelineCommand::Package, args),
            Commands::Publish(args) => self.pipeline(PipelineCommand::Publish, args),
            Commands::Announce(args) => self.pipeline(PipelineCommand::Announce, args),
            Commands::FullRelease(args) => self.pipeline(PipelineCommand::FullRelease, args),
        }
    }

    fn pipeline(&self, command: PipelineCommand, args: &PipelineArgs) -> Result<()> {
        commands::run_pipeline(command, args, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_release_with_filters() {
        let cli = Cli::parse_from([
            "gantry",
            "release",
            "--dry-run",
            "-d",
            "app",
            "--exclude-uploader-name",
            "staging",
        ]);

        match cli.command {
            Commands::Release(args) => {
                assert!(args.dry_run);
                assert_eq!(args.distributions, vec!["app"]);
                assert_eq!(args.exclude_uploader_names, vec!["staging"]);
            }
            other => panic!("expected release, got {other:?}"),
        }
    }
}
