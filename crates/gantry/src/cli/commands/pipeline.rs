//! Shared pipeline command handling
//!
//! Every pipeline subcommand takes the same arguments; only the composed
//! step list differs, and that is the composer's job.

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;

use gantry_core::config::{load_model, load_model_from_dir};
use gantry_core::context::{Filters, UnitFilter};
use gantry_core::types::Command as PipelineCommand;
use gantry_core::{Context, GantryError, Result};
use gantry_engine::WorkflowExecutor;

use crate::cli::{output, Cli};

/// Arguments shared by all pipeline commands
#[derive(Debug, Args)]
pub struct PipelineArgs {
    /// Log external effects without performing them
    #[arg(long)]
    pub dry_run: bool,

    /// Promote validation warnings to errors
    #[arg(long)]
    pub strict: bool,

    /// Override the output directory
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Only process these distributions
    #[arg(short = 'd', long = "distribution")]
    pub distributions: Vec<String>,

    /// Never process these distributions
    #[arg(long = "exclude-distribution")]
    pub exclude_distributions: Vec<String>,

    /// Only run these packagers
    #[arg(long = "packager")]
    pub packagers: Vec<String>,

    /// Never run these packagers
    #[arg(long = "exclude-packager")]
    pub exclude_packagers: Vec<String>,

    /// Only run announcers of these types
    #[arg(long = "announcer")]
    pub announcers: Vec<String>,

    /// Never run announcers of these types
    #[arg(long = "exclude-announcer")]
    pub exclude_announcers: Vec<String>,

    /// Only run uploaders of these types
    #[arg(long = "uploader")]
    pub uploaders: Vec<String>,

    /// Only run uploaders with these names
    #[arg(long = "uploader-name")]
    pub uploader_names: Vec<String>,

    /// Never run uploaders of these types
    #[arg(long = "exclude-uploader")]
    pub exclude_uploaders: Vec<String>,

    /// Never run uploaders with these names
    #[arg(long = "exclude-uploader-name")]
    pub exclude_uploader_names: Vec<String>,

    /// Only run downloaders of these types
    #[arg(long = "downloader")]
    pub downloaders: Vec<String>,

    /// Never run downloaders of these types
    #[arg(long = "exclude-downloader")]
    pub exclude_downloaders: Vec<String>,

    /// Only run deployers of these types
    #[arg(long = "deployer")]
    pub deployers: Vec<String>,

    /// Never run deployers of these types
    #[arg(long = "exclude-deployer")]
    pub exclude_deployers: Vec<String>,
}

impl PipelineArgs {
    /// Turn the flag lists into per-category unit filters
    pub fn filters(&self) -> Filters {
        Filters {
            distributions: UnitFilter {
                include_names: self.distributions.clone(),
                exclude_names: self.exclude_distributions.clone(),
                ..Default::default()
            },
            packagers: UnitFilter {
                include_names: self.packagers.clone(),
                exclude_names: self.exclude_packagers.clone(),
                ..Default::default()
            },
            announcers: UnitFilter {
                include_types: self.announcers.clone(),
                exclude_types: self.exclude_announcers.clone(),
                ..Default::default()
            },
            uploaders: UnitFilter {
                include_types: self.uploaders.clone(),
                include_names: self.uploader_names.clone(),
                exclude_types: self.exclude_uploaders.clone(),
                exclude_names: self.exclude_uploader_names.clone(),
            },
            downloaders: UnitFilter {
                include_types: self.downloaders.clone(),
                exclude_types: self.exclude_downloaders.clone(),
                ..Default::default()
            },
            deployers: UnitFilter {
                include_types: self.deployers.clone(),
                exclude_types: self.exclude_deployers.clone(),
                ..Default::default()
            },
            catalogers: UnitFilter::default(),
        }
    }
}

/// Load the model, build the context and run the composed workflow
pub fn run_pipeline(command: PipelineCommand, args: &PipelineArgs, cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir().map_err(GantryError::Io)?;

    let (model, config_path) = match &cli.config {
        Some(path) => (load_model(path)?, path.clone()),
        None => load_model_from_dir(&cwd)?,
    };
    info!(config = %config_path.display(), command = %command, "pipeline starting");

    if args.dry_run && !cli.quiet {
        output::warning("dry run: external effects will be logged, not performed");
    }

    let base_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or(cwd);

    let mut ctx = Context::new(model, base_dir, command)
        .with_dry_run(args.dry_run)
        .with_strict(args.strict)
        .with_filters(args.filters());
    if let Some(dir) = &args.output_dir {
        ctx = ctx.with_output_dir(dir);
    }

    let mut executor = WorkflowExecutor::for_command(command);
    executor.execute(&mut ctx)?;

    if !cli.quiet {
        output::success(&format!("{} completed", command));
    }
    Ok(())
}
