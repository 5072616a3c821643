//! Syft SBOM cataloger
//!
//! Shells out to the `syft` CLI to produce one SBOM per artifact under the
//! run's catalogs directory. An SBOM newer than its artifact is left
//! untouched and reported up to date.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::SystemTime;

use tracing::{debug, info};

use gantry_core::error::CatalogError;
use gantry_core::model::CatalogerConfig;
use gantry_core::{Context, Result, StepOutcome};

use crate::traits::{Cataloger, CatalogerFactory};

use super::failure_reason;

const TOOL: &str = "syft";
const DEFAULT_FORMAT: &str = "spdx-json";

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Cataloger producing SBOMs with syft
pub struct SyftCataloger {
    config: CatalogerConfig,
}

impl SyftCataloger {
    fn format(&self) -> &str {
        self.config
            .extra
            .get("format")
            .map(String::as_str)
            .unwrap_or(DEFAULT_FORMAT)
    }
}

impl Cataloger for SyftCataloger {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn type_key(&self) -> &'static str {
        "syft"
    }

    fn is_enabled(&self) -> bool {
        self.config.active
    }

    fn catalog(
        &self,
        ctx: &Context,
        files: &[PathBuf],
    ) -> std::result::Result<StepOutcome, CatalogError> {
        if files.is_empty() {
            return Ok(StepOutcome::Skipped);
        }

        if ctx.dry_run {
            info!(cataloger = %self.config.name, files = files.len(), "dry run, skipping SBOM generation");
            return Ok(StepOutcome::Skipped);
        }

        let tool = which::which(TOOL).map_err(|_| CatalogError::ToolNotFound(TOOL.to_string()))?;

        let out_dir = ctx.catalogs_dir().join(&self.config.name);
        std::fs::create_dir_all(&out_dir)?;

        let mut outcome = StepOutcome::UpToDate;
        for file in files {
            let file_name = file
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let sbom = out_dir.join(format!("{}.sbom.json", file_name));

            // Regenerate only when the artifact is newer than its SBOM
            if let (Some(sbom_time), Some(artifact_time)) = (modified(&sbom), modified(file)) {
                if sbom_time >= artifact_time {
                    debug!(file = %file.display(), "SBOM up to date");
                    continue;
                }
            }

            let output = Command::new(&tool)
                .arg("scan")
                .arg(format!("file:{}", file.display()))
                .arg("--output")
                .arg(format!("{}={}", self.format(), sbom.display()))
                .current_dir(&ctx.base_dir)
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output()?;

            if !output.status.success() {
                return Err(CatalogError::ToolFailed {
                    tool: TOOL.to_string(),
                    reason: failure_reason(&output),
                });
            }

            debug!(file = %file.display(), sbom = %sbom.display(), "SBOM written");
            outcome = StepOutcome::Succeeded;
        }

        Ok(outcome)
    }
}

/// Factory for [`SyftCataloger`]
pub struct SyftCatalogerFactory;

impl CatalogerFactory for SyftCatalogerFactory {
    fn type_key(&self) -> &'static str {
        "syft"
    }

    fn build(&self, config: &CatalogerConfig) -> Result<Box<dyn Cataloger>> {
        Ok(Box::new(SyftCataloger {
            config: config.clone(),
        }))
    }
}
