//! Sign step driver
//!
//! Detach-signs every artifact plus the aggregate checksum file by shelling
//! out to the configured signing tool (gpg by default). Signatures land
//! under the signatures directory, named after the signed file.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{debug, info, info_span};

use gantry_core::error::SigningError;
use gantry_core::{Context, Result, StepOutcome};

use super::{resolve_artifact_paths, selected_distributions, step_failed};

/// Run the sign step
pub fn run(ctx: &mut Context) -> Result<StepOutcome> {
    let signing = ctx.model.signing.clone();
    if !signing.active {
        info!("signing disabled, skipping");
        return Ok(StepOutcome::Skipped);
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for dist in selected_distributions(ctx) {
        files.extend(resolve_artifact_paths(ctx, dist)?);
    }
    let checksum_file = ctx.checksums_dir().join(ctx.model.checksum.file_name());
    if checksum_file.is_file() {
        files.push(checksum_file);
    }

    if files.is_empty() {
        info!("nothing to sign, skipping");
        return Ok(StepOutcome::Skipped);
    }

    if ctx.dry_run {
        info!(files = files.len(), "dry run, skipping signing");
        return Ok(StepOutcome::Skipped);
    }

    let tool = which::which(&signing.command)
        .map_err(|_| SigningError::ToolNotFound(signing.command.clone()))?;

    std::fs::create_dir_all(ctx.signatures_dir())?;

    let extension = if signing.armored { "asc" } else { "sig" };

    for file in &files {
        let _span = info_span!("sign", file = %file.display()).entered();

        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let signature = ctx
            .signatures_dir()
            .join(format!("{}.{}", file_name, extension));

        let mut cmd = Command::new(&tool);
        cmd.arg("--batch").arg("--yes").arg("--detach-sign");
        if signing.armored {
            cmd.arg("--armor");
        }
        if let Some(key) = &signing.key_name {
            cmd.arg("--local-user").arg(key);
        }
        for arg in &signing.args {
            cmd.arg(arg);
        }
        cmd.arg("--output").arg(&signature).arg(file);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let output = cmd.output().map_err(SigningError::Io)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(step_failed(
                "sign",
                SigningError::ToolFailed {
                    tool: signing.command.clone(),
                    reason: stderr,
                }
                .into(),
            ));
        }

        debug!(signature = %signature.display(), "signature written");
    }

    info!(files = files.len(), "artifacts signed");
    Ok(StepOutcome::Succeeded)
}
