//! Checksum step driver
//!
//! Computes one digest per artifact and an aggregate checksum file. Files
//! are byte-compared before writing, so an unchanged artifact set reports
//! up to date and keeps every mtime intact.

use std::fs::File;
use std::path::Path;

use sha2::{Digest, Sha256, Sha512};
use tracing::{debug, info, info_span, warn};

use gantry_core::files::write_if_changed;
use gantry_core::model::{ChecksumAlgorithm, Distribution};
use gantry_core::{Context, GantryError, Result, StepOutcome};

use crate::listeners::ListenerDispatcher;

use super::{resolve_artifact_paths, selected_distributions, step_failed, units_failed};

/// Run the checksum step
pub fn run(ctx: &mut Context, listeners: &ListenerDispatcher) -> Result<StepOutcome> {
    if !ctx.model.checksum.enabled {
        info!("checksums disabled, skipping");
        return Ok(StepOutcome::Skipped);
    }

    let dists: Vec<Distribution> = selected_distributions(ctx)
        .into_iter()
        .cloned()
        .collect();
    if dists.is_empty() {
        info!("no active distributions, skipping checksums");
        return Ok(StepOutcome::Skipped);
    }

    std::fs::create_dir_all(ctx.checksums_dir())?;

    let mut aggregate_lines: Vec<String> = Vec::new();
    let mut wrote_any = false;
    let mut failures: Vec<String> = Vec::new();

    for dist in &dists {
        let _span = info_span!("checksum", distribution = %dist.name).entered();
        listeners.distribution_start(ctx, &dist.name)?;

        let result = checksum_distribution(ctx, dist, &mut aggregate_lines);

        listeners.distribution_end(ctx, &dist.name)?;

        match result {
            Ok(wrote) => wrote_any |= wrote,
            Err(e) => {
                if ctx.model.fail_fast {
                    return Err(step_failed("checksum", e));
                }
                warn!(distribution = %dist.name, error = %e, "checksum failed");
                failures.push(format!("{}: {}", dist.name, e));
            }
        }
    }

    let mut aggregate = aggregate_lines.join("\n");
    if !aggregate.is_empty() {
        aggregate.push('\n');
    }
    let aggregate_path = ctx.checksums_dir().join(ctx.model.checksum.file_name());
    wrote_any |= write_if_changed(&aggregate_path, aggregate.as_bytes())?;

    if !failures.is_empty() {
        return Err(units_failed("checksum", failures));
    }

    if wrote_any {
        info!(file = %aggregate_path.display(), "checksums written");
        Ok(StepOutcome::Succeeded)
    } else {
        info!("checksums up to date");
        Ok(StepOutcome::UpToDate)
    }
}

fn checksum_distribution(
    ctx: &Context,
    dist: &Distribution,
    aggregate_lines: &mut Vec<String>,
) -> Result<bool> {
    let paths = resolve_artifact_paths(ctx, dist)?;
    let mut wrote = false;

    for path in paths {
        if !path.is_file() {
            return Err(GantryError::other(format!(
                "artifact not found: {}",
                path.display()
            )));
        }

        let digest = hash_file(&path, ctx.model.checksum.algorithm)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        aggregate_lines.push(format!("{}  {}", digest, file_name));

        if ctx.model.checksum.individual {
            let out = ctx
                .checksums_dir()
                .join(&dist.name)
                .join(format!("{}.{}", file_name, ctx.model.checksum.algorithm.extension()));
            let changed = write_if_changed(&out, digest.as_bytes())?;
            if changed {
                debug!(file = %out.display(), "checksum written");
            } else {
                debug!(file = %out.display(), "checksum up to date");
            }
            wrote |= changed;
        }
    }

    Ok(wrote)
}

fn hash_file(path: &Path, algorithm: ChecksumAlgorithm) -> Result<String> {
    let mut file = File::open(path)?;

    let digest = match algorithm {
        ChecksumAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            std::io::copy(&mut file, &mut hasher)?;
            hex_encode(&hasher.finalize())
        }
        ChecksumAlgorithm::Sha512 => {
            let mut hasher = Sha512::new();
            std::io::copy(&mut file, &mut hasher)?;
            hex_encode(&hasher.finalize())
        }
    };

    Ok(digest)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
