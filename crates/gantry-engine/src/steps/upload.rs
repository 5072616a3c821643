//! Upload step driver

use tracing::{info, info_span, warn};

use gantry_core::model::UploaderConfig;
use gantry_core::{Context, GantryError, Result, StepOutcome};
use gantry_plugins::PluginRegistry;

use crate::listeners::{ExecutionEvent, ListenerDispatcher};

use super::{release_file_set, step_failed, units_failed};

/// Run the upload step
pub fn run(
    ctx: &mut Context,
    listeners: &ListenerDispatcher,
    registry: &PluginRegistry,
) -> Result<StepOutcome> {
    if !ctx.model.upload.active {
        info!("uploads disabled, skipping");
        return Ok(StepOutcome::Skipped);
    }

    let all: Vec<&UploaderConfig> = ctx.model.upload.uploaders.iter().collect();
    let units: Vec<UploaderConfig> = ctx
        .filters
        .uploaders
        .select("uploader", &all)
        .into_iter()
        .cloned()
        .collect();
    if units.is_empty() {
        info!("no uploaders to run, skipping");
        return Ok(StepOutcome::Skipped);
    }

    let files = release_file_set(ctx)?;

    let mut outcome = StepOutcome::UpToDate;
    let mut failures: Vec<String> = Vec::new();

    for cfg in &units {
        let _span = info_span!("upload", uploader = %cfg.name, r#type = %cfg.type_key).entered();

        listeners.upload_step(&ExecutionEvent::before("upload"), ctx, &cfg.name, true)?;

        // Lookup and build failures are configuration errors, always fatal
        let factory = registry.find_uploader(&cfg.type_key)?;
        let unit = factory.build(cfg)?;

        match unit.upload(ctx, &files) {
            Ok(transferred) => {
                listeners.upload_step(&ExecutionEvent::success("upload"), ctx, &cfg.name, true)?;
                if transferred {
                    info!(uploader = %cfg.name, files = files.len(), "uploaded");
                    outcome = StepOutcome::Succeeded;
                } else {
                    info!(uploader = %cfg.name, "nothing to transfer");
                }
            }
            Err(e) => {
                let error = GantryError::from(e);
                let event = ExecutionEvent::failure("upload", error.to_string());
                listeners.upload_step(&event, ctx, &cfg.name, true)?;

                if ctx.model.fail_fast {
                    return Err(step_failed("upload", error));
                }
                warn!(uploader = %cfg.name, error = %error, "uploader failed");
                failures.push(format!("{}: {}", cfg.name, error));
            }
        }
    }

    if !failures.is_empty() {
        return Err(units_failed("upload", failures));
    }

    Ok(outcome)
}
