//! Download step driver

use tracing::{info, info_span, warn};

use gantry_core::model::DownloaderConfig;
use gantry_core::{Context, GantryError, Result, StepOutcome};
use gantry_plugins::PluginRegistry;

use crate::listeners::{ExecutionEvent, ListenerDispatcher};

use super::{step_failed, units_failed};

/// Run the download step
pub fn run(
    ctx: &mut Context,
    listeners: &ListenerDispatcher,
    registry: &PluginRegistry,
) -> Result<StepOutcome> {
    if !ctx.model.download.active {
        info!("downloads disabled, skipping");
        return Ok(StepOutcome::Skipped);
    }

    let all: Vec<&DownloaderConfig> = ctx.model.download.downloaders.iter().collect();
    let units: Vec<DownloaderConfig> = ctx
        .filters
        .downloaders
        .select("downloader", &all)
        .into_iter()
        .cloned()
        .collect();
    if units.is_empty() {
        info!("no downloaders to run, skipping");
        return Ok(StepOutcome::Skipped);
    }

    let mut failures: Vec<String> = Vec::new();

    for cfg in &units {
        let _span = info_span!("download", downloader = %cfg.name, r#type = %cfg.type_key).entered();

        listeners.download_step(&ExecutionEvent::before("download"), ctx, &cfg.name, true)?;

        let factory = registry.find_downloader(&cfg.type_key)?;
        let unit = factory.build(cfg)?;

        match unit.download(ctx) {
            Ok(()) => {
                listeners.download_step(
                    &ExecutionEvent::success("download"),
                    ctx,
                    &cfg.name,
                    true,
                )?;
                info!(downloader = %cfg.name, assets = cfg.assets.len(), "downloaded");
            }
            Err(e) => {
                let error = GantryError::from(e);
                let event = ExecutionEvent::failure("download", error.to_string());
                listeners.download_step(&event, ctx, &cfg.name, true)?;

                if ctx.model.fail_fast {
                    return Err(step_failed("download", error));
                }
                warn!(downloader = %cfg.name, error = %error, "downloader failed");
                failures.push(format!("{}: {}", cfg.name, error));
            }
        }
    }

    if !failures.is_empty() {
        return Err(units_failed("download", failures));
    }

    Ok(StepOutcome::Succeeded)
}
