//! SBOM catalog step driver

use tracing::{info, info_span, warn};

use gantry_core::model::CatalogerConfig;
use gantry_core::{Context, GantryError, Result, StepOutcome};
use gantry_plugins::PluginRegistry;

use crate::listeners::{ExecutionEvent, ListenerDispatcher};

use super::{release_file_set, step_failed, units_failed};

/// Run the catalog step
pub fn run(
    ctx: &mut Context,
    listeners: &ListenerDispatcher,
    registry: &PluginRegistry,
) -> Result<StepOutcome> {
    if !ctx.model.catalog.active {
        info!("cataloging disabled, skipping");
        return Ok(StepOutcome::Skipped);
    }

    let all: Vec<&CatalogerConfig> = ctx.model.catalog.catalogers.iter().collect();
    let units: Vec<CatalogerConfig> = ctx
        .filters
        .catalogers
        .select("cataloger", &all)
        .into_iter()
        .cloned()
        .collect();
    if units.is_empty() {
        info!("no catalogers to run, skipping");
        return Ok(StepOutcome::Skipped);
    }

    let files = release_file_set(ctx)?;

    let mut outcome = StepOutcome::Skipped;
    let mut failures: Vec<String> = Vec::new();

    for cfg in &units {
        let _span = info_span!("catalog", cataloger = %cfg.name, r#type = %cfg.type_key).entered();

        listeners.catalog_step(&ExecutionEvent::before("catalog"), ctx, &cfg.name, true)?;

        let factory = registry.find_cataloger(&cfg.type_key)?;
        let unit = factory.build(cfg)?;

        match unit.catalog(ctx, &files) {
            Ok(unit_outcome) => {
                listeners.catalog_step(&ExecutionEvent::success("catalog"), ctx, &cfg.name, true)?;
                info!(cataloger = %cfg.name, outcome = unit_outcome.as_str(), "cataloged");
                outcome = outcome.merge(unit_outcome);
            }
            Err(e) => {
                let error = GantryError::from(e);
                let event = ExecutionEvent::failure("catalog", error.to_string());
                listeners.catalog_step(&event, ctx, &cfg.name, true)?;

                if ctx.model.fail_fast {
                    return Err(step_failed("catalog", error));
                }
                warn!(cataloger = %cfg.name, error = %error, "cataloger failed");
                failures.push(format!("{}: {}", cfg.name, error));
            }
        }
    }

    if !failures.is_empty() {
        return Err(units_failed("catalog", failures));
    }

    Ok(outcome)
}
