//! Deploy step driver

use tracing::{info, info_span, warn};

use gantry_core::model::DeployerConfig;
use gantry_core::{Context, GantryError, Result, StepOutcome};
use gantry_plugins::PluginRegistry;

use crate::listeners::{ExecutionEvent, ListenerDispatcher};

use super::{step_failed, units_failed};

/// Run the deploy step
pub fn run(
    ctx: &mut Context,
    listeners: &ListenerDispatcher,
    registry: &PluginRegistry,
) -> Result<StepOutcome> {
    if !ctx.model.deploy.active {
        info!("deploys disabled, skipping");
        return Ok(StepOutcome::Skipped);
    }

    let all: Vec<&DeployerConfig> = ctx.model.deploy.deployers.iter().collect();
    let units: Vec<DeployerConfig> = ctx
        .filters
        .deployers
        .select("deployer", &all)
        .into_iter()
        .cloned()
        .collect();
    if units.is_empty() {
        info!("no deployers to run, skipping");
        return Ok(StepOutcome::Skipped);
    }

    let mut failures: Vec<String> = Vec::new();

    for cfg in &units {
        let _span = info_span!("deploy", deployer = %cfg.name, r#type = %cfg.type_key).entered();

        listeners.deploy_step(&ExecutionEvent::before("deploy"), ctx, &cfg.name, true)?;

        let factory = registry.find_deployer(&cfg.type_key)?;
        let unit = factory.build(cfg)?;

        match unit.deploy(ctx) {
            Ok(()) => {
                listeners.deploy_step(&ExecutionEvent::success("deploy"), ctx, &cfg.name, true)?;
                info!(deployer = %cfg.name, "deployed");
            }
            Err(e) => {
                let error = GantryError::from(e);
                let event = ExecutionEvent::failure("deploy", error.to_string());
                listeners.deploy_step(&event, ctx, &cfg.name, true)?;

                if ctx.model.fail_fast {
                    return Err(step_failed("deploy", error));
                }
                warn!(deployer = %cfg.name, error = %error, "deployer failed");
                failures.push(format!("{}: {}", cfg.name, error));
            }
        }
    }

    if !failures.is_empty() {
        return Err(units_failed("deploy", failures));
    }

    Ok(StepOutcome::Succeeded)
}
