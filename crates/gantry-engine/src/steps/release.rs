//! Release step driver
//!
//! There is exactly one releaser per run; it receives the full release
//! file set (artifacts, checksums, signatures) as assets.

use tracing::{info, info_span};

use gantry_core::{Context, GantryError, Result, StepOutcome};
use gantry_plugins::PluginRegistry;

use crate::listeners::{ExecutionEvent, ListenerDispatcher};

use super::{release_file_set, step_failed};

const RELEASER_TYPE: &str = "github";

/// Run the release step
pub fn run(
    ctx: &mut Context,
    listeners: &ListenerDispatcher,
    registry: &PluginRegistry,
) -> Result<StepOutcome> {
    let github = ctx.model.release.github.clone();
    if !github.enabled {
        info!("releaser disabled, skipping");
        return Ok(StepOutcome::Skipped);
    }

    let assets = release_file_set(ctx)?;

    let _span = info_span!("release", repo = %format!("{}/{}", github.owner, github.name)).entered();

    listeners.release_step(&ExecutionEvent::before("release"), ctx, true)?;

    let factory = registry.find_releaser(RELEASER_TYPE)?;
    let unit = factory.build(&github)?;

    match unit.release(ctx, &assets) {
        Ok(()) => {
            listeners.release_step(&ExecutionEvent::success("release"), ctx, true)?;
            Ok(StepOutcome::Succeeded)
        }
        Err(e) => {
            let error = GantryError::from(e);
            let event = ExecutionEvent::failure("release", error.to_string());
            listeners.release_step(&event, ctx, true)?;
            Err(step_failed("release", error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::testutil::{context, model_with_artifacts};
    use gantry_core::types::Command;
    use tempfile::TempDir;

    #[test]
    fn test_disabled_releaser_skips() {
        let temp = TempDir::new().unwrap();
        let mut model = model_with_artifacts(&["demo.tar.gz"]);
        model.release.github.enabled = false;

        let mut ctx = context(model, temp.path(), Command::Release);
        let outcome = run(
            &mut ctx,
            &ListenerDispatcher::empty(),
            &PluginRegistry::new(),
        )
        .unwrap();
        assert_eq!(outcome, StepOutcome::Skipped);
    }

    #[test]
    fn test_dry_run_release_succeeds_without_tool() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("demo.tar.gz"), b"x").unwrap();

        let mut model = model_with_artifacts(&["demo.tar.gz"]);
        model.release.github.owner = "acme".to_string();
        model.release.github.name = "demo".to_string();

        let mut ctx = context(model, temp.path(), Command::Release).with_dry_run(true);
        let outcome = run(
            &mut ctx,
            &ListenerDispatcher::empty(),
            &PluginRegistry::new(),
        )
        .unwrap();
        assert_eq!(outcome, StepOutcome::Succeeded);
    }

    #[test]
    fn test_missing_releaser_factory_is_fatal() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("demo.tar.gz"), b"x").unwrap();

        let mut ctx = context(
            model_with_artifacts(&["demo.tar.gz"]),
            temp.path(),
            Command::Release,
        );

        let err = run(
            &mut ctx,
            &ListenerDispatcher::empty(),
            &PluginRegistry::empty(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("github"));
    }
}
