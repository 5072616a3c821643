//! Announce step driver

use tracing::{info, info_span, warn};

use gantry_core::model::AnnouncerConfig;
use gantry_core::{Context, GantryError, Result, StepOutcome};
use gantry_plugins::PluginRegistry;

use crate::listeners::{ExecutionEvent, ListenerDispatcher};

use super::{step_failed, units_failed};

/// Run the announce step
pub fn run(
    ctx: &mut Context,
    listeners: &ListenerDispatcher,
    registry: &PluginRegistry,
) -> Result<StepOutcome> {
    if !ctx.model.announce.active {
        info!("announcements disabled, skipping");
        return Ok(StepOutcome::Skipped);
    }

    let all: Vec<&AnnouncerConfig> = ctx.model.announce.announcers.iter().collect();
    let units: Vec<AnnouncerConfig> = ctx
        .filters
        .announcers
        .select("announcer", &all)
        .into_iter()
        .cloned()
        .collect();
    if units.is_empty() {
        info!("no announcers to run, skipping");
        return Ok(StepOutcome::Skipped);
    }

    let mut failures: Vec<String> = Vec::new();

    for cfg in &units {
        let _span = info_span!("announce", announcer = %cfg.name, r#type = %cfg.type_key).entered();

        listeners.announce_step(&ExecutionEvent::before("announce"), ctx, &cfg.name, true)?;

        let factory = registry.find_announcer(&cfg.type_key)?;
        let unit = factory.build(cfg)?;

        match unit.announce(ctx) {
            Ok(()) => {
                listeners.announce_step(
                    &ExecutionEvent::success("announce"),
                    ctx,
                    &cfg.name,
                    true,
                )?;
                info!(announcer = %cfg.name, "announced");
            }
            Err(e) => {
                let error = GantryError::from(e);
                let event = ExecutionEvent::failure("announce", error.to_string());
                listeners.announce_step(&event, ctx, &cfg.name, true)?;

                if ctx.model.fail_fast {
                    return Err(step_failed("announce", error));
                }
                warn!(announcer = %cfg.name, error = %error, "announcer failed");
                failures.push(format!("{}: {}", cfg.name, error));
            }
        }
    }

    if !failures.is_empty() {
        return Err(units_failed("announce", failures));
    }

    Ok(StepOutcome::Succeeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::testutil::{context, model_with_artifacts};
    use gantry_core::types::Command;
    use tempfile::TempDir;

    fn announcer(name: &str, type_key: &str) -> AnnouncerConfig {
        AnnouncerConfig {
            name: name.to_string(),
            type_key: type_key.to_string(),
            active: true,
            message: Some("{{projectName}} {{projectVersion}} is out".to_string()),
            message_template: None,
            connect_timeout: 20,
            read_timeout: 60,
            extra: Default::default(),
        }
    }

    #[test]
    fn test_no_announcers_skips() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(
            model_with_artifacts(&["demo.tar.gz"]),
            temp.path(),
            Command::Announce,
        );

        let outcome = run(
            &mut ctx,
            &ListenerDispatcher::empty(),
            &PluginRegistry::new(),
        )
        .unwrap();
        assert_eq!(outcome, StepOutcome::Skipped);
    }

    #[test]
    fn test_log_announcer_succeeds() {
        let temp = TempDir::new().unwrap();
        let mut model = model_with_artifacts(&["demo.tar.gz"]);
        model.announce.announcers.push(announcer("shout", "log"));

        let mut ctx = context(model, temp.path(), Command::Announce);
        let outcome = run(
            &mut ctx,
            &ListenerDispatcher::empty(),
            &PluginRegistry::new(),
        )
        .unwrap();
        assert_eq!(outcome, StepOutcome::Succeeded);
    }

    #[test]
    fn test_unknown_announcer_type_is_fatal() {
        let temp = TempDir::new().unwrap();
        let mut model = model_with_artifacts(&["demo.tar.gz"]);
        model.announce.announcers.push(announcer("chat", "slack"));

        let mut ctx = context(model, temp.path(), Command::Announce);
        let err = run(
            &mut ctx,
            &ListenerDispatcher::empty(),
            &PluginRegistry::new(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("slack"));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_announcer_aggregates_without_fail_fast() {
        let temp = TempDir::new().unwrap();
        let mut model = model_with_artifacts(&["demo.tar.gz"]);
        model.fail_fast = false;

        let mut failing = announcer("broken", "command");
        failing
            .extra
            .insert("command".to_string(), "exit 9".to_string());
        model.announce.announcers.push(failing);
        model.announce.announcers.push(announcer("shout", "log"));

        let mut ctx = context(model, temp.path(), Command::Announce);
        let err = run(
            &mut ctx,
            &ListenerDispatcher::empty(),
            &PluginRegistry::new(),
        )
        .unwrap_err();

        // Both units ran; the failure is reported jointly at the end
        assert!(err.to_string().contains("broken"));
        assert!(err.to_string().contains("1 unit"));
    }
}
