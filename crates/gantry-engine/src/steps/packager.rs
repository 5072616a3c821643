//! Packager step drivers (prepare, package, publish)
//!
//! Prepare renders every file of a packager's template directory through
//! the iterative resolver into the prepare directory; package stages the
//! prepared tree into the package directory; publish hands the staged
//! output to the packager's publish command. All three phases walk the
//! same distribution × packager grid under the active filters.

use std::path::Path;
use std::process::{Command as ProcessCommand, Stdio};

use tracing::{debug, info, info_span, warn};

use gantry_core::error::ConfigError;
use gantry_core::files::{copy_if_changed, write_if_changed};
use gantry_core::model::{Distribution, PackagerConfig};
use gantry_core::{Context, GantryError, Result, StepOutcome};
use gantry_template::{self as template, TemplateContext};

use crate::listeners::{ExecutionEvent, ListenerDispatcher};

use super::{selected_distributions, step_failed, units_failed};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Prepare,
    Package,
    Publish,
}

impl Phase {
    fn step_name(self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::Package => "package",
            Self::Publish => "publish",
        }
    }
}

/// Run the prepare step
pub fn prepare(ctx: &mut Context, listeners: &ListenerDispatcher) -> Result<StepOutcome> {
    run_phase(ctx, listeners, Phase::Prepare)
}

/// Run the package step
pub fn package(ctx: &mut Context, listeners: &ListenerDispatcher) -> Result<StepOutcome> {
    run_phase(ctx, listeners, Phase::Package)
}

/// Run the publish step
pub fn publish(ctx: &mut Context, listeners: &ListenerDispatcher) -> Result<StepOutcome> {
    run_phase(ctx, listeners, Phase::Publish)
}

fn run_phase(
    ctx: &mut Context,
    listeners: &ListenerDispatcher,
    phase: Phase,
) -> Result<StepOutcome> {
    let all: Vec<&PackagerConfig> = ctx.model.packagers.iter().collect();
    let packagers: Vec<PackagerConfig> = ctx
        .filters
        .packagers
        .select("packager", &all)
        .into_iter()
        .cloned()
        .collect();
    if packagers.is_empty() {
        info!(phase = phase.step_name(), "no packagers to run, skipping");
        return Ok(StepOutcome::Skipped);
    }

    let dists: Vec<Distribution> = selected_distributions(ctx)
        .into_iter()
        .cloned()
        .collect();
    if dists.is_empty() {
        info!(phase = phase.step_name(), "no active distributions, skipping");
        return Ok(StepOutcome::Skipped);
    }

    let mut outcome = StepOutcome::Skipped;
    let mut failures: Vec<String> = Vec::new();

    for dist in &dists {
        listeners.distribution_start(ctx, &dist.name)?;

        for pkgr in &packagers {
            let _span = info_span!(
                "packager",
                distribution = %dist.name,
                packager = %pkgr.name,
                phase = phase.step_name()
            )
            .entered();

            fire(listeners, ctx, phase, dist, pkgr, ExecutionEvent::before(phase.step_name()))?;

            let result = match phase {
                Phase::Prepare => prepare_unit(ctx, dist, pkgr),
                Phase::Package => package_unit(ctx, dist, pkgr),
                Phase::Publish => publish_unit(ctx, dist, pkgr),
            };

            match result {
                Ok(unit_outcome) => {
                    fire(
                        listeners,
                        ctx,
                        phase,
                        dist,
                        pkgr,
                        ExecutionEvent::success(phase.step_name()),
                    )?;
                    outcome = outcome.merge(unit_outcome);
                }
                Err(e) => {
                    fire(
                        listeners,
                        ctx,
                        phase,
                        dist,
                        pkgr,
                        ExecutionEvent::failure(phase.step_name(), e.to_string()),
                    )?;

                    if ctx.model.fail_fast {
                        return Err(step_failed(phase.step_name(), e));
                    }
                    warn!(
                        distribution = %dist.name,
                        packager = %pkgr.name,
                        error = %e,
                        "packager failed"
                    );
                    failures.push(format!("{}/{}: {}", dist.name, pkgr.name, e));
                }
            }
        }

        listeners.distribution_end(ctx, &dist.name)?;
    }

    if !failures.is_empty() {
        return Err(units_failed(phase.step_name(), failures));
    }

    Ok(outcome)
}

fn fire(
    listeners: &ListenerDispatcher,
    ctx: &Context,
    phase: Phase,
    dist: &Distribution,
    pkgr: &PackagerConfig,
    event: ExecutionEvent,
) -> Result<()> {
    match phase {
        Phase::Prepare => listeners.packager_prepare_step(&event, ctx, &dist.name, &pkgr.name),
        Phase::Package => listeners.packager_package_step(&event, ctx, &dist.name, &pkgr.name),
        Phase::Publish => listeners.packager_publish_step(&event, ctx, &dist.name, &pkgr.name),
    }
}

fn packager_props(ctx: &Context, dist: &Distribution, pkgr: &PackagerConfig) -> TemplateContext {
    let mut props = ctx.props();
    props.set("distributionName", &dist.name);
    props.set("distributionType", &dist.distribution_type);
    props.set("packagerName", &pkgr.name);
    for (key, value) in &dist.extra_properties {
        props.set(key, value);
    }
    for (key, value) in &pkgr.extra {
        props.set(key, value);
    }
    props
}

fn files_under(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    let pattern = format!("{}/**/*", dir.display());
    let mut files = Vec::new();
    for entry in glob::glob(&pattern)
        .map_err(|e| GantryError::other(format!("invalid pattern '{}': {}", pattern, e)))?
    {
        let path = entry.map_err(|e| GantryError::other(format!("walk error: {}", e)))?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn prepare_unit(ctx: &Context, dist: &Distribution, pkgr: &PackagerConfig) -> Result<StepOutcome> {
    let Some(template_dir) = &pkgr.template_dir else {
        debug!(packager = %pkgr.name, "no template directory configured, nothing to prepare");
        return Ok(StepOutcome::Skipped);
    };
    let template_dir = ctx.base_dir.join(template_dir);
    if !template_dir.is_dir() {
        return Err(ConfigError::InvalidValue {
            field: format!("packagers.{}.template_dir", pkgr.name),
            message: format!("directory not found: {}", template_dir.display()),
        }
        .into());
    }

    let out_dir = ctx.prepare_dir().join(&dist.name).join(&pkgr.name);
    let props = packager_props(ctx, dist, pkgr);

    let mut wrote = false;
    let mut count = 0usize;
    for file in files_under(&template_dir)? {
        let rel = file
            .strip_prefix(&template_dir)
            .map_err(|e| GantryError::other(format!("template path error: {}", e)))?;

        let content = std::fs::read_to_string(&file)?;
        let rendered = template::resolve_named(&content, &props, &rel.display().to_string())?;

        wrote |= write_if_changed(&out_dir.join(rel), rendered.as_bytes())?;
        count += 1;
    }

    debug!(files = count, out_dir = %out_dir.display(), "templates prepared");
    Ok(if wrote {
        StepOutcome::Succeeded
    } else {
        StepOutcome::UpToDate
    })
}

fn package_unit(ctx: &Context, dist: &Distribution, pkgr: &PackagerConfig) -> Result<StepOutcome> {
    let prepared = ctx.prepare_dir().join(&dist.name).join(&pkgr.name);
    if !prepared.is_dir() {
        debug!(packager = %pkgr.name, "nothing prepared, nothing to package");
        return Ok(StepOutcome::Skipped);
    }

    let out_dir = ctx.package_dir().join(&dist.name).join(&pkgr.name);

    let mut wrote = false;
    for file in files_under(&prepared)? {
        let rel = file
            .strip_prefix(&prepared)
            .map_err(|e| GantryError::other(format!("package path error: {}", e)))?;
        wrote |= copy_if_changed(&file, &out_dir.join(rel))?;
    }

    debug!(out_dir = %out_dir.display(), "packaged");
    Ok(if wrote {
        StepOutcome::Succeeded
    } else {
        StepOutcome::UpToDate
    })
}

fn publish_unit(ctx: &Context, dist: &Distribution, pkgr: &PackagerConfig) -> Result<StepOutcome> {
    let Some(command) = &pkgr.publish_command else {
        debug!(packager = %pkgr.name, "no publish command configured");
        return Ok(StepOutcome::Skipped);
    };

    if ctx.dry_run {
        info!(packager = %pkgr.name, command = %command, "dry run, skipping publish command");
        return Ok(StepOutcome::Skipped);
    }

    let package_dir = ctx.package_dir().join(&dist.name).join(&pkgr.name);
    let mut envs = ctx.export_env();
    envs.push(("GANTRY_DISTRIBUTION".to_string(), dist.name.clone()));
    envs.push(("GANTRY_PACKAGER".to_string(), pkgr.name.clone()));
    envs.push((
        "GANTRY_PACKAGE_DIR".to_string(),
        package_dir.display().to_string(),
    ));

    let shell = if cfg!(windows) { "cmd" } else { "sh" };
    let shell_arg = if cfg!(windows) { "/C" } else { "-c" };

    let mut cmd = ProcessCommand::new(shell);
    cmd.arg(shell_arg).arg(command);
    cmd.current_dir(&ctx.base_dir);
    for (key, value) in &envs {
        cmd.env(key, value);
    }
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let output = cmd.output()?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(GantryError::other(format!(
            "publish command failed for {}/{}: {}",
            dist.name, pkgr.name, stderr
        )));
    }

    info!(packager = %pkgr.name, "published");
    Ok(StepOutcome::Succeeded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::testutil::{context, model_with_artifacts};
    use gantry_core::model::Model;
    use gantry_core::types::Command;
    use tempfile::TempDir;

    fn model_with_packager(temp: &TempDir) -> Model {
        std::fs::create_dir_all(temp.path().join("templates/brew")).unwrap();
        std::fs::write(
            temp.path().join("templates/brew/formula.rb"),
            "version \"{{projectVersion}}\"\nname \"{{distributionName}}\"\n",
        )
        .unwrap();

        let mut model = model_with_artifacts(&["demo.tar.gz"]);
        model.packagers.push(PackagerConfig {
            name: "brew".to_string(),
            active: true,
            template_dir: Some("templates/brew".into()),
            publish_command: None,
            extra: Default::default(),
        });
        model
    }

    #[test]
    fn test_prepare_renders_templates() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(model_with_packager(&temp), temp.path(), Command::Prepare);
        let listeners = ListenerDispatcher::empty();

        let outcome = prepare(&mut ctx, &listeners).unwrap();
        assert_eq!(outcome, StepOutcome::Succeeded);

        let rendered = std::fs::read_to_string(
            ctx.prepare_dir().join("app/brew/formula.rb"),
        )
        .unwrap();
        assert!(rendered.contains("version \"1.0.0\""));
        assert!(rendered.contains("name \"app\""));
    }

    #[test]
    fn test_prepare_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(model_with_packager(&temp), temp.path(), Command::Prepare);
        let listeners = ListenerDispatcher::empty();

        prepare(&mut ctx, &listeners).unwrap();
        let outcome = prepare(&mut ctx, &listeners).unwrap();
        assert_eq!(outcome, StepOutcome::UpToDate);
    }

    #[test]
    fn test_missing_template_dir_fails() {
        let temp = TempDir::new().unwrap();
        let mut model = model_with_packager(&temp);
        model.packagers[0].template_dir = Some("templates/missing".into());

        let mut ctx = context(model, temp.path(), Command::Prepare);
        assert!(prepare(&mut ctx, &ListenerDispatcher::empty()).is_err());
    }

    #[test]
    fn test_package_copies_prepared_tree() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(model_with_packager(&temp), temp.path(), Command::Package);
        let listeners = ListenerDispatcher::empty();

        prepare(&mut ctx, &listeners).unwrap();
        let outcome = package(&mut ctx, &listeners).unwrap();
        assert_eq!(outcome, StepOutcome::Succeeded);
        assert!(ctx.package_dir().join("app/brew/formula.rb").is_file());
    }

    #[test]
    fn test_package_without_prepare_skips() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(model_with_packager(&temp), temp.path(), Command::Package);

        let outcome = package(&mut ctx, &ListenerDispatcher::empty()).unwrap();
        assert_eq!(outcome, StepOutcome::Skipped);
    }

    #[test]
    fn test_publish_without_command_skips() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(model_with_packager(&temp), temp.path(), Command::Publish);

        let outcome = publish(&mut ctx, &ListenerDispatcher::empty()).unwrap();
        assert_eq!(outcome, StepOutcome::Skipped);
    }

    #[cfg(unix)]
    #[test]
    fn test_publish_runs_command() {
        let temp = TempDir::new().unwrap();
        let mut model = model_with_packager(&temp);
        model.packagers[0].publish_command = Some("true".to_string());

        let mut ctx = context(model, temp.path(), Command::Publish);
        let outcome = publish(&mut ctx, &ListenerDispatcher::empty()).unwrap();
        assert_eq!(outcome, StepOutcome::Succeeded);
    }

    #[cfg(unix)]
    #[test]
    fn test_publish_failure_surfaces() {
        let temp = TempDir::new().unwrap();
        let mut model = model_with_packager(&temp);
        model.packagers[0].publish_command = Some("exit 4".to_string());

        let mut ctx = context(model, temp.path(), Command::Publish);
        assert!(publish(&mut ctx, &ListenerDispatcher::empty()).is_err());
    }

    #[test]
    fn test_publish_dry_run_skips() {
        let temp = TempDir::new().unwrap();
        let mut model = model_with_packager(&temp);
        model.packagers[0].publish_command = Some("exit 4".to_string());

        let mut ctx = context(model, temp.path(), Command::Publish).with_dry_run(true);
        let outcome = publish(&mut ctx, &ListenerDispatcher::empty()).unwrap();
        assert_eq!(outcome, StepOutcome::Skipped);
    }

    #[test]
    fn test_no_packagers_skips() {
        let temp = TempDir::new().unwrap();
        let mut ctx = context(
            model_with_artifacts(&["demo.tar.gz"]),
            temp.path(),
            Command::Prepare,
        );

        let outcome = prepare(&mut ctx, &ListenerDispatcher::empty()).unwrap();
        assert_eq!(outcome, StepOutcome::Skipped);
    }
}
