//! Step drivers
//!
//! Each driver follows the same shape: resolve the step's enabled flag,
//! compute the eligible unit set through the context filters, then run each
//! unit inside its own logging span with BEFORE/SUCCESS/FAILURE events
//! around the single external effect. Effect failures are wrapped into a
//! workflow error; `fail_fast` decides between immediate propagation and
//! joint reporting at the end of the unit loop.

pub mod announce;
pub mod catalog;
pub mod changelog;
pub mod checksum;
pub mod deploy;
pub mod download;
pub mod packager;
pub mod release;
pub mod sign;
pub mod upload;

use std::path::{Path, PathBuf};

use gantry_core::error::WorkflowError;
use gantry_core::model::Distribution;
use gantry_core::{Context, GantryError, Result, StepOutcome};
use gantry_plugins::PluginRegistry;
use gantry_template as template;

use crate::composer::WorkflowStep;
use crate::executor::StepInvoker;
use crate::listeners::ListenerDispatcher;

/// Dispatches each workflow step to its driver
pub struct DriverInvoker;

impl StepInvoker for DriverInvoker {
    fn invoke(
        &self,
        step: WorkflowStep,
        ctx: &mut Context,
        listeners: &ListenerDispatcher,
        registry: &PluginRegistry,
    ) -> Result<StepOutcome> {
        ctx.ensure_output_dirs()?;

        match step {
            WorkflowStep::Changelog => changelog::run(ctx),
            WorkflowStep::Checksum => checksum::run(ctx, listeners),
            WorkflowStep::Sign => sign::run(ctx),
            WorkflowStep::Upload => upload::run(ctx, listeners, registry),
            WorkflowStep::Release => release::run(ctx, listeners, registry),
            WorkflowStep::Download => download::run(ctx, listeners, registry),
            WorkflowStep::Deploy => deploy::run(ctx, listeners, registry),
            WorkflowStep::Catalog => catalog::run(ctx, listeners, registry),
            WorkflowStep::Prepare => packager::prepare(ctx, listeners),
            WorkflowStep::Package => packager::package(ctx, listeners),
            WorkflowStep::Publish => packager::publish(ctx, listeners),
            WorkflowStep::Announce => announce::run(ctx, listeners, registry),
        }
    }
}

/// Wrap a unit effect failure into the ambient workflow error
pub(crate) fn step_failed(step: &str, source: GantryError) -> GantryError {
    WorkflowError::StepFailed {
        step: step.to_string(),
        source: Box::new(source),
    }
    .into()
}

/// Joint failure report for a non-fail-fast unit loop
pub(crate) fn units_failed(step: &str, failures: Vec<String>) -> GantryError {
    WorkflowError::StepUnitsFailed {
        step: step.to_string(),
        count: failures.len(),
        reasons: failures.join("; "),
    }
    .into()
}

/// Resolve a distribution's artifact paths: templates first, then globs,
/// relative to the base directory
pub(crate) fn resolve_artifact_paths(ctx: &Context, dist: &Distribution) -> Result<Vec<PathBuf>> {
    let mut props = ctx.props();
    props.set("distributionName", &dist.name);
    for (key, value) in &dist.extra_properties {
        props.set(key, value);
    }

    let mut paths = Vec::new();
    for artifact in &dist.artifacts {
        let resolved = template::resolve(&artifact.path, &props)?;

        if resolved.contains('*') {
            let pattern = ctx.base_dir.join(&resolved);
            let entries = glob::glob(&pattern.to_string_lossy()).map_err(|e| {
                GantryError::other(format!("invalid artifact glob '{}': {}", resolved, e))
            })?;
            for entry in entries {
                let path = entry
                    .map_err(|e| GantryError::other(format!("artifact glob error: {}", e)))?;
                if path.is_file() {
                    paths.push(path);
                }
            }
        } else {
            let path = Path::new(&resolved);
            if path.is_absolute() {
                paths.push(path.to_path_buf());
            } else {
                paths.push(ctx.base_dir.join(path));
            }
        }
    }

    Ok(paths)
}

/// Distributions selected by the active filters
pub(crate) fn selected_distributions<'a>(ctx: &'a Context) -> Vec<&'a Distribution> {
    let all = ctx.model.distributions();
    ctx.filters.distributions.select("distribution", &all)
}

/// The file set a release carries: artifacts, the aggregate checksum file,
/// and any signatures staged so far
pub(crate) fn release_file_set(ctx: &Context) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for dist in selected_distributions(ctx) {
        files.extend(resolve_artifact_paths(ctx, dist)?);
    }

    let checksum_file = ctx.checksums_dir().join(ctx.model.checksum.file_name());
    if checksum_file.is_file() {
        files.push(checksum_file);
    }

    let signatures = ctx.signatures_dir();
    if signatures.is_dir() {
        let mut sigs: Vec<PathBuf> = std::fs::read_dir(&signatures)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .collect();
        sigs.sort();
        files.extend(sigs);
    }

    Ok(files)
}


#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::types::Command;
    use tempfile::TempDir;
    use testutil::{context, model_with_artifacts};

    #[test]
    fn test_resolve_artifact_paths_expands_templates() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("demo-1.0.0.tar.gz"), b"x").unwrap();

        let model = model_with_artifacts(&["{{projectName}}-{{projectVersion}}.tar.gz"]);
        let ctx = context(model, temp.path(), Command::Checksum);

        let dists = ctx.model.distributions();
        let paths = resolve_artifact_paths(&ctx, dists[0]).unwrap();
        assert_eq!(paths, vec![temp.path().join("demo-1.0.0.tar.gz")]);
    }

    #[test]
    fn test_resolve_artifact_paths_expands_globs() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("dist")).unwrap();
        std::fs::write(temp.path().join("dist/a.tar.gz"), b"a").unwrap();
        std::fs::write(temp.path().join("dist/b.tar.gz"), b"b").unwrap();
        std::fs::write(temp.path().join("dist/readme.txt"), b"r").unwrap();

        let model = model_with_artifacts(&["dist/*.tar.gz"]);
        let ctx = context(model, temp.path(), Command::Checksum);

        let dists = ctx.model.distributions();
        let mut paths = resolve_artifact_paths(&ctx, dists[0]).unwrap();
        paths.sort();
        assert_eq!(paths.len(), 2);
    }

    #[test]
    fn test_release_file_set_includes_checksums_and_signatures() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("demo.tar.gz"), b"x").unwrap();

        let model = model_with_artifacts(&["demo.tar.gz"]);
        let ctx = context(model, temp.path(), Command::Release);
        ctx.ensure_output_dirs().unwrap();

        std::fs::write(
            ctx.checksums_dir().join(ctx.model.checksum.file_name()),
            b"abc  demo.tar.gz\n",
        )
        .unwrap();
        std::fs::write(ctx.signatures_dir().join("demo.tar.gz.asc"), b"sig").unwrap();

        let files = release_file_set(&ctx).unwrap();
        assert_eq!(files.len(), 3);
    }
}
