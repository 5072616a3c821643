//! GitHub releaser
//!
//! A thin client over the `gh` CLI; gantry resolves the tag and release
//! name templates and stages the asset list, `gh` owns the REST calls and
//! authentication.

use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use gantry_core::error::ReleaseError;
use gantry_core::model::GithubConfig;
use gantry_core::{Context, Result};
use gantry_template as template;

use crate::traits::{Releaser, ReleaserFactory};

use super::failure_reason;

const TOOL: &str = "gh";

/// Releaser creating GitHub releases through the `gh` CLI
pub struct GithubReleaser {
    config: GithubConfig,
}

impl GithubReleaser {
    fn repo(&self) -> String {
        format!("{}/{}", self.config.owner, self.config.name)
    }

    fn run_gh(&self, ctx: &Context, tool: &PathBuf, args: &[String]) -> std::io::Result<std::process::Output> {
        let mut cmd = Command::new(tool);
        cmd.args(args);
        cmd.current_dir(&ctx.base_dir);
        if self.config.host != "github.com" {
            cmd.env("GH_HOST", &self.config.host);
        }
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.output()
    }
}

impl Releaser for GithubReleaser {
    fn type_key(&self) -> &'static str {
        "github"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    fn release(&self, ctx: &Context, assets: &[PathBuf]) -> std::result::Result<(), ReleaseError> {
        let props = ctx.props();
        let tag = template::resolve(&self.config.tag_name, &props)?;
        let title = template::resolve(&self.config.release_name, &props)?;

        if ctx.dry_run {
            info!(tag = %tag, repo = %self.repo(), assets = assets.len(), "dry run, skipping release creation");
            return Ok(());
        }

        let tool = which::which(TOOL).map_err(|_| ReleaseError::ToolNotFound(TOOL.to_string()))?;

        if self.config.overwrite {
            let delete_args = vec![
                "release".to_string(),
                "delete".to_string(),
                tag.clone(),
                "--repo".to_string(),
                self.repo(),
                "--yes".to_string(),
            ];
            match self.run_gh(ctx, &tool, &delete_args) {
                Ok(output) if !output.status.success() => {
                    debug!(tag = %tag, "no existing release to delete");
                }
                Ok(_) => info!(tag = %tag, "deleted existing release before overwrite"),
                Err(e) => warn!(error = %e, "failed to check for existing release"),
            }
        }

        let mut args = vec![
            "release".to_string(),
            "create".to_string(),
            tag.clone(),
            "--repo".to_string(),
            self.repo(),
            "--title".to_string(),
            title,
            "--notes".to_string(),
            ctx.changelog.resolved.clone().unwrap_or_default(),
        ];
        if self.config.draft {
            args.push("--draft".to_string());
        }
        if self.config.prerelease {
            args.push("--prerelease".to_string());
        }
        for asset in assets {
            args.push(asset.display().to_string());
        }

        debug!(tag = %tag, repo = %self.repo(), assets = assets.len(), "creating release");
        let output = self.run_gh(ctx, &tool, &args)?;

        if !output.status.success() {
            return Err(ReleaseError::Failed {
                tag,
                reason: failure_reason(&output),
            });
        }

        info!(tag = %tag, repo = %self.repo(), "release created");
        Ok(())
    }
}

/// Factory for [`GithubReleaser`]
pub struct GithubReleaserFactory;

impl ReleaserFactory for GithubReleaserFactory {
    fn type_key(&self) -> &'static str {
        "github"
    }

    fn build(&self, config: &GithubConfig) -> Result<Box<dyn Releaser>> {
        Ok(Box::new(GithubReleaser {
            config: config.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::model::{Model, Project};
    use gantry_core::types::Command;

    fn context() -> Context {
        let mut model = Model {
            project: Project {
                name: "demo".to_string(),
                version: "2.0.0".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        model.release.github.owner = "acme".to_string();
        model.release.github.name = "demo".to_string();
        Context::new(model, "/tmp", Command::Release)
    }

    #[test]
    fn test_repo_slug() {
        let releaser = GithubReleaser {
            config: context().model.release.github.clone(),
        };
        assert_eq!(releaser.repo(), "acme/demo");
    }

    #[test]
    fn test_dry_run_needs_no_tool() {
        // Dry run returns before the tool lookup, so this passes even
        // where gh is not installed
        let ctx = context().with_dry_run(true);
        let releaser = GithubReleaserFactory
            .build(&ctx.model.release.github.clone())
            .unwrap();

        assert!(releaser.release(&ctx, &[]).is_ok());
    }

    #[test]
    fn test_enabled_follows_config() {
        let mut config = context().model.release.github.clone();
        config.enabled = false;

        let releaser = GithubReleaserFactory.build(&config).unwrap();
        assert!(!releaser.is_enabled());
    }
}
