//! Command-backed deployer

use tracing::{debug, info};

use gantry_core::error::{ConfigError, DeployError};
use gantry_core::model::DeployerConfig;
use gantry_core::{Context, Result};

use crate::traits::{Deployer, DeployerFactory};

use super::{failure_reason, run_shell};

/// Deployer that delegates to a configured shell command.
///
/// The run facts and the deploy staging directory are exported as
/// environment variables; the command owns the actual transfer.
pub struct CommandDeployer {
    config: DeployerConfig,
    command: String,
}

impl Deployer for CommandDeployer {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn type_key(&self) -> &'static str {
        "command"
    }

    fn is_enabled(&self) -> bool {
        self.config.active
    }

    fn deploy(&self, ctx: &Context) -> std::result::Result<(), DeployError> {
        if ctx.dry_run {
            info!(deployer = %self.config.name, command = %self.command, "dry run, skipping deploy command");
            return Ok(());
        }

        let mut envs = ctx.export_env();
        envs.push((
            "GANTRY_DEPLOY_DIR".to_string(),
            ctx.deploy_dir().display().to_string(),
        ));

        debug!(deployer = %self.config.name, command = %self.command, "running deploy command");
        let output = run_shell(&self.command, &ctx.base_dir, &envs)?;

        if !output.status.success() {
            return Err(DeployError::CommandFailed {
                command: self.command.clone(),
                reason: failure_reason(&output),
            });
        }

        Ok(())
    }
}

/// Factory for [`CommandDeployer`]
pub struct CommandDeployerFactory;

impl DeployerFactory for CommandDeployerFactory {
    fn type_key(&self) -> &'static str {
        "command"
    }

    fn build(&self, config: &DeployerConfig) -> Result<Box<dyn Deployer>> {
        let command = config.extra.get("command").cloned().ok_or_else(|| {
            ConfigError::MissingField(format!("deploy.deployers.{}.extra.command", config.name))
        })?;

        Ok(Box::new(CommandDeployer {
            config: config.clone(),
            command,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::model::{Model, Project};
    use gantry_core::types::Command;

    fn context() -> Context {
        let model = Model {
            project: Project {
                name: "demo".to_string(),
                version: "1.0.0".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        Context::new(model, "/tmp", Command::Deploy)
    }

    fn deployer_config(command: Option<&str>) -> DeployerConfig {
        let mut extra = indexmap::IndexMap::new();
        if let Some(command) = command {
            extra.insert("command".to_string(), command.to_string());
        }
        DeployerConfig {
            name: "stage".to_string(),
            type_key: "command".to_string(),
            active: true,
            extra,
        }
    }

    #[test]
    fn test_deployer_requires_command() {
        assert!(CommandDeployerFactory.build(&deployer_config(None)).is_err());
    }

    #[test]
    fn test_deployer_dry_run_skips_execution() {
        let ctx = context().with_dry_run(true);
        let unit = CommandDeployerFactory
            .build(&deployer_config(Some("exit 1")))
            .unwrap();

        assert!(unit.deploy(&ctx).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_deployer_failure_surfaces() {
        let ctx = context();
        let unit = CommandDeployerFactory
            .build(&deployer_config(Some("exit 2")))
            .unwrap();

        let err = unit.deploy(&ctx).unwrap_err();
        assert!(matches!(err, DeployError::CommandFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_deployer_success() {
        let ctx = context();
        let unit = CommandDeployerFactory
            .build(&deployer_config(Some("true")))
            .unwrap();

        assert!(unit.deploy(&ctx).is_ok());
    }
}
