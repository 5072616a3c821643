//! Built-in announcers

use tracing::{debug, info};

use gantry_core::error::{AnnounceError, ConfigError};
use gantry_core::model::AnnouncerConfig;
use gantry_core::{Context, Result};
use gantry_template as template;

use crate::traits::{Announcer, AnnouncerFactory};

use super::{failure_reason, run_shell};

const DEFAULT_MESSAGE: &str = "{{projectName}} {{projectVersion}} has been released!";

/// Resolve the announcement text for a unit: template file wins over the
/// inline message, which wins over the default
fn resolve_message(config: &AnnouncerConfig, ctx: &Context) -> std::result::Result<String, AnnounceError> {
    let props = ctx.props();

    if let Some(path) = &config.message_template {
        let path = ctx.base_dir.join(path);
        let raw = std::fs::read_to_string(&path)?;
        let name = path.display().to_string();
        return Ok(template::resolve_named(&raw, &props, &name)?);
    }

    let message = config.message.as_deref().unwrap_or(DEFAULT_MESSAGE);
    Ok(template::resolve(message, &props)?)
}

/// Announcer that writes the announcement to the log.
///
/// Useful as a default and in tests; it has no external effect.
pub struct LogAnnouncer {
    config: AnnouncerConfig,
}

impl Announcer for LogAnnouncer {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn type_key(&self) -> &'static str {
        "log"
    }

    fn is_enabled(&self) -> bool {
        self.config.active
    }

    fn announce(&self, ctx: &Context) -> std::result::Result<(), AnnounceError> {
        let message = resolve_message(&self.config, ctx)?;
        info!(announcer = %self.config.name, "{}", message);
        Ok(())
    }
}

/// Factory for [`LogAnnouncer`]
pub struct LogAnnouncerFactory;

impl AnnouncerFactory for LogAnnouncerFactory {
    fn type_key(&self) -> &'static str {
        "log"
    }

    fn build(&self, config: &AnnouncerConfig) -> Result<Box<dyn Announcer>> {
        Ok(Box::new(LogAnnouncer {
            config: config.clone(),
        }))
    }
}

/// Announcer that hands the announcement to a configured shell command.
///
/// The rendered message is exported as `GANTRY_ANNOUNCE_MESSAGE` together
/// with the run facts from [`Context::export_env`].
pub struct CommandAnnouncer {
    config: AnnouncerConfig,
    command: String,
}

impl Announcer for CommandAnnouncer {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn type_key(&self) -> &'static str {
        "command"
    }

    fn is_enabled(&self) -> bool {
        self.config.active
    }

    fn announce(&self, ctx: &Context) -> std::result::Result<(), AnnounceError> {
        let message = resolve_message(&self.config, ctx)?;

        if ctx.dry_run {
            info!(announcer = %self.config.name, command = %self.command, "dry run, skipping announce command");
            return Ok(());
        }

        let mut envs = ctx.export_env();
        envs.push(("GANTRY_ANNOUNCE_MESSAGE".to_string(), message));

        debug!(announcer = %self.config.name, command = %self.command, "running announce command");
        let output = run_shell(&self.command, &ctx.base_dir, &envs)?;

        if !output.status.success() {
            return Err(AnnounceError::CommandFailed {
                command: self.command.clone(),
                reason: failure_reason(&output),
            });
        }

        Ok(())
    }
}

/// Factory for [`CommandAnnouncer`]
pub struct CommandAnnouncerFactory;

impl AnnouncerFactory for CommandAnnouncerFactory {
    fn type_key(&self) -> &'static str {
        "command"
    }

    fn build(&self, config: &AnnouncerConfig) -> Result<Box<dyn Announcer>> {
        let command = config.extra.get("command").cloned().ok_or_else(|| {
            ConfigError::MissingField(format!(
                "announce.announcers.{}.extra.command",
                config.name
            ))
        })?;

        Ok(Box::new(CommandAnnouncer {
            config: config.clone(),
            command,
        }))
    }
}
