//! Init command

use clap::Args;

use gantry_core::error::ConfigError;
use gantry_core::{GantryError, Result};

use crate::cli::{output, Cli};

const STARTER_CONFIG: &str = r#"[project]
name = "my-project"
version = "0.1.0"
description = "A project released with gantry"

[release.github]
owner = "my-org"
name = "my-project"
tag_name = "v{{projectVersion}}"

[distributions.app]
type = "binary"
artifacts = [
    { path = "target/release/my-project" },
]

[checksum]
algorithm = "sha256"

[[announce.announcers]]
name = "console"
type = "log"
message = "{{projectName}} {{projectVersion}} has been released!"
"#;

/// Write a starter configuration
#[derive(Debug, Args)]
pub struct InitCommand {
    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    /// Execute the init command
    pub fn execute(&self, cli: &Cli) -> Result<()> {
        let path = std::env::current_dir()
            .map_err(GantryError::Io)?
            .join("gantry.toml");

        if path.exists() && !self.force {
            return Err(ConfigError::InvalidValue {
                field: "gantry.toml".to_string(),
                message: "already exists; use --force to overwrite".to_string(),
            }
            .into());
        }

        std::fs::write(&path, STARTER_CONFIG).map_err(GantryError::Io)?;

        if !cli.quiet {
            output::success(&format!("wrote {}", path.display()));
            output::info("edit the project name, version and artifacts, then run: gantry checksum");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starter_config_parses() {
        let model: gantry_core::Model = toml::from_str(STARTER_CONFIG).unwrap();
        assert_eq!(model.project.name, "my-project");
        assert_eq!(model.distributions.len(), 1);
        assert_eq!(model.announce.announcers[0].type_key, "log");
    }
}
