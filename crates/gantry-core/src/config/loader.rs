//! Configuration file discovery and loading

use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{ConfigError, Result};
use crate::model::Model;

use super::ParserRegistry;

/// Candidate configuration file names, in preference order
fn config_file_names() -> &'static [&'static str] {
    &["gantry.toml", "gantry.yaml", "gantry.yml", "gantry.json"]
}

/// Load the model from a specific file
pub fn load_model(path: &Path) -> Result<Model> {
    let registry = ParserRegistry::new();
    let parser = registry.find_for(path)?;

    info!(path = %path.display(), format = parser.format(), "loading model");

    let mut file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::NotFound(path.to_path_buf()),
        _ => ConfigError::Io(e),
    })?;

    let model = parser.parse(&mut file)?;
    debug!(path = %path.display(), "model loaded");
    Ok(model)
}

/// Find a configuration file in a directory or its parents.
///
/// At each directory level the search checks:
///   1. `<dir>/<name>`          (e.g. `gantry.toml`)
///   2. `<dir>/.github/<name>`  (e.g. `.github/gantry.toml`)
///
/// The first match wins. Parents are walked until the filesystem root.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in config_file_names() {
            let config_path = current.join(name);
            if config_path.exists() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }

            let github_path = current.join(".github").join(name);
            if github_path.exists() {
                info!(path = %github_path.display(), "found config file in .github/");
                return Some(github_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

/// Load the model from a directory (searching parent directories)
pub fn load_model_from_dir(dir: &Path) -> Result<(Model, PathBuf)> {
    let config_path = find_config(dir).ok_or_else(|| ConfigError::NotFound(dir.to_path_buf()))?;
    let model = load_model(&config_path)?;
    Ok((model, config_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MINIMAL: &str = "[project]\nname = \"demo\"\nversion = \"1.0.0\"\n";

    #[test]
    fn test_find_config_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("gantry.toml");
        std::fs::write(&config_path, MINIMAL).unwrap();

        let found = find_config(temp.path());
        assert_eq!(found, Some(config_path));
    }

    #[test]
    fn test_find_config_prefers_toml_over_yaml() {
        let temp = TempDir::new().unwrap();
        let toml_path = temp.path().join("gantry.toml");
        std::fs::write(&toml_path, MINIMAL).unwrap();
        std::fs::write(
            temp.path().join("gantry.yaml"),
            "project:\n  name: demo\n  version: 1.0.0\n",
        )
        .unwrap();

        assert_eq!(find_config(temp.path()), Some(toml_path));
    }

    #[test]
    fn test_find_config_in_github_dir() {
        let temp = TempDir::new().unwrap();
        let github_dir = temp.path().join(".github");
        std::fs::create_dir_all(&github_dir).unwrap();
        let config_path = github_dir.join("gantry.toml");
        std::fs::write(&config_path, MINIMAL).unwrap();

        assert_eq!(find_config(temp.path()), Some(config_path));
    }

    #[test]
    fn test_load_model_toml() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("gantry.toml");
        std::fs::write(&config_path, MINIMAL).unwrap();

        let model = load_model(&config_path).unwrap();
        assert_eq!(model.project.name, "demo");
    }

    #[test]
    fn test_load_model_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = load_model(&temp.path().join("gantry.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_model_from_dir_walks_parents() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("gantry.toml"), MINIMAL).unwrap();
        let nested = temp.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();

        let (model, path) = load_model_from_dir(&nested).unwrap();
        assert_eq!(model.project.name, "demo");
        assert_eq!(path, temp.path().join("gantry.toml"));
    }
}
