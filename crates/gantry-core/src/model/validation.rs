//! Model validation

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{ConfigError, Result};

use super::types::{Model, UnitConfig};

/// Validate the full model.
///
/// Runs before the first workflow step; a failure here aborts the run with
/// no side effects. In strict mode validation warnings are promoted to
/// errors.
pub fn validate_model(model: &Model, base_dir: &Path, strict: bool) -> Result<()> {
    debug!("validating model");
    validate_project(model, strict)?;
    validate_distributions(model, base_dir, strict)?;
    validate_units(model)?;
    validate_release(model, strict)?;
    debug!("model validation passed");
    Ok(())
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> crate::error::GantryError {
    ConfigError::InvalidValue {
        field: field.into(),
        message: message.into(),
    }
    .into()
}

fn validate_project(model: &Model, strict: bool) -> Result<()> {
    if model.project.name.is_empty() {
        return Err(invalid("project.name", "project name cannot be empty"));
    }
    if model.project.version.is_empty() {
        return Err(invalid("project.version", "project version cannot be empty"));
    }

    if semver::Version::parse(&model.project.version).is_err() {
        if strict {
            return Err(invalid(
                "project.version",
                format!("'{}' is not a semantic version", model.project.version),
            ));
        }
        warn!(
            version = %model.project.version,
            "project version is not a semantic version"
        );
    }

    Ok(())
}

fn validate_distributions(model: &Model, base_dir: &Path, strict: bool) -> Result<()> {
    for (name, dist) in &model.distributions {
        if dist.artifacts.is_empty() {
            return Err(invalid(
                format!("distributions.{}.artifacts", name),
                "distribution must declare at least one artifact",
            ));
        }

        for (i, artifact) in dist.artifacts.iter().enumerate() {
            if artifact.path.is_empty() {
                return Err(invalid(
                    format!("distributions.{}.artifacts[{}].path", name, i),
                    "artifact path cannot be empty",
                ));
            }

            // Plain paths can be checked on disk; templated or globbed
            // paths resolve later, at step time.
            if !artifact.path.contains("{{") && !artifact.path.contains('*') {
                let path = base_dir.join(&artifact.path);
                if !path.exists() {
                    if strict {
                        return Err(invalid(
                            format!("distributions.{}.artifacts[{}].path", name, i),
                            format!("artifact not found at {}", path.display()),
                        ));
                    }
                    warn!(
                        distribution = %name,
                        path = %path.display(),
                        "artifact not found on disk"
                    );
                }
            }
        }
    }

    Ok(())
}

fn validate_units(model: &Model) -> Result<()> {
    check_unique("upload.uploaders", &model.upload.uploaders)?;
    check_unique("download.downloaders", &model.download.downloaders)?;
    check_unique("deploy.deployers", &model.deploy.deployers)?;
    check_unique("catalog.catalogers", &model.catalog.catalogers)?;
    check_unique("announce.announcers", &model.announce.announcers)?;
    check_unique("packagers", &model.packagers)?;
    Ok(())
}

fn check_unique<U: UnitConfig>(field: &str, units: &[U]) -> Result<()> {
    let mut seen = HashSet::new();
    for unit in units {
        if unit.unit_name().is_empty() {
            return Err(invalid(field, "unit name cannot be empty"));
        }
        if unit.unit_type().is_empty() {
            return Err(invalid(
                format!("{}.{}", field, unit.unit_name()),
                "unit type cannot be empty",
            ));
        }
        if !seen.insert(unit.unit_name().to_string()) {
            return Err(invalid(
                field,
                format!("duplicate unit name: {}", unit.unit_name()),
            ));
        }
    }
    Ok(())
}

fn validate_release(model: &Model, strict: bool) -> Result<()> {
    let github = &model.release.github;
    if !github.enabled {
        return Ok(());
    }

    if github.owner.is_empty() || github.name.is_empty() {
        if strict {
            return Err(invalid(
                "release.github",
                "owner and name are required when the releaser is enabled",
            ));
        }
        warn!("release.github.owner/name not set; the release step will fail if it runs");
    }

    if github.tag_name.is_empty() {
        return Err(invalid("release.github.tag_name", "tag name cannot be empty"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::{Artifact, Distribution, UploaderConfig};

    fn base_model() -> Model {
        Model {
            project: crate::model::Project {
                name: "demo".to_string(),
                version: "1.0.0".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_minimal_model() {
        let model = base_model();
        assert!(validate_model(&model, Path::new("."), false).is_ok());
    }

    #[test]
    fn test_empty_project_name_fails() {
        let mut model = base_model();
        model.project.name.clear();
        assert!(validate_model(&model, Path::new("."), false).is_err());
    }

    #[test]
    fn test_non_semver_version_warns_unless_strict() {
        let mut model = base_model();
        model.project.version = "not-a-version".to_string();

        assert!(validate_model(&model, Path::new("."), false).is_ok());
        assert!(validate_model(&model, Path::new("."), true).is_err());
    }

    #[test]
    fn test_distribution_without_artifacts_fails() {
        let mut model = base_model();
        model.distributions.insert(
            "app".to_string(),
            Distribution {
                name: "app".to_string(),
                ..Default::default()
            },
        );

        assert!(validate_model(&model, Path::new("."), false).is_err());
    }

    #[test]
    fn test_missing_artifact_on_disk_fails_in_strict_mode() {
        let mut model = base_model();
        model.distributions.insert(
            "app".to_string(),
            Distribution {
                name: "app".to_string(),
                artifacts: vec![Artifact {
                    path: "does/not/exist.bin".to_string(),
                    platform: None,
                }],
                ..Default::default()
            },
        );

        assert!(validate_model(&model, Path::new("."), false).is_ok());
        assert!(validate_model(&model, Path::new("."), true).is_err());
    }

    #[test]
    fn test_duplicate_unit_names_fail() {
        let mut model = base_model();
        for _ in 0..2 {
            model.upload.uploaders.push(UploaderConfig {
                name: "same".to_string(),
                type_key: "directory".to_string(),
                active: true,
                connect_timeout: 20,
                read_timeout: 60,
                extra: Default::default(),
            });
        }

        assert!(validate_model(&model, Path::new("."), false).is_err());
    }
}
