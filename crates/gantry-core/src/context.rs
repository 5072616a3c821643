//! Per-run context
//!
//! One `Context` is built per invocation, before any workflow step runs,
//! and handed down through the executor to each step driver. Only the step
//! currently executing mutates it (the changelog step fills in the
//! [`Changelog`] record before any step that reads it).

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::warn;

use gantry_template::{self as template, TemplateContext};

use crate::error::Result;
use crate::model::{Model, UnitConfig};
use crate::types::Command;

/// Changelog data resolved by the changelog step
#[derive(Debug, Clone, Default)]
pub struct Changelog {
    /// Full rendered changelog text
    pub resolved: Option<String>,
    /// Formatted commit lines only
    pub formatted_changes: Option<String>,
    /// Formatted contributor lines only
    pub formatted_contributors: Option<String>,
}

/// Include/exclude filter for one unit category.
///
/// Exclusion always wins over inclusion; with no include lists every
/// active unit is selected.
#[derive(Debug, Clone, Default)]
pub struct UnitFilter {
    /// Only run units with these type keys
    pub include_types: Vec<String>,
    /// Never run units with these type keys
    pub exclude_types: Vec<String>,
    /// Only run units with these names
    pub include_names: Vec<String>,
    /// Never run units with these names
    pub exclude_names: Vec<String>,
}

impl UnitFilter {
    /// Whether any include list is set
    fn has_includes(&self) -> bool {
        !self.include_types.is_empty() || !self.include_names.is_empty()
    }

    /// Whether this filter selects a unit
    pub fn selects(&self, type_key: &str, name: &str) -> bool {
        if self.exclude_names.iter().any(|n| n == name) {
            return false;
        }
        if self.exclude_types.iter().any(|t| t == type_key) {
            return false;
        }
        if self.has_includes() {
            return self.include_names.iter().any(|n| n == name)
                || self.include_types.iter().any(|t| t == type_key);
        }
        true
    }

    /// Select the eligible, active units of a category.
    ///
    /// Include entries that match no configured unit are warnings, not
    /// errors; they simply yield no unit.
    pub fn select<'a, U: UnitConfig + ?Sized>(&self, category: &str, units: &[&'a U]) -> Vec<&'a U> {
        for name in &self.include_names {
            if !units.iter().any(|u| u.unit_name() == name) {
                warn!(category, name = %name, "include filter references unknown unit name");
            }
        }
        for type_key in &self.include_types {
            if !units.iter().any(|u| u.unit_type() == type_key) {
                warn!(category, r#type = %type_key, "include filter references unknown unit type");
            }
        }

        units
            .iter()
            .filter(|u| u.unit_active())
            .filter(|u| self.selects(u.unit_type(), u.unit_name()))
            .copied()
            .collect()
    }
}

/// Per-category unit filters for a run
#[derive(Debug, Clone, Default)]
pub struct Filters {
    /// Distribution filter
    pub distributions: UnitFilter,
    /// Packager filter
    pub packagers: UnitFilter,
    /// Announcer filter
    pub announcers: UnitFilter,
    /// Uploader filter
    pub uploaders: UnitFilter,
    /// Downloader filter
    pub downloaders: UnitFilter,
    /// Deployer filter
    pub deployers: UnitFilter,
    /// Cataloger filter
    pub catalogers: UnitFilter,
}

/// The per-run aggregate handed to every workflow step
#[derive(Debug)]
pub struct Context {
    /// Resolved project model; read-only after validation
    pub model: Model,
    /// Directory the model paths are relative to
    pub base_dir: PathBuf,
    /// Root of everything the pipeline writes
    pub output_dir: PathBuf,
    /// Command being executed
    pub command: Command,
    /// Log effects instead of performing them
    pub dry_run: bool,
    /// Promote validation warnings to errors
    pub strict: bool,
    /// Unit filters
    pub filters: Filters,
    /// Changelog record; populated by the changelog step
    pub changelog: Changelog,
}

impl Context {
    /// Create a context rooted at a base directory
    pub fn new(model: Model, base_dir: impl Into<PathBuf>, command: Command) -> Self {
        let base_dir = base_dir.into();
        let output_dir = base_dir.join("out").join("gantry");
        Self {
            model,
            base_dir,
            output_dir,
            command,
            dry_run: false,
            strict: false,
            filters: Filters::default(),
            changelog: Changelog::default(),
        }
    }

    /// Set dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set strict mode
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Override the output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the unit filters
    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    /// Directory for checksum files
    pub fn checksums_dir(&self) -> PathBuf {
        self.output_dir.join("checksums")
    }

    /// Directory for signature files
    pub fn signatures_dir(&self) -> PathBuf {
        self.output_dir.join("signatures")
    }

    /// Directory for prepared packager files
    pub fn prepare_dir(&self) -> PathBuf {
        self.output_dir.join("prepare")
    }

    /// Directory for packaged output
    pub fn package_dir(&self) -> PathBuf {
        self.output_dir.join("package")
    }

    /// Directory for assembled artifacts
    pub fn assemble_dir(&self) -> PathBuf {
        self.output_dir.join("assemble")
    }

    /// Directory for downloaded assets
    pub fn download_dir(&self) -> PathBuf {
        self.output_dir.join("download")
    }

    /// Directory for deploy staging
    pub fn deploy_dir(&self) -> PathBuf {
        self.output_dir.join("deploy")
    }

    /// Directory for SBOM catalogs
    pub fn catalogs_dir(&self) -> PathBuf {
        self.output_dir.join("catalogs")
    }

    /// Create all output directories
    pub fn ensure_output_dirs(&self) -> Result<()> {
        for dir in [
            self.checksums_dir(),
            self.signatures_dir(),
            self.prepare_dir(),
            self.package_dir(),
            self.assemble_dir(),
            self.download_dir(),
            self.deploy_dir(),
            self.catalogs_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Build a fresh template context snapshot.
    ///
    /// Layered in order: project fields, release fields (tag and release
    /// name stay raw so nested templates expand at render time), changelog
    /// fields (pass-through, they are already rendered), then the project's
    /// extra properties, which may override anything before them.
    pub fn props(&self) -> TemplateContext {
        let mut props = TemplateContext::new();

        let project = &self.model.project;
        props.set("projectName", &project.name);
        props.set("projectVersion", &project.version);
        if let Some(description) = &project.description {
            props.set("projectDescription", description);
        }
        if let Some(website) = &project.website {
            props.set("projectWebsite", website);
        }
        if let Some(license) = &project.license {
            props.set("projectLicense", license);
        }
        if !project.authors.is_empty() {
            props.set("projectAuthors", project.authors.join(", "));
        }

        let github = &self.model.release.github;
        props.set("repoOwner", &github.owner);
        props.set("repoName", &github.name);
        props.set("repoHost", &github.host);
        props.set("tagName", &github.tag_name);
        props.set("releaseName", &github.release_name);

        props.set("timestamp", Utc::now().to_rfc3339());
        props.set("command", self.command.as_str());
        props.set("dryRun", self.dry_run.to_string());

        if let Some(text) = &self.changelog.resolved {
            props.set_passthrough("changelog", text);
        }
        if let Some(changes) = &self.changelog.formatted_changes {
            props.set_passthrough("changelogChanges", changes);
        }
        if let Some(contributors) = &self.changelog.formatted_contributors {
            props.set_passthrough("changelogContributors", contributors);
        }

        for (key, value) in &project.extra_properties {
            props.set(key, value);
        }

        props
    }

    /// Resolve the release tag name
    pub fn resolved_tag(&self) -> Result<String> {
        let tag = template::resolve(&self.model.release.github.tag_name, &self.props())?;
        Ok(tag)
    }

    /// Export run facts as environment variables for spawned commands
    pub fn export_env(&self) -> Vec<(String, String)> {
        let tag = self
            .resolved_tag()
            .unwrap_or_else(|_| self.model.release.github.tag_name.clone());

        vec![
            (
                "GANTRY_PROJECT_NAME".to_string(),
                self.model.project.name.clone(),
            ),
            (
                "GANTRY_PROJECT_VERSION".to_string(),
                self.model.project.version.clone(),
            ),
            ("GANTRY_TAG_NAME".to_string(), tag),
            ("GANTRY_COMMAND".to_string(), self.command.as_str().to_string()),
            ("GANTRY_DRY_RUN".to_string(), self.dry_run.to_string()),
            (
                "GANTRY_OUTPUT_DIR".to_string(),
                self.output_dir.display().to_string(),
            ),
        ]
    }

    /// Base directory as a path
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Project, UploaderConfig};

    fn uploader(name: &str, type_key: &str, active: bool) -> UploaderConfig {
        UploaderConfig {
            name: name.to_string(),
            type_key: type_key.to_string(),
            active,
            connect_timeout: 20,
            read_timeout: 60,
            extra: Default::default(),
        }
    }

    fn select<'a>(filter: &UnitFilter, units: &'a [UploaderConfig]) -> Vec<&'a UploaderConfig> {
        let refs: Vec<&UploaderConfig> = units.iter().collect();
        filter.select("uploader", &refs)
    }

    fn demo_context() -> Context {
        let model = Model {
            project: Project {
                name: "demo".to_string(),
                version: "1.2.3".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        Context::new(model, "/tmp/demo", Command::Release)
    }

    #[test]
    fn test_filter_no_lists_selects_all_active() {
        let units = vec![
            uploader("a", "directory", true),
            uploader("b", "directory", false),
        ];
        let filter = UnitFilter::default();

        let selected = select(&filter, &units);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "a");
    }

    #[test]
    fn test_filter_exclude_wins_over_include() {
        // A name both included by type and excluded by name is excluded
        let units = vec![
            uploader("a", "directory", true),
            uploader("b", "directory", true),
        ];
        let filter = UnitFilter {
            include_types: vec!["directory".to_string()],
            exclude_names: vec!["b".to_string()],
            ..Default::default()
        };

        let selected = select(&filter, &units);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "a");
    }

    #[test]
    fn test_filter_include_by_name() {
        let units = vec![
            uploader("a", "directory", true),
            uploader("b", "s3", true),
        ];
        let filter = UnitFilter {
            include_names: vec!["b".to_string()],
            ..Default::default()
        };

        let selected = select(&filter, &units);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "b");
    }

    #[test]
    fn test_filter_unknown_include_entry_yields_nothing() {
        let units = vec![uploader("a", "directory", true)];
        let filter = UnitFilter {
            include_names: vec!["missing".to_string()],
            ..Default::default()
        };

        // Warns, does not error; the unknown entry selects no unit
        let selected = select(&filter, &units);
        assert!(selected.is_empty());
    }

    #[test]
    fn test_filter_exclude_by_type() {
        let units = vec![
            uploader("a", "directory", true),
            uploader("b", "s3", true),
        ];
        let filter = UnitFilter {
            exclude_types: vec!["s3".to_string()],
            ..Default::default()
        };

        let selected = select(&filter, &units);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "a");
    }

    #[test]
    fn test_output_directories_derive_from_output_dir() {
        let ctx = demo_context();
        assert_eq!(ctx.checksums_dir(), ctx.output_dir.join("checksums"));
        assert_eq!(ctx.signatures_dir(), ctx.output_dir.join("signatures"));
        assert_eq!(ctx.catalogs_dir(), ctx.output_dir.join("catalogs"));
    }

    #[test]
    fn test_props_contains_project_fields() {
        let ctx = demo_context();
        let props = ctx.props();

        assert!(props.contains_key("projectName"));
        assert!(props.contains_key("projectVersion"));
        assert!(props.contains_key("tagName"));
        assert!(!props.contains_key("changelog"));
    }

    #[test]
    fn test_props_extra_properties_override() {
        let mut ctx = demo_context();
        ctx.model
            .project
            .extra_properties
            .insert("projectName".to_string(), "override".to_string());

        let props = ctx.props();
        let value = props.get("projectName").and_then(|v| v.as_text());
        assert_eq!(value, Some("override"));
    }

    #[test]
    fn test_props_changelog_is_passthrough() {
        let mut ctx = demo_context();
        ctx.changelog.resolved = Some("## Changes\n- a < b".to_string());

        let rendered = template::render("{{changelog}}", &ctx.props()).unwrap();
        assert_eq!(rendered, "## Changes\n- a < b");
    }

    #[test]
    fn test_resolved_tag_expands_version() {
        let ctx = demo_context();
        assert_eq!(ctx.resolved_tag().unwrap(), "v1.2.3");
    }

    #[test]
    fn test_export_env() {
        let ctx = demo_context();
        let env = ctx.export_env();

        let get = |key: &str| {
            env.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("GANTRY_PROJECT_NAME"), Some("demo"));
        assert_eq!(get("GANTRY_TAG_NAME"), Some("v1.2.3"));
        assert_eq!(get("GANTRY_DRY_RUN"), Some("false"));
    }
}
