//! Error types for Gantry

use std::path::PathBuf;
use thiserror::Error;

pub use gantry_template::TemplateError;

/// Result type alias using GantryError
pub type Result<T> = std::result::Result<T, GantryError>;

/// Main error type for Gantry operations
#[derive(Debug, Error)]
pub enum GantryError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Template-related errors
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Plugin lookup errors
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Workflow-related errors
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Changelog-related errors
    #[error(transparent)]
    Changelog(#[from] ChangelogError),

    /// Signing-related errors
    #[error(transparent)]
    Signing(#[from] SigningError),

    /// Announce step errors
    #[error(transparent)]
    Announce(#[from] AnnounceError),

    /// Upload step errors
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Download step errors
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Deploy step errors
    #[error(transparent)]
    Deploy(#[from] DeployError),

    /// Release step errors
    #[error(transparent)]
    Release(#[from] ReleaseError),

    /// SBOM catalog step errors
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl GantryError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// No parser recognizes the configuration file
    #[error("Unsupported configuration format: {0}")]
    UnsupportedFormat(PathBuf),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Plugin lookup errors
#[derive(Debug, Error)]
pub enum PluginError {
    /// No factory registered for the requested type key
    #[error("Unsupported {category} type: {type_key}")]
    Unsupported { category: String, type_key: String },
}

/// Workflow-related errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Model validation failed
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// A workflow step failed
    #[error("Workflow step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<GantryError>,
    },

    /// Multiple units failed within a single step
    #[error("Workflow step '{step}' failed for {count} unit(s): {reasons}")]
    StepUnitsFailed {
        step: String,
        count: usize,
        reasons: String,
    },
}

/// Changelog-related errors
#[derive(Debug, Error)]
pub enum ChangelogError {
    /// External changelog file not found
    #[error("Changelog file not found at {0}")]
    FileNotFound(PathBuf),

    /// Failed to generate changelog
    #[error("Failed to generate changelog: {0}")]
    GenerationFailed(String),

    /// Git error while reading history
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Signing-related errors
#[derive(Debug, Error)]
pub enum SigningError {
    /// Signing tool not found on PATH
    #[error("Signing tool not found: {0}")]
    ToolNotFound(String),

    /// Signing tool returned a failure
    #[error("Signing tool {tool} failed: {reason}")]
    ToolFailed { tool: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Announce step errors
#[derive(Debug, Error)]
pub enum AnnounceError {
    /// Announcer tool not found on PATH
    #[error("Announcer tool not found: {0}")]
    ToolNotFound(String),

    /// Announcer command failed
    #[error("Announcer command failed: {command} - {reason}")]
    CommandFailed { command: String, reason: String },

    /// Template error while building the announcement
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Upload step errors
#[derive(Debug, Error)]
pub enum UploadError {
    /// Upload target rejected or failed
    #[error("Upload failed for {target}: {reason}")]
    Failed { target: String, reason: String },

    /// Template error while resolving the upload target
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Download step errors
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Download source missing or unreadable
    #[error("Download failed for {source_path}: {reason}")]
    Failed { source_path: String, reason: String },

    /// Template error while resolving the download source
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Deploy step errors
#[derive(Debug, Error)]
pub enum DeployError {
    /// Deployer tool not found on PATH
    #[error("Deployer tool not found: {0}")]
    ToolNotFound(String),

    /// Deployer command failed
    #[error("Deploy command failed: {command} - {reason}")]
    CommandFailed { command: String, reason: String },

    /// Template error while resolving deploy settings
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Release step errors
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// Releaser tool not found on PATH
    #[error("Releaser tool not found: {0}")]
    ToolNotFound(String),

    /// Release creation failed
    #[error("Failed to create release {tag}: {reason}")]
    Failed { tag: String, reason: String },

    /// Template error while resolving tag or release name
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// SBOM catalog step errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Cataloger tool not found on PATH
    #[error("Cataloger tool not found: {0}")]
    ToolNotFound(String),

    /// Cataloger command failed
    #[error("Cataloger {tool} failed: {reason}")]
    ToolFailed { tool: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
