//! Model types
//!
//! The model is what a `gantry.toml` (or `.yaml`/`.json`) file deserializes
//! into: the project being released, its distributions and artifacts, and
//! the units (announcers, uploaders, downloaders, deployers, catalogers,
//! packagers) the pipeline fans out to.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_connect_timeout() -> u64 {
    20
}

fn default_read_timeout() -> u64 {
    60
}

/// Common surface every configured unit exposes to filtering
pub trait UnitConfig {
    /// Configured unit name
    fn unit_name(&self) -> &str;

    /// Registry type key
    fn unit_type(&self) -> &str;

    /// Whether the unit is active
    fn unit_active(&self) -> bool;
}

/// Top-level project model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    /// The project being released
    pub project: Project,
    /// Release configuration
    #[serde(default)]
    pub release: Release,
    /// Named distributions
    #[serde(default)]
    pub distributions: IndexMap<String, Distribution>,
    /// Checksum configuration
    #[serde(default)]
    pub checksum: ChecksumConfig,
    /// Signing configuration
    #[serde(default)]
    pub signing: SigningConfig,
    /// Changelog configuration
    #[serde(default)]
    pub changelog: ChangelogConfig,
    /// Upload section
    #[serde(default)]
    pub upload: Upload,
    /// Download section
    #[serde(default)]
    pub download: Download,
    /// Deploy section
    #[serde(default)]
    pub deploy: Deploy,
    /// SBOM catalog section
    #[serde(default)]
    pub catalog: Catalog,
    /// Announce section
    #[serde(default)]
    pub announce: Announce,
    /// Packagers applied per distribution
    #[serde(default)]
    pub packagers: Vec<PackagerConfig>,
    /// Stop at the first unit failure within a step
    #[serde(default = "default_true")]
    pub fail_fast: bool,
}

impl Default for Model {
    fn default() -> Self {
        Self {
            project: Project::default(),
            release: Release::default(),
            distributions: IndexMap::new(),
            checksum: ChecksumConfig::default(),
            signing: SigningConfig::default(),
            changelog: ChangelogConfig::default(),
            upload: Upload::default(),
            download: Download::default(),
            deploy: Deploy::default(),
            catalog: Catalog::default(),
            announce: Announce::default(),
            packagers: Vec::new(),
            fail_fast: true,
        }
    }
}

impl Model {
    /// Propagate map keys into unit names after deserialization
    pub fn finalize(&mut self) {
        for (name, dist) in &mut self.distributions {
            if dist.name.is_empty() {
                dist.name = name.clone();
            }
        }
    }

    /// Distributions in declaration order
    pub fn distributions(&self) -> Vec<&Distribution> {
        self.distributions.values().collect()
    }
}

/// The project being released
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Project {
    /// Project name
    pub name: String,
    /// Project version
    pub version: String,
    /// Short description
    #[serde(default)]
    pub description: Option<String>,
    /// Project website
    #[serde(default)]
    pub website: Option<String>,
    /// License identifier
    #[serde(default)]
    pub license: Option<String>,
    /// Project authors
    #[serde(default)]
    pub authors: Vec<String>,
    /// Extra properties fed to the template context
    #[serde(default)]
    pub extra_properties: IndexMap<String, String>,
}

/// Release configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Release {
    /// GitHub releaser settings
    #[serde(default)]
    pub github: GithubConfig,
}

/// GitHub releaser settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// Whether the releaser runs at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Repository owner
    #[serde(default)]
    pub owner: String,
    /// Repository name
    #[serde(default)]
    pub name: String,
    /// Host, for GitHub Enterprise installs
    #[serde(default = "GithubConfig::default_host")]
    pub host: String,
    /// Tag name template
    #[serde(default = "GithubConfig::default_tag_name")]
    pub tag_name: String,
    /// Release name template
    #[serde(default = "GithubConfig::default_release_name")]
    pub release_name: String,
    /// Create the release as a draft
    #[serde(default)]
    pub draft: bool,
    /// Mark the release as a prerelease
    #[serde(default)]
    pub prerelease: bool,
    /// Replace an existing release with the same tag
    #[serde(default)]
    pub overwrite: bool,
}

impl GithubConfig {
    fn default_host() -> String {
        "github.com".to_string()
    }

    fn default_tag_name() -> String {
        "v{{projectVersion}}".to_string()
    }

    fn default_release_name() -> String {
        "Release {{tagName}}".to_string()
    }
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            owner: String::new(),
            name: String::new(),
            host: Self::default_host(),
            tag_name: Self::default_tag_name(),
            release_name: Self::default_release_name(),
            draft: false,
            prerelease: false,
            overwrite: false,
        }
    }
}

/// A distribution: a named set of artifacts released together
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Distribution {
    /// Distribution name; populated from the map key
    #[serde(skip)]
    pub name: String,
    /// Whether the distribution participates in the pipeline
    #[serde(default = "default_true")]
    pub active: bool,
    /// Distribution type (binary, jar, flat-binary, ...)
    #[serde(rename = "type", default = "Distribution::default_type")]
    pub distribution_type: String,
    /// Artifacts belonging to this distribution
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    /// Extra properties layered over the project's for templates
    #[serde(default)]
    pub extra_properties: IndexMap<String, String>,
}

impl Distribution {
    fn default_type() -> String {
        "binary".to_string()
    }
}

impl UnitConfig for Distribution {
    fn unit_name(&self) -> &str {
        &self.name
    }

    fn unit_type(&self) -> &str {
        &self.distribution_type
    }

    fn unit_active(&self) -> bool {
        self.active
    }
}

/// A single artifact path; may contain template variables and globs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Artifact {
    /// Path relative to the base directory
    pub path: String,
    /// Target platform, if platform-specific
    #[serde(default)]
    pub platform: Option<String>,
}

/// Checksum configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksumConfig {
    /// Whether checksums are computed at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Aggregate file name override
    #[serde(default)]
    pub name: Option<String>,
    /// Also write one checksum file per artifact
    #[serde(default)]
    pub individual: bool,
    /// Hash algorithm
    #[serde(default)]
    pub algorithm: ChecksumAlgorithm,
}

impl ChecksumConfig {
    /// Name of the aggregate checksum file
    pub fn file_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("checksums_{}.txt", self.algorithm.as_str()))
    }
}

impl Default for ChecksumConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: None,
            individual: false,
            algorithm: ChecksumAlgorithm::default(),
        }
    }
}

/// Supported checksum algorithms
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    /// SHA-256
    #[default]
    Sha256,
    /// SHA-512
    Sha512,
}

impl ChecksumAlgorithm {
    /// Returns the string representation of the algorithm
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }

    /// File extension for individual checksum files
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

/// Signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Whether artifacts are signed
    #[serde(default)]
    pub active: bool,
    /// Emit ASCII-armored signatures
    #[serde(default = "default_true")]
    pub armored: bool,
    /// Signing executable
    #[serde(default = "SigningConfig::default_command")]
    pub command: String,
    /// Key to sign with, passed as `--local-user`
    #[serde(default)]
    pub key_name: Option<String>,
    /// Extra arguments appended to the signing invocation
    #[serde(default)]
    pub args: Vec<String>,
}

impl SigningConfig {
    fn default_command() -> String {
        "gpg".to_string()
    }
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            active: false,
            armored: true,
            command: Self::default_command(),
            key_name: None,
            args: Vec::new(),
        }
    }
}

/// Changelog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogConfig {
    /// Whether the changelog step runs
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Pre-rendered changelog file; skips generation when set
    #[serde(default)]
    pub external: Option<PathBuf>,
    /// Regex limiting which tags mark previous releases
    #[serde(default)]
    pub tag_pattern: Option<String>,
    /// Template applied to each commit line
    #[serde(default = "ChangelogConfig::default_change_format")]
    pub change_format: String,
    /// Template applied to each contributor line
    #[serde(default = "ChangelogConfig::default_contributor_format")]
    pub contributor_format: String,
    /// Leave merge commits out of the changelog
    #[serde(default = "default_true")]
    pub skip_merge_commits: bool,
}

impl ChangelogConfig {
    fn default_change_format() -> String {
        "- {{commitShortHash}} {{commitTitle}} ({{commitAuthor}})".to_string()
    }

    fn default_contributor_format() -> String {
        "- {{contributorName}}".to_string()
    }
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            external: None,
            tag_pattern: None,
            change_format: Self::default_change_format(),
            contributor_format: Self::default_contributor_format(),
            skip_merge_commits: true,
        }
    }
}

/// Upload section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upload {
    /// Whether the upload step runs
    #[serde(default = "default_true")]
    pub active: bool,
    /// Configured uploaders
    #[serde(default)]
    pub uploaders: Vec<UploaderConfig>,
}

impl Default for Upload {
    fn default() -> Self {
        Self {
            active: true,
            uploaders: Vec::new(),
        }
    }
}

/// A configured uploader unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploaderConfig {
    /// Unit name
    pub name: String,
    /// Registry type key
    #[serde(rename = "type")]
    pub type_key: String,
    /// Whether the unit is active
    #[serde(default = "default_true")]
    pub active: bool,
    /// Connect timeout in seconds, passed through to the implementation
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    /// Read timeout in seconds, passed through to the implementation
    #[serde(default = "default_read_timeout")]
    pub read_timeout: u64,
    /// Type-specific settings; values may contain templates
    #[serde(default)]
    pub extra: IndexMap<String, String>,
}

impl UnitConfig for UploaderConfig {
    fn unit_name(&self) -> &str {
        &self.name
    }

    fn unit_type(&self) -> &str {
        &self.type_key
    }

    fn unit_active(&self) -> bool {
        self.active
    }
}

/// Download section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Download {
    /// Whether the download step runs
    #[serde(default = "default_true")]
    pub active: bool,
    /// Configured downloaders
    #[serde(default)]
    pub downloaders: Vec<DownloaderConfig>,
}

impl Default for Download {
    fn default() -> Self {
        Self {
            active: true,
            downloaders: Vec::new(),
        }
    }
}

/// A configured downloader unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Unit name
    pub name: String,
    /// Registry type key
    #[serde(rename = "type")]
    pub type_key: String,
    /// Whether the unit is active
    #[serde(default = "default_true")]
    pub active: bool,
    /// Assets to fetch
    #[serde(default)]
    pub assets: Vec<DownloadAsset>,
    /// Type-specific settings; values may contain templates
    #[serde(default)]
    pub extra: IndexMap<String, String>,
}

impl UnitConfig for DownloaderConfig {
    fn unit_name(&self) -> &str {
        &self.name
    }

    fn unit_type(&self) -> &str {
        &self.type_key
    }

    fn unit_active(&self) -> bool {
        self.active
    }
}

/// One asset a downloader fetches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadAsset {
    /// Source location; may contain templates
    pub input: String,
    /// Output file name override
    #[serde(default)]
    pub output: Option<String>,
}

/// Deploy section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deploy {
    /// Whether the deploy step runs
    #[serde(default = "default_true")]
    pub active: bool,
    /// Configured deployers
    #[serde(default)]
    pub deployers: Vec<DeployerConfig>,
}

impl Default for Deploy {
    fn default() -> Self {
        Self {
            active: true,
            deployers: Vec::new(),
        }
    }
}

/// A configured deployer unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployerConfig {
    /// Unit name
    pub name: String,
    /// Registry type key
    #[serde(rename = "type")]
    pub type_key: String,
    /// Whether the unit is active
    #[serde(default = "default_true")]
    pub active: bool,
    /// Type-specific settings; values may contain templates
    #[serde(default)]
    pub extra: IndexMap<String, String>,
}

impl UnitConfig for DeployerConfig {
    fn unit_name(&self) -> &str {
        &self.name
    }

    fn unit_type(&self) -> &str {
        &self.type_key
    }

    fn unit_active(&self) -> bool {
        self.active
    }
}

/// SBOM catalog section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Whether the catalog step runs
    #[serde(default = "default_true")]
    pub active: bool,
    /// Configured catalogers
    #[serde(default)]
    pub catalogers: Vec<CatalogerConfig>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            active: true,
            catalogers: Vec::new(),
        }
    }
}

/// A configured SBOM cataloger unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogerConfig {
    /// Unit name
    pub name: String,
    /// Registry type key
    #[serde(rename = "type")]
    pub type_key: String,
    /// Whether the unit is active
    #[serde(default = "default_true")]
    pub active: bool,
    /// Type-specific settings; values may contain templates
    #[serde(default)]
    pub extra: IndexMap<String, String>,
}

impl UnitConfig for CatalogerConfig {
    fn unit_name(&self) -> &str {
        &self.name
    }

    fn unit_type(&self) -> &str {
        &self.type_key
    }

    fn unit_active(&self) -> bool {
        self.active
    }
}

/// Announce section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Announce {
    /// Whether the announce step runs
    #[serde(default = "default_true")]
    pub active: bool,
    /// Configured announcers
    #[serde(default)]
    pub announcers: Vec<AnnouncerConfig>,
}

impl Default for Announce {
    fn default() -> Self {
        Self {
            active: true,
            announcers: Vec::new(),
        }
    }
}

/// A configured announcer unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncerConfig {
    /// Unit name
    pub name: String,
    /// Registry type key
    #[serde(rename = "type")]
    pub type_key: String,
    /// Whether the unit is active
    #[serde(default = "default_true")]
    pub active: bool,
    /// Inline announcement template
    #[serde(default)]
    pub message: Option<String>,
    /// Announcement template read from a file; wins over `message`
    #[serde(default)]
    pub message_template: Option<PathBuf>,
    /// Connect timeout in seconds, passed through to the implementation
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    /// Read timeout in seconds, passed through to the implementation
    #[serde(default = "default_read_timeout")]
    pub read_timeout: u64,
    /// Type-specific settings; values may contain templates
    #[serde(default)]
    pub extra: IndexMap<String, String>,
}

impl UnitConfig for AnnouncerConfig {
    fn unit_name(&self) -> &str {
        &self.name
    }

    fn unit_type(&self) -> &str {
        &self.type_key
    }

    fn unit_active(&self) -> bool {
        self.active
    }
}

/// A configured packager
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackagerConfig {
    /// Packager name (brew, scoop, ...)
    pub name: String,
    /// Whether the packager is active
    #[serde(default = "default_true")]
    pub active: bool,
    /// Directory holding the packager's template files
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
    /// Command run by the publish step
    #[serde(default)]
    pub publish_command: Option<String>,
    /// Packager-specific settings; values may contain templates
    #[serde(default)]
    pub extra: IndexMap<String, String>,
}

impl UnitConfig for PackagerConfig {
    fn unit_name(&self) -> &str {
        &self.name
    }

    fn unit_type(&self) -> &str {
        &self.name
    }

    fn unit_active(&self) -> bool {
        self.active
    }
}
