//! Plugin contracts
//!
//! A factory is discovered by its type key and builds a unit from the
//! matching configuration block. Units expose one category-specific effect
//! method that fails with the category's own error type; the step drivers
//! wrap those into workflow failures.

use std::path::PathBuf;

use gantry_core::error::{
    AnnounceError, CatalogError, DeployError, DownloadError, ReleaseError, UploadError,
};
use gantry_core::model::{
    AnnouncerConfig, CatalogerConfig, DeployerConfig, DownloaderConfig, GithubConfig,
    UploaderConfig,
};
use gantry_core::{Context, Result, StepOutcome};

/// A configured announcer unit
pub trait Announcer: Send + Sync {
    /// Configured unit name
    fn name(&self) -> &str;

    /// Registry type key
    fn type_key(&self) -> &'static str;

    /// Whether the unit is active
    fn is_enabled(&self) -> bool;

    /// Publish the announcement
    fn announce(&self, ctx: &Context) -> std::result::Result<(), AnnounceError>;
}

/// Factory building announcer units
pub trait AnnouncerFactory: Send + Sync {
    /// Registry type key
    fn type_key(&self) -> &'static str;

    /// Build a unit from its configuration
    fn build(&self, config: &AnnouncerConfig) -> Result<Box<dyn Announcer>>;
}

/// A configured uploader unit
pub trait Uploader: Send + Sync {
    /// Configured unit name
    fn name(&self) -> &str;

    /// Registry type key
    fn type_key(&self) -> &'static str;

    /// Whether the unit is active
    fn is_enabled(&self) -> bool;

    /// Upload the given files; returns whether anything was transferred
    fn upload(&self, ctx: &Context, files: &[PathBuf]) -> std::result::Result<bool, UploadError>;
}

/// Factory building uploader units
pub trait UploaderFactory: Send + Sync + std::fmt::Debug {
    /// Registry type key
    fn type_key(&self) -> &'static str;

    /// Build a unit from its configuration
    fn build(&self, config: &UploaderConfig) -> Result<Box<dyn Uploader>>;
}

/// A configured downloader unit
pub trait Downloader: Send + Sync {
    /// Configured unit name
    fn name(&self) -> &str;

    /// Registry type key
    fn type_key(&self) -> &'static str;

    /// Whether the unit is active
    fn is_enabled(&self) -> bool;

    /// Fetch the unit's configured assets
    fn download(&self, ctx: &Context) -> std::result::Result<(), DownloadError>;
}

/// Factory building downloader units
pub trait DownloaderFactory: Send + Sync {
    /// Registry type key
    fn type_key(&self) -> &'static str;

    /// Build a unit from its configuration
    fn build(&self, config: &DownloaderConfig) -> Result<Box<dyn Downloader>>;
}

/// A configured deployer unit
pub trait Deployer: Send + Sync {
    /// Configured unit name
    fn name(&self) -> &str;

    /// Registry type key
    fn type_key(&self) -> &'static str;

    /// Whether the unit is active
    fn is_enabled(&self) -> bool;

    /// Deploy staged artifacts
    fn deploy(&self, ctx: &Context) -> std::result::Result<(), DeployError>;
}

/// Factory building deployer units
pub trait DeployerFactory: Send + Sync {
    /// Registry type key
    fn type_key(&self) -> &'static str;

    /// Build a unit from its configuration
    fn build(&self, config: &DeployerConfig) -> Result<Box<dyn Deployer>>;
}

/// A configured releaser unit
pub trait Releaser: Send + Sync {
    /// Registry type key
    fn type_key(&self) -> &'static str;

    /// Whether the unit is active
    fn is_enabled(&self) -> bool;

    /// Create the release, attaching the given assets
    fn release(&self, ctx: &Context, assets: &[PathBuf]) -> std::result::Result<(), ReleaseError>;
}

/// Factory building releaser units
pub trait ReleaserFactory: Send + Sync {
    /// Registry type key
    fn type_key(&self) -> &'static str;

    /// Build a unit from its configuration
    fn build(&self, config: &GithubConfig) -> Result<Box<dyn Releaser>>;
}

/// A configured SBOM cataloger unit
pub trait Cataloger: Send + Sync {
    /// Configured unit name
    fn name(&self) -> &str;

    /// Registry type key
    fn type_key(&self) -> &'static str;

    /// Whether the unit is active
    fn is_enabled(&self) -> bool;

    /// Catalog the given files
    fn catalog(
        &self,
        ctx: &Context,
        files: &[PathBuf],
    ) -> std::result::Result<StepOutcome, CatalogError>;
}

/// Factory building cataloger units
pub trait CatalogerFactory: Send + Sync {
    /// Registry type key
    fn type_key(&self) -> &'static str;

    /// Build a unit from its configuration
    fn build(&self, config: &CatalogerConfig) -> Result<Box<dyn Cataloger>>;
}
