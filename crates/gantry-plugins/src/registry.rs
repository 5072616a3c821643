//! Plugin registry
//!
//! An explicit registration table: one factory list per category, scanned
//! per lookup so test doubles can be substituted cheaply. A missing type
//! key is a configuration error, never a silent no-op.

use std::sync::Arc;

use tracing::debug;

use gantry_core::error::PluginError;
use gantry_core::Result;

use crate::builtin::announce::{CommandAnnouncerFactory, LogAnnouncerFactory};
use crate::builtin::deploy::CommandDeployerFactory;
use crate::builtin::directory::{DirectoryDownloaderFactory, DirectoryUploaderFactory};
use crate::builtin::github::GithubReleaserFactory;
use crate::builtin::syft::SyftCatalogerFactory;
use crate::traits::{
    AnnouncerFactory, CatalogerFactory, DeployerFactory, DownloaderFactory, ReleaserFactory,
    UploaderFactory,
};

/// Plugin capability categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginCategory {
    /// Release announcers
    Announcer,
    /// Artifact uploaders
    Uploader,
    /// Asset downloaders
    Downloader,
    /// Artifact deployers
    Deployer,
    /// Release creators
    Releaser,
    /// SBOM catalogers
    Cataloger,
}

impl PluginCategory {
    /// Get the category as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Announcer => "announcer",
            Self::Uploader => "uploader",
            Self::Downloader => "downloader",
            Self::Deployer => "deployer",
            Self::Releaser => "releaser",
            Self::Cataloger => "cataloger",
        }
    }
}

impl std::fmt::Display for PluginCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn unsupported(category: PluginCategory, type_key: &str) -> PluginError {
    PluginError::Unsupported {
        category: category.as_str().to_string(),
        type_key: type_key.to_string(),
    }
}

/// Registry of plugin factories, keyed by category and type key
pub struct PluginRegistry {
    announcers: Vec<Arc<dyn AnnouncerFactory>>,
    uploaders: Vec<Arc<dyn UploaderFactory>>,
    downloaders: Vec<Arc<dyn DownloaderFactory>>,
    deployers: Vec<Arc<dyn DeployerFactory>>,
    releasers: Vec<Arc<dyn ReleaserFactory>>,
    catalogers: Vec<Arc<dyn CatalogerFactory>>,
}

impl PluginRegistry {
    /// Create a registry with all built-in factories
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_announcer(Arc::new(LogAnnouncerFactory));
        registry.register_announcer(Arc::new(CommandAnnouncerFactory));
        registry.register_uploader(Arc::new(DirectoryUploaderFactory));
        registry.register_downloader(Arc::new(DirectoryDownloaderFactory));
        registry.register_deployer(Arc::new(CommandDeployerFactory));
        registry.register_releaser(Arc::new(GithubReleaserFactory));
        registry.register_cataloger(Arc::new(SyftCatalogerFactory));
        registry
    }

    /// Create an empty registry
    pub fn empty() -> Self {
        Self {
            announcers: Vec::new(),
            uploaders: Vec::new(),
            downloaders: Vec::new(),
            deployers: Vec::new(),
            releasers: Vec::new(),
            catalogers: Vec::new(),
        }
    }

    /// Register an announcer factory; a factory with the same type key is
    /// replaced, keeping type keys unique per category
    pub fn register_announcer(&mut self, factory: Arc<dyn AnnouncerFactory>) {
        self.announcers.retain(|f| f.type_key() != factory.type_key());
        self.announcers.push(factory);
    }

    /// Register an uploader factory
    pub fn register_uploader(&mut self, factory: Arc<dyn UploaderFactory>) {
        self.uploaders.retain(|f| f.type_key() != factory.type_key());
        self.uploaders.push(factory);
    }

    /// Register a downloader factory
    pub fn register_downloader(&mut self, factory: Arc<dyn DownloaderFactory>) {
        self.downloaders.retain(|f| f.type_key() != factory.type_key());
        self.downloaders.push(factory);
    }

    /// Register a deployer factory
    pub fn register_deployer(&mut self, factory: Arc<dyn DeployerFactory>) {
        self.deployers.retain(|f| f.type_key() != factory.type_key());
        self.deployers.push(factory);
    }

    /// Register a releaser factory
    pub fn register_releaser(&mut self, factory: Arc<dyn ReleaserFactory>) {
        self.releasers.retain(|f| f.type_key() != factory.type_key());
        self.releasers.push(factory);
    }

    /// Register a cataloger factory
    pub fn register_cataloger(&mut self, factory: Arc<dyn CatalogerFactory>) {
        self.catalogers.retain(|f| f.type_key() != factory.type_key());
        self.catalogers.push(factory);
    }

    /// Find an announcer factory by type key
    pub fn find_announcer(&self, type_key: &str) -> Result<Arc<dyn AnnouncerFactory>> {
        let result = self
            .announcers
            .iter()
            .find(|f| f.type_key() == type_key)
            .cloned();
        debug!(category = "announcer", type_key, found = result.is_some(), "plugin lookup");
        result.ok_or_else(|| unsupported(PluginCategory::Announcer, type_key).into())
    }

    /// Find an uploader factory by type key
    pub fn find_uploader(&self, type_key: &str) -> Result<Arc<dyn UploaderFactory>> {
        let result = self
            .uploaders
            .iter()
            .find(|f| f.type_key() == type_key)
            .cloned();
        debug!(category = "uploader", type_key, found = result.is_some(), "plugin lookup");
        result.ok_or_else(|| unsupported(PluginCategory::Uploader, type_key).into())
    }

    /// Find a downloader factory by type key
    pub fn find_downloader(&self, type_key: &str) -> Result<Arc<dyn DownloaderFactory>> {
        let result = self
            .downloaders
            .iter()
            .find(|f| f.type_key() == type_key)
            .cloned();
        debug!(category = "downloader", type_key, found = result.is_some(), "plugin lookup");
        result.ok_or_else(|| unsupported(PluginCategory::Downloader, type_key).into())
    }

    /// Find a deployer factory by type key
    pub fn find_deployer(&self, type_key: &str) -> Result<Arc<dyn DeployerFactory>> {
        let result = self
            .deployers
            .iter()
            .find(|f| f.type_key() == type_key)
            .cloned();
        debug!(category = "deployer", type_key, found = result.is_some(), "plugin lookup");
        result.ok_or_else(|| unsupported(PluginCategory::Deployer, type_key).into())
    }

    /// Find a releaser factory by type key
    pub fn find_releaser(&self, type_key: &str) -> Result<Arc<dyn ReleaserFactory>> {
        let result = self
            .releasers
            .iter()
            .find(|f| f.type_key() == type_key)
            .cloned();
        debug!(category = "releaser", type_key, found = result.is_some(), "plugin lookup");
        result.ok_or_else(|| unsupported(PluginCategory::Releaser, type_key).into())
    }

    /// Find a cataloger factory by type key
    pub fn find_cataloger(&self, type_key: &str) -> Result<Arc<dyn CatalogerFactory>> {
        let result = self
            .catalogers
            .iter()
            .find(|f| f.type_key() == type_key)
            .cloned();
        debug!(category = "cataloger", type_key, found = result.is_some(), "plugin lookup");
        result.ok_or_else(|| unsupported(PluginCategory::Cataloger, type_key).into())
    }

    /// Registered announcer type keys
    pub fn announcer_types(&self) -> Vec<&'static str> {
        self.announcers.iter().map(|f| f.type_key()).collect()
    }

    /// Registered uploader type keys
    pub fn uploader_types(&self) -> Vec<&'static str> {
        self.uploaders.iter().map(|f| f.type_key()).collect()
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gantry_core::error::GantryError;

    #[test]
    fn test_default_registry_has_builtins() {
        let registry = PluginRegistry::new();

        assert!(registry.find_announcer("log").is_ok());
        assert!(registry.find_announcer("command").is_ok());
        assert!(registry.find_uploader("directory").is_ok());
        assert!(registry.find_downloader("directory").is_ok());
        assert!(registry.find_deployer("command").is_ok());
        assert!(registry.find_releaser("github").is_ok());
        assert!(registry.find_cataloger("syft").is_ok());
    }

    #[test]
    fn test_unknown_type_key_is_unsupported() {
        let registry = PluginRegistry::empty();

        let err = registry.find_uploader("s3").unwrap_err();
        match err {
            GantryError::Plugin(PluginError::Unsupported { category, type_key }) => {
                assert_eq!(category, "uploader");
                assert_eq!(type_key, "s3");
            }
            other => panic!("expected Unsupported, got {other:?}"),
        }
    }

    #[test]
    fn test_register_replaces_same_type_key() {
        let mut registry = PluginRegistry::new();
        let before = registry.announcer_types().len();

        registry.register_announcer(Arc::new(LogAnnouncerFactory));
        assert_eq!(registry.announcer_types().len(), before);
    }

    #[test]
    fn test_empty_registry_has_no_types() {
        let registry = PluginRegistry::empty();
        assert!(registry.announcer_types().is_empty());
        assert!(registry.uploader_types().is_empty());
    }
}
