//! Gantry Plugins - Pluggable units and their registry
//!
//! Every capability category (announcer, uploader, downloader, deployer,
//! releaser, cataloger) is a pair of traits: a factory advertising a type
//! key and a unit performing one external effect. The registry is an
//! explicit registration table mapping type keys to factories.

pub mod builtin;
pub mod registry;
pub mod traits;

pub use registry::{PluginCategory, PluginRegistry};
pub use traits::{
    Announcer, AnnouncerFactory, Cataloger, CatalogerFactory, Deployer, DeployerFactory,
    Downloader, DownloaderFactory, Releaser, ReleaserFactory, Uploader, UploaderFactory,
};
