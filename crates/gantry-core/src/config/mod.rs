//! Configuration loading
//!
//! Model files are parsed through the config-parser contract so every
//! supported format goes through the same narrow interface. Parsers are
//! held in an explicit registration table and matched per lookup.

mod loader;
mod parsers;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::model::Model;

pub use loader::{find_config, load_model, load_model_from_dir};
pub use parsers::{JsonParser, TomlParser, YamlParser};

/// Contract every configuration format parser implements
pub trait ConfigParser: Send + Sync {
    /// Format name (toml, yaml, json)
    fn format(&self) -> &'static str;

    /// Whether this parser handles the given file
    fn supports(&self, path: &Path) -> bool;

    /// Parse a full model from the stream
    fn parse(&self, reader: &mut dyn Read) -> Result<Model>;

    /// Extract a flat key/value view of the stream, dotted at nesting
    /// boundaries
    fn properties(&self, reader: &mut dyn Read) -> Result<IndexMap<String, String>>;

    /// Syntax check only; does not deserialize into the model
    fn validate(&self, path: &Path) -> Result<()>;
}

/// Registry of configuration parsers
pub struct ParserRegistry {
    parsers: Vec<Arc<dyn ConfigParser>>,
}

impl ParserRegistry {
    /// Create a registry with all built-in parsers
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Arc::new(TomlParser),
                Arc::new(YamlParser),
                Arc::new(JsonParser),
            ],
        }
    }

    /// Create an empty registry
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Register a parser
    pub fn register<P: ConfigParser + 'static>(&mut self, parser: P) {
        self.parsers.push(Arc::new(parser));
    }

    /// Find the parser supporting a path.
    ///
    /// The table is scanned per call; no match is a configuration error.
    pub fn find_for(&self, path: &Path) -> Result<Arc<dyn ConfigParser>> {
        let result = self.parsers.iter().find(|p| p.supports(path)).cloned();
        debug!(
            path = %path.display(),
            found = result.is_some(),
            "config parser lookup"
        );
        result.ok_or_else(|| ConfigError::UnsupportedFormat(path.to_path_buf()).into())
    }

    /// Registered format names
    pub fn formats(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|p| p.format()).collect()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}
