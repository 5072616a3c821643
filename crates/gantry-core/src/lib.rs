//! Gantry Core - Core library for the Gantry release pipeline
//!
//! This crate provides the error taxonomy, the declarative project model,
//! multi-format configuration loading, and the per-run context shared by
//! every workflow step.

pub mod config;
pub mod context;
pub mod error;
pub mod files;
pub mod model;
pub mod types;

pub use config::{find_config, load_model, load_model_from_dir, ConfigParser, ParserRegistry};
pub use context::{Changelog, Context, Filters, UnitFilter};
pub use error::{GantryError, Result};
pub use model::{Model, UnitConfig};
pub use types::{Command, StepOutcome};
