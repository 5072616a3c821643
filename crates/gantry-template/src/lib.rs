//! Gantry Template - Guarded template rendering for release pipelines
//!
//! Templates use `{{variable}}` references resolved against an ordered
//! key/value context. Values that are themselves templates are expanded in
//! the same pass, and the iterative resolver caps expansion at a fixed
//! number of passes so self-referential templates fail instead of looping.

pub mod context;
pub mod engine;
pub mod error;

pub use context::{TemplateContext, TemplateValue};
pub use engine::{
    render, render_named, render_trimmed, resolve, resolve_named, INTERNAL_ENV_PREFIX,
    MAX_RESOLVE_PASSES, PASSTHROUGH_MARKER,
};
pub use error::{Result, TemplateError};
