//! Error types for template rendering

use thiserror::Error;

/// Result type alias using TemplateError
pub type Result<T> = std::result::Result<T, TemplateError>;

/// Errors raised by the template engine
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Malformed template syntax
    #[error("Malformed template '{name}': {message}")]
    Syntax { name: String, message: String },

    /// Template did not stabilize within the resolution pass limit
    #[error("Template still unresolved after {passes} passes: {value}")]
    Unresolvable { passes: usize, value: String },

    /// Failure while writing rendered output
    #[error("Failed to render template: {0}")]
    Render(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
