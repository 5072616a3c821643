//! Exit codes for the CLI

#![allow(dead_code)]

use gantry_core::GantryError;

/// Success
pub const SUCCESS: i32 = 0;

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Template error
pub const TEMPLATE_ERROR: i32 = 3;

/// Plugin lookup error
pub const PLUGIN_ERROR: i32 = 4;

/// Workflow step error
pub const WORKFLOW_ERROR: i32 = 5;

/// Map an error to its exit code
pub fn for_error(error: &GantryError) -> i32 {
    match error {
        GantryError::Config(_) => CONFIG_ERROR,
        GantryError::Template(_) => TEMPLATE_ERROR,
        GantryError::Plugin(_) => PLUGIN_ERROR,
        GantryError::Workflow(_) => WORKFLOW_ERROR,
        _ => ERROR,
    }
}
