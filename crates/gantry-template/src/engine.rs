//! Template rendering and iterative resolution
//!
//! A single render pass substitutes `{{variable}}` references against the
//! context. Values that themselves contain the opening delimiter are
//! expanded with one nested flat pass, so ordinary nested templates resolve
//! within a single render; anything deeper surfaces to [`resolve`], which
//! re-renders until the result stabilizes or the pass cap is hit.

use indexmap::IndexMap;
use tracing::warn;

use crate::context::{TemplateContext, TemplateValue};
use crate::error::{Result, TemplateError};

const OPEN_DELIMITER: &str = "{{";
const CLOSE_DELIMITER: &str = "}}";

/// Sentinel wrapping values that are already rendered; stripped on output.
pub const PASSTHROUGH_MARKER: &str = "!!";

/// Hard cap on iterative resolution passes.
pub const MAX_RESOLVE_PASSES: usize = 10;

/// Environment variables with this prefix are never exported to templates.
pub const INTERNAL_ENV_PREFIX: &str = "GANTRY_";

const ENV_NAMESPACE: &str = "Env";

/// Render a template with a single pass.
///
/// Unresolvable variables are logged as warnings and substitute to the
/// empty string; rendering never fails because of a missing key.
pub fn render(template: &str, context: &TemplateContext) -> Result<String> {
    render_named(template, context, "inline")
}

/// Render a template with a single pass, naming the template in diagnostics
pub fn render_named(template: &str, context: &TemplateContext, name: &str) -> Result<String> {
    let merged = with_env(context);
    render_pass(template, &merged, name, true)
}

/// Single-shot convenience wrapper that trims surrounding whitespace from
/// the rendered result
pub fn render_trimmed(template: &str, context: &TemplateContext) -> Result<String> {
    Ok(render(template, context)?.trim().to_string())
}

/// Repeatedly render until the result no longer contains the opening
/// delimiter, up to [`MAX_RESOLVE_PASSES`] passes.
pub fn resolve(input: &str, context: &TemplateContext) -> Result<String> {
    resolve_named(input, context, "inline")
}

/// Iterative resolution, naming the template in diagnostics
pub fn resolve_named(input: &str, context: &TemplateContext, name: &str) -> Result<String> {
    let merged = with_env(context);

    let mut value = input.to_string();
    for _ in 0..MAX_RESOLVE_PASSES {
        if !value.contains(OPEN_DELIMITER) {
            return Ok(value);
        }
        value = render_pass(&value, &merged, name, true)?;
    }

    if value.contains(OPEN_DELIMITER) {
        Err(TemplateError::Unresolvable {
            passes: MAX_RESOLVE_PASSES,
            value,
        })
    } else {
        Ok(value)
    }
}

/// Merge the process environment into a copy of the context under the
/// `Env.` namespace. Keys already set by the caller are kept.
fn with_env(context: &TemplateContext) -> TemplateContext {
    let mut merged = context.clone();

    let mut env_map = match merged.get(ENV_NAMESPACE) {
        Some(TemplateValue::Map(map)) => map.clone(),
        _ => IndexMap::new(),
    };

    let mut vars: Vec<(String, String)> = std::env::vars().collect();
    vars.sort();
    for (key, value) in vars {
        if key.starts_with(INTERNAL_ENV_PREFIX) {
            continue;
        }
        env_map.entry(key).or_insert(TemplateValue::Text(value));
    }

    merged.set_value(ENV_NAMESPACE, TemplateValue::Map(env_map));
    merged
}

fn render_pass(
    template: &str,
    context: &TemplateContext,
    name: &str,
    expand_nested: bool,
) -> Result<String> {
    if template.is_empty() {
        return Ok(String::new());
    }
    if !template.contains(OPEN_DELIMITER) {
        return Ok(template.to_string());
    }

    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN_DELIMITER) {
        output.push_str(&rest[..start]);
        let after = &rest[start + OPEN_DELIMITER.len()..];

        let end = after
            .find(CLOSE_DELIMITER)
            .ok_or_else(|| TemplateError::Syntax {
                name: name.to_string(),
                message: format!(
                    "unterminated '{{{{' at offset {}",
                    template.len() - rest.len() + start
                ),
            })?;

        let key = after[..end].trim();
        if key.is_empty() {
            return Err(TemplateError::Syntax {
                name: name.to_string(),
                message: "empty variable reference".to_string(),
            });
        }

        match context.get(key) {
            Some(TemplateValue::Text(value)) => {
                if expand_nested && value.contains(OPEN_DELIMITER) {
                    // The value is itself a template: expand it in this pass.
                    let nested = render_pass(value, context, name, false)?;
                    output.push_str(&nested);
                } else if let Some(inner) = strip_passthrough(value) {
                    output.push_str(inner);
                } else {
                    push_escaped(&mut output, value);
                }
            }
            Some(TemplateValue::Passthrough(value)) => output.push_str(value),
            Some(TemplateValue::Map(_)) => {
                warn!(
                    template = name,
                    variable = key,
                    "template variable resolves to a namespace, substituting empty"
                );
            }
            None => {
                warn!(
                    template = name,
                    variable = key,
                    "unresolved template variable, substituting empty"
                );
            }
        }

        rest = &after[end + CLOSE_DELIMITER.len()..];
    }

    output.push_str(rest);
    Ok(output)
}

fn strip_passthrough(value: &str) -> Option<&str> {
    let marker = PASSTHROUGH_MARKER.len();
    if value.len() >= 2 * marker
        && value.starts_with(PASSTHROUGH_MARKER)
        && value.ends_with(PASSTHROUGH_MARKER)
    {
        Some(&value[marker..value.len() - marker])
    } else {
        None
    }
}

fn push_escaped(output: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#39;"),
            _ => output.push(c),
        }
    }
}
