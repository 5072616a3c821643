//! Template context: the ordered variable bag handed to the engine

use indexmap::IndexMap;

/// A value stored in a [`TemplateContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateValue {
    /// Plain text; special characters are escaped when substituted.
    Text(String),
    /// Already-rendered text; written to output verbatim.
    Passthrough(String),
    /// Nested namespace, addressed with dotted keys (e.g. `Env.HOME`).
    Map(IndexMap<String, TemplateValue>),
}

impl TemplateValue {
    /// Get the textual content of this value, if it has one
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Passthrough(s) => Some(s),
            Self::Map(_) => None,
        }
    }
}

impl From<&str> for TemplateValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TemplateValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Ordered map of template variables.
///
/// Insertion order is preserved so repeated renders of the same context are
/// deterministic. Setting an existing key overwrites its value in place;
/// keys are never duplicated.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    values: IndexMap<String, TemplateValue>,
}

impl TemplateContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a plain text variable
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .insert(key.into(), TemplateValue::Text(value.into()));
    }

    /// Set a variable whose content is already rendered and must not be
    /// escaped again
    pub fn set_passthrough(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values
            .insert(key.into(), TemplateValue::Passthrough(value.into()));
    }

    /// Set any value variant
    pub fn set_value(&mut self, key: impl Into<String>, value: TemplateValue) {
        self.values.insert(key.into(), value);
    }

    /// Look up a variable.
    ///
    /// An exact key match wins; otherwise the key is split on `.` and
    /// traversed through nested [`TemplateValue::Map`] values.
    pub fn get(&self, key: &str) -> Option<&TemplateValue> {
        if let Some(value) = self.values.get(key) {
            return Some(value);
        }

        let mut parts = key.split('.');
        let first = parts.next()?;
        let mut current = self.values.get(first)?;
        for part in parts {
            match current {
                TemplateValue::Map(map) => current = map.get(part)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Check whether a key resolves to a value
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterate keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    /// Number of top-level variables
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the context has no variables
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy all variables from `other` into this context, overwriting
    /// keys that collide
    pub fn merge(&mut self, other: &TemplateContext) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }
}
