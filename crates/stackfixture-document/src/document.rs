//! The parsed, resolved declarative document.

use serde_yaml::{Mapping, Value};
use stackfixture_common::error::Result;

use crate::resolver;

/// A declarative document after env stripping and self resolution.
///
/// Immutable once built; a session owns exactly one.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    raw: String,
    resolved: String,
    root: Value,
}

/// One `provider.environment` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentBinding {
    /// Variable name.
    pub key: String,
    /// Declared value after resolution.
    pub value: Value,
}

impl EnvironmentBinding {
    /// The string exported to the process environment.
    ///
    /// Strings are kept as-is, other scalars use their canonical form, null
    /// becomes empty, and collections are sanitized down to identifier
    /// characters.
    #[must_use]
    pub fn rendered_value(&self) -> String {
        match &self.value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            Value::Number(_) | Value::Bool(_) => {
                resolver::canonical_string(&self.value).unwrap_or_default()
            }
            other => resolver::identifier_from(other).unwrap_or_default(),
        }
    }
}

impl ConfigDocument {
    /// Builds a document from raw text: strips env-references, resolves
    /// self-references, then parses the result.
    ///
    /// # Errors
    ///
    /// Returns [`stackfixture_common::error::FixtureError::MalformedDocument`]
    /// if the text is not a YAML mapping.
    pub fn from_text(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let stripped = resolver::strip_env(&raw);
        let resolved = resolver::resolve_self(&stripped)?;
        let root = resolver::parse_mapping(&resolved)?;
        Ok(Self {
            raw,
            resolved,
            root,
        })
    }

    /// The text as it was read.
    #[must_use]
    pub fn raw_text(&self) -> &str {
        &self.raw
    }

    /// The text after variable resolution.
    #[must_use]
    pub fn resolved_text(&self) -> &str {
        &self.resolved
    }

    /// The parsed root mapping as a value.
    #[must_use]
    pub const fn root(&self) -> &Value {
        &self.root
    }

    /// Looks up a dot-separated path.
    #[must_use]
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        resolver::lookup(&self.root, path)
    }

    /// Service identifier, either `service: name` or `service: { name: ... }`.
    #[must_use]
    pub fn service(&self) -> Option<&str> {
        self.lookup("service")
            .and_then(Value::as_str)
            .or_else(|| self.lookup("service.name").and_then(Value::as_str))
    }

    /// `provider.region`, if declared as a string.
    #[must_use]
    pub fn provider_region(&self) -> Option<&str> {
        self.lookup("provider.region").and_then(Value::as_str)
    }

    /// Entries of `provider.environment` in declaration order.
    ///
    /// Non-string keys are skipped.
    #[must_use]
    pub fn provider_environment(&self) -> Vec<EnvironmentBinding> {
        let Some(mapping) = self.lookup("provider.environment").and_then(Value::as_mapping) else {
            return Vec::new();
        };
        mapping
            .iter()
            .filter_map(|(key, value)| match key.as_str() {
                Some(key) => Some(EnvironmentBinding {
                    key: key.to_owned(),
                    value: value.clone(),
                }),
                None => {
                    tracing::warn!(?key, "skipping environment entry with non-string key");
                    None
                }
            })
            .collect()
    }

    /// The `resources.Resources` block.
    #[must_use]
    pub fn resources(&self) -> Option<&Mapping> {
        self.lookup("resources.Resources").and_then(Value::as_mapping)
    }
}
