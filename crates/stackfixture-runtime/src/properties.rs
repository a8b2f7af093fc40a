//! Declared-property filtering shared by the handlers.

use std::collections::BTreeMap;

use serde_yaml::{Mapping, Value};
use stackfixture_common::error::{FixtureError, Result};
use stackfixture_common::types::ResourceKind;
use stackfixture_document::classifier::Properties;
use stackfixture_document::resolver;

/// Properties a backend understands for one resource kind.
#[derive(Debug, Clone, Copy)]
pub struct PropertySet {
    /// Kind the set applies to.
    pub kind: ResourceKind,
    /// Properties that must be present.
    pub required: &'static [&'static str],
    /// Properties forwarded when present.
    pub optional: &'static [&'static str],
}

impl PropertySet {
    /// Returns the recognized subset of `declared`.
    ///
    /// Unrecognized properties are dropped. A null value counts as absent.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::ResourceSetup`] if a required property is
    /// missing.
    pub fn recognized(&self, declared: &Properties) -> Result<Mapping> {
        for name in self.required {
            if matches!(declared.get(*name), None | Some(Value::Null)) {
                return Err(self.setup_error(format!("missing required property {name}")));
            }
        }
        let mut recognized = Mapping::new();
        for (key, value) in declared {
            let known = key
                .as_str()
                .is_some_and(|k| self.required.contains(&k) || self.optional.contains(&k));
            if known && !value.is_null() {
                let _ = recognized.insert(key.clone(), value.clone());
            } else if !known {
                tracing::trace!(kind = %self.kind, property = ?key, "dropping unrecognized property");
            }
        }
        Ok(recognized)
    }

    /// Builds a [`FixtureError::ResourceSetup`] for this kind.
    #[must_use]
    pub fn setup_error(&self, message: impl Into<String>) -> FixtureError {
        FixtureError::ResourceSetup {
            kind: self.kind.tag(),
            message: message.into(),
        }
    }
}

/// Sanitized identifier stored under `key`, if any.
///
/// Empty results count as absent.
#[must_use]
pub fn identifier(properties: &Mapping, key: &str) -> Option<String> {
    properties
        .get(key)
        .and_then(resolver::identifier_from)
        .filter(|name| !name.is_empty())
}

/// Wire-string form of a property: scalars as text, collections as JSON.
#[must_use]
pub fn wire_string(properties: &Mapping, key: &str) -> Option<String> {
    properties.get(key).and_then(resolver::canonical_string)
}

/// Reads a `Tags` list of `{Key, Value}` entries.
///
/// Entries missing either field are skipped.
#[must_use]
pub fn tags(properties: &Mapping) -> BTreeMap<String, String> {
    let Some(Value::Sequence(entries)) = properties.get("Tags") else {
        return BTreeMap::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let key = entry.get("Key").and_then(resolver::canonical_string)?;
            let value = entry.get("Value").and_then(resolver::canonical_string)?;
            Some((key, value))
        })
        .collect()
}

/// Every recognized property outside `skip`, as wire strings.
#[must_use]
pub fn attributes(properties: &Mapping, skip: &[&str]) -> BTreeMap<String, String> {
    properties
        .iter()
        .filter_map(|(key, value)| {
            let key = key.as_str().filter(|k| !skip.contains(k))?;
            Some((key.to_owned(), resolver::canonical_string(value)?))
        })
        .collect()
}
