//! Variable resolution over raw document text.
//!
//! Two token families are recognised:
//! - `${self:<path>}` is replaced by the value found at `<path>` in the
//!   document itself. Unknown paths leave the token in place.
//! - `${env:<NAME>}` and `${env:<NAME>, <default>}` are removed outright,
//!   default included. No live environment is consulted.
//!
//! Paths are dot-separated mapping keys. They are looked up structurally and
//! never evaluated.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_yaml::Value;
use stackfixture_common::constants::MAX_RESOLUTION_PASSES;
use stackfixture_common::error::{FixtureError, Result};

#[allow(clippy::expect_used)]
static SELF_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{self:([A-Za-z0-9_\-]+(?:\.[A-Za-z0-9_\-]+)*)\}")
        .expect("self token pattern is a valid literal")
});

#[allow(clippy::expect_used)]
static ENV_TOKEN_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{env:[A-Za-z0-9_.\-]+").expect("env token pattern is a valid literal")
});

/// Removes every env-reference token, including any default fragment.
///
/// A default may itself hold tokens such as `${self:...}`; braces are
/// matched so the whole default goes with the token. A token whose closing
/// brace is not found on the same line is left as text.
#[must_use]
pub fn strip_env(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(head) = ENV_TOKEN_HEAD.find(rest) {
        let tail = &rest[head.end()..];
        if let Some(len) = env_token_tail(tail) {
            stripped.push_str(&rest[..head.start()]);
            rest = &tail[len..];
        } else {
            stripped.push_str(&rest[..head.end()]);
            rest = tail;
        }
    }
    stripped.push_str(rest);
    stripped
}

/// Byte length of an env token after its name, up to and including the
/// closing brace.
fn env_token_tail(tail: &str) -> Option<usize> {
    let trimmed = tail.trim_start_matches([' ', '\t']);
    let offset = tail.len() - trimmed.len();
    if trimmed.starts_with('}') {
        return Some(offset + 1);
    }
    if !trimmed.starts_with(',') {
        return None;
    }
    let mut depth = 0_usize;
    for (index, c) in trimmed.char_indices().skip(1) {
        match c {
            '{' => depth += 1,
            '}' if depth == 0 => return Some(offset + index + 1),
            '}' => depth -= 1,
            '\n' => return None,
            _ => {}
        }
    }
    None
}

/// Resolves self-references until the text reaches a fixed point.
///
/// Each pass parses the current text, then replaces every token whose path
/// exists with the value's canonical string form. A value may itself contain
/// tokens; those are picked up by the next pass. Resolution stops when a
/// pass changes nothing or after [`MAX_RESOLUTION_PASSES`] passes.
///
/// # Errors
///
/// Returns [`FixtureError::MalformedDocument`] if the text contains tokens
/// but does not parse as a mapping.
pub fn resolve_self(text: &str) -> Result<String> {
    let mut current = text.to_owned();
    for pass in 0..MAX_RESOLUTION_PASSES {
        if !SELF_TOKEN.is_match(&current) {
            return Ok(current);
        }
        let document = parse_mapping(&current)?;
        let next = substitute_self(&current, &document);
        if next == current {
            return Ok(current);
        }
        tracing::trace!(pass, "self references substituted");
        current = next;
    }
    tracing::warn!(
        passes = MAX_RESOLUTION_PASSES,
        "self references did not settle; leaving remaining tokens as text"
    );
    Ok(current)
}

/// Performs one substitution pass of self-references against `document`.
///
/// Tokens whose path cannot be found are kept verbatim.
#[must_use]
pub fn substitute_self(text: &str, document: &Value) -> String {
    SELF_TOKEN
        .replace_all(text, |caps: &Captures<'_>| {
            lookup(document, &caps[1])
                .and_then(canonical_string)
                .unwrap_or_else(|| {
                    tracing::debug!(path = &caps[1], "unresolved self reference left in place");
                    caps[0].to_owned()
                })
        })
        .into_owned()
}

/// Steps through nested mappings along a dot-separated path.
#[must_use]
pub fn lookup<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(document, |node, segment| match node {
        Value::Mapping(mapping) => mapping.get(segment),
        _ => None,
    })
}

/// Renders a value the way it is substituted into text.
///
/// Scalars use their plain form (`null` for null). Sequences and mappings
/// become compact JSON, which is also a YAML flow collection. Returns `None`
/// for collections JSON cannot express, such as non-string mapping keys.
#[must_use]
pub fn canonical_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_owned()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => {
            serde_json::to_string(value).ok()
        }
    }
}

/// Strips every character outside `[A-Za-z0-9._-]`.
///
/// Applied to values used as resource names or exported as environment
/// variables when they may hold unevaluated expression residue.
#[must_use]
pub fn sanitize_identifier(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        .collect()
}

/// Canonical string form of `value`, sanitized unless it already is a string.
#[must_use]
pub fn identifier_from(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(sanitize_identifier(s)),
        other => canonical_string(other).map(|s| sanitize_identifier(&s)),
    }
}

/// Parses text as a YAML document whose root is a mapping.
///
/// # Errors
///
/// Returns [`FixtureError::MalformedDocument`] if the text is not valid YAML
/// or its root is not a mapping.
pub fn parse_mapping(text: &str) -> Result<Value> {
    let value: Value = serde_yaml::from_str(text).map_err(|e| FixtureError::MalformedDocument {
        message: e.to_string(),
    })?;
    match value {
        Value::Mapping(_) => Ok(value),
        Value::Null => Err(FixtureError::MalformedDocument {
            message: "document is empty".into(),
        }),
        _ => Err(FixtureError::MalformedDocument {
            message: "document root is not a mapping".into(),
        }),
    }
}
