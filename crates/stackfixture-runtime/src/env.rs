//! Exports `provider.environment` bindings to the process environment.

use stackfixture_document::document::{ConfigDocument, EnvironmentBinding};

/// Sets every binding that forms a valid variable and returns what was set.
///
/// Keys that are empty or contain `=` or NUL, and values containing NUL,
/// are skipped with a warning.
pub fn apply_environment(document: &ConfigDocument) -> Vec<(String, String)> {
    document
        .provider_environment()
        .iter()
        .filter_map(apply_binding)
        .collect()
}

#[allow(unsafe_code)]
fn apply_binding(binding: &EnvironmentBinding) -> Option<(String, String)> {
    let value = binding.rendered_value();
    if binding.key.is_empty() || binding.key.contains(['=', '\0']) || value.contains('\0') {
        tracing::warn!(key = %binding.key, "environment binding cannot be exported, skipping");
        return None;
    }
    // SAFETY: fixtures run single-threaded; no other thread reads or writes
    // the environment while bindings are applied.
    unsafe { std::env::set_var(&binding.key, &value) };
    tracing::debug!(key = %binding.key, "environment variable set");
    Some((binding.key.clone(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn bindings_are_exported() {
        let doc = ConfigDocument::from_text(
            "\
service: envsvc
provider:
  environment:
    STACKFIXTURE_TEST_SERVICE: ${self:service}
    STACKFIXTURE_TEST_PORT: 8080
    STACKFIXTURE_TEST_EMPTY:
    'BAD=KEY': x
",
        )
        .unwrap();
        let applied = apply_environment(&doc);
        assert_eq!(applied.len(), 3);
        assert_eq!(std::env::var("STACKFIXTURE_TEST_SERVICE").unwrap(), "envsvc");
        assert_eq!(std::env::var("STACKFIXTURE_TEST_PORT").unwrap(), "8080");
        assert_eq!(std::env::var("STACKFIXTURE_TEST_EMPTY").unwrap(), "");
    }
}
