//! Encryption-key handler. Keys are never deleted individually.

use serde_yaml::Value;
use stackfixture_common::error::Result;
use stackfixture_common::types::ResourceKind;
use stackfixture_document::classifier::Properties;
use stackfixture_mock::MockCloud;
use stackfixture_mock::kms::{CreateKeyInput, Kms};

use super::ResourceHandler;
use crate::properties::{self, PropertySet};

const PROPERTIES: PropertySet = PropertySet {
    kind: ResourceKind::EncryptionKey,
    required: &[],
    optional: &["Description", "KeyUsage", "KeySpec", "KeyPolicy", "Enabled", "Tags"],
};

/// Creates declared keys; teardown only deactivates the service.
#[derive(Debug)]
pub struct KeyHandler {
    kms: Kms,
    definitions: Vec<Properties>,
}

impl KeyHandler {
    /// Registry factory.
    pub fn boxed(definitions: Vec<Properties>, cloud: &MockCloud) -> Box<dyn ResourceHandler> {
        Box::new(Self {
            kms: cloud.kms().clone(),
            definitions,
        })
    }
}

fn create_key_input(declared: &Properties) -> Result<CreateKeyInput> {
    let recognized = PROPERTIES.recognized(declared)?;
    let defaults = CreateKeyInput::default();
    Ok(CreateKeyInput {
        description: properties::wire_string(&recognized, "Description"),
        key_usage: properties::wire_string(&recognized, "KeyUsage").unwrap_or(defaults.key_usage),
        key_spec: properties::wire_string(&recognized, "KeySpec").unwrap_or(defaults.key_spec),
        policy: properties::wire_string(&recognized, "KeyPolicy"),
        enabled: recognized
            .get("Enabled")
            .and_then(Value::as_bool)
            .unwrap_or(defaults.enabled),
        tags: properties::tags(&recognized),
    })
}

impl ResourceHandler for KeyHandler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::EncryptionKey
    }

    fn setup(&mut self) -> Result<()> {
        let _ = self.kms.activate();
        for declared in &self.definitions {
            let metadata = self.kms.create_key(create_key_input(declared)?)?;
            tracing::debug!(key_id = %metadata.key_id, "key created");
        }
        Ok(())
    }

    fn teardown(&mut self) -> Result<()> {
        self.kms.deactivate();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(yaml: &str) -> Properties {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn policy_mapping_is_forwarded_as_json() {
        let input = create_key_input(&definition(
            "\
Description: data key
KeyPolicy:
  Version: '2012-10-17'
  Statement: []
PendingWindowInDays: 7
",
        ))
        .unwrap();
        assert_eq!(input.description.as_deref(), Some("data key"));
        assert_eq!(
            input.policy.as_deref(),
            Some("{\"Version\":\"2012-10-17\",\"Statement\":[]}")
        );
        assert_eq!(input.key_usage, "ENCRYPT_DECRYPT");
        assert!(input.enabled);
    }

    #[test]
    fn keys_disappear_on_deactivation() {
        let cloud = MockCloud::default();
        let mut handler = KeyHandler::boxed(
            vec![definition("Enabled: false\n"), Properties::new()],
            &cloud,
        );
        handler.setup().unwrap();
        let kms = cloud.kms();
        let keys = kms.list_keys().unwrap();
        assert_eq!(keys.len(), 2);
        handler.teardown().unwrap();
        let _ = kms.activate();
        assert!(kms.describe_key(&keys[0]).unwrap_err().is_not_found());
    }
}
