//! Encryption key mock (`kms`). Keys are never deleted individually; they
//! disappear when the service is deactivated.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use stackfixture_common::constants::MOCK_ACCOUNT_ID;
use stackfixture_common::error::BackendError;
use uuid::Uuid;

use crate::service::Service;

const SERVICE: &str = "kms";

/// Parameters of `CreateKey`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateKeyInput {
    /// Free-form description.
    pub description: Option<String>,
    /// `ENCRYPT_DECRYPT`, `SIGN_VERIFY`, or `GENERATE_VERIFY_MAC`.
    pub key_usage: String,
    /// Key material spec, e.g. `SYMMETRIC_DEFAULT`.
    pub key_spec: String,
    /// Key policy document as JSON text.
    pub policy: Option<String>,
    /// Whether the key starts enabled.
    pub enabled: bool,
    /// Resource tags.
    pub tags: BTreeMap<String, String>,
}

impl Default for CreateKeyInput {
    fn default() -> Self {
        Self {
            description: None,
            key_usage: "ENCRYPT_DECRYPT".into(),
            key_spec: "SYMMETRIC_DEFAULT".into(),
            policy: None,
            enabled: true,
            tags: BTreeMap::new(),
        }
    }
}

/// Result of `DescribeKey`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMetadata {
    /// Key id (UUID).
    pub key_id: String,
    /// Key ARN.
    pub arn: String,
    /// Description given at creation.
    pub description: Option<String>,
    /// Key usage.
    pub key_usage: String,
    /// Key spec.
    pub key_spec: String,
    /// Whether the key is enabled.
    pub enabled: bool,
    /// Creation time.
    pub creation_date: DateTime<Utc>,
}

const KEY_USAGES: &[&str] = &["ENCRYPT_DECRYPT", "SIGN_VERIFY", "GENERATE_VERIFY_MAC"];

/// Mocked key management service.
#[derive(Debug, Clone)]
pub struct Kms {
    service: Service<BTreeMap<String, KeyMetadata>>,
    region: String,
}

impl Kms {
    pub(crate) fn new(region: &str) -> Self {
        Self {
            service: Service::new(SERVICE),
            region: region.to_owned(),
        }
    }

    /// Activates the service. Returns `false` if it was already active.
    pub fn activate(&self) -> bool {
        self.service.start()
    }

    /// Deactivates the service, discarding every key.
    pub fn deactivate(&self) {
        self.service.stop();
    }

    /// Returns whether the service is active.
    pub fn is_active(&self) -> bool {
        self.service.is_active()
    }

    /// Creates a key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key usage is unknown or the policy is not
    /// valid JSON.
    pub fn create_key(&self, input: CreateKeyInput) -> Result<KeyMetadata, BackendError> {
        if !KEY_USAGES.contains(&input.key_usage.as_str()) {
            return Err(BackendError::Validation {
                service: SERVICE,
                message: format!("unknown KeyUsage {}", input.key_usage),
            });
        }
        if let Some(policy) = &input.policy {
            let _: serde_json::Value =
                serde_json::from_str(policy).map_err(|e| BackendError::Validation {
                    service: SERVICE,
                    message: format!("malformed key policy: {e}"),
                })?;
        }
        let key_id = Uuid::new_v4().to_string();
        let metadata = KeyMetadata {
            arn: format!("arn:aws:kms:{}:{MOCK_ACCOUNT_ID}:key/{key_id}", self.region),
            key_id,
            description: input.description,
            key_usage: input.key_usage,
            key_spec: input.key_spec,
            enabled: input.enabled,
            creation_date: Utc::now(),
        };
        self.service.with(|keys| {
            let _ = keys.insert(metadata.key_id.clone(), metadata.clone());
            Ok(metadata)
        })
    }

    /// Lists key ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is inactive.
    pub fn list_keys(&self) -> Result<Vec<String>, BackendError> {
        self.service.with(|keys| Ok(keys.keys().cloned().collect()))
    }

    /// Describes a key by id.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the id names no key.
    pub fn describe_key(&self, key_id: &str) -> Result<KeyMetadata, BackendError> {
        self.service.with(|keys| {
            keys.get(key_id).cloned().ok_or_else(|| BackendError::NotFound {
                service: SERVICE,
                kind: "key",
                id: key_id.to_owned(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active() -> Kms {
        let kms = Kms::new("us-east-1");
        let _ = kms.activate();
        kms
    }

    #[test]
    fn created_key_is_listed_and_described() {
        let kms = active();
        let created = kms.create_key(CreateKeyInput::default()).unwrap();
        assert_eq!(kms.list_keys().unwrap(), vec![created.key_id.clone()]);
        let described = kms.describe_key(&created.key_id).unwrap();
        assert!(described.arn.ends_with(&created.key_id));
        assert!(described.enabled);
    }

    #[test]
    fn unknown_usage_is_rejected() {
        let kms = active();
        let input = CreateKeyInput {
            key_usage: "DERIVE".into(),
            ..CreateKeyInput::default()
        };
        assert!(kms.create_key(input).is_err());
    }

    #[test]
    fn malformed_policy_is_rejected() {
        let kms = active();
        let input = CreateKeyInput {
            policy: Some("{not json".into()),
            ..CreateKeyInput::default()
        };
        assert!(kms.create_key(input).is_err());
    }

    #[test]
    fn deactivation_drops_keys() {
        let kms = active();
        let _ = kms.create_key(CreateKeyInput::default()).unwrap();
        kms.deactivate();
        let _ = kms.activate();
        assert!(kms.list_keys().unwrap().is_empty());
    }
}
