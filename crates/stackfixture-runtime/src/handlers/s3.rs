//! Object-bucket handler.
//!
//! Buckets must be empty before they can be deleted, so teardown removes
//! every object version and delete marker first.

use serde_yaml::Value;
use stackfixture_common::error::{BackendError, Result};
use stackfixture_common::types::ResourceKind;
use stackfixture_document::classifier::Properties;
use stackfixture_mock::MockCloud;
use stackfixture_mock::s3::{CreateBucketInput, S3};

use super::{ResourceHandler, into_result, record_failure};
use crate::properties::{self, PropertySet};

const PROPERTIES: PropertySet = PropertySet {
    kind: ResourceKind::ObjectBucket,
    required: &[],
    optional: &["BucketName", "AccessControl", "VersioningConfiguration", "Tags"],
};

/// Creates declared buckets and empties them on teardown.
#[derive(Debug)]
pub struct BucketHandler {
    s3: S3,
    definitions: Vec<Properties>,
    created: Vec<String>,
}

impl BucketHandler {
    /// Registry factory.
    pub fn boxed(definitions: Vec<Properties>, cloud: &MockCloud) -> Box<dyn ResourceHandler> {
        Box::new(Self {
            s3: cloud.s3().clone(),
            definitions,
            created: Vec::new(),
        })
    }

    fn empty_and_delete(&self, bucket: &str) -> std::result::Result<(), BackendError> {
        for version in self.s3.list_object_versions(bucket)? {
            self.s3
                .delete_object_version(bucket, &version.key, &version.version_id)?;
        }
        self.s3.delete_bucket(bucket)
    }
}

fn versioning_enabled(recognized: &Properties) -> Option<bool> {
    recognized
        .get("VersioningConfiguration")
        .and_then(|config| config.get("Status"))
        .and_then(Value::as_str)
        .map(|status| status.eq_ignore_ascii_case("Enabled"))
}

impl ResourceHandler for BucketHandler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::ObjectBucket
    }

    fn setup(&mut self) -> Result<()> {
        let _ = self.s3.activate();
        for declared in &self.definitions {
            let recognized = PROPERTIES.recognized(declared)?;
            let Some(bucket) = properties::identifier(&recognized, "BucketName") else {
                tracing::warn!("bucket declared without BucketName, skipping");
                continue;
            };
            self.s3.create_bucket(CreateBucketInput {
                bucket: bucket.clone(),
                acl: properties::wire_string(&recognized, "AccessControl"),
                tags: properties::tags(&recognized),
            })?;
            if let Some(enabled) = versioning_enabled(&recognized) {
                self.s3.put_bucket_versioning(&bucket, enabled)?;
            }
            tracing::debug!(bucket = %bucket, "bucket created");
            self.created.push(bucket);
        }
        Ok(())
    }

    fn teardown(&mut self) -> Result<()> {
        let mut failure = None;
        for bucket in std::mem::take(&mut self.created) {
            if let Err(e) = self.empty_and_delete(&bucket) {
                record_failure(&mut failure, ResourceKind::ObjectBucket, &bucket, e.into());
            }
        }
        self.s3.deactivate();
        into_result(failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(yaml: &str) -> Properties {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn versioned_bucket_with_objects_tears_down() {
        let cloud = MockCloud::default();
        let mut handler = BucketHandler::boxed(
            vec![definition(
                "BucketName: uploads\nVersioningConfiguration:\n  Status: Enabled\n",
            )],
            &cloud,
        );
        handler.setup().unwrap();
        let s3 = cloud.s3();
        let _ = s3.put_object("uploads", "a.txt", "one").unwrap();
        let _ = s3.put_object("uploads", "a.txt", "two").unwrap();
        s3.delete_object("uploads", "a.txt").unwrap();
        assert_eq!(s3.list_object_versions("uploads").unwrap().len(), 3);
        handler.teardown().unwrap();
        assert!(!s3.is_active());
    }

    #[test]
    fn acl_and_tags_are_forwarded() {
        let cloud = MockCloud::default();
        let mut handler = BucketHandler::boxed(
            vec![definition(
                "BucketName: logs\nAccessControl: Private\nTags:\n  - Key: team\n    Value: core\nLifecycleConfiguration: {}\n",
            )],
            &cloud,
        );
        handler.setup().unwrap();
        let (acl, tags) = cloud.s3().bucket_metadata("logs").unwrap();
        assert_eq!(acl.as_deref(), Some("Private"));
        assert_eq!(tags["team"], "core");
    }

    #[test]
    fn unnamed_bucket_is_skipped() {
        let cloud = MockCloud::default();
        let mut handler = BucketHandler::boxed(vec![definition("AccessControl: Private\n")], &cloud);
        handler.setup().unwrap();
        assert!(cloud.s3().list_buckets().unwrap().is_empty());
        handler.teardown().unwrap();
    }
}
