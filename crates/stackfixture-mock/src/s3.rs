//! Object bucket mock (`s3`).
//!
//! Buckets keep a version history per key. Unversioned buckets hold a single
//! version with id `null` that is overwritten in place. A bucket can only be
//! deleted once every version and delete marker is gone.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use stackfixture_common::error::BackendError;
use uuid::Uuid;

use crate::service::Service;

const SERVICE: &str = "s3";
const NULL_VERSION: &str = "null";

/// Parameters of `CreateBucket`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateBucketInput {
    /// Bucket name.
    pub bucket: String,
    /// Canned ACL, e.g. `Private`.
    pub acl: Option<String>,
    /// Resource tags.
    pub tags: BTreeMap<String, String>,
}

/// Versioning state of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersioningStatus {
    /// New writes create new versions.
    Enabled,
    /// Versioning was enabled once and is now paused.
    Suspended,
}

/// One entry of `ListObjectVersions`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectVersion {
    /// Object key.
    pub key: String,
    /// Version id (`null` for unversioned writes).
    pub version_id: String,
    /// Whether this entry is a delete marker.
    pub is_delete_marker: bool,
    /// Whether this is the newest entry for the key.
    pub is_latest: bool,
}

#[derive(Debug)]
struct StoredVersion {
    version_id: String,
    body: Option<Vec<u8>>,
    last_modified: DateTime<Utc>,
}

#[derive(Debug)]
struct Bucket {
    acl: Option<String>,
    tags: BTreeMap<String, String>,
    versioning: Option<VersioningStatus>,
    objects: BTreeMap<String, Vec<StoredVersion>>,
}

/// Mocked object storage service.
#[derive(Debug, Clone)]
pub struct S3 {
    service: Service<BTreeMap<String, Bucket>>,
}

impl S3 {
    pub(crate) fn new() -> Self {
        Self {
            service: Service::new(SERVICE),
        }
    }

    /// Activates the service. Returns `false` if it was already active.
    pub fn activate(&self) -> bool {
        self.service.start()
    }

    /// Deactivates the service, discarding every bucket and object.
    pub fn deactivate(&self) {
        self.service.stop();
    }

    /// Returns whether the service is active.
    pub fn is_active(&self) -> bool {
        self.service.is_active()
    }

    /// Creates a bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or already taken.
    pub fn create_bucket(&self, input: CreateBucketInput) -> Result<(), BackendError> {
        if input.bucket.is_empty() {
            return Err(BackendError::Validation {
                service: SERVICE,
                message: "bucket name must not be empty".into(),
            });
        }
        self.service.with(|buckets| {
            if buckets.contains_key(&input.bucket) {
                return Err(BackendError::AlreadyExists {
                    service: SERVICE,
                    kind: "bucket",
                    id: input.bucket,
                });
            }
            let _ = buckets.insert(
                input.bucket,
                Bucket {
                    acl: input.acl,
                    tags: input.tags,
                    versioning: None,
                    objects: BTreeMap::new(),
                },
            );
            Ok(())
        })
    }

    /// Checks that a bucket exists.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if it does not.
    pub fn head_bucket(&self, bucket: &str) -> Result<(), BackendError> {
        self.service.with(|buckets| lookup(buckets, bucket).map(|_| ()))
    }

    /// Lists bucket names.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is inactive.
    pub fn list_buckets(&self) -> Result<Vec<String>, BackendError> {
        self.service.with(|buckets| Ok(buckets.keys().cloned().collect()))
    }

    /// Returns a bucket's canned ACL and tags.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the bucket does not exist.
    pub fn bucket_metadata(
        &self,
        bucket: &str,
    ) -> Result<(Option<String>, BTreeMap<String, String>), BackendError> {
        self.service.with(|buckets| {
            let found = lookup(buckets, bucket)?;
            Ok((found.acl.clone(), found.tags.clone()))
        })
    }

    /// Enables or suspends versioning.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the bucket does not exist.
    pub fn put_bucket_versioning(&self, bucket: &str, enabled: bool) -> Result<(), BackendError> {
        self.service.with(|buckets| {
            let found = lookup_mut(buckets, bucket)?;
            found.versioning = Some(if enabled {
                VersioningStatus::Enabled
            } else {
                VersioningStatus::Suspended
            });
            Ok(())
        })
    }

    /// Returns the versioning state; `None` if never configured.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the bucket does not exist.
    pub fn get_bucket_versioning(&self, bucket: &str) -> Result<Option<VersioningStatus>, BackendError> {
        self.service.with(|buckets| Ok(lookup(buckets, bucket)?.versioning))
    }

    /// Writes an object and returns the new version id.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the bucket does not exist.
    pub fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: impl Into<Vec<u8>>,
    ) -> Result<String, BackendError> {
        let body = body.into();
        self.service.with(|buckets| {
            let found = lookup_mut(buckets, bucket)?;
            Ok(found.push_version(key, Some(body)))
        })
    }

    /// Reads the latest version of an object.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the bucket or key does not
    /// exist, or the latest version is a delete marker.
    pub fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, BackendError> {
        self.service.with(|buckets| {
            lookup(buckets, bucket)?
                .objects
                .get(key)
                .and_then(|versions| versions.last())
                .and_then(|latest| latest.body.clone())
                .ok_or_else(|| BackendError::NotFound {
                    service: SERVICE,
                    kind: "object",
                    id: format!("{bucket}/{key}"),
                })
        })
    }

    /// Deletes an object. Versioned buckets receive a delete marker instead.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the bucket does not exist.
    pub fn delete_object(&self, bucket: &str, key: &str) -> Result<(), BackendError> {
        self.service.with(|buckets| {
            let found = lookup_mut(buckets, bucket)?;
            if found.versioning.is_some() {
                let _ = found.push_version(key, None);
            } else {
                let _ = found.objects.remove(key);
            }
            Ok(())
        })
    }

    /// Lists every stored version and delete marker, oldest first per key.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the bucket does not exist.
    pub fn list_object_versions(&self, bucket: &str) -> Result<Vec<ObjectVersion>, BackendError> {
        self.service.with(|buckets| {
            let found = lookup(buckets, bucket)?;
            let mut listed = Vec::new();
            for (key, versions) in &found.objects {
                let newest = versions.len().saturating_sub(1);
                for (index, version) in versions.iter().enumerate() {
                    listed.push(ObjectVersion {
                        key: key.clone(),
                        version_id: version.version_id.clone(),
                        is_delete_marker: version.body.is_none(),
                        is_latest: index == newest,
                    });
                }
            }
            Ok(listed)
        })
    }

    /// Permanently removes one version or delete marker.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the bucket, key, or version does
    /// not exist.
    pub fn delete_object_version(
        &self,
        bucket: &str,
        key: &str,
        version_id: &str,
    ) -> Result<(), BackendError> {
        self.service.with(|buckets| {
            let found = lookup_mut(buckets, bucket)?;
            let missing = || BackendError::NotFound {
                service: SERVICE,
                kind: "object version",
                id: format!("{bucket}/{key}?versionId={version_id}"),
            };
            let versions = found.objects.get_mut(key).ok_or_else(missing)?;
            let position = versions
                .iter()
                .position(|v| v.version_id == version_id)
                .ok_or_else(missing)?;
            let removed = versions.remove(position);
            tracing::trace!(bucket, key, version_id, modified = %removed.last_modified, "object version removed");
            if versions.is_empty() {
                let _ = found.objects.remove(key);
            }
            Ok(())
        })
    }

    /// Deletes an empty bucket.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::BucketNotEmpty`] if any version or delete
    /// marker remains, or [`BackendError::NotFound`] if it does not exist.
    pub fn delete_bucket(&self, bucket: &str) -> Result<(), BackendError> {
        self.service.with(|buckets| {
            if !lookup(buckets, bucket)?.objects.is_empty() {
                return Err(BackendError::BucketNotEmpty {
                    bucket: bucket.to_owned(),
                });
            }
            let _ = buckets.remove(bucket);
            Ok(())
        })
    }
}

impl Bucket {
    fn push_version(&mut self, key: &str, body: Option<Vec<u8>>) -> String {
        let versions = self.objects.entry(key.to_owned()).or_default();
        let version_id = if self.versioning == Some(VersioningStatus::Enabled) {
            Uuid::new_v4().simple().to_string()
        } else {
            versions.retain(|v| v.version_id != NULL_VERSION);
            NULL_VERSION.to_owned()
        };
        versions.push(StoredVersion {
            version_id: version_id.clone(),
            body,
            last_modified: Utc::now(),
        });
        version_id
    }
}

fn lookup<'a>(buckets: &'a BTreeMap<String, Bucket>, name: &str) -> Result<&'a Bucket, BackendError> {
    buckets.get(name).ok_or_else(|| not_found(name))
}

fn lookup_mut<'a>(
    buckets: &'a mut BTreeMap<String, Bucket>,
    name: &str,
) -> Result<&'a mut Bucket, BackendError> {
    buckets.get_mut(name).ok_or_else(|| not_found(name))
}

fn not_found(name: &str) -> BackendError {
    BackendError::NotFound {
        service: SERVICE,
        kind: "bucket",
        id: name.to_owned(),
    }
}
