//! Aggregate handle over every mocked service.

use stackfixture_common::constants::DEFAULT_REGION;

use crate::dynamodb::DynamoDb;
use crate::kms::Kms;
use crate::s3::S3;
use crate::sns::Sns;
use crate::sqs::Sqs;

/// One set of mocked services, scoped to a single test.
///
/// All services start inactive.
#[derive(Debug, Clone)]
pub struct MockCloud {
    region: String,
    dynamodb: DynamoDb,
    sqs: Sqs,
    s3: S3,
    sns: Sns,
    kms: Kms,
}

impl MockCloud {
    /// Creates a fresh set of inactive services in `region`.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        let region = region.into();
        Self {
            dynamodb: DynamoDb::new(&region),
            sqs: Sqs::new(),
            s3: S3::new(),
            sns: Sns::new(&region),
            kms: Kms::new(&region),
            region,
        }
    }

    /// Region embedded in ARNs.
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Table store.
    #[must_use]
    pub const fn dynamodb(&self) -> &DynamoDb {
        &self.dynamodb
    }

    /// Message queues.
    #[must_use]
    pub const fn sqs(&self) -> &Sqs {
        &self.sqs
    }

    /// Object buckets.
    #[must_use]
    pub const fn s3(&self) -> &S3 {
        &self.s3
    }

    /// Pub/sub topics.
    #[must_use]
    pub const fn sns(&self) -> &Sns {
        &self.sns
    }

    /// Encryption keys.
    #[must_use]
    pub const fn kms(&self) -> &Kms {
        &self.kms
    }

    /// Names of the services that are currently active.
    #[must_use]
    pub fn active_services(&self) -> Vec<&'static str> {
        [
            ("dynamodb", self.dynamodb.is_active()),
            ("sqs", self.sqs.is_active()),
            ("s3", self.s3.is_active()),
            ("sns", self.sns.is_active()),
            ("kms", self.kms.is_active()),
        ]
        .into_iter()
        .filter_map(|(name, active)| active.then_some(name))
        .collect()
    }
}

impl Default for MockCloud {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}
