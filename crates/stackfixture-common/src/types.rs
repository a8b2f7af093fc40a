//! Domain primitive types used across the stackfixture workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of mocked cloud resource with a registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ResourceKind {
    /// Key-value table store (`AWS::DynamoDB::Table`).
    TableStore,
    /// Message queue (`AWS::SQS::Queue`).
    Queue,
    /// Object bucket (`AWS::S3::Bucket`).
    ObjectBucket,
    /// Pub/sub topic (`AWS::SNS::Topic`).
    Topic,
    /// Encryption key (`AWS::KMS::Key`).
    EncryptionKey,
}

impl ResourceKind {
    /// Every kind, in handler registry order.
    pub const ALL: [Self; 5] = [
        Self::TableStore,
        Self::Queue,
        Self::ObjectBucket,
        Self::Topic,
        Self::EncryptionKey,
    ];

    /// Returns the declarative `Type` tag for this kind.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::TableStore => "AWS::DynamoDB::Table",
            Self::Queue => "AWS::SQS::Queue",
            Self::ObjectBucket => "AWS::S3::Bucket",
            Self::Topic => "AWS::SNS::Topic",
            Self::EncryptionKey => "AWS::KMS::Key",
        }
    }

    /// Parses a declarative `Type` tag. Unregistered tags yield `None`.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.tag() == tag)
    }

    /// Short name of the mocked service backing this kind.
    #[must_use]
    pub const fn service(self) -> &'static str {
        match self {
            Self::TableStore => "dynamodb",
            Self::Queue => "sqs",
            Self::ObjectBucket => "s3",
            Self::Topic => "sns",
            Self::EncryptionKey => "kms",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
