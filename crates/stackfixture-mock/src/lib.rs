//! # stackfixture-mock
//!
//! In-memory analogs of the cloud services that declared resources map to.
//!
//! Every service is activated and deactivated independently through a
//! [`MockCloud`] handle. Handles are cheap to clone and share state, so a
//! test and the lifecycle handlers can observe the same resources.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod cloud;
pub mod dynamodb;
pub mod kms;
pub mod s3;
mod service;
pub mod sns;
pub mod sqs;

use serde::{Deserialize, Serialize};

pub use crate::cloud::MockCloud;

/// A `Key`/`Value` resource tag as declared in templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    /// Tag key.
    pub key: String,
    /// Tag value.
    pub value: String,
}
