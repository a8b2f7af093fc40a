//! Unified error types for the stackfixture workspace.
//!
//! Configuration-level variants (`MissingConfig`, `MissingTool`,
//! `MalformedDocument`) abort session setup before any test runs.
//! `ResourceSetup` and `Backend` abort only the current test.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum FixtureError {
    /// The declarative document does not exist.
    #[error("no declarative document found at {}", path.display())]
    MissingConfig {
        /// Path that was expected to hold the document.
        path: PathBuf,
    },

    /// The external renderer could not be located.
    #[error("renderer executable `{program}` not found: {reason}")]
    MissingTool {
        /// Program name as configured.
        program: String,
        /// Why the lookup failed.
        reason: String,
    },

    /// The document text is not the expected nested mapping.
    #[error("malformed declarative document: {message}")]
    MalformedDocument {
        /// Description of the structural problem.
        message: String,
    },

    /// A resource could not be created because a required property is missing.
    #[error("cannot set up {kind} resource: {message}")]
    ResourceSetup {
        /// Resource kind tag.
        kind: &'static str,
        /// What was missing or wrong.
        message: String,
    },

    /// The external renderer ran but exited unsuccessfully.
    #[error("renderer `{program}` failed with {status}: {stderr}")]
    RenderFailed {
        /// Program that was invoked.
        program: String,
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// An I/O operation failed.
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// The mocked backend rejected an operation.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Errors raised by the in-memory mocked backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The service has not been activated for this test.
    #[error("{service} mock is not active")]
    ServiceInactive {
        /// Service name, e.g. `dynamodb`.
        service: &'static str,
    },

    /// The addressed resource does not exist.
    #[error("{service} {kind} not found: {id}")]
    NotFound {
        /// Service name.
        service: &'static str,
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A resource with the same identifier already exists.
    #[error("{service} {kind} already exists: {id}")]
    AlreadyExists {
        /// Service name.
        service: &'static str,
        /// Type of the conflicting resource.
        kind: &'static str,
        /// Identifier of the conflicting resource.
        id: String,
    },

    /// A bucket still holds object versions and cannot be deleted.
    #[error("bucket {bucket} is not empty")]
    BucketNotEmpty {
        /// Bucket name.
        bucket: String,
    },

    /// A request parameter was rejected.
    #[error("{service} validation error: {message}")]
    Validation {
        /// Service name.
        service: &'static str,
        /// Description of the rejected parameter.
        message: String,
    },
}

impl BackendError {
    /// Returns whether this error reports a missing resource.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, FixtureError>;
