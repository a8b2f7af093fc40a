//! Per-kind resource handlers and the registry that orders them.

pub mod dynamodb;
pub mod kms;
pub mod s3;
pub mod sns;
pub mod sqs;

use stackfixture_common::error::{FixtureError, Result};
use stackfixture_common::types::ResourceKind;
use stackfixture_document::classifier::Properties;
use stackfixture_mock::MockCloud;

/// Setup/teardown pair for every declared resource of one kind.
///
/// Implementors are built fresh for each test and bound to one
/// [`MockCloud`].
pub trait ResourceHandler {
    /// Kind this handler manages.
    fn kind(&self) -> ResourceKind;

    /// Activates the backing service and creates every declared resource.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::ResourceSetup`] if a required property is
    /// missing, or a backend error if creation is rejected.
    fn setup(&mut self) -> Result<()>;

    /// Removes every created resource, then deactivates the service.
    ///
    /// # Errors
    ///
    /// Returns the first removal error after attempting the rest.
    fn teardown(&mut self) -> Result<()>;
}

/// Builds a handler for one kind's definitions.
pub type HandlerFactory = fn(Vec<Properties>, &MockCloud) -> Box<dyn ResourceHandler>;

/// Kind to handler factory. Order defines both setup and teardown order.
pub static REGISTRY: &[(ResourceKind, HandlerFactory)] = &[
    (ResourceKind::TableStore, dynamodb::TableHandler::boxed),
    (ResourceKind::Queue, sqs::QueueHandler::boxed),
    (ResourceKind::ObjectBucket, s3::BucketHandler::boxed),
    (ResourceKind::Topic, sns::TopicHandler::boxed),
    (ResourceKind::EncryptionKey, kms::KeyHandler::boxed),
];

/// Keeps the first teardown failure while the remaining steps still run.
fn record_failure(first: &mut Option<FixtureError>, kind: ResourceKind, id: &str, error: FixtureError) {
    tracing::warn!(%kind, id, error = %error, "teardown step failed");
    let _ = first.get_or_insert(error);
}

fn into_result(first: Option<FixtureError>) -> Result<()> {
    first.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_every_kind_in_order() {
        let kinds: Vec<ResourceKind> = REGISTRY.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(kinds, ResourceKind::ALL);
    }

    #[test]
    fn factories_build_matching_handlers() {
        let cloud = MockCloud::default();
        for (kind, factory) in REGISTRY {
            assert_eq!(factory(Vec::new(), &cloud).kind(), *kind);
        }
    }

    #[test]
    fn empty_handler_toggles_its_service() {
        let cloud = MockCloud::default();
        let mut handler = sqs::QueueHandler::boxed(Vec::new(), &cloud);
        handler.setup().unwrap();
        assert_eq!(cloud.active_services(), ["sqs"]);
        handler.teardown().unwrap();
        assert!(cloud.active_services().is_empty());
    }
}
