//! Queue handler.

use stackfixture_common::error::Result;
use stackfixture_common::types::ResourceKind;
use stackfixture_document::classifier::Properties;
use stackfixture_mock::MockCloud;
use stackfixture_mock::sqs::{CreateQueueInput, Sqs};

use super::{ResourceHandler, into_result, record_failure};
use crate::properties::{self, PropertySet};

const PROPERTIES: PropertySet = PropertySet {
    kind: ResourceKind::Queue,
    required: &["QueueName"],
    optional: &[
        "DelaySeconds",
        "MaximumMessageSize",
        "MessageRetentionPeriod",
        "ReceiveMessageWaitTimeSeconds",
        "VisibilityTimeout",
        "FifoQueue",
        "ContentBasedDeduplication",
        "RedrivePolicy",
        "KmsMasterKeyId",
        "Tags",
    ],
};

/// Creates and removes declared queues.
#[derive(Debug)]
pub struct QueueHandler {
    sqs: Sqs,
    definitions: Vec<Properties>,
    created: Vec<String>,
}

impl QueueHandler {
    /// Binds queue definitions to the cloud's SQS service.
    pub fn new(definitions: Vec<Properties>, cloud: &MockCloud) -> Self {
        Self {
            sqs: cloud.sqs().clone(),
            definitions,
            created: Vec::new(),
        }
    }

    /// Registry factory.
    pub fn boxed(definitions: Vec<Properties>, cloud: &MockCloud) -> Box<dyn ResourceHandler> {
        Box::new(Self::new(definitions, cloud))
    }

    /// Deletes every created queue through its URL.
    fn delete_created(&mut self) -> Result<()> {
        let mut failure = None;
        for name in self.created.drain(..) {
            let deleted = self
                .sqs
                .get_queue_url(&name)
                .and_then(|url| self.sqs.delete_queue(&url));
            if let Err(e) = deleted {
                record_failure(&mut failure, ResourceKind::Queue, &name, e.into());
            }
        }
        into_result(failure)
    }
}

fn create_queue_input(declared: &Properties) -> Result<CreateQueueInput> {
    let recognized = PROPERTIES.recognized(declared)?;
    let queue_name = properties::identifier(&recognized, "QueueName")
        .ok_or_else(|| PROPERTIES.setup_error("QueueName resolves to an empty identifier"))?;
    Ok(CreateQueueInput {
        queue_name,
        attributes: properties::attributes(&recognized, &["QueueName", "Tags"]),
        tags: properties::tags(&recognized),
    })
}

impl ResourceHandler for QueueHandler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Queue
    }

    fn setup(&mut self) -> Result<()> {
        let _ = self.sqs.activate();
        for declared in &self.definitions {
            let input = create_queue_input(declared)?;
            let name = input.queue_name.clone();
            let url = self.sqs.create_queue(input)?;
            tracing::debug!(queue = %name, url = %url, "queue created");
            if !self.created.contains(&name) {
                self.created.push(name);
            }
        }
        Ok(())
    }

    fn teardown(&mut self) -> Result<()> {
        let deleted = self.delete_created();
        self.sqs.deactivate();
        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(yaml: &str) -> Properties {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn attributes_and_tags_are_forwarded() {
        let input = create_queue_input(&definition(
            "\
QueueName: jobs.fifo
FifoQueue: true
VisibilityTimeout: 30
RedrivePolicy:
  maxReceiveCount: 5
Tags:
  - Key: team
    Value: core
QueueNameSuffix: ignored
",
        ))
        .unwrap();
        assert_eq!(input.queue_name, "jobs.fifo");
        assert_eq!(input.attributes["FifoQueue"], "true");
        assert_eq!(input.attributes["VisibilityTimeout"], "30");
        assert_eq!(input.attributes["RedrivePolicy"], "{\"maxReceiveCount\":5}");
        assert_eq!(input.attributes.len(), 3);
        assert_eq!(input.tags["team"], "core");
    }

    #[test]
    fn teardown_deactivates_the_service() {
        let cloud = MockCloud::default();
        let mut handler = QueueHandler::boxed(
            vec![definition("QueueName: a\n"), definition("QueueName: b\n")],
            &cloud,
        );
        handler.setup().unwrap();
        assert_eq!(cloud.sqs().list_queues().unwrap().len(), 2);
        handler.teardown().unwrap();
        assert!(!cloud.sqs().is_active());
    }

    #[test]
    fn only_declared_queues_are_deleted() {
        let cloud = MockCloud::default();
        let mut handler = QueueHandler::new(
            vec![definition("QueueName: a\n"), definition("QueueName: b\n")],
            &cloud,
        );
        handler.setup().unwrap();
        let sqs = cloud.sqs();
        let external = sqs
            .create_queue(CreateQueueInput {
                queue_name: "external".into(),
                ..CreateQueueInput::default()
            })
            .unwrap();

        handler.delete_created().unwrap();
        assert!(sqs.is_active());
        assert_eq!(sqs.list_queues().unwrap(), [external]);

        handler.teardown().unwrap();
        assert!(!sqs.is_active());
    }

    #[test]
    fn queue_deleted_elsewhere_is_reported() {
        let cloud = MockCloud::default();
        let mut handler = QueueHandler::new(vec![definition("QueueName: a\n")], &cloud);
        handler.setup().unwrap();
        let sqs = cloud.sqs();
        sqs.delete_queue(&sqs.get_queue_url("a").unwrap()).unwrap();
        assert!(handler.delete_created().is_err());
        handler.teardown().unwrap();
    }

    #[test]
    fn duplicate_declaration_with_same_attributes_is_idempotent() {
        let cloud = MockCloud::default();
        let mut handler = QueueHandler::boxed(
            vec![definition("QueueName: a\n"), definition("QueueName: a\n")],
            &cloud,
        );
        handler.setup().unwrap();
        assert_eq!(cloud.sqs().list_queues().unwrap().len(), 1);
        handler.teardown().unwrap();
    }

    #[test]
    fn missing_queue_name_is_fatal() {
        let cloud = MockCloud::default();
        let mut handler = QueueHandler::boxed(vec![definition("DelaySeconds: 1\n")], &cloud);
        assert!(handler.setup().is_err());
    }
}
