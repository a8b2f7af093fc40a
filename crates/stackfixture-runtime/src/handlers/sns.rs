//! Pub/sub topic handler.

use std::collections::HashMap;

use stackfixture_common::error::Result;
use stackfixture_common::types::ResourceKind;
use stackfixture_document::classifier::Properties;
use stackfixture_mock::MockCloud;
use stackfixture_mock::sns::{CreateTopicInput, Sns};

use super::{ResourceHandler, into_result, record_failure};
use crate::properties::{self, PropertySet};

const PROPERTIES: PropertySet = PropertySet {
    kind: ResourceKind::Topic,
    required: &[],
    optional: &["TopicName", "DisplayName", "FifoTopic", "KmsMasterKeyId", "Tags"],
};

/// Creates declared topics; deletes them by looking their ARNs back up.
#[derive(Debug)]
pub struct TopicHandler {
    sns: Sns,
    definitions: Vec<Properties>,
    created: Vec<String>,
}

impl TopicHandler {
    /// Binds topic definitions to the cloud's SNS service.
    pub fn new(definitions: Vec<Properties>, cloud: &MockCloud) -> Self {
        Self {
            sns: cloud.sns().clone(),
            definitions,
            created: Vec::new(),
        }
    }

    /// Registry factory.
    pub fn boxed(definitions: Vec<Properties>, cloud: &MockCloud) -> Box<dyn ResourceHandler> {
        Box::new(Self::new(definitions, cloud))
    }

    /// Deletes every created topic, resolving names through the listed ARNs.
    fn delete_created(&mut self) -> Result<()> {
        let names = std::mem::take(&mut self.created);
        if names.is_empty() {
            return Ok(());
        }
        let arns = self.sns.list_topics()?;
        let by_name: HashMap<&str, &str> = arns
            .iter()
            .map(|arn| (arn_suffix(arn), arn.as_str()))
            .collect();
        let mut failure = None;
        for name in &names {
            let Some(arn) = by_name.get(name.as_str()) else {
                tracing::warn!(topic = %name, "topic vanished before teardown");
                continue;
            };
            if let Err(e) = self.sns.delete_topic(arn) {
                record_failure(&mut failure, ResourceKind::Topic, name, e.into());
            }
        }
        into_result(failure)
    }
}

/// Last `:`-separated segment of an ARN.
fn arn_suffix(arn: &str) -> &str {
    arn.rsplit(':').next().unwrap_or(arn)
}

impl ResourceHandler for TopicHandler {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Topic
    }

    fn setup(&mut self) -> Result<()> {
        let _ = self.sns.activate();
        for declared in &self.definitions {
            let recognized = PROPERTIES.recognized(declared)?;
            let Some(name) = properties::identifier(&recognized, "TopicName") else {
                tracing::warn!("topic declared without TopicName, skipping");
                continue;
            };
            let arn = self.sns.create_topic(CreateTopicInput {
                name: name.clone(),
                attributes: properties::attributes(&recognized, &["TopicName", "Tags"]),
                tags: properties::tags(&recognized),
            })?;
            tracing::debug!(topic = %name, arn = %arn, "topic created");
            if !self.created.contains(&name) {
                self.created.push(name);
            }
        }
        Ok(())
    }

    fn teardown(&mut self) -> Result<()> {
        let deleted = self.delete_created();
        self.sns.deactivate();
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
    fn suffix_is_last_segment() {
        assert_eq!(arn_suffix("arn:aws:sns:us-east-1:123456789012:alerts"), "alerts");
        assert_eq!(arn_suffix("alerts"), "alerts");
    }

    #[test]
    fn topics_are_created_with_declared_attributes() {
        let cloud = MockCloud::new("eu-west-1");
        let mut handler = TopicHandler::boxed(
            vec![
                definition("TopicName: alerts\nDisplayName: Alerts\nSubscription: []\n"),
                definition("TopicName: audit.fifo\nFifoTopic: true\n"),
            ],
            &cloud,
        );
        handler.setup().unwrap();
        let sns = cloud.sns();
        let arns = sns.list_topics().unwrap();
        assert_eq!(arns.len(), 2);
        let alerts = "arn:aws:sns:eu-west-1:123456789012:alerts";
        let attributes = sns.get_topic_attributes(alerts).unwrap();
        assert_eq!(attributes["DisplayName"], "Alerts");
        assert!(!attributes.contains_key("Subscription"));

        handler.teardown().unwrap();
        assert!(!sns.is_active());
    }

    #[test]
    fn only_declared_topics_are_deleted() {
        let cloud = MockCloud::default();
        let mut handler = TopicHandler::new(
            vec![definition("TopicName: alerts\n"), definition("TopicName: audit\n")],
            &cloud,
        );
        handler.setup().unwrap();
        let sns = cloud.sns();
        let external = sns
            .create_topic(CreateTopicInput {
                name: "external".into(),
                ..CreateTopicInput::default()
            })
            .unwrap();

        handler.delete_created().unwrap();
        assert!(sns.is_active());
        assert_eq!(sns.list_topics().unwrap(), [external]);

        handler.teardown().unwrap();
        assert!(!sns.is_active());
    }

    #[test]
    fn deleting_after_the_topic_vanished_is_not_an_error() {
        let cloud = MockCloud::default();
        let mut handler = TopicHandler::new(vec![definition("TopicName: alerts\n")], &cloud);
        handler.setup().unwrap();
        let sns = cloud.sns();
        sns.delete_topic("arn:aws:sns:us-east-1:123456789012:alerts").unwrap();
        handler.delete_created().unwrap();
        assert!(sns.list_topics().unwrap().is_empty());
        handler.teardown().unwrap();
    }

    #[test]
    fn unnamed_topic_is_skipped() {
        let cloud = MockCloud::default();
        let mut handler = TopicHandler::boxed(vec![definition("DisplayName: x\n")], &cloud);
        handler.setup().unwrap();
        assert!(cloud.sns().list_topics().unwrap().is_empty());
        handler.teardown().unwrap();
    }
}
