//! Pub/sub topic mock (`sns`).
//!
//! Topics are addressed by ARN only; callers holding a name must list topics
//! to find the ARN.

use std::collections::BTreeMap;

use stackfixture_common::constants::MOCK_ACCOUNT_ID;
use stackfixture_common::error::BackendError;
use uuid::Uuid;

use crate::service::Service;

const SERVICE: &str = "sns";

/// Parameters of `CreateTopic`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateTopicInput {
    /// Topic name; FIFO topics must end in `.fifo`.
    pub name: String,
    /// Topic attributes in wire string form.
    pub attributes: BTreeMap<String, String>,
    /// Resource tags.
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug)]
struct Topic {
    attributes: BTreeMap<String, String>,
    tags: BTreeMap<String, String>,
    published: Vec<String>,
}

/// Mocked notification service.
#[derive(Debug, Clone)]
pub struct Sns {
    service: Service<BTreeMap<String, Topic>>,
    region: String,
}

impl Sns {
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

    /// Deactivates the service, discarding every topic.
    pub fn deactivate(&self) {
        self.service.stop();
    }

    /// Returns whether the service is active.
    pub fn is_active(&self) -> bool {
        self.service.is_active()
    }

    /// Creates a topic and returns its ARN. Creating an existing topic
    /// returns the existing ARN.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or a FIFO topic lacks the
    /// `.fifo` suffix.
    pub fn create_topic(&self, input: CreateTopicInput) -> Result<String, BackendError> {
        let fifo = input
            .attributes
            .get("FifoTopic")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));
        if input.name.is_empty() || fifo != input.name.ends_with(".fifo") {
            return Err(BackendError::Validation {
                service: SERVICE,
                message: format!("invalid topic name {:?}", input.name),
            });
        }
        let arn = format!("arn:aws:sns:{}:{MOCK_ACCOUNT_ID}:{}", self.region, input.name);
        self.service.with(|topics| {
            let _ = topics.entry(arn.clone()).or_insert_with(|| Topic {
                attributes: input.attributes,
                tags: input.tags,
                published: Vec::new(),
            });
            Ok(arn)
        })
    }

    /// Lists topic ARNs.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is inactive.
    pub fn list_topics(&self) -> Result<Vec<String>, BackendError> {
        self.service.with(|topics| Ok(topics.keys().cloned().collect()))
    }

    /// Returns a topic's attributes, including its `TopicArn`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the ARN names no topic.
    pub fn get_topic_attributes(&self, arn: &str) -> Result<BTreeMap<String, String>, BackendError> {
        self.service.with(|topics| {
            let topic = topics.get(arn).ok_or_else(|| not_found(arn))?;
            let mut attributes = topic.attributes.clone();
            let _ = attributes.insert("TopicArn".into(), arn.to_owned());
            Ok(attributes)
        })
    }

    /// Returns a topic's tags.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the ARN names no topic.
    pub fn list_tags_for_resource(&self, arn: &str) -> Result<BTreeMap<String, String>, BackendError> {
        self.service.with(|topics| {
            topics
                .get(arn)
                .map(|topic| topic.tags.clone())
                .ok_or_else(|| not_found(arn))
        })
    }

    /// Publishes a message and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the ARN names no topic.
    pub fn publish(&self, arn: &str, message: impl Into<String>) -> Result<String, BackendError> {
        let message = message.into();
        self.service.with(|topics| {
            let topic = topics.get_mut(arn).ok_or_else(|| not_found(arn))?;
            topic.published.push(message);
            Ok(Uuid::new_v4().to_string())
        })
    }

    /// Returns every message published to a topic, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the ARN names no topic.
    pub fn published_messages(&self, arn: &str) -> Result<Vec<String>, BackendError> {
        self.service.with(|topics| {
            topics
                .get(arn)
                .map(|topic| topic.published.clone())
                .ok_or_else(|| not_found(arn))
        })
    }

    /// Deletes a topic by ARN.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the ARN names no topic.
    pub fn delete_topic(&self, arn: &str) -> Result<(), BackendError> {
        self.service
            .with(|topics| topics.remove(arn).map(|_| ()).ok_or_else(|| not_found(arn)))
    }
}

fn not_found(arn: &str) -> BackendError {
    BackendError::NotFound {
        service: SERVICE,
        kind: "topic",
        id: arn.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active() -> Sns {
        let sns = Sns::new("eu-west-1");
        let _ = sns.activate();
        sns
    }

    fn named(name: &str) -> CreateTopicInput {
        CreateTopicInput {
            name: name.into(),
            ..CreateTopicInput::default()
        }
    }

    #[test]
    fn arn_embeds_region_and_account() {
        let sns = active();
        let arn = sns.create_topic(named("alerts")).unwrap();
        assert_eq!(arn, "arn:aws:sns:eu-west-1:123456789012:alerts");
        assert_eq!(sns.list_topics().unwrap(), vec![arn]);
    }

    #[test]
    fn create_is_idempotent() {
        let sns = active();
        let first = sns.create_topic(named("alerts")).unwrap();
        let second = sns.create_topic(named("alerts")).unwrap();
        assert_eq!(first, second);
        assert_eq!(sns.list_topics().unwrap().len(), 1);
    }

    #[test]
    fn publish_records_messages() {
        let sns = active();
        let arn = sns.create_topic(named("alerts")).unwrap();
        let _ = sns.publish(&arn, "hello").unwrap();
        assert_eq!(sns.published_messages(&arn).unwrap(), vec!["hello"]);
    }

    #[test]
    fn delete_requires_arn() {
        let sns = active();
        let arn = sns.create_topic(named("alerts")).unwrap();
        assert!(sns.delete_topic("alerts").unwrap_err().is_not_found());
        sns.delete_topic(&arn).unwrap();
        assert!(sns.list_topics().unwrap().is_empty());
    }

    #[test]
    fn fifo_topic_requires_suffix() {
        let sns = active();
        let mut input = named("alerts");
        let _ = input.attributes.insert("FifoTopic".into(), "true".into());
        assert!(sns.create_topic(input).is_err());
    }
}
