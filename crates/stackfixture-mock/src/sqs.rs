//! Queue mock (`sqs`).

use std::collections::{BTreeMap, VecDeque};

use stackfixture_common::constants::MOCK_ACCOUNT_ID;
use stackfixture_common::error::BackendError;
use uuid::Uuid;

use crate::service::Service;

const SERVICE: &str = "sqs";

/// Parameters of `CreateQueue`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateQueueInput {
    /// Queue name; FIFO queues must end in `.fifo`.
    pub queue_name: String,
    /// Queue attributes, values in their wire string form.
    pub attributes: BTreeMap<String, String>,
    /// Resource tags.
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug)]
struct Queue {
    name: String,
    attributes: BTreeMap<String, String>,
    tags: BTreeMap<String, String>,
    messages: VecDeque<(String, String)>,
}

/// Mocked message queue service.
#[derive(Debug, Clone)]
pub struct Sqs {
    service: Service<BTreeMap<String, Queue>>,
}

impl Sqs {
    pub(crate) fn new() -> Self {
        Self {
            service: Service::new(SERVICE),
        }
    }

    /// Activates the service. Returns `false` if it was already active.
    pub fn activate(&self) -> bool {
        self.service.start()
    }

    /// Deactivates the service, discarding every queue.
    pub fn deactivate(&self) {
        self.service.stop();
    }

    /// Returns whether the service is active.
    pub fn is_active(&self) -> bool {
        self.service.is_active()
    }

    /// Creates a queue and returns its URL.
    ///
    /// Re-creating a queue with identical attributes returns the existing URL.
    ///
    /// # Errors
    ///
    /// Returns an error if a queue of that name exists with different
    /// attributes, or a FIFO queue name lacks the `.fifo` suffix.
    pub fn create_queue(&self, input: CreateQueueInput) -> Result<String, BackendError> {
        let fifo = input
            .attributes
            .get("FifoQueue")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));
        if fifo != input.queue_name.ends_with(".fifo") {
            return Err(BackendError::Validation {
                service: SERVICE,
                message: format!(
                    "queue {} must set FifoQueue exactly when named *.fifo",
                    input.queue_name
                ),
            });
        }
        let url = queue_url(&input.queue_name);
        self.service.with(|queues| {
            if let Some(existing) = queues.get(&url) {
                if existing.attributes == input.attributes {
                    return Ok(url.clone());
                }
                return Err(BackendError::AlreadyExists {
                    service: SERVICE,
                    kind: "queue",
                    id: input.queue_name.clone(),
                });
            }
            let _ = queues.insert(
                url.clone(),
                Queue {
                    name: input.queue_name,
                    attributes: input.attributes,
                    tags: input.tags,
                    messages: VecDeque::new(),
                },
            );
            Ok(url.clone())
        })
    }

    /// Resolves a queue name to its URL.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no queue has that name.
    pub fn get_queue_url(&self, name: &str) -> Result<String, BackendError> {
        self.service.with(|queues| {
            queues
                .values()
                .find(|queue| queue.name == name)
                .map(|queue| queue_url(&queue.name))
                .ok_or_else(|| not_found(name))
        })
    }

    /// Deletes a queue by URL.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the URL names no queue.
    pub fn delete_queue(&self, url: &str) -> Result<(), BackendError> {
        self.service
            .with(|queues| queues.remove(url).map(|_| ()).ok_or_else(|| not_found(url)))
    }

    /// Lists queue URLs.
    ///
    /// # Errors
    ///
    /// Returns an error if the service is inactive.
    pub fn list_queues(&self) -> Result<Vec<String>, BackendError> {
        self.service.with(|queues| Ok(queues.keys().cloned().collect()))
    }

    /// Returns the attributes a queue was created with.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the URL names no queue.
    pub fn get_queue_attributes(&self, url: &str) -> Result<BTreeMap<String, String>, BackendError> {
        self.service.with(|queues| {
            let queue = queues.get(url).ok_or_else(|| not_found(url))?;
            let mut attributes = queue.attributes.clone();
            let _ = attributes.insert(
                "ApproximateNumberOfMessages".into(),
                queue.messages.len().to_string(),
            );
            Ok(attributes)
        })
    }

    /// Returns the tags a queue was created with.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the URL names no queue.
    pub fn list_queue_tags(&self, url: &str) -> Result<BTreeMap<String, String>, BackendError> {
        self.service.with(|queues| {
            queues
                .get(url)
                .map(|queue| queue.tags.clone())
                .ok_or_else(|| not_found(url))
        })
    }

    /// Enqueues a message and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the URL names no queue.
    pub fn send_message(&self, url: &str, body: impl Into<String>) -> Result<String, BackendError> {
        let body = body.into();
        self.service.with(|queues| {
            let queue = queues.get_mut(url).ok_or_else(|| not_found(url))?;
            let id = Uuid::new_v4().to_string();
            queue.messages.push_back((id.clone(), body));
            Ok(id)
        })
    }

    /// Dequeues up to `max` messages as `(id, body)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the URL names no queue.
    pub fn receive_messages(&self, url: &str, max: usize) -> Result<Vec<(String, String)>, BackendError> {
        self.service.with(|queues| {
            let queue = queues.get_mut(url).ok_or_else(|| not_found(url))?;
            let count = max.min(queue.messages.len());
            Ok(queue.messages.drain(..count).collect())
        })
    }
}

fn queue_url(name: &str) -> String {
    format!("https://queue.amazonaws.com/{MOCK_ACCOUNT_ID}/{name}")
}

fn not_found(id: &str) -> BackendError {
    BackendError::NotFound {
        service: SERVICE,
        kind: "queue",
        id: id.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active() -> Sqs {
        let sqs = Sqs::new();
        let _ = sqs.activate();
        sqs
    }

    fn named(name: &str) -> CreateQueueInput {
        CreateQueueInput {
            queue_name: name.into(),
            ..CreateQueueInput::default()
        }
    }

    #[test]
    fn create_returns_account_scoped_url() {
        let sqs = active();
        let url = sqs.create_queue(named("jobs")).unwrap();
        assert_eq!(url, "https://queue.amazonaws.com/123456789012/jobs");
        assert_eq!(sqs.get_queue_url("jobs").unwrap(), url);
    }

    #[test]
    fn recreate_with_same_attributes_is_idempotent() {
        let sqs = active();
        let first = sqs.create_queue(named("jobs")).unwrap();
        let second = sqs.create_queue(named("jobs")).unwrap();
        assert_eq!(first, second);
        assert_eq!(sqs.list_queues().unwrap().len(), 1);
    }

    #[test]
    fn recreate_with_other_attributes_conflicts() {
        let sqs = active();
        let _ = sqs.create_queue(named("jobs")).unwrap();
        let mut input = named("jobs");
        let _ = input.attributes.insert("DelaySeconds".into(), "5".into());
        assert!(matches!(
            sqs.create_queue(input),
            Err(BackendError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn fifo_attribute_requires_suffix() {
        let sqs = active();
        let mut input = named("jobs");
        let _ = input.attributes.insert("FifoQueue".into(), "true".into());
        assert!(sqs.create_queue(input.clone()).is_err());
        input.queue_name = "jobs.fifo".into();
        assert!(sqs.create_queue(input).is_ok());
    }

    #[test]
    fn messages_are_counted_and_drained() {
        let sqs = active();
        let url = sqs.create_queue(named("jobs")).unwrap();
        let _ = sqs.send_message(&url, "one").unwrap();
        let _ = sqs.send_message(&url, "two").unwrap();
        let attrs = sqs.get_queue_attributes(&url).unwrap();
        assert_eq!(attrs["ApproximateNumberOfMessages"], "2");
        let received = sqs.receive_messages(&url, 10).unwrap();
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].1, "one");
    }

    #[test]
    fn deleted_queue_is_not_found() {
        let sqs = active();
        let url = sqs.create_queue(named("jobs")).unwrap();
        sqs.delete_queue(&url).unwrap();
        assert!(sqs.get_queue_url("jobs").unwrap_err().is_not_found());
    }
}
