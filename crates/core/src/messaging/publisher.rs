//! Envelope publisher with per-topic sender caching.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::SecondsFormat;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::error::Result;
use crate::messaging::broker::{Broker, TopicSender, TransportMessage};
use crate::messaging::envelope::{attributes, Envelope};
use crate::messaging::topics::topic_for_kind;

/// Publishes envelopes to the broker, reusing one sender per topic.
///
/// The publisher performs no internal retry: publish is not naturally
/// idempotent, so retry policy belongs to the caller. Transport errors
/// are logged with kind/correlation context and propagated unmodified.
pub struct MessagePublisher {
    broker: Arc<dyn Broker>,
    senders: RwLock<HashMap<&'static str, Arc<dyn TopicSender>>>,
}

impl MessagePublisher {
    pub fn new(broker: Arc<dyn Broker>) -> Self {
        Self {
            broker,
            senders: RwLock::new(HashMap::new()),
        }
    }

    /// Serialize the envelope's payload, attach its scalar fields as
    /// message attributes, and send to the topic mapped from the kind.
    /// Exactly one network send per call.
    pub async fn publish<T: Serialize>(&self, envelope: &Envelope<T>) -> Result<()> {
        let topic = topic_for_kind(envelope.kind())?;
        let body = envelope.payload_bytes()?;

        let mut attrs = HashMap::new();
        attrs.insert(attributes::KIND.to_string(), envelope.kind().to_string());
        attrs.insert(
            attributes::VERSION.to_string(),
            envelope.version().to_string(),
        );
        attrs.insert(
            attributes::TENANT_ID.to_string(),
            envelope.tenant_id().to_string(),
        );
        attrs.insert(
            attributes::SCHOOL_ID.to_string(),
            envelope.school_id().to_string(),
        );
        attrs.insert(
            attributes::CORRELATION_ID.to_string(),
            envelope.correlation_id().to_string(),
        );
        attrs.insert(
            attributes::OCCURRED_AT.to_string(),
            envelope
                .occurred_at()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        );

        let message = TransportMessage {
            body,
            subject: Some(envelope.kind().to_string()),
            attributes: attrs,
        };

        let sender = self.sender_for(topic).await?;
        if let Err(e) = sender.send(message).await {
            error!(
                kind = envelope.kind(),
                correlation_id = envelope.correlation_id(),
                topic,
                error = %e,
                "Failed to publish message"
            );
            return Err(e);
        }

        debug!(
            kind = envelope.kind(),
            correlation_id = envelope.correlation_id(),
            topic,
            "Published message"
        );
        Ok(())
    }

    /// Get or atomically create the cached sender for a topic. Publishers
    /// may be shared across request tasks, so creation is double-checked
    /// under the write lock.
    async fn sender_for(&self, topic: &'static str) -> Result<Arc<dyn TopicSender>> {
        if let Some(sender) = self.senders.read().await.get(topic) {
            return Ok(sender.clone());
        }

        let mut senders = self.senders.write().await;
        if let Some(sender) = senders.get(topic) {
            return Ok(sender.clone());
        }
        let sender = self.broker.create_sender(topic).await?;
        senders.insert(topic, sender.clone());
        Ok(sender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BeaconError;
    use crate::messaging::broker::InMemoryBroker;
    use crate::messaging::envelope::kinds;
    use crate::messaging::topics::{TOPIC_COMMS, TOPIC_WORKFLOW};
    use crate::models::events::{CaseCreatedEvent, SendMessageRequestedEvent};
    use chrono::Utc;
    use uuid::Uuid;

    fn case_event() -> CaseCreatedEvent {
        CaseCreatedEvent {
            case_id: Uuid::new_v4(),
            student_external_id: "A1".to_string(),
            tier: 1,
            opened_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn publish_sets_body_and_attributes() {
        let broker = InMemoryBroker::new();
        let mut receiver = broker.subscribe(TOPIC_WORKFLOW, "cases").await.unwrap();
        let publisher = MessagePublisher::new(Arc::new(broker));

        let tenant = Uuid::new_v4();
        let school = Uuid::new_v4();
        let event = case_event();
        let envelope = Envelope::new(
            kinds::CASE_CREATED,
            tenant,
            school,
            Some("corr-42".to_string()),
            event.clone(),
        )
        .unwrap();

        publisher.publish(&envelope).await.unwrap();

        let msg = receiver.receive().await.unwrap();
        assert_eq!(msg.message.subject.as_deref(), Some("CaseCreated"));
        let attrs = &msg.message.attributes;
        assert_eq!(attrs.get(attributes::KIND).unwrap(), "CaseCreated");
        assert_eq!(attrs.get(attributes::VERSION).unwrap(), "1");
        assert_eq!(attrs.get(attributes::TENANT_ID).unwrap(), &tenant.to_string());
        assert_eq!(attrs.get(attributes::SCHOOL_ID).unwrap(), &school.to_string());
        assert_eq!(attrs.get(attributes::CORRELATION_ID).unwrap(), "corr-42");
        assert!(attrs.get(attributes::OCCURRED_AT).unwrap().ends_with('Z'));

        // Body is the payload alone, not the envelope.
        let back: CaseCreatedEvent = serde_json::from_slice(&msg.message.body).unwrap();
        assert_eq!(back, event);
    }

    #[tokio::test]
    async fn publish_routes_by_kind() {
        let broker = InMemoryBroker::new();
        let mut comms = broker.subscribe(TOPIC_COMMS, "dispatch").await.unwrap();
        let publisher = MessagePublisher::new(Arc::new(broker));

        let envelope = Envelope::new(
            kinds::SEND_MESSAGE_REQUESTED,
            Uuid::new_v4(),
            Uuid::new_v4(),
            None,
            SendMessageRequestedEvent {
                student_external_id: "A1".to_string(),
                contact_external_id: "C1".to_string(),
                channel: "sms".to_string(),
                template: "absence-alert".to_string(),
                parameters: serde_json::Value::Null,
            },
        )
        .unwrap();

        publisher.publish(&envelope).await.unwrap();
        let msg = comms.receive().await.unwrap();
        assert_eq!(
            msg.message.attributes.get(attributes::KIND).unwrap(),
            "SendMessageRequested"
        );
    }

    #[tokio::test]
    async fn unknown_kind_fails_before_send() {
        let broker = InMemoryBroker::new();
        let publisher = MessagePublisher::new(Arc::new(broker.clone()));

        let envelope = Envelope::new(
            "BellRang",
            Uuid::new_v4(),
            Uuid::new_v4(),
            None,
            case_event(),
        )
        .unwrap();

        let err = publisher.publish(&envelope).await.unwrap_err();
        assert!(matches!(err, BeaconError::UnknownMessageKind(_)));
    }

    #[tokio::test]
    async fn sender_is_cached_per_topic() {
        let broker = InMemoryBroker::new();
        broker.subscribe(TOPIC_WORKFLOW, "cases").await.unwrap();
        let publisher = MessagePublisher::new(Arc::new(broker.clone()));

        for _ in 0..3 {
            let envelope = Envelope::new(
                kinds::CASE_CREATED,
                Uuid::new_v4(),
                Uuid::new_v4(),
                None,
                case_event(),
            )
            .unwrap();
            publisher.publish(&envelope).await.unwrap();
        }

        assert_eq!(publisher.senders.read().await.len(), 1);
        assert_eq!(broker.pending(TOPIC_WORKFLOW, "cases").await, 3);
    }
}
