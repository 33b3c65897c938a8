//! Broker transport abstraction and the in-process implementation.
//!
//! The platform assumes an at-least-once broker: topics fan out to named
//! subscriptions, delivery counts track redelivery, and dead-lettering
//! takes a reason code plus a free-text description. [`InMemoryBroker`]
//! implements the contract for local mode and tests; a real broker
//! binding is another implementation of the same traits.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use crate::error::{BeaconError, Result};

/// A message as it travels through the broker: a payload body plus
/// routing/scope attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportMessage {
    pub body: Vec<u8>,
    pub subject: Option<String>,
    pub attributes: HashMap<String, String>,
}

/// A message leased from a subscription, pending settlement.
#[derive(Debug)]
pub struct ReceivedMessage {
    pub message: TransportMessage,
    /// Number of times this message has been delivered, counting this
    /// delivery.
    pub delivery_count: u32,
}

/// A message moved to the dead-letter queue, with why.
#[derive(Debug, Clone)]
pub struct DeadLetteredMessage {
    pub message: TransportMessage,
    pub delivery_count: u32,
    pub reason: String,
    pub description: String,
}

/// Sends messages to one topic. Cheap to clone behind an `Arc`; safe for
/// concurrent use.
#[async_trait]
pub trait TopicSender: Send + Sync {
    async fn send(&self, message: TransportMessage) -> Result<()>;
}

/// Receives and settles messages from one (topic, subscription) pair.
#[async_trait]
pub trait SubscriptionReceiver: Send {
    /// Wait for the next message. Callers race this against a shutdown
    /// signal; the receiver itself waits indefinitely.
    async fn receive(&mut self) -> Result<ReceivedMessage>;

    /// Settle successfully: remove the message from the subscription.
    async fn complete(&mut self, message: ReceivedMessage) -> Result<()>;

    /// Return the message for redelivery, preserving its delivery count.
    async fn abandon(&mut self, message: ReceivedMessage) -> Result<()>;

    /// Move the message to the subscription's dead-letter queue.
    async fn dead_letter(
        &mut self,
        message: ReceivedMessage,
        reason: &str,
        description: &str,
    ) -> Result<()>;
}

/// Connection-level broker handle: creates senders and subscriptions.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn create_sender(&self, topic: &str) -> Result<Arc<dyn TopicSender>>;
    async fn subscribe(&self, topic: &str, subscription: &str)
        -> Result<Box<dyn SubscriptionReceiver>>;
}

#[derive(Default)]
struct SubscriptionQueue {
    queue: Mutex<VecDeque<ReceivedMessage>>,
    dead_letters: Mutex<Vec<DeadLetteredMessage>>,
    notify: Notify,
}

impl SubscriptionQueue {
    async fn push(&self, message: ReceivedMessage) {
        self.queue.lock().await.push_back(message);
        self.notify.notify_one();
    }
}

#[derive(Default)]
struct BrokerState {
    // topic -> subscription name -> queue
    topics: HashMap<String, HashMap<String, Arc<SubscriptionQueue>>>,
}

/// In-process broker with at-least-once semantics.
///
/// Messages sent to a topic fan out to every subscription that exists at
/// send time, matching real broker behavior where a subscription only
/// sees messages sent after it was created.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    async fn subscription(&self, topic: &str, subscription: &str) -> Arc<SubscriptionQueue> {
        let mut state = self.state.lock().await;
        state
            .topics
            .entry(topic.to_string())
            .or_default()
            .entry(subscription.to_string())
            .or_default()
            .clone()
    }

    /// Inspect a subscription's dead-letter queue (test/operator support).
    pub async fn dead_letters(&self, topic: &str, subscription: &str) -> Vec<DeadLetteredMessage> {
        self.subscription(topic, subscription)
            .await
            .dead_letters
            .lock()
            .await
            .clone()
    }

    /// Number of messages waiting on a subscription.
    pub async fn pending(&self, topic: &str, subscription: &str) -> usize {
        self.subscription(topic, subscription)
            .await
            .queue
            .lock()
            .await
            .len()
    }
}

struct InMemorySender {
    broker: InMemoryBroker,
    topic: String,
}

#[async_trait]
impl TopicSender for InMemorySender {
    async fn send(&self, message: TransportMessage) -> Result<()> {
        let subscriptions: Vec<Arc<SubscriptionQueue>> = {
            let state = self.broker.state.lock().await;
            state
                .topics
                .get(&self.topic)
                .map(|subs| subs.values().cloned().collect())
                .unwrap_or_default()
        };
        for sub in subscriptions {
            sub.push(ReceivedMessage {
                message: message.clone(),
                delivery_count: 0,
            })
            .await;
        }
        Ok(())
    }
}

struct InMemoryReceiver {
    queue: Arc<SubscriptionQueue>,
}

#[async_trait]
impl SubscriptionReceiver for InMemoryReceiver {
    async fn receive(&mut self) -> Result<ReceivedMessage> {
        loop {
            let notified = self.queue.notify.notified();
            if let Some(mut msg) = self.queue.queue.lock().await.pop_front() {
                msg.delivery_count += 1;
                return Ok(msg);
            }
            notified.await;
        }
    }

    async fn complete(&mut self, _message: ReceivedMessage) -> Result<()> {
        Ok(())
    }

    async fn abandon(&mut self, message: ReceivedMessage) -> Result<()> {
        self.queue.push(message).await;
        Ok(())
    }

    async fn dead_letter(
        &mut self,
        message: ReceivedMessage,
        reason: &str,
        description: &str,
    ) -> Result<()> {
        self.queue.dead_letters.lock().await.push(DeadLetteredMessage {
            message: message.message,
            delivery_count: message.delivery_count,
            reason: reason.to_string(),
            description: description.to_string(),
        });
        Ok(())
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    async fn create_sender(&self, topic: &str) -> Result<Arc<dyn TopicSender>> {
        if topic.is_empty() {
            return Err(BeaconError::Messaging(
                "topic name must not be empty".to_string(),
            ));
        }
        Ok(Arc::new(InMemorySender {
            broker: self.clone(),
            topic: topic.to_string(),
        }))
    }

    async fn subscribe(
        &self,
        topic: &str,
        subscription: &str,
    ) -> Result<Box<dyn SubscriptionReceiver>> {
        if topic.is_empty() || subscription.is_empty() {
            return Err(BeaconError::Messaging(
                "topic and subscription names must not be empty".to_string(),
            ));
        }
        let queue = self.subscription(topic, subscription).await;
        Ok(Box::new(InMemoryReceiver { queue }))
    }
}
