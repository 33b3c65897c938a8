//! Long-running message consumer with bounded retry and dead-lettering.
//!
//! One consumer is bound to one (topic, subscription) pair and processes
//! messages strictly sequentially: handlers mutate tenant-scoped state
//! and must not interleave. Retry is broker-native — a failed message is
//! abandoned for redelivery until the delivery ceiling, then dead-lettered.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::messaging::broker::{Broker, ReceivedMessage, SubscriptionReceiver};
use crate::messaging::envelope::attributes;
use crate::scope::TenantScope;

/// Delivery attempts before a failing message is dead-lettered.
pub const MAX_DELIVERY_ATTEMPTS: u32 = 10;

/// Dead-letter reason codes.
pub mod reasons {
    pub const INVALID_TENANT_ID: &str = "InvalidTenantId";
    pub const MAX_DELIVERY_COUNT_EXCEEDED: &str = "MaxDeliveryCountExceeded";
}

/// Envelope metadata reconstructed from message attributes, handed to the
/// handler alongside the raw payload.
#[derive(Debug, Clone)]
pub struct MessageContext {
    pub kind: String,
    pub version: String,
    pub tenant_id: Uuid,
    pub school_id: Option<Uuid>,
    pub correlation_id: String,
    pub occurred_at: Option<DateTime<Utc>>,
    pub delivery_count: u32,
}

/// What the handler did with a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The message was processed.
    Handled,
    /// The kind is not one this handler recognizes. Expected during
    /// schema evolution; the message is completed, not dead-lettered.
    Ignored,
}

/// Per-service business handler injected into a consumer.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(
        &self,
        ctx: &MessageContext,
        scope: &TenantScope,
        payload: &[u8],
    ) -> Result<Disposition>;
}

/// A consumer loop bound to one (topic, subscription) pair.
pub struct MessageConsumer {
    topic: String,
    subscription: String,
    receiver: Box<dyn SubscriptionReceiver>,
    handler: Box<dyn MessageHandler>,
}

impl MessageConsumer {
    pub async fn new(
        broker: &dyn Broker,
        topic: &str,
        subscription: &str,
        handler: Box<dyn MessageHandler>,
    ) -> Result<Self> {
        let receiver = broker.subscribe(topic, subscription).await?;
        Ok(Self {
            topic: topic.to_string(),
            subscription: subscription.to_string(),
            receiver,
            handler,
        })
    }

    /// Run the receive loop until the shutdown signal flips to `true`.
    ///
    /// Shutdown stops pulling new messages; the message being handled
    /// when the signal arrives finishes naturally.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        info!(
            topic = %self.topic,
            subscription = %self.subscription,
            "Consumer started"
        );
        loop {
            if *shutdown.borrow() {
                break;
            }
            let received = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
                received = self.receiver.receive() => received?,
            };
            self.process(received).await?;
        }
        info!(
            topic = %self.topic,
            subscription = %self.subscription,
            "Consumer stopped"
        );
        Ok(())
    }

    /// The per-message state machine: kind extraction, scope resolution,
    /// dispatch, settlement.
    async fn process(&mut self, message: ReceivedMessage) -> Result<()> {
        let attrs = &message.message.attributes;

        // Kind, falling back to the subject. An empty kind is a poison
        // no-op: there is nothing useful to retry.
        let kind = attrs
            .get(attributes::KIND)
            .filter(|k| !k.is_empty())
            .cloned()
            .or_else(|| message.message.subject.clone().filter(|s| !s.is_empty()));
        let kind = match kind {
            Some(k) => k,
            None => {
                warn!(
                    topic = %self.topic,
                    subscription = %self.subscription,
                    "Message without a kind, completing as no-op"
                );
                return self.receiver.complete(message).await;
            }
        };

        // Tenant scope. A missing or unparseable tenant id is a permanent
        // defect; retrying cannot fix it.
        let scope = match resolve_scope(attrs) {
            Ok(scope) => scope,
            Err(description) => {
                warn!(
                    topic = %self.topic,
                    subscription = %self.subscription,
                    kind = %kind,
                    %description,
                    "Dead-lettering message with invalid tenant id"
                );
                return self
                    .receiver
                    .dead_letter(message, reasons::INVALID_TENANT_ID, &description)
                    .await;
            }
        };

        let ctx = MessageContext {
            kind: kind.clone(),
            version: attrs
                .get(attributes::VERSION)
                .cloned()
                .unwrap_or_else(|| "1".to_string()),
            tenant_id: scope.tenant_id(),
            school_id: scope.school_id(),
            correlation_id: attrs
                .get(attributes::CORRELATION_ID)
                .cloned()
                .unwrap_or_default(),
            occurred_at: attrs
                .get(attributes::OCCURRED_AT)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            delivery_count: message.delivery_count,
        };

        match self
            .handler
            .handle(&ctx, &scope, &message.message.body)
            .await
        {
            Ok(Disposition::Handled) => self.receiver.complete(message).await,
            Ok(Disposition::Ignored) => {
                info!(
                    topic = %self.topic,
                    kind = %ctx.kind,
                    correlation_id = %ctx.correlation_id,
                    "Unrecognized message kind, completing"
                );
                self.receiver.complete(message).await
            }
            Err(e) => {
                if message.delivery_count >= MAX_DELIVERY_ATTEMPTS {
                    error!(
                        topic = %self.topic,
                        kind = %ctx.kind,
                        correlation_id = %ctx.correlation_id,
                        delivery_count = message.delivery_count,
                        error = %e,
                        "Delivery ceiling reached, dead-lettering"
                    );
                    self.receiver
                        .dead_letter(
                            message,
                            reasons::MAX_DELIVERY_COUNT_EXCEEDED,
                            &e.to_string(),
                        )
                        .await
                } else {
                    warn!(
                        topic = %self.topic,
                        kind = %ctx.kind,
                        correlation_id = %ctx.correlation_id,
                        delivery_count = message.delivery_count,
                        error = %e,
                        "Handler failed, abandoning for redelivery"
                    );
                    self.receiver.abandon(message).await
                }
            }
        }
    }
}

/// Build the tenant scope from message attributes. The school id is
/// optional and tolerated as absent when invalid; the tenant id is not.
fn resolve_scope(
    attrs: &std::collections::HashMap<String, String>,
) -> std::result::Result<TenantScope, String> {
    let tenant_id = attrs
        .get(attributes::TENANT_ID)
        .ok_or_else(|| "tenant id attribute missing".to_string())?;
    let tenant_id = Uuid::parse_str(tenant_id)
        .map_err(|_| format!("tenant id attribute is not a valid UUID: {tenant_id}"))?;

    let school_id = attrs
        .get(attributes::SCHOOL_ID)
        .and_then(|s| Uuid::parse_str(s).ok())
        .filter(|u| !u.is_nil());

    TenantScope::new(tenant_id, school_id).map_err(|e| e.to_string())
}
