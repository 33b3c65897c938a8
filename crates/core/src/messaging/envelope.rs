//! The versioned envelope wrapping every cross-service message.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{BeaconError, Result};

/// Message kind constants carried in the `kind` attribute.
pub mod kinds {
    pub const ATTENDANCE_INGESTED: &str = "AttendanceIngested";
    pub const ROSTER_SYNCED: &str = "RosterSynced";
    pub const SEND_MESSAGE_REQUESTED: &str = "SendMessageRequested";
    pub const DELIVERY_UPDATED: &str = "DeliveryUpdated";
    pub const GUARDIAN_REPLY: &str = "GuardianReply";
    pub const GUARDIAN_OPT_OUT: &str = "GuardianOptOut";
    pub const CASE_CREATED: &str = "CaseCreated";
    pub const SAFEGUARDING_ALERT: &str = "SafeguardingAlert";
}

/// Attribute keys used on transport messages.
pub mod attributes {
    pub const KIND: &str = "kind";
    pub const VERSION: &str = "version";
    pub const TENANT_ID: &str = "tenantId";
    pub const SCHOOL_ID: &str = "schoolId";
    pub const CORRELATION_ID: &str = "correlationId";
    pub const OCCURRED_AT: &str = "occurredAt";
}

/// Schema version stamped on envelopes until a breaking payload change.
pub const SCHEMA_VERSION: &str = "1";

/// A typed, immutable wrapper around one cross-service message.
///
/// Tenant and school ids are validated at construction; an envelope that
/// exists is safe to hand to the publisher.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    kind: &'static str,
    version: String,
    tenant_id: Uuid,
    school_id: Uuid,
    correlation_id: String,
    occurred_at: DateTime<Utc>,
    payload: T,
}

impl<T: Serialize> Envelope<T> {
    /// Wrap a payload for publication. Rejects nil tenant or school ids;
    /// a fresh correlation id is generated when none is supplied.
    pub fn new(
        kind: &'static str,
        tenant_id: Uuid,
        school_id: Uuid,
        correlation_id: Option<String>,
        payload: T,
    ) -> Result<Self> {
        if tenant_id.is_nil() {
            return Err(BeaconError::Messaging(
                "envelope requires a non-nil tenant id".to_string(),
            ));
        }
        if school_id.is_nil() {
            return Err(BeaconError::Messaging(
                "envelope requires a non-nil school id".to_string(),
            ));
        }
        Ok(Self {
            kind,
            version: SCHEMA_VERSION.to_string(),
            tenant_id,
            school_id,
            correlation_id: correlation_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            occurred_at: Utc::now(),
            payload,
        })
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn tenant_id(&self) -> Uuid {
        self.tenant_id
    }

    pub fn school_id(&self) -> Uuid {
        self.school_id
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Serialize the payload (not the envelope) to its canonical JSON body.
    pub fn payload_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.payload)
            .map_err(|e| BeaconError::Serialization(format!("failed to serialize payload: {e}")))
    }
}
