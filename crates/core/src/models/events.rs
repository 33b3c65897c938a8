//! Payload types published through the message envelope.
//!
//! Each payload travels as the JSON body of a transport message whose
//! attributes come from the envelope. Downstream consumers deserialize
//! into these shapes by kind.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::sync::SyncKind;

/// Summary published after a successful roster/contacts/classes/timetable
/// sync run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RosterSyncedEvent {
    pub run_id: Uuid,
    pub school_id: Uuid,
    pub kind: SyncKind,
    pub inserted: i64,
    pub updated: i64,
    pub skipped: i64,
}

/// Summary published after a successful attendance sync run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceIngestedEvent {
    pub run_id: Uuid,
    pub school_id: Uuid,
    pub session_date: NaiveDate,
    pub inserted: i64,
    pub updated: i64,
    pub skipped: i64,
}

/// Request to send an outbound guardian message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequestedEvent {
    pub student_external_id: String,
    pub contact_external_id: String,
    pub channel: String,
    pub template: String,
    #[serde(default)]
    pub parameters: serde_json::Value,
}

/// Provider delivery-status update for an outbound message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryUpdatedEvent {
    pub message_id: Uuid,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

/// Inbound reply from a guardian.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GuardianReplyEvent {
    pub contact_external_id: String,
    pub body: String,
    pub received_at: DateTime<Utc>,
}

/// Guardian opted out of a messaging channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GuardianOptOutEvent {
    pub contact_external_id: String,
    pub channel: String,
}

/// An attendance case was opened for a student.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CaseCreatedEvent {
    pub case_id: Uuid,
    pub student_external_id: String,
    pub tier: i32,
    pub opened_at: DateTime<Utc>,
}

/// A safeguarding alert requiring staff attention.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SafeguardingAlertEvent {
    pub case_id: Uuid,
    pub student_external_id: String,
    pub reason: String,
    pub raised_at: DateTime<Utc>,
}
