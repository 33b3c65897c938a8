use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A guardian contact linked to a student, keyed by the external provider
/// id within one tenant/school.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GuardianContact {
    pub external_id: String,
    pub school_id: Uuid,
    pub student_external_id: String,
    pub first_name: String,
    pub last_name: String,
    /// Relationship to the student as reported by the provider
    /// (e.g., "Mother", "Carer").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<String>,
    /// Contact order for notifications; 1 is first.
    pub priority: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Guardian has opted out of outbound messaging.
    pub opted_out: bool,
    pub updated_at: DateTime<Utc>,
}

impl GuardianContact {
    pub fn differs_from(&self, other: &GuardianContact) -> bool {
        self.student_external_id != other.student_external_id
            || self.first_name != other.first_name
            || self.last_name != other.last_name
            || self.relationship != other.relationship
            || self.priority != other.priority
            || self.email != other.email
            || self.phone != other.phone
            || self.opted_out != other.opted_out
    }
}
