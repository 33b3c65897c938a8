use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A student roster record, keyed by the external provider id within one
/// tenant/school.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub external_id: String,
    pub school_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_group: Option<String>,
    pub active: bool,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// Whether a freshly fetched record differs from the persisted one in
    /// any provider-owned field. `updated_at` is ours, not the provider's,
    /// so it does not participate.
    pub fn differs_from(&self, other: &Student) -> bool {
        self.first_name != other.first_name
            || self.last_name != other.last_name
            || self.middle_name != other.middle_name
            || self.date_of_birth != other.date_of_birth
            || self.year_group != other.year_group
            || self.registration_group != other.registration_group
            || self.active != other.active
    }
}
