use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A school registered with the platform, linking our school id to the
/// external provider's identifier and API home domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchoolRegistration {
    pub school_id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    /// The provider-side school identifier used in resource URLs.
    pub provider_school_id: String,
    /// API home domain for this school (e.g., "api.wonde.com").
    pub domain: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn registration_round_trip() {
        let reg = SchoolRegistration {
            school_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "Hillcrest Primary".to_string(),
            provider_school_id: "A1930499544".to_string(),
            domain: "api.wonde.com".to_string(),
            active: true,
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
        };
        let json = serde_json::to_string(&reg).unwrap();
        assert!(json.contains("\"providerSchoolId\""));
        let back: SchoolRegistration = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reg);
    }
}
