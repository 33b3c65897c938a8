use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Morning or afternoon registration session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionPeriod {
    Am,
    Pm,
}

/// One attendance mark for a student on one session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub external_id: String,
    pub school_id: Uuid,
    pub student_external_id: String,
    pub session_date: NaiveDate,
    pub period: SessionPeriod,
    /// Provider attendance code (e.g., "/", "N", "I").
    pub code: String,
    pub present: bool,
    /// Whether an absence was authorised. Meaningless when present.
    pub authorised: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    pub fn differs_from(&self, other: &AttendanceRecord) -> bool {
        self.student_external_id != other.student_external_id
            || self.session_date != other.session_date
            || self.period != other.period
            || self.code != other.code
            || self.present != other.present
            || self.authorised != other.authorised
            || self.comment != other.comment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_record() -> AttendanceRecord {
        AttendanceRecord {
            external_id: "att-9001".to_string(),
            school_id: Uuid::new_v4(),
            student_external_id: "A1234567890".to_string(),
            session_date: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
            period: SessionPeriod::Am,
            code: "N".to_string(),
            present: false,
            authorised: false,
            comment: None,
            updated_at: Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn session_period_serialization() {
        assert_eq!(serde_json::to_string(&SessionPeriod::Am).unwrap(), "\"AM\"");
        assert_eq!(serde_json::to_string(&SessionPeriod::Pm).unwrap(), "\"PM\"");
    }

    #[test]
    fn record_round_trip() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let back: AttendanceRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn record_camel_case_fields() {
        let json = serde_json::to_string(&sample_record()).unwrap();
        assert!(json.contains("\"sessionDate\""));
        assert!(json.contains("\"studentExternalId\""));
    }

    #[test]
    fn differs_on_code_change() {
        let a = sample_record();
        let mut b = a.clone();
        b.code = "I".to_string();
        b.authorised = true;
        assert!(a.differs_from(&b));
    }
}
