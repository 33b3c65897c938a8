use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A teaching class (group of students with a subject), keyed by the
/// external provider id within one tenant/school.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchoolClass {
    pub external_id: String,
    pub school_id: Uuid,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default)]
    pub student_external_ids: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl SchoolClass {
    pub fn differs_from(&self, other: &SchoolClass) -> bool {
        self.name != other.name
            || self.subject != other.subject
            || self.student_external_ids != other.student_external_ids
    }
}

/// One scheduled lesson slot for a class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TimetableEntry {
    pub external_id: String,
    pub school_id: Uuid,
    pub class_external_id: String,
    /// ISO weekday, 1 = Monday.
    pub weekday: u8,
    pub starts_at: NaiveTime,
    pub ends_at: NaiveTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl TimetableEntry {
    pub fn differs_from(&self, other: &TimetableEntry) -> bool {
        self.class_external_id != other.class_external_id
            || self.weekday != other.weekday
            || self.starts_at != other.starts_at
            || self.ends_at != other.ends_at
            || self.room != other.room
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_class() -> SchoolClass {
        SchoolClass {
            external_id: "cls-10".to_string(),
            school_id: Uuid::new_v4(),
            name: "Year 6 Maths".to_string(),
            subject: Some("Mathematics".to_string()),
            student_external_ids: vec!["A1".to_string(), "A2".to_string()],
            updated_at: Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn class_round_trip() {
        let class = sample_class();
        let json = serde_json::to_string(&class).unwrap();
        let back: SchoolClass = serde_json::from_str(&json).unwrap();
        assert_eq!(back, class);
    }

    #[test]
    fn class_differs_on_membership_change() {
        let a = sample_class();
        let mut b = a.clone();
        b.student_external_ids.push("A3".to_string());
        assert!(a.differs_from(&b));
    }

    #[test]
    fn timetable_entry_round_trip() {
        let entry = TimetableEntry {
            external_id: "les-77".to_string(),
            school_id: Uuid::new_v4(),
            class_external_id: "cls-10".to_string(),
            weekday: 1,
            starts_at: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            ends_at: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            room: Some("M4".to_string()),
            updated_at: Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        let back: TimetableEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
        assert!(json.contains("\"classExternalId\""));
    }

    #[test]
    fn timetable_differs_on_room_move() {
        let a = TimetableEntry {
            external_id: "les-77".to_string(),
            school_id: Uuid::new_v4(),
            class_external_id: "cls-10".to_string(),
            weekday: 2,
            starts_at: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            ends_at: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            room: Some("M4".to_string()),
            updated_at: Utc::now(),
        };
        let mut b = a.clone();
        b.room = Some("S1".to_string());
        assert!(a.differs_from(&b));
    }
}
