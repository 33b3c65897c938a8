//! Wire models for the Wonde-style SIS HTTP API.
//!
//! Responses are `{ data: [...], meta: { pagination: { next, more,
//! per_page, current_page } } }` with cursor-style continuation links.

use serde::Deserialize;

/// One page of a paginated response.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

#[derive(Debug, Deserialize)]
pub struct PageMeta {
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    /// Opaque continuation URL; must be present when `more` is true.
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub more: bool,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub current_page: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WondeStudent {
    pub id: String,
    pub forename: String,
    pub surname: String,
    #[serde(default)]
    pub middle_names: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<WondeDate>,
    #[serde(default)]
    pub year_group: Option<String>,
    #[serde(default)]
    pub registration_group: Option<String>,
    /// Absent means enrolled.
    #[serde(default)]
    pub leaving_date: Option<WondeDate>,
}

/// Provider timestamps arrive as `{ "date": "2026-01-15 08:30:00.000000" }`.
#[derive(Debug, Clone, Deserialize)]
pub struct WondeDate {
    pub date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WondeContact {
    pub id: String,
    pub forename: String,
    pub surname: String,
    #[serde(default)]
    pub relationship: Option<WondeRelationship>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub opted_out: bool,
    /// Student ids this contact is linked to (from the students include).
    #[serde(default)]
    pub students: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WondeRelationship {
    #[serde(default)]
    pub relationship: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WondeAttendanceMark {
    pub id: String,
    pub student: String,
    /// Session date, `yyyy-MM-dd`.
    pub date: String,
    /// "AM" or "PM".
    pub session: String,
    pub code: String,
    pub present: bool,
    #[serde(default)]
    pub authorised: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WondeClass {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub students: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WondeLesson {
    pub id: String,
    pub class: String,
    /// ISO weekday, 1 = Monday.
    pub day: u8,
    /// `HH:MM:SS`.
    pub start_at: String,
    pub end_at: String,
    #[serde(default)]
    pub room: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_with_pagination_deserializes() {
        let json = r#"{
            "data": [{"id": "A1", "forename": "Amira", "surname": "Khan"}],
            "meta": {
                "pagination": {
                    "next": "https://api.wonde.com/v1/schools/S1/students?page=2",
                    "more": true,
                    "per_page": 50,
                    "current_page": 1
                }
            }
        }"#;
        let page: Page<WondeStudent> = serde_json::from_str(json).unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].id, "A1");
        let pagination = page.meta.unwrap().pagination;
        assert!(pagination.more);
        assert!(pagination.next.unwrap().contains("page=2"));
        assert_eq!(pagination.per_page, Some(50));
    }

    #[test]
    fn page_without_meta_deserializes() {
        let json = r#"{"data": []}"#;
        let page: Page<WondeStudent> = serde_json::from_str(json).unwrap();
        assert!(page.data.is_empty());
        assert!(page.meta.is_none());
    }

    #[test]
    fn student_optional_fields_default() {
        let json = r#"{"id": "A1", "forename": "Amira", "surname": "Khan"}"#;
        let student: WondeStudent = serde_json::from_str(json).unwrap();
        assert!(student.middle_names.is_none());
        assert!(student.date_of_birth.is_none());
        assert!(student.leaving_date.is_none());
    }

    #[test]
    fn contact_with_relationship() {
        let json = r#"{
            "id": "C1",
            "forename": "Yasmin",
            "surname": "Khan",
            "relationship": {"relationship": "Mother", "priority": 1},
            "email": "yasmin@example.com",
            "students": ["A1"]
        }"#;
        let contact: WondeContact = serde_json::from_str(json).unwrap();
        let rel = contact.relationship.unwrap();
        assert_eq!(rel.relationship.as_deref(), Some("Mother"));
        assert_eq!(rel.priority, Some(1));
        assert_eq!(contact.students, vec!["A1"]);
        assert!(!contact.opted_out);
    }

    #[test]
    fn attendance_mark_deserializes() {
        let json = r#"{
            "id": "att-1",
            "student": "A1",
            "date": "2026-01-15",
            "session": "AM",
            "code": "N",
            "present": false,
            "authorised": false
        }"#;
        let mark: WondeAttendanceMark = serde_json::from_str(json).unwrap();
        assert_eq!(mark.student, "A1");
        assert_eq!(mark.session, "AM");
        assert!(!mark.present);
    }

    #[test]
    fn lesson_deserializes() {
        let json = r#"{
            "id": "les-1",
            "class": "cls-10",
            "day": 1,
            "start_at": "09:00:00",
            "end_at": "10:00:00",
            "room": "M4"
        }"#;
        let lesson: WondeLesson = serde_json::from_str(json).unwrap();
        assert_eq!(lesson.class, "cls-10");
        assert_eq!(lesson.day, 1);
    }
}
