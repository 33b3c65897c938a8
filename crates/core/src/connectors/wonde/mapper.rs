//! Normalization from Wonde wire models into Beacon domain models.
//!
//! Mapping is per-record fallible: a malformed record yields an error the
//! orchestrator counts without failing the whole run.

use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::error::{BeaconError, Result};
use crate::models::attendance::{AttendanceRecord, SessionPeriod};
use crate::models::contact::GuardianContact;
use crate::models::school_class::{SchoolClass, TimetableEntry};
use crate::models::student::Student;

use super::models::{
    WondeAttendanceMark, WondeClass, WondeContact, WondeDate, WondeLesson, WondeStudent,
};

fn parse_wonde_date(value: &WondeDate) -> Result<NaiveDate> {
    // Provider timestamps look like "2014-09-03 00:00:00.000000"; the
    // date is the first ten characters.
    let date_part = value.date.get(..10).unwrap_or(&value.date);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|e| BeaconError::Sync(format!("unparseable provider date '{}': {e}", value.date)))
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .map_err(|e| BeaconError::Sync(format!("unparseable provider time '{value}': {e}")))
}

pub fn map_student(school_id: Uuid, raw: &WondeStudent) -> Result<Student> {
    let date_of_birth = raw
        .date_of_birth
        .as_ref()
        .map(parse_wonde_date)
        .transpose()?;
    Ok(Student {
        external_id: raw.id.clone(),
        school_id,
        first_name: raw.forename.clone(),
        last_name: raw.surname.clone(),
        middle_name: raw.middle_names.clone(),
        date_of_birth,
        year_group: raw.year_group.clone(),
        registration_group: raw.registration_group.clone(),
        active: raw.leaving_date.is_none(),
        updated_at: Utc::now(),
    })
}

/// A contact links to zero or more students; one [`GuardianContact`] row
/// is produced per linked student.
pub fn map_contact(school_id: Uuid, raw: &WondeContact) -> Result<Vec<GuardianContact>> {
    if raw.students.is_empty() {
        return Err(BeaconError::Sync(format!(
            "contact {} is not linked to any student",
            raw.id
        )));
    }
    let relationship = raw
        .relationship
        .as_ref()
        .and_then(|r| r.relationship.clone());
    let priority = raw
        .relationship
        .as_ref()
        .and_then(|r| r.priority)
        .unwrap_or(1);
    Ok(raw
        .students
        .iter()
        .map(|student_id| GuardianContact {
            external_id: format!("{}:{}", raw.id, student_id),
            school_id,
            student_external_id: student_id.clone(),
            first_name: raw.forename.clone(),
            last_name: raw.surname.clone(),
            relationship: relationship.clone(),
            priority,
            email: raw.email.clone(),
            phone: raw.telephone.clone(),
            opted_out: raw.opted_out,
            updated_at: Utc::now(),
        })
        .collect())
}

pub fn map_attendance(school_id: Uuid, raw: &WondeAttendanceMark) -> Result<AttendanceRecord> {
    let session_date = NaiveDate::parse_from_str(&raw.date, "%Y-%m-%d").map_err(|e| {
        BeaconError::Sync(format!("unparseable attendance date '{}': {e}", raw.date))
    })?;
    let period = match raw.session.as_str() {
        "AM" => SessionPeriod::Am,
        "PM" => SessionPeriod::Pm,
        other => {
            return Err(BeaconError::Sync(format!(
                "unknown attendance session '{other}' for mark {}",
                raw.id
            )))
        }
    };
    Ok(AttendanceRecord {
        external_id: raw.id.clone(),
        school_id,
        student_external_id: raw.student.clone(),
        session_date,
        period,
        code: raw.code.clone(),
        present: raw.present,
        authorised: raw.authorised,
        comment: raw.comment.clone(),
        updated_at: Utc::now(),
    })
}

pub fn map_class(school_id: Uuid, raw: &WondeClass) -> Result<SchoolClass> {
    Ok(SchoolClass {
        external_id: raw.id.clone(),
        school_id,
        name: raw.name.clone(),
        subject: raw.subject.clone(),
        student_external_ids: raw.students.clone(),
        updated_at: Utc::now(),
    })
}

pub fn map_lesson(school_id: Uuid, raw: &WondeLesson) -> Result<TimetableEntry> {
    if !(1..=7).contains(&raw.day) {
        return Err(BeaconError::Sync(format!(
            "lesson {} has invalid weekday {}",
            raw.id, raw.day
        )));
    }
    Ok(TimetableEntry {
        external_id: raw.id.clone(),
        school_id,
        class_external_id: raw.class.clone(),
        weekday: raw.day,
        starts_at: parse_time(&raw.start_at)?,
        ends_at: parse_time(&raw.end_at)?,
        room: raw.room.clone(),
        updated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn school() -> Uuid {
        Uuid::new_v4()
    }

    #[test]
    fn maps_student_with_birth_date() {
        let raw = WondeStudent {
            id: "A1".to_string(),
            forename: "Amira".to_string(),
            surname: "Khan".to_string(),
            middle_names: None,
            date_of_birth: Some(WondeDate {
                date: "2014-09-03 00:00:00.000000".to_string(),
            }),
            year_group: Some("6".to_string()),
            registration_group: None,
            leaving_date: None,
        };
        let student = map_student(school(), &raw).unwrap();
        assert_eq!(student.external_id, "A1");
        assert_eq!(
            student.date_of_birth,
            NaiveDate::from_ymd_opt(2014, 9, 3)
        );
        assert!(student.active);
    }

    #[test]
    fn leaver_is_inactive() {
        let raw = WondeStudent {
            id: "A1".to_string(),
            forename: "Amira".to_string(),
            surname: "Khan".to_string(),
            middle_names: None,
            date_of_birth: None,
            year_group: None,
            registration_group: None,
            leaving_date: Some(WondeDate {
                date: "2025-07-20 00:00:00.000000".to_string(),
            }),
        };
        assert!(!map_student(school(), &raw).unwrap().active);
    }

    #[test]
    fn bad_birth_date_is_an_error() {
        let raw = WondeStudent {
            id: "A1".to_string(),
            forename: "Amira".to_string(),
            surname: "Khan".to_string(),
            middle_names: None,
            date_of_birth: Some(WondeDate {
                date: "soon".to_string(),
            }),
            year_group: None,
            registration_group: None,
            leaving_date: None,
        };
        assert!(map_student(school(), &raw).is_err());
    }

    #[test]
    fn contact_produces_one_row_per_student() {
        let raw = WondeContact {
            id: "C1".to_string(),
            forename: "Yasmin".to_string(),
            surname: "Khan".to_string(),
            relationship: Some(super::super::models::WondeRelationship {
                relationship: Some("Mother".to_string()),
                priority: Some(2),
            }),
            email: Some("y@example.com".to_string()),
            telephone: None,
            opted_out: false,
            students: vec!["A1".to_string(), "A2".to_string()],
        };
        let contacts = map_contact(school(), &raw).unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[0].external_id, "C1:A1");
        assert_eq!(contacts[1].student_external_id, "A2");
        assert_eq!(contacts[0].priority, 2);
    }

    #[test]
    fn unlinked_contact_is_an_error() {
        let raw = WondeContact {
            id: "C1".to_string(),
            forename: "Yasmin".to_string(),
            surname: "Khan".to_string(),
            relationship: None,
            email: None,
            telephone: None,
            opted_out: false,
            students: vec![],
        };
        assert!(map_contact(school(), &raw).is_err());
    }

    #[test]
    fn maps_attendance_sessions() {
        let raw = WondeAttendanceMark {
            id: "att-1".to_string(),
            student: "A1".to_string(),
            date: "2026-01-15".to_string(),
            session: "PM".to_string(),
            code: "/".to_string(),
            present: true,
            authorised: false,
            comment: None,
        };
        let record = map_attendance(school(), &raw).unwrap();
        assert_eq!(record.period, SessionPeriod::Pm);
        assert!(record.present);
    }

    #[test]
    fn unknown_session_is_an_error() {
        let raw = WondeAttendanceMark {
            id: "att-1".to_string(),
            student: "A1".to_string(),
            date: "2026-01-15".to_string(),
            session: "EVE".to_string(),
            code: "/".to_string(),
            present: true,
            authorised: false,
            comment: None,
        };
        assert!(map_attendance(school(), &raw).is_err());
    }

    #[test]
    fn maps_lesson_times() {
        let raw = WondeLesson {
            id: "les-1".to_string(),
            class: "cls-10".to_string(),
            day: 5,
            start_at: "13:30:00".to_string(),
            end_at: "14:30:00".to_string(),
            room: None,
        };
        let entry = map_lesson(school(), &raw).unwrap();
        assert_eq!(entry.weekday, 5);
        assert_eq!(entry.starts_at, NaiveTime::from_hms_opt(13, 30, 0).unwrap());
    }

    #[test]
    fn invalid_weekday_is_an_error() {
        let raw = WondeLesson {
            id: "les-1".to_string(),
            class: "cls-10".to_string(),
            day: 9,
            start_at: "13:30:00".to_string(),
            end_at: "14:30:00".to_string(),
            room: None,
        };
        assert!(map_lesson(school(), &raw).is_err());
    }
}
