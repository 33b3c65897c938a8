use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::Result;
use crate::models::attendance::{AttendanceRecord, SessionPeriod};
use crate::models::contact::GuardianContact;
use crate::models::school::SchoolRegistration;
use crate::models::school_class::{SchoolClass, TimetableEntry};
use crate::models::student::Student;
use crate::models::sync::{SyncKind, SyncRunResult};
use crate::scope::TenantScope;

use super::repository::{
    AttendanceRepository, ClassRepository, ContactRepository, PlatformRepository,
    SchoolRepository, StudentRepository, SyncRunRepository, TimetableRepository,
};

#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl PlatformRepository for SqliteRepository {}

// -- Helper functions for encoding values as DB strings --

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn datetime_to_str(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_naive_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .unwrap_or_else(|_| NaiveDate::from_ymd_opt(2000, 1, 1).unwrap())
}

fn naive_date_to_str(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

fn parse_naive_time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .unwrap_or_else(|_| NaiveTime::from_hms_opt(0, 0, 0).unwrap())
}

fn naive_time_to_str(t: &NaiveTime) -> String {
    t.format("%H:%M:%S").to_string()
}

fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).unwrap_or_else(|_| Uuid::nil())
}

fn period_to_str(p: &SessionPeriod) -> &'static str {
    match p {
        SessionPeriod::Am => "AM",
        SessionPeriod::Pm => "PM",
    }
}

fn parse_period(s: &str) -> SessionPeriod {
    match s {
        "PM" => SessionPeriod::Pm,
        _ => SessionPeriod::Am,
    }
}

fn kind_to_str(k: &SyncKind) -> &'static str {
    k.as_str()
}

fn parse_kind(s: &str) -> SyncKind {
    match s {
        "contacts" => SyncKind::Contacts,
        "attendance" => SyncKind::Attendance,
        "classes" => SyncKind::Classes,
        "timetable" => SyncKind::Timetable,
        _ => SyncKind::Roster,
    }
}

fn ids_to_str(ids: &[String]) -> String {
    serde_json::to_string(ids).unwrap_or_else(|_| "[]".to_string())
}

fn parse_ids(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_default()
}

// -- SchoolRepository --

#[async_trait]
impl SchoolRepository for SqliteRepository {
    async fn upsert_school(&self, scope: &TenantScope, school: &SchoolRegistration) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO schools (school_id, tenant_id, name, provider_school_id, domain, active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(school.school_id.to_string())
        .bind(scope.tenant_id().to_string())
        .bind(&school.name)
        .bind(&school.provider_school_id)
        .bind(&school.domain)
        .bind(school.active)
        .bind(datetime_to_str(&school.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_school(
        &self,
        scope: &TenantScope,
        school_id: Uuid,
    ) -> Result<Option<SchoolRegistration>> {
        let row = sqlx::query(
            "SELECT school_id, tenant_id, name, provider_school_id, domain, active, created_at
             FROM schools WHERE tenant_id = ?1 AND school_id = ?2",
        )
        .bind(scope.tenant_id().to_string())
        .bind(school_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| SchoolRegistration {
            school_id: parse_uuid(r.get("school_id")),
            tenant_id: parse_uuid(r.get("tenant_id")),
            name: r.get("name"),
            provider_school_id: r.get("provider_school_id"),
            domain: r.get("domain"),
            active: r.get("active"),
            created_at: parse_datetime(r.get("created_at")),
        }))
    }

    async fn list_schools(&self, scope: &TenantScope) -> Result<Vec<SchoolRegistration>> {
        let rows = sqlx::query(
            "SELECT school_id, tenant_id, name, provider_school_id, domain, active, created_at
             FROM schools WHERE tenant_id = ?1 ORDER BY name",
        )
        .bind(scope.tenant_id().to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|r| SchoolRegistration {
                school_id: parse_uuid(r.get("school_id")),
                tenant_id: parse_uuid(r.get("tenant_id")),
                name: r.get("name"),
                provider_school_id: r.get("provider_school_id"),
                domain: r.get("domain"),
                active: r.get("active"),
                created_at: parse_datetime(r.get("created_at")),
            })
            .collect())
    }
}

// -- StudentRepository --

fn row_to_student(r: &sqlx::sqlite::SqliteRow) -> Student {
    let dob: Option<String> = r.get("date_of_birth");
    Student {
        external_id: r.get("external_id"),
        school_id: parse_uuid(r.get("school_id")),
        first_name: r.get("first_name"),
        last_name: r.get("last_name"),
        middle_name: r.get("middle_name"),
        date_of_birth: dob.map(|d| parse_naive_date(&d)),
        year_group: r.get("year_group"),
        registration_group: r.get("registration_group"),
        active: r.get("active"),
        updated_at: parse_datetime(r.get("updated_at")),
    }
}

#[async_trait]
impl StudentRepository for SqliteRepository {
    async fn upsert_student(&self, scope: &TenantScope, student: &Student) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO students (tenant_id, school_id, external_id, first_name, last_name, middle_name, date_of_birth, year_group, registration_group, active, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(scope.tenant_id().to_string())
        .bind(student.school_id.to_string())
        .bind(&student.external_id)
        .bind(&student.first_name)
        .bind(&student.last_name)
        .bind(&student.middle_name)
        .bind(student.date_of_birth.as_ref().map(naive_date_to_str))
        .bind(&student.year_group)
        .bind(&student.registration_group)
        .bind(student.active)
        .bind(datetime_to_str(&student.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_student(
        &self,
        scope: &TenantScope,
        school_id: Uuid,
        external_id: &str,
    ) -> Result<Option<Student>> {
        let row = sqlx::query(
            "SELECT * FROM students WHERE tenant_id = ?1 AND school_id = ?2 AND external_id = ?3",
        )
        .bind(scope.tenant_id().to_string())
        .bind(school_id.to_string())
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_student))
    }

    async fn list_students(&self, scope: &TenantScope, school_id: Uuid) -> Result<Vec<Student>> {
        let rows = sqlx::query(
            "SELECT * FROM students WHERE tenant_id = ?1 AND school_id = ?2 ORDER BY last_name, first_name",
        )
        .bind(scope.tenant_id().to_string())
        .bind(school_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_student).collect())
    }
}

// -- ContactRepository --

fn row_to_contact(r: &sqlx::sqlite::SqliteRow) -> GuardianContact {
    GuardianContact {
        external_id: r.get("external_id"),
        school_id: parse_uuid(r.get("school_id")),
        student_external_id: r.get("student_external_id"),
        first_name: r.get("first_name"),
        last_name: r.get("last_name"),
        relationship: r.get("relationship"),
        priority: r.get("priority"),
        email: r.get("email"),
        phone: r.get("phone"),
        opted_out: r.get("opted_out"),
        updated_at: parse_datetime(r.get("updated_at")),
    }
}

#[async_trait]
impl ContactRepository for SqliteRepository {
    async fn upsert_contact(&self, scope: &TenantScope, contact: &GuardianContact) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO guardian_contacts (tenant_id, school_id, external_id, student_external_id, first_name, last_name, relationship, priority, email, phone, opted_out, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(scope.tenant_id().to_string())
        .bind(contact.school_id.to_string())
        .bind(&contact.external_id)
        .bind(&contact.student_external_id)
        .bind(&contact.first_name)
        .bind(&contact.last_name)
        .bind(&contact.relationship)
        .bind(contact.priority)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(contact.opted_out)
        .bind(datetime_to_str(&contact.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_contact(
        &self,
        scope: &TenantScope,
        school_id: Uuid,
        external_id: &str,
    ) -> Result<Option<GuardianContact>> {
        let row = sqlx::query(
            "SELECT * FROM guardian_contacts WHERE tenant_id = ?1 AND school_id = ?2 AND external_id = ?3",
        )
        .bind(scope.tenant_id().to_string())
        .bind(school_id.to_string())
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_contact))
    }

    async fn list_contacts_for_student(
        &self,
        scope: &TenantScope,
        school_id: Uuid,
        student_external_id: &str,
    ) -> Result<Vec<GuardianContact>> {
        let rows = sqlx::query(
            "SELECT * FROM guardian_contacts WHERE tenant_id = ?1 AND school_id = ?2 AND student_external_id = ?3 ORDER BY priority",
        )
        .bind(scope.tenant_id().to_string())
        .bind(school_id.to_string())
        .bind(student_external_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_contact).collect())
    }
}

// -- AttendanceRepository --

fn row_to_attendance(r: &sqlx::sqlite::SqliteRow) -> AttendanceRecord {
    AttendanceRecord {
        external_id: r.get("external_id"),
        school_id: parse_uuid(r.get("school_id")),
        student_external_id: r.get("student_external_id"),
        session_date: parse_naive_date(r.get("session_date")),
        period: parse_period(r.get("period")),
        code: r.get("code"),
        present: r.get("present"),
        authorised: r.get("authorised"),
        comment: r.get("comment"),
        updated_at: parse_datetime(r.get("updated_at")),
    }
}

#[async_trait]
impl AttendanceRepository for SqliteRepository {
    async fn upsert_attendance(
        &self,
        scope: &TenantScope,
        record: &AttendanceRecord,
    ) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO attendance_records (tenant_id, school_id, external_id, student_external_id, session_date, period, code, present, authorised, comment, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        )
        .bind(scope.tenant_id().to_string())
        .bind(record.school_id.to_string())
        .bind(&record.external_id)
        .bind(&record.student_external_id)
        .bind(naive_date_to_str(&record.session_date))
        .bind(period_to_str(&record.period))
        .bind(&record.code)
        .bind(record.present)
        .bind(record.authorised)
        .bind(&record.comment)
        .bind(datetime_to_str(&record.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_attendance(
        &self,
        scope: &TenantScope,
        school_id: Uuid,
        external_id: &str,
    ) -> Result<Option<AttendanceRecord>> {
        let row = sqlx::query(
            "SELECT * FROM attendance_records WHERE tenant_id = ?1 AND school_id = ?2 AND external_id = ?3",
        )
        .bind(scope.tenant_id().to_string())
        .bind(school_id.to_string())
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(row_to_attendance))
    }
}

// -- ClassRepository --

#[async_trait]
impl ClassRepository for SqliteRepository {
    async fn upsert_class(&self, scope: &TenantScope, class: &SchoolClass) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO school_classes (tenant_id, school_id, external_id, name, subject, student_external_ids, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(scope.tenant_id().to_string())
        .bind(class.school_id.to_string())
        .bind(&class.external_id)
        .bind(&class.name)
        .bind(&class.subject)
        .bind(ids_to_str(&class.student_external_ids))
        .bind(datetime_to_str(&class.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_class(
        &self,
        scope: &TenantScope,
        school_id: Uuid,
        external_id: &str,
    ) -> Result<Option<SchoolClass>> {
        let row = sqlx::query(
            "SELECT * FROM school_classes WHERE tenant_id = ?1 AND school_id = ?2 AND external_id = ?3",
        )
        .bind(scope.tenant_id().to_string())
        .bind(school_id.to_string())
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            let ids: String = r.get("student_external_ids");
            SchoolClass {
                external_id: r.get("external_id"),
                school_id: parse_uuid(r.get("school_id")),
                name: r.get("name"),
                subject: r.get("subject"),
                student_external_ids: parse_ids(&ids),
                updated_at: parse_datetime(r.get("updated_at")),
            }
        }))
    }
}

// -- TimetableRepository --

#[async_trait]
impl TimetableRepository for SqliteRepository {
    async fn upsert_timetable_entry(
        &self,
        scope: &TenantScope,
        entry: &TimetableEntry,
    ) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO timetable_entries (tenant_id, school_id, external_id, class_external_id, weekday, starts_at, ends_at, room, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(scope.tenant_id().to_string())
        .bind(entry.school_id.to_string())
        .bind(&entry.external_id)
        .bind(&entry.class_external_id)
        .bind(entry.weekday as i64)
        .bind(naive_time_to_str(&entry.starts_at))
        .bind(naive_time_to_str(&entry.ends_at))
        .bind(&entry.room)
        .bind(datetime_to_str(&entry.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_timetable_entry(
        &self,
        scope: &TenantScope,
        school_id: Uuid,
        external_id: &str,
    ) -> Result<Option<TimetableEntry>> {
        let row = sqlx::query(
            "SELECT * FROM timetable_entries WHERE tenant_id = ?1 AND school_id = ?2 AND external_id = ?3",
        )
        .bind(scope.tenant_id().to_string())
        .bind(school_id.to_string())
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            let weekday: i64 = r.get("weekday");
            TimetableEntry {
                external_id: r.get("external_id"),
                school_id: parse_uuid(r.get("school_id")),
                class_external_id: r.get("class_external_id"),
                weekday: weekday as u8,
                starts_at: parse_naive_time(r.get("starts_at")),
                ends_at: parse_naive_time(r.get("ends_at")),
                room: r.get("room"),
                updated_at: parse_datetime(r.get("updated_at")),
            }
        }))
    }
}

// -- SyncRunRepository --

fn row_to_sync_run(r: &sqlx::sqlite::SqliteRow) -> SyncRunResult {
    let completed: Option<String> = r.get("completed_at");
    SyncRunResult {
        run_id: parse_uuid(r.get("run_id")),
        school_id: parse_uuid(r.get("school_id")),
        kind: parse_kind(r.get("kind")),
        success: r.get("success"),
        error_message: r.get("error_message"),
        inserted: r.get("inserted"),
        updated: r.get("updated"),
        skipped: r.get("skipped"),
        errors: r.get("errors"),
        started_at: parse_datetime(r.get("started_at")),
        completed_at: completed.map(|c| parse_datetime(&c)),
    }
}

#[async_trait]
impl SyncRunRepository for SqliteRepository {
    async fn record_sync_run(&self, scope: &TenantScope, run: &SyncRunResult) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO sync_runs (run_id, tenant_id, school_id, kind, success, error_message, inserted, updated, skipped, errors, started_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(run.run_id.to_string())
        .bind(scope.tenant_id().to_string())
        .bind(run.school_id.to_string())
        .bind(kind_to_str(&run.kind))
        .bind(run.success)
        .bind(&run.error_message)
        .bind(run.inserted)
        .bind(run.updated)
        .bind(run.skipped)
        .bind(run.errors)
        .bind(datetime_to_str(&run.started_at))
        .bind(run.completed_at.as_ref().map(datetime_to_str))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_sync_run(
        &self,
        scope: &TenantScope,
        run_id: Uuid,
    ) -> Result<Option<SyncRunResult>> {
        let row = sqlx::query("SELECT * FROM sync_runs WHERE tenant_id = ?1 AND run_id = ?2")
            .bind(scope.tenant_id().to_string())
            .bind(run_id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(row_to_sync_run))
    }

    async fn list_recent_runs(
        &self,
        scope: &TenantScope,
        limit: i64,
    ) -> Result<Vec<SyncRunResult>> {
        let rows = sqlx::query(
            "SELECT * FROM sync_runs WHERE tenant_id = ?1 ORDER BY started_at DESC LIMIT ?2",
        )
        .bind(scope.tenant_id().to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(row_to_sync_run).collect())
    }

    async fn latest_watermark(
        &self,
        scope: &TenantScope,
        school_id: Uuid,
        kind: SyncKind,
    ) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query(
            "SELECT completed_at FROM sync_runs
             WHERE tenant_id = ?1 AND school_id = ?2 AND kind = ?3 AND success = 1 AND completed_at IS NOT NULL
             ORDER BY completed_at DESC LIMIT 1",
        )
        .bind(scope.tenant_id().to_string())
        .bind(school_id.to_string())
        .bind(kind_to_str(&kind))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.and_then(|r| {
            let completed: Option<String> = r.get("completed_at");
            completed.map(|c| parse_datetime(&c))
        }))
    }
}
