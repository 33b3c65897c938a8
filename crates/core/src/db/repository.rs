//! Repository traits for tenant-scoped persistence.
//!
//! Every method takes an explicit [`TenantScope`]; implementations must
//! filter by its tenant id (and school id where the row carries one).
//! There is no ambient scope anywhere in the data layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::attendance::AttendanceRecord;
use crate::models::contact::GuardianContact;
use crate::models::school::SchoolRegistration;
use crate::models::school_class::{SchoolClass, TimetableEntry};
use crate::models::student::Student;
use crate::models::sync::{SyncKind, SyncRunResult};
use crate::scope::TenantScope;

#[async_trait]
pub trait SchoolRepository: Send + Sync {
    async fn upsert_school(&self, scope: &TenantScope, school: &SchoolRegistration) -> Result<()>;
    async fn get_school(
        &self,
        scope: &TenantScope,
        school_id: Uuid,
    ) -> Result<Option<SchoolRegistration>>;
    async fn list_schools(&self, scope: &TenantScope) -> Result<Vec<SchoolRegistration>>;
}

#[async_trait]
pub trait StudentRepository: Send + Sync {
    async fn upsert_student(&self, scope: &TenantScope, student: &Student) -> Result<()>;
    async fn get_student(
        &self,
        scope: &TenantScope,
        school_id: Uuid,
        external_id: &str,
    ) -> Result<Option<Student>>;
    async fn list_students(&self, scope: &TenantScope, school_id: Uuid) -> Result<Vec<Student>>;
}

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn upsert_contact(&self, scope: &TenantScope, contact: &GuardianContact) -> Result<()>;
    async fn get_contact(
        &self,
        scope: &TenantScope,
        school_id: Uuid,
        external_id: &str,
    ) -> Result<Option<GuardianContact>>;
    async fn list_contacts_for_student(
        &self,
        scope: &TenantScope,
        school_id: Uuid,
        student_external_id: &str,
    ) -> Result<Vec<GuardianContact>>;
}

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    async fn upsert_attendance(
        &self,
        scope: &TenantScope,
        record: &AttendanceRecord,
    ) -> Result<()>;
    async fn get_attendance(
        &self,
        scope: &TenantScope,
        school_id: Uuid,
        external_id: &str,
    ) -> Result<Option<AttendanceRecord>>;
}

#[async_trait]
pub trait ClassRepository: Send + Sync {
    async fn upsert_class(&self, scope: &TenantScope, class: &SchoolClass) -> Result<()>;
    async fn get_class(
        &self,
        scope: &TenantScope,
        school_id: Uuid,
        external_id: &str,
    ) -> Result<Option<SchoolClass>>;
}

#[async_trait]
pub trait TimetableRepository: Send + Sync {
    async fn upsert_timetable_entry(
        &self,
        scope: &TenantScope,
        entry: &TimetableEntry,
    ) -> Result<()>;
    async fn get_timetable_entry(
        &self,
        scope: &TenantScope,
        school_id: Uuid,
        external_id: &str,
    ) -> Result<Option<TimetableEntry>>;
}

#[async_trait]
pub trait SyncRunRepository: Send + Sync {
    /// Durably write (or rewrite) a run record. Called once when the run
    /// begins and again with the final counters, so a crash mid-run still
    /// leaves an auditable row.
    async fn record_sync_run(&self, scope: &TenantScope, run: &SyncRunResult) -> Result<()>;
    async fn get_sync_run(
        &self,
        scope: &TenantScope,
        run_id: Uuid,
    ) -> Result<Option<SyncRunResult>>;
    async fn list_recent_runs(
        &self,
        scope: &TenantScope,
        limit: i64,
    ) -> Result<Vec<SyncRunResult>>;
    /// Completion time of the last successful run for (school, kind) —
    /// the incremental-sync watermark.
    async fn latest_watermark(
        &self,
        scope: &TenantScope,
        school_id: Uuid,
        kind: SyncKind,
    ) -> Result<Option<DateTime<Utc>>>;
}

/// Everything the platform needs from a data store.
pub trait PlatformRepository:
    SchoolRepository
    + StudentRepository
    + ContactRepository
    + AttendanceRepository
    + ClassRepository
    + TimetableRepository
    + SyncRunRepository
{
}
