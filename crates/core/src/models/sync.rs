//! Sync run records and options.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of sync a connector can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncKind {
    Roster,
    Contacts,
    Attendance,
    Classes,
    Timetable,
}

impl SyncKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncKind::Roster => "roster",
            SyncKind::Contacts => "contacts",
            SyncKind::Attendance => "attendance",
            SyncKind::Classes => "classes",
            SyncKind::Timetable => "timetable",
        }
    }
}

/// Options controlling one sync invocation. A configuration record, not
/// persisted state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOptions {
    /// Ignore the incremental watermark and request the full remote set.
    #[serde(default)]
    pub force_full_sync: bool,
    /// Only request records modified after this instant. Ignored when
    /// `force_full_sync` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_after: Option<DateTime<Utc>>,
    /// Archive raw provider payloads alongside normalized records.
    #[serde(default)]
    pub archive_payloads: bool,
    /// Record per-run timing metrics.
    #[serde(default)]
    pub store_metrics: bool,
}

impl SyncOptions {
    /// The effective incremental filter: `updated_after` unless a full
    /// sync was forced.
    pub fn effective_updated_after(&self) -> Option<DateTime<Utc>> {
        if self.force_full_sync {
            None
        } else {
            self.updated_after
        }
    }
}

/// The structured, persisted outcome of one sync invocation.
///
/// A run id is always generated, even when the run fails, so failed runs
/// are queryable after the fact and retries are auditable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRunResult {
    pub run_id: Uuid,
    pub school_id: Uuid,
    pub kind: SyncKind,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub inserted: i64,
    pub updated: i64,
    pub skipped: i64,
    pub errors: i64,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl SyncRunResult {
    /// Start a new run record with a fresh id and zeroed counters.
    pub fn begin(school_id: Uuid, kind: SyncKind) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            school_id,
            kind,
            success: false,
            error_message: None,
            inserted: 0,
            updated: 0,
            skipped: 0,
            errors: 0,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Mark the run successful and stamp the completion time.
    pub fn complete(&mut self) {
        self.success = true;
        self.error_message = None;
        self.completed_at = Some(Utc::now());
    }

    /// Mark the run failed with the given error text and stamp the
    /// completion time. The counters keep whatever progress was made.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.success = false;
        self.error_message = Some(message.into());
        self.completed_at = Some(Utc::now());
    }

    /// Wall-clock duration of the run, if it has completed.
    pub fn duration(&self) -> Option<Duration> {
        self.completed_at.map(|end| end - self.started_at)
    }
}
