//! SIS connector contract and capability gating.

pub mod wonde;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::{BeaconError, Result};
use crate::models::sync::{SyncKind, SyncOptions, SyncRunResult};

/// A unit of sync functionality a connector may declare support for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SisCapability {
    RosterSync,
    ContactsSync,
    AttendanceSync,
    ClassesSync,
    TimetableSync,
}

impl SisCapability {
    pub fn as_str(&self) -> &'static str {
        match self {
            SisCapability::RosterSync => "RosterSync",
            SisCapability::ContactsSync => "ContactsSync",
            SisCapability::AttendanceSync => "AttendanceSync",
            SisCapability::ClassesSync => "ClassesSync",
            SisCapability::TimetableSync => "TimetableSync",
        }
    }

    /// The capability required to run a given sync kind.
    pub fn for_kind(kind: SyncKind) -> Self {
        match kind {
            SyncKind::Roster => SisCapability::RosterSync,
            SyncKind::Contacts => SisCapability::ContactsSync,
            SyncKind::Attendance => SisCapability::AttendanceSync,
            SyncKind::Classes => SisCapability::ClassesSync,
            SyncKind::Timetable => SisCapability::TimetableSync,
        }
    }
}

/// Trait for SIS connector implementations.
///
/// Each sync operation returns a [`SyncRunResult`] whether it succeeded
/// or not; callers must check declared capabilities (via [`run_sync`])
/// before invoking an operation.
#[async_trait]
pub trait SisConnector: Send + Sync {
    fn provider_name(&self) -> &str;
    fn capabilities(&self) -> &[SisCapability];
    async fn test_connection(&self, school_id: Uuid) -> Result<()>;

    async fn sync_roster(&self, school_id: Uuid, options: &SyncOptions) -> Result<SyncRunResult>;
    async fn sync_contacts(&self, school_id: Uuid, options: &SyncOptions)
        -> Result<SyncRunResult>;
    async fn sync_attendance(
        &self,
        school_id: Uuid,
        options: &SyncOptions,
    ) -> Result<SyncRunResult>;
    async fn sync_classes(&self, school_id: Uuid, options: &SyncOptions) -> Result<SyncRunResult>;
    async fn sync_timetable(
        &self,
        school_id: Uuid,
        options: &SyncOptions,
    ) -> Result<SyncRunResult>;
}

/// Dispatch one sync kind against a connector, gating on its declared
/// capabilities. New providers are new trait impls; this dispatch never
/// changes.
pub async fn run_sync(
    connector: &dyn SisConnector,
    kind: SyncKind,
    school_id: Uuid,
    options: &SyncOptions,
) -> Result<SyncRunResult> {
    let required = SisCapability::for_kind(kind);
    if !connector.capabilities().contains(&required) {
        return Err(BeaconError::UnsupportedCapability {
            provider: connector.provider_name().to_string(),
            capability: required.as_str().to_string(),
        });
    }
    match kind {
        SyncKind::Roster => connector.sync_roster(school_id, options).await,
        SyncKind::Contacts => connector.sync_contacts(school_id, options).await,
        SyncKind::Attendance => connector.sync_attendance(school_id, options).await,
        SyncKind::Classes => connector.sync_classes(school_id, options).await,
        SyncKind::Timetable => connector.sync_timetable(school_id, options).await,
    }
}
