//! Wonde SIS connector: fetch, normalize, reconcile, publish.
//!
//! Provider failures never bubble out of a sync operation as bare errors.
//! Each operation returns a [`SyncRunResult`] that records what happened,
//! and that record is persisted whether the run succeeded or not.

pub mod client;
pub mod mapper;
pub mod models;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::repository::PlatformRepository;
use crate::error::{BeaconError, Result};
use crate::messaging::envelope::{kinds, Envelope};
use crate::messaging::publisher::MessagePublisher;
use crate::models::events::{AttendanceIngestedEvent, RosterSyncedEvent};
use crate::models::school::SchoolRegistration;
use crate::models::sync::{SyncKind, SyncOptions, SyncRunResult};
use crate::scope::TenantScope;

use self::client::WondeClient;
use super::{SisCapability, SisConnector};

const CAPABILITIES: &[SisCapability] = &[
    SisCapability::RosterSync,
    SisCapability::ContactsSync,
    SisCapability::AttendanceSync,
    SisCapability::ClassesSync,
    SisCapability::TimetableSync,
];

pub struct WondeConnector {
    scope: TenantScope,
    client: WondeClient,
    repository: Arc<dyn PlatformRepository>,
    publisher: Arc<MessagePublisher>,
}

impl WondeConnector {
    pub fn new(
        scope: TenantScope,
        client: WondeClient,
        repository: Arc<dyn PlatformRepository>,
        publisher: Arc<MessagePublisher>,
    ) -> Self {
        Self {
            scope,
            client,
            repository,
            publisher,
        }
    }

    async fn resolve_school(&self, school_id: Uuid) -> Result<SchoolRegistration> {
        self.repository
            .get_school(&self.scope, school_id)
            .await?
            .ok_or_else(|| {
                BeaconError::Sync(format!("school {school_id} is not registered for this tenant"))
            })
    }

    /// The incremental filter for a run: an explicit option wins, otherwise
    /// the completion time of the last successful run of this kind. A
    /// forced full sync clears both.
    async fn watermark(
        &self,
        school_id: Uuid,
        kind: SyncKind,
        options: &SyncOptions,
    ) -> Result<Option<DateTime<Utc>>> {
        if options.force_full_sync {
            return Ok(None);
        }
        if let Some(ts) = options.updated_after {
            return Ok(Some(ts));
        }
        self.repository
            .latest_watermark(&self.scope, school_id, kind)
            .await
    }

    /// Persist the final run record, then publish the outcome event for
    /// successful runs. A publish failure is logged but does not retract
    /// the already-recorded run.
    async fn finish_run(&self, run: &SyncRunResult, session_date: Option<NaiveDate>) -> Result<()> {
        self.repository.record_sync_run(&self.scope, run).await?;
        if !run.success {
            return Ok(());
        }

        let publish_outcome = match run.kind {
            SyncKind::Attendance => {
                let event = AttendanceIngestedEvent {
                    run_id: run.run_id,
                    school_id: run.school_id,
                    session_date: session_date.unwrap_or_else(|| Utc::now().date_naive()),
                    inserted: run.inserted,
                    updated: run.updated,
                    skipped: run.skipped,
                };
                let envelope = Envelope::new(
                    kinds::ATTENDANCE_INGESTED,
                    self.scope.tenant_id(),
                    run.school_id,
                    Some(run.run_id.to_string()),
                    event,
                )?;
                self.publisher.publish(&envelope).await
            }
            _ => {
                let event = RosterSyncedEvent {
                    run_id: run.run_id,
                    school_id: run.school_id,
                    kind: run.kind,
                    inserted: run.inserted,
                    updated: run.updated,
                    skipped: run.skipped,
                };
                let envelope = Envelope::new(
                    kinds::ROSTER_SYNCED,
                    self.scope.tenant_id(),
                    run.school_id,
                    Some(run.run_id.to_string()),
                    event,
                )?;
                self.publisher.publish(&envelope).await
            }
        };

        if let Err(e) = publish_outcome {
            warn!(
                run_id = %run.run_id,
                kind = run.kind.as_str(),
                error = %e,
                "Sync completed but outcome event could not be published"
            );
        }
        Ok(())
    }

    async fn reconcile_students(
        &self,
        run: &mut SyncRunResult,
        school: &SchoolRegistration,
        updated_after: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let raw = self
            .client
            .fetch_students(&school.provider_school_id, updated_after)
            .await?;
        for item in &raw {
            let student = match mapper::map_student(run.school_id, item) {
                Ok(s) => s,
                Err(e) => {
                    warn!(external_id = %item.id, error = %e, "Skipping unmappable student");
                    run.errors += 1;
                    continue;
                }
            };
            match self
                .repository
                .get_student(&self.scope, run.school_id, &student.external_id)
                .await?
            {
                None => {
                    self.repository.upsert_student(&self.scope, &student).await?;
                    run.inserted += 1;
                }
                Some(existing) if existing.differs_from(&student) => {
                    self.repository.upsert_student(&self.scope, &student).await?;
                    run.updated += 1;
                }
                Some(_) => run.skipped += 1,
            }
        }
        Ok(())
    }

    async fn reconcile_contacts(
        &self,
        run: &mut SyncRunResult,
        school: &SchoolRegistration,
        updated_after: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let raw = self
            .client
            .fetch_contacts(&school.provider_school_id, updated_after)
            .await?;
        for item in &raw {
            let rows = match mapper::map_contact(run.school_id, item) {
                Ok(rows) => rows,
                Err(e) => {
                    warn!(external_id = %item.id, error = %e, "Skipping unmappable contact");
                    run.errors += 1;
                    continue;
                }
            };
            for contact in rows {
                match self
                    .repository
                    .get_contact(&self.scope, run.school_id, &contact.external_id)
                    .await?
                {
                    None => {
                        self.repository.upsert_contact(&self.scope, &contact).await?;
                        run.inserted += 1;
                    }
                    Some(existing) if existing.differs_from(&contact) => {
                        self.repository.upsert_contact(&self.scope, &contact).await?;
                        run.updated += 1;
                    }
                    Some(_) => run.skipped += 1,
                }
            }
        }
        Ok(())
    }

    async fn reconcile_attendance(
        &self,
        run: &mut SyncRunResult,
        school: &SchoolRegistration,
        date: NaiveDate,
    ) -> Result<()> {
        let raw = self
            .client
            .fetch_attendance(&school.provider_school_id, date)
            .await?;
        for item in &raw {
            let record = match mapper::map_attendance(run.school_id, item) {
                Ok(r) => r,
                Err(e) => {
                    warn!(external_id = %item.id, error = %e, "Skipping unmappable attendance mark");
                    run.errors += 1;
                    continue;
                }
            };
            match self
                .repository
                .get_attendance(&self.scope, run.school_id, &record.external_id)
                .await?
            {
                None => {
                    self.repository
                        .upsert_attendance(&self.scope, &record)
                        .await?;
                    run.inserted += 1;
                }
                Some(existing) if existing.differs_from(&record) => {
                    self.repository
                        .upsert_attendance(&self.scope, &record)
                        .await?;
                    run.updated += 1;
                }
                Some(_) => run.skipped += 1,
            }
        }
        Ok(())
    }

    async fn reconcile_classes(
        &self,
        run: &mut SyncRunResult,
        school: &SchoolRegistration,
        updated_after: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let raw = self
            .client
            .fetch_classes(&school.provider_school_id, updated_after)
            .await?;
        for item in &raw {
            let class = match mapper::map_class(run.school_id, item) {
                Ok(c) => c,
                Err(e) => {
                    warn!(external_id = %item.id, error = %e, "Skipping unmappable class");
                    run.errors += 1;
                    continue;
                }
            };
            match self
                .repository
                .get_class(&self.scope, run.school_id, &class.external_id)
                .await?
            {
                None => {
                    self.repository.upsert_class(&self.scope, &class).await?;
                    run.inserted += 1;
                }
                Some(existing) if existing.differs_from(&class) => {
                    self.repository.upsert_class(&self.scope, &class).await?;
                    run.updated += 1;
                }
                Some(_) => run.skipped += 1,
            }
        }
        Ok(())
    }

    async fn reconcile_lessons(
        &self,
        run: &mut SyncRunResult,
        school: &SchoolRegistration,
        updated_after: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let raw = self
            .client
            .fetch_lessons(&school.provider_school_id, updated_after)
            .await?;
        for item in &raw {
            let entry = match mapper::map_lesson(run.school_id, item) {
                Ok(l) => l,
                Err(e) => {
                    warn!(external_id = %item.id, error = %e, "Skipping unmappable lesson");
                    run.errors += 1;
                    continue;
                }
            };
            match self
                .repository
                .get_timetable_entry(&self.scope, run.school_id, &entry.external_id)
                .await?
            {
                None => {
                    self.repository
                        .upsert_timetable_entry(&self.scope, &entry)
                        .await?;
                    run.inserted += 1;
                }
                Some(existing) if existing.differs_from(&entry) => {
                    self.repository
                        .upsert_timetable_entry(&self.scope, &entry)
                        .await?;
                    run.updated += 1;
                }
                Some(_) => run.skipped += 1,
            }
        }
        Ok(())
    }

    /// Run one incremental sync end to end. The run record is written at
    /// the start and rewritten with the final state, so an interrupted run
    /// still leaves a row behind.
    async fn execute(
        &self,
        school_id: Uuid,
        kind: SyncKind,
        options: &SyncOptions,
    ) -> Result<SyncRunResult> {
        let mut run = SyncRunResult::begin(school_id, kind);
        self.repository.record_sync_run(&self.scope, &run).await?;

        let outcome: Result<()> = async {
            let school = self.resolve_school(school_id).await?;
            let updated_after = self.watermark(school_id, kind, options).await?;
            match kind {
                SyncKind::Roster => {
                    self.reconcile_students(&mut run, &school, updated_after).await
                }
                SyncKind::Contacts => {
                    self.reconcile_contacts(&mut run, &school, updated_after).await
                }
                SyncKind::Classes => {
                    self.reconcile_classes(&mut run, &school, updated_after).await
                }
                SyncKind::Timetable => {
                    self.reconcile_lessons(&mut run, &school, updated_after).await
                }
                SyncKind::Attendance => {
                    self.reconcile_attendance(&mut run, &school, Utc::now().date_naive())
                        .await
                }
            }
        }
        .await;

        match outcome {
            Ok(()) => {
                run.complete();
                info!(
                    run_id = %run.run_id,
                    kind = kind.as_str(),
                    inserted = run.inserted,
                    updated = run.updated,
                    skipped = run.skipped,
                    errors = run.errors,
                    "Sync run completed"
                );
            }
            Err(e) => {
                run.fail(e.to_string());
                warn!(run_id = %run.run_id, kind = kind.as_str(), error = %e, "Sync run failed");
            }
        }
        self.finish_run(&run, None).await?;
        Ok(run)
    }

    /// Ingest attendance marks for one session date. Used directly by the
    /// ingestion service; [`SisConnector::sync_attendance`] defaults the
    /// date to today.
    pub async fn sync_attendance_for_date(
        &self,
        school_id: Uuid,
        date: NaiveDate,
    ) -> Result<SyncRunResult> {
        let mut run = SyncRunResult::begin(school_id, SyncKind::Attendance);
        self.repository.record_sync_run(&self.scope, &run).await?;

        let outcome: Result<()> = async {
            let school = self.resolve_school(school_id).await?;
            self.reconcile_attendance(&mut run, &school, date).await
        }
        .await;

        match outcome {
            Ok(()) => {
                run.complete();
                info!(
                    run_id = %run.run_id,
                    %date,
                    inserted = run.inserted,
                    updated = run.updated,
                    skipped = run.skipped,
                    errors = run.errors,
                    "Attendance ingestion completed"
                );
            }
            Err(e) => {
                run.fail(e.to_string());
                warn!(run_id = %run.run_id, %date, error = %e, "Attendance ingestion failed");
            }
        }
        self.finish_run(&run, Some(date)).await?;
        Ok(run)
    }
}

#[async_trait]
impl SisConnector for WondeConnector {
    fn provider_name(&self) -> &str {
        "wonde"
    }

    fn capabilities(&self) -> &[SisCapability] {
        CAPABILITIES
    }

    async fn test_connection(&self, school_id: Uuid) -> Result<()> {
        let school = self.resolve_school(school_id).await?;
        self.client.test_connection(&school.provider_school_id).await
    }

    async fn sync_roster(&self, school_id: Uuid, options: &SyncOptions) -> Result<SyncRunResult> {
        self.execute(school_id, SyncKind::Roster, options).await
    }

    async fn sync_contacts(
        &self,
        school_id: Uuid,
        options: &SyncOptions,
    ) -> Result<SyncRunResult> {
        self.execute(school_id, SyncKind::Contacts, options).await
    }

    async fn sync_attendance(
        &self,
        school_id: Uuid,
        _options: &SyncOptions,
    ) -> Result<SyncRunResult> {
        self.sync_attendance_for_date(school_id, Utc::now().date_naive())
            .await
    }

    async fn sync_classes(&self, school_id: Uuid, options: &SyncOptions) -> Result<SyncRunResult> {
        self.execute(school_id, SyncKind::Classes, options).await
    }

    async fn sync_timetable(
        &self,
        school_id: Uuid,
        options: &SyncOptions,
    ) -> Result<SyncRunResult> {
        self.execute(school_id, SyncKind::Timetable, options).await
    }
}
