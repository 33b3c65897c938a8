use std::time::Instant;

use beacon_core::connectors::run_sync;
use beacon_core::models::sync::{SyncKind, SyncOptions};
use chrono::{DateTime, Utc};
use tracing::error;
use uuid::Uuid;

use super::AppContext;

fn parse_kind(kind: &str) -> anyhow::Result<SyncKind> {
    Ok(match kind {
        "roster" => SyncKind::Roster,
        "contacts" => SyncKind::Contacts,
        "attendance" => SyncKind::Attendance,
        "classes" => SyncKind::Classes,
        "timetable" => SyncKind::Timetable,
        other => anyhow::bail!(
            "unknown sync kind '{other}' (expected roster, contacts, attendance, classes, or timetable)"
        ),
    })
}

/// Run the `sync` command: one capability-gated sync for a school.
pub async fn run(
    config_path: &str,
    kind: &str,
    school: &str,
    full: bool,
    updated_after: Option<&str>,
) -> anyhow::Result<()> {
    let kind = parse_kind(kind)?;
    let school_id: Uuid = school
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid school id '{school}': {e}"))?;
    let updated_after: Option<DateTime<Utc>> = updated_after
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| anyhow::anyhow!("invalid --updated-after '{s}': {e}"))
        })
        .transpose()?;

    let ctx = AppContext::load(config_path).await?;
    let connector = ctx.connector()?;

    let options = SyncOptions {
        force_full_sync: full,
        updated_after,
        ..SyncOptions::default()
    };

    println!("Starting {} sync for school {school_id}...", kind.as_str());
    let start = Instant::now();

    let run = run_sync(&connector, kind, school_id, &options).await?;
    let duration = start.elapsed();

    if run.success {
        println!("Sync completed in {:.1}s", duration.as_secs_f64());
    } else {
        println!("Sync FAILED after {:.1}s", duration.as_secs_f64());
    }
    println!("  Run id:   {}", run.run_id);
    println!("  Inserted: {}", run.inserted);
    println!("  Updated:  {}", run.updated);
    println!("  Skipped:  {}", run.skipped);
    println!("  Errors:   {}", run.errors);
    if let Some(err) = &run.error_message {
        error!("Sync run {} failed: {err}", run.run_id);
        println!("  Error:    {err}");
        anyhow::bail!("sync failed: {err}");
    }

    Ok(())
}
