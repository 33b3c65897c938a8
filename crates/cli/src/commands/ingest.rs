use std::sync::Arc;

use beacon_core::ingestion::IngestionService;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use super::AppContext;

/// Run the `ingest` command: pull attendance marks for one session date.
pub async fn run(config_path: &str, school: &str, date: Option<&str>) -> anyhow::Result<()> {
    let school_id: Uuid = school
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid school id '{school}': {e}"))?;
    let date = match date {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|e| anyhow::anyhow!("invalid --date '{s}': {e}"))?,
        None => Utc::now().date_naive(),
    };

    let ctx = AppContext::load(config_path).await?;
    let service = IngestionService::new(Arc::new(ctx.connector()?));

    println!("Ingesting attendance for school {school_id} on {date}...");
    let run = service.run_ingestion(school_id, date).await?;

    if run.success {
        println!("Ingestion completed");
    } else {
        println!("Ingestion FAILED");
    }
    println!("  Run id:   {}", run.run_id);
    println!("  Inserted: {}", run.inserted);
    println!("  Updated:  {}", run.updated);
    println!("  Skipped:  {}", run.skipped);
    println!("  Errors:   {}", run.errors);
    if let Some(err) = &run.error_message {
        println!("  Error:    {err}");
        anyhow::bail!("ingestion failed: {err}");
    }

    Ok(())
}
