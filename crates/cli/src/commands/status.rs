use beacon_core::db::repository::{SchoolRepository, SyncRunRepository};

use super::AppContext;

/// Run the `status` command: show registered schools and recent sync runs.
pub async fn run(config_path: &str) -> anyhow::Result<()> {
    let ctx = AppContext::load(config_path).await?;

    println!("Beacon Status");
    println!("=============");
    println!("Instance: {}", ctx.config.beacon.instance_name);
    println!("Tenant:   {}", ctx.scope.tenant_id());
    println!();

    let schools = ctx.repository.list_schools(&ctx.scope).await?;
    println!("Schools ({})", schools.len());
    println!("-------");
    for school in &schools {
        println!(
            "  {}  {}  ({})",
            school.school_id,
            school.name,
            if school.active { "active" } else { "inactive" }
        );
    }
    if schools.is_empty() {
        println!("  none registered");
    }
    println!();

    let runs = ctx.repository.list_recent_runs(&ctx.scope, 10).await?;
    if runs.is_empty() {
        println!("No sync runs recorded.");
        return Ok(());
    }

    println!("Recent Sync Runs");
    println!("----------------");
    for run in &runs {
        let status = if run.success { "ok" } else { "FAILED" };
        println!(
            "  {}  {:<10}  {:<6}  +{} ~{} ={} !{}  {}",
            run.started_at.format("%Y-%m-%d %H:%M:%S"),
            run.kind.as_str(),
            status,
            run.inserted,
            run.updated,
            run.skipped,
            run.errors,
            run.error_message.as_deref().unwrap_or("")
        );
    }

    Ok(())
}
