use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "beacon", about = "School attendance and safeguarding platform", version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "beacon.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run a sync of one kind for a school
    Sync {
        /// What to sync: roster, contacts, attendance, classes, or timetable
        #[arg(long, default_value = "roster")]
        kind: String,
        /// School id (UUID)
        #[arg(long)]
        school: String,
        /// Ignore the incremental watermark and sync everything
        #[arg(long)]
        full: bool,
        /// Only sync records modified after this RFC 3339 instant
        #[arg(long)]
        updated_after: Option<String>,
    },
    /// Ingest attendance marks for one session date
    Ingest {
        /// School id (UUID)
        #[arg(long)]
        school: String,
        /// Session date, yyyy-MM-dd (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show recent sync runs
    Status,
    /// Run a message consumer until interrupted
    Consume {
        /// Topic to consume from
        #[arg(long, default_value = "workflow")]
        topic: String,
        /// Subscription name
        #[arg(long, default_value = "beacon-cli")]
        subscription: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sync {
            kind,
            school,
            full,
            updated_after,
        } => {
            commands::sync::run(&cli.config, &kind, &school, full, updated_after.as_deref())
                .await?;
        }
        Commands::Ingest { school, date } => {
            commands::ingest::run(&cli.config, &school, date.as_deref()).await?;
        }
        Commands::Status => {
            commands::status::run(&cli.config).await?;
        }
        Commands::Consume {
            topic,
            subscription,
        } => {
            commands::consume::run(&cli.config, &topic, &subscription).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn cli_parse_sync_defaults() {
        let cli = Cli::parse_from(["beacon", "sync", "--school", "abc"]);
        assert_eq!(cli.config, "beacon.toml");
        match cli.command {
            Commands::Sync {
                kind,
                school,
                full,
                updated_after,
            } => {
                assert_eq!(kind, "roster");
                assert_eq!(school, "abc");
                assert!(!full);
                assert!(updated_after.is_none());
            }
            _ => panic!("expected Sync command"),
        }
    }

    #[test]
    fn cli_parse_sync_full_with_kind() {
        let cli = Cli::parse_from([
            "beacon",
            "--config",
            "/etc/beacon.toml",
            "sync",
            "--kind",
            "attendance",
            "--school",
            "abc",
            "--full",
        ]);
        assert_eq!(cli.config, "/etc/beacon.toml");
        match cli.command {
            Commands::Sync { kind, full, .. } => {
                assert_eq!(kind, "attendance");
                assert!(full);
            }
            _ => panic!("expected Sync command"),
        }
    }

    #[test]
    fn cli_parse_ingest_with_date() {
        let cli = Cli::parse_from([
            "beacon",
            "ingest",
            "--school",
            "abc",
            "--date",
            "2026-01-15",
        ]);
        match cli.command {
            Commands::Ingest { school, date } => {
                assert_eq!(school, "abc");
                assert_eq!(date.as_deref(), Some("2026-01-15"));
            }
            _ => panic!("expected Ingest command"),
        }
    }

    #[test]
    fn cli_parse_status() {
        let cli = Cli::parse_from(["beacon", "status"]);
        assert!(matches!(cli.command, Commands::Status));
    }

    #[test]
    fn cli_parse_consume_defaults() {
        let cli = Cli::parse_from(["beacon", "consume"]);
        match cli.command {
            Commands::Consume {
                topic,
                subscription,
            } => {
                assert_eq!(topic, "workflow");
                assert_eq!(subscription, "beacon-cli");
            }
            _ => panic!("expected Consume command"),
        }
    }
}
