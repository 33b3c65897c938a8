pub mod consume;
pub mod ingest;
pub mod status;
pub mod sync;

use std::path::Path;
use std::sync::Arc;

use beacon_core::config::BeaconConfig;
use beacon_core::connectors::wonde::client::WondeClient;
use beacon_core::connectors::wonde::WondeConnector;
use beacon_core::db::sqlite::SqliteRepository;
use beacon_core::db::DatabasePool;
use beacon_core::messaging::broker::InMemoryBroker;
use beacon_core::messaging::publisher::MessagePublisher;
use beacon_core::scope::TenantScope;
use tracing::info;

/// Shared wiring for the commands: config, database, scope, broker.
pub struct AppContext {
    pub config: BeaconConfig,
    pub repository: Arc<SqliteRepository>,
    pub scope: TenantScope,
    pub broker: InMemoryBroker,
    pub publisher: Arc<MessagePublisher>,
}

impl AppContext {
    pub async fn load(config_path: &str) -> anyhow::Result<Self> {
        let config = BeaconConfig::load(Path::new(config_path))?;
        config.validate()?;
        info!("Loaded configuration from {}", config_path);

        let connect_str = format!("sqlite:{}?mode=rwc", config.beacon.database.path);
        let DatabasePool::Sqlite(pool) = DatabasePool::new_sqlite(&connect_str).await?;
        let repository = Arc::new(SqliteRepository::new(pool));
        info!("Connected to database");

        let scope = TenantScope::new(config.tenant.tenant_id, None)?;
        let broker = InMemoryBroker::new();
        let publisher = Arc::new(MessagePublisher::new(Arc::new(broker.clone())));

        Ok(Self {
            config,
            repository,
            scope,
            broker,
            publisher,
        })
    }

    /// Build the configured SIS connector, or fail if SIS is disabled.
    pub fn connector(&self) -> anyhow::Result<WondeConnector> {
        if !self.config.sis.enabled {
            anyhow::bail!("SIS integration is disabled. Enable it in your config file first.");
        }
        let client = WondeClient::new(&self.config.sis.domain, &self.config.sis.token);
        Ok(WondeConnector::new(
            self.scope,
            client,
            self.repository.clone(),
            self.publisher.clone(),
        ))
    }
}
