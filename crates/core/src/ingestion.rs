//! Attendance ingestion trigger.

use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use crate::connectors::wonde::WondeConnector;
use crate::error::Result;
use crate::models::sync::SyncRunResult;

/// Triggers attendance ingestion for one school and session date.
///
/// Each call is an independent, idempotent reconcile: re-running for the
/// same school/date fetches the provider's current marks and upserts
/// them again, counting unchanged records as skipped.
pub struct IngestionService {
    connector: Arc<WondeConnector>,
}

impl IngestionService {
    pub fn new(connector: Arc<WondeConnector>) -> Self {
        Self { connector }
    }

    pub async fn run_ingestion(&self, school_id: Uuid, date: NaiveDate) -> Result<SyncRunResult> {
        info!(%school_id, %date, "Starting attendance ingestion");
        self.connector.sync_attendance_for_date(school_id, date).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::wonde::client::WondeClient;
    use crate::db::repository::SchoolRepository;
    use crate::db::sqlite::SqliteRepository;
    use crate::db::DatabasePool;
    use crate::messaging::broker::{Broker, InMemoryBroker};
    use crate::messaging::publisher::MessagePublisher;
    use crate::messaging::topics::TOPIC_ATTENDANCE;
    use crate::models::school::SchoolRegistration;
    use crate::scope::TenantScope;
    use chrono::Utc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn rerunning_the_same_date_is_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/schools/S1/attendance"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [
                    {
                        "id": "att-1",
                        "student": "A1",
                        "date": "2026-01-15",
                        "session": "AM",
                        "code": "/",
                        "present": true,
                        "authorised": false
                    }
                ]
            })))
            .mount(&server)
            .await;

        let DatabasePool::Sqlite(pool) = DatabasePool::new_sqlite_memory().await.unwrap();
        let repository = Arc::new(SqliteRepository::new(pool));
        let scope = TenantScope::new(Uuid::new_v4(), None).unwrap();
        let school_id = Uuid::new_v4();
        repository
            .upsert_school(
                &scope,
                &SchoolRegistration {
                    school_id,
                    tenant_id: scope.tenant_id(),
                    name: "Hillcrest Primary".to_string(),
                    provider_school_id: "S1".to_string(),
                    domain: "api.wonde.test".to_string(),
                    active: true,
                    created_at: Utc::now(),
                },
            )
            .await
            .unwrap();

        let broker = InMemoryBroker::new();
        broker.subscribe(TOPIC_ATTENDANCE, "sync-events").await.unwrap();
        let publisher = Arc::new(MessagePublisher::new(Arc::new(broker.clone())));
        let client = WondeClient::with_base_url(&server.uri(), "tok", reqwest::Client::new());
        let connector = Arc::new(WondeConnector::new(
            scope,
            client,
            repository,
            publisher,
        ));
        let service = IngestionService::new(connector);

        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let first = service.run_ingestion(school_id, date).await.unwrap();
        assert!(first.success);
        assert_eq!(first.inserted, 1);

        let second = service.run_ingestion(school_id, date).await.unwrap();
        assert!(second.success);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 1);

        // One outcome event per run.
        assert_eq!(broker.pending(TOPIC_ATTENDANCE, "sync-events").await, 2);
    }
}
