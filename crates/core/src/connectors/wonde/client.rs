//! Paginated, rate-limit-aware HTTP client for the Wonde SIS API.

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{BeaconError, Result};

use super::models::Page;

/// Transient-failure attempts per page request. Rate limiting (429) does
/// not consume this budget.
const MAX_ATTEMPTS: u32 = 3;

/// Backoff base for transient retries; the sleep is base x attempt.
const BACKOFF_BASE: Duration = Duration::from_millis(500);

/// Default delay when a 429 carries no Retry-After hint.
const RATE_LIMIT_FALLBACK: Duration = Duration::from_secs(1);

/// Hard ceiling on requests per `fetch_all`, bounding a misbehaving or
/// infinitely-paginating provider. A safety rail, not a termination path.
const MAX_REQUESTS_PER_FETCH: u32 = 1000;

/// Wire format for the `updated_after` filter: space-separated, no
/// timezone suffix. A literal provider contract.
pub(crate) fn format_updated_after(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Bearer-token client for `https://{domain}/v1/schools/{schoolId}/...`.
pub struct WondeClient {
    base_url: String,
    token: String,
    http: Client,
}

impl WondeClient {
    pub fn new(domain: &str, token: &str) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Beacon-Sync/1.0")
            .build()
            .expect("failed to build HTTP client");
        Self {
            base_url: format!("https://{}", domain.trim_end_matches('/')),
            token: token.to_string(),
            http,
        }
    }

    /// Create a client against an explicit base URL with a custom
    /// reqwest::Client (useful for testing).
    pub fn with_base_url(base_url: &str, token: &str, http: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http,
        }
    }

    fn resource_url(&self, school_id: &str, resource: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}/v1/schools/{}/{}", self.base_url, school_id, resource);
        let mut sep = '?';
        for (key, value) in params {
            // Param values are dates, times, and flags; space is the only
            // character that needs escaping on this API.
            url.push(sep);
            url.push_str(key);
            url.push('=');
            url.push_str(&value.replace(' ', "%20"));
            sep = '&';
        }
        url
    }

    /// Fetch one page, retrying rate limits and transient failures.
    ///
    /// HTTP 429 sleeps for the provider's Retry-After hint (1s fallback)
    /// and retries without consuming the retry budget. Network errors and
    /// 5xx responses retry up to [`MAX_ATTEMPTS`] with linear-exponential
    /// backoff; other non-success statuses are terminal.
    async fn get_page<T: DeserializeOwned>(&self, url: &str) -> Result<Page<T>> {
        let mut attempt: u32 = 0;
        loop {
            debug!(url, attempt, "Fetching page");
            let outcome = self.http.get(url).bearer_auth(&self.token).send().await;

            let transient_error = match outcome {
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    let delay = response
                        .headers()
                        .get("Retry-After")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .map(Duration::from_secs)
                        .unwrap_or(RATE_LIMIT_FALLBACK);
                    warn!(url, delay_ms = delay.as_millis() as u64, "Rate limited, waiting");
                    tokio::time::sleep(delay).await;
                    continue;
                }
                Ok(response) if response.status().is_server_error() => {
                    format!("server returned {}", response.status())
                }
                Ok(response) if !response.status().is_success() => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(BeaconError::Sync(format!(
                        "request to {url} failed with status {status}: {body}"
                    )));
                }
                Ok(response) => {
                    let body = response.text().await?;
                    return serde_json::from_str(&body).map_err(|e| {
                        BeaconError::Sync(format!("failed to parse response from {url}: {e}"))
                    });
                }
                Err(e) => format!("request failed: {e}"),
            };

            attempt += 1;
            if attempt >= MAX_ATTEMPTS {
                return Err(BeaconError::Sync(format!(
                    "request to {url} failed after {attempt} attempts: {transient_error}"
                )));
            }
            let backoff = BACKOFF_BASE * attempt;
            warn!(
                url,
                attempt,
                backoff_ms = backoff.as_millis() as u64,
                error = %transient_error,
                "Transient failure, retrying"
            );
            tokio::time::sleep(backoff).await;
        }
    }

    /// Fetch every page of a resource, following the continuation cursor
    /// until the provider reports no more pages or the cursor is empty.
    async fn fetch_all<T: DeserializeOwned>(&self, first_url: String) -> Result<Vec<T>> {
        let mut results: Vec<T> = Vec::new();
        let mut url = first_url;
        let mut requests: u32 = 0;

        loop {
            let page: Page<T> = self.get_page(&url).await?;
            requests += 1;
            results.extend(page.data);

            let next = match page.meta.map(|m| m.pagination) {
                Some(p) if p.more => p.next.filter(|n| !n.is_empty()),
                _ => None,
            };
            match next {
                Some(next_url) => {
                    if requests >= MAX_REQUESTS_PER_FETCH {
                        warn!(
                            url = %next_url,
                            requests,
                            "Pagination safety ceiling reached, stopping fetch"
                        );
                        break;
                    }
                    url = next_url;
                }
                None => break,
            }
        }

        debug!(requests, records = results.len(), "Fetch complete");
        Ok(results)
    }

    pub async fn fetch_students(
        &self,
        school_id: &str,
        updated_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<super::models::WondeStudent>> {
        let mut params = vec![("include", "year".to_string()), ("per_page", "200".to_string())];
        if let Some(ts) = updated_after {
            params.push(("updated_after", format_updated_after(ts)));
        }
        self.fetch_all(self.resource_url(school_id, "students", &params))
            .await
    }

    pub async fn fetch_contacts(
        &self,
        school_id: &str,
        updated_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<super::models::WondeContact>> {
        let mut params = vec![
            ("include", "students".to_string()),
            ("per_page", "200".to_string()),
        ];
        if let Some(ts) = updated_after {
            params.push(("updated_after", format_updated_after(ts)));
        }
        self.fetch_all(self.resource_url(school_id, "contacts", &params))
            .await
    }

    pub async fn fetch_attendance(
        &self,
        school_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<super::models::WondeAttendanceMark>> {
        let params = vec![
            ("date", date.format("%Y-%m-%d").to_string()),
            ("per_page", "200".to_string()),
        ];
        self.fetch_all(self.resource_url(school_id, "attendance", &params))
            .await
    }

    pub async fn fetch_absences(
        &self,
        school_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<super::models::WondeAttendanceMark>> {
        let params = vec![
            ("from", from.format("%Y-%m-%d").to_string()),
            ("to", to.format("%Y-%m-%d").to_string()),
            ("per_page", "200".to_string()),
        ];
        self.fetch_all(self.resource_url(school_id, "absences", &params))
            .await
    }

    pub async fn fetch_classes(
        &self,
        school_id: &str,
        updated_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<super::models::WondeClass>> {
        let mut params = vec![
            ("include", "students".to_string()),
            ("per_page", "200".to_string()),
        ];
        if let Some(ts) = updated_after {
            params.push(("updated_after", format_updated_after(ts)));
        }
        self.fetch_all(self.resource_url(school_id, "classes", &params))
            .await
    }

    pub async fn fetch_lessons(
        &self,
        school_id: &str,
        updated_after: Option<DateTime<Utc>>,
    ) -> Result<Vec<super::models::WondeLesson>> {
        let mut params = vec![("per_page", "200".to_string())];
        if let Some(ts) = updated_after {
            params.push(("updated_after", format_updated_after(ts)));
        }
        self.fetch_all(self.resource_url(school_id, "lessons", &params))
            .await
    }

    /// Probe the API by requesting the first page of students.
    pub async fn test_connection(&self, school_id: &str) -> Result<()> {
        let params = vec![("per_page", "1".to_string())];
        let url = self.resource_url(school_id, "students", &params);
        let _: Page<super::models::WondeStudent> = self.get_page(&url).await?;
        Ok(())
    }
}
