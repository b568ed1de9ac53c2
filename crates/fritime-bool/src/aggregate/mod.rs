//! Fan-out of timetable fetches for a group of users.
//!
//! Every user's timetable is requested from the timetable service, the results
//! are flattened in user order and handed to the merge engine.

mod error;

pub use error::AggregateError;

use crate::config::Config;
use crate::term::{merge_overlapping_terms, Term};
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Identifier of a user in the timetable service.
pub type UserId = i64;

/// Path segment under which the timetable service serves per-user timetables.
const TIMETABLE_PATH: &str = "urniki";

/// Body of a timetable response.
#[derive(Debug, Deserialize)]
struct TimetableResponse {
    #[serde(default)]
    termini: Vec<Term>,
}

/// Client for the timetable service.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: String,
    max_concurrent_fetches: usize,
}

impl UpstreamClient {
    /// Creates a client for the timetable service at `base_url`.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the timetable service, without a trailing slash
    /// * `timeout` - Per-request timeout, covering connect, headers and body
    /// * `max_concurrent_fetches` - Upper bound on requests in flight per aggregation
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        max_concurrent_fetches: usize,
    ) -> Result<Self, AggregateError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AggregateError::Client {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            max_concurrent_fetches: max_concurrent_fetches.max(1),
        })
    }

    /// Creates a client from the service configuration.
    pub fn from_config(config: &Config) -> Result<Self, AggregateError> {
        Self::new(
            config.upstream_url.clone(),
            config.upstream_timeout,
            config.max_concurrent_fetches,
        )
    }

    fn timetable_url(&self, user_id: UserId) -> String {
        format!("{}/{TIMETABLE_PATH}/{user_id}", self.base_url)
    }

    /// Fetches the raw terms of a single user.
    pub async fn fetch_terms(&self, user_id: UserId) -> Result<Vec<Term>, AggregateError> {
        let url = self.timetable_url(user_id);
        debug!(user_id, url = %url, "Fetching timetable");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AggregateError::from_transport(user_id, e))?;

        // only 200 carries a timetable; other 2xx codes are passed on like errors
        let status = response.status();
        if status != StatusCode::OK {
            warn!(user_id, status = %status, "Timetable service returned unexpected status");
            return Err(AggregateError::Upstream { user_id, status });
        }

        let text = response
            .text()
            .await
            .map_err(|e| AggregateError::from_transport(user_id, e))?;

        let timetable: TimetableResponse =
            serde_json::from_str(&text).map_err(|e| AggregateError::MalformedTerms {
                user_id,
                message: e.to_string(),
            })?;

        debug!(user_id, terms = timetable.termini.len(), "Received timetable");

        Ok(timetable.termini)
    }

    /// Fetches every user's terms concurrently and merges them.
    ///
    /// The first failure in user order aborts the aggregation; fetches that are
    /// still outstanding at that point are dropped.
    pub async fn aggregate(&self, user_ids: &[UserId]) -> Result<Vec<Term>, AggregateError> {
        let per_user: Vec<Vec<Term>> = stream::iter(user_ids.iter().copied())
            .map(|user_id| self.fetch_terms(user_id))
            .buffered(self.max_concurrent_fetches)
            .try_collect()
            .await?;

        let terms: Vec<Term> = per_user.into_iter().flatten().collect();
        let fetched = terms.len();
        let merged = merge_overlapping_terms(terms);

        info!(
            users = user_ids.len(),
            fetched,
            merged = merged.len(),
            "Aggregated timetables"
        );

        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{spawn_upstream, term_json, Reply};
    use chrono::NaiveTime;
    use serde_json::json;

    fn client(base_url: String) -> UpstreamClient {
        UpstreamClient::new(base_url, Duration::from_secs(5), 4).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_terms_decodes_timetable() {
        let base_url = spawn_upstream(vec![(
            1,
            Reply::Terms(json!({ "termini": [term_json(10, 1, "08:00:00", 60)] })),
        )])
        .await;

        let terms = client(base_url).fetch_terms(1).await.unwrap();

        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].id, Some(10));
        assert_eq!(terms[0].start, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_missing_termini_is_empty() {
        let base_url = spawn_upstream(vec![(1, Reply::Terms(json!({})))]).await;

        let terms = client(base_url).fetch_terms(1).await.unwrap();

        assert!(terms.is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_merges_across_users() {
        let base_url = spawn_upstream(vec![
            (
                1,
                Reply::Terms(json!({ "termini": [
                    term_json(10, 1, "08:00:00", 90),
                    term_json(11, 2, "12:00:00", 60),
                ] })),
            ),
            (
                2,
                Reply::Terms(json!({ "termini": [term_json(20, 1, "09:00:00", 60)] })),
            ),
        ])
        .await;

        let merged = client(base_url).aggregate(&[1, 2]).await.unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, None);
        assert_eq!(merged[0].day.get(), 1);
        assert_eq!(merged[0].duration_minutes, 120);
        assert_eq!(merged[1].id, Some(11));
    }

    #[tokio::test]
    async fn test_aggregate_flattens_in_user_order() {
        // user 1 answers last; zero-length terms at the same start never merge
        let base_url = spawn_upstream(vec![
            (
                1,
                Reply::Delayed(
                    Duration::from_millis(200),
                    json!({ "termini": [term_json(10, 1, "08:00:00", 0)] }),
                ),
            ),
            (
                2,
                Reply::Terms(json!({ "termini": [
                    term_json(20, 1, "08:00:00", 0),
                    term_json(21, 1, "08:00:00", 0),
                ] })),
            ),
        ])
        .await;

        let ids: Vec<_> = client(base_url)
            .aggregate(&[1, 2])
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id)
            .collect();

        assert_eq!(ids, vec![Some(10), Some(20), Some(21)]);
    }

    #[tokio::test]
    async fn test_non_ok_success_status_is_upstream_error() {
        let base_url = spawn_upstream(vec![(1, Reply::Status(StatusCode::NO_CONTENT))]).await;

        let err = client(base_url).fetch_terms(1).await.unwrap_err();

        match err {
            AggregateError::Upstream { user_id, status } => {
                assert_eq!(user_id, 1);
                assert_eq!(status, StatusCode::NO_CONTENT);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_aggregate_without_users_fetches_nothing() {
        let merged = client("http://127.0.0.1:9".to_string())
            .aggregate(&[])
            .await
            .unwrap();

        assert!(merged.is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_fails_on_upstream_status() {
        let base_url = spawn_upstream(vec![
            (
                1,
                Reply::Terms(json!({ "termini": [term_json(10, 1, "08:00:00", 60)] })),
            ),
            (2, Reply::Status(StatusCode::NOT_FOUND)),
        ])
        .await;

        let err = client(base_url).aggregate(&[1, 2]).await.unwrap_err();

        match err {
            AggregateError::Upstream { user_id, status } => {
                assert_eq!(user_id, 2);
                assert_eq!(status, StatusCode::NOT_FOUND);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_aggregate_reports_first_failure_in_user_order() {
        let base_url = spawn_upstream(vec![
            (1, Reply::Status(StatusCode::SERVICE_UNAVAILABLE)),
            (2, Reply::Status(StatusCode::NOT_FOUND)),
        ])
        .await;

        let err = client(base_url).aggregate(&[1, 2]).await.unwrap_err();

        match err {
            AggregateError::Upstream { user_id, status } => {
                assert_eq!(user_id, 1);
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_terms_are_rejected() {
        let base_url = spawn_upstream(vec![(
            1,
            Reply::Terms(json!({ "termini": [term_json(10, 9, "08:00:00", 60)] })),
        )])
        .await;

        let err = client(base_url).aggregate(&[1]).await.unwrap_err();

        assert!(matches!(err, AggregateError::MalformedTerms { user_id: 1, .. }));
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let base_url =
            spawn_upstream(vec![(1, Reply::Stall(Duration::from_secs(2)))]).await;
        let client = UpstreamClient::new(base_url, Duration::from_millis(100), 4).unwrap();

        let err = client.aggregate(&[1]).await.unwrap_err();

        assert!(matches!(err, AggregateError::Timeout { user_id: 1 }));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_network_error() {
        let client = UpstreamClient::new("http://127.0.0.1:9", Duration::from_secs(2), 4).unwrap();

        let err = client.fetch_terms(7).await.unwrap_err();

        assert_eq!(err.user_id(), Some(7));
        assert!(matches!(
            err,
            AggregateError::Network { .. } | AggregateError::Timeout { .. }
        ));
    }
}
