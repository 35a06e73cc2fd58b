use crate::error::BulkError;
use crate::reconstruct::{FieldMap, Reconstructor};
use futures::StreamExt;
use serde_json::{json, Value};
use shopsync_client::GraphQlClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const POLL_CEILING: Duration = Duration::from_secs(30);
const POLL_BACKOFF_FACTOR: f64 = 1.5;

const TERMINAL_STATES: &[&str] = &["COMPLETED", "FAILED", "ACCESS_DENIED", "CANCELED"];

/// Launches and polls server-side bulk query operations for one tenant. The
/// platform permits at most one running bulk query per tenant, so submission
/// is serialized through an internal lock (spec §4.2 "Operation concurrency",
/// §5).
#[derive(Clone)]
pub struct BulkRuntime {
    client: GraphQlClient,
    poll_floor: Duration,
    submission_lock: Arc<Mutex<()>>,
}

impl BulkRuntime {
    pub fn new(client: GraphQlClient, poll_floor: Duration) -> Self {
        BulkRuntime {
            client,
            poll_floor,
            submission_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Runs one bulk query end-to-end: submit, poll to completion, download,
    /// reconstruct. Returns the finite set of reconstructed parent records.
    #[tracing::instrument(skip(self, query, field_map))]
    pub async fn run_query(&self, query: &str, field_map: &[(&str, &str)]) -> Result<Vec<Value>, BulkError> {
        let _permit = self.submission_lock.lock().await;

        let operation_id = self.submit(query).await?;
        let url = self.poll_to_terminal(&operation_id).await?;

        match url {
            None => Ok(Vec::new()),
            Some(url) => self.download_and_reconstruct(&url, FieldMap::new(field_map)).await,
        }
    }

    async fn submit(&self, query: &str) -> Result<String, BulkError> {
        const MUTATION: &str = r#"
            mutation RunBulkQuery($query: String!) {
                bulkOperationRunQuery(query: $query) {
                    bulkOperation { id status }
                    userErrors { field message }
                }
            }
        "#;
        let data = self.client.execute(MUTATION, json!({ "query": query })).await?;
        let result = &data["bulkOperationRunQuery"];
        if let Some(errors) = result.get("userErrors").and_then(Value::as_array) {
            if !errors.is_empty() {
                let joined = errors
                    .iter()
                    .filter_map(|e| e.get("message").and_then(Value::as_str))
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(BulkError::SubmissionFailed(joined));
            }
        }
        result["bulkOperation"]["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BulkError::SubmissionFailed("no operation id returned".to_string()))
    }

    /// Polls the operation until it reaches a terminal state, returning the
    /// result URL on success (`None` for an empty result set).
    async fn poll_to_terminal(&self, operation_id: &str) -> Result<Option<String>, BulkError> {
        const QUERY: &str = r#"
            query PollBulkOperation($id: ID!) {
                node(id: $id) {
                    ... on BulkOperation {
                        status
                        errorCode
                        url
                        partialDataUrl
                    }
                }
            }
        "#;

        let mut interval = self.poll_floor;
        loop {
            tokio::time::sleep(interval).await;

            let data = self.client.execute(QUERY, json!({ "id": operation_id })).await?;
            let node = &data["node"];
            let status = node["status"].as_str().unwrap_or("UNKNOWN").to_string();

            if TERMINAL_STATES.contains(&status.as_str()) {
                if status == "COMPLETED" {
                    let url = node["url"].as_str().map(str::to_string);
                    return Ok(url);
                }
                let detail = node["errorCode"]
                    .as_str()
                    .unwrap_or("no diagnostic provided")
                    .to_string();
                return Err(BulkError::TerminalFailure { status, detail });
            }

            let next_ms = (interval.as_secs_f64() * POLL_BACKOFF_FACTOR).min(POLL_CEILING.as_secs_f64());
            interval = Duration::from_secs_f64(next_ms);
        }
    }

    async fn download_and_reconstruct(&self, url: &str, field_map: FieldMap) -> Result<Vec<Value>, BulkError> {
        let response = reqwest::get(url)
            .await
            .map_err(|e| BulkError::DownloadFailed(e.to_string()))?;
        if !response.status().is_success() {
            return Err(BulkError::DownloadFailed(format!("status {}", response.status())));
        }

        let mut reconstructor = Reconstructor::new(field_map);
        let mut buffer = String::new();
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buffer.push_str(&String::from_utf8_lossy(&chunk));
            while let Some(pos) = buffer.find('\n') {
                let line = buffer[..pos].to_string();
                buffer.drain(..=pos);
                if let Err(err) = reconstructor.feed_line(&line) {
                    tracing::warn!(%err, "skipping malformed bulk result line");
                }
            }
        }
        if !buffer.trim().is_empty() {
            if let Err(err) = reconstructor.feed_line(&buffer) {
                tracing::warn!(%err, "skipping malformed bulk result line");
            }
        }
        reconstructor.finish();
        Ok(reconstructor.drain_ready())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_interval_backs_off_and_caps() {
        let mut interval = Duration::from_secs(1);
        for _ in 0..20 {
            let next = (interval.as_secs_f64() * POLL_BACKOFF_FACTOR).min(POLL_CEILING.as_secs_f64());
            interval = Duration::from_secs_f64(next);
        }
        assert_eq!(interval, POLL_CEILING);
    }
}
