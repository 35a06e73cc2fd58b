use crate::cost::CostTracker;
use crate::retry::RetryPolicy;
use serde::Serialize;
use serde_json::Value;
use shopsync_core::redact;
use std::sync::Arc;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("transport error calling {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("throttled after exhausting retries against {endpoint}")]
    Throttled { endpoint: String },
    #[error("graphql errors: {0:?}")]
    GraphQl(Vec<String>),
}

/// Single typed entry point for one tenant's admin GraphQL API (spec §4.1).
/// Cheap to clone: the inner `reqwest::Client` pools connections.
#[derive(Clone)]
pub struct GraphQlClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: reqwest::Client,
    endpoint: Url,
    access_token: String,
    cost: CostTracker,
}

#[derive(Serialize)]
struct Body<'a> {
    query: &'a str,
    variables: &'a Value,
}

#[derive(serde::Deserialize)]
struct GraphQlResponse {
    data: Option<Value>,
    errors: Option<Vec<GraphQlError>>,
    extensions: Option<Value>,
}

#[derive(serde::Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(default)]
    extensions: Option<Value>,
}

impl GraphQlError {
    fn is_transient(&self) -> bool {
        let code = self
            .extensions
            .as_ref()
            .and_then(|e| e.get("code"))
            .and_then(Value::as_str)
            .unwrap_or("");
        matches!(code, "THROTTLED" | "MAX_COST_EXCEEDED")
            || self.message.to_lowercase().contains("throttled")
            || self.message.to_lowercase().contains("exceeded the cost budget")
    }
}

impl GraphQlClient {
    pub fn new(shop_domain: &str, access_token: &str, api_version: &str) -> Result<Self, url::ParseError> {
        let endpoint = Url::parse(&format!(
            "https://{shop_domain}/admin/api/{api_version}/graphql.json"
        ))?;
        Ok(GraphQlClient {
            inner: Arc::new(Inner {
                http: reqwest::Client::builder()
                    .timeout(std::time::Duration::from_secs(60))
                    .build()
                    .expect("reqwest client builds"),
                endpoint,
                access_token: access_token.to_string(),
                cost: CostTracker::new(),
            }),
        })
    }

    /// Issues one GraphQL document with variables, retrying on transport
    /// failures and transient in-band throttle/cost signals. `userErrors`
    /// embedded in `data` are returned to the caller untouched — they are a
    /// per-record concern, not a transport concern (spec §4.1).
    #[tracing::instrument(skip(self, variables), fields(endpoint = %redact::redact_url(self.inner.endpoint.as_str())))]
    pub async fn execute(&self, query: &str, variables: Value) -> Result<Value, ClientError> {
        let delay = self.inner.cost.throttle_delay();
        if !delay.is_zero() {
            tracing::debug!(?delay, "pacing request to respect remaining cost budget");
            tokio::time::sleep(delay).await;
        }

        let policy = RetryPolicy::new();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let body = Body { query, variables: &variables };
            let result = self
                .inner
                .http
                .post(self.inner.endpoint.clone())
                .header("X-Shopify-Access-Token", &self.inner.access_token)
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            let transient = match &result {
                Ok(resp) if resp.status().as_u16() == 429 => true,
                Err(err) => err.is_timeout() || err.is_connect() || err.is_request(),
                _ => false,
            };

            if transient {
                if let Some(wait) = policy.delay_for_attempt(attempt) {
                    tracing::warn!(attempt, ?wait, "transient failure, retrying");
                    tokio::time::sleep(wait).await;
                    continue;
                }
                return Err(ClientError::Throttled {
                    endpoint: self.inner.endpoint.to_string(),
                });
            }

            let response = result.map_err(|source| ClientError::Transport {
                endpoint: self.inner.endpoint.to_string(),
                source,
            })?;

            let parsed: GraphQlResponse = response.json().await.map_err(|source| ClientError::Transport {
                endpoint: self.inner.endpoint.to_string(),
                source,
            })?;

            self.inner.cost.observe(parsed.extensions.as_ref());

            if let Some(errors) = &parsed.errors {
                if errors.iter().any(GraphQlError::is_transient) {
                    if let Some(wait) = policy.delay_for_attempt(attempt) {
                        tracing::warn!(attempt, ?wait, "throttled by server, retrying");
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    return Err(ClientError::Throttled {
                        endpoint: self.inner.endpoint.to_string(),
                    });
                }
                return Err(ClientError::GraphQl(
                    errors.iter().map(|e| e.message.clone()).collect(),
                ));
            }

            return Ok(parsed.data.unwrap_or(Value::Null));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_error_detection_matches_known_codes() {
        let throttled = GraphQlError {
            message: "Throttled".to_string(),
            extensions: Some(serde_json::json!({"code": "THROTTLED"})),
        };
        assert!(throttled.is_transient());

        let cost = GraphQlError {
            message: "This query was rejected because it exceeded the cost budget".to_string(),
            extensions: None,
        };
        assert!(cost.is_transient());

        let user_error = GraphQlError {
            message: "Field 'bogus' doesn't exist".to_string(),
            extensions: Some(serde_json::json!({"code": "GRAPHQL_VALIDATION_FAILED"})),
        };
        assert!(!user_error.is_transient());
    }

    #[test]
    fn endpoint_url_is_versioned() {
        let client = GraphQlClient::new("my-shop.myshopify.com", "tok", "2025-10").unwrap();
        assert_eq!(
            client.inner.endpoint.as_str(),
            "https://my-shop.myshopify.com/admin/api/2025-10/graphql.json"
        );
    }
}
