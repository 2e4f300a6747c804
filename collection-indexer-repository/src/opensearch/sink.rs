//! OpenSearch implementation of [`SearchSink`].

use async_trait::async_trait;
use opensearch::{
    auth::Credentials,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    BulkParts, OpenSearch,
};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::config::SinkConfig;
use crate::errors::{RepositoryError, SinkError};
use crate::interfaces::SearchSink;
use crate::types::BulkAck;

/// Bulk sink posting NDJSON payloads to `/_bulk`.
pub struct OpenSearchSink {
    client: OpenSearch,
    timeout: Duration,
}

impl OpenSearchSink {
    /// Create a sink for the configured node.
    ///
    /// No request is sent; use [`OpenSearchSink::ping`] to check the node answers.
    pub fn new(config: &SinkConfig) -> Result<Self, RepositoryError> {
        let parsed_url =
            Url::parse(&config.url).map_err(|e| RepositoryError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let mut builder = TransportBuilder::new(conn_pool).disable_proxy();
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.auth(Credentials::Basic(username.clone(), password.clone()));
        }
        let transport = builder
            .build()
            .map_err(|e| RepositoryError::connection(e.to_string()))?;

        info!(
            url = %config.url,
            timeout_ms = config.timeout.as_millis() as u64,
            "Created OpenSearch sink"
        );

        Ok(Self {
            client: OpenSearch::new(transport),
            timeout: config.timeout,
        })
    }

    /// Check that the node answers.
    pub async fn ping(&self) -> Result<(), RepositoryError> {
        let response = self
            .client
            .ping()
            .request_timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RepositoryError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(RepositoryError::connection(format!("Ping failed with status {}", status)));
        }
        Ok(())
    }
}

#[async_trait]
impl SearchSink for OpenSearchSink {
    #[instrument(skip(self, payload), fields(bytes = payload.len()))]
    async fn bulk(&self, payload: &str) -> Result<BulkAck, SinkError> {
        let lines: Vec<String> = payload.lines().map(str::to_string).collect();
        debug!(method = "POST", endpoint = "/_bulk", lines = lines.len(), "Sending bulk request");

        let response = self
            .client
            .bulk(BulkParts::None)
            .body(lines)
            .request_timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SinkError::transport(e.to_string()))?;

        let status = response.status_code().as_u16();
        debug!(status = status, "Bulk response received");

        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = status, body = %error_body, "Bulk request failed");
            return Err(SinkError::from_status(status, error_body));
        }

        let body: Value = response.json().await.map_err(|e| SinkError::parse(e.to_string()))?;
        Ok(parse_bulk_response(status, &body))
    }
}

/// Read the acknowledged item count and error flag from a bulk response body.
fn parse_bulk_response(status: u16, body: &Value) -> BulkAck {
    BulkAck {
        status,
        items: body
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::len)
            .unwrap_or(0),
        errors: body.get("errors").and_then(Value::as_bool).unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_bulk_response() {
        let body = json!({
            "took": 3,
            "errors": true,
            "items": [
                { "index": { "_id": "1", "status": 201 } },
                { "delete": { "_id": "2", "status": 404 } }
            ]
        });
        assert_eq!(
            parse_bulk_response(200, &body),
            BulkAck { status: 200, items: 2, errors: true }
        );
    }

    #[test]
    fn test_parse_bulk_response_without_items() {
        assert_eq!(
            parse_bulk_response(200, &json!({})),
            BulkAck {
                status: 200,
                items: 0,
                errors: false
            }
        );
    }

    #[test]
    fn test_invalid_url() {
        let config = SinkConfig {
            url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(OpenSearchSink::new(&config), Err(RepositoryError::ConnectionError(_))));
    }
}
