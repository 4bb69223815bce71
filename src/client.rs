//! HTTP client for the SQL REST endpoints.

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use crate::api::QueryApi;
use crate::error::{Result, SnowflakeSqlError};
use crate::models::{ExecRequest, ExecResponse, PollResponse};

/// Low-level client that directly calls the SQL REST endpoints.
///
/// Authentication (session token acquisition and renewal) happens elsewhere;
/// this client only attaches the token it was given.
#[derive(Debug, Clone)]
pub struct SnowflakeSqlClient {
    base_url: String,
    token: String,
    http_client: Client,
}

impl SnowflakeSqlClient {
    /// Creates a new client for the given account base URL and session token.
    ///
    /// Example base_url: https://myaccount.snowflakecomputing.com
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http_client: Client::new(),
        }
    }

    /// Helper to turn a raw HTTP response into a decoded envelope.
    ///
    /// Reads the body as text first so decode failures can be reported next
    /// to the offending payload.
    async fn handle_response<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        let text_body = resp.text().await?;

        debug!(%status, body_len = text_body.len(), "response received");

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(SnowflakeSqlError::NotFound);
        }
        if !status.is_success() {
            return Err(SnowflakeSqlError::Api(format!(
                "HTTP {}: {}",
                status, text_body
            )));
        }

        let envelope = serde_json::from_str(&text_body)?;
        Ok(envelope)
    }

    /// Resolves a possibly-relative result URL against the account base.
    fn resolve_url(&self, path_or_url: &str) -> String {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            path_or_url.to_string()
        } else {
            format!("{}{}", self.base_url, path_or_url)
        }
    }
}

impl QueryApi for SnowflakeSqlClient {
    /// POST /queries/v1/query-request
    /// Execute or describe a SQL statement.
    async fn execute(&self, request: &ExecRequest) -> Result<ExecResponse> {
        let url = format!("{}/queries/v1/query-request", self.base_url);

        debug!(
            sql_len = request.sql_text.len(),
            async_exec = request.async_exec,
            "executing statement"
        );

        let resp = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;

        self.handle_response(resp).await
    }

    /// GET /monitoring/queries/{query_id}
    /// Poll for the status of a query.
    async fn query_status(&self, query_id: &str) -> Result<PollResponse> {
        let url = format!("{}/monitoring/queries/{}", self.base_url, query_id);

        let resp = self
            .http_client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        self.handle_response(resp).await
    }

    /// GET {get_result_url}
    /// Fetch the result of an async query once the server says it is ready.
    async fn fetch_result(&self, get_result_url: &str) -> Result<ExecResponse> {
        let url = self.resolve_url(get_result_url);

        let resp = self
            .http_client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        self.handle_response(resp).await
    }

    /// POST /queries/v1/abort-request
    /// Request that a running query be aborted.
    async fn abort_query(&self, query_id: &str) -> Result<()> {
        let url = format!("{}/queries/v1/abort-request", self.base_url);

        let resp = self
            .http_client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "queryId": query_id }))
            .send()
            .await?;

        let status = resp.status();

        if !status.is_success() {
            let body = resp.text().await?;
            return Err(SnowflakeSqlError::Api(format!("HTTP {}: {}", status, body)));
        }

        // Abort response body carries no information we act on; a 2xx means
        // the request was accepted.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = SnowflakeSqlClient::new("https://acct.example.com/", "tok");
        assert_eq!(
            client.resolve_url("/queries/v1/abc"),
            "https://acct.example.com/queries/v1/abc"
        );
    }

    #[test]
    fn absolute_result_urls_are_left_alone() {
        let client = SnowflakeSqlClient::new("https://acct.example.com", "tok");
        assert_eq!(
            client.resolve_url("https://other.example.com/result"),
            "https://other.example.com/result"
        );
    }
}
