//! Higher-level service built on top of the query API.
//!
//! Provides the polling loop for async queries: time-bounded, cancellable,
//! driven by the status classifier. Retry and backoff policy lives here, not
//! in the decoders.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::QueryApi;
use crate::error::{Result, SnowflakeSqlError};
use crate::models::ExecRequest;
use crate::response::{ExecPayload, PollOutcome};

/// Service layer over any [`QueryApi`] implementation.
#[derive(Debug, Clone)]
pub struct SnowflakeSqlService<C> {
    client: C,
}

impl<C: QueryApi> SnowflakeSqlService<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying client (for direct calls).
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Polls a query until it settles or fails.
    ///
    /// One status round trip per iteration, `poll_interval` sleep in between,
    /// at most `max_polls` still-running rounds. Cancellation is checked
    /// before each round trip; a cancelled poll is not retried.
    pub async fn poll_query_until_done(
        &self,
        query_id: &str,
        poll_interval: Duration,
        max_polls: usize,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut polls = 0;
        loop {
            if cancel.is_cancelled() {
                return Err(SnowflakeSqlError::Cancelled);
            }

            let resp = self.client.query_status(query_id).await?;
            match resp.outcome()? {
                PollOutcome::StillRunning => {
                    polls += 1;
                    debug!(query_id, polls, "query still running");
                    if polls >= max_polls {
                        return Err(SnowflakeSqlError::Other(
                            "max polls reached before query settled".into(),
                        ));
                    }
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(SnowflakeSqlError::Cancelled),
                        _ = tokio::time::sleep(poll_interval) => {}
                    }
                }
                PollOutcome::Failed {
                    error_code,
                    error_message,
                } => {
                    warn!(query_id, error_code, "query failed");
                    return Err(SnowflakeSqlError::QueryFailed {
                        error_code,
                        error_message,
                    });
                }
                PollOutcome::Settled => return Ok(()),
            }
        }
    }

    /// Executes a statement and chases async pings until a non-ping payload
    /// comes back.
    ///
    /// Each ping's `getResultUrl` is fetched and the response re-enters the
    /// decoder; `max_follow_ups` bounds the chase.
    pub async fn execute_and_resolve(
        &self,
        request: &ExecRequest,
        max_follow_ups: usize,
    ) -> Result<ExecPayload> {
        let mut payload = self.client.execute(request).await?.into_payload()?;
        let mut follow_ups = 0;
        while let ExecPayload::AsyncPing(ping) = payload {
            let url = match &ping.get_result_url {
                Some(url) => url.clone(),
                // A ping without a result URL cannot be chased; hand it to
                // the caller as-is.
                None => return Ok(ExecPayload::AsyncPing(ping)),
            };
            follow_ups += 1;
            if follow_ups > max_follow_ups {
                return Err(SnowflakeSqlError::Other(
                    "max follow-ups reached while query still in progress".into(),
                ));
            }
            debug!(%url, follow_ups, "following async ping");
            payload = self.client.fetch_result(&url).await?.into_payload()?;
        }
        Ok(payload)
    }

    /// Executes a statement asynchronously, polls its status until it
    /// settles, then fetches and resolves the final payload.
    pub async fn execute_and_poll(
        &self,
        request: &ExecRequest,
        poll_interval: Duration,
        max_polls: usize,
        cancel: &CancellationToken,
    ) -> Result<ExecPayload> {
        // Force asynchronous mode so the first response is a ping.
        let async_req = ExecRequest {
            async_exec: true,
            ..request.clone()
        };

        let payload = self.client.execute(&async_req).await?.into_payload()?;
        let ping = match payload {
            ExecPayload::AsyncPing(ping) => ping,
            // The server answered inline anyway.
            other => return Ok(other),
        };

        let query_id = ping.query_id.clone().ok_or_else(|| {
            SnowflakeSqlError::Other("no query id in async execute response".into())
        })?;
        self.poll_query_until_done(&query_id, poll_interval, max_polls, cancel)
            .await?;

        let url = ping.get_result_url.ok_or_else(|| {
            SnowflakeSqlError::Other("no result url in async execute response".into())
        })?;
        self.client.fetch_result(&url).await?.into_payload()
    }
}
