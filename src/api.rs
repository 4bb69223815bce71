//! Abstract surface of the SQL REST endpoints used by the service layer.

use crate::error::Result;
use crate::models::{ExecRequest, ExecResponse, PollResponse};

/// The query endpoints of the SQL REST API.
///
/// Implemented by [`SnowflakeSqlClient`](crate::client::SnowflakeSqlClient)
/// over HTTP and by test doubles in the service tests.
pub trait QueryApi {
    /// POST /queries/v1/query-request
    /// Execute or describe a SQL statement.
    async fn execute(&self, request: &ExecRequest) -> Result<ExecResponse>;

    /// GET /monitoring/queries/{query_id}
    /// Lightweight status check for a (possibly async) query.
    async fn query_status(&self, query_id: &str) -> Result<PollResponse>;

    /// GET {get_result_url}
    /// Follow-up fetch for an async query; the response re-enters the
    /// execute-response decoder.
    async fn fetch_result(&self, get_result_url: &str) -> Result<ExecResponse>;

    /// POST /queries/v1/abort-request
    /// Request that a running query be aborted.
    async fn abort_query(&self, query_id: &str) -> Result<()>;
}
