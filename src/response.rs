//! Response decoding and payload discrimination.
//!
//! The execute/describe envelope carries one flat optional-field payload that
//! stands in for three unrelated response kinds; the wire has no explicit
//! discriminant. Decoding therefore runs in two steps: deserialize the
//! envelope as-is, then resolve it into an explicit [`ExecPayload`] variant
//! so downstream code never has to guess which field group is valid.
//!
//! Discrimination precedence is fixed: file-transfer (`command` or
//! `stageInfo` present) wins over async-ping (`getResultUrl` present), which
//! wins over the plain result kind.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{Result, SnowflakeSqlError};
use crate::models::{
    Chunk, EncryptionMaterial, ExecResponse, ExecResponseData, NameValueParameter, OpaqueHandle,
    PollResponse, QueryPollStatus, RowType, StageInfo,
};
use crate::status::QueryStatus;

/// Result-set metadata handed to the row-materialization collaborator.
#[derive(Debug, Clone, Default)]
pub struct ResultSetPayload {
    pub query_id: Option<String>,
    pub sql_state: Option<String>,
    pub row_type: Vec<RowType>,
    /// Inline rows, string-encoded cells. Mutually exclusive with
    /// `row_set_base64` in practice.
    pub row_set: Vec<Vec<Option<String>>>,
    /// Opaque encoded alternative to `row_set`.
    pub row_set_base64: Option<String>,
    pub total: Option<i64>,
    pub returned: Option<i64>,
    pub chunks: Vec<Chunk>,
    /// Chunk decryption key.
    pub qrmk: Option<String>,
    pub chunk_headers: HashMap<String, String>,
    pub query_result_format: Option<String>,
    pub parameters: Vec<NameValueParameter>,
}

/// Async query still in progress; the poll collaborator follows
/// `get_result_url` and feeds the response back into [`decode_exec_response`].
#[derive(Debug, Clone, Default)]
pub struct AsyncPingPayload {
    pub get_result_url: Option<String>,
    pub progress_desc: Option<String>,
    pub query_abort_timeout: Option<Duration>,
    pub result_ids: Option<String>,
    pub result_types: Option<String>,
    pub query_result_format: Option<String>,
    pub query_id: Option<String>,
    /// Caller-owned materialized result, carried through untouched.
    pub async_result: Option<OpaqueHandle>,
    /// Caller-owned row stream, carried through untouched.
    pub async_rows: Option<OpaqueHandle>,
}

/// PUT/GET negotiation data handed to the file-transfer collaborator.
#[derive(Debug, Clone, Default)]
pub struct FileTransferPayload {
    pub command: Option<String>,
    pub kind: Option<String>,
    pub operation: Option<String>,
    pub stage_info: Option<StageInfo>,
    pub upload_info: Option<StageInfo>,
    pub local_location: Option<String>,
    pub src_locations: Vec<String>,
    pub parallel: Option<i64>,
    pub threshold: Option<i64>,
    pub auto_compress: Option<bool>,
    pub overwrite: Option<bool>,
    pub source_compression: Option<String>,
    pub encryption_material: Option<EncryptionMaterial>,
    pub presigned_urls: Vec<String>,
    pub query_id: Option<String>,
}

/// The execute/describe payload with its kind made explicit.
#[derive(Debug, Clone)]
pub enum ExecPayload {
    Result(ResultSetPayload),
    AsyncPing(AsyncPingPayload),
    FileTransfer(FileTransferPayload),
}

impl ExecResponseData {
    /// Resolves the flat wire payload into its kind.
    ///
    /// File-transfer presence is checked first, then the async ping, and the
    /// result kind is the default: a successful PUT/GET response also carries
    /// `rowtype`, so the order matters.
    pub fn into_payload(self) -> ExecPayload {
        if self.command.is_some() || self.stage_info.is_some() {
            ExecPayload::FileTransfer(FileTransferPayload {
                command: self.command,
                kind: self.kind,
                operation: self.operation,
                stage_info: self.stage_info,
                upload_info: self.upload_info,
                local_location: self.local_location,
                src_locations: self.src_locations.unwrap_or_default(),
                parallel: self.parallel,
                threshold: self.threshold,
                auto_compress: self.auto_compress,
                overwrite: self.overwrite,
                source_compression: self.source_compression,
                encryption_material: self.encryption_material,
                presigned_urls: self.presigned_urls.unwrap_or_default(),
                query_id: self.query_id,
            })
        } else if self.get_result_url.is_some() {
            ExecPayload::AsyncPing(AsyncPingPayload {
                query_abort_timeout: self.query_abort_timeout(),
                get_result_url: self.get_result_url,
                progress_desc: self.progress_desc,
                result_ids: self.result_ids,
                result_types: self.result_types,
                query_result_format: self.query_result_format,
                query_id: self.query_id,
                async_result: self.async_result,
                async_rows: self.async_rows,
            })
        } else {
            ExecPayload::Result(ResultSetPayload {
                query_id: self.query_id,
                sql_state: self.sql_state,
                row_type: self.row_type.unwrap_or_default(),
                row_set: self.row_set.unwrap_or_default(),
                row_set_base64: self.row_set_base64,
                total: self.total,
                returned: self.returned,
                chunks: self.chunks.unwrap_or_default(),
                qrmk: self.qrmk,
                chunk_headers: self.chunk_headers.unwrap_or_default(),
                query_result_format: self.query_result_format,
                parameters: self.parameters.unwrap_or_default(),
            })
        }
    }
}

impl ExecResponse {
    /// Checks the envelope and resolves the payload kind.
    ///
    /// `success: false` short-circuits: the envelope message/code are the
    /// failure and no discrimination is attempted.
    pub fn into_payload(self) -> Result<ExecPayload> {
        if !self.success {
            return Err(SnowflakeSqlError::ServerReported {
                code: self.code,
                message: self.message.unwrap_or_default(),
            });
        }
        Ok(self.data.into_payload())
    }
}

/// Aggregated verdict of one poll round over all reported queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Every reported query is still in a running state.
    StillRunning,
    /// At least one query settled in an error state; carries that query's
    /// error record.
    Failed {
        error_code: i64,
        error_message: String,
    },
    /// No errors and not everything is running: the queries have settled.
    Settled,
}

impl QueryPollStatus {
    /// Parsed status token (unknown tokens decode as `Running`).
    pub fn query_status(&self) -> QueryStatus {
        QueryStatus::from_wire(&self.status)
    }
}

impl PollResponse {
    /// Classifies the poll round.
    ///
    /// An unsuccessful envelope is surfaced as-is; its query records are only
    /// good for error reporting and must not drive the loop.
    pub fn outcome(&self) -> Result<PollOutcome> {
        if !self.success {
            return Err(SnowflakeSqlError::ServerReported {
                code: self.code.clone(),
                message: self.message.clone().unwrap_or_default(),
            });
        }
        for query in &self.data.queries {
            if query.query_status().is_error() {
                return Ok(PollOutcome::Failed {
                    error_code: query.error_code,
                    error_message: query.error_message.clone(),
                });
            }
        }
        let all_running = !self.data.queries.is_empty()
            && self
                .data
                .queries
                .iter()
                .all(|q| q.query_status().is_still_running());
        if all_running {
            Ok(PollOutcome::StillRunning)
        } else {
            Ok(PollOutcome::Settled)
        }
    }
}

/// Decodes raw wire bytes into the execute/describe envelope. Fails only on
/// structural malformation, never on unknown status vocabulary.
pub fn decode_exec_response(bytes: &[u8]) -> Result<ExecResponse> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Decodes raw wire bytes into the status-check envelope.
pub fn decode_poll_response(bytes: &[u8]) -> Result<PollResponse> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn exec_from(value: serde_json::Value) -> ExecResponse {
        decode_exec_response(value.to_string().as_bytes()).unwrap()
    }

    fn poll_from(value: serde_json::Value) -> PollResponse {
        decode_poll_response(value.to_string().as_bytes()).unwrap()
    }

    #[test]
    fn malformed_bytes_fail_with_decode_error() {
        let err = decode_exec_response(b"{not json").unwrap_err();
        assert!(matches!(err, SnowflakeSqlError::Decode(_)));
        let err = decode_poll_response(b"[]").unwrap_err();
        assert!(matches!(err, SnowflakeSqlError::Decode(_)));
    }

    #[test]
    fn rowset_without_stage_or_result_url_is_result_kind() {
        let resp = exec_from(json!({
            "data": {
                "rowtype": [{"name": "N", "type": "fixed", "nullable": false}],
                "rowset": [["1"]],
                "queryId": "q-1",
                "total": 1,
                "returned": 1,
            },
            "success": true,
        }));
        match resp.into_payload().unwrap() {
            ExecPayload::Result(result) => {
                assert_eq!(result.row_type.len(), 1);
                assert_eq!(result.row_set, vec![vec![Some("1".to_string())]]);
                assert_eq!(result.query_id.as_deref(), Some("q-1"));
            }
            other => panic!("expected result kind, got {other:?}"),
        }
    }

    #[test]
    fn result_url_without_rowtype_is_async_ping() {
        let resp = exec_from(json!({
            "data": {
                "getResultUrl": "/queries/abc/result",
                "progressDesc": "compiling",
                "queryAbortsAfterSecs": 300,
            },
            "success": true,
        }));
        match resp.into_payload().unwrap() {
            ExecPayload::AsyncPing(ping) => {
                assert_eq!(ping.get_result_url.as_deref(), Some("/queries/abc/result"));
                assert_eq!(
                    ping.query_abort_timeout,
                    Some(std::time::Duration::from_secs(300))
                );
            }
            other => panic!("expected async ping, got {other:?}"),
        }
    }

    #[test]
    fn stage_info_wins_over_result_url_and_rowtype() {
        let resp = exec_from(json!({
            "data": {
                "command": "UPLOAD",
                "stageInfo": {
                    "locationType": "S3",
                    "location": "stage/bucket",
                    "creds": {"AWS_KEY_ID": "key"},
                },
                "getResultUrl": "/queries/abc/result",
                "rowtype": [{"name": "status", "type": "text", "nullable": true}],
                "src_locations": ["/tmp/a.csv"],
                "parallel": 4,
            },
            "success": true,
        }));
        match resp.into_payload().unwrap() {
            ExecPayload::FileTransfer(transfer) => {
                assert_eq!(transfer.command.as_deref(), Some("UPLOAD"));
                assert_eq!(transfer.src_locations, vec!["/tmp/a.csv".to_string()]);
                let stage = transfer.stage_info.unwrap();
                assert_eq!(stage.location_type.as_deref(), Some("S3"));
                assert_eq!(
                    stage.creds.unwrap().aws_key_id.as_deref(),
                    Some("key")
                );
            }
            other => panic!("expected file transfer, got {other:?}"),
        }
    }

    #[test]
    fn failed_envelope_skips_discrimination() {
        let resp = exec_from(json!({
            "data": {"getResultUrl": "/ignored"},
            "message": "SQL compilation error",
            "code": "390201",
            "success": false,
        }));
        match resp.into_payload().unwrap_err() {
            SnowflakeSqlError::ServerReported { code, message } => {
                assert_eq!(code.as_deref(), Some("390201"));
                assert_eq!(message, "SQL compilation error");
            }
            other => panic!("expected server-reported error, got {other:?}"),
        }
    }

    #[test]
    fn running_query_keeps_polling() {
        let resp = poll_from(json!({
            "data": {"queries": [{"status": "RUNNING"}]},
            "success": true,
        }));
        assert_eq!(resp.outcome().unwrap(), PollOutcome::StillRunning);
    }

    #[test]
    fn failed_query_surfaces_error_record() {
        let resp = poll_from(json!({
            "data": {"queries": [
                {"status": "RUNNING"},
                {"status": "FAILED_WITH_ERROR", "errorCode": 1003,
                 "errorMessage": "syntax error"},
            ]},
            "success": true,
        }));
        assert_eq!(
            resp.outcome().unwrap(),
            PollOutcome::Failed {
                error_code: 1003,
                error_message: "syntax error".to_string(),
            }
        );
    }

    #[test]
    fn success_status_settles_the_poll() {
        let resp = poll_from(json!({
            "data": {"queries": [{"status": "SUCCESS"}]},
            "success": true,
        }));
        assert_eq!(resp.outcome().unwrap(), PollOutcome::Settled);
    }

    #[test]
    fn empty_query_list_is_settled() {
        let resp = poll_from(json!({"data": {"queries": []}, "success": true}));
        assert_eq!(resp.outcome().unwrap(), PollOutcome::Settled);
    }

    #[test]
    fn unknown_status_counts_as_still_running() {
        let resp = poll_from(json!({
            "data": {"queries": [{"status": "SOME_NEW_STATE"}]},
            "success": true,
        }));
        assert_eq!(resp.outcome().unwrap(), PollOutcome::StillRunning);
    }

    #[test]
    fn unsuccessful_poll_envelope_is_surfaced_directly() {
        let resp = poll_from(json!({
            "data": {"queries": [{"status": "FAILED_WITH_ERROR", "errorCode": 1}]},
            "message": "session expired",
            "code": "390112",
            "success": false,
        }));
        match resp.outcome().unwrap_err() {
            SnowflakeSqlError::ServerReported { code, message } => {
                assert_eq!(code.as_deref(), Some("390112"));
                assert_eq!(message, "session expired");
            }
            other => panic!("expected server-reported error, got {other:?}"),
        }
    }
}
