//! Wire models for the Snowflake SQL REST surface.
//!
//! Field names are case-sensitive and follow the server exactly (`rowtype`,
//! `rowsetbase64`, `AWS_KEY_ID`, ...). Every payload field is optional and
//! omitted when absent: the execute/describe call, the async ping and the
//! file-transfer negotiation all answer with the same envelope shape and
//! only populate the fields of their own kind. Discrimination between kinds
//! lives in [`crate::response`].

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One bound parameter of a request (`bindings` map value).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BindParameter {
    #[serde(rename = "type")]
    pub param_type: String,
    pub value: serde_json::Value,
}

/// Request body for the execute/describe endpoint.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct ExecRequest {
    #[serde(rename = "sqlText")]
    pub sql_text: String,

    #[serde(rename = "asyncExec")]
    pub async_exec: bool,

    #[serde(rename = "sequenceId")]
    pub sequence_id: u64,

    #[serde(rename = "isInternal")]
    pub is_internal: bool,

    #[serde(rename = "describeOnly", skip_serializing_if = "std::ops::Not::not", default)]
    pub describe_only: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, serde_json::Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bindings: Option<HashMap<String, BindParameter>>,

    #[serde(rename = "bindStage", skip_serializing_if = "Option::is_none")]
    pub bind_stage: Option<String>,
}

/// One column descriptor of a result set (`rowtype` entry).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RowType {
    pub name: String,
    #[serde(rename = "byteLength")]
    pub byte_length: Option<i64>,
    pub length: Option<i64>,
    #[serde(rename = "type")]
    pub column_type: String,
    pub precision: Option<i64>,
    pub scale: Option<i64>,
    pub nullable: bool,
}

/// Descriptor of a remote result chunk to be fetched separately.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Chunk {
    pub url: String,
    #[serde(rename = "rowCount")]
    pub row_count: i64,
    #[serde(rename = "uncompressedSize")]
    pub uncompressed_size: i64,
    #[serde(rename = "compressedSize")]
    pub compressed_size: i64,
}

/// Cloud credentials attached to a stage. The server sends whichever subset
/// matches the stage's provider.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct StageCredentials {
    #[serde(rename = "AWS_KEY_ID", skip_serializing_if = "Option::is_none")]
    pub aws_key_id: Option<String>,
    #[serde(rename = "AWS_SECRET_KEY", skip_serializing_if = "Option::is_none")]
    pub aws_secret_key: Option<String>,
    #[serde(rename = "AWS_TOKEN", skip_serializing_if = "Option::is_none")]
    pub aws_token: Option<String>,
    #[serde(rename = "AWS_ID", skip_serializing_if = "Option::is_none")]
    pub aws_id: Option<String>,
    #[serde(rename = "AWS_KEY", skip_serializing_if = "Option::is_none")]
    pub aws_key: Option<String>,
    #[serde(rename = "AZURE_SAS_TOKEN", skip_serializing_if = "Option::is_none")]
    pub azure_sas_token: Option<String>,
    #[serde(rename = "GCS_ACCESS_TOKEN", skip_serializing_if = "Option::is_none")]
    pub gcs_access_token: Option<String>,
}

/// Stage location and access description for PUT/GET negotiation.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct StageInfo {
    #[serde(rename = "locationType", skip_serializing_if = "Option::is_none")]
    pub location_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(rename = "storageAccount", skip_serializing_if = "Option::is_none")]
    pub storage_account: Option<String>,
    #[serde(rename = "isClientSideEncrypted", default)]
    pub is_client_side_encrypted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creds: Option<StageCredentials>,
    #[serde(rename = "presignedUrl", skip_serializing_if = "Option::is_none")]
    pub presigned_url: Option<String>,
    #[serde(rename = "endPoint", skip_serializing_if = "Option::is_none")]
    pub end_point: Option<String>,
}

/// Client-side encryption material for staged files.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct EncryptionMaterial {
    #[serde(rename = "queryStageMasterKey", skip_serializing_if = "Option::is_none")]
    pub query_stage_master_key: Option<String>,
    #[serde(rename = "queryId", skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
    #[serde(rename = "smkId", skip_serializing_if = "Option::is_none")]
    pub smk_id: Option<i64>,
}

/// Session parameter reported back by the server (`parameters` entry).
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NameValueParameter {
    pub name: String,
    pub value: serde_json::Value,
}

/// Opaque reference to an already-materialized async result or row stream.
///
/// These objects are owned by the caller; this crate carries them through the
/// payload without inspecting their internals.
#[derive(Clone)]
pub struct OpaqueHandle(Arc<dyn Any + Send + Sync>);

impl OpaqueHandle {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl fmt::Debug for OpaqueHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OpaqueHandle")
    }
}

/// Payload of the execute/describe response. All fields optional: exactly
/// one kind's field group is meaningfully populated per response, but the
/// wire carries no discriminant. Use [`into_payload`] rather than poking at
/// field groups directly.
///
/// [`into_payload`]: ExecResponseData::into_payload
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct ExecResponseData {
    // Succeeded-query response data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<NameValueParameter>>,
    #[serde(rename = "rowtype", skip_serializing_if = "Option::is_none")]
    pub row_type: Option<Vec<RowType>>,
    #[serde(rename = "rowset", skip_serializing_if = "Option::is_none")]
    pub row_set: Option<Vec<Vec<Option<String>>>>,
    #[serde(rename = "rowsetbase64", skip_serializing_if = "Option::is_none")]
    pub row_set_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returned: Option<i64>,
    #[serde(rename = "queryId", skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
    #[serde(rename = "sqlState", skip_serializing_if = "Option::is_none")]
    pub sql_state: Option<String>,
    #[serde(rename = "databaseProvider", skip_serializing_if = "Option::is_none")]
    pub database_provider: Option<String>,
    #[serde(rename = "finalDatabaseName", skip_serializing_if = "Option::is_none")]
    pub final_database_name: Option<String>,
    #[serde(rename = "finalSchemaName", skip_serializing_if = "Option::is_none")]
    pub final_schema_name: Option<String>,
    #[serde(rename = "finalWarehouseName", skip_serializing_if = "Option::is_none")]
    pub final_warehouse_name: Option<String>,
    #[serde(rename = "finalRoleName", skip_serializing_if = "Option::is_none")]
    pub final_role_name: Option<String>,
    #[serde(rename = "numberOfBinds", skip_serializing_if = "Option::is_none")]
    pub number_of_binds: Option<i64>,
    #[serde(rename = "statementTypeId", skip_serializing_if = "Option::is_none")]
    pub statement_type_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks: Option<Vec<Chunk>>,
    /// Key for decrypting remote chunks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qrmk: Option<String>,
    #[serde(rename = "chunkHeaders", skip_serializing_if = "Option::is_none")]
    pub chunk_headers: Option<HashMap<String, String>>,

    // Ping-pong (async query in progress) response data.
    #[serde(rename = "getResultUrl", skip_serializing_if = "Option::is_none")]
    pub get_result_url: Option<String>,
    #[serde(rename = "progressDesc", skip_serializing_if = "Option::is_none")]
    pub progress_desc: Option<String>,
    #[serde(rename = "queryAbortsAfterSecs", skip_serializing_if = "Option::is_none")]
    pub query_aborts_after_secs: Option<u64>,
    #[serde(rename = "resultIds", skip_serializing_if = "Option::is_none")]
    pub result_ids: Option<String>,
    #[serde(rename = "resultTypes", skip_serializing_if = "Option::is_none")]
    pub result_types: Option<String>,
    /// "json" or "arrow"; see [`crate::status::ResultFormat`].
    #[serde(rename = "queryResultFormat", skip_serializing_if = "Option::is_none")]
    pub query_result_format: Option<String>,

    // Caller-owned async result placeholders, never on the wire.
    #[serde(skip)]
    pub async_result: Option<OpaqueHandle>,
    #[serde(skip)]
    pub async_rows: Option<OpaqueHandle>,

    // File-transfer (PUT/GET) response data.
    #[serde(rename = "uploadInfo", skip_serializing_if = "Option::is_none")]
    pub upload_info: Option<StageInfo>,
    #[serde(rename = "localLocation", skip_serializing_if = "Option::is_none")]
    pub local_location: Option<String>,
    #[serde(rename = "src_locations", skip_serializing_if = "Option::is_none")]
    pub src_locations: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<i64>,
    #[serde(rename = "autoCompress", skip_serializing_if = "Option::is_none")]
    pub auto_compress: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
    #[serde(rename = "sourceCompression", skip_serializing_if = "Option::is_none")]
    pub source_compression: Option<String>,
    #[serde(
        rename = "clientShowEncryptionParameter",
        skip_serializing_if = "Option::is_none"
    )]
    pub show_encryption_parameter: Option<bool>,
    #[serde(rename = "encryptionMaterial", skip_serializing_if = "Option::is_none")]
    pub encryption_material: Option<EncryptionMaterial>,
    #[serde(rename = "presignedUrls", skip_serializing_if = "Option::is_none")]
    pub presigned_urls: Option<Vec<String>>,
    #[serde(rename = "stageInfo", skip_serializing_if = "Option::is_none")]
    pub stage_info: Option<StageInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

impl ExecResponseData {
    /// Server-granted abort timeout for an async query, if one was reported.
    pub fn query_abort_timeout(&self) -> Option<Duration> {
        self.query_aborts_after_secs.map(Duration::from_secs)
    }
}

/// Envelope of the execute/describe response.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct ExecResponse {
    #[serde(default)]
    pub data: ExecResponseData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub success: bool,
}

/// Status of one query in a poll response.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct QueryPollStatus {
    pub status: String,
    #[serde(rename = "errorMessage", default)]
    pub error_message: String,
    #[serde(rename = "errorCode", default)]
    pub error_code: i64,
}

/// `data` object of the poll response envelope.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct PollResponseData {
    #[serde(default)]
    pub queries: Vec<QueryPollStatus>,
}

/// Envelope of the lightweight status-check response.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct PollResponse {
    #[serde(default)]
    pub data: PollResponseData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn exec_request_wire_names() {
        let request = ExecRequest {
            sql_text: "SELECT 1".to_string(),
            async_exec: true,
            sequence_id: 7,
            is_internal: false,
            describe_only: false,
            parameters: None,
            bindings: Some(HashMap::from([(
                "1".to_string(),
                BindParameter {
                    param_type: "FIXED".to_string(),
                    value: json!("42"),
                },
            )])),
            bind_stage: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "sqlText": "SELECT 1",
                "asyncExec": true,
                "sequenceId": 7,
                "isInternal": false,
                "bindings": {"1": {"type": "FIXED", "value": "42"}},
            })
        );
    }

    #[test]
    fn describe_only_serialized_when_set() {
        let request = ExecRequest {
            sql_text: "SELECT 1".to_string(),
            describe_only: true,
            ..Default::default()
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["describeOnly"], json!(true));
    }

    #[test]
    fn stage_credentials_use_provider_wire_names() {
        let body = json!({
            "AWS_KEY_ID": "key",
            "AWS_SECRET_KEY": "secret",
            "AWS_TOKEN": "token",
            "AZURE_SAS_TOKEN": "sas",
            "GCS_ACCESS_TOKEN": "gcs",
        });
        let creds: StageCredentials = serde_json::from_value(body.clone()).unwrap();
        assert_eq!(creds.aws_key_id.as_deref(), Some("key"));
        assert_eq!(creds.azure_sas_token.as_deref(), Some("sas"));
        assert_eq!(creds.gcs_access_token.as_deref(), Some("gcs"));
        assert_eq!(serde_json::to_value(&creds).unwrap(), body);
    }

    #[test]
    fn exec_response_round_trip_preserves_populated_fields() {
        let body = json!({
            "data": {
                "rowtype": [{
                    "name": "C1",
                    "byteLength": 16,
                    "length": 16,
                    "type": "fixed",
                    "precision": 38,
                    "scale": 0,
                    "nullable": false,
                }],
                "rowset": [["1", null]],
                "total": 1,
                "returned": 1,
                "queryId": "01b2-0000",
                "sqlState": "00000",
                "queryResultFormat": "json",
                "chunks": [{
                    "url": "https://chunks.example/0",
                    "rowCount": 100,
                    "uncompressedSize": 4096,
                    "compressedSize": 1024,
                }],
                "qrmk": "mk",
                "chunkHeaders": {"x-amz-server-side-encryption-customer-key": "hdr"},
            },
            "message": null,
            "code": null,
            "success": true,
        });

        let decoded: ExecResponse = serde_json::from_value(body).unwrap();
        assert!(decoded.success);
        let reencoded = serde_json::to_value(&decoded).unwrap();
        // Null message/code are omitted on re-encode; everything populated
        // must survive.
        assert_eq!(reencoded["data"]["rowtype"][0]["name"], json!("C1"));
        assert_eq!(reencoded["data"]["rowset"], json!([["1", null]]));
        assert_eq!(reencoded["data"]["queryId"], json!("01b2-0000"));
        assert_eq!(reencoded["data"]["chunks"][0]["rowCount"], json!(100));
        assert_eq!(reencoded["data"]["qrmk"], json!("mk"));
        assert_eq!(
            reencoded["data"]["chunkHeaders"]["x-amz-server-side-encryption-customer-key"],
            json!("hdr")
        );
        assert_eq!(reencoded["success"], json!(true));
    }

    #[test]
    fn poll_response_round_trip() {
        let body = json!({
            "data": {
                "queries": [{
                    "status": "FAILED_WITH_ERROR",
                    "errorMessage": "syntax error",
                    "errorCode": 1003,
                }],
            },
            "success": true,
        });
        let decoded: PollResponse = serde_json::from_value(body).unwrap();
        assert_eq!(decoded.data.queries.len(), 1);
        assert_eq!(decoded.data.queries[0].error_code, 1003);

        let reencoded = serde_json::to_value(&decoded).unwrap();
        assert_eq!(
            reencoded["data"]["queries"][0],
            json!({
                "status": "FAILED_WITH_ERROR",
                "errorMessage": "syntax error",
                "errorCode": 1003,
            })
        );
    }

    #[test]
    fn poll_status_defaults_for_absent_error_fields() {
        let record: QueryPollStatus =
            serde_json::from_value(json!({"status": "RUNNING"})).unwrap();
        assert_eq!(record.status, "RUNNING");
        assert_eq!(record.error_code, 0);
        assert_eq!(record.error_message, "");
    }

    #[test]
    fn abort_timeout_converts_to_duration() {
        let data: ExecResponseData =
            serde_json::from_value(json!({"queryAbortsAfterSecs": 300})).unwrap();
        assert_eq!(
            data.query_abort_timeout(),
            Some(std::time::Duration::from_secs(300))
        );
    }

    #[test]
    fn opaque_handles_pass_through_untouched() {
        let data = ExecResponseData {
            async_result: Some(OpaqueHandle::new(42_u32)),
            ..Default::default()
        };
        let value = serde_json::to_value(&data).unwrap();
        assert_eq!(value, json!({}));
        assert_eq!(data.async_result.unwrap().downcast_ref::<u32>(), Some(&42));
    }
}
