//! Client for the Snowflake SQL REST API.
//!
//! Covers the query surface: executing/describing statements, decoding the
//! shared response envelope into an explicit payload kind (result set, async
//! ping, or file-transfer negotiation), classifying server-reported query
//! status, and polling async queries until they settle.
//!
//! Row materialization, chunk download and file upload/download execution are
//! out of scope; this crate hands the discriminated payload to those layers.

pub mod api;
pub mod client;
pub mod error;
pub mod models;
pub mod response;
pub mod service;
pub mod status;

pub use api::QueryApi;
pub use client::SnowflakeSqlClient;
pub use error::{Result, SnowflakeSqlError};
pub use models::{
    BindParameter, Chunk, EncryptionMaterial, ExecRequest, ExecResponse, ExecResponseData,
    NameValueParameter, OpaqueHandle, PollResponse, QueryPollStatus, RowType, StageCredentials,
    StageInfo,
};
pub use response::{
    decode_exec_response, decode_poll_response, AsyncPingPayload, ExecPayload,
    FileTransferPayload, PollOutcome, ResultSetPayload,
};
pub use service::SnowflakeSqlService;
pub use status::{QueryStatus, ResultFormat, StatusClass};
