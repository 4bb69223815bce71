//! Error types for the Snowflake SQL client.

use thiserror::Error;

/// Errors surfaced by the client, the response decoders, and the polling
/// service.
///
/// Decode failures are fatal to the current call and never retried here;
/// server-reported failures carry the server's own code/message and are
/// retried only at the caller's discretion.
#[derive(Error, Debug)]
pub enum SnowflakeSqlError {
    /// HTTP transport failure from the underlying client.
    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// The response body was not well-formed JSON for the expected envelope.
    #[error("response decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// The envelope came back with `success: false`; no payload
    /// discrimination was attempted.
    #[error("server reported failure (code {code:?}): {message}")]
    ServerReported {
        code: Option<String>,
        message: String,
    },

    /// A polled query settled in one of the error states.
    #[error("query failed (error code {error_code}): {error_message}")]
    QueryFailed {
        error_code: i64,
        error_message: String,
    },

    /// The poll was cancelled before completion; it must not be retried.
    #[error("poll cancelled")]
    Cancelled,

    /// Not Found (404) from the REST surface.
    #[error("Not Found (404)")]
    NotFound,

    /// Non-2xx response that is not a 404, with the raw body attached.
    #[error("API error: {0}")]
    Api(String),

    /// Catch-all for contract violations such as a missing query id.
    #[error("Unknown error: {0}")]
    Other(String),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SnowflakeSqlError>;
