//! Server-side query status vocabulary and its classification.
//!
//! The server reports query state as an uppercase token (`"RUNNING"`,
//! `"FAILED_WITH_ERROR"`, ...). Each token maps to exactly one
//! [`QueryStatus`]; a token the client does not know maps to
//! [`QueryStatus::Running`]. That default is deliberate: the server's
//! vocabulary evolves independently of this client, and treating an
//! unrecognized state as "still running" keeps an in-flight polling loop
//! alive instead of failing on a forward-incompatible addition. The cost is
//! that a genuinely new *terminal* state would keep the loop polling until
//! the caller's own timeout fires.

use serde::{Deserialize, Serialize};

/// Query status as defined on the server side.
///
/// The wire mapping is [`from_wire`](Self::from_wire) / [`wire_name`](Self::wire_name),
/// not a serde derive: the tokens are not the variant names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QueryStatus {
    /// Also the decode default for unrecognized wire tokens.
    #[default]
    Running,
    Aborting,
    Success,
    FailedWithError,
    Aborted,
    Queued,
    FailedWithIncident,
    Disconnected,
    ResumingWarehouse,
    /// Present in the server's QueryDTO but rarely observed.
    QueueRepairingWarehouse,
    Restarted,
    /// Waiting on a lock held by another statement.
    Blocked,
    NoData,
}

/// Coarse classification of a [`QueryStatus`], used to drive the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Keep polling.
    StillRunning,
    /// Surface the query's error code/message and stop.
    Error,
    /// Terminal non-error state (`Success`, `Restarted`); the caller decides
    /// what to do with the settled query.
    Terminal,
}

impl QueryStatus {
    /// Parses a server status token. Total: any token outside the vocabulary
    /// yields `Running` (see the module docs for why).
    pub fn from_wire(token: &str) -> Self {
        match token {
            "RUNNING" => Self::Running,
            "ABORTING" => Self::Aborting,
            "SUCCESS" => Self::Success,
            "FAILED_WITH_ERROR" => Self::FailedWithError,
            "ABORTED" => Self::Aborted,
            "QUEUED" => Self::Queued,
            "FAILED_WITH_INCIDENT" => Self::FailedWithIncident,
            "DISCONNECTED" => Self::Disconnected,
            "RESUMING_WAREHOUSE" => Self::ResumingWarehouse,
            "QUEUED_REPAIRING_WAREHOUSE" => Self::QueueRepairingWarehouse,
            "RESTARTED" => Self::Restarted,
            "BLOCKED" => Self::Blocked,
            "NO_DATA" => Self::NoData,
            _ => Self::Running,
        }
    }

    /// The exact token the server uses for this status.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Aborting => "ABORTING",
            Self::Success => "SUCCESS",
            Self::FailedWithError => "FAILED_WITH_ERROR",
            Self::Aborted => "ABORTED",
            Self::Queued => "QUEUED",
            Self::FailedWithIncident => "FAILED_WITH_INCIDENT",
            Self::Disconnected => "DISCONNECTED",
            Self::ResumingWarehouse => "RESUMING_WAREHOUSE",
            Self::QueueRepairingWarehouse => "QUEUED_REPAIRING_WAREHOUSE",
            Self::Restarted => "RESTARTED",
            Self::Blocked => "BLOCKED",
            Self::NoData => "NO_DATA",
        }
    }

    /// Classification driving the poll loop. The match is exhaustive on
    /// purpose: adding a status member does not compile until it is placed
    /// in a class here.
    pub fn class(self) -> StatusClass {
        match self {
            Self::Running
            | Self::ResumingWarehouse
            | Self::Queued
            | Self::QueueRepairingWarehouse
            | Self::NoData => StatusClass::StillRunning,
            Self::Aborting
            | Self::FailedWithError
            | Self::Aborted
            | Self::FailedWithIncident
            | Self::Disconnected
            | Self::Blocked => StatusClass::Error,
            Self::Success | Self::Restarted => StatusClass::Terminal,
        }
    }

    /// True if the query settled in an error state.
    pub fn is_error(self) -> bool {
        self.class() == StatusClass::Error
    }

    /// True if the query has not settled yet and the caller should poll
    /// again.
    pub fn is_still_running(self) -> bool {
        self.class() == StatusClass::StillRunning
    }
}

/// Result serialization format negotiated with the server
/// (`queryResultFormat` on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    Json,
    Arrow,
}

impl ResultFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Arrow => "arrow",
        }
    }

    /// Parses the wire value; unknown formats are left to the caller.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "json" => Some(Self::Json),
            "arrow" => Some(Self::Arrow),
            _ => None,
        }
    }
}
