//! Domain error types
//!
//! Record-level validation failures, transport failures of the snapshot
//! source, and general domain errors (bad selectors, bad timestamps).

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A selector string was neither `true` nor `false`
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    /// A timestamp did not match the wire format
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Why a single incoming record was rejected before any mutation
///
/// A rejected record is skipped with a warning line; its siblings are
/// still processed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// The record is not a JSON object
    #[error("record is not an object")]
    NotAnObject,

    /// A required field is absent or null
    #[error("missing required field {0}")]
    MissingField(String),

    /// A field is present but has the wrong type or shape
    #[error("malformed value: {0}")]
    Malformed(String),
}

/// Typed failure of a snapshot fetch
///
/// Every variant ends the current run before any section is reconciled.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection could not be established or was interrupted
    #[error("network error: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The server answered with a non-success HTTP status
    #[error("unexpected HTTP status {status}")]
    Protocol {
        /// HTTP status code returned by the server
        status: u16,
    },

    /// The body was unparsable or did not carry `status: "ok"`
    #[error("bad response: {0}")]
    BadResponse(String),
}

impl FetchError {
    /// Short machine-friendly name of the failure kind, used in log fields
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Network(_) => "network",
            FetchError::Timeout(_) => "timeout",
            FetchError::Protocol { .. } => "protocol",
            FetchError::BadResponse(_) => "bad_response",
        }
    }
}
