//! Error types for sprintcord-core.

use thiserror::Error;

/// Startup configuration errors. Always fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// One or more required environment variables are unset or empty.
    #[error("missing required environment variable(s): {}", .vars.join(", "))]
    Missing { vars: Vec<&'static str> },

    /// A variable is set but its value cannot be used.
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// Failure of a single tracker or thread-platform call.
///
/// Gateway errors are scoped to the call that produced them; the sync engine
/// logs them per item and moves on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The remote answered with a non-success HTTP status.
    #[error("{service} returned HTTP {status} for {url}: {body}")]
    Status {
        service: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    /// Connection, TLS or timeout failure before a response arrived.
    #[error("{service} transport error for {url}: {message}")]
    Transport {
        service: &'static str,
        url: String,
        message: String,
    },

    /// The response body did not have the expected shape.
    #[error("{service} response decode error for {url}: {message}")]
    Decode {
        service: &'static str,
        url: String,
        message: String,
    },

    /// The referenced resource does not exist (or is not visible).
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was understood but refused by local validation.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl GatewayError {
    /// True for errors that mean "the thing is gone" rather than "try later".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GatewayError::NotFound(_) | GatewayError::Status { status: 404, .. }
        )
    }
}
