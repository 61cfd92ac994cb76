//! Shared error type across roomcast crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// Unknown or malformed session token.
    NotFound,
    /// Subscriber could not keep up and was evicted.
    SlowConsumer,
    /// Connection-level read/write failure.
    Transport,
    /// Connection was cancelled (shutdown or peer gone).
    Cancelled,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in logs and error bodies.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::SlowConsumer => "SLOW_CONSUMER",
            ClientCode::Transport => "TRANSPORT",
            ClientCode::Cancelled => "CANCELLED",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, RoomcastError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum RoomcastError {
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Deliberately carries no detail: unknown and malformed tokens must look the same.
    #[error("not found")]
    NotFound,
    #[error("subscriber too slow to keep up with messages")]
    SlowConsumer,
    #[error("transport: {0}")]
    Transport(String),
    #[error("cancelled")]
    Cancelled,
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl RoomcastError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            RoomcastError::BadRequest(_) => ClientCode::BadRequest,
            RoomcastError::NotFound => ClientCode::NotFound,
            RoomcastError::SlowConsumer => ClientCode::SlowConsumer,
            RoomcastError::Transport(_) => ClientCode::Transport,
            RoomcastError::Cancelled => ClientCode::Cancelled,
            RoomcastError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            RoomcastError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Errors that end a single connection without saying anything about the hub.
    pub fn is_connection_local(&self) -> bool {
        matches!(
            self,
            RoomcastError::SlowConsumer | RoomcastError::Transport(_) | RoomcastError::Cancelled
        )
    }
}
