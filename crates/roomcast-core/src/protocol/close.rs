//! Close reasons and their WebSocket status codes (RFC 6455 section 7.4.1).

/// Normal closure.
pub const CLOSE_NORMAL: u16 = 1000;
/// Policy violation. Used for slow-consumer eviction.
pub const CLOSE_POLICY_VIOLATION: u16 = 1008;
/// Unexpected condition on the server.
pub const CLOSE_INTERNAL_ERROR: u16 = 1011;

/// Why the server closed a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// Hub dropped the subscriber in an orderly way.
    Normal,
    /// Mailbox overflowed; subscriber evicted.
    TooSlow,
    /// Write failure, write timeout, or cancellation (including shutdown).
    Internal,
}

impl CloseReason {
    /// Status code sent in the close frame.
    pub fn code(self) -> u16 {
        match self {
            CloseReason::Normal => CLOSE_NORMAL,
            CloseReason::TooSlow => CLOSE_POLICY_VIOLATION,
            CloseReason::Internal => CLOSE_INTERNAL_ERROR,
        }
    }

    /// Human-readable reason sent in the close frame.
    pub fn reason(self) -> &'static str {
        match self {
            CloseReason::Normal => "",
            CloseReason::TooSlow => "connection too slow to keep up with messages",
            CloseReason::Internal => "",
        }
    }

    /// Short label for metrics and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            CloseReason::Normal => "normal",
            CloseReason::TooSlow => "too_slow",
            CloseReason::Internal => "internal",
        }
    }

    /// Reverse lookup from a received status code.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            CLOSE_NORMAL => Some(CloseReason::Normal),
            CLOSE_POLICY_VIOLATION => Some(CloseReason::TooSlow),
            CLOSE_INTERNAL_ERROR => Some(CloseReason::Internal),
            _ => None,
        }
    }
}
