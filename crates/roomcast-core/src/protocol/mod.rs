//! Protocol primitives (session tokens + close reasons).
//!
//! The realtime channel has no message envelope: payloads are opaque bytes.
//! What the wire does carry is a session token in the URL and a close status
//! when a connection ends, so those are the only contracts defined here.
//! Parsing is panic-free: a malformed token is reported as `NotFound`, the
//! same outcome as an unknown one.

pub mod close;
pub mod token;

pub use close::CloseReason;
pub use token::SessionToken;
