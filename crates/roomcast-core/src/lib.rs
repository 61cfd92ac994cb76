//! roomcast core: transport-agnostic primitives shared by the gateway.
//!
//! This crate defines the session token, the close reasons a connection can
//! end with, and the error surface. It intentionally carries no transport or
//! runtime dependencies so the same contracts can be reused by clients and
//! test tooling.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed input surfaces as `RoomcastError`, never as a crash.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ClientCode, Result, RoomcastError};
pub use protocol::{CloseReason, SessionToken};
