//! Transport layer (WebSocket).
//!
//! Exposes the WS upgrade handler, the socket-backed `FrameSink`, and the
//! codec that classifies inbound messages before they reach the hub.

pub mod codec;
pub mod ws;
