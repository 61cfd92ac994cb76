//! roomcast gateway library entry.
//!
//! Wires config, the realtime core (rate limiter, broadcast hubs, session
//! registry), the WebSocket transport, and the HTTP pages into one server.
//! Consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod realtime;
pub mod router;
pub mod transport;
pub mod web;
