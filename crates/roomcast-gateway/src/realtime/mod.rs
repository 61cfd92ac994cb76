//! Realtime runtime for the roomcast gateway.

pub mod core;

pub use core::{BroadcastHub, FrameSink, SessionRegistry, Subscriber};
