//! Realtime core: per-session broadcast hubs and the connection plumbing
//! around them.
//!
//! - `RateLimiter` paces publishers per hub
//! - `BroadcastHub` fans messages out to bounded subscriber mailboxes
//! - `run_writer` drains one mailbox into a connection
//! - `run_connection` ties a connection's read side to a hub
//! - `SessionRegistry` maps session tokens to hubs

mod adapter;
mod hub;
mod rate_limiter;
mod session_registry;
mod subscriber;
mod writer;

pub use adapter::{run_connection, ConnectionCtx, ConnectionOutcome, ReadEnd};
pub use hub::{BroadcastHub, HubStats, PublishReport};
pub use rate_limiter::RateLimiter;
pub use session_registry::{run_sweeper, RegistryTotals, Session, SessionRegistry};
pub use subscriber::{MailboxEvent, Subscriber, SubscriberId};
pub use writer::{run_writer, FrameSink, WriterExit};
