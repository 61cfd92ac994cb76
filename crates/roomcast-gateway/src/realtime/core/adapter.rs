//! Connection adapter.
//!
//! Binds one client connection to a session hub: the read side publishes each
//! inbound text frame, a spawned writer drains the connection's mailbox. The
//! two halves share a cancellation token so whichever ends first takes the
//! other down with it.

use std::pin::pin;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use roomcast_core::error::Result;

use crate::obs::GatewayMetrics;

use super::hub::BroadcastHub;
use super::rate_limiter::RateLimiter;
use super::subscriber::SubscriberId;
use super::writer::{run_writer, FrameSink, WriterExit};

/// Everything a connection needs besides its socket halves.
#[derive(Clone)]
pub struct ConnectionCtx {
    pub hub: BroadcastHub,
    pub write_timeout: Duration,
    /// Parent token; cancelling it ends the connection (server shutdown).
    pub cancel: CancellationToken,
    pub metrics: Arc<GatewayMetrics>,
}

/// Why the read side stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEnd {
    /// Peer closed or the stream ended.
    PeerClosed,
    ReadFailed(String),
    /// The writer exited first (eviction, write failure).
    WriterStopped,
    Cancelled,
}

impl ReadEnd {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadEnd::PeerClosed => "peer_closed",
            ReadEnd::ReadFailed(_) => "read_failed",
            ReadEnd::WriterStopped => "writer_stopped",
            ReadEnd::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug)]
pub struct ConnectionOutcome {
    pub subscriber: SubscriberId,
    /// Frames this connection published into the hub.
    pub published: u64,
    pub read_end: ReadEnd,
    pub writer: WriterExit,
}

fn joined(res: std::result::Result<WriterExit, JoinError>) -> WriterExit {
    res.unwrap_or_else(|e| WriterExit::WriteFailed(format!("writer task failed: {e}")))
}

/// Run one connection to completion.
///
/// `source` yields inbound text payloads; empty payloads are skipped. Each
/// read first takes a token from a per-connection limiter (`read_burst`,
/// refilled at the hub's publish interval), and each publish waits on the
/// hub's shared limiter. On exit the writer is cancelled and the subscriber
/// is removed from the hub before this returns.
pub async fn run_connection<Src, Snk>(
    ctx: ConnectionCtx,
    source: Src,
    sink: Snk,
) -> ConnectionOutcome
where
    Src: Stream<Item = Result<Bytes>> + Send,
    Snk: FrameSink + 'static,
{
    let ConnectionCtx {
        hub,
        write_timeout,
        cancel,
        metrics,
    } = ctx;

    let reads = RateLimiter::new(hub.config().read_burst, hub.config().publish_interval());
    let sub = hub.subscribe();
    let id = sub.id();
    metrics.connections_active.inc(&[]);
    tracing::info!(sub = %id, peers = hub.len(), "connection joined");

    let writer_cancel = cancel.child_token();
    let mut writer = tokio::spawn(
        run_writer(sub, sink, write_timeout, writer_cancel.clone()).in_current_span(),
    );
    let mut writer_exit = None;

    let mut source = pin!(source);
    let mut published = 0u64;

    let read_end = loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break ReadEnd::Cancelled,
            res = &mut writer => {
                writer_exit = Some(joined(res));
                break ReadEnd::WriterStopped;
            }
            _ = reads.acquire() => {}
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break ReadEnd::Cancelled,
            res = &mut writer => {
                writer_exit = Some(joined(res));
                break ReadEnd::WriterStopped;
            }
            next = source.next() => {
                let frame = match next {
                    None => break ReadEnd::PeerClosed,
                    Some(Err(e)) => {
                        if e.is_connection_local() {
                            tracing::debug!(sub = %id, error = %e, "read failed");
                        } else {
                            let code = e.client_code().as_str();
                            tracing::warn!(sub = %id, error = %e, code, "read failed");
                        }
                        break ReadEnd::ReadFailed(e.to_string());
                    }
                    Some(Ok(frame)) if frame.is_empty() => continue,
                    Some(Ok(frame)) => frame,
                };

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break ReadEnd::Cancelled,
                    report = hub.publish(frame) => {
                        published += 1;
                        metrics.frames_published.inc(&[]);
                        metrics.publish_wait.observe(&[], report.waited);
                    }
                }
            }
        }
    };

    // Cancel before unsubscribing so the writer reports why it was stopped
    // rather than seeing a closed mailbox.
    writer_cancel.cancel();
    hub.unsubscribe(id);

    let writer = match writer_exit {
        Some(exit) => exit,
        None => joined(writer.await),
    };

    metrics.connections_active.dec(&[]);
    metrics.writer_exits.inc(&[("reason", writer.as_str())]);
    tracing::info!(
        sub = %id,
        published,
        read_end = read_end.as_str(),
        writer = writer.as_str(),
        "connection closed"
    );

    ConnectionOutcome {
        subscriber: id,
        published,
        read_end,
        writer,
    }
}
