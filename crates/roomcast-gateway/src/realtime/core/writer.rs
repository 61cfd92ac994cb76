use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use roomcast_core::error::Result;
use roomcast_core::CloseReason;

use super::subscriber::{MailboxEvent, Subscriber};

/// Outbound half of a connection.
#[async_trait]
pub trait FrameSink: Send {
    /// Write one published payload as a text frame.
    async fn send_frame(&mut self, frame: Bytes) -> Result<()>;
    /// Send a close frame with the given reason and flush.
    async fn close(&mut self, reason: CloseReason) -> Result<()>;
}

/// Why a writer stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriterExit {
    /// The hub dropped the subscriber (unsubscribe).
    MailboxClosed,
    /// Mailbox overflowed and the hub evicted the subscriber.
    Evicted,
    /// Connection-level cancellation (peer gone, shutdown).
    Cancelled,
    WriteTimeout,
    WriteFailed(String),
}

impl WriterExit {
    /// Close status for this exit. Only eviction uses the "too slow" status.
    pub fn close_reason(&self) -> CloseReason {
        match self {
            WriterExit::MailboxClosed => CloseReason::Normal,
            WriterExit::Evicted => CloseReason::TooSlow,
            WriterExit::Cancelled | WriterExit::WriteTimeout | WriterExit::WriteFailed(_) => {
                CloseReason::Internal
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WriterExit::MailboxClosed => "mailbox_closed",
            WriterExit::Evicted => "evicted",
            WriterExit::Cancelled => "cancelled",
            WriterExit::WriteTimeout => "write_timeout",
            WriterExit::WriteFailed(_) => "write_failed",
        }
    }
}

/// Drain `sub`'s mailbox into `sink` until eviction, cancellation, a write
/// failure, or the hub dropping the subscriber. Each write is bounded by
/// `write_timeout`, and an in-flight write is abandoned as soon as eviction or
/// cancellation fires. The sink is closed with the matching reason on exit.
pub async fn run_writer<S: FrameSink>(
    mut sub: Subscriber,
    mut sink: S,
    write_timeout: Duration,
    cancel: CancellationToken,
) -> WriterExit {
    let exit = loop {
        let frame = match sub.next_event(&cancel).await {
            MailboxEvent::Message(frame) => frame,
            MailboxEvent::Evicted => break WriterExit::Evicted,
            MailboxEvent::Cancelled => break WriterExit::Cancelled,
            MailboxEvent::Closed => break WriterExit::MailboxClosed,
        };

        tokio::select! {
            biased;
            _ = sub.evicted() => break WriterExit::Evicted,
            _ = cancel.cancelled() => break WriterExit::Cancelled,
            res = timeout(write_timeout, sink.send_frame(frame)) => match res {
                Ok(Ok(())) => {}
                Ok(Err(e)) => break WriterExit::WriteFailed(e.to_string()),
                Err(_) => break WriterExit::WriteTimeout,
            },
        }
    };

    let reason = exit.close_reason();
    match timeout(write_timeout, sink.close(reason)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!(error = %e, "close frame not delivered"),
        Err(_) => tracing::debug!("close frame timed out"),
    }

    tracing::debug!(sub = %sub.id(), exit = exit.as_str(), close = reason.code(), "writer stopped");
    exit
}

#[cfg(test)]
pub(crate) mod test_sink {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use bytes::Bytes;

    use roomcast_core::error::{Result, RoomcastError};
    use roomcast_core::CloseReason;

    use super::FrameSink;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) enum Mode {
        Ok,
        Stall,
        Fail,
    }

    /// In-memory sink recording frames and the close reason.
    #[derive(Clone)]
    pub(crate) struct RecordingSink {
        pub frames: Arc<Mutex<Vec<Bytes>>>,
        pub closed: Arc<Mutex<Option<CloseReason>>>,
        pub mode: Mode,
    }

    impl RecordingSink {
        pub(crate) fn new(mode: Mode) -> Self {
            Self {
                frames: Arc::new(Mutex::new(Vec::new())),
                closed: Arc::new(Mutex::new(None)),
                mode,
            }
        }

        pub(crate) fn frames(&self) -> Vec<Bytes> {
            self.frames.lock().unwrap().clone()
        }

        pub(crate) fn closed(&self) -> Option<CloseReason> {
            *self.closed.lock().unwrap()
        }
    }

    #[async_trait]
    impl FrameSink for RecordingSink {
        async fn send_frame(&mut self, frame: Bytes) -> Result<()> {
            match self.mode {
                Mode::Ok => {
                    self.frames.lock().unwrap().push(frame);
                    Ok(())
                }
                Mode::Stall => std::future::pending::<Result<()>>().await,
                Mode::Fail => Err(RoomcastError::Transport("broken pipe".into())),
            }
        }

        async fn close(&mut self, reason: CloseReason) -> Result<()> {
            *self.closed.lock().unwrap() = Some(reason);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_sink::{Mode, RecordingSink};
    use super::*;
    use crate::config::HubConfig;
    use crate::realtime::core::BroadcastHub;

    const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

    fn hub_with(mailbox_capacity: usize) -> BroadcastHub {
        BroadcastHub::new(HubConfig {
            mailbox_capacity,
            ..HubConfig::default()
        })
    }

    #[tokio::test]
    async fn drains_in_order_then_closes_normally_on_unsubscribe() {
        let hub = hub_with(16);
        let sub = hub.subscribe();
        let id = sub.id();
        let sink = RecordingSink::new(Mode::Ok);

        for m in ["a", "b", "c"] {
            hub.publish(Bytes::from(m)).await;
        }
        hub.unsubscribe(id);

        let exit = run_writer(sub, sink.clone(), WRITE_TIMEOUT, CancellationToken::new()).await;
        assert_eq!(exit, WriterExit::MailboxClosed);
        assert_eq!(sink.frames(), vec![Bytes::from("a"), Bytes::from("b"), Bytes::from("c")]);
        assert_eq!(sink.closed(), Some(CloseReason::Normal));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_write_times_out() {
        let hub = hub_with(16);
        let sub = hub.subscribe();
        let sink = RecordingSink::new(Mode::Stall);
        hub.publish(Bytes::from("x")).await;

        let start = tokio::time::Instant::now();
        let exit = run_writer(sub, sink.clone(), WRITE_TIMEOUT, CancellationToken::new()).await;
        assert_eq!(exit, WriterExit::WriteTimeout);
        assert!(start.elapsed() >= WRITE_TIMEOUT);
        assert_eq!(sink.closed(), Some(CloseReason::Internal));
        assert!(hub.is_empty());
    }

    #[tokio::test]
    async fn write_error_stops_writer() {
        let hub = hub_with(16);
        let sub = hub.subscribe();
        let sink = RecordingSink::new(Mode::Fail);
        hub.publish(Bytes::from("x")).await;

        let exit = run_writer(sub, sink.clone(), WRITE_TIMEOUT, CancellationToken::new()).await;
        assert!(matches!(exit, WriterExit::WriteFailed(ref m) if m.contains("broken pipe")));
        assert_eq!(sink.closed(), Some(CloseReason::Internal));
    }

    #[tokio::test]
    async fn cancellation_closes_with_generic_status() {
        let hub = hub_with(16);
        let sub = hub.subscribe();
        let sink = RecordingSink::new(Mode::Ok);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run_writer(sub, sink.clone(), WRITE_TIMEOUT, cancel.clone()));
        cancel.cancel();

        assert_eq!(task.await.unwrap(), WriterExit::Cancelled);
        assert_eq!(sink.closed(), Some(CloseReason::Internal));
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_stalled_write() {
        let hub = hub_with(16);
        let sub = hub.subscribe();
        let sink = RecordingSink::new(Mode::Stall);
        let cancel = CancellationToken::new();
        hub.publish(Bytes::from("x")).await;

        let task = tokio::spawn(run_writer(sub, sink.clone(), WRITE_TIMEOUT, cancel.clone()));
        tokio::task::yield_now().await;
        cancel.cancel();

        let exit = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("writer must exit promptly")
            .unwrap();
        assert_eq!(exit, WriterExit::Cancelled);
    }

    #[tokio::test]
    async fn eviction_closes_with_too_slow_status() {
        let hub = hub_with(1);
        let sub = hub.subscribe();
        let sink = RecordingSink::new(Mode::Stall);

        let task = tokio::spawn(run_writer(
            sub,
            sink.clone(),
            WRITE_TIMEOUT,
            CancellationToken::new(),
        ));

        // Writer takes the first message and stalls on it; the next two fill
        // the mailbox and then overflow it.
        for m in ["1", "2", "3"] {
            hub.publish(Bytes::from(m)).await;
            tokio::task::yield_now().await;
        }

        let exit = tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("evicted writer must exit promptly")
            .unwrap();
        assert_eq!(exit, WriterExit::Evicted);
        assert_eq!(sink.closed(), Some(CloseReason::TooSlow));
        assert_ne!(CloseReason::TooSlow.code(), CloseReason::Normal.code());
        assert!(hub.is_empty());
    }
}
