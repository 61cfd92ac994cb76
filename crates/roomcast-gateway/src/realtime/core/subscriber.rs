use std::fmt;

use bytes::Bytes;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;

use super::hub::BroadcastHub;

/// Identity of a subscriber within its hub (monotonic, never reused).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(pub(crate) u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Active,
    Evicting,
}

/// Outcome of one non-blocking enqueue attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Delivered,
    /// Mailbox full. The slot is now `Evicting`; caller must dispatch the eviction.
    Overflowed,
    /// Already evicting, or the receiving half is gone.
    Skipped,
}

/// Hub-side half of a subscriber: the mailbox sender and the eviction signal.
pub(crate) struct SubscriberSlot {
    tx: mpsc::Sender<Bytes>,
    evicted: CancellationToken,
    state: SlotState,
}

impl SubscriberSlot {
    pub(crate) fn new(tx: mpsc::Sender<Bytes>, evicted: CancellationToken) -> Self {
        Self {
            tx,
            evicted,
            state: SlotState::Active,
        }
    }

    /// Never blocks, never retries. Overflow flips the slot to `Evicting`
    /// so a subscriber is evicted at most once.
    pub(crate) fn try_enqueue(&mut self, msg: &Bytes) -> Delivery {
        if self.state == SlotState::Evicting {
            return Delivery::Skipped;
        }
        match self.tx.try_send(msg.clone()) {
            Ok(()) => Delivery::Delivered,
            Err(TrySendError::Full(_)) => {
                self.state = SlotState::Evicting;
                Delivery::Overflowed
            }
            Err(TrySendError::Closed(_)) => Delivery::Skipped,
        }
    }

    /// Fire the eviction signal. The sender must still be alive at this point
    /// so the writer observes eviction before it sees a closed mailbox.
    pub(crate) fn signal_evicted(&self) {
        self.evicted.cancel();
    }
}

/// What the writer should do next.
#[derive(Debug, PartialEq, Eq)]
pub enum MailboxEvent {
    Message(Bytes),
    Evicted,
    Cancelled,
    Closed,
}

/// Connection-side half of a subscriber: the mailbox receiver, the eviction
/// signal, and a handle back to the owning hub.
///
/// Dropping a `Subscriber` unsubscribes it.
pub struct Subscriber {
    id: SubscriberId,
    rx: mpsc::Receiver<Bytes>,
    evicted: CancellationToken,
    hub: BroadcastHub,
}

impl Subscriber {
    pub(crate) fn new(
        id: SubscriberId,
        rx: mpsc::Receiver<Bytes>,
        evicted: CancellationToken,
        hub: BroadcastHub,
    ) -> Self {
        Self {
            id,
            rx,
            evicted,
            hub,
        }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    pub fn is_evicted(&self) -> bool {
        self.evicted.is_cancelled()
    }

    /// Resolves once the hub has evicted this subscriber.
    pub async fn evicted(&self) {
        self.evicted.cancelled().await
    }

    /// Ask the hub to evict this subscriber.
    pub fn evict(&self) -> bool {
        self.hub.evict(self.id)
    }

    /// Next mailbox message, `None` once the hub dropped this subscriber.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Bytes> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next thing the writer has to react to. Eviction wins over
    /// cancellation, which wins over pending mail.
    pub async fn next_event(&mut self, cancel: &CancellationToken) -> MailboxEvent {
        tokio::select! {
            biased;
            _ = self.evicted.cancelled() => MailboxEvent::Evicted,
            _ = cancel.cancelled() => MailboxEvent::Cancelled,
            msg = self.rx.recv() => match msg {
                Some(b) => MailboxEvent::Message(b),
                None => MailboxEvent::Closed,
            },
        }
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("evicted", &self.is_evicted())
            .finish()
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.id);
    }
}
