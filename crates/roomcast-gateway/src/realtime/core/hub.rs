//! Per-session broadcast hub.
//!
//! The subscriber set lives behind a synchronous mutex that is never held
//! across an `.await`: `publish` waits on the rate limiter first, then does
//! the whole fan-out under the lock with non-blocking enqueues. That keeps
//! membership changes atomic with respect to a fan-out, and gives every
//! subscriber a total order over messages from concurrent publishers.
//!
//! Slow subscribers are evicted, never waited on. Eviction is dispatched as a
//! spawned task that `publish` does not await, so it is best-effort and may
//! complete after `publish` returns.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use roomcast_core::error::RoomcastError;

use crate::config::HubConfig;

use super::rate_limiter::RateLimiter;
use super::subscriber::{Delivery, Subscriber, SubscriberId, SubscriberSlot};

/// Result of one `publish` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// Mailboxes the message was enqueued into.
    pub delivered: usize,
    /// Subscribers whose mailbox overflowed on this call.
    pub evicted: usize,
    /// Time spent waiting on the rate limiter.
    pub waited: Duration,
}

/// Point-in-time counters for one hub.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HubStats {
    pub subscribers: usize,
    pub published: u64,
    pub delivered: u64,
    pub evicted: u64,
}

#[derive(Default)]
struct Counters {
    published: AtomicU64,
    delivered: AtomicU64,
    evicted: AtomicU64,
}

struct HubState {
    slots: HashMap<SubscriberId, SubscriberSlot>,
    /// Set whenever the set becomes empty; cleared on subscribe.
    idle_since: Option<Instant>,
}

struct HubInner {
    cfg: HubConfig,
    limiter: RateLimiter,
    state: Mutex<HubState>,
    next_id: AtomicU64,
    counters: Counters,
}

/// Fan-out hub for one session. Cheap to clone.
#[derive(Clone)]
pub struct BroadcastHub {
    inner: Arc<HubInner>,
}

impl BroadcastHub {
    pub fn new(cfg: HubConfig) -> Self {
        Self {
            inner: Arc::new(HubInner {
                limiter: RateLimiter::new(cfg.publish_burst, cfg.publish_interval()),
                cfg,
                state: Mutex::new(HubState {
                    slots: HashMap::new(),
                    idle_since: Some(Instant::now()),
                }),
                next_id: AtomicU64::new(1),
                counters: Counters::default(),
            }),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.cfg
    }

    // A poisoned lock means a panic mid fan-out; the map itself is still
    // consistent, so keep serving instead of taking the session down.
    fn state(&self) -> MutexGuard<'_, HubState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new subscriber with a fresh mailbox.
    pub fn subscribe(&self) -> Subscriber {
        let id = SubscriberId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.inner.cfg.mailbox_capacity.max(1));
        let evicted = CancellationToken::new();

        {
            let mut state = self.state();
            state.slots.insert(id, SubscriberSlot::new(tx, evicted.clone()));
            state.idle_since = None;
        }

        tracing::debug!(sub = %id, "subscribed");
        Subscriber::new(id, rx, evicted, self.clone())
    }

    /// Remove a subscriber. Removing an absent one is a no-op.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let removed = self.remove_slot(id);
        if removed.is_some() {
            tracing::debug!(sub = %id, "unsubscribed");
        }
        removed.is_some()
    }

    /// Drop a subscriber that cannot keep up and signal its writer, which
    /// closes the connection with the "too slow" status. Idempotent.
    pub fn evict(&self, id: SubscriberId) -> bool {
        let Some(slot) = self.remove_slot(id) else {
            return false;
        };
        // Signal before `slot` (and its sender) is dropped.
        slot.signal_evicted();
        self.inner.counters.evicted.fetch_add(1, Ordering::Relaxed);
        let err = RoomcastError::SlowConsumer;
        let code = err.client_code().as_str();
        tracing::warn!(sub = %id, code, error = %err, "subscriber evicted");
        true
    }

    fn remove_slot(&self, id: SubscriberId) -> Option<SubscriberSlot> {
        let mut state = self.state();
        let slot = state.slots.remove(&id);
        if slot.is_some() && state.slots.is_empty() {
            state.idle_since = Some(Instant::now());
        }
        slot
    }

    /// Rate-limit the publisher, then fan `msg` out to every subscriber,
    /// the sender included.
    pub async fn publish(&self, msg: Bytes) -> PublishReport {
        let waited = self.inner.limiter.acquire().await;
        let mut report = self.fan_out(&msg);
        report.waited = waited;
        report
    }

    fn fan_out(&self, msg: &Bytes) -> PublishReport {
        let mut report = PublishReport::default();
        let mut overflowed = Vec::new();

        {
            let mut state = self.state();
            for (id, slot) in state.slots.iter_mut() {
                match slot.try_enqueue(msg) {
                    Delivery::Delivered => report.delivered += 1,
                    Delivery::Overflowed => overflowed.push(*id),
                    Delivery::Skipped => {}
                }
            }
        }

        report.evicted = overflowed.len();
        for id in overflowed {
            let hub = self.clone();
            tokio::spawn(async move {
                hub.evict(id);
            });
        }

        let c = &self.inner.counters;
        c.published.fetch_add(1, Ordering::Relaxed);
        c.delivered.fetch_add(report.delivered as u64, Ordering::Relaxed);
        report
    }

    pub fn len(&self) -> usize {
        self.state().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().slots.is_empty()
    }

    pub fn contains(&self, id: SubscriberId) -> bool {
        self.state().slots.contains_key(&id)
    }

    /// How long the hub has had no subscribers, `None` while it has any.
    pub fn idle_for(&self, now: Instant) -> Option<Duration> {
        self.state()
            .idle_since
            .map(|since| now.saturating_duration_since(since))
    }

    pub fn stats(&self) -> HubStats {
        let c = &self.inner.counters;
        HubStats {
            subscribers: self.len(),
            published: c.published.load(Ordering::Relaxed),
            delivered: c.delivered.load(Ordering::Relaxed),
            evicted: c.evicted.load(Ordering::Relaxed),
        }
    }

    /// True if both handles point at the same hub.
    pub fn ptr_eq(&self, other: &BroadcastHub) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
