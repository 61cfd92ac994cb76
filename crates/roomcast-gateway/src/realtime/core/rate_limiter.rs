//! Publish admission control (token bucket).
//!
//! `acquire` never fails; it only delays. Waiters queue on the bucket's async
//! mutex, which tokio hands out in FIFO order, so concurrent publishers are
//! served roughly in arrival order.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

#[derive(Debug)]
struct TokenBucket {
    capacity: u32,
    tokens: u32,
    interval: Duration,
    last: Instant,
}

impl TokenBucket {
    fn new(burst: u32, interval: Duration) -> Self {
        let capacity = burst.max(1);
        Self {
            capacity,
            tokens: capacity,
            interval: interval.max(Duration::from_millis(1)),
            last: Instant::now(),
        }
    }

    fn refill(&mut self, now: Instant) {
        // A full bucket does not bank time.
        if self.tokens >= self.capacity {
            self.last = now;
            return;
        }

        let elapsed = now.saturating_duration_since(self.last);
        let add = elapsed.as_nanos() / self.interval.as_nanos();
        if add == 0 {
            return;
        }

        let add = u32::try_from(add).unwrap_or(u32::MAX);
        self.tokens = self.tokens.saturating_add(add).min(self.capacity);
        if self.tokens >= self.capacity {
            self.last = now;
        } else {
            // add < capacity here, so the multiplication cannot overflow.
            self.last += self.interval * add;
        }
    }

    /// Take one token, or report when the next one becomes available.
    fn try_take(&mut self, now: Instant) -> Result<(), Instant> {
        self.refill(now);
        if self.tokens == 0 {
            return Err(self.last + self.interval);
        }
        self.tokens -= 1;
        Ok(())
    }
}

/// Token bucket shared by every publisher on one hub.
#[derive(Debug)]
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
}

impl RateLimiter {
    /// `burst` tokens up front, then one token per `interval`.
    pub fn new(burst: u32, interval: Duration) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(burst, interval)),
        }
    }

    /// Wait for a token and consume it. Returns how long the caller was held.
    pub async fn acquire(&self) -> Duration {
        let start = Instant::now();
        let mut bucket = self.bucket.lock().await;
        loop {
            match bucket.try_take(Instant::now()) {
                Ok(()) => return start.elapsed(),
                Err(ready_at) => sleep_until(ready_at).await,
            }
        }
    }

    /// Non-suspending variant. Returns false if no token is available or
    /// another caller is already waiting for one.
    pub fn try_acquire(&self) -> bool {
        match self.bucket.try_lock() {
            Ok(mut bucket) => bucket.try_take(Instant::now()).is_ok(),
            Err(_) => false,
        }
    }

    /// Tokens currently available (after refill).
    pub async fn available(&self) -> u32 {
        let mut bucket = self.bucket.lock().await;
        bucket.refill(Instant::now());
        bucket.tokens
    }
}
