use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, SystemTime};

use dashmap::DashMap;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use roomcast_core::error::{Result, RoomcastError};
use roomcast_core::SessionToken;

use crate::config::{HubConfig, SessionsConfig};

use super::hub::BroadcastHub;

/// One broadcast domain. The hub is created on first access.
pub struct Session {
    token: SessionToken,
    display_name: String,
    created_at: SystemTime,
    created: Instant,
    hub_cfg: HubConfig,
    hub: OnceLock<BroadcastHub>,
}

impl Session {
    fn new(token: SessionToken, display_name: String, hub_cfg: HubConfig) -> Self {
        Self {
            token,
            display_name,
            created_at: SystemTime::now(),
            created: Instant::now(),
            hub_cfg,
            hub: OnceLock::new(),
        }
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn hub(&self) -> &BroadcastHub {
        self.hub.get_or_init(|| BroadcastHub::new(self.hub_cfg))
    }

    /// Hub if it was ever touched; does not create one.
    pub fn existing_hub(&self) -> Option<&BroadcastHub> {
        self.hub.get()
    }

    fn idle_for(&self, now: Instant) -> Option<Duration> {
        match self.hub.get() {
            Some(hub) => hub.idle_for(now),
            None => Some(now.saturating_duration_since(self.created)),
        }
    }
}

/// Aggregate counters across every live session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryTotals {
    pub sessions: usize,
    pub subscribers: usize,
    pub published: u64,
    pub delivered: u64,
    pub evicted: u64,
}

/// Session registry: `token -> Session`.
///
/// Built once at startup and shared through `AppState`.
pub struct SessionRegistry {
    sessions: DashMap<SessionToken, Arc<Session>>,
    hub_cfg: HubConfig,
    created_total: AtomicU64,
    swept_total: AtomicU64,
}

impl SessionRegistry {
    pub fn new(hub_cfg: HubConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            hub_cfg,
            created_total: AtomicU64::new(0),
            swept_total: AtomicU64::new(0),
        }
    }

    /// Mint a session and return its token. Collisions are not handled: the
    /// token space is 122 random bits.
    pub fn create(&self, display_name: impl Into<String>) -> SessionToken {
        let token = SessionToken::generate();
        let session = Session::new(token, display_name.into(), self.hub_cfg);
        self.sessions.insert(token, Arc::new(session));
        self.created_total.fetch_add(1, Ordering::Relaxed);
        tracing::info!(session = %token, "session created");
        token
    }

    /// Resolve a raw URL segment. Malformed and unknown tokens are both `NotFound`.
    pub fn lookup(&self, raw: &str) -> Result<Arc<Session>> {
        let token = SessionToken::parse(raw)?;
        self.get(&token)
    }

    pub fn get(&self, token: &SessionToken) -> Result<Arc<Session>> {
        self.sessions
            .get(token)
            .map(|r| Arc::clone(r.value()))
            .ok_or(RoomcastError::NotFound)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Remove sessions that have had no subscribers for at least `ttl`.
    /// Returns how many were removed.
    ///
    /// A connection that resolved a session just before it is swept keeps its
    /// `Arc<Session>` and works on an orphaned hub until it disconnects.
    pub fn sweep_idle(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions.retain(|token, session| {
            let expired = session.idle_for(now).is_some_and(|idle| idle >= ttl);
            if expired {
                tracing::info!(session = %token, "idle session swept");
            }
            !expired
        });
        let removed = before.saturating_sub(self.sessions.len());
        self.swept_total.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    pub fn created_total(&self) -> u64 {
        self.created_total.load(Ordering::Relaxed)
    }

    pub fn swept_total(&self) -> u64 {
        self.swept_total.load(Ordering::Relaxed)
    }

    pub fn totals(&self) -> RegistryTotals {
        let mut t = RegistryTotals {
            sessions: self.sessions.len(),
            ..RegistryTotals::default()
        };
        for entry in self.sessions.iter() {
            if let Some(hub) = entry.value().existing_hub() {
                let s = hub.stats();
                t.subscribers += s.subscribers;
                t.published += s.published;
                t.delivered += s.delivered;
                t.evicted += s.evicted;
            }
        }
        t
    }
}

/// Periodically sweep idle sessions until `cancel` fires. Returns immediately
/// when sweeping is disabled.
pub async fn run_sweeper(
    registry: Arc<SessionRegistry>,
    cfg: SessionsConfig,
    cancel: CancellationToken,
) {
    if !cfg.sweeping_enabled() {
        tracing::info!("session sweeping disabled");
        return;
    }

    let mut tick = tokio::time::interval(cfg.sweep_interval());
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // First tick fires immediately; nothing can be idle yet.
    tick.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tick.tick() => {
                let removed = registry.sweep_idle(cfg.idle_ttl());
                if removed > 0 {
                    tracing::info!(removed, remaining = registry.len(), "session sweep");
                }
            }
        }
    }
}
