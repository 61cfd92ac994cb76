//! Shared application state for the roomcast gateway.
//!
//! Holds the validated config, the session registry, metrics, compiled views
//! and the root shutdown token every connection derives its own token from.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use roomcast_core::error::Result;

use crate::config::GatewayConfig;
use crate::obs::{GatewayMetrics, MetricKind};
use crate::realtime::core::{run_sweeper, SessionRegistry};
use crate::web::Views;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    sessions: Arc<SessionRegistry>,
    metrics: Arc<GatewayMetrics>,
    views: Views,
    shutdown: CancellationToken,
}

impl AppState {
    /// Build application state from a config. Validates again so callers
    /// constructing configs in code get the same checks as file loads.
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        cfg.validate()?;
        let sessions = Arc::new(SessionRegistry::new(cfg.hub));
        let views = Views::new()?;
        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                sessions,
                metrics: Arc::new(GatewayMetrics::default()),
                views,
                shutdown: CancellationToken::new(),
            }),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.inner.sessions
    }

    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.inner.metrics)
    }

    pub fn views(&self) -> &Views {
        &self.inner.views
    }

    /// Root token. Cancelled once on shutdown.
    pub fn shutdown(&self) -> &CancellationToken {
        &self.inner.shutdown
    }

    /// Stop accepting connections and cancel every live one.
    pub fn begin_drain(&self) {
        self.inner.metrics.set_draining();
        self.inner.shutdown.cancel();
        tracing::info!(sessions = self.inner.sessions.len(), "draining");
    }

    pub fn is_draining(&self) -> bool {
        self.inner.metrics.is_draining()
    }

    /// Start the idle-session sweeper; it stops with the root token.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        tokio::spawn(run_sweeper(
            Arc::clone(&self.inner.sessions),
            self.inner.cfg.sessions,
            self.inner.shutdown.clone(),
        ))
    }

    /// Registry series appended to `/metrics`.
    pub fn metrics_extra(&self) -> Vec<(&'static str, MetricKind, u64)> {
        use MetricKind::{Counter, Gauge};

        let reg = &self.inner.sessions;
        let t = reg.totals();
        vec![
            ("roomcast_sessions", Gauge, t.sessions as u64),
            ("roomcast_sessions_created_total", Counter, reg.created_total()),
            ("roomcast_sessions_swept_total", Counter, reg.swept_total()),
            ("roomcast_subscribers", Gauge, t.subscribers as u64),
            ("roomcast_hub_published_total", Counter, t.published),
            ("roomcast_hub_delivered_total", Counter, t.delivered),
            ("roomcast_hub_evicted_total", Counter, t.evicted),
        ]
    }
}
