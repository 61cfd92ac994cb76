use std::time::Duration;

use serde::Deserialize;
use roomcast_core::error::{Result, RoomcastError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub hub: HubConfig,

    #[serde(default)]
    pub sessions: SessionsConfig,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RoomcastError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.hub.validate()?;
        self.sessions.validate()?;

        Ok(())
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            hub: HubConfig::default(),
            sessions: SessionsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(RoomcastError::BadRequest(
                "gateway.listen must be a valid socket address".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "127.0.0.1:3000".into()
}

/// Per-hub tuning: mailbox size, publish and read limiters, write timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HubConfig {
    #[serde(default = "default_mailbox_capacity")]
    pub mailbox_capacity: usize,

    #[serde(default = "default_publish_burst")]
    pub publish_burst: u32,

    #[serde(default = "default_publish_interval_ms")]
    pub publish_interval_ms: u64,

    /// Per-connection read budget; refills at the publish interval.
    #[serde(default = "default_read_burst")]
    pub read_burst: u32,

    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: default_mailbox_capacity(),
            publish_burst: default_publish_burst(),
            publish_interval_ms: default_publish_interval_ms(),
            read_burst: default_read_burst(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

impl HubConfig {
    pub fn validate(&self) -> Result<()> {
        if !(1..=4096).contains(&self.mailbox_capacity) {
            return Err(RoomcastError::BadRequest(
                "hub.mailbox_capacity must be between 1 and 4096".into(),
            ));
        }
        if !(1..=1000).contains(&self.publish_burst) {
            return Err(RoomcastError::BadRequest(
                "hub.publish_burst must be between 1 and 1000".into(),
            ));
        }
        if !(1..=60000).contains(&self.publish_interval_ms) {
            return Err(RoomcastError::BadRequest(
                "hub.publish_interval_ms must be between 1 and 60000".into(),
            ));
        }
        if !(1..=1000).contains(&self.read_burst) {
            return Err(RoomcastError::BadRequest(
                "hub.read_burst must be between 1 and 1000".into(),
            ));
        }
        if !(100..=120000).contains(&self.write_timeout_ms) {
            return Err(RoomcastError::BadRequest(
                "hub.write_timeout_ms must be between 100 and 120000".into(),
            ));
        }
        Ok(())
    }

    pub fn publish_interval(&self) -> Duration {
        Duration::from_millis(self.publish_interval_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

fn default_mailbox_capacity() -> usize {
    16
}
fn default_publish_burst() -> u32 {
    8
}
fn default_publish_interval_ms() -> u64 {
    100
}
fn default_read_burst() -> u32 {
    10
}
fn default_write_timeout_ms() -> u64 {
    5000
}

/// Idle session sweeping. `idle_ttl_secs: 0` keeps sessions for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionsConfig {
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_ttl_secs: default_idle_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl SessionsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sweeping_enabled() && !(1..=86400).contains(&self.sweep_interval_secs) {
            return Err(RoomcastError::BadRequest(
                "sessions.sweep_interval_secs must be between 1 and 86400".into(),
            ));
        }
        Ok(())
    }

    pub fn sweeping_enabled(&self) -> bool {
        self.idle_ttl_secs > 0
    }

    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

fn default_idle_ttl_secs() -> u64 {
    3600
}
fn default_sweep_interval_secs() -> u64 {
    300
}
