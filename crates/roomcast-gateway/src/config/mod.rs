//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use roomcast_core::error::{Result, RoomcastError};

pub use schema::{GatewayConfig, GatewaySection, HubConfig, SessionsConfig};

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| RoomcastError::Internal(format!("read config failed ({path}): {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| RoomcastError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
