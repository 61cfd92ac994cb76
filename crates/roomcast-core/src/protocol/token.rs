//! Opaque session token.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::error::{Result, RoomcastError};

/// Identifier of one broadcast session. Random v4 UUID, hyphenated on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(Uuid);

impl SessionToken {
    /// Mint a fresh random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a token from a URL segment.
    ///
    /// Any parse failure is `NotFound` so callers cannot tell a malformed token
    /// from one that simply does not exist.
    pub fn parse(raw: &str) -> Result<Self> {
        Uuid::parse_str(raw.trim())
            .map(Self)
            .map_err(|_| RoomcastError::NotFound)
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for SessionToken {
    type Err = RoomcastError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
