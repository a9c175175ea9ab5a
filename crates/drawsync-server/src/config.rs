//! Server configuration from the environment.

use std::net::SocketAddr;
use tracing::warn;

/// Default listen address
pub const DEFAULT_ADDR: &str = "0.0.0.0:3030";
/// Broadcast channel capacity per room
pub const CHANNEL_CAPACITY: usize = 256;
/// Parts kept per room for late joiners
pub const DEFAULT_MAX_BACKLOG: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub channel_capacity: usize,
    pub max_backlog: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3030)),
            channel_capacity: CHANNEL_CAPACITY,
            max_backlog: DEFAULT_MAX_BACKLOG,
        }
    }
}

impl ServerConfig {
    /// Read `DRAWSYNC_ADDR` and `DRAWSYNC_MAX_BACKLOG`.
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("DRAWSYNC_ADDR").ok().as_deref(),
            std::env::var("DRAWSYNC_MAX_BACKLOG").ok().as_deref(),
        )
    }

    fn from_vars(addr: Option<&str>, max_backlog: Option<&str>) -> Self {
        let mut config = Self::default();
        if let Some(raw) = addr {
            match raw.parse() {
                Ok(addr) => config.addr = addr,
                Err(e) => warn!("Ignoring DRAWSYNC_ADDR={raw:?} ({e}), using {DEFAULT_ADDR}"),
            }
        }
        if let Some(raw) = max_backlog {
            match raw.parse::<usize>() {
                Ok(n) => config.max_backlog = n,
                Err(e) => warn!("Ignoring DRAWSYNC_MAX_BACKLOG={raw:?} ({e})"),
            }
        }
        config
    }
}
