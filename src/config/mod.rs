//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

use crate::util::time::DEFAULT_TICK_RATE;

/// Highest tick rate the server accepts
pub const MAX_TICK_RATE: u32 = 240;

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Buffered messages per room broadcast before slow clients lag
    pub room_broadcast_capacity: usize,
    /// Allowed client origins for CORS (comma-separated), any when unset
    pub client_origin: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // PORT wins over SERVER_ADDR for hosted deployments
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
        };

        let tick_rate = match lookup("TICK_RATE") {
            Some(raw) => parse_in_range("TICK_RATE", &raw, 1, MAX_TICK_RATE as usize)? as u32,
            None => DEFAULT_TICK_RATE,
        };

        let room_broadcast_capacity = match lookup("ROOM_BROADCAST_CAPACITY") {
            Some(raw) => parse_in_range("ROOM_BROADCAST_CAPACITY", &raw, 1, 4096)?,
            None => 64,
        };

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            tick_rate,
            room_broadcast_capacity,
            client_origin: lookup("CLIENT_ORIGIN").filter(|s| !s.trim().is_empty()),
        })
    }
}

fn parse_in_range(
    var: &'static str,
    raw: &str,
    min: usize,
    max: usize,
) -> Result<usize, ConfigError> {
    let value: usize = raw.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        reason: format!("'{}' is not a number", raw),
    })?;
    if !(min..=max).contains(&value) {
        return Err(ConfigError::Invalid {
            var,
            reason: format!("{} is outside {}..={}", value, min, max),
        });
    }
    Ok(value)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server address format")]
    InvalidAddress,

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}
