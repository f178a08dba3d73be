//! Engine configuration with validation.
//!
//! Values come from the environment at process start; anything invalid is
//! fatal and the engine refuses to start.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Default tick period (1s)
pub const DEFAULT_TICK_INTERVAL_MS: i64 = 1_000;

/// Default number of participants per match
pub const DEFAULT_MATCH_SIZE: usize = 2;

/// Default per-participant delivery budget
pub const DEFAULT_DELIVERY_TIMEOUT_MS: u64 = 500;

/// Default lifetime of an unconfirmed match
pub const DEFAULT_MATCH_TTL_MS: u64 = 30_000;

/// Configuration errors, fatal at startup
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Tick interval must be positive, got {0}ms")]
    NonPositiveInterval(i64),

    #[error("Match size must be at least 2, got {0}")]
    InvalidMatchSize(usize),

    #[error("Delivery timeout must be positive")]
    ZeroDeliveryTimeout,

    #[error("Invalid value for {key}: {value:?}")]
    InvalidEnv { key: String, value: String },
}

/// Matchmaking engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Tick period in milliseconds
    pub tick_interval_ms: i64,
    /// Participants per match
    pub match_size: usize,
    /// Upper bound on one participant's delivery
    pub delivery_timeout_ms: u64,
    /// Proposed matches older than this are expired; 0 keeps them forever
    pub match_ttl_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            match_size: DEFAULT_MATCH_SIZE,
            delivery_timeout_ms: DEFAULT_DELIVERY_TIMEOUT_MS,
            match_ttl_ms: DEFAULT_MATCH_TTL_MS,
        }
    }
}

impl EngineConfig {
    pub fn with_interval_ms(tick_interval_ms: i64) -> Self {
        Self {
            tick_interval_ms,
            ..Self::default()
        }
    }

    /// Read `TICK_INTERVAL_MS`, `MATCH_SIZE`, `DELIVERY_TIMEOUT_MS` and
    /// `MATCH_TTL_MS`, falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            tick_interval_ms: env_or("TICK_INTERVAL_MS", DEFAULT_TICK_INTERVAL_MS)?,
            match_size: env_or("MATCH_SIZE", DEFAULT_MATCH_SIZE)?,
            delivery_timeout_ms: env_or("DELIVERY_TIMEOUT_MS", DEFAULT_DELIVERY_TIMEOUT_MS)?,
            match_ttl_ms: env_or("MATCH_TTL_MS", DEFAULT_MATCH_TTL_MS)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms <= 0 {
            return Err(ConfigError::NonPositiveInterval(self.tick_interval_ms));
        }
        if self.match_size < 2 {
            return Err(ConfigError::InvalidMatchSize(self.match_size));
        }
        if self.delivery_timeout_ms == 0 {
            return Err(ConfigError::ZeroDeliveryTimeout);
        }
        Ok(())
    }

    /// Tick period. Only meaningful after `validate`.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1) as u64)
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }

    /// Creation-time cutoff for expiring Proposed matches at `now` (Unix
    /// nanos), or `None` when expiry is off.
    pub fn expiry_cutoff(&self, now: i64) -> Option<i64> {
        if self.match_ttl_ms == 0 {
            return None;
        }
        let ttl_nanos = i64::try_from(self.match_ttl_ms)
            .unwrap_or(i64::MAX)
            .saturating_mul(1_000_000);
        Some(now.saturating_sub(ttl_nanos))
    }
}

/// Parse an environment variable, using `default` when it is unset.
pub fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => parse_value(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: raw.to_string(),
    })
}
