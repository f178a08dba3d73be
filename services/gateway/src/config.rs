//! Gateway process configuration, read once at startup.

use matchmaker::config::{ConfigError, EngineConfig, env_or};
use matchmaker::notifier::{DropPolicy, TransportConfig};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CONNECTION_QUEUE_CAPACITY: usize = 64;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub port: u16,
    pub engine: EngineConfig,
    pub transport: TransportConfig,
    /// Burst size of the per-participant enqueue/cancel buckets
    pub rate_limit_capacity: u32,
    /// Tokens per second refilled into those buckets
    pub rate_limit_refill: f64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            engine: EngineConfig::default(),
            transport: TransportConfig::default(),
            rate_limit_capacity: 10,
            rate_limit_refill: 5.0,
        }
    }
}

impl GatewayConfig {
    /// `PORT`, `CONNECTION_QUEUE_CAPACITY` plus the engine variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            port: env_or("PORT", DEFAULT_PORT)?,
            engine: EngineConfig::from_env()?,
            transport: TransportConfig {
                queue_capacity: env_or(
                    "CONNECTION_QUEUE_CAPACITY",
                    DEFAULT_CONNECTION_QUEUE_CAPACITY,
                )?,
                drop_policy: DropPolicy::Disconnect,
            },
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.transport.queue_capacity == 0 {
            return Err(ConfigError::InvalidEnv {
                key: "CONNECTION_QUEUE_CAPACITY".to_string(),
                value: "0".to_string(),
            });
        }
        self.engine.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = GatewayConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.transport.queue_capacity, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_queue_capacity_rejected() {
        let mut config = GatewayConfig::default();
        config.transport.queue_capacity = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidEnv { .. })
        ));
    }

    #[test]
    fn test_engine_settings_validated() {
        let config = GatewayConfig {
            engine: EngineConfig::with_interval_ms(0),
            ..GatewayConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveInterval(0))
        ));
    }
}
