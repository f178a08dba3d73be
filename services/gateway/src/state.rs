use crate::config::GatewayConfig;
use crate::rate_limit::RateLimiter;
use matchmaker::notifier::{ChannelTransport, ConnectionNotifier, Notifier};
use matchmaker::registry::ConnectionRegistry;
use matchmaker::store::MatchStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MatchStore>,
    pub registry: Arc<ConnectionRegistry>,
    pub transport: Arc<ChannelTransport>,
    pub notifier: Arc<dyn Notifier>,
    pub rate_limiter: Arc<RateLimiter>,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn MatchStore>, config: GatewayConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let transport = Arc::new(ChannelTransport::new(config.transport.clone()));
        let notifier: Arc<dyn Notifier> = Arc::new(ConnectionNotifier::new(
            Arc::clone(&registry),
            Arc::clone(&transport),
        ));

        Self {
            store,
            registry,
            transport,
            notifier,
            rate_limiter: Arc::new(RateLimiter::new()),
            config: Arc::new(config),
        }
    }

    /// Apply the configured bucket to `participant_id:action`
    pub fn check_rate_limit(
        &self,
        participant_id: &str,
        action: &str,
    ) -> Result<(), crate::error::AppError> {
        self.rate_limiter.check_rate_limit(
            &format!("{}:{}", participant_id, action),
            self.config.rate_limit_capacity,
            self.config.rate_limit_refill,
        )
    }
}
