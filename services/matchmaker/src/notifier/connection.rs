//! Registry-backed notifier

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;
use types::errors::DeliveryError;
use types::ids::ParticipantId;

use super::{Notifier, Transport};
use crate::registry::ConnectionRegistry;

/// Looks the participant up in the registry and sends through `T`
pub struct ConnectionNotifier<T> {
    registry: Arc<ConnectionRegistry>,
    transport: Arc<T>,
}

impl<T: Transport> ConnectionNotifier<T> {
    pub fn new(registry: Arc<ConnectionRegistry>, transport: Arc<T>) -> Self {
        Self {
            registry,
            transport,
        }
    }
}

#[async_trait]
impl<T: Transport + 'static> Notifier for ConnectionNotifier<T> {
    async fn deliver(
        &self,
        participant: &ParticipantId,
        event: &str,
        payload: &Value,
    ) -> Result<(), DeliveryError> {
        let Some(connection) = self.registry.lookup(participant) else {
            trace!(participant_id = %participant, event, "No live connection, dropping event");
            return Ok(());
        };
        self.transport.send(connection, event, payload).await
    }
}
