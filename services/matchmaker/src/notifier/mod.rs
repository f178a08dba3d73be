//! Notifier: the engine's only way to reach a live participant.
//!
//! `Notifier` is transport-agnostic. `ConnectionNotifier` resolves the
//! participant through the [`ConnectionRegistry`](crate::registry::ConnectionRegistry)
//! and hands the event to a [`Transport`] adapter.

pub mod channel;
pub mod connection;
pub mod recording;

use async_trait::async_trait;
use serde_json::Value;
use types::errors::DeliveryError;
use types::ids::{ConnectionId, ParticipantId};

pub use channel::{ChannelTransport, DropPolicy, TransportConfig};
pub use connection::ConnectionNotifier;
pub use recording::{Delivery, RecordingNotifier};

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Push `event` to the participant's current connection.
    ///
    /// Returns `Ok(())` without doing anything when the participant has no
    /// live connection.
    async fn deliver(
        &self,
        participant: &ParticipantId,
        event: &str,
        payload: &Value,
    ) -> Result<(), DeliveryError>;
}

/// One adapter per transport technology
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        connection: ConnectionId,
        event: &str,
        payload: &Value,
    ) -> Result<(), DeliveryError>;
}
