//! Channel-backed transport with bounded per-connection queues
//!
//! Each live connection owns a bounded mpsc queue drained by its socket
//! writer. Sends never wait: a full queue is a backpressure incident, and
//! depending on the drop policy the lagging connection is either left
//! alone (event dropped) or disconnected.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};
use types::errors::DeliveryError;
use types::ids::ConnectionId;

use super::Transport;
use crate::events::OutboundMessage;

/// What to do when a connection's outbound queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropPolicy {
    /// Drop the new event, keep the connection.
    DropNewest,
    /// Close the lagging connection immediately.
    Disconnect,
}

/// Configuration for the channel transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Maximum queued frames per connection.
    pub queue_capacity: usize,
    /// Policy on overflow.
    pub drop_policy: DropPolicy,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            drop_policy: DropPolicy::Disconnect,
        }
    }
}

pub struct ChannelTransport {
    senders: DashMap<ConnectionId, mpsc::Sender<OutboundMessage>>,
    config: TransportConfig,
    /// Total backpressure incidents since creation.
    total_incidents: AtomicU64,
}

impl ChannelTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            senders: DashMap::new(),
            config,
            total_incidents: AtomicU64::new(0),
        }
    }

    /// Open the outbound queue for a new connection.
    ///
    /// The caller drains the receiver into the socket; it yields `None`
    /// once the connection is closed or disconnected for lagging.
    pub fn open(&self, connection: ConnectionId) -> mpsc::Receiver<OutboundMessage> {
        let (tx, rx) = mpsc::channel(self.config.queue_capacity.max(1));
        self.senders.insert(connection, tx);
        debug!(connection_id = %connection, "Opened connection queue");
        rx
    }

    /// Drop the outbound queue for a connection.
    pub fn close(&self, connection: ConnectionId) {
        if self.senders.remove(&connection).is_some() {
            debug!(connection_id = %connection, "Closed connection queue");
        }
    }

    pub fn is_open(&self, connection: ConnectionId) -> bool {
        self.senders.contains_key(&connection)
    }

    /// Number of open connection queues
    pub fn connection_count(&self) -> usize {
        self.senders.len()
    }

    /// Total backpressure incidents since creation.
    pub fn total_incidents(&self) -> u64 {
        self.total_incidents.load(Ordering::Relaxed)
    }

    /// Queue a frame without waiting.
    pub fn push(
        &self,
        connection: ConnectionId,
        message: OutboundMessage,
    ) -> Result<(), DeliveryError> {
        let sender = self
            .senders
            .get(&connection)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| DeliveryError::ConnectionClosed {
                connection_id: connection.to_string(),
            })?;

        match sender.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                let total_incidents = self.total_incidents.fetch_add(1, Ordering::Relaxed) + 1;
                if self.config.drop_policy == DropPolicy::Disconnect {
                    self.close(connection);
                }
                warn!(
                    connection_id = %connection,
                    policy = ?self.config.drop_policy,
                    total_incidents,
                    "Backpressure: outbound queue full"
                );
                Err(DeliveryError::Backpressure {
                    connection_id: connection.to_string(),
                })
            }
            Err(TrySendError::Closed(_)) => {
                self.close(connection);
                Err(DeliveryError::ConnectionClosed {
                    connection_id: connection.to_string(),
                })
            }
        }
    }
}

impl Default for ChannelTransport {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(
        &self,
        connection: ConnectionId,
        event: &str,
        payload: &Value,
    ) -> Result<(), DeliveryError> {
        self.push(connection, OutboundMessage::new(event, payload.clone()))
    }
}
