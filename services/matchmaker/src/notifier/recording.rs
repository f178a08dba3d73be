//! In-memory notifier that records every delivery.
//!
//! Used by engine tests and handy for wiring the service without a
//! transport.

use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashSet;
use parking_lot::Mutex;
use serde_json::Value;
use types::errors::DeliveryError;
use types::ids::ParticipantId;

use super::Notifier;

/// One recorded `deliver` call
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub participant: ParticipantId,
    pub event: String,
    pub payload: Value,
}

#[derive(Default)]
pub struct RecordingNotifier {
    deliveries: Mutex<Vec<Delivery>>,
    failing: DashSet<ParticipantId>,
    stalled: DashSet<ParticipantId>,
    stall_for: Mutex<Duration>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliveries to `participant` fail with `ConnectionClosed`
    pub fn fail_for(&self, participant: ParticipantId) {
        self.failing.insert(participant);
    }

    /// Deliveries to `participant` hang for `duration` before succeeding
    pub fn stall_for(&self, participant: ParticipantId, duration: Duration) {
        *self.stall_for.lock() = duration;
        self.stalled.insert(participant);
    }

    /// Every delivery attempt so far, in call order
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }

    pub fn deliveries_for(&self, participant: &ParticipantId) -> Vec<Delivery> {
        self.deliveries
            .lock()
            .iter()
            .filter(|d| &d.participant == participant)
            .cloned()
            .collect()
    }

    pub fn count(&self) -> usize {
        self.deliveries.lock().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(
        &self,
        participant: &ParticipantId,
        event: &str,
        payload: &Value,
    ) -> Result<(), DeliveryError> {
        self.deliveries.lock().push(Delivery {
            participant: participant.clone(),
            event: event.to_string(),
            payload: payload.clone(),
        });

        if self.stalled.contains(participant) {
            let pause = *self.stall_for.lock();
            tokio::time::sleep(pause).await;
        }
        if self.failing.contains(participant) {
            return Err(DeliveryError::ConnectionClosed {
                connection_id: format!("fake:{}", participant),
            });
        }
        Ok(())
    }
}
