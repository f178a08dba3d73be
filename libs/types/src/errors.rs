//! Error types for the matchmaking service
//!
//! Error taxonomy using thiserror

use thiserror::Error;

/// Match store errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Participant not found: {participant_id}")]
    ParticipantNotFound { participant_id: String },

    #[error("Match not found: {match_id}")]
    MatchNotFound { match_id: String },

    #[error("Participant already waiting: {participant_id}")]
    AlreadyWaiting { participant_id: String },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid group: {reason}")]
    InvalidGroup { reason: String },

    #[error("Store unavailable: {message}")]
    Unavailable { message: String },
}

impl StoreError {
    /// Transient errors are worth retrying on the next tick
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. })
    }
}

/// Delivery errors, always scoped to one participant
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeliveryError {
    #[error("Connection closed: {connection_id}")]
    ConnectionClosed { connection_id: String },

    #[error("Outbound queue full for connection {connection_id}")]
    Backpressure { connection_id: String },

    #[error("Delivery timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Payload serialization failed: {0}")]
    Serialization(String),
}
