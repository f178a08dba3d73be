//! Types library for the matchmaking service
//!
//! Core type definitions shared by the matchmaker engine and the gateway.
//!
//! # Modules
//! - `ids`: Identifiers (ParticipantId, MatchId, ConnectionId)
//! - `participant`: Pool entry lifecycle types
//! - `match_record`: Committed match types
//! - `errors`: Error taxonomy

pub mod errors;
pub mod ids;
pub mod match_record;
pub mod participant;

/// Current wall-clock time as Unix nanos
pub fn now_nanos() -> i64 {
    chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| chrono::Utc::now().timestamp_micros() * 1_000)
}
