//! Matchmaking Service core
//!
//! Pairs waiting participants into fixed-size matches on a periodic tick and
//! pushes the outcome to whichever connection each participant holds.
//!
//! **Key Invariants:**
//! - No participant is placed in two active matches
//! - Every match has exactly the configured number of members
//! - Oldest waiters are paired first within a compatibility partition
//! - A slow or dead connection never stalls the tick

pub mod config;
pub mod engine;
pub mod events;
pub mod notifier;
pub mod pairing;
pub mod registry;
pub mod store;

pub use config::{ConfigError, EngineConfig};
pub use engine::{EngineError, EngineHandle, MatchmakingEngine, TickReport};
pub use notifier::{ChannelTransport, ConnectionNotifier, Notifier, RecordingNotifier, Transport};
pub use registry::ConnectionRegistry;
pub use store::{InMemoryMatchStore, MatchStore, TransitionOutcome, WaitingFilter};
