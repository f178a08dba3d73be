//! Matchmaking engine core
//!
//! Owns the periodic tick. Each tick expires stale Proposed matches,
//! snapshots the waiting pool, plans fixed-size groups, commits them one by
//! one through the store, and then notifies every member of every committed
//! match.
//!
//! **Key Invariants:**
//! - At most one tick in flight; a tick that comes due while another runs
//!   is skipped, never queued
//! - A group is committed all-or-nothing; a conflicting member voids the
//!   whole group and the others stay Waiting
//! - Delivery is best-effort and time-boxed per participant; it never rolls
//!   back a committed match

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use types::errors::{DeliveryError, StoreError};
use types::ids::{MatchId, ParticipantId};
use types::match_record::Match;
use types::now_nanos;

use crate::config::{ConfigError, EngineConfig};
use crate::events::{MatchFoundEvent, MATCH_FOUND};
use crate::notifier::Notifier;
use crate::pairing::{form_groups, Group};
use crate::store::{MatchStore, TransitionOutcome, WaitingFilter};

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid engine configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Engine task failed: {0}")]
    TaskFailed(String),
}

/// What one tick did
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    /// Another tick was in flight, nothing was done
    pub skipped: bool,
    /// Proposed matches expired before pairing
    pub expired: usize,
    /// Size of the waiting snapshot
    pub waiting: usize,
    /// Matches committed this tick
    pub matches: Vec<Match>,
    /// Groups voided by an eligibility conflict
    pub conflicts: usize,
    /// Participants whose notification failed or timed out
    pub failed_deliveries: Vec<ParticipantId>,
    /// Store failure that cut the tick short
    pub aborted: Option<StoreError>,
}

impl TickReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }

    pub fn match_ids(&self) -> Vec<MatchId> {
        self.matches.iter().map(|m| m.match_id).collect()
    }
}

/// Running counters, readable while the engine runs
#[derive(Debug, Default)]
pub struct EngineStats {
    pub ticks_run: AtomicU64,
    pub ticks_skipped: AtomicU64,
    pub ticks_aborted: AtomicU64,
    pub matches_created: AtomicU64,
    pub matches_expired: AtomicU64,
    pub conflicts: AtomicU64,
    pub deliveries_failed: AtomicU64,
}

/// Main matchmaking engine
pub struct MatchmakingEngine {
    store: Arc<dyn MatchStore>,
    notifier: Arc<dyn Notifier>,
    config: EngineConfig,
    /// Reentrancy guard: held for the whole tick
    tick_guard: Mutex<()>,
    stats: EngineStats,
}

impl MatchmakingEngine {
    /// Create an engine without scheduling it.
    pub fn new(
        store: Arc<dyn MatchStore>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            store,
            notifier,
            config,
            tick_guard: Mutex::new(()),
            stats: EngineStats::default(),
        })
    }

    /// Validate `config` and begin ticking every `tick_interval_ms`.
    ///
    /// Refuses to start on an invalid configuration. Must be called from
    /// within a tokio runtime.
    pub fn start(
        store: Arc<dyn MatchStore>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
    ) -> Result<EngineHandle, EngineError> {
        let engine = Arc::new(Self::new(store, notifier, config)?);
        Ok(engine.spawn())
    }

    /// Schedule an already-built engine.
    pub fn spawn(self: Arc<Self>) -> EngineHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let engine = Arc::clone(&self);

        let task = tokio::spawn(async move {
            let period = engine.config.tick_interval();
            let mut ticker = interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            info!(
                interval_ms = engine.config.tick_interval_ms,
                match_size = engine.config.match_size,
                "Matchmaking engine started"
            );

            loop {
                tokio::select! {
                    biased;
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        engine.tick().await;
                    }
                }
            }

            info!("Matchmaking engine stopped");
        });

        EngineHandle {
            engine: self,
            shutdown_tx,
            task,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    /// Run one tick now, unless one is already in flight.
    pub async fn tick(&self) -> TickReport {
        let Ok(_guard) = self.tick_guard.try_lock() else {
            self.stats.ticks_skipped.fetch_add(1, Ordering::Relaxed);
            debug!("Tick already in flight, skipping");
            return TickReport::skipped();
        };

        let started = Instant::now();
        let mut report = TickReport::default();

        if let Err(err) = self.commit_groups(&mut report).await {
            self.stats.ticks_aborted.fetch_add(1, Ordering::Relaxed);
            error!(error = %err, transient = err.is_transient(), "Tick aborted by store failure");
            report.aborted = Some(err);
        }

        // Matches committed before an abort are still announced.
        report.failed_deliveries = self.announce(&report.matches).await;

        self.stats.ticks_run.fetch_add(1, Ordering::Relaxed);
        self.stats
            .matches_created
            .fetch_add(report.matches.len() as u64, Ordering::Relaxed);
        self.stats
            .matches_expired
            .fetch_add(report.expired as u64, Ordering::Relaxed);
        self.stats
            .conflicts
            .fetch_add(report.conflicts as u64, Ordering::Relaxed);
        self.stats
            .deliveries_failed
            .fetch_add(report.failed_deliveries.len() as u64, Ordering::Relaxed);

        if report.matches.is_empty() {
            debug!(
                waiting = report.waiting,
                expired = report.expired,
                elapsed_us = started.elapsed().as_micros() as u64,
                "Tick complete"
            );
        } else {
            info!(
                waiting = report.waiting,
                matches = report.matches.len(),
                conflicts = report.conflicts,
                failed_deliveries = report.failed_deliveries.len(),
                elapsed_us = started.elapsed().as_micros() as u64,
                "Tick complete"
            );
        }

        report
    }

    /// Expire stale matches, then plan groups from a fresh snapshot and
    /// commit them in order.
    async fn commit_groups(&self, report: &mut TickReport) -> Result<(), StoreError> {
        if let Some(cutoff) = self.config.expiry_cutoff(now_nanos()) {
            let expired = self.store.expire_proposed(cutoff).await?;
            if !expired.is_empty() {
                info!(
                    count = expired.len(),
                    ttl_ms = self.config.match_ttl_ms,
                    "Expired unconfirmed matches"
                );
            }
            report.expired = expired.len();
        }

        let waiting = self.store.fetch_waiting(&WaitingFilter::all()).await?;
        report.waiting = waiting.len();

        let plan = form_groups(waiting, self.config.match_size);
        for group in plan.groups {
            if let Some(created) = self.commit_group(&group, report).await? {
                report.matches.push(created);
            }
        }
        Ok(())
    }

    /// Commit one group; `Ok(None)` when a member was no longer eligible.
    async fn commit_group(
        &self,
        group: &Group,
        report: &mut TickReport,
    ) -> Result<Option<Match>, StoreError> {
        match self.store.transition_to_matched(&group.members).await? {
            TransitionOutcome::Committed => {}
            TransitionOutcome::Conflict { ineligible } => {
                report.conflicts += 1;
                debug!(
                    ineligible = ?ineligible,
                    group_size = group.members.len(),
                    "Group voided, members no longer waiting"
                );
                return Ok(None);
            }
        }

        match self.store.create_match(&group.members).await {
            Ok(created) => {
                debug!(match_id = %created.match_id, members = ?created.members, "Match committed");
                Ok(Some(created))
            }
            Err(err) => {
                if let Err(release_err) = self.store.release_to_waiting(&group.members).await {
                    error!(
                        error = %release_err,
                        members = ?group.members,
                        "Failed to release members after match write failure"
                    );
                }
                Err(err)
            }
        }
    }

    /// Notify every member of every match, concurrently and time-boxed.
    ///
    /// Returns the participants whose delivery failed.
    async fn announce(&self, matches: &[Match]) -> Vec<ParticipantId> {
        let deliveries = matches.iter().flat_map(|m| {
            let payload = serde_json::to_value(MatchFoundEvent::from(m))
                .map_err(|e| DeliveryError::Serialization(e.to_string()));
            m.members
                .iter()
                .map(move |member| self.deliver_one(m.match_id, member, payload.clone()))
        });

        join_all(deliveries)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn deliver_one(
        &self,
        match_id: MatchId,
        participant: &ParticipantId,
        payload: Result<serde_json::Value, DeliveryError>,
    ) -> Option<ParticipantId> {
        let result = match payload {
            Ok(payload) => match timeout(
                self.config.delivery_timeout(),
                self.notifier.deliver(participant, MATCH_FOUND, &payload),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(DeliveryError::Timeout {
                    timeout_ms: self.config.delivery_timeout_ms,
                }),
            },
            Err(err) => Err(err),
        };

        match result {
            Ok(()) => None,
            Err(err) => {
                warn!(
                    participant_id = %participant,
                    match_id = %match_id,
                    error = %err,
                    "Match notification failed"
                );
                Some(participant.clone())
            }
        }
    }
}

/// Handle to a running engine
pub struct EngineHandle {
    engine: Arc<MatchmakingEngine>,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl EngineHandle {
    pub fn engine(&self) -> &Arc<MatchmakingEngine> {
        &self.engine
    }

    /// Stop ticking. Waits for an in-flight tick to finish first.
    pub async fn stop(self) -> Result<(), EngineError> {
        // Err only means the task already exited.
        let _ = self.shutdown_tx.send(true);
        self.task
            .await
            .map_err(|e| EngineError::TaskFailed(e.to_string()))
    }
}
