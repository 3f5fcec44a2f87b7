// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Change-stream reconciliation.
//!
//! A persisted engine subscribes to its persister's change channel and
//! spawns one [`Reconciler`] task. The task drains records in receive
//! order and applies each through the engine's write path with
//! persistence suppressed, so replicas sharing a persister converge on
//! the persister's commit order.
//!
//! Delivery is at-least-once: echoes of local mutations and redeliveries
//! apply as no-ops. A record the engine cannot apply (for example a
//! grouping record with an `update` method) is logged and dropped.
//!
//! The loop exits when the channel closes: a clean stop if shutdown was
//! requested, otherwise a fatal condition (the engine keeps serving but
//! will drift from other replicas) surfaced through [`EngineHealth`].

use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::error::WardenError;
use crate::shutdown::ShutdownCoordinator;

// =============================================================================
// EngineHealth
// =============================================================================

/// Health of a persisted engine's reconciliation loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineHealth {
    /// The reconciler is draining the change stream.
    Running,
    /// The reconciler exited cleanly after a requested shutdown.
    Stopped,
    /// The change channel closed without a shutdown request; local calls
    /// still work but this replica no longer sees remote mutations.
    Failed,
}

impl EngineHealth {
    /// Returns the health state as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineHealth::Running => "running",
            EngineHealth::Stopped => "stopped",
            EngineHealth::Failed => "failed",
        }
    }
}

/// Shared, lock-free cell holding an [`EngineHealth`].
#[derive(Debug, Clone)]
pub struct EngineHealthCell(Arc<AtomicU8>);

impl EngineHealthCell {
    /// Creates a cell in the [`EngineHealth::Running`] state.
    pub fn new() -> Self {
        Self(Arc::new(AtomicU8::new(EngineHealth::Running as u8)))
    }

    /// Returns the current health.
    pub fn get(&self) -> EngineHealth {
        match self.0.load(Ordering::SeqCst) {
            0 => EngineHealth::Running,
            1 => EngineHealth::Stopped,
            _ => EngineHealth::Failed,
        }
    }

    fn set(&self, health: EngineHealth) {
        self.0.store(health as u8, Ordering::SeqCst);
    }
}

impl Default for EngineHealthCell {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Reconciler Statistics
// =============================================================================

/// Lock-free reconciler counters. All operations are O(1) atomics.
#[derive(Debug, Default)]
pub struct ReconcilerStatsInner {
    /// Records that mutated the in-memory engine.
    records_applied: AtomicU64,
    /// Records that were already reflected in memory (echoes, redeliveries).
    records_noop: AtomicU64,
    /// Records that could not be applied and were dropped.
    records_dropped: AtomicU64,
    /// Timestamp of the last applied record (unix nanos, 0 = never).
    last_applied_nanos: AtomicI64,
}

impl ReconcilerStatsInner {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    fn record_applied(&self) {
        self.records_applied.fetch_add(1, Ordering::Relaxed);
        self.last_applied_nanos.store(
            Utc::now().timestamp_nanos_opt().unwrap_or(0),
            Ordering::Relaxed,
        );
    }

    fn record_noop(&self) {
        self.records_noop.fetch_add(1, Ordering::Relaxed);
    }

    fn record_dropped(&self) {
        self.records_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Creates an immutable snapshot of the counters.
    pub fn snapshot(&self) -> ReconcilerStats {
        let nanos = self.last_applied_nanos.load(Ordering::Relaxed);
        ReconcilerStats {
            records_applied: self.records_applied.load(Ordering::Relaxed),
            records_noop: self.records_noop.load(Ordering::Relaxed),
            records_dropped: self.records_dropped.load(Ordering::Relaxed),
            last_applied_at: (nanos > 0).then(|| DateTime::from_timestamp_nanos(nanos)),
        }
    }
}

/// Immutable snapshot of reconciler counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerStats {
    /// Records that mutated the in-memory engine.
    pub records_applied: u64,
    /// Records already reflected in memory.
    pub records_noop: u64,
    /// Records dropped as unappliable.
    pub records_dropped: u64,
    /// When the last record was applied.
    pub last_applied_at: Option<DateTime<Utc>>,
}

// =============================================================================
// ChangeApplier
// =============================================================================

/// Outcome of applying one change record to an in-memory engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The record mutated the engine.
    Applied,
    /// The engine already reflected the record.
    Noop,
}

/// Applies remote change records to an in-memory engine.
///
/// Implementations run under the engine's write lock and must never
/// re-persist: the record came from the store.
pub trait ChangeApplier<C>: Send + Sync {
    /// Applies one record.
    ///
    /// Returns [`ApplyOutcome::Noop`] for records already reflected in
    /// memory (echoes of local mutations, redeliveries). An error means
    /// the record is unappliable and will be dropped by the reconciler.
    fn apply_change(&self, change: C) -> Result<ApplyOutcome, WardenError>;
}

// =============================================================================
// Reconciler
// =============================================================================

/// The background task draining one change channel into one engine.
pub struct Reconciler;

impl Reconciler {
    /// Spawns the reconciliation loop.
    ///
    /// The loop runs until the channel closes or `shutdown` fires,
    /// updating `health` on exit and `stats` per record. Records are
    /// applied strictly in receive order; application serializes behind
    /// the engine's write lock, interleaving fairly with local API calls.
    pub fn spawn<C, A>(
        name: &'static str,
        mut changes: mpsc::Receiver<C>,
        applier: Arc<A>,
        shutdown: &ShutdownCoordinator,
        health: EngineHealthCell,
        stats: Arc<ReconcilerStatsInner>,
    ) -> JoinHandle<()>
    where
        C: Send + 'static,
        A: ChangeApplier<C> + ?Sized + 'static,
    {
        let mut shutdown_rx = shutdown.subscribe();
        let token = shutdown.token();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!(engine = name, "reconciler stopping on shutdown");
                        health.set(EngineHealth::Stopped);
                        break;
                    }
                    change = changes.recv() => match change {
                        Some(change) => match applier.apply_change(change) {
                            Ok(ApplyOutcome::Applied) => {
                                stats.record_applied();
                                debug!(engine = name, "applied remote change");
                            }
                            Ok(ApplyOutcome::Noop) => {
                                stats.record_noop();
                                debug!(engine = name, "remote change already applied");
                            }
                            Err(e) => {
                                stats.record_dropped();
                                warn!(
                                    engine = name,
                                    error = %e,
                                    error_type = e.error_type(),
                                    "dropping unappliable change record"
                                );
                            }
                        },
                        None => {
                            if token.is_shutdown_requested() {
                                debug!(engine = name, "change channel closed after shutdown");
                                health.set(EngineHealth::Stopped);
                            } else {
                                error!(
                                    engine = name,
                                    "change channel closed unexpectedly; replica will drift"
                                );
                                health.set(EngineHealth::Failed);
                            }
                            break;
                        }
                    }
                }
            }
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
