// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Persisted grouping wrapper.
//!
//! Composes a durable [`GroupingPersister`], an in-memory
//! [`SyncedGrouping`], and a background reconciler:
//!
//! 1. On construction, every stored edge from `list()` is replayed into
//!    the in-memory store (not re-persisted).
//! 2. `watch()` supplies the change channel; a [`Reconciler`] task drains
//!    it until shutdown, applying remote mutations with persistence
//!    suppressed.
//! 3. Local mutations hit the persister first; only a successful commit
//!    mutates memory. The echo of the mutation later arrives on the
//!    channel and applies as a no-op.
//!
//! The persister linearizes writes across replicas; the channel replays
//! its commit order, so replicas sharing a persister converge.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use warden_core::error::{GroupingError, WardenError};
use warden_core::persist::GroupingPersister;
use warden_core::reconcile::{
    EngineHealth, EngineHealthCell, Reconciler, ReconcilerStats, ReconcilerStatsInner,
};
use warden_core::shutdown::ShutdownCoordinator;
use warden_core::types::{Entity, Group, Member};

use crate::traits::{Grouping, SharedGrouping};
use crate::SyncedGrouping;

// =============================================================================
// PersistedGrouping
// =============================================================================

/// A grouping engine backed by a durable store.
pub struct PersistedGrouping<G: Grouping> {
    persister: Arc<dyn GroupingPersister>,
    engine: Arc<SyncedGrouping<G>>,
    health: EngineHealthCell,
    stats: Arc<ReconcilerStatsInner>,
}

impl<G: Grouping + 'static> PersistedGrouping<G> {
    /// Builds the engine: replays the store into `store`, subscribes to
    /// the change stream, and spawns the reconciler.
    ///
    /// The reconciler stops when `shutdown` fires or the persister closes
    /// the channel; an unrequested close is surfaced through
    /// [`health`](Self::health).
    pub async fn new(
        persister: Arc<dyn GroupingPersister>,
        store: G,
        shutdown: &ShutdownCoordinator,
    ) -> Result<Self, WardenError> {
        let engine = Arc::new(SyncedGrouping::new(store));

        let policies = persister.list().await?;
        debug!(count = policies.len(), "replaying grouping policies");
        for policy in policies {
            engine.join(&policy.child, &policy.parent)?;
        }

        let changes = persister.watch().await?;
        let health = EngineHealthCell::new();
        let stats = Arc::new(ReconcilerStatsInner::new());
        Reconciler::spawn(
            "grouping",
            changes,
            Arc::clone(&engine),
            shutdown,
            health.clone(),
            Arc::clone(&stats),
        );

        Ok(Self {
            persister,
            engine,
            health,
            stats,
        })
    }

    /// Returns the health of the reconciliation loop.
    ///
    /// [`EngineHealth::Failed`] means the change channel closed without a
    /// shutdown request: local mutations still work, but this replica no
    /// longer observes remote ones.
    pub fn health(&self) -> EngineHealth {
        self.health.get()
    }

    /// Returns a snapshot of the reconciler counters.
    pub fn reconciler_stats(&self) -> ReconcilerStats {
        self.stats.snapshot()
    }
}

impl<G: Grouping> std::fmt::Debug for PersistedGrouping<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedGrouping")
            .field("engine", &self.engine)
            .field("health", &self.health.get())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<G: Grouping + 'static> SharedGrouping for PersistedGrouping<G> {
    async fn join(&self, child: &Entity, parent: &Group) -> Result<(), WardenError> {
        // Validate before touching the store so invalid edges are never
        // persisted.
        if !parent.accepts(child) {
            return Err(GroupingError::IncompatibleKinds {
                child: child.clone(),
                parent: parent.clone(),
            }
            .into());
        }

        self.persister.insert(child, parent).await?;
        Ok(self.engine.join(child, parent)?)
    }

    async fn leave(&self, child: &Entity, parent: &Group) -> Result<(), WardenError> {
        self.persister.remove(child, parent).await?;
        Ok(self.engine.leave(child, parent)?)
    }

    async fn remove_member(&self, member: &Member) -> Result<(), WardenError> {
        let entity = Entity::Member(member.clone());
        for parent in self.engine.immediate_groups_of(&entity) {
            self.persister.remove(&entity, &parent).await?;
        }
        Ok(self.engine.remove_member(member)?)
    }

    async fn remove_group(&self, group: &Group) -> Result<(), WardenError> {
        let entity = Entity::Group(group.clone());
        for child in self.engine.immediate_entities_in(group) {
            self.persister.remove(&child, group).await?;
        }
        for parent in self.engine.immediate_groups_of(&entity) {
            self.persister.remove(&entity, &parent).await?;
        }
        Ok(self.engine.remove_group(group)?)
    }

    fn is_in(&self, member: &Member, group: &Group) -> bool {
        self.engine.is_in(member, group)
    }

    fn groups_of(&self, entity: &Entity) -> HashSet<Group> {
        self.engine.groups_of(entity)
    }

    fn members_in(&self, group: &Group) -> HashSet<Member> {
        self.engine.members_in(group)
    }

    fn immediate_groups_of(&self, entity: &Entity) -> HashSet<Group> {
        self.engine.immediate_groups_of(entity)
    }

    fn immediate_entities_in(&self, group: &Group) -> HashSet<Entity> {
        self.engine.immediate_entities_in(group)
    }

    fn all_members(&self) -> HashSet<Member> {
        self.engine.all_members()
    }

    fn all_groups(&self) -> HashSet<Group> {
        self.engine.all_groups()
    }
}
