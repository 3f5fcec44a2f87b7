// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Persisted permission wrapper.
//!
//! Same composition as the persisted grouping: durable store + in-memory
//! synchronized store + reconciler. The store holds final masks, so local
//! mutations compute the post-mutation mask from current memory and
//! upsert it whole; the store never unions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use warden_core::action::Action;
use warden_core::error::{PermissionError, WardenError};
use warden_core::persist::PermissionPersister;
use warden_core::reconcile::{
    EngineHealth, EngineHealthCell, Reconciler, ReconcilerStats, ReconcilerStatsInner,
};
use warden_core::shutdown::ShutdownCoordinator;
use warden_core::types::{Object, Subject};

use crate::store::PermissionStore;
use crate::traits::SharedPermission;
use crate::SyncedPermission;

// =============================================================================
// PersistedPermission
// =============================================================================

/// A permission engine backed by a durable store.
pub struct PersistedPermission<P: PermissionStore> {
    persister: Arc<dyn PermissionPersister>,
    engine: Arc<SyncedPermission<P>>,
    health: EngineHealthCell,
    stats: Arc<ReconcilerStatsInner>,
}

impl<P: PermissionStore + 'static> PersistedPermission<P> {
    /// Builds the engine: replays the store into `store`, subscribes to
    /// the change stream, and spawns the reconciler.
    pub async fn new(
        persister: Arc<dyn PermissionPersister>,
        store: P,
        shutdown: &ShutdownCoordinator,
    ) -> Result<Self, WardenError> {
        let engine = Arc::new(SyncedPermission::new(store));

        let policies = persister.list().await?;
        debug!(count = policies.len(), "replaying permission policies");
        for policy in policies {
            engine.apply(&policy.subject, &policy.object, policy.action);
        }

        let changes = persister.watch().await?;
        let health = EngineHealthCell::new();
        let stats = Arc::new(ReconcilerStatsInner::new());
        Reconciler::spawn(
            "permission",
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
    pub fn health(&self) -> EngineHealth {
        self.health.get()
    }

    /// Returns a snapshot of the reconciler counters.
    pub fn reconciler_stats(&self) -> ReconcilerStats {
        self.stats.snapshot()
    }
}

impl<P: PermissionStore> std::fmt::Debug for PersistedPermission<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedPermission")
            .field("engine", &self.engine)
            .field("health", &self.health.get())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<P: PermissionStore + 'static> SharedPermission for PersistedPermission<P> {
    async fn permit(
        &self,
        subject: &Subject,
        object: &Object,
        action: Action,
    ) -> Result<(), WardenError> {
        let current = self.engine.permitted_actions(subject, object);
        let target = current | action;
        if target == current {
            debug!(subject = %subject, object = %object, "permit changes nothing");
            return Ok(());
        }

        self.persister.upsert(subject, object, target).await?;
        self.engine.apply(subject, object, target);
        Ok(())
    }

    async fn revoke(
        &self,
        subject: &Subject,
        object: &Object,
        action: Action,
    ) -> Result<(), WardenError> {
        let current = self.engine.permitted_actions(subject, object);
        if current.is_none() {
            return Err(PermissionError::PolicyNotFound {
                subject: subject.clone(),
                object: object.clone(),
            }
            .into());
        }

        let target = current.difference(action);
        if target.is_none() {
            self.persister.remove(subject, object).await?;
        } else {
            self.persister.upsert(subject, object, target).await?;
        }
        self.engine.apply(subject, object, target);
        Ok(())
    }

    fn shall(&self, subject: &Subject, object: &Object, action: Action) -> bool {
        self.engine.shall(subject, object, action)
    }

    fn permitted_actions(&self, subject: &Subject, object: &Object) -> Action {
        self.engine.permitted_actions(subject, object)
    }

    fn permissions_on(&self, object: &Object) -> HashMap<Subject, Action> {
        self.engine.permissions_on(object)
    }

    fn permissions_for(&self, subject: &Subject) -> HashMap<Object, Action> {
        self.engine.permissions_for(subject)
    }
}
