// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Durable policy store interfaces.
//!
//! A persister is the durable source of truth shared by every replica of
//! an engine. Local mutations go to the persister first and touch memory
//! only after it commits; the same mutation later arrives on the change
//! channel and must apply as a no-op. Remote mutations arrive only on the
//! channel.
//!
//! Implementations decide their own durability and buffering, but must
//! provide **at-least-once, commit-ordered** change delivery and close
//! every handed-out channel on shutdown.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::action::Action;
use crate::error::PersistError;
use crate::policy::{GroupingChange, GroupingPolicy, PermissionChange, PermissionPolicy};
use crate::types::{Entity, Group, Object, Subject};

// =============================================================================
// GroupingPersister
// =============================================================================

/// Durable store for grouping edges.
#[async_trait]
pub trait GroupingPersister: Send + Sync {
    /// Persists an edge. Idempotent: inserting an existing edge succeeds
    /// and emits no change.
    async fn insert(&self, child: &Entity, parent: &Group) -> Result<(), PersistError>;

    /// Removes an edge. Idempotent: removing an absent edge succeeds and
    /// emits no change.
    async fn remove(&self, child: &Entity, parent: &Group) -> Result<(), PersistError>;

    /// Lists every stored edge, for initial replay.
    async fn list(&self) -> Result<Vec<GroupingPolicy>, PersistError>;

    /// Subscribes to the change stream.
    ///
    /// Every mutation that alters the store is delivered, in commit
    /// order, to every subscriber. The persister closes the channel when
    /// it shuts down.
    async fn watch(&self) -> Result<mpsc::Receiver<GroupingChange>, PersistError>;
}

// =============================================================================
// PermissionPersister
// =============================================================================

/// Durable store for permission tuples.
#[async_trait]
pub trait PermissionPersister: Send + Sync {
    /// Persists the final mask for a tuple, replacing any previous value.
    ///
    /// The engine computes the post-mutation mask and upserts it whole;
    /// the store never unions. Upserting the already-stored mask succeeds
    /// and emits no change.
    async fn upsert(
        &self,
        subject: &Subject,
        object: &Object,
        action: Action,
    ) -> Result<(), PersistError>;

    /// Removes a tuple. Idempotent: removing an absent tuple succeeds and
    /// emits no change.
    async fn remove(&self, subject: &Subject, object: &Object) -> Result<(), PersistError>;

    /// Lists every stored tuple, for initial replay.
    async fn list(&self) -> Result<Vec<PermissionPolicy>, PersistError>;

    /// Subscribes to the change stream. Same contract as
    /// [`GroupingPersister::watch`].
    async fn watch(&self) -> Result<mpsc::Receiver<PermissionChange>, PersistError>;
}
