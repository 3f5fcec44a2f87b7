// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Filtering persister wrappers.
//!
//! Wrap any persister with a mirror of its state and skip calls that
//! would not change it: duplicate inserts, removals of absent rows,
//! upserts of the already-stored mask. The store and its change stream
//! are spared the no-op traffic that engines emit when the same policy is
//! pushed from several paths.
//!
//! The mirror tracks this process's view only; it is primed from
//! `list()` at construction and updated after the inner call succeeds,
//! never before. Remote mutations bypass the mirror, so a duplicate of a
//! remotely-created row may still reach the inner persister, which is
//! idempotent by contract.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use warden_core::action::Action;
use warden_core::error::PersistError;
use warden_core::persist::{GroupingPersister, PermissionPersister};
use warden_core::policy::{GroupingChange, GroupingPolicy, PermissionChange, PermissionPolicy};
use warden_core::types::{Entity, Group, Object, Subject};

// =============================================================================
// FilterGroupingPersister
// =============================================================================

/// Deduplicating wrapper over a grouping persister.
pub struct FilterGroupingPersister {
    inner: Arc<dyn GroupingPersister>,
    mirror: Mutex<HashMap<Entity, HashSet<Group>>>,
}

impl FilterGroupingPersister {
    /// Wraps `inner`, priming the mirror from its current contents.
    pub async fn new(inner: Arc<dyn GroupingPersister>) -> Result<Self, PersistError> {
        let mut mirror: HashMap<Entity, HashSet<Group>> = HashMap::new();
        for policy in inner.list().await? {
            mirror.entry(policy.child).or_default().insert(policy.parent);
        }
        Ok(Self {
            inner,
            mirror: Mutex::new(mirror),
        })
    }

    fn knows(&self, child: &Entity, parent: &Group) -> bool {
        self.mirror
            .lock()
            .get(child)
            .is_some_and(|parents| parents.contains(parent))
    }
}

#[async_trait]
impl GroupingPersister for FilterGroupingPersister {
    async fn insert(&self, child: &Entity, parent: &Group) -> Result<(), PersistError> {
        if self.knows(child, parent) {
            debug!(child = %child, parent = %parent, "skipping duplicate insert");
            return Ok(());
        }
        self.inner.insert(child, parent).await?;
        self.mirror
            .lock()
            .entry(child.clone())
            .or_default()
            .insert(parent.clone());
        Ok(())
    }

    async fn remove(&self, child: &Entity, parent: &Group) -> Result<(), PersistError> {
        if !self.knows(child, parent) {
            debug!(child = %child, parent = %parent, "skipping removal of absent edge");
            return Ok(());
        }
        self.inner.remove(child, parent).await?;
        if let Some(parents) = self.mirror.lock().get_mut(child) {
            parents.remove(parent);
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<GroupingPolicy>, PersistError> {
        self.inner.list().await
    }

    async fn watch(&self) -> Result<mpsc::Receiver<GroupingChange>, PersistError> {
        self.inner.watch().await
    }
}

// =============================================================================
// FilterPermissionPersister
// =============================================================================

/// Deduplicating wrapper over a permission persister.
pub struct FilterPermissionPersister {
    inner: Arc<dyn PermissionPersister>,
    mirror: Mutex<HashMap<Subject, HashMap<Object, Action>>>,
}

impl FilterPermissionPersister {
    /// Wraps `inner`, priming the mirror from its current contents.
    pub async fn new(inner: Arc<dyn PermissionPersister>) -> Result<Self, PersistError> {
        let mut mirror: HashMap<Subject, HashMap<Object, Action>> = HashMap::new();
        for policy in inner.list().await? {
            mirror
                .entry(policy.subject)
                .or_default()
                .insert(policy.object, policy.action);
        }
        Ok(Self {
            inner,
            mirror: Mutex::new(mirror),
        })
    }

    fn stored_mask(&self, subject: &Subject, object: &Object) -> Option<Action> {
        self.mirror
            .lock()
            .get(subject)
            .and_then(|objects| objects.get(object))
            .copied()
    }
}

#[async_trait]
impl PermissionPersister for FilterPermissionPersister {
    async fn upsert(
        &self,
        subject: &Subject,
        object: &Object,
        action: Action,
    ) -> Result<(), PersistError> {
        if self.stored_mask(subject, object) == Some(action) {
            debug!(subject = %subject, object = %object, "skipping upsert of identical mask");
            return Ok(());
        }
        self.inner.upsert(subject, object, action).await?;
        self.mirror
            .lock()
            .entry(subject.clone())
            .or_default()
            .insert(object.clone(), action);
        Ok(())
    }

    async fn remove(&self, subject: &Subject, object: &Object) -> Result<(), PersistError> {
        if self.stored_mask(subject, object).is_none() {
            debug!(subject = %subject, object = %object, "skipping removal of absent tuple");
            return Ok(());
        }
        self.inner.remove(subject, object).await?;
        let mut mirror = self.mirror.lock();
        if let Some(objects) = mirror.get_mut(subject) {
            objects.remove(object);
            if objects.is_empty() {
                mirror.remove(subject);
            }
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<PermissionPolicy>, PersistError> {
        self.inner.list().await
    }

    async fn watch(&self) -> Result<mpsc::Receiver<PermissionChange>, PersistError> {
        self.inner.watch().await
    }
}

// =============================================================================
// Tests
// =============================================================================
