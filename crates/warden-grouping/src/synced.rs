// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Synchronized grouping wrapper.
//!
//! Wraps any [`Grouping`] store behind a single `parking_lot::RwLock`:
//! mutators take the write lock, queries the read lock, so readers
//! proceed in parallel while writes are totally ordered. Nothing borrowed
//! from inside the lock escapes: the store contract already returns
//! owned copies, and this wrapper hands them through unchanged.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::RwLock;

use warden_core::error::{GroupingError, WardenError};
use warden_core::policy::{GroupingChange, PersistMethod};
use warden_core::reconcile::{ApplyOutcome, ChangeApplier};
use warden_core::types::{Entity, Group, Member};

use crate::traits::{Grouping, SharedGrouping};

// =============================================================================
// SyncedGrouping
// =============================================================================

/// Thread-safe wrapper around a grouping store.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use warden_core::types::{Entity, Group, Member};
/// use warden_grouping::{SlimGrouping, SyncedGrouping};
///
/// let g = Arc::new(SyncedGrouping::new(SlimGrouping::with_defaults()));
/// g.join(&Entity::user("alice"), &Group::role("ops")).unwrap();
/// assert!(g.is_in(&Member::user("alice"), &Group::role("ops")));
/// ```
#[derive(Debug)]
pub struct SyncedGrouping<G: Grouping> {
    inner: RwLock<G>,
}

impl<G: Grouping> SyncedGrouping<G> {
    /// Wraps a grouping store.
    pub fn new(store: G) -> Self {
        Self {
            inner: RwLock::new(store),
        }
    }

    /// Inserts an edge. Idempotent.
    pub fn join(&self, child: &Entity, parent: &Group) -> Result<(), GroupingError> {
        self.inner.write().join(child, parent)
    }

    /// Removes an edge; fails with not-found if it does not exist.
    pub fn leave(&self, child: &Entity, parent: &Group) -> Result<(), GroupingError> {
        self.inner.write().leave(child, parent)
    }

    /// Removes a member and every edge referencing it.
    pub fn remove_member(&self, member: &Member) -> Result<(), GroupingError> {
        self.inner.write().remove_member(member)
    }

    /// Removes a group, cascading over its edges.
    pub fn remove_group(&self, group: &Group) -> Result<(), GroupingError> {
        self.inner.write().remove_group(group)
    }

    /// Returns `true` iff `member` transitively belongs to `group`.
    pub fn is_in(&self, member: &Member, group: &Group) -> bool {
        self.inner.read().is_in(member, group)
    }

    /// Returns every group the entity transitively belongs to.
    pub fn groups_of(&self, entity: &Entity) -> HashSet<Group> {
        self.inner.read().groups_of(entity)
    }

    /// Returns every member transitively contained in the group.
    pub fn members_in(&self, group: &Group) -> HashSet<Member> {
        self.inner.read().members_in(group)
    }

    /// Returns the groups the entity directly joined.
    pub fn immediate_groups_of(&self, entity: &Entity) -> HashSet<Group> {
        self.inner.read().immediate_groups_of(entity)
    }

    /// Returns the entities directly joined to the group.
    pub fn immediate_entities_in(&self, group: &Group) -> HashSet<Entity> {
        self.inner.read().immediate_entities_in(group)
    }

    /// Returns every member known to the store.
    pub fn all_members(&self) -> HashSet<Member> {
        self.inner.read().all_members()
    }

    /// Returns every group known to the store.
    pub fn all_groups(&self) -> HashSet<Group> {
        self.inner.read().all_groups()
    }
}

#[async_trait]
impl<G: Grouping> SharedGrouping for SyncedGrouping<G> {
    async fn join(&self, child: &Entity, parent: &Group) -> Result<(), WardenError> {
        Ok(SyncedGrouping::join(self, child, parent)?)
    }

    async fn leave(&self, child: &Entity, parent: &Group) -> Result<(), WardenError> {
        Ok(SyncedGrouping::leave(self, child, parent)?)
    }

    async fn remove_member(&self, member: &Member) -> Result<(), WardenError> {
        Ok(SyncedGrouping::remove_member(self, member)?)
    }

    async fn remove_group(&self, group: &Group) -> Result<(), WardenError> {
        Ok(SyncedGrouping::remove_group(self, group)?)
    }

    fn is_in(&self, member: &Member, group: &Group) -> bool {
        SyncedGrouping::is_in(self, member, group)
    }

    fn groups_of(&self, entity: &Entity) -> HashSet<Group> {
        SyncedGrouping::groups_of(self, entity)
    }

    fn members_in(&self, group: &Group) -> HashSet<Member> {
        SyncedGrouping::members_in(self, group)
    }

    fn immediate_groups_of(&self, entity: &Entity) -> HashSet<Group> {
        SyncedGrouping::immediate_groups_of(self, entity)
    }

    fn immediate_entities_in(&self, group: &Group) -> HashSet<Entity> {
        SyncedGrouping::immediate_entities_in(self, group)
    }

    fn all_members(&self) -> HashSet<Member> {
        SyncedGrouping::all_members(self)
    }

    fn all_groups(&self) -> HashSet<Group> {
        SyncedGrouping::all_groups(self)
    }
}

// =============================================================================
// Remote Change Application
// =============================================================================

impl<G: Grouping> ChangeApplier<GroupingChange> for SyncedGrouping<G> {
    /// Applies a remote grouping change without re-persisting it.
    ///
    /// Echoes of local mutations are detected against current state and
    /// reported as no-ops; `update` is not a grouping method and is
    /// rejected for the reconciler to drop.
    fn apply_change(&self, change: GroupingChange) -> Result<ApplyOutcome, WardenError> {
        let child = &change.policy.child;
        let parent = &change.policy.parent;

        match change.method {
            PersistMethod::Insert => {
                if self.immediate_groups_of(child).contains(parent) {
                    return Ok(ApplyOutcome::Noop);
                }
                self.join(child, parent)?;
                Ok(ApplyOutcome::Applied)
            }
            PersistMethod::Delete => match self.leave(child, parent) {
                Ok(()) => Ok(ApplyOutcome::Applied),
                Err(GroupingError::EdgeNotFound { .. }) => Ok(ApplyOutcome::Noop),
                Err(e) => Err(e.into()),
            },
            PersistMethod::Update => Err(warden_core::error::PersistError::UnsupportedMethod {
                method: change.method,
            }
            .into()),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
