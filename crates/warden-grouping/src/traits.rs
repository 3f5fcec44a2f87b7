// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Grouping traits and configuration.
//!
//! Two contracts exist, at different altitudes:
//!
//! - [`Grouping`] is the synchronous store contract implemented by the
//!   plain in-memory engines ([`SlimGrouping`](crate::SlimGrouping),
//!   [`FatGrouping`](crate::FatGrouping)). Mutators take `&mut self`; the
//!   stores know nothing about locks or persistence.
//! - [`SharedGrouping`] is the concurrent contract consumed by deciders
//!   and facades, implemented by the synchronized and persisted wrappers.
//!   Mutators are async (they may call into a durable store); queries are
//!   synchronous snapshot reads.
//!
//! Every returned collection is an owned copy; callers may retain results
//! across mutations without observing concurrent modification.

use std::collections::HashSet;
use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use warden_core::error::{GroupingError, WardenError};
use warden_core::types::{Entity, Group, Member};

// =============================================================================
// Grouping Configuration
// =============================================================================

/// Default maximum traversal depth.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Configuration for grouping engines.
///
/// Cycles are not rejected eagerly; instead every transitive traversal is
/// capped at `max_depth` edges, bounding work on pathological input.
/// Hitting the cap truncates silently; it is a safety bound, not a user
/// error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupingConfig {
    /// Maximum number of edges a transitive traversal may follow.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl GroupingConfig {
    /// Creates a configuration builder.
    pub fn builder() -> GroupingConfigBuilder {
        GroupingConfigBuilder::default()
    }

    /// Creates a configuration for testing.
    pub fn for_testing() -> Self {
        Self::default()
    }
}

/// Builder for [`GroupingConfig`].
#[derive(Debug, Default)]
pub struct GroupingConfigBuilder {
    config: GroupingConfig,
}

impl GroupingConfigBuilder {
    /// Sets the maximum traversal depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> GroupingConfig {
        self.config
    }
}

// =============================================================================
// Grouping Store Trait
// =============================================================================

/// The store contract for hierarchical groupings.
///
/// An edge relates a child entity to a parent group. Members may only be
/// children; groups may be both. Transitive queries are bounded by the
/// store's [`GroupingConfig::max_depth`].
pub trait Grouping: Send + Sync + Debug {
    /// Inserts an edge. Idempotent.
    ///
    /// # Errors
    ///
    /// [`GroupingError::IncompatibleKinds`] if the child cannot join the
    /// parent (kind check; see [`Group::accepts`]).
    fn join(&mut self, child: &Entity, parent: &Group) -> Result<(), GroupingError>;

    /// Removes an edge.
    ///
    /// # Errors
    ///
    /// [`GroupingError::EdgeNotFound`] if the edge does not exist.
    fn leave(&mut self, child: &Entity, parent: &Group) -> Result<(), GroupingError>;

    /// Returns `true` iff `member` transitively belongs to `group`.
    fn is_in(&self, member: &Member, group: &Group) -> bool;

    /// Returns every group the entity transitively belongs to.
    fn groups_of(&self, entity: &Entity) -> HashSet<Group>;

    /// Returns every member transitively contained in the group.
    fn members_in(&self, group: &Group) -> HashSet<Member>;

    /// Returns the groups the entity directly joined.
    fn immediate_groups_of(&self, entity: &Entity) -> HashSet<Group>;

    /// Returns the entities directly joined to the group.
    fn immediate_entities_in(&self, group: &Group) -> HashSet<Entity>;

    /// Returns every member known to the store.
    fn all_members(&self) -> HashSet<Member>;

    /// Returns every group known to the store.
    fn all_groups(&self) -> HashSet<Group>;

    /// Removes a member and every edge referencing it. Idempotent.
    fn remove_member(&mut self, member: &Member) -> Result<(), GroupingError>;

    /// Removes a group, cascading: its incoming and outgoing edges are
    /// deleted. Idempotent.
    fn remove_group(&mut self, group: &Group) -> Result<(), GroupingError>;
}

// =============================================================================
// Shared Grouping Trait
// =============================================================================

/// The concurrent grouping contract.
///
/// Implemented by [`SyncedGrouping`](crate::SyncedGrouping) (lock only)
/// and [`PersistedGrouping`](crate::PersistedGrouping) (durable store +
/// lock + reconciler). Mutators are totally ordered per engine; a query
/// that starts after a mutator completes observes its effect.
#[async_trait]
pub trait SharedGrouping: Send + Sync {
    /// Inserts an edge. Idempotent.
    async fn join(&self, child: &Entity, parent: &Group) -> Result<(), WardenError>;

    /// Removes an edge; fails with not-found if it does not exist.
    async fn leave(&self, child: &Entity, parent: &Group) -> Result<(), WardenError>;

    /// Removes a member and every edge referencing it.
    async fn remove_member(&self, member: &Member) -> Result<(), WardenError>;

    /// Removes a group, cascading over its edges.
    async fn remove_group(&self, group: &Group) -> Result<(), WardenError>;

    /// Returns `true` iff `member` transitively belongs to `group`.
    fn is_in(&self, member: &Member, group: &Group) -> bool;

    /// Returns every group the entity transitively belongs to.
    fn groups_of(&self, entity: &Entity) -> HashSet<Group>;

    /// Returns every member transitively contained in the group.
    fn members_in(&self, group: &Group) -> HashSet<Member>;

    /// Returns the groups the entity directly joined.
    fn immediate_groups_of(&self, entity: &Entity) -> HashSet<Group>;

    /// Returns the entities directly joined to the group.
    fn immediate_entities_in(&self, group: &Group) -> HashSet<Entity>;

    /// Returns every member known to the engine.
    fn all_members(&self) -> HashSet<Member>;

    /// Returns every group known to the engine.
    fn all_groups(&self) -> HashSet<Group>;
}

// =============================================================================
// Tests
// =============================================================================
