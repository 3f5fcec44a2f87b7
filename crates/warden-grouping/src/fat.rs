// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Fat grouping store: direct edges plus materialized closures.
//!
//! Keeps a [`SlimGrouping`] for the direct-edge graph and two
//! pre-computed transitive closures on top of it:
//!
//! - `ancestors[entity]` - every group the entity transitively belongs to
//! - `members[group]` - every leaf member transitively contained in it
//!
//! `join` merges closures incrementally. `leave` and the removals rebuild
//! the closures of every affected node by re-running the slim computation
//! over the remaining direct edges; removal is rare in RBAC workloads, so
//! the rebuild cost is acceptable. Queries are O(entries returned).
//!
//! Invariant after every mutation: `m ∈ members[g]` iff the direct-edge
//! graph has a path `m → … → g` within the configured depth.

use std::collections::{HashMap, HashSet, VecDeque};

use warden_core::error::GroupingError;
use warden_core::types::{Entity, Group, Member};

use crate::slim::SlimGrouping;
use crate::traits::{Grouping, GroupingConfig};

// =============================================================================
// FatGrouping
// =============================================================================

/// Grouping store with materialized transitive closures.
///
/// Same contract as [`SlimGrouping`]; trades write amortization for
/// constant-time transitive reads.
#[derive(Debug)]
pub struct FatGrouping {
    /// Direct edges; the source of truth the closures derive from.
    slim: SlimGrouping,
    /// entity -> every group it transitively belongs to
    ancestors: HashMap<Entity, HashSet<Group>>,
    /// group -> every leaf member transitively contained in it
    members: HashMap<Group, HashSet<Member>>,
}

impl FatGrouping {
    /// Creates an empty store with the given configuration.
    pub fn new(config: GroupingConfig) -> Self {
        Self {
            slim: SlimGrouping::new(config),
            ancestors: HashMap::new(),
            members: HashMap::new(),
        }
    }

    /// Creates an empty store with the default configuration.
    pub fn with_defaults() -> Self {
        Self::new(GroupingConfig::default())
    }

    /// Returns the store configuration.
    pub fn config(&self) -> &GroupingConfig {
        self.slim.config()
    }

    /// The entity and everything transitively below it, by direct edges.
    fn subtree_of(&self, entity: &Entity) -> HashSet<Entity> {
        let mut found = HashSet::from([entity.clone()]);
        let mut queue = VecDeque::from([(entity.clone(), 0usize)]);

        while let Some((entity, depth)) = queue.pop_front() {
            if depth == self.slim.config().max_depth {
                continue;
            }
            let Entity::Group(group) = entity else {
                continue;
            };
            for child in self.slim.immediate_entities_in(&group) {
                if found.insert(child.clone()) {
                    queue.push_back((child, depth + 1));
                }
            }
        }

        found
    }

    /// The group and everything transitively above it, by direct edges.
    fn chain_of(&self, group: &Group) -> HashSet<Group> {
        let mut chain = self.slim.groups_of(&Entity::Group(group.clone()));
        chain.insert(group.clone());
        chain
    }

    /// Recomputes the ancestor closure of every entity at or below `entity`.
    fn rebuild_ancestors_below(&mut self, entity: &Entity) {
        for affected in self.subtree_of(entity) {
            let groups = self.slim.groups_of(&affected);
            self.ancestors.insert(affected, groups);
        }
    }

    /// Recomputes the member closure of `group` and every group above it.
    fn rebuild_members_above(&mut self, group: &Group) {
        for affected in self.chain_of(group) {
            let members = self.slim.members_in(&affected);
            self.members.insert(affected, members);
        }
    }
}

impl Grouping for FatGrouping {
    fn join(&mut self, child: &Entity, parent: &Group) -> Result<(), GroupingError> {
        self.slim.join(child, parent)?;

        // New ancestors reachable through the edge: the parent and its
        // own ancestors. They apply to the child and its whole subtree.
        let mut gained = self
            .ancestors
            .get(&Entity::Group(parent.clone()))
            .cloned()
            .unwrap_or_default();
        gained.insert(parent.clone());

        for below in self.subtree_of(child) {
            self.ancestors
                .entry(below)
                .or_default()
                .extend(gained.iter().cloned());
        }

        // Members flowing up through the edge: the child itself if it is
        // a leaf, otherwise its member closure. They reach the parent and
        // every group the parent belongs to, which is exactly `gained`.
        let arriving: HashSet<Member> = match child {
            Entity::Member(m) => HashSet::from([m.clone()]),
            Entity::Group(g) => self.members.get(g).cloned().unwrap_or_default(),
        };
        for group in gained {
            self.members
                .entry(group)
                .or_default()
                .extend(arriving.iter().cloned());
        }

        Ok(())
    }

    fn leave(&mut self, child: &Entity, parent: &Group) -> Result<(), GroupingError> {
        self.slim.leave(child, parent)?;
        self.rebuild_ancestors_below(child);
        self.rebuild_members_above(parent);
        Ok(())
    }

    fn is_in(&self, member: &Member, group: &Group) -> bool {
        self.members
            .get(group)
            .is_some_and(|members| members.contains(member))
    }

    fn groups_of(&self, entity: &Entity) -> HashSet<Group> {
        self.ancestors.get(entity).cloned().unwrap_or_default()
    }

    fn members_in(&self, group: &Group) -> HashSet<Member> {
        self.members.get(group).cloned().unwrap_or_default()
    }

    fn immediate_groups_of(&self, entity: &Entity) -> HashSet<Group> {
        self.slim.immediate_groups_of(entity)
    }

    fn immediate_entities_in(&self, group: &Group) -> HashSet<Entity> {
        self.slim.immediate_entities_in(group)
    }

    fn all_members(&self) -> HashSet<Member> {
        self.slim.all_members()
    }

    fn all_groups(&self) -> HashSet<Group> {
        self.slim.all_groups()
    }

    fn remove_member(&mut self, member: &Member) -> Result<(), GroupingError> {
        let entity = Entity::Member(member.clone());
        let former_parents = self.slim.immediate_groups_of(&entity);

        self.slim.remove_member(member)?;
        self.ancestors.remove(&entity);

        for parent in former_parents {
            self.rebuild_members_above(&parent);
        }
        Ok(())
    }

    fn remove_group(&mut self, group: &Group) -> Result<(), GroupingError> {
        let entity = Entity::Group(group.clone());
        let former_children = self.slim.immediate_entities_in(group);
        let former_parents = self.slim.immediate_groups_of(&entity);

        self.slim.remove_group(group)?;
        self.ancestors.remove(&entity);
        self.members.remove(group);

        for child in former_children {
            self.rebuild_ancestors_below(&child);
        }
        for parent in former_parents {
            self.rebuild_members_above(&parent);
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
