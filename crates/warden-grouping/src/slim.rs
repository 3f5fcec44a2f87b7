// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Slim grouping store: direct edges only.
//!
//! Stores two symmetric maps, `parents[child]` and `children[parent]`,
//! and answers every transitive query with an on-demand, depth-capped
//! traversal. Space is O(edges); a transitive query is O(nodes + edges).
//!
//! Intended for workloads where memberships change often and transitive
//! queries are rare. For the opposite trade-off see
//! [`FatGrouping`](crate::FatGrouping).

use std::collections::{HashMap, HashSet, VecDeque};

use warden_core::error::GroupingError;
use warden_core::types::{Entity, Group, Member};

use crate::traits::{Grouping, GroupingConfig};

// =============================================================================
// SlimGrouping
// =============================================================================

/// Direct-edges-only grouping store.
///
/// # Examples
///
/// ```
/// use warden_core::types::{Entity, Group, Member};
/// use warden_grouping::{Grouping, GroupingConfig, SlimGrouping};
///
/// let mut g = SlimGrouping::new(GroupingConfig::default());
/// g.join(&Entity::user("alice"), &Group::role("ops")).unwrap();
/// g.join(&Entity::role("ops"), &Group::role("staff")).unwrap();
///
/// assert!(g.is_in(&Member::user("alice"), &Group::role("staff")));
/// ```
#[derive(Debug)]
pub struct SlimGrouping {
    /// child -> groups it directly joined
    parents: HashMap<Entity, HashSet<Group>>,
    /// group -> entities directly joined to it
    children: HashMap<Group, HashSet<Entity>>,
    config: GroupingConfig,
}

impl SlimGrouping {
    /// Creates an empty store with the given configuration.
    pub fn new(config: GroupingConfig) -> Self {
        Self {
            parents: HashMap::new(),
            children: HashMap::new(),
            config,
        }
    }

    /// Creates an empty store with the default configuration.
    pub fn with_defaults() -> Self {
        Self::new(GroupingConfig::default())
    }

    /// Returns the store configuration.
    pub fn config(&self) -> &GroupingConfig {
        &self.config
    }

    /// Depth-capped upward walk collecting every reachable parent group.
    ///
    /// An explicit work queue with a visited set keeps the depth bound
    /// and cycle safety obvious; `target` short-circuits the walk.
    fn walk_up(&self, start: &Entity, target: Option<&Group>) -> (HashSet<Group>, bool) {
        let mut found = HashSet::new();
        let mut visited: HashSet<Entity> = HashSet::from([start.clone()]);
        let mut queue: VecDeque<(Entity, usize)> = VecDeque::from([(start.clone(), 0)]);

        while let Some((entity, depth)) = queue.pop_front() {
            if depth == self.config.max_depth {
                continue;
            }
            let Some(parents) = self.parents.get(&entity) else {
                continue;
            };
            for parent in parents {
                if target == Some(parent) {
                    return (found, true);
                }
                if found.insert(parent.clone()) {
                    let up = Entity::Group(parent.clone());
                    if visited.insert(up.clone()) {
                        queue.push_back((up, depth + 1));
                    }
                }
            }
        }

        (found, false)
    }

    /// Depth-capped downward walk collecting every reachable child entity.
    fn walk_down(&self, start: &Group) -> HashSet<Entity> {
        let mut found = HashSet::new();
        let mut visited: HashSet<Group> = HashSet::from([start.clone()]);
        let mut queue: VecDeque<(Group, usize)> = VecDeque::from([(start.clone(), 0)]);

        while let Some((group, depth)) = queue.pop_front() {
            if depth == self.config.max_depth {
                continue;
            }
            let Some(children) = self.children.get(&group) else {
                continue;
            };
            for child in children {
                found.insert(child.clone());
                if let Entity::Group(g) = child {
                    if visited.insert(g.clone()) {
                        queue.push_back((g.clone(), depth + 1));
                    }
                }
            }
        }

        found
    }

}

impl Grouping for SlimGrouping {
    fn join(&mut self, child: &Entity, parent: &Group) -> Result<(), GroupingError> {
        if !parent.accepts(child) {
            return Err(GroupingError::IncompatibleKinds {
                child: child.clone(),
                parent: parent.clone(),
            });
        }

        self.parents
            .entry(child.clone())
            .or_default()
            .insert(parent.clone());
        self.children
            .entry(parent.clone())
            .or_default()
            .insert(child.clone());
        Ok(())
    }

    fn leave(&mut self, child: &Entity, parent: &Group) -> Result<(), GroupingError> {
        let removed = self
            .parents
            .get_mut(child)
            .is_some_and(|parents| parents.remove(parent));
        if !removed {
            return Err(GroupingError::EdgeNotFound {
                child: child.clone(),
                parent: parent.clone(),
            });
        }

        // Empty sets are kept: entities stay known until an explicit remove.
        if let Some(children) = self.children.get_mut(parent) {
            children.remove(child);
        }
        Ok(())
    }

    fn is_in(&self, member: &Member, group: &Group) -> bool {
        let (_, reached) = self.walk_up(&Entity::Member(member.clone()), Some(group));
        reached
    }

    fn groups_of(&self, entity: &Entity) -> HashSet<Group> {
        let (groups, _) = self.walk_up(entity, None);
        groups
    }

    fn members_in(&self, group: &Group) -> HashSet<Member> {
        self.walk_down(group)
            .into_iter()
            .filter_map(|entity| match entity {
                Entity::Member(m) => Some(m),
                Entity::Group(_) => None,
            })
            .collect()
    }

    fn immediate_groups_of(&self, entity: &Entity) -> HashSet<Group> {
        self.parents.get(entity).cloned().unwrap_or_default()
    }

    fn immediate_entities_in(&self, group: &Group) -> HashSet<Entity> {
        self.children.get(group).cloned().unwrap_or_default()
    }

    fn all_members(&self) -> HashSet<Member> {
        self.parents
            .keys()
            .filter_map(|entity| entity.as_member().cloned())
            .collect()
    }

    fn all_groups(&self) -> HashSet<Group> {
        let mut groups: HashSet<Group> = self.children.keys().cloned().collect();
        groups.extend(
            self.parents
                .keys()
                .filter_map(|entity| entity.as_group().cloned()),
        );
        groups
    }

    fn remove_member(&mut self, member: &Member) -> Result<(), GroupingError> {
        let entity = Entity::Member(member.clone());
        for parent in self.parents.remove(&entity).unwrap_or_default() {
            if let Some(children) = self.children.get_mut(&parent) {
                children.remove(&entity);
            }
        }
        Ok(())
    }

    fn remove_group(&mut self, group: &Group) -> Result<(), GroupingError> {
        for child in self.children.remove(group).unwrap_or_default() {
            if let Some(parents) = self.parents.get_mut(&child) {
                parents.remove(group);
            }
        }

        let entity = Entity::Group(group.clone());
        for parent in self.parents.remove(&entity).unwrap_or_default() {
            if let Some(children) = self.children.get_mut(&parent) {
                children.remove(&entity);
            }
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
