// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Object-grouped permission decider.
//!
//! The mirror image of the subject decider, over the object dimension: a
//! subject may act on an article when the backing engine permits it on
//! the article directly *or* on any category the article transitively
//! belongs to.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use warden_core::action::Action;
use warden_core::error::WardenError;
use warden_core::types::{Group, Member, Object, Subject};
use warden_grouping::SharedGrouping;
use warden_permission::SharedPermission;

// =============================================================================
// ObjectGroupedPermission
// =============================================================================

/// Permission decider aware of the object hierarchy.
pub struct ObjectGroupedPermission {
    grouping: Arc<dyn SharedGrouping>,
    permission: Arc<dyn SharedPermission>,
}

impl ObjectGroupedPermission {
    /// Composes an object grouping with a permission engine.
    pub fn new(grouping: Arc<dyn SharedGrouping>, permission: Arc<dyn SharedPermission>) -> Self {
        Self {
            grouping,
            permission,
        }
    }

    /// The categories the object transitively belongs to, as objects.
    fn categories_of(&self, object: &Object) -> Vec<Object> {
        self.grouping
            .groups_of(&object.to_entity())
            .into_iter()
            .filter_map(|group| match group {
                Group::Category(name) => Some(Object::Category(name)),
                Group::Role(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl SharedPermission for ObjectGroupedPermission {
    async fn permit(
        &self,
        subject: &Subject,
        object: &Object,
        action: Action,
    ) -> Result<(), WardenError> {
        self.permission.permit(subject, object, action).await
    }

    async fn revoke(
        &self,
        subject: &Subject,
        object: &Object,
        action: Action,
    ) -> Result<(), WardenError> {
        self.permission.revoke(subject, object, action).await
    }

    fn shall(&self, subject: &Subject, object: &Object, action: Action) -> bool {
        let mut have = self.permission.permitted_actions(subject, object);
        if have.includes(action) {
            return true;
        }
        for category in self.categories_of(object) {
            have |= self.permission.permitted_actions(subject, &category);
            if have.includes(action) {
                return true;
            }
        }
        false
    }

    fn permitted_actions(&self, subject: &Subject, object: &Object) -> Action {
        let mut have = self.permission.permitted_actions(subject, object);
        for category in self.categories_of(object) {
            have |= self.permission.permitted_actions(subject, &category);
        }
        have
    }

    fn permissions_on(&self, object: &Object) -> HashMap<Subject, Action> {
        let mut out = self.permission.permissions_on(object);
        for category in self.categories_of(object) {
            for (subject, mask) in self.permission.permissions_on(&category) {
                *out.entry(subject).or_insert(Action::NONE) |= mask;
            }
        }
        out
    }

    fn permissions_for(&self, subject: &Subject) -> HashMap<Object, Action> {
        let mut out = self.permission.permissions_for(subject);
        // Union every category's mask into each of its transitive member
        // articles; the category rows themselves stay.
        for (object, mask) in out.clone() {
            if let Object::Category(name) = object {
                for member in self.grouping.members_in(&Group::Category(name)) {
                    if let Member::Article(article) = member {
                        *out.entry(Object::Article(article)).or_insert(Action::NONE) |= mask;
                    }
                }
            }
        }
        out
    }
}

// =============================================================================
// Tests
// =============================================================================
