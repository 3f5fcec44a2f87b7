// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Authorizer facade.
//!
//! Composes the configured groupings and the permission engine into one
//! administration and decision surface. The decider variant follows from
//! what is configured:
//!
//! | subject grouping | object grouping | decider |
//! |---|---|---|
//! | none | none | the permission engine directly |
//! | present | none | subject-grouped |
//! | none | present | object-grouped |
//! | present | present | both-grouped |
//!
//! Grouping-dependent administration calls on an authorizer built without
//! that grouping fail with a not-configured error.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use warden_core::action::Action;
use warden_core::error::{GroupingError, WardenError};
use warden_core::types::{Group, Member, Object, Subject};
use warden_grouping::SharedGrouping;
use warden_permission::SharedPermission;

use crate::both::BothGroupedPermission;
use crate::object::ObjectGroupedPermission;
use crate::subject::SubjectGroupedPermission;

// =============================================================================
// Authorizer
// =============================================================================

/// The authorization engine facade.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use warden_authz::Authorizer;
/// use warden_core::action::Action;
/// use warden_core::types::{Group, Object, Subject};
/// use warden_grouping::{SlimGrouping, SyncedGrouping};
/// use warden_permission::{MemoryPermission, SyncedPermission};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let authz = Authorizer::new(
///     Some(Arc::new(SyncedGrouping::new(SlimGrouping::with_defaults()))),
///     None,
///     Arc::new(SyncedPermission::new(MemoryPermission::new())),
/// );
///
/// authz.join_subject(&Subject::user("alice"), &Group::role("ops")).await?;
/// authz.permit(&Subject::role("ops"), &Object::article("report"), Action::READ).await?;
/// assert!(authz.shall(&Subject::user("alice"), &Object::article("report"), Action::READ));
/// # Ok::<(), warden_core::error::WardenError>(())
/// # }).unwrap();
/// ```
pub struct Authorizer {
    subject_grouping: Option<Arc<dyn SharedGrouping>>,
    object_grouping: Option<Arc<dyn SharedGrouping>>,
    decider: Arc<dyn SharedPermission>,
}

impl Authorizer {
    /// Builds an authorizer from the available inputs, selecting the
    /// decider variant per the table in the module docs.
    pub fn new(
        subject_grouping: Option<Arc<dyn SharedGrouping>>,
        object_grouping: Option<Arc<dyn SharedGrouping>>,
        permission: Arc<dyn SharedPermission>,
    ) -> Self {
        let decider: Arc<dyn SharedPermission> = match (&subject_grouping, &object_grouping) {
            (None, None) => permission,
            (Some(subjects), None) => Arc::new(SubjectGroupedPermission::new(
                Arc::clone(subjects),
                permission,
            )),
            (None, Some(objects)) => Arc::new(ObjectGroupedPermission::new(
                Arc::clone(objects),
                permission,
            )),
            (Some(subjects), Some(objects)) => Arc::new(BothGroupedPermission::new(
                Arc::clone(subjects),
                Arc::clone(objects),
                permission,
            )),
        };

        Self {
            subject_grouping,
            object_grouping,
            decider,
        }
    }

    fn subjects(&self) -> Result<&Arc<dyn SharedGrouping>, WardenError> {
        self.subject_grouping
            .as_ref()
            .ok_or_else(|| GroupingError::NotConfigured { dimension: "subject" }.into())
    }

    fn objects(&self) -> Result<&Arc<dyn SharedGrouping>, WardenError> {
        self.object_grouping
            .as_ref()
            .ok_or_else(|| GroupingError::NotConfigured { dimension: "object" }.into())
    }

    // =========================================================================
    // Subject administration
    // =========================================================================

    /// Joins a subject (user or role) to a role.
    pub async fn join_subject(&self, child: &Subject, role: &Group) -> Result<(), WardenError> {
        self.subjects()?.join(&child.to_entity(), role).await
    }

    /// Removes a subject from a role.
    pub async fn leave_subject(&self, child: &Subject, role: &Group) -> Result<(), WardenError> {
        self.subjects()?.leave(&child.to_entity(), role).await
    }

    /// Removes a user and every grouping edge referencing it.
    pub async fn remove_user(&self, name: &str) -> Result<(), WardenError> {
        self.subjects()?.remove_member(&Member::user(name)).await
    }

    /// Removes a role, cascading over its grouping edges.
    pub async fn remove_role(&self, name: &str) -> Result<(), WardenError> {
        self.subjects()?.remove_group(&Group::role(name)).await
    }

    // =========================================================================
    // Object administration
    // =========================================================================

    /// Joins an object (article or category) to a category.
    pub async fn join_object(&self, child: &Object, category: &Group) -> Result<(), WardenError> {
        self.objects()?.join(&child.to_entity(), category).await
    }

    /// Removes an object from a category.
    pub async fn leave_object(&self, child: &Object, category: &Group) -> Result<(), WardenError> {
        self.objects()?.leave(&child.to_entity(), category).await
    }

    /// Removes an article and every grouping edge referencing it.
    pub async fn remove_article(&self, name: &str) -> Result<(), WardenError> {
        self.objects()?.remove_member(&Member::article(name)).await
    }

    /// Removes a category, cascading over its grouping edges.
    pub async fn remove_category(&self, name: &str) -> Result<(), WardenError> {
        self.objects()?.remove_group(&Group::category(name)).await
    }

    // =========================================================================
    // Permissions
    // =========================================================================

    /// Grants `action` on `object` to `subject`.
    pub async fn permit(
        &self,
        subject: &Subject,
        object: &Object,
        action: Action,
    ) -> Result<(), WardenError> {
        self.decider.permit(subject, object, action).await
    }

    /// Revokes `action` on `object` from `subject`.
    pub async fn revoke(
        &self,
        subject: &Subject,
        object: &Object,
        action: Action,
    ) -> Result<(), WardenError> {
        self.decider.revoke(subject, object, action).await
    }

    /// May `subject` perform `action` on `object`?
    pub fn shall(&self, subject: &Subject, object: &Object, action: Action) -> bool {
        self.decider.shall(subject, object, action)
    }

    /// Returns the effective mask for the pair.
    pub fn permitted_actions(&self, subject: &Subject, object: &Object) -> Action {
        self.decider.permitted_actions(subject, object)
    }

    /// Returns every subject with an effective mask on the object.
    pub fn permissions_on(&self, object: &Object) -> HashMap<Subject, Action> {
        self.decider.permissions_on(object)
    }

    /// Returns every object the subject holds an effective mask on.
    pub fn permissions_for(&self, subject: &Subject) -> HashMap<Object, Action> {
        self.decider.permissions_for(subject)
    }

    /// Returns every subject able to perform `action` on `object`.
    pub fn subjects_permitted(&self, object: &Object, action: Action) -> HashSet<Subject> {
        self.decider
            .permissions_on(object)
            .into_iter()
            .filter_map(|(subject, mask)| mask.includes(action).then_some(subject))
            .collect()
    }

    /// Returns every object on which `subject` may perform `action`.
    pub fn objects_permitted(&self, subject: &Subject, action: Action) -> HashSet<Object> {
        self.decider
            .permissions_for(subject)
            .into_iter()
            .filter_map(|(object, mask)| mask.includes(action).then_some(object))
            .collect()
    }
}

impl std::fmt::Debug for Authorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authorizer")
            .field("subject_grouping", &self.subject_grouping.is_some())
            .field("object_grouping", &self.object_grouping.is_some())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
