// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Subject-grouped permission decider.
//!
//! Folds the subject hierarchy into permission queries: a user holds an
//! action when the backing engine permits it for the user directly *or*
//! for any role the user transitively belongs to.
//!
//! Writes pass through untouched: a grant or revocation addressed to a
//! role updates only the role's tuple; effective decisions for its
//! members change because queries recompute the union. Revoking a role's
//! grant therefore reaches every transitive member at once, while peer
//! roles and direct user grants stay intact.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use warden_core::action::Action;
use warden_core::error::WardenError;
use warden_core::types::{Group, Member, Object, Subject};
use warden_grouping::SharedGrouping;
use warden_permission::SharedPermission;

// =============================================================================
// SubjectGroupedPermission
// =============================================================================

/// Permission decider aware of the subject hierarchy.
pub struct SubjectGroupedPermission {
    grouping: Arc<dyn SharedGrouping>,
    permission: Arc<dyn SharedPermission>,
}

impl SubjectGroupedPermission {
    /// Composes a subject grouping with a permission engine.
    pub fn new(grouping: Arc<dyn SharedGrouping>, permission: Arc<dyn SharedPermission>) -> Self {
        Self {
            grouping,
            permission,
        }
    }

    /// The roles the subject transitively belongs to, as subjects.
    fn roles_of(&self, subject: &Subject) -> Vec<Subject> {
        self.grouping
            .groups_of(&subject.to_entity())
            .into_iter()
            .filter_map(|group| match group {
                Group::Role(name) => Some(Subject::Role(name)),
                Group::Category(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl SharedPermission for SubjectGroupedPermission {
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
        for role in self.roles_of(subject) {
            have |= self.permission.permitted_actions(&role, object);
            if have.includes(action) {
                return true;
            }
        }
        false
    }

    fn permitted_actions(&self, subject: &Subject, object: &Object) -> Action {
        let mut have = self.permission.permitted_actions(subject, object);
        for role in self.roles_of(subject) {
            have |= self.permission.permitted_actions(&role, object);
        }
        have
    }

    fn permissions_on(&self, object: &Object) -> HashMap<Subject, Action> {
        let mut out = self.permission.permissions_on(object);
        // Union every role's mask into each of its transitive members;
        // the role rows themselves stay.
        for (subject, mask) in out.clone() {
            if let Subject::Role(name) = subject {
                for member in self.grouping.members_in(&Group::Role(name)) {
                    if let Member::User(user) = member {
                        *out.entry(Subject::User(user)).or_insert(Action::NONE) |= mask;
                    }
                }
            }
        }
        out
    }

    fn permissions_for(&self, subject: &Subject) -> HashMap<Object, Action> {
        let mut out = self.permission.permissions_for(subject);
        for role in self.roles_of(subject) {
            for (object, mask) in self.permission.permissions_for(&role) {
                *out.entry(object).or_insert(Action::NONE) |= mask;
            }
        }
        out
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::types::Entity;
    use warden_grouping::{SlimGrouping, SyncedGrouping};
    use warden_permission::{MemoryPermission, SyncedPermission};

    fn decider() -> (Arc<SyncedGrouping<SlimGrouping>>, SubjectGroupedPermission) {
        let grouping = Arc::new(SyncedGrouping::new(SlimGrouping::with_defaults()));
        let permission = Arc::new(SyncedPermission::new(MemoryPermission::new()));
        let decider = SubjectGroupedPermission::new(grouping.clone(), permission);
        (grouping, decider)
    }

    #[tokio::test]
    async fn test_member_inherits_role_grant() {
        let (grouping, p) = decider();
        grouping
            .join(&Entity::user("5"), &Group::role("2_1"))
            .unwrap();

        p.permit(
            &Subject::role("2_1"),
            &Object::article("project apollo"),
            Action::READ_WRITE_EXEC,
        )
        .await
        .unwrap();

        assert!(p.shall(
            &Subject::user("5"),
            &Object::article("project apollo"),
            Action::EXEC
        ));
        assert!(!p.shall(
            &Subject::user("6"),
            &Object::article("project apollo"),
            Action::EXEC
        ));
    }

    #[tokio::test]
    async fn test_role_revocation_reaches_members() {
        let (grouping, p) = decider();
        grouping
            .join(&Entity::user("5"), &Group::role("2_1"))
            .unwrap();
        let sub = Subject::role("2_1");
        let obj = Object::article("project apollo");

        p.permit(&sub, &obj, Action::READ_WRITE_EXEC).await.unwrap();
        p.revoke(&sub, &obj, Action::EXEC).await.unwrap();

        let user = Subject::user("5");
        assert!(!p.shall(&user, &obj, Action::EXEC));
        assert!(p.shall(&user, &obj, Action::WRITE));
    }

    #[tokio::test]
    async fn test_direct_grant_survives_role_revocation() {
        let (grouping, p) = decider();
        grouping
            .join(&Entity::user("5"), &Group::role("ops"))
            .unwrap();
        let obj = Object::article("report");

        p.permit(&Subject::user("5"), &obj, Action::EXEC).await.unwrap();
        p.permit(&Subject::role("ops"), &obj, Action::EXEC)
            .await
            .unwrap();
        p.revoke(&Subject::role("ops"), &obj, Action::EXEC)
            .await
            .unwrap();

        assert!(p.shall(&Subject::user("5"), &obj, Action::EXEC));
    }

    #[tokio::test]
    async fn test_permissions_on_expands_members() {
        let (grouping, p) = decider();
        grouping
            .join(&Entity::user("1"), &Group::role("ops"))
            .unwrap();
        grouping
            .join(&Entity::user("2"), &Group::role("ops"))
            .unwrap();
        let obj = Object::article("report");

        p.permit(&Subject::role("ops"), &obj, Action::READ)
            .await
            .unwrap();
        p.permit(&Subject::user("1"), &obj, Action::WRITE)
            .await
            .unwrap();

        let on = p.permissions_on(&obj);
        assert_eq!(on.get(&Subject::role("ops")), Some(&Action::READ));
        assert_eq!(on.get(&Subject::user("1")), Some(&Action::READ_WRITE));
        assert_eq!(on.get(&Subject::user("2")), Some(&Action::READ));
    }

    #[tokio::test]
    async fn test_permissions_for_unions_role_grants() {
        let (grouping, p) = decider();
        grouping
            .join(&Entity::user("1"), &Group::role("ops"))
            .unwrap();
        let report = Object::article("report");
        let logs = Object::article("logs");

        p.permit(&Subject::user("1"), &report, Action::WRITE)
            .await
            .unwrap();
        p.permit(&Subject::role("ops"), &report, Action::READ)
            .await
            .unwrap();
        p.permit(&Subject::role("ops"), &logs, Action::READ)
            .await
            .unwrap();

        let for_user = p.permissions_for(&Subject::user("1"));
        assert_eq!(for_user.get(&report), Some(&Action::READ_WRITE));
        assert_eq!(for_user.get(&logs), Some(&Action::READ));
    }

    #[tokio::test]
    async fn test_nested_roles() {
        let (grouping, p) = decider();
        grouping
            .join(&Entity::user("1"), &Group::role("ops"))
            .unwrap();
        grouping
            .join(&Entity::role("ops"), &Group::role("staff"))
            .unwrap();
        let obj = Object::article("handbook");

        p.permit(&Subject::role("staff"), &obj, Action::READ)
            .await
            .unwrap();

        assert!(p.shall(&Subject::user("1"), &obj, Action::READ));
        assert!(p.shall(&Subject::role("ops"), &obj, Action::READ));
    }
}
