// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Both-grouped permission decider.
//!
//! Composes the subject and object hierarchies: a user may act on an
//! article when some tuple `(s, o)` with `s ∈ {user} ∪ roles(user)` and
//! `o ∈ {article} ∪ categories(article)` carries a covering mask.
//! Inverse queries enumerate the same pairs and union masks.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use warden_core::action::Action;
use warden_core::error::WardenError;
use warden_core::types::{Group, Member, Object, Subject};
use warden_grouping::SharedGrouping;
use warden_permission::SharedPermission;

// =============================================================================
// BothGroupedPermission
// =============================================================================

/// Permission decider aware of both hierarchies.
pub struct BothGroupedPermission {
    subjects: Arc<dyn SharedGrouping>,
    objects: Arc<dyn SharedGrouping>,
    permission: Arc<dyn SharedPermission>,
}

impl BothGroupedPermission {
    /// Composes both groupings with a permission engine.
    pub fn new(
        subjects: Arc<dyn SharedGrouping>,
        objects: Arc<dyn SharedGrouping>,
        permission: Arc<dyn SharedPermission>,
    ) -> Self {
        Self {
            subjects,
            objects,
            permission,
        }
    }

    /// The subject and every role it transitively belongs to.
    fn subject_closure(&self, subject: &Subject) -> Vec<Subject> {
        let mut out = vec![subject.clone()];
        out.extend(
            self.subjects
                .groups_of(&subject.to_entity())
                .into_iter()
                .filter_map(|group| match group {
                    Group::Role(name) => Some(Subject::Role(name)),
                    Group::Category(_) => None,
                }),
        );
        out
    }

    /// The object and every category it transitively belongs to.
    fn object_closure(&self, object: &Object) -> Vec<Object> {
        let mut out = vec![object.clone()];
        out.extend(
            self.objects
                .groups_of(&object.to_entity())
                .into_iter()
                .filter_map(|group| match group {
                    Group::Category(name) => Some(Object::Category(name)),
                    Group::Role(_) => None,
                }),
        );
        out
    }
}

#[async_trait]
impl SharedPermission for BothGroupedPermission {
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
        let objects = self.object_closure(object);
        let mut have = Action::NONE;
        for sub in self.subject_closure(subject) {
            for obj in &objects {
                have |= self.permission.permitted_actions(&sub, obj);
                if have.includes(action) {
                    return true;
                }
            }
        }
        false
    }

    fn permitted_actions(&self, subject: &Subject, object: &Object) -> Action {
        let objects = self.object_closure(object);
        let mut have = Action::NONE;
        for sub in self.subject_closure(subject) {
            for obj in &objects {
                have |= self.permission.permitted_actions(&sub, obj);
            }
        }
        have
    }

    fn permissions_on(&self, object: &Object) -> HashMap<Subject, Action> {
        // Masks granted on the object or any of its categories...
        let mut out: HashMap<Subject, Action> = HashMap::new();
        for obj in self.object_closure(object) {
            for (subject, mask) in self.permission.permissions_on(&obj) {
                *out.entry(subject).or_insert(Action::NONE) |= mask;
            }
        }
        // ...expanded from role subjects into their transitive members.
        for (subject, mask) in out.clone() {
            if let Subject::Role(name) = subject {
                for member in self.subjects.members_in(&Group::Role(name)) {
                    if let Member::User(user) = member {
                        *out.entry(Subject::User(user)).or_insert(Action::NONE) |= mask;
                    }
                }
            }
        }
        out
    }

    fn permissions_for(&self, subject: &Subject) -> HashMap<Object, Action> {
        let mut out: HashMap<Object, Action> = HashMap::new();
        for sub in self.subject_closure(subject) {
            for (object, mask) in self.permission.permissions_for(&sub) {
                *out.entry(object).or_insert(Action::NONE) |= mask;
            }
        }
        for (object, mask) in out.clone() {
            if let Object::Category(name) = object {
                for member in self.objects.members_in(&Group::Category(name)) {
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

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::types::Entity;
    use warden_grouping::{SlimGrouping, SyncedGrouping};
    use warden_permission::{MemoryPermission, SyncedPermission};

    fn decider() -> (
        Arc<SyncedGrouping<SlimGrouping>>,
        Arc<SyncedGrouping<SlimGrouping>>,
        BothGroupedPermission,
    ) {
        let subjects = Arc::new(SyncedGrouping::new(SlimGrouping::with_defaults()));
        let objects = Arc::new(SyncedGrouping::new(SlimGrouping::with_defaults()));
        let permission = Arc::new(SyncedPermission::new(MemoryPermission::new()));
        let decider = BothGroupedPermission::new(subjects.clone(), objects.clone(), permission);
        (subjects, objects, decider)
    }

    #[tokio::test]
    async fn test_role_to_category_grant() {
        let (subjects, objects, p) = decider();
        subjects
            .join(&Entity::user("0"), &Group::role("3_0"))
            .unwrap();
        objects
            .join(&Entity::article("operation overlord"), &Group::category("war"))
            .unwrap();

        p.permit(
            &Subject::role("3_0"),
            &Object::category("war"),
            Action::READ,
        )
        .await
        .unwrap();

        assert!(p.shall(
            &Subject::user("0"),
            &Object::article("operation overlord"),
            Action::READ
        ));
        assert!(!p.shall(
            &Subject::user("1"),
            &Object::article("operation overlord"),
            Action::READ
        ));
    }

    #[tokio::test]
    async fn test_all_four_grant_shapes_decide() {
        let (subjects, objects, p) = decider();
        subjects
            .join(&Entity::user("u"), &Group::role("r"))
            .unwrap();
        objects
            .join(&Entity::article("a"), &Group::category("c"))
            .unwrap();
        let user = Subject::user("u");
        let article = Object::article("a");

        // user -> article
        p.permit(&user, &article, Action::EXEC).await.unwrap();
        // user -> category
        p.permit(&user, &Object::category("c"), Action::READ)
            .await
            .unwrap();
        // role -> article
        p.permit(&Subject::role("r"), &article, Action::WRITE)
            .await
            .unwrap();

        assert!(p.shall(&user, &article, Action::EXEC));
        assert!(p.shall(&user, &article, Action::READ));
        assert!(p.shall(&user, &article, Action::WRITE));
        assert_eq!(
            p.permitted_actions(&user, &article),
            Action::READ_WRITE_EXEC
        );
    }

    #[tokio::test]
    async fn test_revoking_one_grant_leaves_peers() {
        let (subjects, objects, p) = decider();
        subjects
            .join(&Entity::user("u"), &Group::role("r"))
            .unwrap();
        objects
            .join(&Entity::article("a"), &Group::category("c"))
            .unwrap();
        let user = Subject::user("u");
        let article = Object::article("a");

        p.permit(&Subject::role("r"), &Object::category("c"), Action::READ)
            .await
            .unwrap();
        p.permit(&user, &article, Action::READ).await.unwrap();

        // Cancelling the role->category grant does not revoke the direct one.
        p.revoke(&Subject::role("r"), &Object::category("c"), Action::READ)
            .await
            .unwrap();
        assert!(p.shall(&user, &article, Action::READ));

        p.revoke(&user, &article, Action::READ).await.unwrap();
        assert!(!p.shall(&user, &article, Action::READ));
    }

    #[tokio::test]
    async fn test_inverse_queries_enumerate_pairs() {
        let (subjects, objects, p) = decider();
        subjects
            .join(&Entity::user("u"), &Group::role("r"))
            .unwrap();
        objects
            .join(&Entity::article("a"), &Group::category("c"))
            .unwrap();

        p.permit(&Subject::role("r"), &Object::category("c"), Action::READ)
            .await
            .unwrap();

        let on = p.permissions_on(&Object::article("a"));
        assert_eq!(on.get(&Subject::role("r")), Some(&Action::READ));
        assert_eq!(on.get(&Subject::user("u")), Some(&Action::READ));

        let for_user = p.permissions_for(&Subject::user("u"));
        assert_eq!(for_user.get(&Object::category("c")), Some(&Action::READ));
        assert_eq!(for_user.get(&Object::article("a")), Some(&Action::READ));
    }
}
