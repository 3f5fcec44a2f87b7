// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Synchronized permission wrapper.
//!
//! Same shape as the grouping wrapper: one readers-writer lock, owned
//! snapshot returns, and a remote-change application path for the
//! reconciler.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use warden_core::action::Action;
use warden_core::error::{PermissionError, WardenError};
use warden_core::policy::{PermissionChange, PersistMethod};
use warden_core::reconcile::{ApplyOutcome, ChangeApplier};
use warden_core::types::{Object, Subject};

use crate::store::PermissionStore;
use crate::traits::SharedPermission;

// =============================================================================
// SyncedPermission
// =============================================================================

/// Thread-safe wrapper around a permission store.
#[derive(Debug)]
pub struct SyncedPermission<P: PermissionStore> {
    inner: RwLock<P>,
}

impl<P: PermissionStore> SyncedPermission<P> {
    /// Wraps a permission store.
    pub fn new(store: P) -> Self {
        Self {
            inner: RwLock::new(store),
        }
    }

    /// Unions `action` into the tuple's mask.
    pub fn permit(
        &self,
        subject: &Subject,
        object: &Object,
        action: Action,
    ) -> Result<(), PermissionError> {
        self.inner.write().permit(subject, object, action)
    }

    /// Clears `action` out of the tuple's mask.
    pub fn revoke(
        &self,
        subject: &Subject,
        object: &Object,
        action: Action,
    ) -> Result<(), PermissionError> {
        self.inner.write().revoke(subject, object, action)
    }

    /// Replaces the tuple's mask exactly; [`Action::NONE`] removes it.
    pub fn apply(&self, subject: &Subject, object: &Object, mask: Action) {
        self.inner.write().apply(subject, object, mask)
    }

    /// Returns `true` iff the stored mask includes `action`.
    pub fn shall(&self, subject: &Subject, object: &Object, action: Action) -> bool {
        self.inner.read().shall(subject, object, action)
    }

    /// Returns the stored mask for the tuple.
    pub fn permitted_actions(&self, subject: &Subject, object: &Object) -> Action {
        self.inner.read().permitted_actions(subject, object)
    }

    /// Returns every subject holding a mask on the object.
    pub fn permissions_on(&self, object: &Object) -> HashMap<Subject, Action> {
        self.inner.read().permissions_on(object)
    }

    /// Returns every object the subject holds a mask on.
    pub fn permissions_for(&self, subject: &Subject) -> HashMap<Object, Action> {
        self.inner.read().permissions_for(subject)
    }
}

#[async_trait]
impl<P: PermissionStore> SharedPermission for SyncedPermission<P> {
    async fn permit(
        &self,
        subject: &Subject,
        object: &Object,
        action: Action,
    ) -> Result<(), WardenError> {
        Ok(SyncedPermission::permit(self, subject, object, action)?)
    }

    async fn revoke(
        &self,
        subject: &Subject,
        object: &Object,
        action: Action,
    ) -> Result<(), WardenError> {
        Ok(SyncedPermission::revoke(self, subject, object, action)?)
    }

    fn shall(&self, subject: &Subject, object: &Object, action: Action) -> bool {
        SyncedPermission::shall(self, subject, object, action)
    }

    fn permitted_actions(&self, subject: &Subject, object: &Object) -> Action {
        SyncedPermission::permitted_actions(self, subject, object)
    }

    fn permissions_on(&self, object: &Object) -> HashMap<Subject, Action> {
        SyncedPermission::permissions_on(self, object)
    }

    fn permissions_for(&self, subject: &Subject) -> HashMap<Object, Action> {
        SyncedPermission::permissions_for(self, subject)
    }
}

// =============================================================================
// Remote Change Application
// =============================================================================

impl<P: PermissionStore> ChangeApplier<PermissionChange> for SyncedPermission<P> {
    /// Applies a remote permission change without re-persisting it.
    ///
    /// Insert and update both carry the final stored mask and apply as a
    /// replacement; delete clears the tuple. A record whose effect is
    /// already in memory is a no-op.
    fn apply_change(&self, change: PermissionChange) -> Result<ApplyOutcome, WardenError> {
        let subject = &change.policy.subject;
        let object = &change.policy.object;
        let current = self.permitted_actions(subject, object);

        let target = match change.method {
            PersistMethod::Insert | PersistMethod::Update => change.policy.action,
            PersistMethod::Delete => Action::NONE,
        };

        if current == target {
            return Ok(ApplyOutcome::Noop);
        }
        self.apply(subject, object, target);
        Ok(ApplyOutcome::Applied)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryPermission;
    use warden_core::policy::PermissionPolicy;

    fn synced() -> SyncedPermission<MemoryPermission> {
        SyncedPermission::new(MemoryPermission::new())
    }

    fn change(mask: Action, method: PersistMethod) -> PermissionChange {
        PermissionChange {
            policy: PermissionPolicy::new(
                Subject::role("ops"),
                Object::article("report"),
                mask,
            ),
            method,
        }
    }

    #[test]
    fn test_apply_insert_then_echo() {
        let p = synced();
        let c = change(Action::READ_WRITE, PersistMethod::Insert);

        assert_eq!(p.apply_change(c.clone()).unwrap(), ApplyOutcome::Applied);
        assert_eq!(p.apply_change(c).unwrap(), ApplyOutcome::Noop);
        assert_eq!(
            p.permitted_actions(&Subject::role("ops"), &Object::article("report")),
            Action::READ_WRITE
        );
    }

    #[test]
    fn test_apply_update_can_shrink_mask() {
        let p = synced();
        p.apply_change(change(Action::READ_WRITE_EXEC, PersistMethod::Insert))
            .unwrap();
        p.apply_change(change(Action::READ, PersistMethod::Update))
            .unwrap();

        assert_eq!(
            p.permitted_actions(&Subject::role("ops"), &Object::article("report")),
            Action::READ
        );
    }

    #[test]
    fn test_apply_delete() {
        let p = synced();
        p.apply_change(change(Action::READ, PersistMethod::Insert))
            .unwrap();
        assert_eq!(
            p.apply_change(change(Action::READ, PersistMethod::Delete))
                .unwrap(),
            ApplyOutcome::Applied
        );
        // Redelivered delete is a no-op.
        assert_eq!(
            p.apply_change(change(Action::READ, PersistMethod::Delete))
                .unwrap(),
            ApplyOutcome::Noop
        );
        assert!(p
            .permissions_for(&Subject::role("ops"))
            .is_empty());
    }

    #[test]
    fn test_snapshot_isolation() {
        let p = synced();
        p.permit(
            &Subject::user("alice"),
            &Object::article("report"),
            Action::READ,
        )
        .unwrap();

        let snapshot = p.permissions_for(&Subject::user("alice"));
        p.revoke(
            &Subject::user("alice"),
            &Object::article("report"),
            Action::READ,
        )
        .unwrap();

        assert_eq!(snapshot.len(), 1);
        assert!(p.permissions_for(&Subject::user("alice")).is_empty());
    }
}
