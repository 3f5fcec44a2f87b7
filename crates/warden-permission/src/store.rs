// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Permission store contract and the in-memory implementation.
//!
//! A permission store maps `(subject, object)` to an action mask. Grants
//! union into the mask, revocations clear bits out of it, and a tuple
//! whose mask reaches zero is removed: the store never holds an empty
//! mask.

use std::collections::HashMap;
use std::fmt::Debug;

use warden_core::action::Action;
use warden_core::error::PermissionError;
use warden_core::types::{Object, Subject};

// =============================================================================
// PermissionStore Trait
// =============================================================================

/// The store contract for direct permission tuples.
///
/// Implementations are plain data structures; locking and persistence
/// live in the wrappers.
pub trait PermissionStore: Send + Sync + Debug {
    /// Unions `action` into the tuple's mask, creating it if absent.
    ///
    /// Granting [`Action::NONE`] is a no-op.
    fn permit(&mut self, subject: &Subject, object: &Object, action: Action)
        -> Result<(), PermissionError>;

    /// Clears `action` out of the tuple's mask; removes the tuple when
    /// the mask reaches zero.
    ///
    /// # Errors
    ///
    /// [`PermissionError::PolicyNotFound`] if no mask is stored for the
    /// tuple.
    fn revoke(&mut self, subject: &Subject, object: &Object, action: Action)
        -> Result<(), PermissionError>;

    /// Replaces the tuple's mask with `mask` exactly; [`Action::NONE`]
    /// removes the tuple.
    ///
    /// This is the remote-change path: persisters deliver final masks,
    /// not deltas.
    fn apply(&mut self, subject: &Subject, object: &Object, mask: Action);

    /// Returns `true` iff the stored mask includes every action in `action`.
    fn shall(&self, subject: &Subject, object: &Object, action: Action) -> bool;

    /// Returns the stored mask, or [`Action::NONE`] if the tuple is absent.
    fn permitted_actions(&self, subject: &Subject, object: &Object) -> Action;

    /// Returns every subject holding a non-zero mask on the object.
    fn permissions_on(&self, object: &Object) -> HashMap<Subject, Action>;

    /// Returns every object the subject holds a non-zero mask on.
    fn permissions_for(&self, subject: &Subject) -> HashMap<Object, Action>;
}

// =============================================================================
// MemoryPermission
// =============================================================================

/// In-memory permission store.
///
/// # Examples
///
/// ```
/// use warden_core::action::Action;
/// use warden_core::types::{Object, Subject};
/// use warden_permission::{MemoryPermission, PermissionStore};
///
/// let mut p = MemoryPermission::new();
/// let admin = Subject::role("admin");
/// let report = Object::article("report");
///
/// p.permit(&admin, &report, Action::READ_WRITE).unwrap();
/// assert!(p.shall(&admin, &report, Action::READ));
///
/// p.revoke(&admin, &report, Action::WRITE).unwrap();
/// assert_eq!(p.permitted_actions(&admin, &report), Action::READ);
/// ```
#[derive(Debug, Default)]
pub struct MemoryPermission {
    /// subject -> object -> permitted mask (never zero)
    policies: HashMap<Subject, HashMap<Object, Action>>,
}

impl MemoryPermission {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PermissionStore for MemoryPermission {
    fn permit(
        &mut self,
        subject: &Subject,
        object: &Object,
        action: Action,
    ) -> Result<(), PermissionError> {
        if action.is_none() {
            return Ok(());
        }
        let mask = self
            .policies
            .entry(subject.clone())
            .or_default()
            .entry(object.clone())
            .or_insert(Action::NONE);
        *mask |= action;
        Ok(())
    }

    fn revoke(
        &mut self,
        subject: &Subject,
        object: &Object,
        action: Action,
    ) -> Result<(), PermissionError> {
        let not_found = || PermissionError::PolicyNotFound {
            subject: subject.clone(),
            object: object.clone(),
        };

        let objects = self.policies.get_mut(subject).ok_or_else(not_found)?;
        let mask = objects.get_mut(object).ok_or_else(not_found)?;

        *mask = mask.difference(action);
        if mask.is_none() {
            objects.remove(object);
            if objects.is_empty() {
                self.policies.remove(subject);
            }
        }
        Ok(())
    }

    fn apply(&mut self, subject: &Subject, object: &Object, mask: Action) {
        if mask.is_none() {
            if let Some(objects) = self.policies.get_mut(subject) {
                objects.remove(object);
                if objects.is_empty() {
                    self.policies.remove(subject);
                }
            }
            return;
        }
        self.policies
            .entry(subject.clone())
            .or_default()
            .insert(object.clone(), mask);
    }

    fn shall(&self, subject: &Subject, object: &Object, action: Action) -> bool {
        self.permitted_actions(subject, object).includes(action)
    }

    fn permitted_actions(&self, subject: &Subject, object: &Object) -> Action {
        self.policies
            .get(subject)
            .and_then(|objects| objects.get(object))
            .copied()
            .unwrap_or(Action::NONE)
    }

    fn permissions_on(&self, object: &Object) -> HashMap<Subject, Action> {
        self.policies
            .iter()
            .filter_map(|(subject, objects)| {
                objects
                    .get(object)
                    .map(|mask| (subject.clone(), *mask))
            })
            .collect()
    }

    fn permissions_for(&self, subject: &Subject) -> HashMap<Object, Action> {
        self.policies.get(subject).cloned().unwrap_or_default()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryPermission {
        MemoryPermission::new()
    }

    #[test]
    fn test_permit_unions_masks() {
        let mut p = store();
        let sub = Subject::user("alice");
        let obj = Object::article("report");

        p.permit(&sub, &obj, Action::READ).unwrap();
        p.permit(&sub, &obj, Action::WRITE).unwrap();

        assert_eq!(p.permitted_actions(&sub, &obj), Action::READ_WRITE);
        assert!(p.shall(&sub, &obj, Action::READ));
        assert!(p.shall(&sub, &obj, Action::READ_WRITE));
        assert!(!p.shall(&sub, &obj, Action::EXEC));
    }

    #[test]
    fn test_permit_none_stores_nothing() {
        let mut p = store();
        let sub = Subject::user("alice");
        let obj = Object::article("report");

        p.permit(&sub, &obj, Action::NONE).unwrap();
        assert!(p.permissions_for(&sub).is_empty());
    }

    #[test]
    fn test_revoke_clears_bits() {
        let mut p = store();
        let sub = Subject::user("alice");
        let obj = Object::article("report");

        p.permit(&sub, &obj, Action::READ_WRITE_EXEC).unwrap();
        p.revoke(&sub, &obj, Action::WRITE).unwrap();

        assert_eq!(
            p.permitted_actions(&sub, &obj),
            Action::READ_WRITE_EXEC.difference(Action::WRITE)
        );
        assert!(p.shall(&sub, &obj, Action::READ));
        assert!(!p.shall(&sub, &obj, Action::WRITE));
    }

    #[test]
    fn test_revoke_to_zero_removes_tuple() {
        let mut p = store();
        let sub = Subject::user("alice");
        let obj = Object::article("report");

        p.permit(&sub, &obj, Action::READ).unwrap();
        p.revoke(&sub, &obj, Action::READ_WRITE).unwrap();

        assert_eq!(p.permitted_actions(&sub, &obj), Action::NONE);
        assert!(p.permissions_for(&sub).is_empty());
        assert!(p.permissions_on(&obj).is_empty());

        // The tuple is gone, so a further revoke is not-found.
        assert!(matches!(
            p.revoke(&sub, &obj, Action::READ),
            Err(PermissionError::PolicyNotFound { .. })
        ));
    }

    #[test]
    fn test_revoke_absent_tuple_fails() {
        let mut p = store();
        assert!(matches!(
            p.revoke(
                &Subject::user("nobody"),
                &Object::article("report"),
                Action::READ
            ),
            Err(PermissionError::PolicyNotFound { .. })
        ));
    }

    #[test]
    fn test_apply_replaces_mask() {
        let mut p = store();
        let sub = Subject::role("ops");
        let obj = Object::category("logs");

        p.apply(&sub, &obj, Action::READ_WRITE);
        assert_eq!(p.permitted_actions(&sub, &obj), Action::READ_WRITE);

        // Replacement, not union: the mask can shrink.
        p.apply(&sub, &obj, Action::READ);
        assert_eq!(p.permitted_actions(&sub, &obj), Action::READ);

        p.apply(&sub, &obj, Action::NONE);
        assert!(p.permissions_for(&sub).is_empty());
    }

    #[test]
    fn test_inverse_queries() {
        let mut p = store();
        let alice = Subject::user("alice");
        let ops = Subject::role("ops");
        let report = Object::article("report");
        let logs = Object::article("logs");

        p.permit(&alice, &report, Action::READ).unwrap();
        p.permit(&alice, &logs, Action::READ_WRITE).unwrap();
        p.permit(&ops, &report, Action::READ_WRITE_EXEC).unwrap();

        assert_eq!(
            p.permissions_on(&report),
            HashMap::from([
                (alice.clone(), Action::READ),
                (ops.clone(), Action::READ_WRITE_EXEC)
            ])
        );
        assert_eq!(
            p.permissions_for(&alice),
            HashMap::from([
                (report.clone(), Action::READ),
                (logs.clone(), Action::READ_WRITE)
            ])
        );
    }

    #[test]
    fn test_shall_with_none_action() {
        let p = store();
        // Every mask includes the empty mask, even an absent one.
        assert!(p.shall(
            &Subject::user("alice"),
            &Object::article("report"),
            Action::NONE
        ));
    }
}
