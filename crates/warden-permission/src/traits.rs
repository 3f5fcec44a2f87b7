// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! The concurrent permission contract.

use std::collections::HashMap;

use async_trait::async_trait;

use warden_core::action::Action;
use warden_core::error::WardenError;
use warden_core::types::{Object, Subject};

// =============================================================================
// SharedPermission Trait
// =============================================================================

/// The permission surface consumed by deciders and facades.
///
/// Implemented by the synchronized and persisted wrappers over a
/// [`PermissionStore`](crate::PermissionStore), and by the group-aware
/// deciders that fold hierarchies into their answers. Mutators are async
/// (they may call into a durable store) and totally ordered per engine;
/// queries are synchronous snapshot reads.
#[async_trait]
pub trait SharedPermission: Send + Sync {
    /// Unions `action` into the tuple's mask.
    async fn permit(
        &self,
        subject: &Subject,
        object: &Object,
        action: Action,
    ) -> Result<(), WardenError>;

    /// Clears `action` out of the tuple's mask; removes the tuple when
    /// the mask reaches zero. Fails with not-found if the tuple is absent.
    ///
    /// Revocation is additive-set-complement on the exact tuple: it never
    /// touches grants held by other subjects or on other objects, even
    /// when those combine into the same effective decision.
    async fn revoke(
        &self,
        subject: &Subject,
        object: &Object,
        action: Action,
    ) -> Result<(), WardenError>;

    /// Returns `true` iff the effective mask includes every action in
    /// `action`.
    fn shall(&self, subject: &Subject, object: &Object, action: Action) -> bool;

    /// Returns the effective mask for the tuple.
    fn permitted_actions(&self, subject: &Subject, object: &Object) -> Action;

    /// Returns every subject with a non-zero effective mask on the object.
    fn permissions_on(&self, object: &Object) -> HashMap<Subject, Action>;

    /// Returns every object the subject holds a non-zero effective mask on.
    fn permissions_for(&self, subject: &Subject) -> HashMap<Object, Action>;
}
