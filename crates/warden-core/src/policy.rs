// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Persisted policies and change records.
//!
//! Two policy shapes exist: a grouping edge (`child` joins `parent`) and
//! a permission tuple (`subject` may perform `action` on `object`). A
//! change record is a policy plus the [`PersistMethod`] the store applied.
//!
//! On the wire, identifiers are `"kind:name"` strings and action masks
//! are raw integers:
//!
//! ```json
//! {"child":"user:alice","parent":"role:admin","method":"insert"}
//! {"subject":"role:admin","object":"category:war","action":6,"method":"update"}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::types::{Entity, Group, Object, Subject};

// =============================================================================
// Policies
// =============================================================================

/// A grouping edge: `child` is a direct member of `parent`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupingPolicy {
    /// The child side of the edge; any entity.
    pub child: Entity,
    /// The parent side of the edge; always a group.
    pub parent: Group,
}

impl GroupingPolicy {
    /// Creates a grouping policy.
    pub fn new(child: impl Into<Entity>, parent: Group) -> Self {
        Self {
            child: child.into(),
            parent,
        }
    }
}

impl fmt::Display for GroupingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.child, self.parent)
    }
}

/// A permission tuple: `subject` may perform `action` on `object`.
///
/// At most one tuple exists per `(subject, object)` pair; the mask is the
/// union of every grant that has not been revoked. A zero mask is never
/// stored; the tuple is removed instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionPolicy {
    /// The acting side.
    pub subject: Subject,
    /// The acted-upon side.
    pub object: Object,
    /// The permitted action mask.
    pub action: Action,
}

impl PermissionPolicy {
    /// Creates a permission policy.
    pub fn new(subject: Subject, object: Object, action: Action) -> Self {
        Self {
            subject,
            object,
            action,
        }
    }
}

impl fmt::Display for PermissionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} may {} on {}", self.subject, self.action, self.object)
    }
}

// =============================================================================
// Change Records
// =============================================================================

/// How a persisted policy changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistMethod {
    /// The policy was created.
    Insert,
    /// The policy was replaced (permission masks only).
    Update,
    /// The policy was removed.
    Delete,
}

impl PersistMethod {
    /// Returns the method as its wire-format string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PersistMethod::Insert => "insert",
            PersistMethod::Update => "update",
            PersistMethod::Delete => "delete",
        }
    }
}

impl fmt::Display for PersistMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A change to a grouping edge, delivered over a persister's change
/// channel. Delivery is at-least-once and ordered; application must be
/// idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupingChange {
    /// The affected edge.
    #[serde(flatten)]
    pub policy: GroupingPolicy,
    /// What happened to it.
    pub method: PersistMethod,
}

/// A change to a permission tuple, delivered over a persister's change
/// channel. The embedded mask is the final stored value, not a delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionChange {
    /// The affected tuple, with its post-change mask.
    #[serde(flatten)]
    pub policy: PermissionPolicy,
    /// What happened to it.
    pub method: PersistMethod,
}

// =============================================================================
// Tests
// =============================================================================
