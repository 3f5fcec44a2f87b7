// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Unified error hierarchy for Warden.
//!
//! Errors are grouped by concern and folded into a root [`WardenError`]:
//!
//! ```text
//! WardenError (root)
//! ├── ParseError      - malformed subject/object/entity identifiers
//! ├── GroupingError   - grouping mutations (missing edges, bad kinds)
//! ├── PermissionError - permission mutations (missing tuples)
//! └── PersistError    - durable store and change-channel failures
//! ```
//!
//! Every error carries a stable `error_type()` label for logging and
//! metrics. No operation panics on user input; depth-capped traversals
//! truncate silently rather than erroring.

use thiserror::Error;

use crate::policy::PersistMethod;
use crate::types::{Entity, Group, Object, Subject};

// =============================================================================
// WardenError - Root Error Type
// =============================================================================

/// The root error type for Warden.
///
/// All errors in the engine convert into this type, giving callers a
/// single surface to match on.
#[derive(Debug, Error)]
pub enum WardenError {
    /// Identifier parsing error.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Grouping engine error.
    #[error("grouping error: {0}")]
    Grouping(#[from] GroupingError),

    /// Permission engine error.
    #[error("permission error: {0}")]
    Permission(#[from] PermissionError),

    /// Durable store error.
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

impl WardenError {
    /// Returns the error type as a stable string for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            WardenError::Parse(e) => e.error_type(),
            WardenError::Grouping(e) => e.error_type(),
            WardenError::Permission(e) => e.error_type(),
            WardenError::Persist(e) => e.error_type(),
        }
    }

    /// Returns `true` if this error means the target was absent.
    ///
    /// Remote change records frequently echo mutations the engine has
    /// already applied locally; reconcilers treat not-found as a no-op.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            WardenError::Grouping(GroupingError::EdgeNotFound { .. })
                | WardenError::Permission(PermissionError::PolicyNotFound { .. })
        )
    }
}

// =============================================================================
// ParseError
// =============================================================================

/// Identifier parsing errors.
///
/// Identifiers use the form `"kind:name"`; parsers reject unknown kinds,
/// empty names, and names containing tabs or line breaks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The input is not a valid subject (`user:` or `role:`).
    #[error("invalid subject: '{0}'")]
    InvalidSubject(String),

    /// The input is not a valid object (`article:` or `category:`).
    #[error("invalid object: '{0}'")]
    InvalidObject(String),

    /// The input is not a valid entity of any kind.
    #[error("invalid entity: '{0}'")]
    InvalidEntity(String),

    /// The identifier has an empty name part.
    #[error("empty name in identifier: '{0}'")]
    EmptyName(String),

    /// The identifier uses a kind outside the registered vocabulary.
    #[error("unknown kind '{kind}' in identifier '{input}'")]
    UnknownKind {
        /// The unrecognized kind label.
        kind: String,
        /// The full input string.
        input: String,
    },
}

impl ParseError {
    /// Returns the error type as a stable string for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            ParseError::InvalidSubject(_) => "invalid_subject",
            ParseError::InvalidObject(_) => "invalid_object",
            ParseError::InvalidEntity(_) => "invalid_entity",
            ParseError::EmptyName(_) => "empty_name",
            ParseError::UnknownKind { .. } => "unknown_kind",
        }
    }
}

// =============================================================================
// GroupingError
// =============================================================================

/// Grouping engine errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GroupingError {
    /// `leave` targeted an edge that does not exist.
    #[error("grouping rule not found: {child} -> {parent}")]
    EdgeNotFound {
        /// The child side of the missing edge.
        child: Entity,
        /// The parent side of the missing edge.
        parent: Group,
    },

    /// `join` paired a child and parent of incompatible kinds.
    ///
    /// Users and roles join roles; articles and categories join
    /// categories. Nothing crosses dimensions and nothing joins a member.
    #[error("incompatible kinds: {child} may not join {parent}")]
    IncompatibleKinds {
        /// The rejected child.
        child: Entity,
        /// The rejected parent.
        parent: Group,
    },

    /// A grouping-dependent call reached an authorizer built without that
    /// grouping dimension.
    #[error("no {dimension} grouping configured")]
    NotConfigured {
        /// `"subject"` or `"object"`.
        dimension: &'static str,
    },
}

impl GroupingError {
    /// Returns the error type as a stable string for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            GroupingError::EdgeNotFound { .. } => "not_found",
            GroupingError::IncompatibleKinds { .. } => "incompatible_kinds",
            GroupingError::NotConfigured { .. } => "not_configured",
        }
    }
}

// =============================================================================
// PermissionError
// =============================================================================

/// Permission engine errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PermissionError {
    /// `revoke` targeted a `(subject, object)` tuple with no stored mask.
    #[error("permission policy not found: {subject} on {object}")]
    PolicyNotFound {
        /// The subject of the missing tuple.
        subject: Subject,
        /// The object of the missing tuple.
        object: Object,
    },
}

impl PermissionError {
    /// Returns the error type as a stable string for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            PermissionError::PolicyNotFound { .. } => "not_found",
        }
    }
}

// =============================================================================
// PersistError
// =============================================================================

/// Durable store and change-channel errors.
///
/// A persister failure leaves the in-memory engine untouched; the caller
/// sees the error and may retry.
#[derive(Debug, Error)]
pub enum PersistError {
    /// The underlying store rejected or failed the operation.
    #[error("store operation failed: {message}")]
    StoreFailed {
        /// Human-readable failure description.
        message: String,
        /// The underlying cause, when one exists.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A change could not be delivered because every subscriber is gone.
    #[error("change channel closed")]
    ChannelClosed,

    /// A change record carried a method the engine cannot apply.
    #[error("unsupported change method: {method}")]
    UnsupportedMethod {
        /// The offending method.
        method: PersistMethod,
    },
}

impl PersistError {
    /// Creates a [`PersistError::StoreFailed`] from a message.
    pub fn store_failed(message: impl Into<String>) -> Self {
        PersistError::StoreFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a [`PersistError::StoreFailed`] wrapping a source error.
    pub fn store_failed_with(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PersistError::StoreFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns the error type as a stable string for logging/metrics.
    pub fn error_type(&self) -> &'static str {
        match self {
            PersistError::StoreFailed { .. } => "persister_failed",
            PersistError::ChannelClosed => "closed_channel",
            PersistError::UnsupportedMethod { .. } => "unsupported_method",
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_types() {
        let e: WardenError = ParseError::InvalidSubject("x".into()).into();
        assert_eq!(e.error_type(), "invalid_subject");

        let e: WardenError = GroupingError::EdgeNotFound {
            child: Entity::user("u"),
            parent: Group::role("r"),
        }
        .into();
        assert_eq!(e.error_type(), "not_found");
        assert!(e.is_not_found());

        let e: WardenError = PersistError::ChannelClosed.into();
        assert_eq!(e.error_type(), "closed_channel");
        assert!(!e.is_not_found());
    }

    #[test]
    fn test_edge_not_found_message() {
        let e = GroupingError::EdgeNotFound {
            child: Entity::user("5"),
            parent: Group::role("2_1"),
        };
        assert_eq!(e.to_string(), "grouping rule not found: user:5 -> role:2_1");
    }

    #[test]
    fn test_store_failed_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let e = PersistError::store_failed_with("write rejected", io);
        assert!(std::error::Error::source(&e).is_some());
        assert_eq!(e.error_type(), "persister_failed");
    }
}
