// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-core
//!
//! Core abstractions and shared types for the Warden RBAC engine.
//!
//! This crate provides the foundation used across all Warden components:
//!
//! - **Types**: tagged entity model - `Member`, `Group`, `Entity`,
//!   `Subject`, `Object`
//! - **Action**: power-of-two action bitset and the process-wide registry
//! - **Policy**: persisted policies and change records with their wire form
//! - **Persist**: durable store traits consumed by persisted engines
//! - **Error**: unified error hierarchy
//! - **Shutdown**: cancellation for background tasks
//! - **Reconcile**: the change-stream reconciliation loop, health, stats
//!
//! ## Example
//!
//! ```
//! use warden_core::action::Action;
//! use warden_core::types::{Entity, Group, Subject};
//!
//! let user = Entity::user("alice");
//! let admins = Group::role("admin");
//! assert!(admins.accepts(&user));
//!
//! let mask = Action::READ | Action::WRITE;
//! assert!(mask.includes(Action::READ));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod action;
pub mod error;
pub mod persist;
pub mod policy;
pub mod reconcile;
pub mod shutdown;
pub mod types;

// =============================================================================
// Re-exports for convenience
// =============================================================================

pub use action::{reset_actions, Action, MAX_ACTIONS};
pub use error::{GroupingError, ParseError, PermissionError, PersistError, WardenError};
pub use persist::{GroupingPersister, PermissionPersister};
pub use policy::{
    GroupingChange, GroupingPolicy, PermissionChange, PermissionPolicy, PersistMethod,
};
pub use reconcile::{
    ApplyOutcome, ChangeApplier, EngineHealth, EngineHealthCell, Reconciler, ReconcilerStats,
    ReconcilerStatsInner,
};
pub use shutdown::{ShutdownCoordinator, ShutdownToken};
pub use types::{Entity, Group, Member, Object, Subject};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
