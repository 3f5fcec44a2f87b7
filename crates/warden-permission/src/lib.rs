// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-permission
//!
//! Permission engines for Warden.
//!
//! A permission engine maps `(subject, object)` pairs to action-bitset
//! masks with set-algebraic updates: grants union in, revocations clear
//! out, and empty masks are removed. One [`PermissionStore`] contract is
//! implemented by the in-memory [`MemoryPermission`]; wrappers add the
//! concurrent [`SharedPermission`] surface:
//!
//! - [`SyncedPermission`] - a readers-writer lock over any store.
//! - [`PersistedPermission`] - a durable store plus a change-stream
//!   reconciler over a synchronized store.
//!
//! Group-aware decision making lives one level up, in `warden-authz`.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod persisted;
pub mod store;
pub mod synced;
pub mod traits;

pub use persisted::PersistedPermission;
pub use store::{MemoryPermission, PermissionStore};
pub use synced::SyncedPermission;
pub use traits::SharedPermission;
