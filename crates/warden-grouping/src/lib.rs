// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-grouping
//!
//! Hierarchical grouping engines for Warden.
//!
//! A grouping is a transitively-closed many-to-many relation between
//! entities and groups, with group-to-group nesting (roles inherit roles,
//! articles belong to categories which belong to super-categories). Two
//! storage strategies implement one [`Grouping`] contract:
//!
//! - [`SlimGrouping`] - direct edges only, transitive queries computed on
//!   demand; best when memberships change often and queries are rare.
//! - [`FatGrouping`] - direct edges plus materialized closures; best when
//!   queries dominate.
//!
//! Wrappers add the concurrent [`SharedGrouping`] surface:
//!
//! - [`SyncedGrouping`] - a readers-writer lock over any store.
//! - [`PersistedGrouping`] - a durable store plus a change-stream
//!   reconciler over a synchronized store.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod fat;
pub mod persisted;
pub mod slim;
pub mod synced;
pub mod traits;

pub use fat::FatGrouping;
pub use persisted::PersistedGrouping;
pub use slim::SlimGrouping;
pub use synced::SyncedGrouping;
pub use traits::{
    Grouping, GroupingConfig, GroupingConfigBuilder, SharedGrouping, DEFAULT_MAX_DEPTH,
};
