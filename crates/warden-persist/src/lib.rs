// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-persist
//!
//! Policy persisters for Warden.
//!
//! Durable stores are external collaborators reached through the traits
//! in `warden_core::persist`; this crate ships the in-process pieces:
//!
//! - [`FakeGroupingPersister`] / [`FakePermissionPersister`] - in-memory
//!   stores with fan-out change channels, for tests and replica
//!   simulations.
//! - [`FilterGroupingPersister`] / [`FilterPermissionPersister`] -
//!   deduplicating wrappers that keep no-op calls off any persister.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod fake;
pub mod filter;

pub use fake::{FakeGroupingPersister, FakePermissionPersister};
pub use filter::{FilterGroupingPersister, FilterPermissionPersister};
