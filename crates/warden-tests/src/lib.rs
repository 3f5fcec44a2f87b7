// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # warden-tests
//!
//! Shared fixtures and helpers for Warden integration tests.
//!
//! The actual test suites live under `tests/`; this library crate holds
//! the common corpus (users, roles, articles, categories, policy sets)
//! and engine-building helpers so every suite exercises the same data.

#![deny(unsafe_code)]

pub mod common;
