// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Action bitset and the process-wide action registry.
//!
//! Actions are powers of two packed into a `u32`, so permission masks
//! support constant-time union, intersection, difference, and inclusion.
//!
//! The default registry defines `exec` (bit 0), `write` (bit 1), and
//! `read` (bit 2). Deployments with a different action vocabulary call
//! [`reset_actions`] once at startup, before any engine is constructed;
//! persisted masks written under a previous registry are invalidated by a
//! reset.
//!
//! # Examples
//!
//! ```
//! use warden_core::action::Action;
//!
//! let mask = Action::READ | Action::WRITE;
//! assert!(mask.includes(Action::READ));
//! assert!(!mask.includes(Action::EXEC));
//! assert_eq!(mask.difference(Action::WRITE), Action::READ);
//! ```

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};
use std::sync::LazyLock;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

// =============================================================================
// Action
// =============================================================================

/// A set of atomic actions, encoded as a bitset.
///
/// A single atomic action has exactly one bit set; a mask is any union of
/// atomic actions. The empty mask is [`Action::NONE`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Action(u32);

impl Action {
    /// The empty mask.
    pub const NONE: Action = Action(0);
    /// Execute.
    pub const EXEC: Action = Action(1);
    /// Write.
    pub const WRITE: Action = Action(1 << 1);
    /// Read.
    pub const READ: Action = Action(1 << 2);
    /// Read and write.
    pub const READ_WRITE: Action = Action(Self::READ.0 | Self::WRITE.0);
    /// Read and execute.
    pub const READ_EXEC: Action = Action(Self::READ.0 | Self::EXEC.0);
    /// Read, write, and execute.
    pub const READ_WRITE_EXEC: Action = Action(Self::READ.0 | Self::WRITE.0 | Self::EXEC.0);

    /// Creates an action mask from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Action(bits)
    }

    /// Returns the raw bits of this mask.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// The union of every currently registered action.
    ///
    /// Tracks [`reset_actions`]: after a reset this is the union of the
    /// new vocabulary.
    pub fn all() -> Action {
        REGISTRY.read().all
    }

    /// Returns `true` if this mask contains every action in `other`.
    ///
    /// `a.includes(b)` iff `a & b == b`; every mask includes
    /// [`Action::NONE`].
    pub fn includes(self, other: Action) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if every action in this mask is contained in `other`.
    pub fn is_in(self, other: Action) -> bool {
        other.includes(self)
    }

    /// Returns the actions in this mask that are not in `other`.
    pub fn difference(self, other: Action) -> Action {
        Action(self.0 & !other.0)
    }

    /// Returns `true` if the mask is empty.
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Splits this mask into its atomic actions, ordered by bit index.
    ///
    /// The union of the returned actions reconstructs the mask.
    pub fn split(self) -> Vec<Action> {
        (0..u32::BITS)
            .map(|i| Action(1 << i))
            .filter(|atom| self.includes(*atom))
            .collect()
    }
}

impl BitOr for Action {
    type Output = Action;

    fn bitor(self, rhs: Action) -> Action {
        Action(self.0 | rhs.0)
    }
}

impl BitOrAssign for Action {
    fn bitor_assign(&mut self, rhs: Action) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Action {
    type Output = Action;

    fn bitand(self, rhs: Action) -> Action {
        Action(self.0 & rhs.0)
    }
}

impl BitAndAssign for Action {
    fn bitand_assign(&mut self, rhs: Action) {
        self.0 &= rhs.0;
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = REGISTRY.read();
        let names: Vec<&str> = self
            .split()
            .into_iter()
            .map(|atom| registry.name_of(atom).unwrap_or("unknown"))
            .collect();
        write!(f, "{}", names.join("|"))
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Maximum number of atomic actions a registry can hold.
pub const MAX_ACTIONS: usize = u32::BITS as usize;

struct ActionRegistry {
    names: Vec<String>,
    all: Action,
}

impl ActionRegistry {
    fn with_names(names: Vec<String>) -> Self {
        let all = if names.len() >= MAX_ACTIONS {
            Action(u32::MAX)
        } else {
            Action((1u32 << names.len()) - 1)
        };
        Self { names, all }
    }

    fn name_of(&self, atom: Action) -> Option<&str> {
        let index = atom.0.trailing_zeros() as usize;
        if atom.0.count_ones() == 1 {
            self.names.get(index).map(String::as_str)
        } else {
            None
        }
    }
}

static REGISTRY: LazyLock<RwLock<ActionRegistry>> = LazyLock::new(|| {
    RwLock::new(ActionRegistry::with_names(vec![
        "exec".to_string(),
        "write".to_string(),
        "read".to_string(),
    ]))
});

/// Replaces the action vocabulary, assigning bit positions in input order.
///
/// Returns the atomic action for each name. This is a startup-only
/// operation: call it at most once, before constructing any engine.
/// Persisted masks written under a previous vocabulary are invalidated.
///
/// # Panics
///
/// Panics if more than [`MAX_ACTIONS`] names are given. This is a
/// configuration error, not a runtime input.
pub fn reset_actions<S: AsRef<str>>(names: &[S]) -> Vec<Action> {
    assert!(
        names.len() <= MAX_ACTIONS,
        "at most {MAX_ACTIONS} actions may be registered, got {}",
        names.len()
    );

    let names: Vec<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
    let actions: Vec<Action> = (0..names.len()).map(|i| Action(1 << i)).collect();
    *REGISTRY.write() = ActionRegistry::with_names(names);
    actions
}

// =============================================================================
// Tests
// =============================================================================
