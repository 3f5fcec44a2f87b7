// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Fake in-memory persisters.
//!
//! Test-grade implementations of the persister traits: policies live in a
//! map, and every mutation that changes the map fans out a change record
//! to each `watch()` subscriber. The whole mutation, map update plus
//! fan-out, runs under one async lock, so delivery order equals commit
//! order for every subscriber (the at-least-once, ordered contract).
//!
//! Channels hold a single change; a subscriber that stops draining
//! quickly blocks mutators, which is the honest failure mode for a fake.
//! A production persister chooses its own buffering and drop policy.
//!
//! The constructors spawn a watcher-closing task, so they must run inside
//! a tokio runtime. Firing the [`ShutdownCoordinator`] closes every
//! subscriber channel.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use tokio::sync::{mpsc, Mutex};

use warden_core::action::Action;
use warden_core::error::PersistError;
use warden_core::persist::{GroupingPersister, PermissionPersister};
use warden_core::policy::{
    GroupingChange, GroupingPolicy, PermissionChange, PermissionPolicy, PersistMethod,
};
use warden_core::shutdown::{ShutdownCoordinator, ShutdownToken};
use warden_core::types::{Entity, Group, Object, Subject};

/// Capacity of each subscriber's change channel.
///
/// One slot keeps the fake close to an unbuffered channel: a mutation
/// does not commit until every subscriber has taken the previous change,
/// so the echo of a local mutation never lags more than one commit
/// behind the engine that issued it.
const CHANGE_CHANNEL_CAPACITY: usize = 1;

// =============================================================================
// Watcher fan-out
// =============================================================================

/// Subscriber registry shared by both fake persisters.
#[derive(Debug)]
struct Watchers<C> {
    senders: Arc<SyncMutex<Vec<mpsc::Sender<C>>>>,
    shutdown: ShutdownToken,
}

impl<C: Clone + Send + 'static> Watchers<C> {
    /// Registers the close-on-shutdown task.
    fn new(shutdown: &ShutdownCoordinator) -> Self {
        let senders: Arc<SyncMutex<Vec<mpsc::Sender<C>>>> = Arc::default();
        let closer = Arc::clone(&senders);
        let mut rx = shutdown.subscribe();
        tokio::spawn(async move {
            let _ = rx.recv().await;
            // Dropping the senders closes every subscriber channel.
            closer.lock().clear();
        });
        Self {
            senders,
            shutdown: shutdown.token(),
        }
    }

    fn subscribe(&self) -> mpsc::Receiver<C> {
        let (tx, rx) = mpsc::channel(CHANGE_CHANNEL_CAPACITY);
        if !self.shutdown.is_shutdown_requested() {
            self.senders.lock().push(tx);
        }
        // After shutdown the sender is dropped here and the receiver
        // reads as closed.
        rx
    }

    async fn broadcast(&self, change: C) {
        let senders = self.senders.lock().clone();
        for sender in senders {
            let _ = sender.send(change.clone()).await;
        }
    }
}

// =============================================================================
// FakeGroupingPersister
// =============================================================================

/// In-memory grouping persister.
#[derive(Debug)]
pub struct FakeGroupingPersister {
    /// Whole-operation lock: state mutation and fan-out happen together,
    /// so subscribers observe commit order.
    state: Mutex<HashMap<Entity, HashSet<Group>>>,
    watchers: Watchers<GroupingChange>,
}

impl FakeGroupingPersister {
    /// Creates an empty persister.
    pub fn new(shutdown: &ShutdownCoordinator) -> Self {
        Self::with_policies(shutdown, Vec::new())
    }

    /// Creates a persister seeded with policies (no changes emitted).
    pub fn with_policies(shutdown: &ShutdownCoordinator, seed: Vec<GroupingPolicy>) -> Self {
        let mut state: HashMap<Entity, HashSet<Group>> = HashMap::new();
        for policy in seed {
            state.entry(policy.child).or_default().insert(policy.parent);
        }
        Self {
            state: Mutex::new(state),
            watchers: Watchers::new(shutdown),
        }
    }
}

#[async_trait]
impl GroupingPersister for FakeGroupingPersister {
    async fn insert(&self, child: &Entity, parent: &Group) -> Result<(), PersistError> {
        let mut state = self.state.lock().await;
        let inserted = state
            .entry(child.clone())
            .or_default()
            .insert(parent.clone());
        if !inserted {
            return Ok(());
        }

        self.watchers
            .broadcast(GroupingChange {
                policy: GroupingPolicy::new(child.clone(), parent.clone()),
                method: PersistMethod::Insert,
            })
            .await;
        Ok(())
    }

    async fn remove(&self, child: &Entity, parent: &Group) -> Result<(), PersistError> {
        let mut state = self.state.lock().await;
        let removed = state
            .get_mut(child)
            .is_some_and(|parents| parents.remove(parent));
        if !removed {
            return Ok(());
        }

        self.watchers
            .broadcast(GroupingChange {
                policy: GroupingPolicy::new(child.clone(), parent.clone()),
                method: PersistMethod::Delete,
            })
            .await;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<GroupingPolicy>, PersistError> {
        let state = self.state.lock().await;
        Ok(state
            .iter()
            .flat_map(|(child, parents)| {
                parents
                    .iter()
                    .map(|parent| GroupingPolicy::new(child.clone(), parent.clone()))
            })
            .collect())
    }

    async fn watch(&self) -> Result<mpsc::Receiver<GroupingChange>, PersistError> {
        Ok(self.watchers.subscribe())
    }
}

// =============================================================================
// FakePermissionPersister
// =============================================================================

/// In-memory permission persister.
#[derive(Debug)]
pub struct FakePermissionPersister {
    state: Mutex<HashMap<Subject, HashMap<Object, Action>>>,
    watchers: Watchers<PermissionChange>,
}

impl FakePermissionPersister {
    /// Creates an empty persister.
    pub fn new(shutdown: &ShutdownCoordinator) -> Self {
        Self::with_policies(shutdown, Vec::new())
    }

    /// Creates a persister seeded with policies (no changes emitted).
    /// Seed masks for the same tuple union together.
    pub fn with_policies(shutdown: &ShutdownCoordinator, seed: Vec<PermissionPolicy>) -> Self {
        let mut state: HashMap<Subject, HashMap<Object, Action>> = HashMap::new();
        for policy in seed {
            let mask = state
                .entry(policy.subject)
                .or_default()
                .entry(policy.object)
                .or_insert(Action::NONE);
            *mask |= policy.action;
        }
        Self {
            state: Mutex::new(state),
            watchers: Watchers::new(shutdown),
        }
    }
}

#[async_trait]
impl PermissionPersister for FakePermissionPersister {
    async fn upsert(
        &self,
        subject: &Subject,
        object: &Object,
        action: Action,
    ) -> Result<(), PersistError> {
        let mut state = self.state.lock().await;
        let objects = state.entry(subject.clone()).or_default();
        let method = match objects.get(object) {
            Some(current) if *current == action => return Ok(()),
            Some(_) => PersistMethod::Update,
            None => PersistMethod::Insert,
        };
        objects.insert(object.clone(), action);

        self.watchers
            .broadcast(PermissionChange {
                policy: PermissionPolicy::new(subject.clone(), object.clone(), action),
                method,
            })
            .await;
        Ok(())
    }

    async fn remove(&self, subject: &Subject, object: &Object) -> Result<(), PersistError> {
        let mut state = self.state.lock().await;
        let removed = match state.get_mut(subject) {
            Some(objects) => {
                let removed = objects.remove(object).is_some();
                if objects.is_empty() {
                    state.remove(subject);
                }
                removed
            }
            None => false,
        };
        if !removed {
            return Ok(());
        }

        self.watchers
            .broadcast(PermissionChange {
                policy: PermissionPolicy::new(subject.clone(), object.clone(), Action::NONE),
                method: PersistMethod::Delete,
            })
            .await;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<PermissionPolicy>, PersistError> {
        let state = self.state.lock().await;
        Ok(state
            .iter()
            .flat_map(|(subject, objects)| {
                objects.iter().map(|(object, action)| {
                    PermissionPolicy::new(subject.clone(), object.clone(), *action)
                })
            })
            .collect())
    }

    async fn watch(&self) -> Result<mpsc::Receiver<PermissionChange>, PersistError> {
        Ok(self.watchers.subscribe())
    }
}

// =============================================================================
// Tests
// =============================================================================
