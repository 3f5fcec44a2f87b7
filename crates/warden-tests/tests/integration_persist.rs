// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Persistence Integration Tests
//!
//! Replay, replication, and failure behavior of the persisted engines:
//!
//! - `test_replay_*`: a new engine over a written store matches the writer
//! - `test_replicas_*`: engines sharing a persister converge through the
//!   change stream
//! - `test_failure_*`: persister errors leave memory untouched; an
//!   unexpected channel close flips the health signal

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;

use warden_core::action::Action;
use warden_core::error::PersistError;
use warden_core::persist::{GroupingPersister, PermissionPersister};
use warden_core::policy::{GroupingChange, GroupingPolicy};
use warden_core::reconcile::EngineHealth;
use warden_core::shutdown::ShutdownCoordinator;
use warden_core::types::{Entity, Group, Member, Object, Subject};
use warden_grouping::{FatGrouping, PersistedGrouping, SharedGrouping, SlimGrouping};
use warden_permission::{MemoryPermission, PersistedPermission, SharedPermission};
use warden_persist::{FakeGroupingPersister, FakePermissionPersister};
use warden_tests::common::harness::{eventually, init_tracing};

const CONVERGE_TIMEOUT: Duration = Duration::from_secs(2);

async fn grouping_engine(
    persister: &Arc<FakeGroupingPersister>,
    shutdown: &ShutdownCoordinator,
) -> PersistedGrouping<SlimGrouping> {
    PersistedGrouping::new(
        persister.clone() as Arc<dyn GroupingPersister>,
        SlimGrouping::with_defaults(),
        shutdown,
    )
    .await
    .expect("build persisted grouping")
}

// =============================================================================
// Replay
// =============================================================================

#[tokio::test]
async fn test_replay_after_random_mutations() {
    init_tracing();
    let shutdown = ShutdownCoordinator::new();
    let persister = Arc::new(FakeGroupingPersister::new(&shutdown));
    let a = grouping_engine(&persister, &shutdown).await;

    // 100 random mutations through engine A.
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..100 {
        let child = Entity::user(rng.gen_range(0..10u32).to_string());
        let parent = Group::role(format!("r{}", rng.gen_range(0..5u32)));
        if rng.gen_bool(0.7) {
            a.join(&child, &parent).await.expect("join");
        } else {
            // Leaves of absent edges are expected in a random run.
            let _ = a.leave(&child, &parent).await;
        }
    }

    // A fresh engine over the same store replays to identical state.
    let b = grouping_engine(&persister, &shutdown).await;
    assert_eq!(a.all_members(), b.all_members());
    assert_eq!(a.all_groups(), b.all_groups());
    for i in 0..10u32 {
        let user = Entity::user(i.to_string());
        assert_eq!(a.groups_of(&user), b.groups_of(&user), "user {i}");
    }

    shutdown.initiate_shutdown();
}

#[tokio::test]
async fn test_replay_is_not_re_persisted() {
    init_tracing();
    let shutdown = ShutdownCoordinator::new();
    let persister = Arc::new(FakeGroupingPersister::with_policies(
        &shutdown,
        vec![
            GroupingPolicy::new(Entity::user("alice"), Group::role("ops")),
            GroupingPolicy::new(Entity::role("ops"), Group::role("staff")),
        ],
    ));

    // Watch the store before the engine exists: replay must not echo.
    let mut changes = persister.watch().await.unwrap();
    let engine = grouping_engine(&persister, &shutdown).await;

    assert!(engine.is_in(&Member::user("alice"), &Group::role("staff")));
    assert!(changes.try_recv().is_err());

    shutdown.initiate_shutdown();
}

#[tokio::test]
async fn test_permission_replay() {
    init_tracing();
    let shutdown = ShutdownCoordinator::new();
    let persister = Arc::new(FakePermissionPersister::new(&shutdown));

    let a = PersistedPermission::new(
        persister.clone() as Arc<dyn PermissionPersister>,
        MemoryPermission::new(),
        &shutdown,
    )
    .await
    .expect("engine a");

    let sub = Subject::role("ops");
    let obj = Object::article("report");
    a.permit(&sub, &obj, Action::READ_WRITE).await.unwrap();
    a.revoke(&sub, &obj, Action::WRITE).await.unwrap();

    let b = PersistedPermission::new(
        persister.clone() as Arc<dyn PermissionPersister>,
        MemoryPermission::new(),
        &shutdown,
    )
    .await
    .expect("engine b");

    assert_eq!(b.permitted_actions(&sub, &obj), Action::READ);
    assert_eq!(b.permissions_for(&sub), a.permissions_for(&sub));

    shutdown.initiate_shutdown();
}

// =============================================================================
// Replication
// =============================================================================

#[tokio::test]
async fn test_replicas_see_remote_mutations() {
    init_tracing();
    let shutdown = ShutdownCoordinator::new();
    let persister = Arc::new(FakeGroupingPersister::new(&shutdown));
    let a = grouping_engine(&persister, &shutdown).await;
    let b = grouping_engine(&persister, &shutdown).await;

    a.join(&Entity::user("alice"), &Group::role("ops"))
        .await
        .unwrap();

    assert!(
        eventually(CONVERGE_TIMEOUT, || async {
            b.is_in(&Member::user("alice"), &Group::role("ops"))
        })
        .await,
        "remote join not observed on replica B"
    );

    // And the reverse direction, including a removal.
    b.join(&Entity::user("bob"), &Group::role("ops")).await.unwrap();
    a.leave(&Entity::user("alice"), &Group::role("ops"))
        .await
        .unwrap();

    assert!(
        eventually(CONVERGE_TIMEOUT, || async {
            a.is_in(&Member::user("bob"), &Group::role("ops"))
                && !b.is_in(&Member::user("alice"), &Group::role("ops"))
        })
        .await,
        "replicas did not converge"
    );

    assert_eq!(a.health(), EngineHealth::Running);
    assert_eq!(b.health(), EngineHealth::Running);

    // Both reconcilers saw traffic (at minimum, echoes of their own writes).
    assert!(a.reconciler_stats().records_applied + a.reconciler_stats().records_noop > 0);

    shutdown.initiate_shutdown();
}

#[tokio::test]
async fn test_replicas_converge_mixed_stores() {
    init_tracing();
    let shutdown = ShutdownCoordinator::new();
    let persister = Arc::new(FakeGroupingPersister::new(&shutdown));

    // Slim on one side, fat on the other: the wire contract carries them
    // to the same state.
    let a = grouping_engine(&persister, &shutdown).await;
    let b = PersistedGrouping::new(
        persister.clone() as Arc<dyn GroupingPersister>,
        FatGrouping::with_defaults(),
        &shutdown,
    )
    .await
    .expect("fat replica");

    for i in 0..5u32 {
        a.join(
            &Entity::user(i.to_string()),
            &Group::role(format!("r{}", i % 2)),
        )
        .await
        .unwrap();
    }
    b.join(&Entity::role("r0"), &Group::role("all")).await.unwrap();

    assert!(
        eventually(CONVERGE_TIMEOUT, || async {
            a.all_members() == b.all_members()
                && a.all_groups() == b.all_groups()
                && a.members_in(&Group::role("all")) == b.members_in(&Group::role("all"))
        })
        .await,
        "slim and fat replicas diverged"
    );

    shutdown.initiate_shutdown();
}

#[tokio::test]
async fn test_permission_replicas_converge() {
    init_tracing();
    let shutdown = ShutdownCoordinator::new();
    let persister = Arc::new(FakePermissionPersister::new(&shutdown));

    let a = PersistedPermission::new(
        persister.clone() as Arc<dyn PermissionPersister>,
        MemoryPermission::new(),
        &shutdown,
    )
    .await
    .expect("engine a");
    let b = PersistedPermission::new(
        persister.clone() as Arc<dyn PermissionPersister>,
        MemoryPermission::new(),
        &shutdown,
    )
    .await
    .expect("engine b");

    let sub = Subject::user("alice");
    let obj = Object::article("report");

    a.permit(&sub, &obj, Action::READ_WRITE).await.unwrap();
    assert!(
        eventually(CONVERGE_TIMEOUT, || async {
            b.shall(&sub, &obj, Action::READ_WRITE)
        })
        .await
    );

    b.revoke(&sub, &obj, Action::WRITE).await.unwrap();
    assert!(
        eventually(CONVERGE_TIMEOUT, || async {
            a.permitted_actions(&sub, &obj) == Action::READ
        })
        .await,
        "revocation did not replicate"
    );

    shutdown.initiate_shutdown();
}

// =============================================================================
// Failure behavior
// =============================================================================

/// Persister whose mutations always fail; list/watch work.
struct FailingGroupingPersister {
    // Held so the change channel stays open.
    _tx: mpsc::Sender<GroupingChange>,
    rx: parking_lot::Mutex<Option<mpsc::Receiver<GroupingChange>>>,
}

impl FailingGroupingPersister {
    fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self {
            _tx: tx,
            rx: parking_lot::Mutex::new(Some(rx)),
        }
    }
}

#[async_trait]
impl GroupingPersister for FailingGroupingPersister {
    async fn insert(&self, _: &Entity, _: &Group) -> Result<(), PersistError> {
        Err(PersistError::store_failed("injected insert failure"))
    }

    async fn remove(&self, _: &Entity, _: &Group) -> Result<(), PersistError> {
        Err(PersistError::store_failed("injected remove failure"))
    }

    async fn list(&self) -> Result<Vec<GroupingPolicy>, PersistError> {
        Ok(Vec::new())
    }

    async fn watch(&self) -> Result<mpsc::Receiver<GroupingChange>, PersistError> {
        Ok(self.rx.lock().take().expect("watch called once"))
    }
}

#[tokio::test]
async fn test_failure_leaves_memory_untouched() {
    init_tracing();
    let shutdown = ShutdownCoordinator::new();
    let engine = PersistedGrouping::new(
        Arc::new(FailingGroupingPersister::new()) as Arc<dyn GroupingPersister>,
        SlimGrouping::with_defaults(),
        &shutdown,
    )
    .await
    .expect("engine");

    let err = engine
        .join(&Entity::user("alice"), &Group::role("ops"))
        .await
        .unwrap_err();
    assert_eq!(err.error_type(), "persister_failed");

    // The failed join must not be visible in memory.
    assert!(!engine.is_in(&Member::user("alice"), &Group::role("ops")));
    assert!(engine.all_members().is_empty());

    shutdown.initiate_shutdown();
}

/// Persister whose change channel is closed from the start.
struct ClosedChannelGroupingPersister;

#[async_trait]
impl GroupingPersister for ClosedChannelGroupingPersister {
    async fn insert(&self, _: &Entity, _: &Group) -> Result<(), PersistError> {
        Ok(())
    }

    async fn remove(&self, _: &Entity, _: &Group) -> Result<(), PersistError> {
        Ok(())
    }

    async fn list(&self) -> Result<Vec<GroupingPolicy>, PersistError> {
        Ok(Vec::new())
    }

    async fn watch(&self) -> Result<mpsc::Receiver<GroupingChange>, PersistError> {
        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        Ok(rx)
    }
}

#[tokio::test]
async fn test_unexpected_channel_close_is_fatal_health() {
    init_tracing();
    let shutdown = ShutdownCoordinator::new();
    let engine = PersistedGrouping::new(
        Arc::new(ClosedChannelGroupingPersister) as Arc<dyn GroupingPersister>,
        SlimGrouping::with_defaults(),
        &shutdown,
    )
    .await
    .expect("engine");

    assert!(
        eventually(CONVERGE_TIMEOUT, || async {
            engine.health() == EngineHealth::Failed
        })
        .await,
        "health did not flip to failed"
    );

    // The engine stays usable for local mutations.
    engine
        .join(&Entity::user("alice"), &Group::role("ops"))
        .await
        .unwrap();
    assert!(engine.is_in(&Member::user("alice"), &Group::role("ops")));
}

#[tokio::test]
async fn test_shutdown_stops_reconciler_cleanly() {
    init_tracing();
    let shutdown = ShutdownCoordinator::new();
    let persister = Arc::new(FakeGroupingPersister::new(&shutdown));
    let engine = grouping_engine(&persister, &shutdown).await;

    shutdown.initiate_shutdown();

    assert!(
        eventually(CONVERGE_TIMEOUT, || async {
            engine.health() == EngineHealth::Stopped
        })
        .await,
        "reconciler did not stop cleanly"
    );
}
