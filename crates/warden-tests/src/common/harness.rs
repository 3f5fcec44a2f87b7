// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Engine-building helpers shared by the integration suites.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use warden_core::policy::PermissionPolicy;
use warden_core::shutdown::ShutdownCoordinator;
use warden_core::types::{Entity, Group};
use warden_grouping::{
    FatGrouping, PersistedGrouping, SharedGrouping, SlimGrouping, SyncedGrouping,
};
use warden_permission::{MemoryPermission, SharedPermission, SyncedPermission};
use warden_persist::FakeGroupingPersister;

/// Initializes a test tracing subscriber once per process.
pub fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

/// A synchronized slim grouping.
pub fn synced_slim() -> Arc<SyncedGrouping<SlimGrouping>> {
    Arc::new(SyncedGrouping::new(SlimGrouping::with_defaults()))
}

/// A synchronized fat grouping.
pub fn synced_fat() -> Arc<SyncedGrouping<FatGrouping>> {
    Arc::new(SyncedGrouping::new(FatGrouping::with_defaults()))
}

/// A synchronized in-memory permission engine.
pub fn synced_permission() -> Arc<SyncedPermission<MemoryPermission>> {
    Arc::new(SyncedPermission::new(MemoryPermission::new()))
}

/// A persisted slim grouping over a fresh fake persister.
pub async fn persisted_slim(
    shutdown: &ShutdownCoordinator,
) -> (Arc<FakeGroupingPersister>, PersistedGrouping<SlimGrouping>) {
    let persister = Arc::new(FakeGroupingPersister::new(shutdown));
    let engine = PersistedGrouping::new(
        persister.clone() as Arc<dyn warden_core::persist::GroupingPersister>,
        SlimGrouping::with_defaults(),
        shutdown,
    )
    .await
    .expect("build persisted grouping");
    (persister, engine)
}

/// Every grouping construction the suites run against.
pub async fn all_groupings(shutdown: &ShutdownCoordinator) -> Vec<(&'static str, Arc<dyn SharedGrouping>)> {
    let mut out: Vec<(&'static str, Arc<dyn SharedGrouping>)> = vec![
        ("synced slim", synced_slim()),
        ("synced fat", synced_fat()),
    ];

    let persister = Arc::new(FakeGroupingPersister::new(shutdown));
    let persisted_slim = PersistedGrouping::new(
        persister as Arc<dyn warden_core::persist::GroupingPersister>,
        SlimGrouping::with_defaults(),
        shutdown,
    )
    .await
    .expect("build persisted slim");
    out.push(("persisted slim", Arc::new(persisted_slim)));

    let persister = Arc::new(FakeGroupingPersister::new(shutdown));
    let persisted_fat = PersistedGrouping::new(
        persister as Arc<dyn warden_core::persist::GroupingPersister>,
        FatGrouping::with_defaults(),
        shutdown,
    )
    .await
    .expect("build persisted fat");
    out.push(("persisted fat", Arc::new(persisted_fat)));

    out
}

/// Loads grouping edges through the shared mutation path.
pub async fn load_edges(grouping: &dyn SharedGrouping, edges: &[(Entity, Group)]) {
    for (child, parent) in edges {
        grouping
            .join(child, parent)
            .await
            .unwrap_or_else(|e| panic!("join {child} -> {parent}: {e}"));
    }
}

/// Loads permission policies through the shared mutation path.
pub async fn load_policies(permission: &dyn SharedPermission, policies: &[PermissionPolicy]) {
    for policy in policies {
        permission
            .permit(&policy.subject, &policy.object, policy.action)
            .await
            .unwrap_or_else(|e| panic!("permit {policy}: {e}"));
    }
}

/// Polls `condition` until it holds or the timeout elapses.
///
/// Used for cross-replica assertions: the change channel gives bounded,
/// not immediate, convergence.
pub async fn eventually<F, Fut>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
