// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # Concurrency Integration Tests
//!
//! Readers and writers race over the synchronized engines; afterwards the
//! final state must equal the same write log applied sequentially to a
//! fresh engine. The lock discipline (readers shared, writers exclusive)
//! is what makes the comparison deterministic: the writes here commute.

use std::sync::Arc;
use std::thread;

use warden_core::action::Action;
use warden_core::types::{Entity, Group, Member, Object, Subject};
use warden_grouping::{FatGrouping, Grouping, SyncedGrouping};
use warden_permission::{MemoryPermission, PermissionStore, SyncedPermission};

const WRITERS: usize = 4;
const READERS: usize = 8;
const USERS_PER_WRITER: usize = 25;

/// The write log: every writer joins a disjoint slice of users, each to
/// one modulo role plus the shared super-role edge.
fn grouping_write_log(writer: usize) -> Vec<(Entity, Group)> {
    let mut log: Vec<(Entity, Group)> = (0..USERS_PER_WRITER)
        .map(|i| {
            let user = writer * USERS_PER_WRITER + i;
            (
                Entity::user(user.to_string()),
                Group::role(format!("r{}", user % 10)),
            )
        })
        .collect();
    // Every writer also inserts the same role-to-role edge; joins are
    // idempotent so the race is harmless.
    log.push((Entity::role("r0"), Group::role("all")));
    log
}

#[test]
fn test_concurrent_grouping_matches_sequential() {
    let engine = Arc::new(SyncedGrouping::new(FatGrouping::with_defaults()));

    let mut handles = Vec::new();
    for writer in 0..WRITERS {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            for (child, parent) in grouping_write_log(writer) {
                engine.join(&child, &parent).expect("join");
            }
        }));
    }
    for _ in 0..READERS {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            // Readers must always observe internally consistent snapshots.
            for i in 0..200 {
                let role = Group::role(format!("r{}", i % 10));
                let members = engine.members_in(&role);
                for member in &members {
                    assert!(
                        engine.is_in(member, &role) || !engine.members_in(&role).contains(member),
                        "member set and reachability disagree"
                    );
                }
                let _ = engine.all_members();
                let _ = engine.groups_of(&Entity::user((i % 100).to_string()));
            }
        }));
    }
    for handle in handles {
        handle.join().expect("task panicked");
    }

    // Sequential reference.
    let mut reference = FatGrouping::with_defaults();
    for writer in 0..WRITERS {
        for (child, parent) in grouping_write_log(writer) {
            reference.join(&child, &parent).expect("join");
        }
    }

    assert_eq!(engine.all_members(), reference.all_members());
    assert_eq!(engine.all_groups(), reference.all_groups());
    for user in 0..WRITERS * USERS_PER_WRITER {
        let entity = Entity::user(user.to_string());
        assert_eq!(
            engine.groups_of(&entity),
            reference.groups_of(&entity),
            "user {user}"
        );
    }
    for role in 0..10 {
        let role = Group::role(format!("r{role}"));
        assert_eq!(engine.members_in(&role), reference.members_in(&role), "{role}");
    }
    assert_eq!(
        engine.members_in(&Group::role("all")),
        reference.members_in(&Group::role("all"))
    );
}

#[test]
fn test_concurrent_permission_matches_sequential() {
    let engine = Arc::new(SyncedPermission::new(MemoryPermission::new()));
    let atoms = [Action::EXEC, Action::WRITE, Action::READ];

    // Writer w grants atom w%3 to every user on a shared object; grants
    // union, so any interleaving lands on the same final masks.
    let mut handles = Vec::new();
    for writer in 0..WRITERS {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            let action = atoms[writer % atoms.len()];
            for user in 0..50 {
                engine
                    .permit(
                        &Subject::user(user.to_string()),
                        &Object::article("shared"),
                        action,
                    )
                    .expect("permit");
            }
        }));
    }
    for _ in 0..READERS {
        let engine = Arc::clone(&engine);
        handles.push(thread::spawn(move || {
            for user in 0..200 {
                let mask = engine.permitted_actions(
                    &Subject::user((user % 50).to_string()),
                    &Object::article("shared"),
                );
                // Masks only ever grow during this run.
                assert!(Action::READ_WRITE_EXEC.includes(mask));
            }
        }));
    }
    for handle in handles {
        handle.join().expect("task panicked");
    }

    let mut reference = MemoryPermission::new();
    for writer in 0..WRITERS {
        let action = atoms[writer % atoms.len()];
        for user in 0..50 {
            reference
                .permit(
                    &Subject::user(user.to_string()),
                    &Object::article("shared"),
                    action,
                )
                .expect("permit");
        }
    }

    for user in 0..50 {
        let sub = Subject::user(user.to_string());
        let obj = Object::article("shared");
        assert_eq!(
            engine.permitted_actions(&sub, &obj),
            reference.permitted_actions(&sub, &obj),
            "user {user}"
        );
    }
}

#[test]
fn test_member_snapshot_is_stable_across_removal() {
    let engine = Arc::new(SyncedGrouping::new(FatGrouping::with_defaults()));
    engine
        .join(&Entity::user("alice"), &Group::role("ops"))
        .expect("join");

    let snapshot = engine.members_in(&Group::role("ops"));

    let remover = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || engine.remove_member(&Member::user("alice")).expect("remove"))
    };
    remover.join().expect("remover panicked");

    // The snapshot taken before the removal is untouched.
    assert!(snapshot.contains(&Member::user("alice")));
    assert!(engine.members_in(&Group::role("ops")).is_empty());
}
