// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Pre-built test data for consistent and reproducible testing.
//!
//! The subject corpus is the modulo hierarchy: users `0`–`9` join role
//! `m_r` when `user % m == r`, for m ∈ {2, 3, 5}. On top of it sit two
//! super-roles: `even` (over `2_0`) and `divisible` (over `2_0`, `3_0`,
//! `5_0`). The object corpus groups three articles into the `war` and
//! `science` categories.

use warden_core::action::Action;
use warden_core::policy::PermissionPolicy;
use warden_core::types::{Entity, Group, Member, Object, Subject};

// =============================================================================
// Subject Fixtures
// =============================================================================

/// The modulo subject hierarchy.
pub struct SubjectFixtures;

impl SubjectFixtures {
    /// Users `0` through `9`.
    pub fn users() -> Vec<Member> {
        (0..10).map(|i| Member::user(i.to_string())).collect()
    }

    /// Every modulo role: `2_0`, `2_1`, `3_0`..`3_2`, `5_0`..`5_4`.
    pub fn modulo_roles() -> Vec<Group> {
        [2usize, 3, 5]
            .iter()
            .flat_map(|m| (0..*m).map(move |r| Group::role(format!("{m}_{r}"))))
            .collect()
    }

    /// User-to-role edges: user `i` joins `2_{i%2}`, `3_{i%3}`, `5_{i%5}`.
    pub fn user_roles() -> Vec<(Entity, Group)> {
        (0..10usize)
            .flat_map(|i| {
                [2usize, 3, 5].into_iter().map(move |m| {
                    (
                        Entity::user(i.to_string()),
                        Group::role(format!("{m}_{}", i % m)),
                    )
                })
            })
            .collect()
    }

    /// Role-to-role edges: `2_0` joins `even` and `divisible`; `3_0` and
    /// `5_0` join `divisible`.
    pub fn super_roles() -> Vec<(Entity, Group)> {
        vec![
            (Entity::role("2_0"), Group::role("even")),
            (Entity::role("2_0"), Group::role("divisible")),
            (Entity::role("3_0"), Group::role("divisible")),
            (Entity::role("5_0"), Group::role("divisible")),
        ]
    }

    /// The users expected in role `m_r`.
    pub fn users_in_modulo_role(modulus: usize, remainder: usize) -> Vec<Member> {
        (0..10)
            .filter(|i| i % modulus == remainder)
            .map(|i| Member::user(i.to_string()))
            .collect()
    }
}

// =============================================================================
// Object Fixtures
// =============================================================================

/// The article/category corpus.
pub struct ObjectFixtures;

impl ObjectFixtures {
    /// The three articles.
    pub fn articles() -> Vec<Member> {
        vec![
            Member::article("project apollo"),
            Member::article("manhattan project"),
            Member::article("operation overlord"),
        ]
    }

    /// Article-to-category edges: apollo is science, the other two are war.
    pub fn article_categories() -> Vec<(Entity, Group)> {
        vec![
            (Entity::article("project apollo"), Group::category("science")),
            (Entity::article("manhattan project"), Group::category("war")),
            (
                Entity::article("operation overlord"),
                Group::category("war"),
            ),
        ]
    }
}

// =============================================================================
// Policy Fixtures
// =============================================================================

/// The four permission policy sets.
pub struct PolicyFixtures;

impl PolicyFixtures {
    /// Role-to-article grants.
    pub fn role_to_article() -> Vec<PermissionPolicy> {
        vec![
            PermissionPolicy::new(
                Subject::role("2_0"),
                Object::article("project apollo"),
                Action::READ,
            ),
            PermissionPolicy::new(
                Subject::role("2_1"),
                Object::article("project apollo"),
                Action::READ_WRITE_EXEC,
            ),
            PermissionPolicy::new(
                Subject::role("3_0"),
                Object::article("manhattan project"),
                Action::READ,
            ),
            PermissionPolicy::new(
                Subject::role("3_1"),
                Object::article("manhattan project"),
                Action::READ_WRITE,
            ),
            PermissionPolicy::new(
                Subject::role("3_2"),
                Object::article("manhattan project"),
                Action::READ_EXEC,
            ),
        ]
    }

    /// User-to-category grants.
    pub fn user_to_category() -> Vec<PermissionPolicy> {
        vec![
            PermissionPolicy::new(Subject::user("0"), Object::category("war"), Action::READ),
            PermissionPolicy::new(
                Subject::user("0"),
                Object::category("science"),
                Action::WRITE,
            ),
            PermissionPolicy::new(Subject::user("1"), Object::category("war"), Action::EXEC),
            PermissionPolicy::new(Subject::user("2"), Object::category("war"), Action::WRITE),
            PermissionPolicy::new(Subject::user("3"), Object::category("war"), Action::EXEC),
        ]
    }

    /// Role-to-category grants.
    pub fn role_to_category() -> Vec<PermissionPolicy> {
        vec![
            PermissionPolicy::new(Subject::role("3_0"), Object::category("war"), Action::READ),
            PermissionPolicy::new(
                Subject::role("2_1"),
                Object::category("science"),
                Action::EXEC,
            ),
        ]
    }

    /// User-to-article grants.
    pub fn user_to_article() -> Vec<PermissionPolicy> {
        vec![
            PermissionPolicy::new(
                Subject::user("9"),
                Object::article("operation overlord"),
                Action::READ_WRITE_EXEC,
            ),
            PermissionPolicy::new(
                Subject::user("6"),
                Object::article("project apollo"),
                Action::READ,
            ),
        ]
    }
}
