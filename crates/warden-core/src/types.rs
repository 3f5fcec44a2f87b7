// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Entity model for Warden.
//!
//! Every participant in an authorization decision is an *entity*: either a
//! [`Member`] (a leaf that cannot have children, such as a user or an
//! article) or a [`Group`] (an interior node that may have both children
//! and parents, such as a role or a category).
//!
//! Permission policies are keyed by [`Subject`] (the acting side: user or
//! role) and [`Object`] (the acted-upon side: article or category).
//!
//! All identifiers serialize as `"kind:name"` strings (`user:alice`,
//! `role:admin`, `article:project apollo`, `category:war`). Names must be
//! non-empty and free of tabs and line breaks; interior spaces are allowed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

// =============================================================================
// Member
// =============================================================================

/// A leaf entity: a user (subject side) or an article (object side).
///
/// Members may join groups but can never have children of their own.
///
/// # Examples
///
/// ```
/// use warden_core::types::Member;
///
/// let alice = Member::user("alice");
/// assert_eq!(alice.to_string(), "user:alice");
/// assert_eq!(alice.name(), "alice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Member {
    /// A user, the member kind of the subject dimension.
    User(String),
    /// An article, the member kind of the object dimension.
    Article(String),
}

impl Member {
    /// Creates a user member.
    pub fn user(name: impl Into<String>) -> Self {
        Member::User(name.into())
    }

    /// Creates an article member.
    pub fn article(name: impl Into<String>) -> Self {
        Member::Article(name.into())
    }

    /// Returns the opaque name of this member.
    pub fn name(&self) -> &str {
        match self {
            Member::User(name) | Member::Article(name) => name,
        }
    }

    /// Returns the kind label used in the string form.
    pub fn kind(&self) -> &'static str {
        match self {
            Member::User(_) => "user",
            Member::Article(_) => "article",
        }
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.name())
    }
}

impl FromStr for Member {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Entity::from_str(s) {
            Ok(Entity::Member(m)) => Ok(m),
            _ => Err(ParseError::InvalidEntity(s.to_string())),
        }
    }
}

impl From<Member> for String {
    fn from(m: Member) -> String {
        m.to_string()
    }
}

impl TryFrom<String> for Member {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// =============================================================================
// Group
// =============================================================================

/// An interior entity: a role (subject side) or a category (object side).
///
/// Groups may have children (members or other groups of the same
/// dimension) and may themselves join parent groups, forming a hierarchy.
///
/// # Examples
///
/// ```
/// use warden_core::types::Group;
///
/// let admins = Group::role("admin");
/// assert_eq!(admins.to_string(), "role:admin");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Group {
    /// A role, the group kind of the subject dimension.
    Role(String),
    /// A category, the group kind of the object dimension.
    Category(String),
}

impl Group {
    /// Creates a role group.
    pub fn role(name: impl Into<String>) -> Self {
        Group::Role(name.into())
    }

    /// Creates a category group.
    pub fn category(name: impl Into<String>) -> Self {
        Group::Category(name.into())
    }

    /// Returns the opaque name of this group.
    pub fn name(&self) -> &str {
        match self {
            Group::Role(name) | Group::Category(name) => name,
        }
    }

    /// Returns the kind label used in the string form.
    pub fn kind(&self) -> &'static str {
        match self {
            Group::Role(_) => "role",
            Group::Category(_) => "category",
        }
    }

    /// Returns `true` if `child` may join this group.
    ///
    /// Grouping never crosses dimensions: users and roles join roles,
    /// articles and categories join categories.
    pub fn accepts(&self, child: &Entity) -> bool {
        match self {
            Group::Role(_) => matches!(
                child,
                Entity::Member(Member::User(_)) | Entity::Group(Group::Role(_))
            ),
            Group::Category(_) => matches!(
                child,
                Entity::Member(Member::Article(_)) | Entity::Group(Group::Category(_))
            ),
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.name())
    }
}

impl FromStr for Group {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Entity::from_str(s) {
            Ok(Entity::Group(g)) => Ok(g),
            _ => Err(ParseError::InvalidEntity(s.to_string())),
        }
    }
}

impl From<Group> for String {
    fn from(g: Group) -> String {
        g.to_string()
    }
}

impl TryFrom<String> for Group {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// =============================================================================
// Entity
// =============================================================================

/// A member or a group: anything that can take part in a grouping edge.
///
/// Grouping engines operate on entities: the child side of an edge is any
/// entity, the parent side is always a [`Group`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Entity {
    /// A leaf entity.
    Member(Member),
    /// An interior entity.
    Group(Group),
}

impl Entity {
    /// Creates a user entity.
    pub fn user(name: impl Into<String>) -> Self {
        Entity::Member(Member::user(name))
    }

    /// Creates a role entity.
    pub fn role(name: impl Into<String>) -> Self {
        Entity::Group(Group::role(name))
    }

    /// Creates an article entity.
    pub fn article(name: impl Into<String>) -> Self {
        Entity::Member(Member::article(name))
    }

    /// Creates a category entity.
    pub fn category(name: impl Into<String>) -> Self {
        Entity::Group(Group::category(name))
    }

    /// Returns `true` if this entity is a leaf.
    pub fn is_member(&self) -> bool {
        matches!(self, Entity::Member(_))
    }

    /// Returns `true` if this entity is a group.
    pub fn is_group(&self) -> bool {
        matches!(self, Entity::Group(_))
    }

    /// Returns the opaque name of this entity.
    pub fn name(&self) -> &str {
        match self {
            Entity::Member(m) => m.name(),
            Entity::Group(g) => g.name(),
        }
    }

    /// Returns the kind label used in the string form.
    pub fn kind(&self) -> &'static str {
        match self {
            Entity::Member(m) => m.kind(),
            Entity::Group(g) => g.kind(),
        }
    }

    /// Returns the inner group, if this entity is one.
    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Entity::Group(g) => Some(g),
            Entity::Member(_) => None,
        }
    }

    /// Returns the inner member, if this entity is one.
    pub fn as_member(&self) -> Option<&Member> {
        match self {
            Entity::Member(m) => Some(m),
            Entity::Group(_) => None,
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.name())
    }
}

impl FromStr for Entity {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, name) = s
            .split_once(':')
            .ok_or_else(|| ParseError::InvalidEntity(s.to_string()))?;
        validate_name(name, s)?;

        match kind {
            "user" => Ok(Entity::user(name)),
            "role" => Ok(Entity::role(name)),
            "article" => Ok(Entity::article(name)),
            "category" => Ok(Entity::category(name)),
            _ => Err(ParseError::UnknownKind {
                kind: kind.to_string(),
                input: s.to_string(),
            }),
        }
    }
}

impl From<Member> for Entity {
    fn from(m: Member) -> Self {
        Entity::Member(m)
    }
}

impl From<Group> for Entity {
    fn from(g: Group) -> Self {
        Entity::Group(g)
    }
}

impl From<Entity> for String {
    fn from(e: Entity) -> String {
        e.to_string()
    }
}

impl TryFrom<String> for Entity {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Names must be non-empty and single-line; interior spaces are fine
/// (`article:project apollo`).
fn validate_name(name: &str, input: &str) -> Result<(), ParseError> {
    if name.is_empty() {
        return Err(ParseError::EmptyName(input.to_string()));
    }
    if name.contains(['\t', '\r', '\n']) {
        return Err(ParseError::InvalidEntity(input.to_string()));
    }
    Ok(())
}

// =============================================================================
// Subject
// =============================================================================

/// The acting side of a permission policy: a user or a role.
///
/// # Examples
///
/// ```
/// use warden_core::types::Subject;
///
/// let sub: Subject = "role:admin".parse().unwrap();
/// assert_eq!(sub, Subject::role("admin"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Subject {
    /// An individual user.
    User(String),
    /// A role; permissions granted to it cover all its transitive members.
    Role(String),
}

impl Subject {
    /// Creates a user subject.
    pub fn user(name: impl Into<String>) -> Self {
        Subject::User(name.into())
    }

    /// Creates a role subject.
    pub fn role(name: impl Into<String>) -> Self {
        Subject::Role(name.into())
    }

    /// Returns the opaque name of this subject.
    pub fn name(&self) -> &str {
        match self {
            Subject::User(name) | Subject::Role(name) => name,
        }
    }

    /// Returns the kind label used in the string form.
    pub fn kind(&self) -> &'static str {
        match self {
            Subject::User(_) => "user",
            Subject::Role(_) => "role",
        }
    }

    /// Returns this subject as a grouping entity.
    pub fn to_entity(&self) -> Entity {
        match self {
            Subject::User(name) => Entity::user(name.clone()),
            Subject::Role(name) => Entity::role(name.clone()),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.name())
    }
}

impl FromStr for Subject {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Entity::from_str(s) {
            Ok(Entity::Member(Member::User(name))) => Ok(Subject::User(name)),
            Ok(Entity::Group(Group::Role(name))) => Ok(Subject::Role(name)),
            _ => Err(ParseError::InvalidSubject(s.to_string())),
        }
    }
}

impl From<Subject> for Entity {
    fn from(s: Subject) -> Self {
        s.to_entity()
    }
}

impl From<Subject> for String {
    fn from(s: Subject) -> String {
        s.to_string()
    }
}

impl TryFrom<String> for Subject {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// =============================================================================
// Object
// =============================================================================

/// The acted-upon side of a permission policy: an article or a category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Object {
    /// An individual article.
    Article(String),
    /// A category; permissions granted on it cover all its transitive members.
    Category(String),
}

impl Object {
    /// Creates an article object.
    pub fn article(name: impl Into<String>) -> Self {
        Object::Article(name.into())
    }

    /// Creates a category object.
    pub fn category(name: impl Into<String>) -> Self {
        Object::Category(name.into())
    }

    /// Returns the opaque name of this object.
    pub fn name(&self) -> &str {
        match self {
            Object::Article(name) | Object::Category(name) => name,
        }
    }

    /// Returns the kind label used in the string form.
    pub fn kind(&self) -> &'static str {
        match self {
            Object::Article(_) => "article",
            Object::Category(_) => "category",
        }
    }

    /// Returns this object as a grouping entity.
    pub fn to_entity(&self) -> Entity {
        match self {
            Object::Article(name) => Entity::article(name.clone()),
            Object::Category(name) => Entity::category(name.clone()),
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.name())
    }
}

impl FromStr for Object {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Entity::from_str(s) {
            Ok(Entity::Member(Member::Article(name))) => Ok(Object::Article(name)),
            Ok(Entity::Group(Group::Category(name))) => Ok(Object::Category(name)),
            _ => Err(ParseError::InvalidObject(s.to_string())),
        }
    }
}

impl From<Object> for Entity {
    fn from(o: Object) -> Self {
        o.to_entity()
    }
}

impl From<Object> for String {
    fn from(o: Object) -> String {
        o.to_string()
    }
}

impl TryFrom<String> for Object {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trip() {
        for s in [
            "user:alice",
            "role:admin",
            "article:project apollo",
            "category:war",
        ] {
            let entity: Entity = s.parse().expect("parse entity");
            assert_eq!(entity.to_string(), s);
        }
    }

    #[test]
    fn test_subject_parsing() {
        assert_eq!(
            "user:alice".parse::<Subject>().unwrap(),
            Subject::user("alice")
        );
        assert_eq!(
            "role:admin".parse::<Subject>().unwrap(),
            Subject::role("admin")
        );
        assert!(matches!(
            "article:x".parse::<Subject>(),
            Err(ParseError::InvalidSubject(_))
        ));
        assert!("user:".parse::<Subject>().is_err());
        assert!("alice".parse::<Subject>().is_err());
    }

    #[test]
    fn test_object_parsing() {
        assert_eq!(
            "article:project apollo".parse::<Object>().unwrap(),
            Object::article("project apollo")
        );
        assert_eq!(
            "category:war".parse::<Object>().unwrap(),
            Object::category("war")
        );
        assert!(matches!(
            "role:admin".parse::<Object>(),
            Err(ParseError::InvalidObject(_))
        ));
    }

    #[test]
    fn test_entity_rejects_malformed() {
        assert!(matches!(
            "group:ops".parse::<Entity>(),
            Err(ParseError::UnknownKind { .. })
        ));
        assert!(matches!(
            "user:".parse::<Entity>(),
            Err(ParseError::EmptyName(_))
        ));
        assert!("user:has\ttab".parse::<Entity>().is_err());
        assert!("no-colon".parse::<Entity>().is_err());
    }

    #[test]
    fn test_kind_compatibility() {
        let role = Group::role("admin");
        let category = Group::category("war");

        assert!(role.accepts(&Entity::user("alice")));
        assert!(role.accepts(&Entity::role("ops")));
        assert!(!role.accepts(&Entity::article("a")));
        assert!(!role.accepts(&Entity::category("c")));

        assert!(category.accepts(&Entity::article("a")));
        assert!(category.accepts(&Entity::category("sub")));
        assert!(!category.accepts(&Entity::user("alice")));
    }

    #[test]
    fn test_subject_object_to_entity() {
        assert_eq!(Subject::user("u").to_entity(), Entity::user("u"));
        assert_eq!(Subject::role("r").to_entity(), Entity::role("r"));
        assert_eq!(Object::article("a").to_entity(), Entity::article("a"));
        assert_eq!(Object::category("c").to_entity(), Entity::category("c"));
    }

    #[test]
    fn test_serde_string_form() {
        let sub = Subject::role("admin");
        let json = serde_json::to_string(&sub).unwrap();
        assert_eq!(json, "\"role:admin\"");

        let back: Subject = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sub);

        assert!(serde_json::from_str::<Subject>("\"category:war\"").is_err());
    }
}
