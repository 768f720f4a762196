//! Native member accessors, one table per [`Kind`].
//!
//! A member read first consults the entity's kind table, then the table
//! shared by every kind, and only then falls through to the script member
//! table with prototype delegation. Callers cannot tell native members from
//! script-declared ones.

use lanthorn_foundation::{EntityId, Error, ErrorKind, Result, Type};
use lanthorn_language::NounPhrase;

use crate::entity::{Entity, Kind};
use crate::registry::Registry;
use crate::value::Value;

/// Reads a native member.
pub type Getter = fn(&Registry, &Entity) -> Value;

/// Writes a native member.
pub type Setter = fn(&mut Registry, EntityId, Value) -> Result<()>;

/// A native member: a getter and an optional setter.
///
/// A missing setter makes the member read-only.
#[derive(Clone, Copy)]
pub struct Accessor {
    /// Member name.
    pub name: &'static str,
    /// Reads the member.
    pub get: Getter,
    /// Writes the member, if writable.
    pub set: Option<Setter>,
}

impl std::fmt::Debug for Accessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accessor")
            .field("name", &self.name)
            .field("writable", &self.set.is_some())
            .finish()
    }
}

static COMMON: [Accessor; 9] = [
    Accessor { name: "id", get: get_id, set: None },
    Accessor { name: "kind", get: get_kind, set: Some(set_kind) },
    Accessor { name: "prototype", get: get_prototype, set: None },
    Accessor { name: "location", get: get_location, set: Some(set_location) },
    Accessor { name: "contents", get: get_contents, set: None },
    Accessor { name: "singular", get: get_singular, set: None },
    Accessor { name: "plural", get: get_plural, set: None },
    Accessor { name: "article", get: get_article, set: None },
    Accessor { name: "indefinite", get: get_indefinite, set: None },
];

static LOCATION: [Accessor; 1] = [Accessor { name: "exits", get: get_exits, set: None }];

/// The accessors specific to `kind`, excluding the shared ones.
#[must_use]
pub fn table(kind: Kind) -> &'static [Accessor] {
    match kind {
        Kind::Location => &LOCATION,
        _ => &[],
    }
}

/// Finds the native accessor for `name` on an entity of `kind`.
#[must_use]
pub fn find(kind: Kind, name: &str) -> Option<&'static Accessor> {
    table(kind)
        .iter()
        .chain(COMMON.iter())
        .find(|a| a.name == name)
}

/// Names of every native member available on `kind`.
pub fn native_names(kind: Kind) -> impl Iterator<Item = &'static str> {
    table(kind).iter().chain(COMMON.iter()).map(|a| a.name)
}

// =============================================================================
// Getters
// =============================================================================

fn get_id(_: &Registry, entity: &Entity) -> Value {
    Value::text(entity.name())
}

fn get_kind(registry: &Registry, entity: &Entity) -> Value {
    Value::Symbol(registry.kind_symbol(entity.kind()))
}

fn get_prototype(_: &Registry, entity: &Entity) -> Value {
    entity.prototype().map_or(Value::Nil, Value::Entity)
}

fn get_location(_: &Registry, entity: &Entity) -> Value {
    entity.location().map_or(Value::Nil, Value::Entity)
}

fn get_contents(_: &Registry, entity: &Entity) -> Value {
    Value::list(entity.contents().iter().copied().map(Value::Entity))
}

fn get_exits(_: &Registry, entity: &Entity) -> Value {
    Value::list(
        entity
            .exits()
            .iter()
            .map(|exit| Value::list([Value::Symbol(exit.direction), Value::Entity(exit.destination)])),
    )
}

/// The entity's noun phrase: its `name` member, or its id.
fn noun(registry: &Registry, entity: &Entity) -> NounPhrase {
    match registry.lookup_member(entity.id(), "name") {
        Some(Value::Text(text)) => NounPhrase::parse_lenient(&text),
        _ => NounPhrase::parse_lenient(entity.name()),
    }
}

fn get_singular(registry: &Registry, entity: &Entity) -> Value {
    Value::text(noun(registry, entity).singular())
}

fn get_plural(registry: &Registry, entity: &Entity) -> Value {
    Value::text(noun(registry, entity).plural())
}

fn get_article(registry: &Registry, entity: &Entity) -> Value {
    noun(registry, entity).article().map_or(Value::Nil, Value::text)
}

fn get_indefinite(registry: &Registry, entity: &Entity) -> Value {
    Value::text(noun(registry, entity).indefinite())
}

// =============================================================================
// Setters
// =============================================================================

fn set_kind(registry: &mut Registry, id: EntityId, value: Value) -> Result<()> {
    let kind = match &value {
        Value::Symbol(sym) => registry.interner().resolve(*sym).and_then(Kind::from_name),
        Value::Text(text) => Kind::from_name(text),
        other => return Err(Error::type_mismatch(Type::Symbol, other.type_of())),
    };
    let kind = kind.ok_or_else(|| {
        Error::new(ErrorKind::UndefinedSymbol(value.display(&*registry).to_string()))
    })?;
    registry.set_kind(id, kind)
}

fn set_location(registry: &mut Registry, id: EntityId, value: Value) -> Result<()> {
    match value {
        Value::Entity(dest) => registry.move_entity(id, Some(dest)),
        Value::Nil => registry.move_entity(id, None),
        other => Err(Error::type_mismatch(Type::Entity, other.type_of())),
    }
}
