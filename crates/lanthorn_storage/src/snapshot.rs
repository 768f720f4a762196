//! Plain-data snapshots of the registry.
//!
//! A snapshot names everything by identifier rather than by [`EntityId`], so
//! it stays meaningful outside the process that produced it. The storage
//! format is up to the caller; with the `serde` feature every type here
//! derives `Serialize` and `Deserialize`.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::registry::Registry;
use crate::value::Value;

/// A member value with entity references replaced by identifiers.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SnapshotValue {
    /// `nil`
    Nil,
    /// Boolean.
    Bool(bool),
    /// Number.
    Number(f64),
    /// Text.
    Text(String),
    /// Symbol, by name.
    Symbol(String),
    /// List.
    List(Vec<SnapshotValue>),
    /// A closure; only its name survives.
    Closure(String),
    /// Entity reference, by identifier. `None` if it no longer resolves.
    Entity(Option<String>),
}

impl SnapshotValue {
    /// Converts a live value.
    #[must_use]
    pub fn capture(value: &Value, registry: &Registry) -> Self {
        match value {
            Value::Nil => Self::Nil,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(*n),
            Value::Text(s) => Self::Text(s.to_string()),
            Value::Symbol(sym) => Self::Symbol(
                registry
                    .interner()
                    .resolve(*sym)
                    .map_or_else(|| format!("#{}", sym.index()), str::to_string),
            ),
            Value::List(items) => Self::List(items.iter().map(|v| Self::capture(v, registry)).collect()),
            Value::Closure(c) => Self::Closure(c.name().to_string()),
            Value::Entity(id) => Self::Entity(registry.get(*id).map(|e| e.name().to_string())),
        }
    }
}

/// One entity's state.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntitySnapshot {
    /// Identifier.
    pub id: String,
    /// Kind name.
    pub kind: String,
    /// Prototype identifier.
    pub prototype: Option<String>,
    /// Container identifier.
    pub location: Option<String>,
    /// Own members only; inherited values live on the prototype's snapshot.
    pub members: BTreeMap<String, SnapshotValue>,
    /// `(direction, destination)` pairs.
    pub exits: Vec<(String, String)>,
    /// Expiry tick.
    pub expires_at: Option<u64>,
}

/// Every entity at one tick.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldSnapshot {
    /// The tick the snapshot was taken at.
    pub tick: u64,
    /// Entities in slot order.
    pub entities: Vec<EntitySnapshot>,
}

impl WorldSnapshot {
    /// Captures every live entity in `registry`.
    #[must_use]
    pub fn capture(registry: &Registry, tick: u64) -> Self {
        let entities = registry
            .iter()
            .map(|entity| EntitySnapshot {
                id: entity.name().to_string(),
                kind: entity.kind().name().to_string(),
                prototype: entity.prototype().map(|p| registry.name_of(p)),
                location: entity.location().map(|l| registry.name_of(l)),
                members: entity
                    .members()
                    .iter()
                    .map(|(k, v)| (k.to_string(), SnapshotValue::capture(v, registry)))
                    .collect(),
                exits: entity
                    .exits()
                    .iter()
                    .map(|exit| {
                        let dir = registry
                            .interner()
                            .resolve(exit.direction)
                            .unwrap_or("?")
                            .to_string();
                        (dir, registry.name_of(exit.destination))
                    })
                    .collect(),
                expires_at: entity.expires_at(),
            })
            .collect();
        Self { tick, entities }
    }

    /// Finds an entity by identifier.
    #[must_use]
    pub fn entity(&self, id: &str) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|e| e.id == id)
    }
}
