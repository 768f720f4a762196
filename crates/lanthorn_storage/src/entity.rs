//! Entity records and kind tags.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use im::OrdMap;
use lanthorn_foundation::{EntityId, SymbolId};
use lanthorn_language::{DeclKind, Handler, HandlerKind};

use crate::value::Value;

/// The capability tag of an entity.
///
/// The kind selects the native accessor table; everything else about an
/// entity lives in its member table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    /// Anything without a more specific capability.
    Thing,
    /// A doorway or passage.
    Portal,
    /// A place that holds contents and exits.
    Location,
    /// A group of locations.
    Region,
    /// A portable object.
    Item,
    /// A wearable or wieldable object.
    Equipment,
    /// A fixed object in a location.
    Fixture,
    /// A non-player character.
    Creature,
    /// A player character.
    Avatar,
    /// A named event declaration.
    Event,
    /// A verb mapping.
    Command,
    /// A quest definition.
    Quest,
    /// A skill definition.
    Skill,
}

impl Kind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 13] = [
        Self::Thing,
        Self::Portal,
        Self::Location,
        Self::Region,
        Self::Item,
        Self::Equipment,
        Self::Fixture,
        Self::Creature,
        Self::Avatar,
        Self::Event,
        Self::Command,
        Self::Quest,
        Self::Skill,
    ];

    /// The lowercase name used by the `kind` member.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Thing => "thing",
            Self::Portal => "portal",
            Self::Location => "location",
            Self::Region => "region",
            Self::Item => "item",
            Self::Equipment => "equipment",
            Self::Fixture => "fixture",
            Self::Creature => "creature",
            Self::Avatar => "avatar",
            Self::Event => "event",
            Self::Command => "command",
            Self::Quest => "quest",
            Self::Skill => "skill",
        }
    }

    /// Parses a kind name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// The kind a declaration starts with.
    ///
    /// `entity` declarations return `None`: they inherit their prototype's
    /// kind, or are a [`Kind::Thing`] without one.
    #[must_use]
    pub const fn from_declaration(kind: DeclKind) -> Option<Self> {
        match kind {
            DeclKind::Entity => None,
            DeclKind::Location => Some(Self::Location),
            DeclKind::Region => Some(Self::Region),
            DeclKind::Event => Some(Self::Event),
            DeclKind::Command => Some(Self::Command),
            DeclKind::Quest => Some(Self::Quest),
            DeclKind::Skill => Some(Self::Skill),
        }
    }

    /// True for kinds whose contents a player can see and take from.
    #[must_use]
    pub const fn is_container(self) -> bool {
        matches!(self, Self::Location | Self::Creature | Self::Avatar | Self::Thing)
    }

    /// True for kinds a player may pick up.
    #[must_use]
    pub const fn is_portable(self) -> bool {
        matches!(self, Self::Item | Self::Equipment | Self::Thing)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One directed exit from a location.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Exit {
    /// Direction atom (`north`, `up`, ...).
    pub direction: SymbolId,
    /// Where the exit leads.
    pub destination: EntityId,
}

/// A world object.
///
/// The registry owns every entity. Containment is kept consistent by the
/// registry, so `location` and `contents` are only readable here.
#[derive(Clone, Debug)]
pub struct Entity {
    id: EntityId,
    name: Arc<str>,
    pub(crate) kind: Kind,
    pub(crate) prototype: Option<EntityId>,
    pub(crate) members: OrdMap<Arc<str>, Value>,
    pub(crate) handlers: BTreeMap<String, Vec<Arc<Handler>>>,
    pub(crate) location: Option<EntityId>,
    pub(crate) contents: Vec<EntityId>,
    pub(crate) exits: Vec<Exit>,
    pub(crate) expires_at: Option<u64>,
}

impl Entity {
    pub(crate) fn new(id: EntityId, name: Arc<str>, kind: Kind, prototype: Option<EntityId>) -> Self {
        Self {
            id,
            name,
            kind,
            prototype,
            members: OrdMap::new(),
            handlers: BTreeMap::new(),
            location: None,
            contents: Vec::new(),
            exits: Vec::new(),
            expires_at: None,
        }
    }

    /// The entity's identity.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// The declared (or spawned) identifier.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The capability tag.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// The prototype, if any.
    #[must_use]
    pub fn prototype(&self) -> Option<EntityId> {
        self.prototype
    }

    /// The containing entity, if any.
    #[must_use]
    pub fn location(&self) -> Option<EntityId> {
        self.location
    }

    /// Directly contained entities, in arrival order.
    #[must_use]
    pub fn contents(&self) -> &[EntityId] {
        &self.contents
    }

    /// Exits, in the order they were added.
    #[must_use]
    pub fn exits(&self) -> &[Exit] {
        &self.exits
    }

    /// The tick at which this entity is removed, if it has a bounded lifetime.
    #[must_use]
    pub fn expires_at(&self) -> Option<u64> {
        self.expires_at
    }

    /// The entity's own member table, without prototype delegation.
    #[must_use]
    pub fn members(&self) -> &OrdMap<Arc<str>, Value> {
        &self.members
    }

    /// Reads an own member.
    #[must_use]
    pub fn own_member(&self, name: &str) -> Option<&Value> {
        self.members.get(name)
    }

    /// Own handlers of `kind` for `event`, in declaration order.
    pub fn handlers_for(&self, event: &str, kind: HandlerKind) -> impl Iterator<Item = &Arc<Handler>> {
        self.handlers
            .get(event)
            .into_iter()
            .flatten()
            .filter(move |h| h.kind == kind)
    }

    /// True if the entity declares any handler for `event`.
    #[must_use]
    pub fn handles(&self, event: &str) -> bool {
        self.handlers.get(event).is_some_and(|hs| !hs.is_empty())
    }

    /// Names of events this entity declares handlers for.
    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    /// Number of own handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }
}
