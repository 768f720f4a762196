//! The entity registry.
//!
//! Entities live in generational slots: removing one bumps its slot's
//! generation, so every outstanding [`EntityId`] for it stops resolving
//! instead of aliasing whatever reuses the slot. The registry also owns the
//! symbol interner, since native accessors and value display need both.

#![allow(clippy::cast_possible_truncation)]

use std::collections::HashMap;
use std::sync::Arc;

use lanthorn_foundation::{EntityId, Error, ErrorKind, Interner, Result, SymbolId};
use lanthorn_language::{Handler, HandlerKind};

use crate::accessor;
use crate::entity::{Entity, Exit, Kind};
use crate::value::Value;

#[derive(Clone, Debug)]
struct Slot {
    /// Odd generations are live, even generations are free.
    generation: u32,
    entity: Option<Entity>,
}

/// Identity-keyed storage for every entity in a world.
#[derive(Clone, Debug)]
pub struct Registry {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    names: HashMap<Arc<str>, EntityId>,
    interner: Interner,
    kind_symbols: [SymbolId; 13],
    spawn_counters: HashMap<EntityId, u32>,
    live_count: usize,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates an empty registry with kind names pre-interned.
    #[must_use]
    pub fn new() -> Self {
        let mut interner = Interner::new();
        let kind_symbols = Kind::ALL.map(|k| interner.intern(k.name()));
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            names: HashMap::new(),
            interner,
            kind_symbols,
            spawn_counters: HashMap::new(),
            live_count: 0,
        }
    }

    // =========================================================================
    // Symbols
    // =========================================================================

    /// The symbol interner.
    #[must_use]
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// The symbol interner, mutably.
    pub fn interner_mut(&mut self) -> &mut Interner {
        &mut self.interner
    }

    /// Interns `name`.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        self.interner.intern(name)
    }

    /// The symbol naming `kind`.
    #[must_use]
    pub fn kind_symbol(&self, kind: Kind) -> SymbolId {
        self.kind_symbols[kind as usize]
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Registers a new entity under `name`.
    ///
    /// # Errors
    /// Returns `DuplicateIdentifier` if the name is taken, or `EntityNotFound`
    /// if `prototype` does not resolve.
    pub fn insert(&mut self, name: &str, kind: Kind, prototype: Option<EntityId>) -> Result<EntityId> {
        if self.names.contains_key(name) {
            return Err(Error::new(ErrorKind::DuplicateIdentifier(name.to_string())));
        }
        if let Some(proto) = prototype {
            self.validate(proto)?;
        }

        let id = self.allocate();
        let name: Arc<str> = Arc::from(name);
        self.names.insert(name.clone(), id);
        if let Some(slot) = self.slots.get_mut(id.slot()) {
            slot.entity = Some(Entity::new(id, name, kind, prototype));
        }
        Ok(id)
    }

    fn allocate(&mut self) -> EntityId {
        self.live_count += 1;
        if let Some(index) = self.free_list.pop() {
            if let Some(slot) = self.slots.get_mut(index as usize) {
                slot.generation += 1;
                return EntityId::new(index, slot.generation);
            }
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 1,
            entity: None,
        });
        EntityId::new(index, 1)
    }

    /// Creates an instance of `prototype`, optionally placed in `location`.
    ///
    /// The instance is named `<prototype>#<n>` and starts with an empty
    /// member table, inheriting everything through its prototype.
    ///
    /// # Errors
    /// Returns `EntityNotFound` if either entity does not resolve.
    pub fn spawn(&mut self, prototype: EntityId, location: Option<EntityId>) -> Result<EntityId> {
        let proto = self.entity(prototype)?;
        let kind = proto.kind();
        let base = proto.name().to_string();

        let name = loop {
            let counter = self.spawn_counters.entry(prototype).or_insert(0);
            *counter += 1;
            let candidate = format!("{base}#{counter}");
            if !self.names.contains_key(candidate.as_str()) {
                break candidate;
            }
        };

        let id = self.insert(&name, kind, Some(prototype))?;
        if let Some(dest) = location {
            self.move_entity(id, Some(dest))?;
        }
        Ok(id)
    }

    /// Removes an entity and everything it contains.
    ///
    /// Returns the removed records, the entity itself first and then its
    /// contents depth-first. Exits leading to a removed entity are dropped.
    ///
    /// # Errors
    /// Returns `EntityNotFound` if `id` does not resolve.
    pub fn remove(&mut self, id: EntityId) -> Result<Vec<Entity>> {
        self.move_entity(id, None)?;

        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(slot) = self.slots.get_mut(next.slot()) else {
                continue;
            };
            if slot.generation != next.generation {
                continue;
            }
            let Some(entity) = slot.entity.take() else {
                continue;
            };
            slot.generation += 1;
            self.free_list.push(next.index);
            self.live_count -= 1;
            self.names.remove(entity.name());
            self.spawn_counters.remove(&next);
            stack.extend(entity.contents.iter().rev().copied());
            removed.push(entity);
        }

        let gone: Vec<EntityId> = removed.iter().map(Entity::id).collect();
        for slot in &mut self.slots {
            if let Some(entity) = slot.entity.as_mut() {
                entity.exits.retain(|exit| !gone.contains(&exit.destination));
            }
        }
        Ok(removed)
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Returns true if `id` resolves to a live entity.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.get(id).is_some()
    }

    /// Checks that `id` resolves.
    ///
    /// # Errors
    /// Returns `EntityNotFound` for stale or unknown ids.
    pub fn validate(&self, id: EntityId) -> Result<()> {
        self.entity(id).map(|_| ())
    }

    /// The entity for `id`, if it is live.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.slots
            .get(id.slot())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entity.as_ref())
    }

    fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.slots
            .get_mut(id.slot())
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entity.as_mut())
    }

    /// The entity for `id`.
    ///
    /// # Errors
    /// Returns `EntityNotFound` for stale or unknown ids.
    pub fn entity(&self, id: EntityId) -> Result<&Entity> {
        self.get(id).ok_or_else(|| Error::entity_not_found(id))
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.get_mut(id).ok_or_else(|| Error::entity_not_found(id))
    }

    /// Resolves an identifier.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<EntityId> {
        self.names.get(name).copied()
    }

    /// The identifier of `id`, or its debug form if it no longer resolves.
    #[must_use]
    pub fn name_of(&self, id: EntityId) -> String {
        self.get(id).map_or_else(|| format!("{id}"), |e| e.name().to_string())
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live_count
    }

    /// Returns true if the registry holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Iterates over live entities in slot order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.slots.iter().filter_map(|slot| slot.entity.as_ref())
    }

    /// Live entity ids in slot order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.iter().map(Entity::id).collect()
    }

    // =========================================================================
    // Prototypes
    // =========================================================================

    /// Sets the prototype of `id`.
    ///
    /// # Errors
    /// Returns `CyclicPrototype` if `id` would become its own ancestor.
    pub fn set_prototype(&mut self, id: EntityId, prototype: Option<EntityId>) -> Result<()> {
        self.validate(id)?;
        if let Some(proto) = prototype {
            self.validate(proto)?;
            let ancestors = self.prototype_chain(proto);
            if let Some(pos) = ancestors.iter().position(|&a| a == id) {
                let mut cycle: Vec<String> = std::iter::once(id)
                    .chain(ancestors[..pos].iter().copied())
                    .map(|e| self.name_of(e))
                    .collect();
                cycle.push(self.name_of(id));
                return Err(Error::new(ErrorKind::CyclicPrototype { cycle }));
            }
        }
        self.entity_mut(id)?.prototype = prototype;
        Ok(())
    }

    /// The entity and its ancestors, nearest first.
    ///
    /// Stops at the first prototype that no longer resolves.
    #[must_use]
    pub fn prototype_chain(&self, id: EntityId) -> Vec<EntityId> {
        let mut chain = Vec::new();
        let mut current = self.get(id);
        while let Some(entity) = current {
            if chain.contains(&entity.id()) {
                break;
            }
            chain.push(entity.id());
            current = entity.prototype().and_then(|p| self.get(p));
        }
        chain
    }

    /// True if `ancestor` is `id` or one of its prototypes.
    #[must_use]
    pub fn is_a(&self, id: EntityId, ancestor: EntityId) -> bool {
        self.prototype_chain(id).contains(&ancestor)
    }

    /// Changes the kind tag.
    ///
    /// # Errors
    /// Returns `EntityNotFound` if `id` does not resolve.
    pub fn set_kind(&mut self, id: EntityId, kind: Kind) -> Result<()> {
        self.entity_mut(id)?.kind = kind;
        Ok(())
    }

    // =========================================================================
    // Members
    // =========================================================================

    /// Reads a member: native accessor, then own table, then prototypes.
    ///
    /// An unresolved name reads as `nil`.
    ///
    /// # Errors
    /// Returns `EntityNotFound` if `id` does not resolve.
    pub fn get_member(&self, id: EntityId, name: &str) -> Result<Value> {
        let entity = self.entity(id)?;
        if let Some(native) = accessor::find(entity.kind(), name) {
            return Ok((native.get)(self, entity));
        }
        Ok(self.lookup_member(id, name).unwrap_or(Value::Nil))
    }

    /// Reads a script member through the prototype chain, skipping native
    /// accessors. `None` if no entity in the chain defines it.
    #[must_use]
    pub fn lookup_member(&self, id: EntityId, name: &str) -> Option<Value> {
        self.member_owner(id, name)
            .and_then(|owner| self.get(owner))
            .and_then(|e| e.own_member(name).cloned())
    }

    /// The nearest entity in the chain whose own table defines `name`.
    #[must_use]
    pub fn member_owner(&self, id: EntityId, name: &str) -> Option<EntityId> {
        self.prototype_chain(id)
            .into_iter()
            .find(|&e| self.get(e).is_some_and(|e| e.own_member(name).is_some()))
    }

    /// True if `name` is native or defined anywhere in the chain.
    #[must_use]
    pub fn has_member(&self, id: EntityId, name: &str) -> bool {
        self.get(id).is_some_and(|e| accessor::find(e.kind(), name).is_some())
            || self.member_owner(id, name).is_some()
    }

    /// Writes a member.
    ///
    /// Native members go through their setter. Script members are always
    /// written to the entity's own table; prototypes are never modified
    /// through an instance.
    ///
    /// # Errors
    /// Returns `ReadOnlyMember` for native members without a setter, or the
    /// setter's error.
    pub fn set_member(&mut self, id: EntityId, name: &str, value: Value) -> Result<()> {
        let kind = self.entity(id)?.kind();
        if let Some(native) = accessor::find(kind, name) {
            let Some(set) = native.set else {
                return Err(Error::new(ErrorKind::ReadOnlyMember {
                    member: name.to_string(),
                }));
            };
            return set(self, id, value);
        }
        let entity = self.entity_mut(id)?;
        entity.members.insert(Arc::from(name), value);
        Ok(())
    }

    /// Removes a member from the entity's own table, uncovering any
    /// inherited value.
    ///
    /// # Errors
    /// Returns `EntityNotFound` if `id` does not resolve.
    pub fn clear_member(&mut self, id: EntityId, name: &str) -> Result<Option<Value>> {
        Ok(self.entity_mut(id)?.members.remove(name))
    }

    // =========================================================================
    // Handlers
    // =========================================================================

    /// Appends a handler to the entity's own table.
    ///
    /// # Errors
    /// Returns `EntityNotFound` if `id` does not resolve.
    pub fn add_handler(&mut self, id: EntityId, handler: Arc<Handler>) -> Result<()> {
        let entity = self.entity_mut(id)?;
        entity
            .handlers
            .entry(handler.event.clone())
            .or_default()
            .push(handler);
        Ok(())
    }

    /// Handlers of `kind` for `event` along the prototype chain of `id`,
    /// nearest first, each paired with the entity that declares it.
    #[must_use]
    pub fn handler_chain(&self, id: EntityId, event: &str, kind: HandlerKind) -> Vec<(EntityId, Arc<Handler>)> {
        self.prototype_chain(id)
            .into_iter()
            .filter_map(|e| self.get(e))
            .flat_map(|e| e.handlers_for(event, kind).map(move |h| (e.id(), h.clone())))
            .collect()
    }

    // =========================================================================
    // Containment
    // =========================================================================

    /// Moves `id` into `destination`, or out of any container for `None`.
    ///
    /// Moving an entity to where it already is leaves its position unchanged.
    ///
    /// # Errors
    /// Returns `InvalidMove` if `destination` is `id` or inside it, or
    /// `EntityNotFound` if either does not resolve.
    pub fn move_entity(&mut self, id: EntityId, destination: Option<EntityId>) -> Result<()> {
        let current = self.entity(id)?.location();
        if current == destination {
            return Ok(());
        }
        if let Some(dest) = destination {
            self.validate(dest)?;
            if self.encloses(id, dest) {
                return Err(Error::new(ErrorKind::InvalidMove {
                    entity: self.name_of(id),
                    destination: self.name_of(dest),
                }));
            }
        }

        if let Some(old) = current {
            if let Some(container) = self.get_mut(old) {
                container.contents.retain(|&c| c != id);
            }
        }
        if let Some(dest) = destination {
            self.entity_mut(dest)?.contents.push(id);
        }
        self.entity_mut(id)?.location = destination;
        Ok(())
    }

    /// True if `inner` is `outer` or (transitively) inside it.
    #[must_use]
    pub fn encloses(&self, outer: EntityId, inner: EntityId) -> bool {
        let mut current = Some(inner);
        let mut steps = 0;
        while let Some(e) = current {
            if e == outer {
                return true;
            }
            steps += 1;
            if steps > self.slots.len() {
                return false;
            }
            current = self.get(e).and_then(Entity::location);
        }
        false
    }

    // =========================================================================
    // Exits
    // =========================================================================

    /// Adds an exit, replacing any exit already leading in `direction`.
    ///
    /// Returns false if the identical exit already existed.
    ///
    /// # Errors
    /// Returns `EntityNotFound` if either entity does not resolve.
    pub fn add_exit(&mut self, from: EntityId, direction: SymbolId, destination: EntityId) -> Result<bool> {
        self.validate(destination)?;
        let entity = self.entity_mut(from)?;
        if let Some(exit) = entity.exits.iter_mut().find(|e| e.direction == direction) {
            if exit.destination == destination {
                return Ok(false);
            }
            exit.destination = destination;
            return Ok(true);
        }
        entity.exits.push(Exit {
            direction,
            destination,
        });
        Ok(true)
    }

    /// Removes the exit leading in `direction`, if it goes to `destination`
    /// (or anywhere, for `None`). Returns the removed exit.
    ///
    /// # Errors
    /// Returns `EntityNotFound` if `from` does not resolve.
    pub fn remove_exit(
        &mut self,
        from: EntityId,
        direction: SymbolId,
        destination: Option<EntityId>,
    ) -> Result<Option<Exit>> {
        let entity = self.entity_mut(from)?;
        let position = entity
            .exits
            .iter()
            .position(|e| e.direction == direction && destination.is_none_or(|d| d == e.destination));
        Ok(position.map(|i| entity.exits.remove(i)))
    }

    /// Where the exit in `direction` leads, if there is one.
    #[must_use]
    pub fn exit(&self, from: EntityId, direction: SymbolId) -> Option<EntityId> {
        self.get(from)?
            .exits()
            .iter()
            .find(|e| e.direction == direction)
            .map(|e| e.destination)
            .filter(|&d| self.contains(d))
    }

    // =========================================================================
    // Lifetimes
    // =========================================================================

    /// Sets or clears the tick at which `id` expires.
    ///
    /// # Errors
    /// Returns `EntityNotFound` if `id` does not resolve.
    pub fn set_expiry(&mut self, id: EntityId, tick: Option<u64>) -> Result<()> {
        self.entity_mut(id)?.expires_at = tick;
        Ok(())
    }

    /// Entities whose lifetime ends at or before `tick`, in slot order.
    #[must_use]
    pub fn expired(&self, tick: u64) -> Vec<EntityId> {
        self.iter()
            .filter(|e| e.expires_at().is_some_and(|t| t <= tick))
            .map(Entity::id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> (Registry, EntityId, EntityId) {
        let mut r = Registry::new();
        let proto = r.insert("lamp", Kind::Item, None).unwrap();
        let inst = r.insert("brass_lamp", Kind::Item, Some(proto)).unwrap();
        (r, proto, inst)
    }

    #[test]
    fn duplicate_names_rejected() {
        let (mut r, _, _) = world();
        let err = r.insert("lamp", Kind::Thing, None).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::DuplicateIdentifier(ref n) if n == "lamp"));
    }

    #[test]
    fn member_reads_delegate_to_prototype() {
        let (mut r, proto, inst) = world();
        r.set_member(proto, "light", Value::from(3i64)).unwrap();
        assert_eq!(r.get_member(inst, "light").unwrap(), r.get_member(proto, "light").unwrap());
        assert_eq!(r.member_owner(inst, "light"), Some(proto));
        assert_eq!(r.get_member(inst, "missing").unwrap(), Value::Nil);
    }

    #[test]
    fn writes_never_touch_prototype() {
        let (mut r, proto, inst) = world();
        r.set_member(proto, "light", Value::from(3i64)).unwrap();
        r.set_member(inst, "light", Value::from(9i64)).unwrap();
        assert_eq!(r.get_member(proto, "light").unwrap(), Value::from(3i64));
        assert_eq!(r.get_member(inst, "light").unwrap(), Value::from(9i64));

        r.clear_member(inst, "light").unwrap();
        assert_eq!(r.get_member(inst, "light").unwrap(), Value::from(3i64));
    }

    #[test]
    fn read_only_native_member() {
        let (mut r, _, inst) = world();
        let err = r.set_member(inst, "id", Value::text("x")).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ReadOnlyMember { .. }));
        assert_eq!(r.get_member(inst, "id").unwrap(), Value::text("brass_lamp"));
        assert_eq!(r.get_member(inst, "prototype").unwrap(), Value::Entity(r.lookup("lamp").unwrap()));
    }

    #[test]
    fn prototype_cycle_detected() {
        let mut r = Registry::new();
        let a = r.insert("a", Kind::Thing, None).unwrap();
        let b = r.insert("b", Kind::Thing, Some(a)).unwrap();
        let err = r.set_prototype(a, Some(b)).unwrap_err();
        match err.kind {
            ErrorKind::CyclicPrototype { cycle } => assert_eq!(cycle, ["a", "b", "a"]),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(r.entity(a).unwrap().prototype(), None);

        let err = r.set_prototype(a, Some(a)).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::CyclicPrototype { .. }));
    }

    #[test]
    fn chain_and_is_a() {
        let (mut r, proto, inst) = world();
        let child = r.spawn(inst, None).unwrap();
        assert_eq!(r.prototype_chain(child), vec![child, inst, proto]);
        assert!(r.is_a(child, proto));
        assert!(!r.is_a(proto, child));
    }

    #[test]
    fn spawn_names_and_kind() {
        let (mut r, proto, _) = world();
        let hall = r.insert("hall", Kind::Location, None).unwrap();
        let a = r.spawn(proto, Some(hall)).unwrap();
        let b = r.spawn(proto, Some(hall)).unwrap();
        assert_eq!(r.entity(a).unwrap().name(), "lamp#1");
        assert_eq!(r.entity(b).unwrap().name(), "lamp#2");
        assert_eq!(r.entity(a).unwrap().kind(), Kind::Item);
        assert_eq!(r.entity(hall).unwrap().contents(), &[a, b]);
    }

    #[test]
    fn containment_stays_consistent() {
        let mut r = Registry::new();
        let hall = r.insert("hall", Kind::Location, None).unwrap();
        let cellar = r.insert("cellar", Kind::Location, None).unwrap();
        let chest = r.insert("chest", Kind::Thing, None).unwrap();
        r.move_entity(chest, Some(hall)).unwrap();
        r.move_entity(chest, Some(cellar)).unwrap();
        assert!(r.entity(hall).unwrap().contents().is_empty());
        assert_eq!(r.entity(cellar).unwrap().contents(), &[chest]);
        assert_eq!(r.entity(chest).unwrap().location(), Some(cellar));
    }

    #[test]
    fn cannot_move_into_self_or_contents() {
        let mut r = Registry::new();
        let bag = r.insert("bag", Kind::Thing, None).unwrap();
        let pouch = r.insert("pouch", Kind::Thing, None).unwrap();
        r.move_entity(pouch, Some(bag)).unwrap();
        assert!(matches!(
            r.move_entity(bag, Some(bag)).unwrap_err().kind,
            ErrorKind::InvalidMove { .. }
        ));
        assert!(matches!(
            r.move_entity(bag, Some(pouch)).unwrap_err().kind,
            ErrorKind::InvalidMove { .. }
        ));
    }

    #[test]
    fn removal_is_recursive_and_ids_go_stale() {
        let mut r = Registry::new();
        let hall = r.insert("hall", Kind::Location, None).unwrap();
        let bag = r.insert("bag", Kind::Thing, None).unwrap();
        let coin = r.insert("coin", Kind::Item, None).unwrap();
        r.move_entity(bag, Some(hall)).unwrap();
        r.move_entity(coin, Some(bag)).unwrap();

        let removed: Vec<EntityId> = r.remove(bag).unwrap().iter().map(Entity::id).collect();
        assert_eq!(removed, vec![bag, coin]);
        assert!(!r.contains(bag));
        assert!(!r.contains(coin));
        assert!(r.entity(hall).unwrap().contents().is_empty());
        assert_eq!(r.lookup("bag"), None);
        assert_eq!(r.len(), 1);

        // The freed slot is reused under a new generation.
        let fresh = r.insert("gem", Kind::Item, None).unwrap();
        assert_ne!(fresh, coin);
        assert!(!r.contains(coin));
    }

    #[test]
    fn exits_replace_by_direction() {
        let mut r = Registry::new();
        let a = r.insert("a", Kind::Location, None).unwrap();
        let b = r.insert("b", Kind::Location, None).unwrap();
        let c = r.insert("c", Kind::Location, None).unwrap();
        let east = r.intern("east");

        assert!(r.add_exit(a, east, b).unwrap());
        assert!(!r.add_exit(a, east, b).unwrap());
        assert_eq!(r.exit(a, east), Some(b));
        assert!(r.add_exit(a, east, c).unwrap());
        assert_eq!(r.entity(a).unwrap().exits().len(), 1);

        assert!(r.remove_exit(a, east, Some(b)).unwrap().is_none());
        assert!(r.remove_exit(a, east, Some(c)).unwrap().is_some());
        assert_eq!(r.exit(a, east), None);
    }

    #[test]
    fn exits_to_removed_locations_are_dropped() {
        let mut r = Registry::new();
        let a = r.insert("a", Kind::Location, None).unwrap();
        let b = r.insert("b", Kind::Location, None).unwrap();
        let east = r.intern("east");
        r.add_exit(a, east, b).unwrap();
        r.remove(b).unwrap();
        assert!(r.entity(a).unwrap().exits().is_empty());
    }

    #[test]
    fn expiry() {
        let (mut r, proto, inst) = world();
        r.set_expiry(inst, Some(5)).unwrap();
        assert!(r.expired(4).is_empty());
        assert_eq!(r.expired(5), vec![inst]);
        r.set_expiry(inst, None).unwrap();
        assert!(r.expired(10).is_empty());
        assert!(r.contains(proto));
    }
}
