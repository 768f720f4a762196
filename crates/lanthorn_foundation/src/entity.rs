//! Entity identifiers.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identity of an entity in the registry.
///
/// An `EntityId` does not own anything: the registry owns the entity, and
/// once the entity is removed its id stops resolving. Slots are reused, so
/// each reuse bumps `generation` and old ids never alias a newer entity.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityId {
    /// Registry slot.
    pub index: u32,
    /// How many times the slot had been reused when this id was issued.
    pub generation: u32,
}

impl EntityId {
    /// An id for `slot` at `generation`.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The slot as a storage offset.
    #[must_use]
    pub const fn slot(self) -> usize {
        self.index as usize
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({}v{})", self.index, self.generation)
    }
}

/// `@3` for a first-generation slot, `@3.2` once the slot has been reused.
impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.generation {
            0 => write!(f, "@{}", self.index),
            g => write!(f, "@{}.{g}", self.index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_distinguish_reused_slots() {
        let first = EntityId::new(4, 0);
        let reused = EntityId::new(4, 1);
        assert_ne!(first, reused);
        assert_eq!(first.slot(), reused.slot());
        assert!(first < reused);
    }

    #[test]
    fn formatting() {
        assert_eq!(format!("{:?}", EntityId::new(42, 3)), "EntityId(42v3)");
        assert_eq!(EntityId::new(7, 0).to_string(), "@7");
        assert_eq!(EntityId::new(7, 2).to_string(), "@7.2");
    }
}
