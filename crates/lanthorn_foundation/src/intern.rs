//! String interning for symbol atoms.
//!
//! Symbol literals (`#north`, `#cancel`) are interned so that equality is a
//! single integer comparison and repeated atoms share storage.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Interned symbol identifier.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SymbolId(pub(crate) u32);

impl SymbolId {
    /// Returns the raw index of this symbol.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    // =========================================================================
    // Reserved Symbols
    // =========================================================================
    // These are always interned at startup with fixed indices.

    /// Control value returned by a `before` handler to suppress the default action: `#cancel`
    pub const CANCEL: SymbolId = SymbolId(0);

    /// Control value that suppresses the default action and all `after` handlers: `#halt`
    pub const HALT: SymbolId = SymbolId(1);
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolId({})", self.0)
    }
}

/// Interner for symbol atoms.
///
/// Not thread-safe; the World that owns it is driven from a single loop.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Interner {
    /// Symbol storage, indexed by `SymbolId`.
    strings: Vec<Arc<str>>,
    /// Map from symbol text to `SymbolId`.
    symbol_map: HashMap<Arc<str>, SymbolId>,
}

impl Interner {
    /// Reserved symbols that are pre-interned at startup.
    const RESERVED_SYMBOLS: &'static [&'static str] = &[
        "cancel", // SymbolId(0) = CANCEL
        "halt",   // SymbolId(1) = HALT
    ];

    /// Creates a new interner with reserved symbols pre-interned.
    #[must_use]
    pub fn new() -> Self {
        let mut interner = Self::default();

        for (i, &sym) in Self::RESERVED_SYMBOLS.iter().enumerate() {
            let id = interner.intern(sym);
            debug_assert_eq!(
                id.0 as usize, i,
                "Reserved symbol '{sym}' should have index {i}, got {}",
                id.0
            );
        }

        interner
    }

    /// Interns a symbol, returning its [`SymbolId`].
    ///
    /// # Panics
    ///
    /// Panics if the number of interned symbols exceeds `u32::MAX`.
    pub fn intern(&mut self, s: &str) -> SymbolId {
        if let Some(&id) = self.symbol_map.get(s) {
            return id;
        }

        let idx = u32::try_from(self.strings.len()).expect("too many interned symbols");
        let arc: Arc<str> = s.into();
        self.strings.push(arc.clone());
        let id = SymbolId(idx);
        self.symbol_map.insert(arc, id);
        id
    }

    /// Looks up a symbol without interning it.
    #[must_use]
    pub fn lookup(&self, s: &str) -> Option<SymbolId> {
        self.symbol_map.get(s).copied()
    }

    /// Gets the text for a symbol.
    #[must_use]
    pub fn resolve(&self, id: SymbolId) -> Option<&str> {
        self.strings.get(id.0 as usize).map(AsRef::as_ref)
    }

    /// Returns the number of interned symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Returns true if nothing has been interned (never true after `new`).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn interning_is_idempotent(words in proptest::collection::vec("[a-z]{1,8}", 1..20)) {
            let mut interner = Interner::new();
            let first: Vec<SymbolId> = words.iter().map(|w| interner.intern(w)).collect();
            let len = interner.len();
            let again: Vec<SymbolId> = words.iter().map(|w| interner.intern(w)).collect();
            prop_assert_eq!(&first, &again);
            prop_assert_eq!(interner.len(), len);
            for (word, id) in words.iter().zip(&first) {
                prop_assert_eq!(interner.resolve(*id), Some(word.as_str()));
            }
        }

        #[test]
        fn distinct_words_get_distinct_symbols(a in "[a-z]{1,8}", b in "[a-z]{1,8}") {
            let mut interner = Interner::new();
            let (x, y) = (interner.intern(&a), interner.intern(&b));
            prop_assert_eq!(a == b, x == y);
        }
    }
}
