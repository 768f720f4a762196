//! Runtime type tags.
//!
//! Script values are dynamically typed; `Type` names the tag of a value so
//! that type-mismatch faults can say what was expected and what arrived.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type tag of a script value.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Type {
    /// The absent value.
    Nil,
    /// Boolean.
    Bool,
    /// Number (a single floating-point numeric type).
    Number,
    /// Text.
    Text,
    /// Interned symbol atom.
    Symbol,
    /// Ordered list of values.
    List,
    /// Closure or built-in operation.
    Function,
    /// Entity reference.
    Entity,
    /// Any type (used when an operation accepts several).
    Any,
}

impl Type {
    /// Returns the name used in diagnostics and by the `typeOf` built-in.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::Text => "text",
            Self::Symbol => "symbol",
            Self::List => "list",
            Self::Function => "function",
            Self::Entity => "entity",
            Self::Any => "any",
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
