//! The dynamically tagged script value.
//!
//! Values are cheap to clone: text is reference counted, lists are
//! persistent vectors, and closures share their definition and captured
//! scope. An entity reference is an identity, never an owner; a reference to
//! a removed entity simply stops resolving.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use im::Vector;
use lanthorn_foundation::{EntityId, SymbolId, Type};
use lanthorn_language::FnDef;

use crate::registry::Registry;
use crate::scope::Scope;

/// A Lanthorn runtime value.
#[derive(Clone)]
pub enum Value {
    /// The absent value.
    Nil,
    /// Boolean.
    Bool(bool),
    /// Number (a single numeric type at runtime).
    Number(f64),
    /// Text.
    Text(Arc<str>),
    /// Interned atom, distinct from text.
    Symbol(SymbolId),
    /// Ordered list.
    List(Vector<Value>),
    /// Function value with its captured scope.
    Closure(Rc<Closure>),
    /// Identity reference into the registry.
    Entity(EntityId),
}

/// A function value: a definition plus the scope it was created in.
pub struct Closure {
    /// The function definition.
    pub def: Arc<FnDef>,
    /// The lexical scope captured at creation.
    pub env: Scope,
    /// The `self` entity captured at creation, if any.
    pub this: Option<EntityId>,
}

impl Closure {
    /// Creates a closure.
    #[must_use]
    pub fn new(def: Arc<FnDef>, env: Scope, this: Option<EntityId>) -> Self {
        Self { def, env, this }
    }

    /// True if both close over the same definition, frame, and `self`.
    #[must_use]
    pub fn same_function(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.def, &other.def) && self.env.same_frame(&other.env) && self.this == other.this
    }

    /// The declared name, or `"fn"` for anonymous functions.
    #[must_use]
    pub fn name(&self) -> &str {
        self.def.name.as_deref().unwrap_or("fn")
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The captured scope may contain this closure; never print it.
        write!(f, "Closure({}/{})", self.name(), self.def.params.len())
    }
}

impl Value {
    /// Creates a text value.
    #[must_use]
    pub fn text(s: impl AsRef<str>) -> Self {
        Self::Text(Arc::from(s.as_ref()))
    }

    /// Creates a list value from any iterator of values.
    pub fn list(items: impl IntoIterator<Item = Value>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Returns the runtime type of this value.
    #[must_use]
    pub fn type_of(&self) -> Type {
        match self {
            Self::Nil => Type::Nil,
            Self::Bool(_) => Type::Bool,
            Self::Number(_) => Type::Number,
            Self::Text(_) => Type::Text,
            Self::Symbol(_) => Type::Symbol,
            Self::List(_) => Type::List,
            Self::Closure(_) => Type::Function,
            Self::Entity(_) => Type::Entity,
        }
    }

    /// Returns true if this value is truthy.
    ///
    /// Only `nil` and `false` are falsy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Self::Nil | Self::Bool(false))
    }

    /// Returns true if this value is `nil`.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns the boolean if this is a `Bool`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the number if this is a `Number`.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text if this is a `Text`.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the symbol if this is a `Symbol`.
    #[must_use]
    pub fn as_symbol(&self) -> Option<SymbolId> {
        match self {
            Self::Symbol(s) => Some(*s),
            _ => None,
        }
    }

    /// Returns the list if this is a `List`.
    #[must_use]
    pub fn as_list(&self) -> Option<&Vector<Value>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the closure if this is a `Closure`.
    #[must_use]
    pub fn as_closure(&self) -> Option<&Rc<Closure>> {
        match self {
            Self::Closure(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the entity id if this is an `Entity`.
    #[must_use]
    pub fn as_entity(&self) -> Option<EntityId> {
        match self {
            Self::Entity(id) => Some(*id),
            _ => None,
        }
    }

    /// Formats this value for players, resolving symbols and entity names
    /// through `registry`.
    #[must_use]
    pub fn display<'a>(&'a self, registry: &'a Registry) -> ValueDisplay<'a> {
        ValueDisplay {
            value: self,
            registry,
            nested: false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            #[allow(clippy::float_cmp)]
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Symbol(a), Self::Symbol(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Closure(a), Self::Closure(b)) => Rc::ptr_eq(a, b) || a.same_function(b),
            (Self::Entity(a), Self::Entity(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Symbol(s) => write!(f, "#{}", s.index()),
            Self::List(items) => f.debug_list().entries(items.iter()).finish(),
            Self::Closure(c) => write!(f, "{c:?}"),
            Self::Entity(id) => write!(f, "{id:?}"),
        }
    }
}

/// Player-facing rendering of a [`Value`].
///
/// Top-level text prints raw; text inside a list is quoted.
pub struct ValueDisplay<'a> {
    value: &'a Value,
    registry: &'a Registry,
    nested: bool,
}

impl fmt::Display for ValueDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) if self.nested => write!(f, "{s:?}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Symbol(s) => match self.registry.interner().resolve(*s) {
                Some(name) => write!(f, "{name}"),
                None => write!(f, "#{}", s.index()),
            },
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    let inner = ValueDisplay {
                        value: item,
                        registry: self.registry,
                        nested: true,
                    };
                    write!(f, "{inner}")?;
                }
                write!(f, "]")
            }
            Value::Closure(c) => write!(f, "<fn {}>", c.name()),
            Value::Entity(id) => match self.registry.get(*id) {
                Some(entity) => write!(f, "{}", entity.name()),
                None => write!(f, "<gone>"),
            },
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<usize> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: usize) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(Arc::from(s))
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Self::Text(s)
    }
}

impl From<SymbolId> for Value {
    fn from(s: SymbolId) -> Self {
        Self::Symbol(s)
    }
}

impl From<EntityId> for Value {
    fn from(id: EntityId) -> Self {
        Self::Entity(id)
    }
}

impl From<Vector<Value>> for Value {
    fn from(items: Vector<Value>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items.into_iter().collect())
    }
}
