//! The built-in operation table.
//!
//! Built-ins are looked up by name at the call site; they are not values and
//! cannot be stored or passed around. A local binding with the same name
//! shadows a built-in. The table is organized by category:
//! - `values`: values, text, numbers, randomness, and noun inflection
//! - `world`: exits, containment, lifecycle, messaging, events, and timers
//!
//! `sleep`, `waitFor`, and `request` are the suspending operations. They
//! have no implementation here; the statement machine turns an awaited call
//! to one of them into a [`Suspension`].

mod values;
mod world;

use lanthorn_foundation::{Error, Result, SymbolId, Type};
use lanthorn_storage::Value;

use crate::interp::{Ctx, Suspension};
use crate::world::World;

/// Native implementation of a built-in.
pub(crate) type NativeFn = fn(&mut World, &Ctx, &[Value]) -> Result<Value>;

/// A named native operation.
#[derive(Clone, Copy)]
pub(crate) struct Builtin {
    pub(crate) name: &'static str,
    pub(crate) min: usize,
    pub(crate) max: Option<usize>,
    /// Changes world state; refused while members are being bound.
    pub(crate) mutates: bool,
    pub(crate) func: NativeFn,
}

impl Builtin {
    const fn pure(name: &'static str, min: usize, max: Option<usize>, func: NativeFn) -> Self {
        Self {
            name,
            min,
            max,
            mutates: false,
            func,
        }
    }

    const fn mutating(name: &'static str, min: usize, max: Option<usize>, func: NativeFn) -> Self {
        Self {
            name,
            min,
            max,
            mutates: true,
            func,
        }
    }

    /// Human-readable arity for fault messages.
    pub(crate) fn arity(&self) -> String {
        match self.max {
            Some(max) if max == self.min => max.to_string(),
            Some(max) => format!("{} to {max}", self.min),
            None => format!("at least {}", self.min),
        }
    }
}

static BUILTINS: &[Builtin] = &[
    // values
    Builtin::pure("len", 1, Some(1), values::native_len),
    Builtin::pure("str", 1, Some(1), values::native_str),
    Builtin::pure("num", 1, Some(1), values::native_num),
    Builtin::pure("typeOf", 1, Some(1), values::native_type_of),
    Builtin::pure("abs", 1, Some(1), values::native_abs),
    Builtin::pure("floor", 1, Some(1), values::native_floor),
    Builtin::pure("min", 1, None, values::native_min),
    Builtin::pure("max", 1, None, values::native_max),
    Builtin::pure("random", 0, Some(2), values::native_random),
    Builtin::pure("randomInt", 2, Some(2), values::native_random_int),
    Builtin::pure("pick", 1, Some(1), values::native_pick),
    Builtin::pure("chance", 1, Some(1), values::native_chance),
    Builtin::pure("append", 2, Some(2), values::native_append),
    Builtin::pure("contains", 2, Some(2), values::native_contains),
    Builtin::pure("range", 1, Some(3), values::native_range),
    Builtin::pure("upper", 1, Some(1), values::native_upper),
    Builtin::pure("lower", 1, Some(1), values::native_lower),
    Builtin::pure("join", 1, Some(2), values::native_join),
    Builtin::pure("singular", 1, Some(1), values::native_singular),
    Builtin::pure("plural", 1, Some(1), values::native_plural),
    Builtin::pure("article", 1, Some(1), values::native_article),
    Builtin::pure("indefinite", 1, Some(1), values::native_indefinite),
    Builtin::pure("quantity", 2, Some(2), values::native_quantity),
    Builtin::pure("find", 1, Some(1), values::native_find),
    Builtin::pure("isA", 2, Some(2), values::native_is_a),
    Builtin::pure("has", 2, Some(2), values::native_has),
    // world
    Builtin::mutating("addExit", 2, Some(3), world::native_add_exit),
    Builtin::mutating("removeExit", 2, Some(3), world::native_remove_exit),
    Builtin::pure("exits", 0, Some(1), world::native_exits),
    Builtin::pure("exit", 1, Some(2), world::native_exit),
    Builtin::mutating("move", 2, Some(2), world::native_move),
    Builtin::pure("contents", 0, Some(1), world::native_contents),
    Builtin::pure("locationOf", 1, Some(1), world::native_location_of),
    Builtin::mutating("spawn", 1, Some(2), world::native_spawn),
    Builtin::mutating("remove", 1, Some(1), world::native_remove),
    Builtin::mutating("expire", 2, Some(2), world::native_expire),
    Builtin::mutating("say", 2, Some(2), world::native_say),
    Builtin::mutating("announce", 2, Some(3), world::native_announce),
    Builtin::pure("log", 1, None, world::native_log),
    Builtin::mutating("trigger", 2, None, world::native_trigger),
    Builtin::mutating("signal", 2, Some(3), world::native_signal),
    Builtin::mutating("after", 2, Some(2), world::native_after),
    Builtin::pure("tick", 0, Some(0), world::native_tick),
];

const SUSPENDING: [&str; 3] = ["sleep", "waitFor", "request"];

/// Finds a non-suspending built-in.
pub(crate) fn lookup(name: &str) -> Option<&'static Builtin> {
    BUILTINS.iter().find(|b| b.name == name)
}

/// True for the operations that may only be awaited.
pub(crate) fn is_suspending(name: &str) -> bool {
    SUSPENDING.contains(&name)
}

/// Every built-in name, suspending ones included.
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|b| b.name).chain(SUSPENDING)
}

/// Builds the suspension an awaited call to `name` requests.
pub(crate) fn suspension(world: &mut World, name: &str, args: &[Value]) -> Result<Suspension> {
    match name {
        "sleep" => {
            expect_arity(name, args, 1, 1)?;
            let ticks = values::number(&args[0])?.floor();
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let ticks = if ticks < 1.0 { 1 } else { ticks as u64 };
            Ok(Suspension::Sleep(ticks))
        }
        "waitFor" => {
            expect_arity(name, args, 1, 1)?;
            Ok(Suspension::Signal(world.symbol_arg(&args[0])?))
        }
        "request" => {
            expect_arity(name, args, 1, 2)?;
            Ok(Suspension::Request {
                kind: world.symbol_arg(&args[0])?,
                payload: args.get(1).cloned().unwrap_or(Value::Nil),
            })
        }
        other => Err(Error::internal(format!("{other} does not suspend"))),
    }
}

fn expect_arity(name: &str, args: &[Value], min: usize, max: usize) -> Result<()> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{min} to {max}")
        };
        return Err(Error::arity_mismatch(name, expected, args.len()));
    }
    Ok(())
}

impl World {
    /// A symbol argument; text is accepted and interned.
    pub(crate) fn symbol_arg(&mut self, value: &Value) -> Result<SymbolId> {
        match value {
            Value::Symbol(sym) => Ok(*sym),
            Value::Text(text) => Ok(self.registry.intern(text)),
            other => Err(Error::type_mismatch(Type::Symbol, other.type_of())),
        }
    }

    /// A direction argument: a symbol, or text naming a direction or its
    /// abbreviation.
    pub(crate) fn direction_arg(&mut self, value: &Value) -> Result<SymbolId> {
        match value {
            Value::Text(text) => {
                let text: &str = text;
                let word = crate::command::normalize_direction(text).unwrap_or(text);
                Ok(self.registry.intern(word))
            }
            other => self.symbol_arg(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique() {
        let mut all: Vec<_> = names().collect();
        let count = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), count);
    }

    #[test]
    fn suspending_names_are_not_callable() {
        for name in SUSPENDING {
            assert!(is_suspending(name));
            assert!(lookup(name).is_none());
        }
        assert!(!is_suspending("say"));
    }

    #[test]
    fn arity_text() {
        assert_eq!(lookup("len").map(Builtin::arity).as_deref(), Some("1"));
        assert_eq!(lookup("spawn").map(Builtin::arity).as_deref(), Some("1 to 2"));
        assert_eq!(lookup("min").map(Builtin::arity).as_deref(), Some("at least 1"));
    }

    #[test]
    fn sleep_rounds_up_to_one_tick() {
        let mut world = World::new(crate::EngineConfig::testing());
        assert_eq!(
            suspension(&mut world, "sleep", &[Value::from(0.2)]).ok(),
            Some(Suspension::Sleep(1))
        );
        assert_eq!(
            suspension(&mut world, "sleep", &[Value::from(5i64)]).ok(),
            Some(Suspension::Sleep(5))
        );
        assert!(suspension(&mut world, "sleep", &[]).is_err());
    }
}
