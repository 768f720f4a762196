//! Built-ins over plain values: numbers, text, lists, randomness, and noun
//! inflection.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

use lanthorn_foundation::{Error, Result, Type};
use lanthorn_language::NounPhrase;
use lanthorn_storage::Value;
use rand::Rng;

use crate::interp::Ctx;
use crate::world::World;

pub(crate) fn number(value: &Value) -> Result<f64> {
    value
        .as_number()
        .ok_or_else(|| Error::type_mismatch(Type::Number, value.type_of()))
}

fn text(value: &Value) -> Result<&str> {
    value
        .as_text()
        .ok_or_else(|| Error::type_mismatch(Type::Text, value.type_of()))
}

fn list(value: &Value) -> Result<&im::Vector<Value>> {
    value
        .as_list()
        .ok_or_else(|| Error::type_mismatch(Type::List, value.type_of()))
}

fn arg(args: &[Value], i: usize) -> &Value {
    args.get(i).unwrap_or(&Value::Nil)
}

// =============================================================================
// Conversion and inspection
// =============================================================================

/// Value: len
pub(crate) fn native_len(_world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    match arg(args, 0) {
        Value::List(items) => Ok(Value::from(items.len())),
        Value::Text(s) => Ok(Value::from(s.chars().count())),
        Value::Nil => Ok(Value::from(0usize)),
        other => Err(Error::type_mismatch(Type::List, other.type_of())),
    }
}

/// Value: str
pub(crate) fn native_str(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    Ok(Value::text(world.to_text(arg(args, 0))))
}

/// Value: num. Text that does not parse yields nil.
pub(crate) fn native_num(_world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    match arg(args, 0) {
        Value::Number(n) => Ok(Value::Number(*n)),
        Value::Text(s) => Ok(s.trim().parse::<f64>().map_or(Value::Nil, Value::Number)),
        Value::Bool(b) => Ok(Value::from(i64::from(*b))),
        other => Err(Error::type_mismatch(Type::Number, other.type_of())),
    }
}

/// Value: typeOf, as a symbol.
pub(crate) fn native_type_of(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let name = arg(args, 0).type_of().name();
    Ok(Value::Symbol(world.registry.intern(name)))
}

// =============================================================================
// Numbers
// =============================================================================

/// Math: abs
pub(crate) fn native_abs(_world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    Ok(Value::Number(number(arg(args, 0))?.abs()))
}

/// Math: floor
pub(crate) fn native_floor(_world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    Ok(Value::Number(number(arg(args, 0))?.floor()))
}

/// A single list argument stands for its elements.
fn numbers(args: &[Value]) -> Result<Vec<f64>> {
    let items: Vec<&Value> = match args {
        [Value::List(items)] => items.iter().collect(),
        _ => args.iter().collect(),
    };
    items.into_iter().map(number).collect()
}

/// Math: min
pub(crate) fn native_min(_world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    Ok(numbers(args)?
        .into_iter()
        .reduce(f64::min)
        .map_or(Value::Nil, Value::Number))
}

/// Math: max
pub(crate) fn native_max(_world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    Ok(numbers(args)?
        .into_iter()
        .reduce(f64::max)
        .map_or(Value::Nil, Value::Number))
}

// =============================================================================
// Randomness
// =============================================================================

/// A number the random built-ins can hand to the generator.
fn finite(operation: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::invalid_argument(operation, format!("expected a finite number, got {value}")))
    }
}

/// Random: `random()` in [0, 1), `random(n)` in [0, n), `random(a, b)` in [a, b).
pub(crate) fn native_random(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let (lo, hi) = match args {
        [] => (0.0, 1.0),
        [n] => (0.0, finite("random", number(n)?)?),
        [a, b, ..] => (finite("random", number(a)?)?, finite("random", number(b)?)?),
    };
    if hi <= lo {
        return Ok(Value::Number(lo));
    }
    finite("random", hi - lo).map_err(|_| Error::invalid_argument("random", "range is too wide"))?;
    Ok(Value::Number(world.rng.gen_range(lo..hi)))
}

/// Random: integer in `lo..=hi`.
pub(crate) fn native_random_int(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let lo = finite("randomInt", number(arg(args, 0))?)?.floor() as i64;
    let hi = finite("randomInt", number(arg(args, 1))?)?.floor() as i64;
    if hi <= lo {
        return Ok(Value::from(lo));
    }
    Ok(Value::from(world.rng.gen_range(lo..=hi)))
}

/// Random: one element of a list, or nil for an empty list.
pub(crate) fn native_pick(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let items = list(arg(args, 0))?;
    if items.is_empty() {
        return Ok(Value::Nil);
    }
    let i = world.rng.gen_range(0..items.len());
    Ok(items.get(i).cloned().unwrap_or(Value::Nil))
}

/// Random: true with probability `p`.
pub(crate) fn native_chance(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let p = number(arg(args, 0))?;
    if p.is_nan() {
        return Err(Error::invalid_argument("chance", "probability is not a number"));
    }
    let p = p.clamp(0.0, 1.0);
    Ok(Value::Bool(world.rng.gen_bool(p)))
}

// =============================================================================
// Lists and text
// =============================================================================

/// Collection: append, returning a new list.
pub(crate) fn native_append(_world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let mut items = list(arg(args, 0))?.clone();
    items.push_back(arg(args, 1).clone());
    Ok(Value::List(items))
}

/// Collection: contains. Lists test membership, text tests for a substring.
pub(crate) fn native_contains(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    match arg(args, 0) {
        Value::List(items) => Ok(Value::Bool(items.contains(arg(args, 1)))),
        Value::Text(s) => {
            let needle = world.to_text(arg(args, 1));
            Ok(Value::Bool(s.contains(needle.as_str())))
        }
        other => Err(Error::type_mismatch(Type::List, other.type_of())),
    }
}

/// Collection: `range(end)`, `range(start, end)`, `range(start, end, step)`.
///
/// End is exclusive. A zero step yields an empty list.
pub(crate) fn native_range(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let (start, end, step) = match args {
        [end] => (0.0, number(end)?, 1.0),
        [start, end] => (number(start)?, number(end)?, 1.0),
        [start, end, step, ..] => (number(start)?, number(end)?, number(step)?),
        [] => return Err(Error::arity_mismatch("range", "1 to 3", 0)),
    };
    if step == 0.0 {
        return Ok(Value::list([]));
    }
    let mut out = Vec::new();
    let mut current = start;
    while (step > 0.0 && current < end) || (step < 0.0 && current > end) {
        world.step()?;
        out.push(Value::Number(current));
        current += step;
    }
    Ok(Value::list(out))
}

/// String: upper
pub(crate) fn native_upper(_world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    Ok(Value::text(text(arg(args, 0))?.to_uppercase()))
}

/// String: lower
pub(crate) fn native_lower(_world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    Ok(Value::text(text(arg(args, 0))?.to_lowercase()))
}

/// String: join, with `", "` as the default separator.
pub(crate) fn native_join(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let items = list(arg(args, 0))?;
    let separator = match args.get(1) {
        Some(sep) => text(sep)?,
        None => ", ",
    };
    let parts: Vec<String> = items.iter().map(|v| world.to_text(v)).collect();
    Ok(Value::text(parts.join(separator)))
}

// =============================================================================
// Noun inflection
// =============================================================================

/// The noun phrase an argument names: an entity's `name`, or bracket text.
fn phrase(world: &World, value: &Value) -> Result<NounPhrase> {
    match value {
        Value::Entity(id) => {
            world.registry.validate(*id)?;
            let name = match world.registry.lookup_member(*id, "name") {
                Some(Value::Text(name)) => name.to_string(),
                _ => world.registry.name_of(*id),
            };
            Ok(NounPhrase::parse_lenient(&name))
        }
        other => Ok(NounPhrase::parse_lenient(text(other)?)),
    }
}

/// Noun: singular
pub(crate) fn native_singular(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    Ok(Value::text(phrase(world, arg(args, 0))?.singular()))
}

/// Noun: plural
pub(crate) fn native_plural(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    Ok(Value::text(phrase(world, arg(args, 0))?.plural()))
}

/// Noun: article, or nil for phrases without one.
pub(crate) fn native_article(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    Ok(phrase(world, arg(args, 0))?
        .article()
        .map_or(Value::Nil, Value::text))
}

/// Noun: indefinite
pub(crate) fn native_indefinite(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    Ok(Value::text(phrase(world, arg(args, 0))?.indefinite()))
}

/// Noun: quantity
pub(crate) fn native_quantity(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let phrase = phrase(world, arg(args, 0))?;
    let count = number(arg(args, 1))?.floor() as i64;
    Ok(Value::text(phrase.quantity(count)))
}

// =============================================================================
// Entities
// =============================================================================

/// Entity: find by identifier, or nil.
pub(crate) fn native_find(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let name = text(arg(args, 0))?;
    Ok(world.registry.lookup(name).map_or(Value::Nil, Value::Entity))
}

/// Entity: isA, true if the second argument is in the first's prototype chain.
pub(crate) fn native_is_a(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let entity = world.expect_entity(arg(args, 0))?;
    let ancestor = world.expect_entity(arg(args, 1))?;
    Ok(Value::Bool(world.registry.is_a(entity, ancestor)))
}

/// Entity: has, true if a member is native or defined along the chain.
pub(crate) fn native_has(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let entity = world.expect_entity(arg(args, 0))?;
    let member = text(arg(args, 1))?;
    world.bind_pending(entity, member)?;
    Ok(Value::Bool(world.registry.has_member(entity, member)))
}
