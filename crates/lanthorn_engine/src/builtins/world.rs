//! Built-ins that read or change the world.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use lanthorn_foundation::{EntityId, Error, Result};
use lanthorn_storage::{Kind, Value};
use tracing::info;

use super::values::number;
use crate::interp::{Ctx, Execution};
use crate::task::TaskState;
use crate::update::Update;
use crate::world::World;

fn arg(args: &[Value], i: usize) -> &Value {
    args.get(i).unwrap_or(&Value::Nil)
}

/// `self`, for operations whose subject defaults to it.
fn this(ctx: &Ctx) -> Result<EntityId> {
    ctx.this.ok_or_else(|| Error::undefined_symbol("self"))
}

/// The explicit entity argument, or `self` when it is omitted.
fn subject_or_self(world: &World, ctx: &Ctx, args: &[Value]) -> Result<EntityId> {
    match args.first() {
        Some(value) => world.expect_entity(value),
        None => this(ctx),
    }
}

fn count(n: u64) -> Value {
    Value::from(i64::try_from(n).unwrap_or(i64::MAX))
}

fn ticks(value: &Value) -> Result<u64> {
    let n = number(value)?.floor();
    Ok(if n < 1.0 { 1 } else { n as u64 })
}

// =============================================================================
// Exits
// =============================================================================

/// Exits: `addExit(dir, dest)` from `self`, or `addExit(from, dir, dest)`.
pub(crate) fn native_add_exit(world: &mut World, ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let (from, dir, dest) = match args {
        [dir, dest] => (this(ctx)?, dir, dest),
        [from, dir, dest, ..] => (world.expect_entity(from)?, dir, dest),
        _ => return Err(Error::arity_mismatch("addExit", "2 to 3", args.len())),
    };
    let direction = world.direction_arg(dir)?;
    let destination = world.expect_entity(dest)?;
    let added = world.registry.add_exit(from, direction, destination)?;
    if added {
        let direction = world.symbol_name(direction);
        world.emit(Update::ExitAdded {
            location: from,
            direction,
            destination,
        });
    }
    Ok(Value::Bool(added))
}

/// Exits: `removeExit(dir, dest)` from `self`, or `removeExit(from, dir, dest)`.
/// A nil destination removes the exit wherever it leads.
pub(crate) fn native_remove_exit(world: &mut World, ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let (from, dir, dest) = match args {
        [dir, dest] => (this(ctx)?, dir, dest),
        [from, dir, dest, ..] => (world.expect_entity(from)?, dir, dest),
        _ => return Err(Error::arity_mismatch("removeExit", "2 to 3", args.len())),
    };
    let direction = world.direction_arg(dir)?;
    let destination = match dest {
        Value::Nil => None,
        other => Some(world.expect_entity(other)?),
    };
    match world.registry.remove_exit(from, direction, destination)? {
        Some(exit) => {
            let direction = world.symbol_name(direction);
            world.emit(Update::ExitRemoved {
                location: from,
                direction,
                destination: exit.destination,
            });
            Ok(Value::Bool(true))
        }
        None => Ok(Value::Bool(false)),
    }
}

/// Exits: `[direction, destination]` pairs of a location (default `self`).
pub(crate) fn native_exits(world: &mut World, ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let from = subject_or_self(world, ctx, args)?;
    let pairs = world
        .registry
        .entity(from)?
        .exits()
        .iter()
        .filter(|exit| world.registry.contains(exit.destination))
        .map(|exit| Value::list([Value::Symbol(exit.direction), Value::Entity(exit.destination)]));
    Ok(Value::list(pairs.collect::<Vec<_>>()))
}

/// Exits: `exit(dir)` from `self`, or `exit(location, dir)`; nil if none.
pub(crate) fn native_exit(world: &mut World, ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let (from, dir) = match args {
        [dir] => (this(ctx)?, dir),
        [from, dir, ..] => (world.expect_entity(from)?, dir),
        [] => return Err(Error::arity_mismatch("exit", "1 to 2", 0)),
    };
    let direction = world.direction_arg(dir)?;
    Ok(world
        .registry
        .exit(from, direction)
        .map_or(Value::Nil, Value::Entity))
}

// =============================================================================
// Containment
// =============================================================================

/// Containment: `move(entity, dest)`; a nil destination takes it out of
/// the world's containment tree.
pub(crate) fn native_move(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let entity = world.expect_entity(arg(args, 0))?;
    let destination = match arg(args, 1) {
        Value::Nil => None,
        other => Some(world.expect_entity(other)?),
    };
    world.relocate(entity, destination)?;
    Ok(Value::Nil)
}

/// Containment: contents of an entity (default `self`).
pub(crate) fn native_contents(world: &mut World, ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let of = subject_or_self(world, ctx, args)?;
    let contents = world.registry.entity(of)?.contents().iter().copied().map(Value::Entity);
    Ok(Value::list(contents.collect::<Vec<_>>()))
}

/// Containment: the container of an entity, or nil.
pub(crate) fn native_location_of(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let entity = world.expect_entity(arg(args, 0))?;
    Ok(world
        .registry
        .entity(entity)?
        .location()
        .map_or(Value::Nil, Value::Entity))
}

// =============================================================================
// Lifecycle
// =============================================================================

/// Lifecycle: `spawn(prototype [, location])`.
pub(crate) fn native_spawn(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let prototype = world.expect_entity(arg(args, 0))?;
    let location = match arg(args, 1) {
        Value::Nil => None,
        other => Some(world.expect_entity(other)?),
    };
    let entity = world.registry.spawn(prototype, location)?;
    world.emit(Update::Spawned { entity, prototype });
    Ok(Value::Entity(entity))
}

/// Lifecycle: remove an entity and its contents, cancelling their tasks.
pub(crate) fn native_remove(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let entity = world.expect_entity(arg(args, 0))?;
    world.remove_entity(entity)?;
    Ok(Value::Nil)
}

/// Lifecycle: `expire(entity, ticks)` removes the entity once `ticks` have
/// passed.
pub(crate) fn native_expire(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let entity = world.expect_entity(arg(args, 0))?;
    let at = world.tick() + ticks(arg(args, 1))?;
    world.registry.set_expiry(entity, Some(at))?;
    Ok(Value::Nil)
}

// =============================================================================
// Messaging
// =============================================================================

/// Messaging: `say(entity, text)`.
pub(crate) fn native_say(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let to = world.expect_entity(arg(args, 0))?;
    let text = world.to_text(arg(args, 1));
    world.emit(Update::Message { to, text });
    Ok(Value::Nil)
}

/// Messaging: `announce(place, text [, except])`. A place that is not a
/// location announces to the location around it.
pub(crate) fn native_announce(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let target = world.expect_entity(arg(args, 0))?;
    let location = if world.registry.entity(target)?.kind() == Kind::Location {
        Some(target)
    } else {
        world.enclosing_location(target)
    };
    let except = match arg(args, 2) {
        Value::Nil => None,
        other => Some(world.expect_entity(other)?),
    };
    let text = world.to_text(arg(args, 1));
    if let Some(location) = location {
        world.emit(Update::Broadcast {
            location,
            text,
            except,
        });
    }
    Ok(Value::Nil)
}

/// Messaging: write to the operational log.
pub(crate) fn native_log(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let parts: Vec<String> = args.iter().map(|v| world.to_text(v)).collect();
    info!(target: "lanthorn::script", message = %parts.join(" "), "script log");
    Ok(Value::Nil)
}

// =============================================================================
// Events and time
// =============================================================================

/// Events: `trigger(event, target, args...)`. The first extra argument, if
/// it is an entity, is the actor. Returns whether the event was performed.
pub(crate) fn native_trigger(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let event = match arg(args, 0) {
        Value::Text(name) => name.to_string(),
        other => {
            let sym = world.symbol_arg(other)?;
            world.symbol_name(sym)
        }
    };
    let target = world.expect_entity(arg(args, 1))?;
    let extra: Vec<Value> = args.iter().skip(2).cloned().collect();
    let actor = extra
        .first()
        .and_then(Value::as_entity)
        .filter(|&id| world.registry.contains(id));
    let result = world.dispatch_event(&event, target, actor, extra)?;
    Ok(Value::Bool(result.performed))
}

/// Events: `signal(entity, #name [, value])` wakes the entity's tasks
/// waiting on `#name`. Returns how many woke.
pub(crate) fn native_signal(world: &mut World, _ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let subject = world.expect_entity(arg(args, 0))?;
    let signal = world.symbol_arg(arg(args, 1))?;
    let woken = world.scheduler.signal(subject, signal, arg(args, 2));
    Ok(Value::from(woken))
}

/// Time: `after(ticks, fn)` runs a closure as a new task once `ticks` have
/// passed.
pub(crate) fn native_after(world: &mut World, ctx: &Ctx, args: &[Value]) -> Result<Value> {
    let delay = ticks(arg(args, 0))?;
    let Value::Closure(closure) = arg(args, 1) else {
        return Err(Error::type_mismatch(
            lanthorn_foundation::Type::Function,
            arg(args, 1).type_of(),
        ));
    };
    if !closure.def.params.is_empty() {
        return Err(Error::arity_mismatch(closure.name(), "0", closure.def.params.len()));
    }
    let subject = closure.this.or(ctx.this);
    let exec = Execution::new(&closure.def.body, closure.env.child(), subject);
    let label = format!("after:{}", closure.name());
    let wake_at = world.tick() + delay;
    let task = world
        .scheduler
        .insert(exec, subject, None, label, TaskState::Ready, wake_at);
    Ok(count(task.get()))
}

/// Time: the current tick.
pub(crate) fn native_tick(world: &mut World, _ctx: &Ctx, _args: &[Value]) -> Result<Value> {
    Ok(count(world.tick()))
}
