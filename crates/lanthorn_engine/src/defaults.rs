//! Built-in default actions for the standard verbs.
//!
//! These run when an event reaches its default phase and no `when` handler
//! claimed it. They only produce updates; worlds customize them with
//! handlers rather than by replacing them.

use lanthorn_foundation::{EntityId, Result};
use lanthorn_storage::{Kind, Value};

use crate::command::normalize_direction;
use crate::update::Update;
use crate::world::World;

/// Runs the built-in action for `event`. Returns false if there is none.
pub(crate) fn default_action(
    world: &mut World,
    event: &str,
    target: EntityId,
    actor: Option<EntityId>,
    args: &[Value],
) -> Result<bool> {
    let Some(actor) = actor else {
        return Ok(false);
    };
    match event {
        "look" => look(world, actor, target),
        "go" => go(world, actor, args.get(1).unwrap_or(&Value::Nil)),
        "take" => take(world, actor, target),
        "drop" => drop_item(world, actor, target),
        "inventory" => inventory(world, actor),
        _ => return Ok(false),
    }
    .map(|()| true)
}

fn tell(world: &mut World, to: EntityId, text: impl Into<String>) {
    world.emit(Update::Message {
        to,
        text: text.into(),
    });
}

fn look(world: &mut World, actor: EntityId, target: EntityId) -> Result<()> {
    let is_place = world.registry.entity(target)?.kind() == Kind::Location;
    let text = if target == actor || is_place {
        describe_surroundings(world, actor)
    } else {
        match world.registry.get_member(target, "description")? {
            Value::Text(description) => description.to_string(),
            _ => format!("You see nothing special about {}.", definite(world, target)),
        }
    };
    tell(world, actor, text);
    Ok(())
}

/// The room description shown by `look` and after moving.
pub(crate) fn describe_surroundings(world: &World, viewer: EntityId) -> String {
    let here = match world.registry.get(viewer) {
        Some(e) if e.kind() == Kind::Location => Some(viewer),
        _ => world.enclosing_location(viewer),
    };
    let Some(here) = here else {
        return "You are nowhere at all.".to_string();
    };

    let mut lines = vec![capitalize(&world.to_text(&Value::Entity(here)))];
    if let Ok(Value::Text(description)) = world.registry.get_member(here, "description") {
        lines.push(description.to_string());
    }

    let exits: Vec<String> = world
        .registry
        .get(here)
        .map(|e| e.exits().to_vec())
        .unwrap_or_default()
        .into_iter()
        .filter(|exit| world.registry.contains(exit.destination))
        .map(|exit| world.symbol_name(exit.direction))
        .collect();
    if exits.is_empty() {
        lines.push("There are no obvious exits.".to_string());
    } else {
        lines.push(format!("Exits: {}.", exits.join(", ")));
    }

    let visible: Vec<String> = world
        .registry
        .get(here)
        .map(|e| e.contents().to_vec())
        .unwrap_or_default()
        .into_iter()
        .filter(|&id| id != viewer)
        .map(|id| indefinite(world, id))
        .collect();
    if !visible.is_empty() {
        lines.push(format!("You see {} here.", list_phrase(&visible)));
    }
    lines.join("\n")
}

fn go(world: &mut World, actor: EntityId, direction: &Value) -> Result<()> {
    let word = match direction {
        Value::Symbol(sym) => world.symbol_name(*sym),
        Value::Text(text) => normalize_direction(text).unwrap_or(&**text).to_string(),
        _ => {
            tell(world, actor, "Go where?");
            return Ok(());
        }
    };
    let Some(here) = world.enclosing_location(actor) else {
        tell(world, actor, "You can't go that way.");
        return Ok(());
    };
    let sym = world.registry.intern(&word);
    let Some(there) = world.registry.exit(here, sym) else {
        tell(world, actor, "You can't go that way.");
        return Ok(());
    };

    let who = capitalize(&indefinite(world, actor));
    world.emit(Update::Broadcast {
        location: here,
        text: format!("{who} leaves {word}."),
        except: Some(actor),
    });
    world.relocate(actor, Some(there))?;
    world.emit(Update::Broadcast {
        location: there,
        text: format!("{who} arrives."),
        except: Some(actor),
    });
    let view = describe_surroundings(world, actor);
    tell(world, actor, view);
    Ok(())
}

fn take(world: &mut World, actor: EntityId, target: EntityId) -> Result<()> {
    let name = definite(world, target);
    let entity = world.registry.entity(target)?;
    let portable = match world.registry.lookup_member(target, "portable") {
        Some(Value::Bool(b)) => b,
        _ => entity.kind().is_portable(),
    };
    let holder = entity.location();

    if target == actor {
        tell(world, actor, "You can't take yourself.");
    } else if holder == Some(actor) {
        tell(world, actor, format!("You already have {name}."));
    } else if holder != world.enclosing_location(actor) || holder.is_none() {
        tell(world, actor, format!("You don't see {name} here."));
    } else if !portable {
        tell(world, actor, format!("You can't take {name}."));
    } else {
        world.relocate(target, Some(actor))?;
        tell(world, actor, format!("You take {name}."));
        if let Some(here) = holder {
            let who = capitalize(&indefinite(world, actor));
            let what = indefinite(world, target);
            world.emit(Update::Broadcast {
                location: here,
                text: format!("{who} takes {what}."),
                except: Some(actor),
            });
        }
    }
    Ok(())
}

fn drop_item(world: &mut World, actor: EntityId, target: EntityId) -> Result<()> {
    let name = definite(world, target);
    if world.registry.entity(target)?.location() != Some(actor) {
        tell(world, actor, format!("You don't have {name}."));
        return Ok(());
    }
    let here = world.enclosing_location(actor);
    world.relocate(target, here)?;
    tell(world, actor, format!("You drop {name}."));
    if let Some(here) = here {
        let who = capitalize(&indefinite(world, actor));
        let what = indefinite(world, target);
        world.emit(Update::Broadcast {
            location: here,
            text: format!("{who} drops {what}."),
            except: Some(actor),
        });
    }
    Ok(())
}

fn inventory(world: &mut World, actor: EntityId) -> Result<()> {
    let held: Vec<String> = world
        .registry
        .entity(actor)?
        .contents()
        .to_vec()
        .into_iter()
        .map(|id| indefinite(world, id))
        .collect();
    let text = if held.is_empty() {
        "You are empty-handed.".to_string()
    } else {
        format!("You are carrying {}.", list_phrase(&held))
    };
    tell(world, actor, text);
    Ok(())
}

/// "a lantern", "Bob".
fn indefinite(world: &World, id: EntityId) -> String {
    match world.registry.get_member(id, "indefinite") {
        Ok(Value::Text(text)) => text.to_string(),
        _ => world.registry.name_of(id),
    }
}

/// "the lantern", "Bob".
fn definite(world: &World, id: EntityId) -> String {
    let singular = world.to_text(&Value::Entity(id));
    match world.registry.get_member(id, "article") {
        Ok(Value::Text(_)) => format!("the {singular}"),
        _ => singular,
    }
}

/// Joins phrases as "a, b and c".
pub(crate) fn list_phrase(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

pub(crate) fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
