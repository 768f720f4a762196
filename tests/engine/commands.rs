//! Player commands: verbs, nouns, and the built-in actions.

use lanthorn_engine::{Update, World};
use lanthorn_foundation::EntityId;
use lanthorn_storage::Value;

use crate::{texts, world};

const MARKET: &str = r#"
    def location stalls {
        name = "Market Stalls";
        description = "Awnings flap overhead.";
        init { addExit(north, fountain); }
    }
    def location fountain { name = "Fountain Square"; init { addExit(south, stalls); } }
    def entity coin { name = `gold coin[s]`; kind = #item; location = stalls; aliases = ["money"]; }
    def entity lamp { name = `brass lamp[s]`; kind = #item; location = stalls; }
    def entity iron_lamp : lamp { name = `iron lamp[s]`; location = stalls; }
    def entity anvil { name = `anvil[s]`; location = stalls; portable = false; }
    def command haggle {
        verbs = ["barter"];
        noun = false;
        when haggle(actor, rest) { say(actor, "You haggle over " + rest + "."); }
    }
    def entity shopper {}
"#;

fn market() -> (World, EntityId) {
    let mut w = world(MARKET);
    let shopper = w.lookup("shopper").unwrap();
    let stalls = w.lookup("stalls").unwrap();
    let avatar = w.spawn_avatar(shopper, Some(stalls)).unwrap();
    w.take_updates();
    (w, avatar)
}

fn say(w: &mut World, avatar: EntityId, line: &str) -> Vec<String> {
    texts(&w.submit_command(avatar, line).unwrap())
}

#[test]
fn look_describes_the_room() {
    let (mut w, avatar) = market();
    let lines = say(&mut w, avatar, "look");
    assert_eq!(lines.len(), 1);
    let view = &lines[0];
    assert!(view.starts_with("Market Stalls"), "{view}");
    assert!(view.contains("Awnings flap overhead."), "{view}");
    assert!(view.contains("Exits: north."), "{view}");
    assert!(view.contains("a gold coin"), "{view}");
    assert!(view.contains("an anvil"), "{view}");
}

#[test]
fn take_drop_and_inventory() {
    let (mut w, avatar) = market();
    let coin = w.lookup("coin").unwrap();

    assert_eq!(say(&mut w, avatar, "inventory"), vec!["You are empty-handed."]);
    assert_eq!(say(&mut w, avatar, "take the gold coin"), vec!["You take the gold coin."]);
    assert_eq!(w.registry().entity(coin).unwrap().location(), Some(avatar));
    assert_eq!(say(&mut w, avatar, "inventory"), vec!["You are carrying a gold coin."]);
    assert_eq!(say(&mut w, avatar, "drop money"), vec!["You drop the gold coin."]);
    assert_eq!(w.enclosing_location(coin), w.lookup("stalls"));
}

#[test]
fn fixed_things_stay_put() {
    let (mut w, avatar) = market();
    assert_eq!(say(&mut w, avatar, "take anvil"), vec!["You can't take the anvil."]);
}

#[test]
fn ambiguity_and_ordinals() {
    let (mut w, avatar) = market();
    assert_eq!(say(&mut w, avatar, "take lamp"), vec!["Which lamp do you mean?"]);
    assert_eq!(say(&mut w, avatar, "take second lamp"), vec!["You take the iron lamp."]);
    assert_eq!(say(&mut w, avatar, "take brass lamp"), vec!["You take the brass lamp."]);
}

#[test]
fn unknown_words() {
    let (mut w, avatar) = market();
    assert_eq!(say(&mut w, avatar, "juggle"), vec!["I don't understand \"juggle\"."]);
    assert_eq!(say(&mut w, avatar, "take unicorn"), vec!["You don't see any unicorn here."]);
}

#[test]
fn walking() {
    let (mut w, avatar) = market();
    let fountain = w.lookup("fountain").unwrap();

    assert_eq!(say(&mut w, avatar, "west"), vec!["You can't go that way."]);
    let updates = w.submit_command(avatar, "n").unwrap();
    assert!(updates.iter().any(|u| matches!(u, Update::Moved { to: Some(to), .. } if *to == fountain)));
    assert_eq!(w.enclosing_location(avatar), Some(fountain));

    say(&mut w, avatar, "go south");
    assert_eq!(w.enclosing_location(avatar), w.lookup("stalls"));
}

#[test]
fn declared_commands_and_synonyms() {
    let (mut w, avatar) = market();
    assert_eq!(say(&mut w, avatar, "haggle prices"), vec!["You haggle over prices."]);
    assert_eq!(say(&mut w, avatar, "barter fish"), vec!["You haggle over fish."]);
    assert!(w.verbs().contains(&"barter".to_string()));
}

#[test]
fn command_faults_are_reported_to_the_actor() {
    let mut w = world(
        "def location hall {}
         def entity lever { location = hall; when pull(actor) { self.x = 1 / 0; } }
         def command pull {}
         def entity player {}",
    );
    let player = w.lookup("player").unwrap();
    let hall = w.lookup("hall").unwrap();
    let avatar = w.spawn_avatar(player, Some(hall)).unwrap();
    w.take_updates();

    let updates = w.submit_command(avatar, "pull lever").unwrap();
    let fault = updates
        .iter()
        .find(|u| matches!(u, Update::Fault { .. }))
        .expect("a fault");
    assert!(fault.is_visible_to(avatar, Some(hall)));
    assert!(fault.text().unwrap().contains("division by zero"));

    let lever = w.lookup("lever").unwrap();
    assert_eq!(w.get_member(lever, "x").unwrap(), Value::Nil);
}
