//! World loading end to end.

use lanthorn_engine::{EngineConfig, load_source};
use lanthorn_foundation::{ErrorCategory, ErrorKind};
use lanthorn_storage::{Kind, Value};

use crate::world;

#[test]
fn instance_overrides_and_delegates() {
    let w = world(
        "def entity lamp { brightness = 3; colour = #amber; }
         def entity lantern : lamp { brightness = 5; }",
    );
    let lamp = w.lookup("lamp").unwrap();
    let lantern = w.lookup("lantern").unwrap();

    assert_eq!(w.get_member(lantern, "brightness").unwrap(), Value::Number(5.0));
    assert_eq!(w.get_member(lamp, "brightness").unwrap(), Value::Number(3.0));
    let colour = w.get_member(lantern, "colour").unwrap();
    assert_eq!(w.format_value(&colour), "amber");
    assert_eq!(w.get_member(lantern, "missing").unwrap(), Value::Nil);
}

#[test]
fn mutual_prototypes_produce_no_world() {
    let err = load_source("def entity a : b {} def entity b : a {}", EngineConfig::testing()).unwrap_err();
    assert_eq!(err.errors().len(), 1);
    match &err.errors()[0].kind {
        ErrorKind::CyclicPrototype { cycle } => {
            assert!(cycle.contains(&"a".to_string()));
            assert!(cycle.contains(&"b".to_string()));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(err.errors()[0].category(), ErrorCategory::Load);
}

#[test]
fn every_load_error_is_collected() {
    let err = load_source(
        "def entity b : ghost {}
         def location hall { exit_to = nowhere; }
         def entity c : phantom {}",
        EngineConfig::testing(),
    )
    .unwrap_err();
    assert_eq!(err.errors().len(), 3, "{:?}", err.errors());
    assert!(err.errors().iter().all(|e| e.category() == ErrorCategory::Load));
}

#[test]
fn declaration_kinds() {
    let w = world(
        "def region coast {}
         def location beach { region = coast; }
         def event storm {}
         def command dig { noun = false; }
         def entity crab { kind = #creature; location = beach; }
         def entity shell {}",
    );
    let kind = |name: &str| w.registry().entity(w.lookup(name).unwrap()).unwrap().kind();
    assert_eq!(kind("coast"), Kind::Region);
    assert_eq!(kind("beach"), Kind::Location);
    assert_eq!(kind("storm"), Kind::Event);
    assert_eq!(kind("dig"), Kind::Command);
    assert_eq!(kind("crab"), Kind::Creature);
    assert_eq!(kind("shell"), Kind::Thing);
    assert!(w.verbs().contains(&"dig".to_string()));
}

#[test]
fn contents_follow_location_members() {
    let w = world(
        "def location hall {}
         def entity chest { location = hall; }
         def entity coin { location = chest; }",
    );
    let hall = w.lookup("hall").unwrap();
    let chest = w.lookup("chest").unwrap();
    let coin = w.lookup("coin").unwrap();
    assert_eq!(w.registry().entity(hall).unwrap().contents(), &[chest]);
    assert_eq!(w.registry().entity(chest).unwrap().contents(), &[coin]);
    assert_eq!(w.enclosing_location(coin), Some(hall));
}

#[test]
fn init_blocks_can_mutate_the_world() {
    let mut w = world(
        "def location hall { init { addExit(east, yard); } }
         def location yard {}",
    );
    let hall = w.lookup("hall").unwrap();
    let exits = w.get_member(hall, "exits").unwrap();
    assert_eq!(w.format_value(&exits), "[[east, yard]]");
    assert_eq!(w.evaluate("exit(hall, east) == yard").unwrap(), Value::Bool(true));
}

#[test]
fn extending_an_undeclared_entity_fails() {
    let err = load_source("extend location attic { dusty = true; }", EngineConfig::testing()).unwrap_err();
    assert!(matches!(err.errors(), [e] if matches!(&e.kind, ErrorKind::ExtendUndeclared(n) if n == "attic")));
}
