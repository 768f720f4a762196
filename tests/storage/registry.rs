//! Integration tests for the registry
//!
//! Prototype delegation, containment, exits, and removal.

use lanthorn_foundation::ErrorKind;
use lanthorn_storage::{Kind, Registry, Value};

fn village() -> Registry {
    let mut r = Registry::new();
    let square = r.insert("square", Kind::Location, None).unwrap();
    let inn = r.insert("inn", Kind::Location, None).unwrap();
    let north = r.intern("north");
    let south = r.intern("south");
    r.add_exit(square, north, inn).unwrap();
    r.add_exit(inn, south, square).unwrap();

    let goblin = r.insert("goblin", Kind::Creature, None).unwrap();
    r.set_member(goblin, "hp", Value::Number(7.0)).unwrap();
    r.set_member(goblin, "name", Value::text("goblin")).unwrap();
    r
}

// =============================================================================
// Prototypes
// =============================================================================

#[test]
fn instances_delegate_to_prototypes() {
    let mut r = village();
    let goblin = r.lookup("goblin").unwrap();
    let square = r.lookup("square").unwrap();
    let grunt = r.spawn(goblin, Some(square)).unwrap();

    assert_eq!(r.name_of(grunt), "goblin#1");
    assert_eq!(r.entity(grunt).unwrap().kind(), Kind::Creature);
    assert_eq!(r.get_member(grunt, "hp").unwrap(), Value::Number(7.0));
    assert_eq!(r.member_owner(grunt, "hp"), Some(goblin));

    r.set_member(grunt, "hp", Value::Number(2.0)).unwrap();
    assert_eq!(r.get_member(grunt, "hp").unwrap(), Value::Number(2.0));
    assert_eq!(r.get_member(goblin, "hp").unwrap(), Value::Number(7.0));

    r.clear_member(grunt, "hp").unwrap();
    assert_eq!(r.get_member(grunt, "hp").unwrap(), Value::Number(7.0));
}

#[test]
fn prototype_chains_reject_cycles() {
    let mut r = Registry::new();
    let a = r.insert("a", Kind::Thing, None).unwrap();
    let b = r.insert("b", Kind::Thing, Some(a)).unwrap();
    let c = r.insert("c", Kind::Thing, Some(b)).unwrap();
    assert_eq!(r.prototype_chain(c), vec![c, b, a]);
    assert!(r.is_a(c, a));
    assert!(!r.is_a(a, c));

    let err = r.set_prototype(a, Some(c)).unwrap_err();
    let ErrorKind::CyclicPrototype { cycle } = err.kind else {
        panic!("expected a cycle, got {:?}", err.kind);
    };
    assert_eq!(cycle.first(), cycle.last());
    assert_eq!(r.prototype_chain(c), vec![c, b, a]);
}

#[test]
fn native_members_read_like_script_members() {
    let r = village();
    let square = r.lookup("square").unwrap();
    assert_eq!(r.get_member(square, "id").unwrap(), Value::text("square"));
    assert!(r.has_member(square, "exits"));
    assert!(r.has_member(square, "contents"));
    assert!(!r.has_member(square, "hp"));
    assert_eq!(r.get_member(square, "hp").unwrap(), Value::Nil);
}

#[test]
fn read_only_natives_refuse_writes() {
    let mut r = village();
    let square = r.lookup("square").unwrap();
    let err = r.set_member(square, "contents", Value::list([])).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ReadOnlyMember { .. }));
}

// =============================================================================
// Containment
// =============================================================================

#[test]
fn containment_is_acyclic() {
    let mut r = Registry::new();
    let room = r.insert("room", Kind::Location, None).unwrap();
    let bag = r.insert("bag", Kind::Item, None).unwrap();
    let box_ = r.insert("box", Kind::Item, None).unwrap();
    r.move_entity(bag, Some(room)).unwrap();
    r.move_entity(box_, Some(bag)).unwrap();

    assert!(r.encloses(room, box_));
    let err = r.move_entity(bag, Some(box_)).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::InvalidMove { .. }));
    assert_eq!(r.entity(room).unwrap().contents(), &[bag]);
    assert_eq!(r.entity(bag).unwrap().location(), Some(room));
}

#[test]
fn removal_takes_contents_and_exits() {
    let mut r = village();
    let square = r.lookup("square").unwrap();
    let inn = r.lookup("inn").unwrap();
    let keg = r.insert("keg", Kind::Item, None).unwrap();
    r.move_entity(keg, Some(inn)).unwrap();

    let removed = r.remove(inn).unwrap();
    let names: Vec<_> = removed.iter().map(|e| e.name().to_string()).collect();
    assert_eq!(names, vec!["inn", "keg"]);
    assert!(!r.contains(inn));
    assert!(!r.contains(keg));
    assert!(r.lookup("inn").is_none());
    assert!(r.entity(square).unwrap().exits().is_empty());

    // the freed slot is reused with a new generation
    let tavern = r.insert("tavern", Kind::Location, None).unwrap();
    assert_ne!(tavern, inn);
    assert!(r.get(inn).is_none());
}

#[test]
fn exits_replace_by_direction() {
    let mut r = village();
    let square = r.lookup("square").unwrap();
    let inn = r.lookup("inn").unwrap();
    let north = r.intern("north");
    assert_eq!(r.exit(square, north), Some(inn));
    assert!(!r.add_exit(square, north, inn).unwrap());

    let well = r.insert("well", Kind::Location, None).unwrap();
    assert!(r.add_exit(square, north, well).unwrap());
    assert_eq!(r.exit(square, north), Some(well));
    assert_eq!(r.entity(square).unwrap().exits().len(), 1);
}

#[test]
fn expiry_is_reported_once_due() {
    let mut r = Registry::new();
    let spark = r.insert("spark", Kind::Thing, None).unwrap();
    let ember = r.insert("ember", Kind::Thing, None).unwrap();
    r.set_expiry(spark, Some(3)).unwrap();
    r.set_expiry(ember, Some(5)).unwrap();
    assert!(r.expired(2).is_empty());
    assert_eq!(r.expired(3), vec![spark]);
    assert_eq!(r.expired(5).len(), 2);
}

// =============================================================================
// Properties
// =============================================================================

mod properties {
    use std::collections::HashMap;

    use lanthorn_storage::{Kind, Registry, Value};
    use proptest::prelude::*;

    const MEMBERS: [&str; 4] = ["hp", "mood", "gold", "title"];

    proptest! {
        /// Writes through an instance land on the instance; the prototype
        /// keeps its values and unwritten members still delegate.
        #[test]
        fn instance_writes_never_reach_the_prototype(
            writes in proptest::collection::vec((0usize..MEMBERS.len(), -50i64..50), 0..24),
        ) {
            let mut r = Registry::new();
            let goblin = r.insert("goblin", Kind::Creature, None).unwrap();
            for (i, name) in MEMBERS.iter().enumerate() {
                r.set_member(goblin, name, Value::from(i as i64 * 100)).unwrap();
            }
            let grunt = r.spawn(goblin, None).unwrap();

            let mut written = HashMap::new();
            for (member, value) in &writes {
                r.set_member(grunt, MEMBERS[*member], Value::from(*value)).unwrap();
                written.insert(*member, *value);
            }

            for (i, name) in MEMBERS.iter().enumerate() {
                let inherited = Value::from(i as i64 * 100);
                prop_assert_eq!(r.get_member(goblin, name).unwrap(), inherited.clone());
                match written.get(&i) {
                    Some(value) => {
                        prop_assert_eq!(r.get_member(grunt, name).unwrap(), Value::from(*value));
                        prop_assert_eq!(r.member_owner(grunt, name), Some(grunt));
                    }
                    None => {
                        prop_assert_eq!(r.get_member(grunt, name).unwrap(), inherited);
                        prop_assert_eq!(r.member_owner(grunt, name), Some(goblin));
                    }
                }
            }
        }
    }
}

