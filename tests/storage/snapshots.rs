//! Integration tests for snapshots

use lanthorn_storage::{Kind, Registry, SnapshotValue, Value, WorldSnapshot};

#[test]
fn snapshot_names_entities_by_identifier() {
    let mut r = Registry::new();
    let hall = r.insert("hall", Kind::Location, None).unwrap();
    let cellar = r.insert("cellar", Kind::Location, None).unwrap();
    let lamp = r.insert("lamp", Kind::Item, None).unwrap();
    let down = r.intern("down");
    let lit = r.intern("lit");
    r.add_exit(hall, down, cellar).unwrap();
    r.move_entity(lamp, Some(hall)).unwrap();
    r.set_member(lamp, "state", Value::Symbol(lit)).unwrap();
    r.set_member(lamp, "seen", Value::list([Value::Entity(hall), Value::Number(1.5)]))
        .unwrap();

    let snapshot = WorldSnapshot::capture(&r, 9);
    assert_eq!(snapshot.tick, 9);

    let hall_snap = snapshot.entity("hall").unwrap();
    assert_eq!(hall_snap.kind, "location");
    assert_eq!(hall_snap.exits, vec![("down".to_string(), "cellar".to_string())]);

    let lamp_snap = snapshot.entity("lamp").unwrap();
    assert_eq!(lamp_snap.location.as_deref(), Some("hall"));
    assert_eq!(lamp_snap.members["state"], SnapshotValue::Symbol("lit".into()));
    assert_eq!(
        lamp_snap.members["seen"],
        SnapshotValue::List(vec![
            SnapshotValue::Entity(Some("hall".into())),
            SnapshotValue::Number(1.5)
        ])
    );
}

#[test]
fn dangling_references_snapshot_as_none() {
    let mut r = Registry::new();
    let ghost = r.insert("ghost", Kind::Thing, None).unwrap();
    let note = r.insert("note", Kind::Item, None).unwrap();
    r.set_member(note, "author", Value::Entity(ghost)).unwrap();
    r.remove(ghost).unwrap();

    let snapshot = WorldSnapshot::capture(&r, 0);
    assert_eq!(snapshot.entities.len(), 1);
    assert_eq!(snapshot.entity("note").unwrap().members["author"], SnapshotValue::Entity(None));
}
