//! Saving world snapshots.

use lanthorn_engine::EngineConfig;
use lanthorn_runtime::{Console, ScriptEditor, Session, load_files, load_from_file, save_to_file};
use lanthorn_storage::SnapshotValue;

use crate::{CAST, ROOMS, Scratch};

fn village(dir: &Scratch) -> Session {
    let rooms = dir.write("rooms.lan", ROOMS);
    dir.write("cast.lan", CAST);
    let (world, _) = load_files(&[rooms], EngineConfig::testing()).unwrap();
    Session::join(world, "villager", Some("mill")).unwrap()
}

#[test]
fn snapshots_survive_a_trip_through_a_file() {
    let dir = Scratch::new("snapshot-file");
    let mut session = village(&dir);
    session.submit("take sack").unwrap();
    session.advance(4);

    let snapshot = session.world().snapshot();
    let path = dir.path().join("village.snap");
    save_to_file(&snapshot, &path).unwrap();
    let loaded = load_from_file(&path).unwrap();
    assert_eq!(loaded, snapshot);

    assert_eq!(loaded.tick, 5);
    let sack = loaded.entity("sack").unwrap();
    assert_eq!(sack.location.as_deref(), Some("villager#1"));
    assert_eq!(sack.kind, "item");
    let avatar = loaded.entity("villager#1").unwrap();
    assert_eq!(avatar.prototype.as_deref(), Some("villager"));
    assert_eq!(avatar.kind, "avatar");
    let green = loaded.entity("green").unwrap();
    assert_eq!(green.exits, vec![("east".to_string(), "mill".to_string())]);
    assert_eq!(green.members["region"], SnapshotValue::Entity(Some("village".into())));
}

#[test]
fn the_console_saves_on_request() {
    let dir = Scratch::new("snapshot-console");
    let session = village(&dir).with_ticks_per_command(0);
    let path = dir.path().join("saved.snap");

    let script = format!("take sack\n:save {}\n:save\n", path.display());
    let mut out = Vec::new();
    let mut console = Console::with_editor(ScriptEditor::new(script.as_bytes()), session, &mut out);
    console.run().unwrap();
    let out = String::from_utf8(out).unwrap();

    assert!(out.contains("[saved tick 0 to "), "{out}");
    assert!(out.contains("[error] io error: usage: :save <path>"), "{out}");
    let saved = load_from_file(&path).unwrap();
    assert_eq!(saved.entity("sack").unwrap().location.as_deref(), Some("villager#1"));
}
