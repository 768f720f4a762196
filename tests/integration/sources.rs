//! Loading worlds from files.

use lanthorn_engine::EngineConfig;
use lanthorn_runtime::{SourceError, load_files};
use lanthorn_storage::Kind;

use crate::{CAST, ROOMS, Scratch};

#[test]
fn includes_join_files_into_one_world() {
    let dir = Scratch::new("includes");
    let rooms = dir.write("rooms.lan", ROOMS);
    dir.write("cast.lan", CAST);

    let (world, skipped) = load_files(&[rooms], EngineConfig::testing()).unwrap();
    assert!(skipped.is_empty());

    let miller = world.lookup("miller").unwrap();
    let mill = world.lookup("mill").unwrap();
    let village = world.lookup("village").unwrap();
    assert_eq!(world.registry().entity(miller).unwrap().location(), Some(mill));
    assert_eq!(world.registry().entity(village).unwrap().kind(), Kind::Region);
    assert_eq!(world.tasks_for(miller).len(), 1);
    assert!(world.verbs().contains(&"greet".to_string()));
}

#[test]
fn broken_declarations_are_skipped_not_fatal() {
    let dir = Scratch::new("skipped");
    let rooms = dir.write("rooms.lan", ROOMS);
    dir.write("cast.lan", &format!("{CAST}\ndef entity scarecrow {{ straw = ; }}\n"));

    let (world, skipped) = load_files(&[rooms], EngineConfig::testing()).unwrap();
    assert_eq!(skipped.len(), 1);
    assert!(skipped[0].path.ends_with("cast.lan"));
    assert!(world.lookup("scarecrow").is_none());
    assert!(world.lookup("miller").is_some());
}

#[test]
fn load_errors_span_files() {
    let dir = Scratch::new("load-errors");
    let rooms = dir.write("rooms.lan", ROOMS);
    dir.write("cast.lan", &CAST.replace("location = mill;", "location = windmill;"));

    match load_files(&[rooms], EngineConfig::testing()) {
        Err(SourceError::Load(errors)) => assert!(!errors.errors().is_empty()),
        Err(other) => panic!("unexpected {other}"),
        Ok(_) => panic!("load should fail"),
    }
}

#[test]
fn missing_files_are_read_errors() {
    let dir = Scratch::new("missing");
    let result = load_files(&[dir.path().join("nowhere.lan")], EngineConfig::testing());
    assert!(matches!(result, Err(SourceError::Read(_))));
}
