//! Scripted play sessions through the console.

use lanthorn_engine::{EngineConfig, load_source};
use lanthorn_runtime::{Console, ScriptEditor, Session, load_files};
use lanthorn_storage::Value;

use crate::{CAST, ROOMS, Scratch};

fn play(session: Session, script: &str) -> (String, Session) {
    let mut out = Vec::new();
    let mut console = Console::with_editor(ScriptEditor::new(script.as_bytes()), session, &mut out);
    console.run().unwrap();
    let session = console.into_session();
    (String::from_utf8(out).unwrap(), session)
}

#[test]
fn a_walk_around_the_village() {
    let dir = Scratch::new("walk");
    let rooms = dir.write("rooms.lan", ROOMS);
    dir.write("cast.lan", CAST);
    let (world, _) = load_files(&[rooms], EngineConfig::testing()).unwrap();
    let session = Session::join(world, "villager", None).unwrap();

    let script = "look\neast\ngreet miller\ngreet sack\ntake sack\n:tick 3\n:quit\ninventory\n";
    let (out, session) = play(session, script);

    assert!(out.contains("> look\nVillage Green\nExits: east."), "{out}");
    assert!(out.contains("Old Mill"), "{out}");
    assert!(out.contains("The miller nods."), "{out}");
    assert!(out.contains("You wave."), "{out}");
    assert!(out.contains("You take the flour sack."), "{out}");
    assert_eq!(out.matches("The millstone grinds.").count(), 2, "{out}");
    assert!(out.contains("[tick 8]"), "{out}");
    assert!(!out.contains("> inventory"), "{out}");

    let world = session.world();
    let sack = world.lookup("sack").unwrap();
    assert_eq!(world.registry().entity(sack).unwrap().location(), Some(session.avatar()));
    assert_eq!(world.enclosing_location(session.avatar()), world.lookup("mill"));
}

#[test]
fn requests_are_answered_from_the_console() {
    let (world, _) = load_source(
        r#"def location temple {}
           def entity pilgrim { location = temple; }
           def command consult {
               noun = false;
               when consult(actor, rest) {
                   let question = await request(#question, "Ask away");
                   say(actor, "The oracle ponders " + question + ".");
               }
           }"#,
        EngineConfig::testing(),
    )
    .unwrap();
    let session = Session::join(world, "pilgrim", None).unwrap().with_ticks_per_command(0);

    let script = ":answer 1 \"too soon\"\nconsult\n:tasks\n:answer 1 \"the sky\"\n:tick\n";
    let (out, session) = play(session, script);

    assert!(out.contains("[error] internal error: no task#1"), "{out}");
    assert!(out.contains("[task#1 requests question: \"Ask away\"]"), "{out}");
    assert!(out.contains("task#1 consult.consult"), "{out}");
    assert!(out.contains("[task#1 will resume next tick]"), "{out}");
    assert!(out.contains("The oracle ponders the sky."), "{out}");
    assert!(session.pending_requests().is_empty());
    assert_eq!(session.world().task_count(), 0);
}

#[test]
fn script_faults_do_not_end_the_session() {
    let (world, _) = load_source(
        "def location cave {}
         def entity spelunker { location = cave; depth = 0; }
         def entity stalactite { location = cave; when touch(actor, rest) { actor.depth = actor.depth / 0; } }
         def command touch {}",
        EngineConfig::testing(),
    )
    .unwrap();
    let session = Session::join(world, "spelunker", None).unwrap();

    let (out, session) = play(session, "touch stalactite\n:eval 2 + 2\n");
    assert!(out.contains("[error] division by zero"), "{out}");
    assert!(out.contains("> :eval 2 + 2\n4\n"), "{out}");
    let depth = session.world().get_member(session.avatar(), "depth").unwrap();
    assert_eq!(depth, Value::Number(0.0));
}
