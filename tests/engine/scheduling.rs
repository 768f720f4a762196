//! Tasks, ticks, and suspension.

use lanthorn_engine::{TaskState, Update, WakeCondition};
use lanthorn_storage::Value;

use crate::{texts, world};

fn exit_count(w: &lanthorn_engine::World, name: &str) -> usize {
    let id = w.lookup(name).unwrap();
    match w.get_member(id, "exits").unwrap() {
        Value::List(list) => list.len(),
        other => panic!("exits is {other:?}"),
    }
}

#[test]
fn timed_exit_opens_and_closes() {
    let mut w = world(
        "def location shore {
             when startWorld() {
                 addExit(east, island);
                 await sleep(5);
                 removeExit(east, island);
             }
         }
         def location island {}",
    );
    let shore = w.lookup("shore").unwrap();
    assert_eq!(exit_count(&w, "shore"), 0);

    for _ in 0..5 {
        w.advance_tick();
    }
    assert_eq!(exit_count(&w, "shore"), 1);
    assert_eq!(w.tasks_for(shore).len(), 1);

    w.advance_tick();
    assert_eq!(exit_count(&w, "shore"), 0);
    assert!(w.tasks_for(shore).is_empty());
}

#[test]
fn one_sleeper_does_not_hold_up_another() {
    let mut w = world(
        "def entity tortoise { when startWorld() { await sleep(50); self.done = true; } }
         def entity hare { when startWorld() { self.done = true; } }",
    );
    let tortoise = w.lookup("tortoise").unwrap();
    let hare = w.lookup("hare").unwrap();
    w.advance_tick();
    assert_eq!(w.get_member(hare, "done").unwrap(), Value::Bool(true));
    assert_eq!(w.get_member(tortoise, "done").unwrap(), Value::Nil);
    let task = w.tasks_for(tortoise)[0];
    assert_eq!(w.task_state(task), Some(TaskState::Suspended(WakeCondition::At(51))));
    assert_eq!(w.task_label(task), Some("tortoise.startWorld"));
}

#[test]
fn locals_survive_suspension() {
    let mut w = world(
        "def entity abacus {
             when startWorld() {
                 let total = 0;
                 for n in [1, 2, 3] {
                     total = total + n;
                     await sleep(1);
                 }
                 self.total = total;
             }
         }",
    );
    let abacus = w.lookup("abacus").unwrap();
    for _ in 0..3 {
        w.advance_tick();
        assert_eq!(w.get_member(abacus, "total").unwrap(), Value::Nil);
    }
    w.advance_tick();
    assert_eq!(w.get_member(abacus, "total").unwrap(), Value::Number(6.0));
}

#[test]
fn signals_wake_waiting_tasks_next_tick() {
    let mut w = world(
        r#"def location hall {}
           def entity door {
               location = hall;
               when startWorld() {
                   let who = await waitFor(#knock);
                   announce(self, "The door opens for " + who + ".");
               }
           }
           def entity visitor {
               when startWorld() { await sleep(2); signal(door, #knock, "Ada"); }
           }"#,
    );
    let door = w.lookup("door").unwrap();
    w.advance_tick();
    let task = w.tasks_for(door)[0];
    assert!(matches!(w.task_state(task), Some(TaskState::Suspended(WakeCondition::Signal(_)))));

    assert!(texts(&w.advance_tick()).is_empty());
    assert!(texts(&w.advance_tick()).is_empty());
    assert_eq!(texts(&w.advance_tick()), vec!["The door opens for Ada."]);
    assert!(w.tasks_for(door).is_empty());
}

#[test]
fn after_runs_a_closure_later() {
    let mut w = world(
        r#"def location hall {}
           def entity fuse {
               location = hall;
               when startWorld() { after(3, fn() { announce(self, "Bang!"); }); }
           }"#,
    );
    assert!(texts(&w.advance_tick()).is_empty());
    assert_eq!(w.task_count(), 1);
    assert!(texts(&w.advance_tick()).is_empty());
    assert!(texts(&w.advance_tick()).is_empty());
    assert_eq!(texts(&w.advance_tick()), vec!["Bang!"]);
    assert_eq!(w.task_count(), 0);
}

#[test]
fn removing_an_entity_cancels_its_tasks() {
    let mut w = world(
        "def location hall {}
         def entity cricket {
             location = hall;
             when startWorld() { while true { await sleep(1); announce(self, \"Chirp.\"); } }
         }",
    );
    let cricket = w.lookup("cricket").unwrap();
    w.advance_tick();
    assert_eq!(texts(&w.advance_tick()), vec!["Chirp."]);
    w.remove_entity(cricket).unwrap();
    assert_eq!(w.task_count(), 0);
    assert!(texts(&w.advance_tick()).is_empty());
}

#[test]
fn faults_stay_inside_their_task() {
    let mut w = world(
        "def entity broken { when startWorld() { await sleep(1); self.x = 1 / 0; } }
         def entity steady { count = 0; when startWorld() { while true { await sleep(1); self.count = self.count + 1; } } }",
    );
    let steady = w.lookup("steady").unwrap();
    w.advance_tick();
    let updates = w.advance_tick();
    assert!(updates.iter().any(|u| matches!(u, Update::Fault { task: Some(_), message, .. } if message.contains("division by zero"))));
    w.advance_tick();
    assert_eq!(w.get_member(steady, "count").unwrap(), Value::Number(2.0));
    assert_eq!(w.task_count(), 1);
}

#[test]
fn bad_random_bounds_fault_only_their_task() {
    let mut w = world(
        r#"def entity dice { when startWorld() { self.roll = random(num("inf")); } }
         def entity steady { count = 0; when startWorld() { self.count = self.count + 1; } }"#,
    );
    let dice = w.lookup("dice").unwrap();
    let steady = w.lookup("steady").unwrap();
    let updates = w.advance_tick();
    assert!(updates.iter().any(|u| matches!(u, Update::Fault { task: Some(_), message, .. } if message.contains("finite"))), "{updates:?}");
    assert_eq!(w.get_member(dice, "roll").unwrap(), Value::Nil);
    assert_eq!(w.get_member(steady, "count").unwrap(), Value::Number(1.0));
    assert_eq!(w.task_count(), 0);
}

#[test]
fn external_requests_wait_for_an_answer() {
    let mut w = world(
        "def entity sphinx {
             when startWorld() { let reply = await request(#riddle, \"What walks on four legs?\"); self.reply = reply; }
         }",
    );
    let sphinx = w.lookup("sphinx").unwrap();
    let updates = w.advance_tick();
    let Some(task) = updates.iter().find_map(|u| match u {
        Update::Request { task, kind, .. } if kind == "riddle" => Some(*task),
        _ => None,
    }) else {
        panic!("no request in {updates:?}");
    };

    for _ in 0..3 {
        w.advance_tick();
    }
    assert_eq!(w.get_member(sphinx, "reply").unwrap(), Value::Nil);
    assert!(w.resume_task(task, Value::text("a man")));
    w.advance_tick();
    assert_eq!(w.get_member(sphinx, "reply").unwrap(), Value::text("a man"));
}
