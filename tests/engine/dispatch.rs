//! Event dispatch across participants and phases.

use lanthorn_storage::Value;

use crate::{texts, world};

const VAULT: &str = r#"
    def region keep {
        after open(actor) { say(actor, "region after"); }
    }
    def location vault {
        region = keep;
        allow open(actor) { return actor.cleared; }
        before open(actor) { say(actor, "vault before"); }
    }
    def entity guard { kind = #creature; location = vault; cleared = false; }
    def entity box {
        location = vault;
        before open(actor) { say(actor, "box before"); }
        when open(actor) { say(actor, "box opens"); }
        after open(actor) { say(actor, "box after"); }
    }
"#;

#[test]
fn a_refused_allow_runs_nothing_else() {
    let mut w = world(VAULT);
    let vault = w.lookup("vault").unwrap();
    let guard = w.lookup("guard").unwrap();
    let box_ = w.lookup("box").unwrap();

    let result = w.dispatch("open", box_, Some(guard), vec![guard.into()]).unwrap();
    assert!(!result.performed);
    assert_eq!(result.vetoed_by, Some(vault));
    assert!(texts(&w.take_updates()).is_empty());
}

#[test]
fn participants_run_target_then_location_then_region() {
    let mut w = world(VAULT);
    let guard = w.lookup("guard").unwrap();
    let box_ = w.lookup("box").unwrap();
    w.set_member(guard, "cleared", Value::Bool(true)).unwrap();

    let result = w.dispatch("open", box_, Some(guard), vec![guard.into()]).unwrap();
    assert!(result.performed);
    assert_eq!(
        texts(&w.take_updates()),
        vec!["box before", "vault before", "box opens", "box after", "region after"]
    );
}

#[test]
fn a_location_target_brings_its_own_region() {
    let mut w = world(VAULT);
    let vault = w.lookup("vault").unwrap();
    let guard = w.lookup("guard").unwrap();
    w.set_member(guard, "cleared", Value::Bool(true)).unwrap();

    let result = w.dispatch("open", vault, Some(guard), vec![guard.into()]).unwrap();
    assert!(result.performed);
    assert_eq!(texts(&w.take_updates()), vec!["vault before", "region after"]);
}

#[test]
fn prototype_handlers_stand_in_for_missing_ones() {
    let mut w = world(
        r#"def location cell {}
           def entity door {
               when knock(actor) { say(actor, "A hollow sound."); }
           }
           def entity oak_door : door { location = cell; }
           def entity iron_door : door {
               location = cell;
               when knock(actor) { say(actor, "Clang."); }
           }
           def entity visitor { location = cell; }"#,
    );
    let visitor = w.lookup("visitor").unwrap();
    for (name, expected) in [("oak_door", "A hollow sound."), ("iron_door", "Clang.")] {
        let door = w.lookup(name).unwrap();
        w.dispatch("knock", door, Some(visitor), vec![visitor.into()]).unwrap();
        assert_eq!(texts(&w.take_updates()), vec![expected]);
    }
}

#[test]
fn cancel_and_halt() {
    let mut w = world(
        r#"def location yard {}
           def entity well {
               location = yard;
               mode = #none;
               before drink(actor) { say(actor, "checking"); return self.mode; }
               when drink(actor) { say(actor, "gulp"); }
               after drink(actor) { say(actor, "refreshed"); }
           }
           def entity traveller { location = yard; }"#,
    );
    let well = w.lookup("well").unwrap();
    let traveller = w.lookup("traveller").unwrap();

    let outcomes = [
        ("#none", vec!["checking", "gulp", "refreshed"], true),
        ("#cancel", vec!["checking", "refreshed"], false),
        ("#halt", vec!["checking"], false),
    ];
    for (mode, expected, performed) in outcomes {
        let value = w.evaluate(mode).unwrap();
        w.set_member(well, "mode", value).unwrap();
        let result = w.dispatch("drink", well, Some(traveller), vec![traveller.into()]).unwrap();
        assert_eq!(result.performed, performed, "{mode}");
        assert_eq!(result.cancelled, !performed, "{mode}");
        assert_eq!(texts(&w.take_updates()), expected, "{mode}");
    }
}

#[test]
fn an_event_declaration_takes_part() {
    let mut w = world(
        r#"def location square {}
           def event festival {
               after festival(actor) { announce(square, "Fireworks!"); }
           }
           def entity mayor { location = square; when festival(actor) { say(actor, "Welcome!"); } }
           def entity crowd { location = square; }"#,
    );
    let mayor = w.lookup("mayor").unwrap();
    let crowd = w.lookup("crowd").unwrap();
    w.dispatch("festival", mayor, Some(crowd), vec![crowd.into()]).unwrap();
    assert_eq!(texts(&w.take_updates()), vec!["Welcome!", "Fireworks!"]);
}

#[test]
fn trigger_from_script_reports_performance() {
    let mut w = world(
        r#"def location hall {}
           def entity bell {
               location = hall;
               allow ring(actor) { return "The bell is cracked."; }
           }
           def entity ringer {
               location = hall;
               when startWorld() { self.rang = trigger(#ring, bell, self); }
           }"#,
    );
    let ringer = w.lookup("ringer").unwrap();
    let updates = w.advance_tick();
    assert_eq!(texts(&updates), vec!["The bell is cracked."]);
    assert_eq!(w.get_member(ringer, "rang").unwrap(), Value::Bool(false));
}

#[test]
fn suspended_handlers_become_tasks() {
    let mut w = world(
        r#"def location hall {}
           def entity kettle {
               location = hall;
               when boil(actor) { say(actor, "It starts to hum."); await sleep(2); announce(self, "The kettle whistles."); }
           }
           def entity cook { location = hall; }"#,
    );
    let kettle = w.lookup("kettle").unwrap();
    let cook = w.lookup("cook").unwrap();
    let result = w.dispatch("boil", kettle, Some(cook), vec![cook.into()]).unwrap();
    assert!(result.performed);
    assert_eq!(texts(&w.take_updates()), vec!["It starts to hum."]);

    let task = w.tasks_for(kettle)[0];
    assert_eq!(w.task_label(task), Some("kettle.boil"));
    assert!(texts(&w.advance_tick()).is_empty());
    assert_eq!(texts(&w.advance_tick()), vec!["The kettle whistles."]);
}
