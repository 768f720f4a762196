//! Integration tests for the parser
//!
//! Whole world files, recovery, and error reporting.

use lanthorn_foundation::{ErrorCategory, ErrorKind};
use lanthorn_language::{DeclKind, HandlerKind, Item, Stmt, parse, parse_recovering};

const TAVERN: &str = r#"
include "common.lan";

def region village {
    name = "Little Hampton";
    when rain() { log("drizzle"); }
}

def location tavern {
    name = "The Prancing Pony";
    region = village;
    description = """
        Smoke curls under low beams.
        """;
    init { addExit(out, square); }
}

def location square { name = "Village Square"; region = village; }

def entity barkeep : npc requires tavern {
    name = `Barliman`;
    location = tavern;
    mood = #cheerful;
    allow talk(actor) if actor.banned { return "He glares."; }
    before talk(actor) { if self.mood == #grumpy { return #cancel; } }
    when talk(actor, rest) { say(actor, "What'll it be?"); }
    after talk(actor) { self.mood = #busy; }
    when startWorld() {
        while true {
            await sleep(10);
            announce(self.location, "Barliman polishes a mug.");
        }
    }
}

def command talk { verbs = ["talk", "chat"]; noun = true; }

extend location tavern { lit = true; }
"#;

fn declarations(items: &[Item]) -> Vec<(DeclKind, &str, bool)> {
    items
        .iter()
        .filter_map(|item| match item {
            Item::Declaration(d) => Some((d.kind, d.name.as_str(), d.extend)),
            Item::Include(..) => None,
        })
        .collect()
}

// =============================================================================
// Whole Files
// =============================================================================

#[test]
fn parse_tavern() {
    let items = parse(TAVERN).unwrap();
    assert!(matches!(&items[0], Item::Include(path, _) if path == "common.lan"));
    assert_eq!(
        declarations(&items),
        vec![
            (DeclKind::Region, "village", false),
            (DeclKind::Location, "tavern", false),
            (DeclKind::Location, "square", false),
            (DeclKind::Entity, "barkeep", false),
            (DeclKind::Command, "talk", false),
            (DeclKind::Location, "tavern", true),
        ]
    );
}

#[test]
fn barkeep_members() {
    let items = parse(TAVERN).unwrap();
    let barkeep = items
        .iter()
        .find_map(|item| match item {
            Item::Declaration(d) if d.name == "barkeep" => Some(d),
            _ => None,
        })
        .unwrap();

    assert_eq!(barkeep.prototype.as_deref(), Some("npc"));
    assert_eq!(barkeep.requires, vec!["tavern"]);

    let fields: Vec<_> = barkeep.fields().map(|(name, _)| name).collect();
    assert_eq!(fields, vec!["name", "location", "mood"]);

    let handlers: Vec<_> = barkeep.handlers().map(|h| (h.kind, h.event.as_str(), h.params.len())).collect();
    assert_eq!(
        handlers,
        vec![
            (HandlerKind::Allow, "talk", 1),
            (HandlerKind::Before, "talk", 1),
            (HandlerKind::When, "talk", 2),
            (HandlerKind::After, "talk", 1),
            (HandlerKind::When, "startWorld", 0),
        ]
    );

    let start = barkeep.handlers().last().unwrap();
    assert!(matches!(start.body.stmts[0], Stmt::While { .. }));
}

// =============================================================================
// Recovery
// =============================================================================

#[test]
fn recovery_keeps_every_good_declaration() {
    let source = format!("{TAVERN}\ndef entity broken {{ x = ; }}\ndef entity stool {{ location = tavern; }}");
    let (items, errors) = parse_recovering(&source);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].category(), ErrorCategory::Parse);
    let names: Vec<_> = declarations(&items).into_iter().map(|(_, name, _)| name).collect();
    assert!(names.contains(&"stool"));
    assert!(!names.contains(&"broken"));
}

#[test]
fn strict_parse_fails_on_the_first_error() {
    let err = parse("def entity a {}\ndef entity b { when go( { } }").unwrap_err();
    let ErrorKind::Parse { line, .. } = err.kind else {
        panic!("expected a parse error, got {:?}", err.kind);
    };
    assert_eq!(line, 2);
}

#[test]
fn await_only_inside_handlers() {
    assert!(parse("def entity a { init { await sleep(1); } }").is_ok());
    assert!(parse("def entity a { when go() { fn f() { await sleep(1); } } }").is_err());
}

mod prop {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn recovering_parse_never_panics(source in "[a-z{}();=#\"` \\n]{0,120}") {
            let (_items, errors) = parse_recovering(&source);
            for error in errors {
                prop_assert!(matches!(error.category(), ErrorCategory::Parse | ErrorCategory::Lex));
            }
        }
    }
}
