//! Integration tests for the printer
//!
//! Pretty-printed world files parse back to the same declarations.

use lanthorn_language::visitor::items_without_spans;
use lanthorn_language::{Item, parse, print_declaration, print_program};

#[test]
fn printed_world_parses_back() {
    let source = r#"
        def location hall {
            name = "Great Hall";
            init { addExit(down, cellar); }
            when look(actor) if actor.lamp { say(actor, "Shadows dance."); }
        }
        def location cellar { name = "Cellar"; }
        def entity rat {
            location = cellar;
            when startWorld() {
                for n in 0..3 { await sleep(n + 1); announce(self.location, "Squeak {n}!"); }
            }
        }
    "#;
    let first = parse(source).unwrap();
    let printed = print_program(&first);
    let second = parse(&printed).unwrap();
    assert_eq!(items_without_spans(&first), items_without_spans(&second));
    assert_eq!(print_program(&second), printed);
}

#[test]
fn declarations_print_one_member_per_line() {
    let items = parse("def entity lamp{lit=false;aliases=[\"lantern\"];}").unwrap();
    let Item::Declaration(decl) = &items[0] else {
        panic!("expected a declaration");
    };
    assert_eq!(
        print_declaration(decl),
        "def entity lamp {\n    lit = false;\n    aliases = [\"lantern\"];\n}"
    );
}
