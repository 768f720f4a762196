//! Expressions, closures, and runtime faults.

use lanthorn_foundation::{ErrorCategory, ErrorKind};
use lanthorn_storage::Value;

use crate::world;

const LIBRARY: &str = r#"
    def entity shelf {
        books = ["atlas", "bestiary", "chronicle"];
        init {
            let bonus = 10;
            fn withBonus(x) { return x + bonus; }
            self.scorer = withBonus;
        }
        when dive(actor) {
            fn down(n) { return down(n + 1); }
            down(0);
        }
    }
"#;

fn show(source: &str) -> String {
    let mut w = world(LIBRARY);
    let value = w.evaluate(source).unwrap();
    w.format_value(&value)
}

#[test]
fn arithmetic_and_text() {
    assert_eq!(show("1 + 2 * 3"), "7");
    assert_eq!(show("7 / 2"), "3.5");
    assert_eq!(show(r#""page " + 4"#), "page 4");
    assert_eq!(show(r#""{2 + 2} lanterns""#), "4 lanterns");
    assert_eq!(show("len(shelf.books)"), "3");
    assert_eq!(show("shelf.books[1]"), "bestiary");
}

#[test]
fn comprehensions_and_builtins() {
    assert_eq!(show("[n * n for n in range(4)]"), "[0, 1, 4, 9]");
    assert_eq!(show("[upper(b) for b in shelf.books if len(b) > 5]"), r#"["BESTIARY", "CHRONICLE"]"#);
    assert_eq!(show(r#"join(shelf.books, ", ")"#), "atlas, bestiary, chronicle");
    assert_eq!(show("typeOf(#north)"), "symbol");
}

#[test]
fn symbols_are_not_text() {
    let mut w = world(LIBRARY);
    assert_eq!(w.evaluate(r#"#atlas == "atlas""#).unwrap(), Value::Bool(false));
    assert_eq!(w.evaluate("#north == north").unwrap(), Value::Bool(true));
}

#[test]
fn logic_short_circuits() {
    let mut w = world(LIBRARY);
    assert_eq!(w.evaluate("false and 1 / 0").unwrap(), Value::Bool(false));
    assert_eq!(w.evaluate("true or 1 / 0").unwrap(), Value::Bool(true));
}

#[test]
fn closures_keep_their_defining_scope() {
    let mut w = world(LIBRARY);
    assert_eq!(w.evaluate("shelf.scorer(5)").unwrap(), Value::Number(15.0));
    assert_eq!(w.evaluate("(fn(x) { return x * 2; })(21)").unwrap(), Value::Number(42.0));
}

#[test]
fn local_helpers_may_call_later_siblings() {
    let mut w = world(
        "def entity parity {
             when check(actor) {
                 fn isEven(n) { if n == 0 { return true; } return isOdd(n - 1); }
                 fn isOdd(n) { if n == 0 { return false; } return isEven(n - 1); }
                 self.even = isEven(6);
                 self.odd = isOdd(6);
             }
         }",
    );
    let parity = w.lookup("parity").unwrap();
    w.dispatch("check", parity, None, vec![Value::Nil]).unwrap();
    assert_eq!(w.get_member(parity, "even").unwrap(), Value::Bool(true));
    assert_eq!(w.get_member(parity, "odd").unwrap(), Value::Bool(false));
}

#[test]
fn direction_constants_cannot_be_reassigned() {
    let mut w = world(
        "def entity compass {
             when spin(actor) { north = #south; self.pointed = north; }
         }",
    );
    let compass = w.lookup("compass").unwrap();
    w.dispatch("spin", compass, None, vec![Value::Nil]).unwrap();
    w.dispatch("spin", compass, None, vec![Value::Nil]).unwrap();
    let pointed = w.get_member(compass, "pointed").unwrap();
    assert_eq!(w.format_value(&pointed), "south");
    assert_eq!(w.evaluate("north == #north").unwrap(), Value::Bool(true));
}

#[test]
fn random_bounds_must_be_finite() {
    let mut w = world(LIBRARY);
    for source in [r#"random(num("inf"))"#, r#"chance(num("NaN"))"#, r#"randomInt(num("-inf"), 3)"#] {
        let err = w.evaluate(source).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidArgument { .. }), "{source}: {err}");
        assert_eq!(err.category(), ErrorCategory::Runtime);
    }
    let roll = w.evaluate("randomInt(1, 6)").unwrap();
    assert!(matches!(roll, Value::Number(n) if (1.0..=6.0).contains(&n)));
}

#[test]
fn faults_name_the_operation() {
    let mut w = world(LIBRARY);
    let err = w.evaluate("len(1, 2)").unwrap_err();
    match &err.kind {
        ErrorKind::ArityMismatch { operation, actual, .. } => {
            assert_eq!(operation, "len");
            assert_eq!(*actual, 2);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(err.category(), ErrorCategory::Runtime);

    let err = w.evaluate("1 - true").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::TypeMismatch { .. }));
    let err = w.evaluate("shelf.books[7]").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::IndexOutOfBounds { .. }));
}

#[test]
fn await_is_refused_outside_handlers() {
    let mut w = world(LIBRARY);
    assert!(w.evaluate("await sleep(1)").is_err());
}

#[test]
fn runaway_recursion_hits_the_depth_limit() {
    let mut w = world(LIBRARY);
    let shelf = w.lookup("shelf").unwrap();
    let err = w.dispatch("dive", shelf, None, vec![]).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::CallDepthExceeded { limit: 32 }), "{err:?}");
}
