//! Integration tests for lexical scopes

use lanthorn_storage::{Scope, Value};

#[test]
fn lookup_walks_outward_and_shadows() {
    let globals = Scope::root();
    globals.define("north", Value::Number(1.0));
    let handler = globals.child();
    let block = handler.child();
    block.define("north", Value::Number(2.0));

    assert_eq!(block.lookup("north"), Some(Value::Number(2.0)));
    assert_eq!(handler.lookup("north"), Some(Value::Number(1.0)));
    assert_eq!(block.depth(), 3);
}

#[test]
fn assignment_updates_the_owning_frame() {
    let outer = Scope::root();
    outer.define("count", Value::Number(0.0));
    let inner = outer.child();
    inner.assign("count", Value::Number(5.0));
    inner.assign("fresh", Value::Bool(true));

    assert_eq!(outer.lookup("count"), Some(Value::Number(5.0)));
    assert!(inner.contains("fresh"));
    assert!(!outer.contains("fresh"));
}

#[test]
fn clones_share_a_frame() {
    let a = Scope::root();
    let b = a.clone();
    b.define("x", Value::Nil);
    assert!(a.same_frame(&b));
    assert!(a.contains("x"));
    assert!(!a.same_frame(&a.child()));
}
