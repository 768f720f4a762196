//! Lexical binding frames.
//!
//! A [`Scope`] is a shared handle to one frame. Each frame owns its local
//! bindings and links to its parent; lookup walks outward. Closures keep the
//! frame they were created in alive, which is what makes scoping lexical.
//! A sealed frame holds constants: assignment never writes into it, so an
//! inner assignment to one of its names makes a local binding instead.
//!
//! A function bound in the very frame it closes over is stored as its
//! definition alone and rebuilt on lookup, so the frame never owns itself.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use lanthorn_foundation::EntityId;
use lanthorn_language::FnDef;

use crate::value::{Closure, Value};

enum Slot {
    Value(Value),
    Function { def: Arc<FnDef>, this: Option<EntityId> },
}

#[derive(Default)]
struct Frame {
    bindings: HashMap<String, Slot>,
    parent: Option<Scope>,
    sealed: bool,
}

/// A handle to one binding frame in a scope chain.
#[derive(Clone, Default)]
pub struct Scope(Rc<RefCell<Frame>>);

impl Scope {
    /// Creates an empty root frame.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a child frame whose parent is `self`.
    #[must_use]
    pub fn child(&self) -> Self {
        Self(Rc::new(RefCell::new(Frame {
            bindings: HashMap::new(),
            parent: Some(self.clone()),
            sealed: false,
        })))
    }

    /// Looks up `name`, walking outward through parent frames.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let next = {
                let frame = current.0.borrow();
                match frame.bindings.get(name) {
                    Some(Slot::Value(value)) => return Some(value.clone()),
                    Some(Slot::Function { def, this }) => {
                        let closure = Closure::new(Arc::clone(def), current.clone(), *this);
                        return Some(Value::Closure(Rc::new(closure)));
                    }
                    None => {}
                }
                frame.parent.clone()
            };
            current = next?;
        }
    }

    /// Returns true if `name` is bound anywhere in the chain.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Binds `name` in this frame, shadowing any outer binding.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        let slot = self.slot_for(value);
        self.0.borrow_mut().bindings.insert(name.into(), slot);
    }

    fn slot_for(&self, value: Value) -> Slot {
        match value {
            Value::Closure(closure) if closure.env.same_frame(self) => Slot::Function {
                def: Arc::clone(&closure.def),
                this: closure.this,
            },
            other => Slot::Value(other),
        }
    }

    /// Stops [`assign`](Self::assign) from changing this frame's bindings.
    /// [`define`](Self::define) still works, for setting the frame up.
    pub fn seal(&self) {
        self.0.borrow_mut().sealed = true;
    }

    /// Assigns to the frame that owns `name`, or defines it here if no frame
    /// does or the owner is sealed.
    pub fn assign(&self, name: &str, value: Value) {
        let mut current = self.clone();
        loop {
            let next = {
                let mut frame = current.0.borrow_mut();
                if frame.bindings.contains_key(name) && frame.sealed {
                    break;
                }
                if frame.bindings.contains_key(name) {
                    let slot = current.slot_for(value);
                    frame.bindings.insert(name.to_string(), slot);
                    return;
                }
                frame.parent.clone()
            };
            match next {
                Some(parent) => current = parent,
                None => break,
            }
        }
        self.define(name, value);
    }

    /// Number of frames from here to the root, inclusive.
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut parent = self.0.borrow().parent.clone();
        while let Some(scope) = parent {
            depth += 1;
            parent = scope.0.borrow().parent.clone();
        }
        depth
    }

    /// Returns true if both handles point at the same frame.
    #[must_use]
    pub fn same_frame(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let frame = self.0.borrow();
        let mut names: Vec<&String> = frame.bindings.keys().collect();
        names.sort();
        f.debug_struct("Scope")
            .field("bindings", &names)
            .field("depth", &self.depth())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_outward() {
        let root = Scope::root();
        root.define("x", 1i64.into());
        let inner = root.child().child();
        assert_eq!(inner.lookup("x"), Some(1i64.into()));
        assert_eq!(inner.lookup("y"), None);
        assert_eq!(inner.depth(), 3);
    }

    #[test]
    fn define_shadows() {
        let root = Scope::root();
        root.define("x", 1i64.into());
        let inner = root.child();
        inner.define("x", 2i64.into());
        assert_eq!(inner.lookup("x"), Some(2i64.into()));
        assert_eq!(root.lookup("x"), Some(1i64.into()));
    }

    #[test]
    fn assign_targets_owning_frame() {
        let root = Scope::root();
        root.define("count", 0i64.into());
        let inner = root.child();
        inner.assign("count", 5i64.into());
        assert_eq!(root.lookup("count"), Some(5i64.into()));
        assert!(!inner.0.borrow().bindings.contains_key("count"));
    }

    #[test]
    fn assign_unbound_creates_in_innermost() {
        let root = Scope::root();
        let inner = root.child();
        inner.assign("fresh", true.into());
        assert!(inner.contains("fresh"));
        assert!(!root.contains("fresh"));
    }

    #[test]
    fn assign_never_writes_a_sealed_frame() {
        let constants = Scope::root();
        constants.define("east", 1i64.into());
        constants.seal();
        let handler = constants.child();
        let block = handler.child();
        block.assign("east", 5i64.into());
        assert_eq!(block.lookup("east"), Some(5i64.into()));
        assert_eq!(handler.lookup("east"), Some(1i64.into()));
        assert_eq!(constants.child().lookup("east"), Some(1i64.into()));
    }

    #[test]
    fn function_in_its_own_frame_does_not_own_it() {
        use lanthorn_language::{Block, Span};

        let frame = Scope::root().child();
        let def = Arc::new(FnDef {
            name: Some("again".into()),
            params: Vec::new(),
            body: Block::new(Vec::new(), Span::default()),
            span: Span::default(),
        });
        let closure = Value::Closure(Rc::new(Closure::new(def, frame.clone(), None)));
        frame.define("again", closure.clone());
        assert_eq!(frame.lookup("again"), Some(closure.clone()));
        drop(closure);
        assert_eq!(Rc::strong_count(&frame.0), 1);

        let escaped = frame.lookup("again");
        drop(frame);
        let Some(Value::Closure(escaped)) = escaped else {
            panic!("expected a closure");
        };
        assert!(escaped.env.contains("again"));
    }

    #[test]
    fn clones_share_a_frame() {
        let a = Scope::root();
        let b = a.clone();
        b.define("k", "v".into());
        assert!(a.same_frame(&b));
        assert_eq!(a.lookup("k"), Some("v".into()));
        assert!(!a.same_frame(&a.child()));
    }
}
