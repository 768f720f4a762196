//! Static check for names that resolve to nothing.
//!
//! Runs once every declaration is registered, so forward references to
//! entities are fine. A name is resolved if it is bound in an enclosing
//! lexical scope, is a built-in or direction constant, or names an entity.

use std::collections::HashSet;

use lanthorn_foundation::{Error, ErrorKind};
use lanthorn_language::visitor::{AstVisitor, walk_declaration};
use lanthorn_language::{Declaration, Span};
use lanthorn_storage::Registry;

use crate::builtins;
use crate::command::DIRECTIONS;

struct UnresolvedNames<'a> {
    registry: &'a Registry,
    declaration: &'a str,
    scopes: Vec<Vec<String>>,
    reported: HashSet<String>,
    errors: Vec<Error>,
}

impl UnresolvedNames<'_> {
    fn is_bound(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|scope| scope.iter().any(|n| n == name))
    }

    fn is_global(&self, name: &str) -> bool {
        DIRECTIONS.contains(&name)
            || builtins::lookup(name).is_some()
            || builtins::is_suspending(name)
            || self.registry.lookup(name).is_some()
    }
}

impl AstVisitor for UnresolvedNames<'_> {
    fn visit_ident(&mut self, name: &str, span: Span) {
        if self.is_bound(name) || self.is_global(name) || self.reported.contains(name) {
            return;
        }
        self.reported.insert(name.to_string());
        self.errors.push(
            Error::new(ErrorKind::UnresolvedReference {
                name: name.to_string(),
                in_declaration: self.declaration.to_string(),
            })
            .at(span.line, span.column),
        );
    }

    fn visit_assign(&mut self, name: &str, _span: Span) {
        // Assigning an unbound name creates it in the innermost scope.
        if !self.is_bound(name) {
            self.bind(name);
        }
    }

    fn bind(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(name.to_string());
        }
    }

    fn enter_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    fn leave_scope(&mut self) {
        self.scopes.pop();
    }
}

/// Reports every unresolved name in `decl`, once per name.
pub(crate) fn unresolved_references(registry: &Registry, decl: &Declaration) -> Vec<Error> {
    let mut pass = UnresolvedNames {
        registry,
        declaration: &decl.name,
        scopes: vec![Vec::new()],
        reported: HashSet::new(),
        errors: Vec::new(),
    };
    walk_declaration(&mut pass, decl);
    pass.errors
}
