//! AST traversal.
//!
//! [`AstVisitor`] is a read-only, scope-aware visitor: besides seeing every
//! identifier use, it is told where lexical scopes open and close and which
//! names each scope binds. The loader's unresolved-reference pass is built on
//! it.
//!
//! [`clear_spans`] is a mutating walk that resets every span, used for
//! layout-insensitive AST comparison.
//!
//! # Example
//!
//! ```
//! use lanthorn_language::parse_expr;
//! use lanthorn_language::visitor::{AstVisitor, walk_expr};
//! use lanthorn_language::Span;
//!
//! struct IdentCounter(usize);
//!
//! impl AstVisitor for IdentCounter {
//!     fn visit_ident(&mut self, _name: &str, _span: Span) {
//!         self.0 += 1;
//!     }
//! }
//!
//! let expr = parse_expr("say(actor, hall.name)").unwrap();
//! let mut counter = IdentCounter(0);
//! walk_expr(&mut counter, &expr);
//! assert_eq!(counter.0, 3); // say, actor, hall
//! ```

use std::sync::Arc;

use crate::ast::{
    AssignTarget, Block, Declaration, Expr, FnDef, Handler, Item, Member, Stmt, TextPart,
};
use crate::span::Span;

// =============================================================================
// Read-Only Visitor
// =============================================================================

/// Trait for read-only AST visitors. Every method defaults to doing nothing.
#[allow(unused_variables)]
pub trait AstVisitor {
    /// An identifier read.
    fn visit_ident(&mut self, name: &str, span: Span) {}

    /// An assignment to a plain name.
    fn visit_assign(&mut self, name: &str, span: Span) {}

    /// A name bound in the current scope (`let`, parameter, loop variable, `fn` name).
    fn bind(&mut self, name: &str) {}

    /// A new lexical scope opens.
    fn enter_scope(&mut self) {}

    /// The innermost lexical scope closes.
    fn leave_scope(&mut self) {}

    /// Called before each handler is walked.
    fn enter_handler(&mut self, handler: &Handler) {}
}

/// Walks every member of a declaration.
pub fn walk_declaration<V: AstVisitor>(visitor: &mut V, decl: &Declaration) {
    for member in &decl.members {
        match member {
            Member::Field { value, .. } => walk_expr(visitor, value),
            Member::Handler(handler) => walk_handler(visitor, handler),
            Member::Init(block) => walk_block(visitor, block),
        }
    }
}

/// Walks a handler's guard and body with its parameters bound.
pub fn walk_handler<V: AstVisitor>(visitor: &mut V, handler: &Handler) {
    visitor.enter_handler(handler);
    visitor.enter_scope();
    for param in &handler.params {
        visitor.bind(param);
    }
    if let Some(guard) = &handler.guard {
        walk_expr(visitor, guard);
    }
    walk_block(visitor, &handler.body);
    visitor.leave_scope();
}

/// Walks a block in its own scope. Named functions are bound before the
/// first statement, so siblings may call each other in either order.
pub fn walk_block<V: AstVisitor>(visitor: &mut V, block: &Block) {
    visitor.enter_scope();
    for stmt in block.stmts.iter() {
        if let Stmt::Fn(def) = stmt {
            if let Some(name) = &def.name {
                visitor.bind(name);
            }
        }
    }
    for stmt in block.stmts.iter() {
        walk_stmt(visitor, stmt);
    }
    visitor.leave_scope();
}

fn walk_fn<V: AstVisitor>(visitor: &mut V, def: &FnDef) {
    visitor.enter_scope();
    for param in &def.params {
        visitor.bind(param);
    }
    walk_block(visitor, &def.body);
    visitor.leave_scope();
}

/// Walks a statement.
pub fn walk_stmt<V: AstVisitor>(visitor: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Let { name, value, .. } => {
            walk_expr(visitor, value);
            visitor.bind(name);
        }
        Stmt::Assign {
            target,
            value,
            span,
        } => {
            walk_expr(visitor, value);
            match target {
                AssignTarget::Name(name) => visitor.visit_assign(name, *span),
                AssignTarget::Member { object, .. } => walk_expr(visitor, object),
            }
        }
        Stmt::If {
            cond,
            then_block,
            else_block,
            ..
        } => {
            walk_expr(visitor, cond);
            walk_block(visitor, then_block);
            if let Some(block) = else_block {
                walk_block(visitor, block);
            }
        }
        Stmt::While { cond, body, .. } => {
            walk_expr(visitor, cond);
            walk_block(visitor, body);
        }
        Stmt::For {
            var,
            iterable,
            body,
            ..
        } => {
            walk_expr(visitor, iterable);
            visitor.enter_scope();
            visitor.bind(var);
            walk_block(visitor, body);
            visitor.leave_scope();
        }
        Stmt::Fn(def) => {
            if let Some(name) = &def.name {
                visitor.bind(name);
            }
            walk_fn(visitor, def);
        }
        Stmt::Return(value, _) => {
            if let Some(value) = value {
                walk_expr(visitor, value);
            }
        }
        Stmt::Break(_) | Stmt::Continue(_) => {}
        Stmt::Expr(expr, _) => walk_expr(visitor, expr),
    }
}

/// Walks an expression depth-first.
pub fn walk_expr<V: AstVisitor>(visitor: &mut V, expr: &Expr) {
    match expr {
        Expr::Nil(_)
        | Expr::Bool(..)
        | Expr::Number(..)
        | Expr::Noun(..)
        | Expr::Symbol(..)
        | Expr::SelfRef(_) => {}
        Expr::Ident(name, span) => visitor.visit_ident(name, *span),
        Expr::Text(parts, _) => {
            for part in parts {
                if let TextPart::Expr(inner) = part {
                    walk_expr(visitor, inner);
                }
            }
        }
        Expr::List(items, _) => {
            for item in items {
                walk_expr(visitor, item);
            }
        }
        Expr::Comprehension {
            element,
            var,
            iterable,
            filter,
            ..
        } => {
            walk_expr(visitor, iterable);
            visitor.enter_scope();
            visitor.bind(var);
            if let Some(filter) = filter {
                walk_expr(visitor, filter);
            }
            walk_expr(visitor, element);
            visitor.leave_scope();
        }
        Expr::Unary { operand, .. } => walk_expr(visitor, operand),
        Expr::Binary { lhs, rhs, .. } => {
            walk_expr(visitor, lhs);
            walk_expr(visitor, rhs);
        }
        Expr::Member { object, .. } => walk_expr(visitor, object),
        Expr::Index { object, index, .. } => {
            walk_expr(visitor, object);
            walk_expr(visitor, index);
        }
        Expr::Call { callee, args, .. } => {
            walk_expr(visitor, callee);
            for arg in args {
                walk_expr(visitor, arg);
            }
        }
        Expr::Lambda(def) => walk_fn(visitor, def),
        Expr::Await(inner, _) => walk_expr(visitor, inner),
    }
}

// =============================================================================
// Span Eraser
// =============================================================================

/// Resets every span in a declaration to `Span::default()`.
pub fn clear_spans(decl: &mut Declaration) {
    decl.span = Span::default();
    for member in &mut decl.members {
        match member {
            Member::Field { value, span, .. } => {
                *span = Span::default();
                clear_expr(value);
            }
            Member::Handler(handler) => {
                handler.span = Span::default();
                if let Some(guard) = &mut handler.guard {
                    clear_expr(guard);
                }
                clear_block(&mut handler.body);
            }
            Member::Init(block) => clear_block(block),
        }
    }
}

/// Returns the items with every span reset.
#[must_use]
pub fn items_without_spans(items: &[Item]) -> Vec<Item> {
    items
        .iter()
        .map(|item| match item {
            Item::Include(path, _) => Item::Include(path.clone(), Span::default()),
            Item::Declaration(decl) => Item::Declaration(decl.without_spans()),
        })
        .collect()
}

/// Returns the expression with every span reset.
#[must_use]
pub fn expr_without_spans(expr: &Expr) -> Expr {
    let mut expr = expr.clone();
    clear_expr(&mut expr);
    expr
}

fn clear_block(block: &mut Block) {
    block.span = Span::default();
    let mut stmts = block.stmts.to_vec();
    for stmt in &mut stmts {
        clear_stmt(stmt);
    }
    block.stmts = stmts.into();
}

fn clear_fn(def: &mut Arc<FnDef>) {
    let def = Arc::make_mut(def);
    def.span = Span::default();
    clear_block(&mut def.body);
}

fn clear_stmt(stmt: &mut Stmt) {
    match stmt {
        Stmt::Let { value, span, .. } => {
            *span = Span::default();
            clear_expr(value);
        }
        Stmt::Assign {
            target,
            value,
            span,
        } => {
            *span = Span::default();
            if let AssignTarget::Member { object, .. } = target {
                clear_expr(object);
            }
            clear_expr(value);
        }
        Stmt::If {
            cond,
            then_block,
            else_block,
            span,
        } => {
            *span = Span::default();
            clear_expr(cond);
            clear_block(then_block);
            if let Some(block) = else_block {
                clear_block(block);
            }
        }
        Stmt::While { cond, body, span } => {
            *span = Span::default();
            clear_expr(cond);
            clear_block(body);
        }
        Stmt::For {
            iterable,
            body,
            span,
            ..
        } => {
            *span = Span::default();
            clear_expr(iterable);
            clear_block(body);
        }
        Stmt::Fn(def) => clear_fn(def),
        Stmt::Return(value, span) => {
            *span = Span::default();
            if let Some(value) = value {
                clear_expr(value);
            }
        }
        Stmt::Break(span) | Stmt::Continue(span) => *span = Span::default(),
        Stmt::Expr(expr, span) => {
            *span = Span::default();
            clear_expr(expr);
        }
    }
}

fn clear_expr(expr: &mut Expr) {
    match expr {
        Expr::Nil(span)
        | Expr::Bool(_, span)
        | Expr::Number(_, span)
        | Expr::Noun(_, span)
        | Expr::Symbol(_, span)
        | Expr::SelfRef(span)
        | Expr::Ident(_, span) => *span = Span::default(),
        Expr::Text(parts, span) => {
            *span = Span::default();
            for part in parts {
                if let TextPart::Expr(inner) = part {
                    clear_expr(inner);
                }
            }
        }
        Expr::List(items, span) => {
            *span = Span::default();
            items.iter_mut().for_each(clear_expr);
        }
        Expr::Comprehension {
            element,
            iterable,
            filter,
            span,
            ..
        } => {
            *span = Span::default();
            clear_expr(element);
            clear_expr(iterable);
            if let Some(filter) = filter {
                clear_expr(filter);
            }
        }
        Expr::Unary { operand, span, .. } => {
            *span = Span::default();
            clear_expr(operand);
        }
        Expr::Binary { lhs, rhs, span, .. } => {
            *span = Span::default();
            clear_expr(lhs);
            clear_expr(rhs);
        }
        Expr::Member { object, span, .. } => {
            *span = Span::default();
            clear_expr(object);
        }
        Expr::Index {
            object,
            index,
            span,
        } => {
            *span = Span::default();
            clear_expr(object);
            clear_expr(index);
        }
        Expr::Call { callee, args, span } => {
            *span = Span::default();
            clear_expr(callee);
            args.iter_mut().for_each(clear_expr);
        }
        Expr::Lambda(def) => clear_fn(def),
        Expr::Await(inner, span) => {
            *span = Span::default();
            clear_expr(inner);
        }
    }
}
