//! Canonical printer for AST nodes.
//!
//! Converts parsed declarations back to source. The output is a canonical
//! form: four-space indentation, one member or statement per line, and
//! parentheses only where precedence requires them. Printing and re-parsing
//! yields an AST equal to the original once spans are cleared.
//!
//! # Example
//!
//! ```
//! use lanthorn_language::{parse_expr, print_expr};
//!
//! let expr = parse_expr("(1+2)*3").unwrap();
//! assert_eq!(print_expr(&expr), "(1 + 2) * 3");
//! ```

use std::fmt::Write;

use crate::ast::{
    AssignTarget, BinaryOp, Block, Declaration, Expr, FnDef, Handler, Item, Member, NOT_PRECEDENCE,
    POSTFIX_PRECEDENCE, Stmt, TextPart, UNARY_PRECEDENCE, UnaryOp,
};

/// Configuration for printing.
#[derive(Debug, Clone)]
pub struct PrettyConfig {
    /// Number of spaces for each indentation level.
    pub indent_width: usize,
}

impl Default for PrettyConfig {
    fn default() -> Self {
        Self { indent_width: 4 }
    }
}

/// Prints a whole program, separating items with blank lines.
#[must_use]
pub fn print_program(items: &[Item]) -> String {
    let mut printer = Printer::new(PrettyConfig::default());
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            printer.out.push_str("\n\n");
        }
        printer.item(item);
    }
    printer.out.push('\n');
    printer.out
}

/// Prints one declaration.
#[must_use]
pub fn print_declaration(decl: &Declaration) -> String {
    print_declaration_with_config(decl, PrettyConfig::default())
}

/// Prints one declaration with custom configuration.
#[must_use]
pub fn print_declaration_with_config(decl: &Declaration, config: PrettyConfig) -> String {
    let mut printer = Printer::new(config);
    printer.declaration(decl);
    printer.out
}

/// Prints one statement.
#[must_use]
pub fn print_stmt(stmt: &Stmt) -> String {
    let mut printer = Printer::new(PrettyConfig::default());
    printer.stmt(stmt);
    printer.out
}

/// Prints one expression.
#[must_use]
pub fn print_expr(expr: &Expr) -> String {
    let mut printer = Printer::new(PrettyConfig::default());
    printer.expr(expr);
    printer.out
}

/// Printer state.
struct Printer {
    config: PrettyConfig,
    out: String,
    indent_level: usize,
}

impl Printer {
    fn new(config: PrettyConfig) -> Self {
        Self {
            config,
            out: String::new(),
            indent_level: 0,
        }
    }

    fn newline(&mut self) {
        self.out.push('\n');
        let width = self.indent_level * self.config.indent_width;
        self.out.extend(std::iter::repeat_n(' ', width));
    }

    fn item(&mut self, item: &Item) {
        match item {
            Item::Include(path, _) => {
                self.out.push_str("include ");
                self.text_literal(&[TextPart::Literal(path.clone())]);
                self.out.push(';');
            }
            Item::Declaration(decl) => self.declaration(decl),
        }
    }

    fn declaration(&mut self, decl: &Declaration) {
        let keyword = if decl.extend { "extend" } else { "def" };
        let _ = write!(self.out, "{keyword} {} {}", decl.kind, decl.name);
        if let Some(proto) = &decl.prototype {
            let _ = write!(self.out, " : {proto}");
        }
        if !decl.requires.is_empty() {
            let _ = write!(self.out, " requires {}", decl.requires.join(", "));
        }

        if decl.members.is_empty() {
            self.out.push_str(" {}");
            return;
        }
        self.out.push_str(" {");
        self.indent_level += 1;
        for member in &decl.members {
            self.newline();
            self.member(member);
        }
        self.indent_level -= 1;
        self.newline();
        self.out.push('}');
    }

    fn member(&mut self, member: &Member) {
        match member {
            Member::Field { name, value, .. } => {
                let _ = write!(self.out, "{name} = ");
                self.expr(value);
                self.out.push(';');
            }
            Member::Handler(handler) => self.handler(handler),
            Member::Init(block) => {
                self.out.push_str("init ");
                self.block(block);
            }
        }
    }

    fn handler(&mut self, handler: &Handler) {
        let _ = write!(
            self.out,
            "{} {}({})",
            handler.kind,
            handler.event,
            handler.params.join(", ")
        );
        if let Some(guard) = &handler.guard {
            self.out.push_str(" if ");
            self.expr(guard);
        }
        self.out.push(' ');
        self.block(&handler.body);
    }

    fn block(&mut self, block: &Block) {
        if block.stmts.is_empty() {
            self.out.push_str("{}");
            return;
        }
        self.out.push('{');
        self.indent_level += 1;
        for stmt in block.stmts.iter() {
            self.newline();
            self.stmt(stmt);
        }
        self.indent_level -= 1;
        self.newline();
        self.out.push('}');
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Let { name, value, .. } => {
                let _ = write!(self.out, "let {name} = ");
                self.expr(value);
                self.out.push(';');
            }
            Stmt::Assign { target, value, .. } => {
                match target {
                    AssignTarget::Name(name) => self.out.push_str(name),
                    AssignTarget::Member { object, member } => {
                        self.operand(object, POSTFIX_PRECEDENCE);
                        let _ = write!(self.out, ".{member}");
                    }
                }
                self.out.push_str(" = ");
                self.expr(value);
                self.out.push(';');
            }
            Stmt::If { .. } => self.if_chain(stmt),
            Stmt::While { cond, body, .. } => {
                self.out.push_str("while ");
                self.expr(cond);
                self.out.push(' ');
                self.block(body);
            }
            Stmt::For {
                var,
                iterable,
                body,
                ..
            } => {
                let _ = write!(self.out, "for {var} in ");
                self.expr(iterable);
                self.out.push(' ');
                self.block(body);
            }
            Stmt::Fn(def) => self.function(def),
            Stmt::Return(value, _) => {
                self.out.push_str("return");
                if let Some(value) = value {
                    self.out.push(' ');
                    self.expr(value);
                }
                self.out.push(';');
            }
            Stmt::Break(_) => self.out.push_str("break;"),
            Stmt::Continue(_) => self.out.push_str("continue;"),
            Stmt::Expr(expr, _) => {
                self.expr(expr);
                self.out.push(';');
            }
        }
    }

    /// Prints `if`, folding an else block holding a single `if` into `else if`.
    fn if_chain(&mut self, stmt: &Stmt) {
        let Stmt::If {
            cond,
            then_block,
            else_block,
            ..
        } = stmt
        else {
            return;
        };
        self.out.push_str("if ");
        self.expr(cond);
        self.out.push(' ');
        self.block(then_block);
        if let Some(block) = else_block {
            self.out.push_str(" else ");
            match block.stmts.as_ref() {
                [nested @ Stmt::If { .. }] => self.if_chain(nested),
                _ => self.block(block),
            }
        }
    }

    fn function(&mut self, def: &FnDef) {
        self.out.push_str("fn");
        if let Some(name) = &def.name {
            let _ = write!(self.out, " {name}");
        }
        let _ = write!(self.out, "({}) ", def.params.join(", "));
        self.block(&def.body);
    }

    /// Prints `expr`, parenthesized if it binds looser than `min_precedence`.
    fn operand(&mut self, expr: &Expr, min_precedence: u8) {
        if expr.precedence() < min_precedence {
            self.out.push('(');
            self.expr(expr);
            self.out.push(')');
        } else {
            self.expr(expr);
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Nil(_) => self.out.push_str("nil"),
            Expr::Bool(b, _) => self.out.push_str(if *b { "true" } else { "false" }),
            Expr::Number(n, _) => {
                let _ = write!(self.out, "{n}");
            }
            Expr::Text(parts, _) => self.text_literal(parts),
            Expr::Noun(text, _) => {
                let _ = write!(self.out, "`{text}`");
            }
            Expr::Symbol(name, _) => {
                let _ = write!(self.out, "#{name}");
            }
            Expr::SelfRef(_) => self.out.push_str("self"),
            Expr::Ident(name, _) => self.out.push_str(name),
            Expr::List(items, _) => {
                self.out.push('[');
                self.comma_separated(items);
                self.out.push(']');
            }
            Expr::Comprehension {
                element,
                var,
                iterable,
                filter,
                ..
            } => {
                self.out.push('[');
                self.expr(element);
                let _ = write!(self.out, " for {var} in ");
                self.expr(iterable);
                if let Some(filter) = filter {
                    self.out.push_str(" if ");
                    self.expr(filter);
                }
                self.out.push(']');
            }
            Expr::Unary { op, operand, .. } => match op {
                UnaryOp::Not => {
                    self.out.push_str("not ");
                    self.operand(operand, NOT_PRECEDENCE);
                }
                UnaryOp::Neg | UnaryOp::Bang => {
                    self.out.push(if *op == UnaryOp::Neg { '-' } else { '!' });
                    self.operand(operand, UNARY_PRECEDENCE);
                }
            },
            Expr::Binary { op, lhs, rhs, .. } => {
                let p = op.precedence();
                // `..` does not chain, so neither side may be another range
                let left_min = if *op == BinaryOp::Range { p + 1 } else { p };
                self.operand(lhs, left_min);
                if *op == BinaryOp::Range {
                    self.out.push_str("..");
                } else {
                    let _ = write!(self.out, " {} ", op.symbol());
                }
                self.operand(rhs, p + 1);
            }
            Expr::Member { object, name, .. } => {
                self.operand(object, POSTFIX_PRECEDENCE);
                let _ = write!(self.out, ".{name}");
            }
            Expr::Index { object, index, .. } => {
                self.operand(object, POSTFIX_PRECEDENCE);
                self.out.push('[');
                self.expr(index);
                self.out.push(']');
            }
            Expr::Call { callee, args, .. } => {
                self.operand(callee, POSTFIX_PRECEDENCE);
                self.out.push('(');
                self.comma_separated(args);
                self.out.push(')');
            }
            Expr::Lambda(def) => self.function(def),
            Expr::Await(call, _) => {
                self.out.push_str("await ");
                self.expr(call);
            }
        }
    }

    fn comma_separated(&mut self, items: &[Expr]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.expr(item);
        }
    }

    /// Prints text as a single-line literal, escaping what the lexer would
    /// otherwise interpret.
    fn text_literal(&mut self, parts: &[TextPart]) {
        self.out.push('"');
        for part in parts {
            match part {
                TextPart::Literal(text) => {
                    for c in text.chars() {
                        match c {
                            '\n' => self.out.push_str("\\n"),
                            '\t' => self.out.push_str("\\t"),
                            '\r' => self.out.push_str("\\r"),
                            '\\' | '"' | '{' | '}' => {
                                self.out.push('\\');
                                self.out.push(c);
                            }
                            c => self.out.push(c),
                        }
                    }
                }
                TextPart::Expr(expr) => {
                    self.out.push('{');
                    self.expr(expr);
                    self.out.push('}');
                }
            }
        }
        self.out.push('"');
    }
}
