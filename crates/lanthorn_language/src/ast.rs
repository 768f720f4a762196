//! Abstract Syntax Tree for the Lanthorn DSL.
//!
//! A program is a list of [`Item`]s: `include` directives and
//! [`Declaration`]s. Declarations own their members; handler and function
//! bodies are [`Block`]s whose statements are shared behind an `Arc` so a
//! suspended task can hold on to the block it is executing without copying.
//!
//! The tree is immutable once parsed.

use std::fmt;
use std::sync::Arc;

use crate::span::Span;

// =============================================================================
// Items and declarations
// =============================================================================

/// A top-level item.
#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    /// `include "file";`
    Include(String, Span),
    /// `def ...` or `extend ...`
    Declaration(Declaration),
}

impl Item {
    /// Returns the source span of this item.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Include(_, span) => *span,
            Self::Declaration(decl) => decl.span,
        }
    }
}

/// Declaration kinds accepted after `def`/`extend`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeclKind {
    /// `entity`: a thing, creature, item, or anything else that is not a place.
    Entity,
    /// `location`: a place that can hold contents and exits.
    Location,
    /// `region`: a group of locations sharing handlers.
    Region,
    /// `event`: world-wide handlers for an event name.
    Event,
    /// `command`: maps input verbs to an event.
    Command,
    /// `quest`
    Quest,
    /// `skill`
    Skill,
}

impl DeclKind {
    /// All declaration kinds, in keyword order.
    pub const ALL: [Self; 7] = [
        Self::Entity,
        Self::Location,
        Self::Region,
        Self::Event,
        Self::Command,
        Self::Quest,
        Self::Skill,
    ];

    /// The keyword naming this kind in source.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Entity => "entity",
            Self::Location => "location",
            Self::Region => "region",
            Self::Event => "event",
            Self::Command => "command",
            Self::Quest => "quest",
            Self::Skill => "skill",
        }
    }

    /// Parses a kind keyword.
    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.keyword() == word)
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A `def` or `extend` declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    /// True for `extend`, which merges into an existing declaration.
    pub extend: bool,
    /// Declared kind.
    pub kind: DeclKind,
    /// Identifier, unique within a World.
    pub name: String,
    /// Prototype identifier after `:`.
    pub prototype: Option<String>,
    /// Declarations whose `init` must run before this one's.
    pub requires: Vec<String>,
    /// Members in source order.
    pub members: Vec<Member>,
    /// Source span.
    pub span: Span,
}

impl Declaration {
    /// Member assignments (`name = expr;`) in source order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Expr)> {
        self.members.iter().filter_map(|m| match m {
            Member::Field { name, value, .. } => Some((name.as_str(), value)),
            _ => None,
        })
    }

    /// Handlers in source order.
    pub fn handlers(&self) -> impl Iterator<Item = &Handler> {
        self.members.iter().filter_map(|m| match m {
            Member::Handler(h) => Some(h),
            _ => None,
        })
    }

    /// `init` blocks in source order.
    pub fn init_blocks(&self) -> impl Iterator<Item = &Block> {
        self.members.iter().filter_map(|m| match m {
            Member::Init(block) => Some(block),
            _ => None,
        })
    }

    /// Returns a copy of this declaration with every span reset.
    ///
    /// Two declarations that differ only in layout compare equal after this.
    #[must_use]
    pub fn without_spans(&self) -> Self {
        let mut decl = self.clone();
        crate::visitor::clear_spans(&mut decl);
        decl
    }
}

/// A member of a declaration body.
#[derive(Clone, Debug, PartialEq)]
pub enum Member {
    /// `name = expr;`
    Field {
        /// Member name.
        name: String,
        /// Initializer expression.
        value: Expr,
        /// Source span.
        span: Span,
    },
    /// `when|allow|before|after event(params) [if guard] { ... }`
    Handler(Handler),
    /// `init { ... }`
    Init(Block),
}

/// Handler kinds, in the order they participate in dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HandlerKind {
    /// Guard that may refuse the event.
    Allow,
    /// Runs before the default action; may cancel it.
    Before,
    /// The primary behavior (default action).
    When,
    /// Runs after the default action.
    After,
}

impl HandlerKind {
    /// The keyword naming this kind in source.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Before => "before",
            Self::When => "when",
            Self::After => "after",
        }
    }

    /// Parses a handler keyword.
    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "allow" => Some(Self::Allow),
            "before" => Some(Self::Before),
            "when" => Some(Self::When),
            "after" => Some(Self::After),
            _ => None,
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// An event handler.
#[derive(Clone, Debug, PartialEq)]
pub struct Handler {
    /// Handler kind.
    pub kind: HandlerKind,
    /// Event name.
    pub event: String,
    /// Positional parameter names.
    pub params: Vec<String>,
    /// Optional guard; the handler is skipped when it is falsy.
    pub guard: Option<Expr>,
    /// Handler body.
    pub body: Block,
    /// Source span.
    pub span: Span,
}

// =============================================================================
// Statements
// =============================================================================

/// A brace-delimited statement list.
#[derive(Clone, Debug, PartialEq)]
pub struct Block {
    /// Statements, shared so frames can reference them across suspensions.
    pub stmts: Arc<[Stmt]>,
    /// Source span.
    pub span: Span,
}

impl Block {
    /// Creates a block from statements.
    #[must_use]
    pub fn new(stmts: Vec<Stmt>, span: Span) -> Self {
        Self {
            stmts: stmts.into(),
            span,
        }
    }
}

/// A named or anonymous function.
#[derive(Clone, Debug, PartialEq)]
pub struct FnDef {
    /// Name for `fn name(...) {}` statements; `None` for `fn(...) {}` expressions.
    pub name: Option<String>,
    /// Parameter names.
    pub params: Vec<String>,
    /// Function body. Never contains `await`.
    pub body: Block,
    /// Source span.
    pub span: Span,
}

/// Left-hand side of an assignment.
#[derive(Clone, Debug, PartialEq)]
pub enum AssignTarget {
    /// `x = ...`
    Name(String),
    /// `obj.member = ...`
    Member {
        /// The entity expression.
        object: Expr,
        /// Member name.
        member: String,
    },
}

/// A statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    /// `let name = expr;`
    Let {
        /// Bound name.
        name: String,
        /// Initializer; may be an [`Expr::Await`] in handler bodies.
        value: Expr,
        /// Source span.
        span: Span,
    },
    /// `target = expr;`
    Assign {
        /// Assignment target.
        target: AssignTarget,
        /// New value; may be an [`Expr::Await`] in handler bodies.
        value: Expr,
        /// Source span.
        span: Span,
    },
    /// `if cond { ... } else { ... }`; `else if` nests an `If` in the else block.
    If {
        /// Condition.
        cond: Expr,
        /// Taken when the condition is truthy.
        then_block: Block,
        /// Taken otherwise.
        else_block: Option<Block>,
        /// Source span.
        span: Span,
    },
    /// `while cond { ... }`
    While {
        /// Loop condition.
        cond: Expr,
        /// Loop body.
        body: Block,
        /// Source span.
        span: Span,
    },
    /// `for var in iterable { ... }`
    For {
        /// Loop variable.
        var: String,
        /// List, range, or text to iterate.
        iterable: Expr,
        /// Loop body.
        body: Block,
        /// Source span.
        span: Span,
    },
    /// `fn name(params) { ... }`
    Fn(Arc<FnDef>),
    /// `return [expr];`
    Return(Option<Expr>, Span),
    /// `break;`
    Break(Span),
    /// `continue;`
    Continue(Span),
    /// `expr;`; may be an [`Expr::Await`] in handler bodies.
    Expr(Expr, Span),
}

impl Stmt {
    /// Returns the source span of this statement.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Let { span, .. }
            | Self::Assign { span, .. }
            | Self::If { span, .. }
            | Self::While { span, .. }
            | Self::For { span, .. }
            | Self::Return(_, span)
            | Self::Break(span)
            | Self::Continue(span)
            | Self::Expr(_, span) => *span,
            Self::Fn(def) => def.span,
        }
    }
}

// =============================================================================
// Expressions
// =============================================================================

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Bang,
    /// `not x` (binds looser than comparisons)
    Not,
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    /// `or` / `||`
    Or,
    /// `and` / `&&`
    And,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `..` (end exclusive)
    Range,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
}

impl BinaryOp {
    /// Binding power; higher binds tighter.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge => 4,
            Self::Range => 5,
            Self::Add | Self::Sub => 6,
            Self::Mul | Self::Div | Self::Rem => 7,
        }
    }

    /// Source text of this operator.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Or => "or",
            Self::And => "and",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Range => "..",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
        }
    }
}

/// Precedence of `not`.
pub const NOT_PRECEDENCE: u8 = 3;
/// Precedence of `-` and `!`.
pub const UNARY_PRECEDENCE: u8 = 8;
/// Precedence of member access, indexing, and calls.
pub const POSTFIX_PRECEDENCE: u8 = 9;

/// A segment of a text literal.
#[derive(Clone, Debug, PartialEq)]
pub enum TextPart {
    /// Literal characters.
    Literal(String),
    /// `{expr}`, evaluated and substituted when the literal is evaluated.
    Expr(Expr),
}

/// An expression.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// `nil`
    Nil(Span),
    /// `true` / `false`
    Bool(bool, Span),
    /// Number literal
    Number(f64, Span),
    /// Text literal; a literal without interpolation has one `Literal` part
    /// (or none when empty).
    Text(Vec<TextPart>, Span),
    /// Noun-phrase literal; evaluates to its text
    Noun(String, Span),
    /// `#name`
    Symbol(String, Span),
    /// `self`
    SelfRef(Span),
    /// Variable, entity, or built-in name
    Ident(String, Span),
    /// `[a, b, c]`
    List(Vec<Expr>, Span),
    /// `[element for var in iterable if filter]`
    Comprehension {
        /// Produced element.
        element: Box<Expr>,
        /// Bound variable.
        var: String,
        /// Source list, range, or text.
        iterable: Box<Expr>,
        /// Optional filter.
        filter: Option<Box<Expr>>,
        /// Source span.
        span: Span,
    },
    /// Unary operation
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// Binary operation
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// `object.name`
    Member {
        /// Entity expression.
        object: Box<Expr>,
        /// Member name.
        name: String,
        /// Source span.
        span: Span,
    },
    /// `object[index]`
    Index {
        /// List or text expression.
        object: Box<Expr>,
        /// Index expression.
        index: Box<Expr>,
        /// Source span.
        span: Span,
    },
    /// `callee(args)`
    Call {
        /// Called expression.
        callee: Box<Expr>,
        /// Arguments.
        args: Vec<Expr>,
        /// Source span.
        span: Span,
    },
    /// `fn(params) { ... }`
    Lambda(Arc<FnDef>),
    /// `await call(...)`; only at statement level inside handlers and `init`.
    Await(Box<Expr>, Span),
}

impl Expr {
    /// Returns the source span of this expression.
    #[must_use]
    pub fn span(&self) -> Span {
        match self {
            Self::Nil(s)
            | Self::Bool(_, s)
            | Self::Number(_, s)
            | Self::Text(_, s)
            | Self::Noun(_, s)
            | Self::Symbol(_, s)
            | Self::SelfRef(s)
            | Self::Ident(_, s)
            | Self::List(_, s)
            | Self::Await(_, s)
            | Self::Comprehension { span: s, .. }
            | Self::Unary { span: s, .. }
            | Self::Binary { span: s, .. }
            | Self::Member { span: s, .. }
            | Self::Index { span: s, .. }
            | Self::Call { span: s, .. } => *s,
            Self::Lambda(def) => def.span,
        }
    }

    /// Binding power of this expression's outermost operator.
    #[must_use]
    pub fn precedence(&self) -> u8 {
        match self {
            Self::Binary { op, .. } => op.precedence(),
            Self::Unary {
                op: UnaryOp::Not, ..
            } => NOT_PRECEDENCE,
            Self::Unary { .. } => UNARY_PRECEDENCE,
            // `await` and lambdas never appear as operands without parentheses
            Self::Await(..) | Self::Lambda(_) => 0,
            _ => POSTFIX_PRECEDENCE + 1,
        }
    }

    /// Returns the callee name if this is a call to a plain identifier.
    #[must_use]
    pub fn call_name(&self) -> Option<&str> {
        match self {
            Self::Call { callee, .. } => match callee.as_ref() {
                Self::Ident(name, _) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    /// Returns true for `Expr::Await`.
    #[must_use]
    pub const fn is_await(&self) -> bool {
        matches!(self, Self::Await(..))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decl_kind_keywords_round_trip() {
        for kind in DeclKind::ALL {
            assert_eq!(DeclKind::from_keyword(kind.keyword()), Some(kind));
        }
        assert_eq!(DeclKind::from_keyword("rule"), None);
    }

    #[test]
    fn handler_kind_order_follows_dispatch() {
        assert!(HandlerKind::Allow < HandlerKind::Before);
        assert!(HandlerKind::Before < HandlerKind::When);
        assert!(HandlerKind::When < HandlerKind::After);
    }

    #[test]
    fn call_name() {
        let call = Expr::Call {
            callee: Box::new(Expr::Ident("sleep".into(), Span::default())),
            args: vec![Expr::Number(5.0, Span::default())],
            span: Span::default(),
        };
        assert_eq!(call.call_name(), Some("sleep"));
        assert_eq!(Expr::Nil(Span::default()).call_name(), None);
    }

    #[test]
    fn precedence_ordering() {
        assert!(BinaryOp::Or.precedence() < BinaryOp::And.precedence());
        assert!(BinaryOp::And.precedence() < NOT_PRECEDENCE);
        assert!(NOT_PRECEDENCE < BinaryOp::Lt.precedence());
        assert!(BinaryOp::Range.precedence() < BinaryOp::Add.precedence());
        assert!(BinaryOp::Mul.precedence() < UNARY_PRECEDENCE);
    }
}
