//! Parser for the Lanthorn DSL.
//!
//! Recursive descent for items, declarations, and statements; precedence
//! climbing for expressions. Parsing recovers at declaration granularity:
//! a malformed declaration is reported and skipped, and parsing resumes at
//! the next `def`, `extend`, or `include`.

use lanthorn_foundation::{Error, ErrorKind, Result};

use std::sync::Arc;

use crate::ast::{
    AssignTarget, BinaryOp, Block, DeclKind, Declaration, Expr, FnDef, Handler, HandlerKind,
    Item, Member, Stmt, TextPart, UnaryOp,
};
use crate::lexer::{HOLE, Lexer, trim_indent};
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Parser for Lanthorn source code.
pub struct Parser<'src> {
    /// The lexer providing tokens.
    lexer: Lexer<'src>,
    /// Current token (lookahead).
    current: Token,
    /// The token after `current`, once peeked.
    peeked: Option<Token>,
    /// Source text (for error messages).
    source: &'src str,
    /// True while parsing a handler body or `init` block.
    await_allowed: bool,
    /// Open expressions and blocks, bounded by [`MAX_NESTING`].
    depth: usize,
}

/// How deeply expressions and blocks may nest.
pub const MAX_NESTING: usize = 100;

impl<'src> Parser<'src> {
    /// Creates a new parser for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            peeked: None,
            source,
            await_allowed: false,
            depth: 0,
        }
    }

    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        let parsed = parse(self);
        self.depth -= 1;
        parsed
    }

    /// Parses every item, collecting one error per malformed item.
    pub fn parse_program(&mut self) -> (Vec<Item>, Vec<Error>) {
        let mut items = Vec::new();
        let mut errors = Vec::new();

        while self.current.kind != TokenKind::Eof {
            let started_at = self.current.span.start;
            match self.parse_item() {
                Ok(item) => items.push(item),
                Err(err) => {
                    errors.push(err);
                    self.synchronize(started_at);
                }
            }
        }

        (items, errors)
    }

    /// Parses a single expression that must span the whole input.
    ///
    /// # Errors
    /// Returns an error if the source is not exactly one expression.
    pub fn parse_single_expr(&mut self) -> Result<Expr> {
        let expr = self.parse_expr()?;
        if self.current.kind != TokenKind::Eof {
            return Err(self.unexpected("end of input"));
        }
        Ok(expr)
    }

    /// Skips to the next token that can begin an item.
    fn synchronize(&mut self, started_at: usize) {
        if self.current.kind.starts_item() && self.current.span.start > started_at {
            return;
        }
        self.advance();
        while !self.current.kind.starts_item() && self.current.kind != TokenKind::Eof {
            self.advance();
        }
    }

    // =========================================================================
    // Items and declarations
    // =========================================================================

    fn parse_item(&mut self) -> Result<Item> {
        match &self.current.kind {
            TokenKind::Include => self.parse_include(),
            TokenKind::Def | TokenKind::Extend => {
                self.parse_declaration().map(Item::Declaration)
            }
            _ => Err(self.unexpected("'def', 'extend', or 'include'")),
        }
    }

    fn parse_include(&mut self) -> Result<Item> {
        let start = self.current.span;
        self.advance();
        let path = match &self.current.kind {
            TokenKind::Text { value, .. } => value.clone(),
            _ => return Err(self.unexpected("a file name in quotes")),
        };
        self.advance();
        let end = self.current.span;
        self.expect(&TokenKind::Semicolon)?;
        Ok(Item::Include(path, start.to(end)))
    }

    fn parse_declaration(&mut self) -> Result<Declaration> {
        let start = self.current.span;
        let extend = self.current.kind == TokenKind::Extend;
        self.advance();

        let (kind_word, kind_span) = self.expect_ident("a declaration kind")?;
        let Some(kind) = DeclKind::from_keyword(&kind_word) else {
            let expected = DeclKind::ALL.map(DeclKind::keyword).join(", ");
            return Err(self.error_at(
                kind_span,
                &format!("unknown declaration kind '{kind_word}' (expected one of {expected})"),
            ));
        };

        let (name, _) = self.expect_ident("a declaration name")?;

        let prototype = if self.current.kind == TokenKind::Colon {
            self.advance();
            Some(self.expect_ident("a prototype name")?.0)
        } else {
            None
        };

        let mut requires = Vec::new();
        if matches!(&self.current.kind, TokenKind::Ident(w) if w == "requires") {
            self.advance();
            requires.push(self.expect_ident("a declaration name")?.0);
            while self.current.kind == TokenKind::Comma {
                self.advance();
                requires.push(self.expect_ident("a declaration name")?.0);
            }
        }

        self.expect(&TokenKind::LBrace)?;
        let mut members = Vec::new();
        while self.current.kind != TokenKind::RBrace {
            if self.current.kind == TokenKind::Eof {
                return Err(self.error_at(start, &format!("unterminated declaration '{name}'")));
            }
            members.push(self.parse_member()?);
        }
        let end = self.current.span;
        self.expect(&TokenKind::RBrace)?;

        Ok(Declaration {
            extend,
            kind,
            name,
            prototype,
            requires,
            members,
            span: start.to(end),
        })
    }

    fn parse_member(&mut self) -> Result<Member> {
        let TokenKind::Ident(word) = &self.current.kind else {
            return Err(self.unexpected("a member, handler, or init block"));
        };
        let word = word.clone();
        let start = self.current.span;

        if let Some(kind) = HandlerKind::from_keyword(&word) {
            if matches!(self.peek().kind, TokenKind::Ident(_)) {
                return self.parse_handler(kind).map(Member::Handler);
            }
        }

        if word == "init" && self.peek().kind == TokenKind::LBrace {
            self.advance();
            let block = self.with_await(true, Self::parse_block)?;
            return Ok(Member::Init(block));
        }

        self.advance();
        self.expect(&TokenKind::Assign)?;
        let value = self.with_await(false, Self::parse_expr)?;
        let end = self.current.span;
        self.expect(&TokenKind::Semicolon)?;
        Ok(Member::Field {
            name: word,
            value,
            span: start.to(end),
        })
    }

    fn parse_handler(&mut self, kind: HandlerKind) -> Result<Handler> {
        let start = self.current.span;
        self.advance(); // handler keyword
        let (event, _) = self.expect_ident("an event name")?;
        let params = self.parse_params()?;
        let guard = if self.current.kind == TokenKind::If {
            self.advance();
            Some(self.with_await(false, Self::parse_expr)?)
        } else {
            None
        };
        let body = self.with_await(true, Self::parse_block)?;
        let span = start.to(body.span);
        Ok(Handler {
            kind,
            event,
            params,
            guard,
            body,
            span,
        })
    }

    fn parse_params(&mut self) -> Result<Vec<String>> {
        self.expect(&TokenKind::LParen)?;
        let mut params = Vec::new();
        if self.current.kind != TokenKind::RParen {
            params.push(self.expect_ident("a parameter name")?.0);
            while self.current.kind == TokenKind::Comma {
                self.advance();
                params.push(self.expect_ident("a parameter name")?.0);
            }
        }
        self.expect(&TokenKind::RParen)?;
        Ok(params)
    }

    /// Runs `f` with `await` permitted or not, restoring the previous setting.
    fn with_await<T>(&mut self, allowed: bool, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let saved = std::mem::replace(&mut self.await_allowed, allowed);
        let result = f(self);
        self.await_allowed = saved;
        result
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn parse_block(&mut self) -> Result<Block> {
        self.nested(Self::parse_block_body)
    }

    fn parse_block_body(&mut self) -> Result<Block> {
        let start = self.current.span;
        self.expect(&TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        while self.current.kind != TokenKind::RBrace {
            if self.current.kind == TokenKind::Eof {
                return Err(self.error_at(start, "unterminated block"));
            }
            stmts.push(self.parse_stmt()?);
        }
        let end = self.current.span;
        self.expect(&TokenKind::RBrace)?;
        Ok(Block::new(stmts, start.to(end)))
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        let start = self.current.span;
        let named_fn =
            self.current.kind == TokenKind::Fn && matches!(self.peek().kind, TokenKind::Ident(_));
        match &self.current.kind {
            TokenKind::Let => {
                self.advance();
                let (name, _) = self.expect_ident("a variable name")?;
                self.expect(&TokenKind::Assign)?;
                let value = self.parse_stmt_value()?;
                let end = self.current.span;
                self.expect(&TokenKind::Semicolon)?;
                Ok(Stmt::Let {
                    name,
                    value,
                    span: start.to(end),
                })
            }
            TokenKind::If => self.parse_if(),
            TokenKind::While => {
                self.advance();
                let cond = self.parse_expr()?;
                let body = self.parse_block()?;
                let span = start.to(body.span);
                Ok(Stmt::While { cond, body, span })
            }
            TokenKind::For => {
                self.advance();
                let (var, _) = self.expect_ident("a loop variable")?;
                self.expect(&TokenKind::In)?;
                let iterable = self.parse_expr()?;
                let body = self.parse_block()?;
                let span = start.to(body.span);
                Ok(Stmt::For {
                    var,
                    iterable,
                    body,
                    span,
                })
            }
            TokenKind::Fn if named_fn => {
                self.advance();
                let (name, _) = self.expect_ident("a function name")?;
                let def = self.parse_fn_rest(Some(name), start)?;
                Ok(Stmt::Fn(Arc::new(def)))
            }
            TokenKind::Return => {
                self.advance();
                let value = if self.current.kind == TokenKind::Semicolon {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                let end = self.current.span;
                self.expect(&TokenKind::Semicolon)?;
                Ok(Stmt::Return(value, start.to(end)))
            }
            TokenKind::Break | TokenKind::Continue => {
                let is_break = self.current.kind == TokenKind::Break;
                self.advance();
                let end = self.current.span;
                self.expect(&TokenKind::Semicolon)?;
                let span = start.to(end);
                Ok(if is_break {
                    Stmt::Break(span)
                } else {
                    Stmt::Continue(span)
                })
            }
            TokenKind::Await => {
                let expr = self.parse_await()?;
                let end = self.current.span;
                self.expect(&TokenKind::Semicolon)?;
                Ok(Stmt::Expr(expr, start.to(end)))
            }
            _ => {
                let expr = self.parse_expr()?;
                if self.current.kind == TokenKind::Assign {
                    let target = match expr {
                        Expr::Ident(name, _) => AssignTarget::Name(name),
                        Expr::Member { object, name, .. } => AssignTarget::Member {
                            object: *object,
                            member: name,
                        },
                        other => {
                            return Err(
                                self.error_at(other.span(), "invalid assignment target")
                            );
                        }
                    };
                    self.advance();
                    let value = self.parse_stmt_value()?;
                    let end = self.current.span;
                    self.expect(&TokenKind::Semicolon)?;
                    return Ok(Stmt::Assign {
                        target,
                        value,
                        span: start.to(end),
                    });
                }
                let end = self.current.span;
                self.expect(&TokenKind::Semicolon)?;
                Ok(Stmt::Expr(expr, start.to(end)))
            }
        }
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        let start = self.current.span;
        self.expect(&TokenKind::If)?;
        let cond = self.parse_expr()?;
        let then_block = self.parse_block()?;
        let mut span = start.to(then_block.span);
        let else_block = if self.current.kind == TokenKind::Else {
            self.advance();
            let block = if self.current.kind == TokenKind::If {
                let nested = self.parse_if()?;
                let nested_span = nested.span();
                Block::new(vec![nested], nested_span)
            } else {
                self.parse_block()?
            };
            span = span.to(block.span);
            Some(block)
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_block,
            else_block,
            span,
        })
    }

    /// The right-hand side of `let` or an assignment: an expression, or an
    /// `await` where suspension is permitted.
    fn parse_stmt_value(&mut self) -> Result<Expr> {
        if self.current.kind == TokenKind::Await {
            self.parse_await()
        } else {
            self.parse_expr()
        }
    }

    fn parse_await(&mut self) -> Result<Expr> {
        let start = self.current.span;
        if !self.await_allowed {
            return Err(self.error_at(
                start,
                "await is only allowed inside a handler or init block",
            ));
        }
        self.advance();
        let call = self.parse_expr()?;
        if !matches!(call, Expr::Call { .. }) {
            return Err(self.error_at(call.span(), "await requires a call"));
        }
        let span = start.to(call.span());
        Ok(Expr::Await(Box::new(call), span))
    }

    /// Parameters and body of a function; `fn` and any name are consumed.
    fn parse_fn_rest(&mut self, name: Option<String>, start: Span) -> Result<FnDef> {
        let params = self.parse_params()?;
        let body = self.with_await(false, Self::parse_block)?;
        let span = start.to(body.span);
        Ok(FnDef {
            name,
            params,
            body,
            span,
        })
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn parse_expr(&mut self) -> Result<Expr> {
        self.nested(Self::parse_or)
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_and()?;
        while self.current.kind == TokenKind::Or {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = binary(BinaryOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_not()?;
        while self.current.kind == TokenKind::And {
            self.advance();
            let rhs = self.parse_not()?;
            lhs = binary(BinaryOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.current.kind == TokenKind::Not {
            let start = self.current.span;
            self.advance();
            let operand = self.nested(Self::parse_not)?;
            let span = start.to(operand.span());
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                span,
            });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_range()?;
        loop {
            let op = match self.current.kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::Ne,
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Ge,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_range()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_range(&mut self) -> Result<Expr> {
        let lhs = self.parse_additive()?;
        if self.current.kind == TokenKind::DotDot {
            self.advance();
            let rhs = self.parse_additive()?;
            return Ok(binary(BinaryOp::Range, lhs, rhs));
        }
        Ok(lhs)
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_multiplicative()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.current.kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Bang => UnaryOp::Bang,
            _ => return self.parse_postfix(),
        };
        let start = self.current.span;
        self.advance();
        let operand = self.nested(Self::parse_unary)?;
        let span = start.to(operand.span());
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
            span,
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.current.kind {
                TokenKind::Dot => {
                    self.advance();
                    let (name, name_span) = self.expect_ident("a member name")?;
                    let span = expr.span().to(name_span);
                    expr = Expr::Member {
                        object: Box::new(expr),
                        name,
                        span,
                    };
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.parse_comma_list(&TokenKind::RParen)?;
                    let end = self.current.span;
                    self.expect(&TokenKind::RParen)?;
                    let span = expr.span().to(end);
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        span,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    let end = self.current.span;
                    self.expect(&TokenKind::RBracket)?;
                    let span = expr.span().to(end);
                    expr = Expr::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                        span,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Parses `expr (, expr)* [,]` up to (not including) `close`.
    fn parse_comma_list(&mut self, close: &TokenKind) -> Result<Vec<Expr>> {
        let mut items = Vec::new();
        while self.current.kind != *close {
            items.push(self.parse_expr()?);
            if self.current.kind == TokenKind::Comma {
                self.advance();
            } else {
                break;
            }
        }
        Ok(items)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let span = self.current.span;
        let expr = match &self.current.kind {
            TokenKind::Number(n) => Expr::Number(*n, span),
            TokenKind::Text { value, .. } => {
                let parts = if value.is_empty() {
                    Vec::new()
                } else {
                    vec![TextPart::Literal(value.clone())]
                };
                Expr::Text(parts, span)
            }
            TokenKind::TextHead { .. } => return self.parse_interpolated(),
            TokenKind::Noun(text) => Expr::Noun(text.clone(), span),
            TokenKind::Symbol(name) => Expr::Symbol(name.clone(), span),
            TokenKind::Ident(name) => Expr::Ident(name.clone(), span),
            TokenKind::True => Expr::Bool(true, span),
            TokenKind::False => Expr::Bool(false, span),
            TokenKind::Nil => Expr::Nil(span),
            TokenKind::SelfKw => Expr::SelfRef(span),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                return Ok(inner);
            }
            TokenKind::LBracket => return self.parse_list(),
            TokenKind::Fn => {
                self.advance();
                let def = self.parse_fn_rest(None, span)?;
                return Ok(Expr::Lambda(Arc::new(def)));
            }
            TokenKind::Await if self.await_allowed => {
                return Err(self.error(
                    "await may only begin a statement, a let, or an assignment",
                ));
            }
            TokenKind::Await => {
                return Err(self.error("await is only allowed inside a handler or init block"));
            }
            _ => return Err(self.unexpected("an expression")),
        };
        self.advance();
        Ok(expr)
    }

    /// Parses `[a, b]` or `[element for var in iterable if filter]`.
    fn parse_list(&mut self) -> Result<Expr> {
        let start = self.current.span;
        self.expect(&TokenKind::LBracket)?;

        if self.current.kind == TokenKind::RBracket {
            let end = self.current.span;
            self.advance();
            return Ok(Expr::List(Vec::new(), start.to(end)));
        }

        let first = self.parse_expr()?;
        if self.current.kind == TokenKind::For {
            self.advance();
            let (var, _) = self.expect_ident("a loop variable")?;
            self.expect(&TokenKind::In)?;
            let iterable = self.parse_expr()?;
            let filter = if self.current.kind == TokenKind::If {
                self.advance();
                Some(Box::new(self.parse_expr()?))
            } else {
                None
            };
            let end = self.current.span;
            self.expect(&TokenKind::RBracket)?;
            return Ok(Expr::Comprehension {
                element: Box::new(first),
                var,
                iterable: Box::new(iterable),
                filter,
                span: start.to(end),
            });
        }

        let mut items = vec![first];
        if self.current.kind == TokenKind::Comma {
            self.advance();
            items.extend(self.parse_comma_list(&TokenKind::RBracket)?);
        }
        let end = self.current.span;
        self.expect(&TokenKind::RBracket)?;
        Ok(Expr::List(items, start.to(end)))
    }

    /// Parses an interpolated text literal starting at its `TextHead`.
    fn parse_interpolated(&mut self) -> Result<Expr> {
        let start = self.current.span;
        let TokenKind::TextHead { value, multiline } = &self.current.kind else {
            return Err(self.unexpected("text"));
        };
        let multiline = *multiline;
        let mut parts = Vec::new();
        push_literal(&mut parts, value);
        self.advance();

        let end = loop {
            parts.push(TextPart::Expr(self.parse_expr()?));
            match &self.current.kind {
                TokenKind::TextMid(text) => {
                    push_literal(&mut parts, text);
                    self.advance();
                }
                TokenKind::TextTail(text) => {
                    push_literal(&mut parts, text);
                    let end = self.current.span;
                    self.advance();
                    break end;
                }
                _ => return Err(self.unexpected("'}' closing the interpolation")),
            }
        };

        let parts = if multiline { dedent_parts(parts) } else { parts };
        Ok(Expr::Text(parts, start.to(end)))
    }

    // =========================================================================
    // Token helpers
    // =========================================================================

    /// Returns the token after `current` without consuming anything.
    fn peek(&mut self) -> &Token {
        let lexer = &mut self.lexer;
        self.peeked.get_or_insert_with(|| lexer.next_token())
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        self.current = match self.peeked.take() {
            Some(token) => token,
            None => self.lexer.next_token(),
        };
    }

    /// Expects the current token to be of a specific kind, then advances.
    fn expect(&mut self, expected: &TokenKind) -> Result<()> {
        // Use discriminant comparison for token kinds that carry data
        let matches =
            std::mem::discriminant(&self.current.kind) == std::mem::discriminant(expected);

        if matches {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected.name()))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<(String, Span)> {
        if let TokenKind::Ident(name) = &self.current.kind {
            let result = (name.clone(), self.current.span);
            self.advance();
            Ok(result)
        } else {
            Err(self.unexpected(what))
        }
    }

    /// Reports the current token as unexpected; lexer errors surface as such.
    fn unexpected(&self, expected: &str) -> Error {
        if let TokenKind::Error(message) = &self.current.kind {
            return Error::new(ErrorKind::Lex {
                message: message.clone(),
                line: self.current.span.line,
                column: self.current.span.column,
            });
        }
        self.error(&format!(
            "expected {expected}, found {}",
            self.current.kind.name()
        ))
    }

    /// Creates a parse error at the current position.
    fn error(&self, message: &str) -> Error {
        self.error_at(self.current.span, message)
    }

    /// Creates a parse error at a specific span.
    fn error_at(&self, span: Span, message: &str) -> Error {
        Error::new(ErrorKind::Parse {
            message: message.to_string(),
            line: span.line,
            column: span.column,
            context: self.context_at(span),
        })
    }

    /// Gets the source line containing a span.
    fn context_at(&self, span: Span) -> String {
        let start = span.start.min(self.source.len());
        let line_start = self
            .source
            .get(..start)
            .and_then(|s| s.rfind('\n'))
            .map_or(0, |i| i + 1);
        let line_end = self
            .source
            .get(start..)
            .and_then(|s| s.find('\n'))
            .map_or(self.source.len(), |i| start + i);

        self.source
            .get(line_start..line_end)
            .unwrap_or_default()
            .to_string()
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    let span = lhs.span().to(rhs.span());
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        span,
    }
}

fn push_literal(parts: &mut Vec<TextPart>, text: &str) {
    if !text.is_empty() {
        parts.push(TextPart::Literal(text.to_string()));
    }
}

/// Applies the multi-line indentation rule across interpolated segments.
fn dedent_parts(parts: Vec<TextPart>) -> Vec<TextPart> {
    let mut joined = String::new();
    let mut exprs = Vec::new();
    for part in parts {
        match part {
            TextPart::Literal(text) => joined.push_str(&text),
            TextPart::Expr(expr) => {
                joined.push(HOLE);
                exprs.push(expr);
            }
        }
    }

    let mut exprs = exprs.into_iter();
    let mut out = Vec::new();
    for (i, piece) in trim_indent(&joined).split(HOLE).enumerate() {
        if i > 0 {
            if let Some(expr) = exprs.next() {
                out.push(TextPart::Expr(expr));
            }
        }
        push_literal(&mut out, piece);
    }
    out
}

/// Parses source into items, stopping at the first error.
///
/// # Errors
/// Returns the first lex or parse error.
pub fn parse(source: &str) -> Result<Vec<Item>> {
    let (items, mut errors) = parse_recovering(source);
    if errors.is_empty() {
        Ok(items)
    } else {
        Err(errors.swap_remove(0))
    }
}

/// Parses source into items, skipping malformed declarations.
///
/// Returns every item that parsed and one error per item that did not.
#[must_use]
pub fn parse_recovering(source: &str) -> (Vec<Item>, Vec<Error>) {
    Parser::new(source).parse_program()
}

/// Parses a single expression.
///
/// # Errors
/// Returns an error if the source is not exactly one expression.
pub fn parse_expr(source: &str) -> Result<Expr> {
    Parser::new(source).parse_single_expr()
}
