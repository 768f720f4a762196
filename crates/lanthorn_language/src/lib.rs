//! Lexer, parser, and printer for the Lanthorn world DSL.
//!
//! This crate provides:
//! - [`Lexer`] - Tokenization, including interpolated and multi-line text
//! - [`Parser`] - Declarations, statements, and expressions into an AST
//! - [`printer`] - Canonical source form that re-parses to an equal AST
//! - [`NounPhrase`] - Singular/plural/article inflection from bracket notation
//! - [`visitor`] - AST traversal used by static analysis passes

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ast;
pub mod lexer;
pub mod noun;
pub mod parser;
pub mod printer;
pub mod span;
pub mod token;
pub mod visitor;

pub use ast::{
    AssignTarget, BinaryOp, Block, DeclKind, Declaration, Expr, FnDef, Handler, HandlerKind, Item,
    Member, Stmt, TextPart, UnaryOp,
};
pub use lexer::Lexer;
pub use noun::{NounError, NounPhrase};
pub use parser::{Parser, parse, parse_expr, parse_recovering};
pub use printer::{print_declaration, print_expr, print_program, print_stmt};
pub use span::Span;
pub use token::{Token, TokenKind};
