//! Integration tests for Layer 1: Language
//!
//! Tests for the lexer, parser, printer, and noun phrases working together
//! on whole world files.

mod lexer;
mod nouns;
mod parser;
mod printer;
