//! Integration tests for the lexer
//!
//! Tokenization of realistic world source.

use lanthorn_language::{Lexer, TokenKind};

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::tokenize_all(source).into_iter().map(|t| t.kind).collect()
}

// =============================================================================
// Declarations
// =============================================================================

#[test]
fn declaration_header() {
    assert_eq!(
        kinds("def location hall : room {"),
        vec![
            TokenKind::Def,
            TokenKind::Ident("location".into()),
            TokenKind::Ident("hall".into()),
            TokenKind::Colon,
            TokenKind::Ident("room".into()),
            TokenKind::LBrace,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn include_line() {
    assert_eq!(
        kinds("include \"areas/town.lan\";"),
        vec![
            TokenKind::Include,
            TokenKind::Text {
                value: "areas/town.lan".into(),
                multiline: false,
            },
            TokenKind::Semicolon,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn handler_with_await() {
    let tokens = kinds("when startWorld() { await sleep(5); }");
    assert_eq!(tokens[0], TokenKind::Ident("when".into()));
    assert!(tokens.contains(&TokenKind::Await));
    assert!(tokens.contains(&TokenKind::Number(5.0)));
    assert_eq!(tokens.last(), Some(&TokenKind::Eof));
}

// =============================================================================
// Literals
// =============================================================================

#[test]
fn symbols_nouns_and_text() {
    assert_eq!(
        kinds("#cancel `lantern[s]` \"lit\""),
        vec![
            TokenKind::Symbol("cancel".into()),
            TokenKind::Noun("lantern[s]".into()),
            TokenKind::Text {
                value: "lit".into(),
                multiline: false,
            },
            TokenKind::Eof,
        ]
    );
}

#[test]
fn word_operators_match_symbolic_ones() {
    assert_eq!(kinds("a and b or not c"), kinds("a && b || not c"));
}

// =============================================================================
// Positions
// =============================================================================

#[test]
fn tokens_carry_line_and_column() {
    let source = "def entity lamp {\n    lit = false;\n}";
    let tokens = Lexer::tokenize_all(source);
    let lit = tokens
        .iter()
        .find(|t| t.kind == TokenKind::Ident("lit".into()))
        .unwrap();
    assert_eq!((lit.span.line, lit.span.column), (2, 5));
    assert_eq!(lit.text(source), "lit");
}

#[test]
fn bad_characters_become_error_tokens() {
    let tokens = kinds("x = 1 @ 2;");
    assert!(tokens.iter().any(|t| matches!(t, TokenKind::Error(_))));
    assert_eq!(tokens.last(), Some(&TokenKind::Eof));
}
