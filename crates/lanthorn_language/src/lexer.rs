//! Lexer for the Lanthorn DSL.
//!
//! The lexer converts source text into a stream of tokens. It is lazy: the
//! parser pulls one token at a time with [`Lexer::next_token`].
//!
//! Text literals may embed `{expr}` segments. The lexer keeps a stack of open
//! interpolations so that the `}` closing an embedded expression resumes the
//! surrounding literal instead of producing a brace token.

use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Placeholder standing in for an interpolated segment while multi-line text
/// is dedented. Raw NUL is rejected inside text literals, so it cannot clash.
pub(crate) const HOLE: char = '\0';

/// An open `{` inside a text literal.
#[derive(Clone, Copy, Debug)]
struct Interpolation {
    /// Whether the enclosing literal is `"""`-delimited.
    multiline: bool,
    /// Unclosed `{` inside the embedded expression itself.
    depth: usize,
}

/// Lexer for Lanthorn source code.
pub struct Lexer<'src> {
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
    /// Interpolations currently open, innermost last.
    interpolations: Vec<Interpolation>,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            rest: source,
            position: 0,
            line: 1,
            column: 1,
            interpolations: Vec::new(),
        }
    }

    /// Returns the next token from the source.
    ///
    /// After the end of input every call returns [`TokenKind::Eof`].
    pub fn next_token(&mut self) -> Token {
        if let Err(message) = self.skip_trivia() {
            let span = Span::point(self.position, self.line, self.column);
            return Token::new(TokenKind::Error(message), span);
        }

        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        let Some(c) = self.peek_char() else {
            return Token::new(
                TokenKind::Eof,
                Span::point(start, start_line, start_column),
            );
        };

        let kind = match c {
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            ',' => self.single(TokenKind::Comma),
            ';' => self.single(TokenKind::Semicolon),
            ':' => self.single(TokenKind::Colon),
            '+' => self.single(TokenKind::Plus),
            '-' => self.single(TokenKind::Minus),
            '*' => self.single(TokenKind::Star),
            '/' => self.single(TokenKind::Slash),
            '%' => self.single(TokenKind::Percent),
            '{' => {
                if let Some(open) = self.interpolations.last_mut() {
                    open.depth += 1;
                }
                self.single(TokenKind::LBrace)
            }
            '}' => self.scan_close_brace(),
            '.' => self.one_or_two('.', TokenKind::Dot, TokenKind::DotDot),
            '=' => self.one_or_two('=', TokenKind::Assign, TokenKind::EqEq),
            '!' => self.one_or_two('=', TokenKind::Bang, TokenKind::NotEq),
            '<' => self.one_or_two('=', TokenKind::Lt, TokenKind::Le),
            '>' => self.one_or_two('=', TokenKind::Gt, TokenKind::Ge),
            '&' => self.doubled('&', TokenKind::And),
            '|' => self.doubled('|', TokenKind::Or),
            '#' => self.scan_symbol(),
            '"' => self.scan_text_open(),
            '`' => self.scan_noun(),
            c if c.is_ascii_digit() => self.scan_number(),
            c if is_ident_start(c) => self.scan_ident(),
            c => {
                self.advance();
                TokenKind::Error(format!("unexpected character: {c}"))
            }
        };

        Token::new(
            kind,
            Span::new(start, self.position, start_line, start_column),
        )
    }

    /// Tokenizes all source and returns a vector of tokens ending in `Eof`.
    #[must_use]
    pub fn tokenize_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    /// Advances past the next character.
    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// `c` or `c` followed by `second`.
    fn one_or_two(&mut self, second: char, one: TokenKind, two: TokenKind) -> TokenKind {
        self.advance();
        if self.peek_char() == Some(second) {
            self.advance();
            two
        } else {
            one
        }
    }

    /// `&&` and `||`; a single `&` or `|` is not a token.
    fn doubled(&mut self, c: char, kind: TokenKind) -> TokenKind {
        self.advance();
        if self.peek_char() == Some(c) {
            self.advance();
            kind
        } else {
            TokenKind::Error(format!("unexpected character: {c} (did you mean {c}{c}?)"))
        }
    }

    /// Skips whitespace, `//` line comments, and `/* */` block comments.
    fn skip_trivia(&mut self) -> Result<(), String> {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => self.advance(),
                Some('/') if self.peek_char_n(1) == Some('/') => {
                    while let Some(c) = self.peek_char() {
                        if c == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek_char_n(1) == Some('*') => {
                    self.advance();
                    self.advance();
                    loop {
                        if self.rest.starts_with("*/") {
                            self.advance();
                            self.advance();
                            break;
                        }
                        if self.rest.is_empty() {
                            return Err("unterminated block comment".into());
                        }
                        self.advance();
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// A `}` either closes an embedded expression or is a plain brace.
    fn scan_close_brace(&mut self) -> TokenKind {
        self.advance();
        match self.interpolations.last_mut() {
            Some(open) if open.depth == 0 => {
                let multiline = open.multiline;
                self.interpolations.pop();
                self.scan_text_body(multiline, false)
            }
            Some(open) => {
                open.depth -= 1;
                TokenKind::RBrace
            }
            None => TokenKind::RBrace,
        }
    }

    /// Scans a symbol literal: `#name`.
    fn scan_symbol(&mut self) -> TokenKind {
        self.advance(); // consume '#'
        match self.peek_char() {
            Some(c) if is_ident_start(c) => TokenKind::Symbol(self.scan_ident_text().to_string()),
            Some(c) => TokenKind::Error(format!("expected symbol name after '#', found {c}")),
            None => TokenKind::Error("unexpected end of input after '#'".into()),
        }
    }

    /// Scans the opening delimiter of a text literal and its first segment.
    fn scan_text_open(&mut self) -> TokenKind {
        let multiline = self.rest.starts_with("\"\"\"");
        let delimiter_len = if multiline { 3 } else { 1 };
        for _ in 0..delimiter_len {
            self.advance();
        }
        self.scan_text_body(multiline, true)
    }

    /// Scans text up to the closing delimiter or the next unescaped `{`.
    fn scan_text_body(&mut self, multiline: bool, first: bool) -> TokenKind {
        let mut text = String::new();
        let closed = loop {
            if multiline && self.rest.starts_with("\"\"\"") {
                for _ in 0..3 {
                    self.advance();
                }
                break true;
            }
            match self.peek_char() {
                Some('"') if !multiline => {
                    self.advance();
                    break true;
                }
                Some('{') => {
                    self.advance();
                    self.interpolations.push(Interpolation {
                        multiline,
                        depth: 0,
                    });
                    break false;
                }
                Some('\\') => {
                    self.advance();
                    let escaped = match self.peek_char() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('r') => '\r',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some('{') => '{',
                        Some('}') => '}',
                        Some(c) => {
                            return TokenKind::Error(format!("invalid escape sequence: \\{c}"));
                        }
                        None => {
                            return TokenKind::Error(
                                "unexpected end of input in text escape".into(),
                            );
                        }
                    };
                    self.advance();
                    text.push(escaped);
                }
                Some('\n') if !multiline => {
                    return TokenKind::Error(
                        "unterminated text literal (use \"\"\" for multi-line text)".into(),
                    );
                }
                Some(HOLE) => {
                    return TokenKind::Error("NUL character in text literal".into());
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
                None => return TokenKind::Error("unterminated text literal".into()),
            }
        };

        match (first, closed) {
            (true, true) => {
                let value = if multiline { trim_indent(&text) } else { text };
                TokenKind::Text { value, multiline }
            }
            (true, false) => TokenKind::TextHead {
                value: text,
                multiline,
            },
            (false, true) => TokenKind::TextTail(text),
            (false, false) => TokenKind::TextMid(text),
        }
    }

    /// Scans a noun-phrase literal: `` `box[es] of dirt` ``.
    fn scan_noun(&mut self) -> TokenKind {
        self.advance(); // consume opening '`'
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some('`') => {
                    self.advance();
                    break;
                }
                Some('\n') | None => {
                    return TokenKind::Error("unterminated noun phrase literal".into());
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
            }
        }
        if text.trim().is_empty() {
            TokenKind::Error("empty noun phrase literal".into())
        } else {
            TokenKind::Noun(text)
        }
    }

    /// Scans a number: digits with an optional fractional part.
    fn scan_number(&mut self) -> TokenKind {
        let start = self.rest;
        let mut len = 0;
        let mut has_dot = false;
        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.advance();
                len += 1;
            } else if c == '.'
                && !has_dot
                && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
            {
                has_dot = true;
                self.advance();
                len += 1;
            } else {
                break;
            }
        }
        match start[..len].parse::<f64>() {
            Ok(n) => TokenKind::Number(n),
            Err(e) => TokenKind::Error(format!("invalid number: {e}")),
        }
    }

    /// Scans an identifier or keyword.
    fn scan_ident(&mut self) -> TokenKind {
        let word = self.scan_ident_text();
        TokenKind::keyword(word).unwrap_or_else(|| TokenKind::Ident(word.to_string()))
    }

    fn scan_ident_text(&mut self) -> &'src str {
        let start = self.rest;
        let mut len = 0;
        while let Some(c) = self.peek_char() {
            if is_ident_char(c) {
                len += c.len_utf8();
                self.advance();
            } else {
                break;
            }
        }
        &start[..len]
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Applies the multi-line text indentation rule.
///
/// A blank first line (the remainder of the opening delimiter's line) and a
/// blank last line (the closing delimiter's indentation) are dropped, then
/// the common leading whitespace of the non-blank lines is removed.
pub(crate) fn trim_indent(text: &str) -> String {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.len() > 1 && lines.first().is_some_and(|l| l.trim().is_empty()) {
        lines.remove(0);
    }
    if lines.len() > 1 && lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    let indent = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|l| if l.trim().is_empty() { "" } else { &l[indent..] })
        .collect::<Vec<_>>()
        .join("\n")
}
