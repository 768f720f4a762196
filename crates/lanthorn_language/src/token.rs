//! Token types for the Lanthorn DSL.
//!
//! Tokens are the output of the lexer and input to the parser. Interpolated
//! text is split across several tokens: `"a {x} b {y} c"` lexes as
//! `TextHead("a ")`, the tokens of `x`, `TextMid(" b ")`, the tokens of `y`,
//! and `TextTail(" c")`.

use crate::span::Span;

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns the text this token covers in the given source.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }
}

/// Token types for the Lanthorn DSL.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Delimiters
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `.`
    Dot,
    /// `..`
    DotDot,

    // Operators
    /// `=`
    Assign,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `!`
    Bang,
    /// `&&` or `and`
    And,
    /// `||` or `or`
    Or,
    /// `not`
    Not,

    // Literals
    /// Number literal like `42` or `3.5`
    Number(f64),
    /// Text literal with no interpolation
    Text {
        /// Unescaped contents.
        value: String,
        /// Whether the literal used `"""` delimiters.
        multiline: bool,
    },
    /// Text up to the first `{` of an interpolated literal
    TextHead {
        /// Unescaped contents.
        value: String,
        /// Whether the literal used `"""` delimiters.
        multiline: bool,
    },
    /// Text between two interpolated segments
    TextMid(String),
    /// Text after the last interpolated segment, including the closing quote
    TextTail(String),
    /// Noun-phrase literal like `` `box[es] of dirt` ``
    Noun(String),
    /// Symbol literal like `#north`
    Symbol(String),
    /// Identifier like `hall` or `startWorld`
    Ident(String),

    // Keywords
    /// `def`
    Def,
    /// `extend`
    Extend,
    /// `include`
    Include,
    /// `let`
    Let,
    /// `fn`
    Fn,
    /// `if`
    If,
    /// `else`
    Else,
    /// `while`
    While,
    /// `for`
    For,
    /// `in`
    In,
    /// `return`
    Return,
    /// `break`
    Break,
    /// `continue`
    Continue,
    /// `await`
    Await,
    /// `true`
    True,
    /// `false`
    False,
    /// `nil`
    Nil,
    /// `self`
    SelfKw,

    // Meta
    /// End of input
    Eof,
    /// Lexer error
    Error(String),
}

impl TokenKind {
    /// Maps a keyword's text to its token kind.
    #[must_use]
    pub fn keyword(word: &str) -> Option<Self> {
        let kind = match word {
            "def" => Self::Def,
            "extend" => Self::Extend,
            "include" => Self::Include,
            "let" => Self::Let,
            "fn" => Self::Fn,
            "if" => Self::If,
            "else" => Self::Else,
            "while" => Self::While,
            "for" => Self::For,
            "in" => Self::In,
            "return" => Self::Return,
            "break" => Self::Break,
            "continue" => Self::Continue,
            "await" => Self::Await,
            "and" => Self::And,
            "or" => Self::Or,
            "not" => Self::Not,
            "true" => Self::True,
            "false" => Self::False,
            "nil" => Self::Nil,
            "self" => Self::SelfKw,
            _ => return None,
        };
        Some(kind)
    }

    /// Returns a human-readable name for this token kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::LBracket => "'['",
            Self::RBracket => "']'",
            Self::LBrace => "'{'",
            Self::RBrace => "'}'",
            Self::Comma => "','",
            Self::Semicolon => "';'",
            Self::Colon => "':'",
            Self::Dot => "'.'",
            Self::DotDot => "'..'",
            Self::Assign => "'='",
            Self::EqEq => "'=='",
            Self::NotEq => "'!='",
            Self::Lt => "'<'",
            Self::Le => "'<='",
            Self::Gt => "'>'",
            Self::Ge => "'>='",
            Self::Plus => "'+'",
            Self::Minus => "'-'",
            Self::Star => "'*'",
            Self::Slash => "'/'",
            Self::Percent => "'%'",
            Self::Bang => "'!'",
            Self::And => "'and'",
            Self::Or => "'or'",
            Self::Not => "'not'",
            Self::Number(_) => "number",
            Self::Text { .. } | Self::TextHead { .. } => "text",
            Self::TextMid(_) | Self::TextTail(_) => "text segment",
            Self::Noun(_) => "noun phrase",
            Self::Symbol(_) => "symbol",
            Self::Ident(_) => "identifier",
            Self::Def => "'def'",
            Self::Extend => "'extend'",
            Self::Include => "'include'",
            Self::Let => "'let'",
            Self::Fn => "'fn'",
            Self::If => "'if'",
            Self::Else => "'else'",
            Self::While => "'while'",
            Self::For => "'for'",
            Self::In => "'in'",
            Self::Return => "'return'",
            Self::Break => "'break'",
            Self::Continue => "'continue'",
            Self::Await => "'await'",
            Self::True => "'true'",
            Self::False => "'false'",
            Self::Nil => "'nil'",
            Self::SelfKw => "'self'",
            Self::Eof => "end of input",
            Self::Error(_) => "error",
        }
    }

    /// Returns true for the tokens that always begin a top-level item.
    #[must_use]
    pub const fn starts_item(&self) -> bool {
        matches!(self, Self::Def | Self::Extend | Self::Include)
    }
}
