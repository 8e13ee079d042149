use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Position;

/// Lexical token type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Invalid,
    Eof,

    /// `cpu_usage`
    Ident,
    /// `123.45`, `-1e3`
    Number,
    /// `"abc"` or `'abc'`
    String,
    /// Raw newline inside a string
    Newline,
    /// `\b` inside a string
    BadEscape,

    /// `=`
    Eq,
    /// `!=`
    Neq,
    /// `=~`
    EqRegexp,
    /// `!~`
    NeqRegexp,

    LBrace,
    RBrace,
    LParen,
    RParen,
    Comma,
}

impl TokenType {
    /// Human-readable description, used verbatim in error messages.
    pub fn description(self) -> &'static str {
        match self {
            TokenType::Invalid => "invalid",
            TokenType::Eof => "end of input",
            TokenType::Ident => "identifier",
            TokenType::Number => "number",
            TokenType::String => "string",
            TokenType::Newline => "new line",
            TokenType::BadEscape => "bad escape",
            TokenType::Eq => "equal",
            TokenType::Neq => "not equal",
            TokenType::EqRegexp => "equal pattern",
            TokenType::NeqRegexp => "not equal pattern",
            TokenType::LBrace => "left brace",
            TokenType::RBrace => "right brace",
            TokenType::LParen => "left parenthesis",
            TokenType::RParen => "right parenthesis",
            TokenType::Comma => "comma",
        }
    }

    /// Whether this is one of the four label matching operators.
    pub fn is_operator(self) -> bool {
        matches!(
            self,
            TokenType::Eq | TokenType::Neq | TokenType::EqRegexp | TokenType::NeqRegexp
        )
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// A lexical token.
///
/// `text` holds the identifier, the raw number, the unescaped string
/// contents, or the offending characters for `Invalid` and `BadEscape`.
/// It is empty for punctuation and operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub kind: TokenType,
    pub pos: Position,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenType, pos: Position, text: impl Into<String>) -> Self {
        Token {
            kind,
            pos,
            text: text.into(),
        }
    }

    pub fn is_operator(&self) -> bool {
        self.kind.is_operator()
    }
}
