use std::fmt;

use serde::{Deserialize, Serialize};

use crate::token::TokenType;

/// A 1-based position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// 1-based line number
    pub line: usize,
    /// 1-based character offset within the line
    #[serde(rename = "char")]
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }

    /// Position of the first character of any input.
    pub fn start() -> Self {
        Position { line: 1, column: 1 }
    }

    /// Advance past `ch`.
    pub(crate) fn advance(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A selector or template parse failure.
///
/// Lexical problems (invalid characters, bad escapes, unterminated strings)
/// reach the parser as ordinary tokens, so they are reported through
/// `Unexpected` like any other syntax error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("expected {expected} but got {found} at {pos}")]
    Unexpected {
        /// Description of what the grammar required ("string", "operator", ...)
        expected: &'static str,
        found: TokenType,
        pos: Position,
    },
    #[error("unbalanced brace at {pos}")]
    UnbalancedBrace {
        /// Position of the opening brace
        pos: Position,
    },
}

impl ParseError {
    pub(crate) fn unexpected(expected: &'static str, found: TokenType, pos: Position) -> Self {
        ParseError::Unexpected {
            expected,
            found,
            pos,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::Unexpected { .. } => "selector-syntax-error",
            ParseError::UnbalancedBrace { .. } => "template-unbalanced-brace",
        }
    }

    pub fn position(&self) -> Position {
        match self {
            ParseError::Unexpected { pos, .. } | ParseError::UnbalancedBrace { pos } => *pos,
        }
    }
}

/// A label that parses fine but is not acceptable as a stored label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    #[error("empty label name")]
    EmptyName,
    #[error("invalid label name: {0}")]
    InvalidName(String),
    #[error("empty label value")]
    EmptyValue { name: String },
}
