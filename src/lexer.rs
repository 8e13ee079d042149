use tracing::trace;

use crate::cursor::Cursor;
use crate::error::{ParseError, Position};
use crate::token::{Token, TokenType};

/// Converts selector text into a stream of positioned tokens, with one
/// token of lookahead.
pub struct Tokenizer<'a> {
    cursor: Cursor<'a>,
    peeked: Option<Token>,
    /// Set once the iterator has yielded the end of input.
    done: bool,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Tokenizer {
            cursor: Cursor::new(input),
            peeked: None,
            done: false,
        }
    }

    /// Return the next token without consuming it. Repeated calls return the
    /// same token until `next_token` is called.
    pub fn peek(&mut self) -> &Token {
        let tok = match self.peeked.take() {
            Some(tok) => tok,
            None => self.scan(),
        };
        self.peeked.insert(tok)
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token {
        let tok = self.peeked.take().unwrap_or_else(|| self.scan());
        trace!(kind = ?tok.kind, pos = %tok.pos, "token");
        tok
    }

    /// Consume the next token, failing unless it has the given type.
    pub fn expect(&mut self, kind: TokenType) -> Result<Token, ParseError> {
        let tok = self.next_token();
        if tok.kind != kind {
            return Err(ParseError::unexpected(kind.description(), tok.kind, tok.pos));
        }
        Ok(tok)
    }

    // ── Scanning ────────────────────────────────────────────────────

    fn scan(&mut self) -> Token {
        let (ch, pos) = loop {
            let pos = self.cursor.position();
            match self.cursor.read() {
                Some(ch) if is_space(ch) => continue,
                ch => break (ch, pos),
            }
        };

        let Some(ch) = ch else {
            return Token::new(TokenType::Eof, pos, "");
        };

        match ch {
            '-' | '0'..='9' => {
                self.cursor.unread();
                self.scan_number()
            }
            ch if is_ident_char(ch) => {
                self.cursor.unread();
                self.scan_ident()
            }
            '"' | '\'' => self.scan_string(ch, pos),
            '=' => {
                if self.cursor.read() == Some('~') {
                    return Token::new(TokenType::EqRegexp, pos, "");
                }
                self.cursor.unread();
                Token::new(TokenType::Eq, pos, "")
            }
            '!' => match self.cursor.read() {
                Some('=') => Token::new(TokenType::Neq, pos, ""),
                Some('~') => Token::new(TokenType::NeqRegexp, pos, ""),
                _ => {
                    self.cursor.unread();
                    Token::new(TokenType::Invalid, pos, "!")
                }
            },
            '{' => Token::new(TokenType::LBrace, pos, ""),
            '}' => Token::new(TokenType::RBrace, pos, ""),
            '(' => Token::new(TokenType::LParen, pos, ""),
            ')' => Token::new(TokenType::RParen, pos, ""),
            ',' => Token::new(TokenType::Comma, pos, ""),
            other => Token::new(TokenType::Invalid, pos, other.to_string()),
        }
    }

    fn scan_ident(&mut self) -> Token {
        let start = self.cursor.position();
        let mut text = String::new();
        while let Some(ch) = self.cursor.read() {
            if is_ident_char(ch) {
                text.push(ch);
            } else {
                self.cursor.unread();
                break;
            }
        }
        Token::new(TokenType::Ident, start, text)
    }

    /// Scan `-?digits(.digits)?([eE][+-]?digits)?`. Only the raw text is kept.
    fn scan_number(&mut self) -> Token {
        let start = self.cursor.position();
        let mut text = String::new();

        match self.cursor.read() {
            Some('-') => text.push('-'),
            _ => self.cursor.unread(),
        }

        self.run_digits(&mut text);

        match self.cursor.read() {
            Some('.') => {
                text.push('.');
                self.run_digits(&mut text);
            }
            _ => self.cursor.unread(),
        }

        match self.cursor.read() {
            Some(e @ ('e' | 'E')) => {
                text.push(e);
                match self.cursor.read() {
                    Some(sign @ ('+' | '-')) => text.push(sign),
                    _ => self.cursor.unread(),
                }
                self.run_digits(&mut text);
            }
            _ => self.cursor.unread(),
        }

        Token::new(TokenType::Number, start, text)
    }

    fn run_digits(&mut self, text: &mut String) {
        while let Some(ch) = self.cursor.read() {
            if ch.is_ascii_digit() {
                text.push(ch);
            } else {
                self.cursor.unread();
                break;
            }
        }
    }

    /// Scan a quoted string whose opening `quote` has already been read.
    fn scan_string(&mut self, quote: char, start: Position) -> Token {
        let mut text = String::new();
        loop {
            let pos = self.cursor.position();
            match self.cursor.read() {
                Some(ch) if ch == quote => return Token::new(TokenType::String, start, text),
                None => return Token::new(TokenType::Eof, pos, text),
                Some('\n') => return Token::new(TokenType::Newline, pos, text),
                Some('\\') => match self.cursor.read() {
                    Some(esc @ ('\\' | '"' | '\'')) => text.push(esc),
                    other => {
                        let mut bad = String::from('\\');
                        bad.extend(other);
                        return Token::new(TokenType::BadEscape, pos, bad);
                    }
                },
                Some(ch) => text.push(ch),
            }
        }
    }
}

/// Yields every token up to and including the first end-of-input token.
impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.done {
            return None;
        }
        let tok = self.next_token();
        self.done = tok.kind == TokenType::Eof;
        Some(tok)
    }
}

/// Tokenize a whole input, ending with an end-of-input token.
pub fn tokenize(input: &str) -> Vec<Token> {
    Tokenizer::new(input).collect()
}

pub(crate) fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn is_space(ch: char) -> bool {
    ch == ' ' || ch == '\t' || ch == '\n'
}
