//! Recursive-descent skeleton shared by label sets and matchers:
//!
//! ```text
//! selector    := [ IDENT ] [ '{' [ matcherList ] '}' ]
//! matcherList := matcher (',' matcher)* [ ',' ]
//! ```
//!
//! Callers supply how a leading name and a single `matcher` are turned into
//! items; the skeleton owns the braces, commas and the bare-name shortcut.

use crate::error::ParseError;
use crate::lexer::Tokenizer;
use crate::token::TokenType;

pub(crate) fn parse_selector<T>(
    tokenizer: &mut Tokenizer<'_>,
    name: impl FnOnce(String) -> T,
    mut matcher: impl FnMut(&mut Tokenizer<'_>) -> Result<T, ParseError>,
) -> Result<Vec<T>, ParseError> {
    let mut items = Vec::new();

    if tokenizer.peek().kind == TokenType::Ident {
        let tok = tokenizer.next_token();
        items.push(name(tok.text));

        // A bare name is a complete selector
        if tokenizer.peek().kind != TokenType::LBrace {
            return Ok(items);
        }
    }

    tokenizer.expect(TokenType::LBrace)?;

    if tokenizer.peek().kind != TokenType::RBrace {
        loop {
            items.push(matcher(tokenizer)?);

            if tokenizer.peek().kind != TokenType::Comma {
                break;
            }
            tokenizer.next_token();

            // Trailing comma
            if tokenizer.peek().kind == TokenType::RBrace {
                break;
            }
        }
    }

    tokenizer.expect(TokenType::RBrace)?;

    Ok(items)
}

/// Fail unless the whole input has been consumed.
pub(crate) fn expect_end(tokenizer: &mut Tokenizer<'_>) -> Result<(), ParseError> {
    tokenizer.expect(TokenType::Eof).map(|_| ())
}
