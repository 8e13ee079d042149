use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::ParseError;
use crate::labels::{quote, NAME_LABEL};
use crate::lexer::Tokenizer;
use crate::selector::{expect_end, parse_selector};
use crate::token::TokenType;

/// Label match operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "=~")]
    EqRegexp,
    #[serde(rename = "!~")]
    NotEqRegexp,
}

impl Op {
    fn from_token(kind: TokenType) -> Option<Op> {
        match kind {
            TokenType::Eq => Some(Op::Eq),
            TokenType::Neq => Some(Op::NotEq),
            TokenType::EqRegexp => Some(Op::EqRegexp),
            TokenType::NeqRegexp => Some(Op::NotEqRegexp),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::NotEq => "!=",
            Op::EqRegexp => "=~",
            Op::NotEqRegexp => "!~",
        }
    }

    /// Whether the value is a pattern for the query backend to evaluate.
    pub fn is_regexp(self) -> bool {
        matches!(self, Op::EqRegexp | Op::NotEqRegexp)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `name op "value"` condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchCond {
    pub op: Op,
    pub name: String,
    pub value: String,
}

impl MatchCond {
    pub fn new(op: Op, name: impl Into<String>, value: impl Into<String>) -> Self {
        MatchCond {
            op,
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for MatchCond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.name, self.op, quote(&self.value))
    }
}

/// A selector with full matcher operators, e.g.
/// `cpu{host!="a",env=~"prod|staging"}`.
///
/// Unlike a [`LabelSet`](crate::LabelSet), conditions keep their order and
/// the same label may appear more than once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Matcher {
    conds: Vec<MatchCond>,
}

impl Matcher {
    pub fn new(conds: Vec<MatchCond>) -> Self {
        Matcher { conds }
    }

    /// Parse a whole input as a matcher selector. A leading metric name
    /// becomes a `__name__` equality condition.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        trace!(input = text, "parsing matcher");
        let mut tokenizer = Tokenizer::new(text);
        let result = Self::from_tokenizer(&mut tokenizer).and_then(|matcher| {
            expect_end(&mut tokenizer)?;
            Ok(matcher)
        });
        if let Err(err) = &result {
            debug!(input = text, error = %err, "matcher rejected");
        }
        result
    }

    /// Parse a selector from `tokenizer`, leaving any following tokens
    /// unconsumed.
    pub fn from_tokenizer(tokenizer: &mut Tokenizer<'_>) -> Result<Self, ParseError> {
        let conds = parse_selector(
            tokenizer,
            |name| MatchCond::new(Op::Eq, NAME_LABEL, name),
            parse_cond,
        )?;
        Ok(Matcher { conds })
    }

    pub fn conditions(&self) -> &[MatchCond] {
        &self.conds
    }

    /// The metric name pinned by an equality condition, if any.
    pub fn name(&self) -> Option<&str> {
        self.conds
            .iter()
            .find(|c| c.op == Op::Eq && c.name == NAME_LABEL)
            .map(|c| c.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.conds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conds.is_empty()
    }
}

fn parse_cond(tokenizer: &mut Tokenizer<'_>) -> Result<MatchCond, ParseError> {
    let name = tokenizer.expect(TokenType::Ident)?.text;

    let tok = tokenizer.next_token();
    let op = Op::from_token(tok.kind)
        .ok_or_else(|| ParseError::unexpected("operator", tok.kind, tok.pos))?;

    let value = tokenizer.expect(TokenType::String)?.text;

    Ok(MatchCond::new(op, name, value))
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (idx, cond) in self.conds.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", cond)?;
        }
        f.write_str("}")
    }
}

impl FromStr for Matcher {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Matcher::parse(s)
    }
}
