//! Parsing for metric label selectors (`name{label="value",...}`) and
//! `$variable` title templates.

mod cursor;
pub mod error;
pub mod labels;
pub mod lexer;
pub mod matcher;
mod selector;
pub mod template;
pub mod token;

pub use error::{LabelError, ParseError, Position};
pub use labels::{Label, LabelSet, NAME_LABEL};
pub use lexer::{tokenize, Tokenizer};
pub use matcher::{MatchCond, Matcher, Op};
pub use template::{
    parse_variables, render_template, EscapeMode, Template, TemplateNode, TemplateOptions,
    VariableSource,
};
pub use token::{Token, TokenType};

// ── Core API ───────────────────────────────────────────────────────

/// Parse a selector such as `cpu_usage{host="a"}` into a label set.
pub fn parse_labels(text: &str) -> Result<LabelSet, ParseError> {
    LabelSet::parse(text)
}

/// Serialize a label set back to selector syntax.
pub fn labels_to_string(labels: &LabelSet) -> String {
    labels.to_string()
}

/// Parse a selector whose matchers may use `=`, `!=`, `=~` or `!~`.
pub fn parse_matcher(text: &str) -> Result<Matcher, ParseError> {
    Matcher::parse(text)
}
