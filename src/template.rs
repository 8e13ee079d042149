//! `$name` / `${name}` placeholder templates for chart and dashboard titles.
//!
//! A `$` preceded by a backslash never starts a variable. What happens to
//! the backslash is controlled by [`EscapeMode`].

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::cursor::Cursor;
use crate::error::ParseError;
use crate::labels::LabelSet;

/// A segment of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum TemplateNode {
    /// Literal text
    Text(String),
    /// Variable name, without sigil or braces
    Variable(String),
}

/// Treatment of `\$` in template text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EscapeMode {
    /// Keep the backslash: `\$x` renders as `\$x`. Matches templates
    /// authored for earlier releases.
    #[default]
    Preserve,
    /// Drop the backslash: `\$x` renders as `$x`.
    Strip,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateOptions {
    pub escape: EscapeMode,
}

/// Anything variables can be looked up in when rendering.
pub trait VariableSource {
    fn lookup(&self, name: &str) -> Option<&str>;
}

impl<K, V, S> VariableSource for HashMap<K, V, S>
where
    K: Borrow<str> + Hash + Eq,
    V: AsRef<str>,
    S: BuildHasher,
{
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(AsRef::as_ref)
    }
}

impl<K, V> VariableSource for BTreeMap<K, V>
where
    K: Borrow<str> + Ord,
    V: AsRef<str>,
{
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(AsRef::as_ref)
    }
}

/// Render a chart title straight from a series' labels.
impl VariableSource for LabelSet {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name)
    }
}

impl<T: VariableSource + ?Sized> VariableSource for &T {
    fn lookup(&self, name: &str) -> Option<&str> {
        (**self).lookup(name)
    }
}

/// A parsed template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Template {
    nodes: Vec<TemplateNode>,
}

impl Template {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        Self::parse_with(text, TemplateOptions::default())
    }

    pub fn parse_with(text: &str, options: TemplateOptions) -> Result<Self, ParseError> {
        trace!(input = text, ?options, "parsing template");
        let mut parser = TemplateParser {
            cursor: Cursor::new(text),
            options,
        };
        let result = parser.parse();
        if let Err(err) = &result {
            debug!(input = text, error = %err, "template rejected");
        }
        result.map(|nodes| Template { nodes })
    }

    pub fn nodes(&self) -> &[TemplateNode] {
        &self.nodes
    }

    /// Referenced variable names, without duplicates, in order of first
    /// appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for node in &self.nodes {
            if let TemplateNode::Variable(name) = node {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Substitute every variable. Missing and empty values both render as
    /// the empty string.
    pub fn render(&self, data: &impl VariableSource) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                TemplateNode::Text(text) => out.push_str(text),
                TemplateNode::Variable(name) => {
                    if let Some(value) = data.lookup(name) {
                        out.push_str(value);
                    }
                }
            }
        }
        out
    }
}

/// Parse `text` and render it against `data`.
pub fn render_template(text: &str, data: &impl VariableSource) -> Result<String, ParseError> {
    Ok(Template::parse(text)?.render(data))
}

/// Parse `text` and list the variables it references.
pub fn parse_variables(text: &str) -> Result<Vec<String>, ParseError> {
    let template = Template::parse(text)?;
    Ok(template.variables().into_iter().map(String::from).collect())
}

// ── Scanner ─────────────────────────────────────────────────────────

struct TemplateParser<'a> {
    cursor: Cursor<'a>,
    options: TemplateOptions,
}

impl TemplateParser<'_> {
    fn parse(&mut self) -> Result<Vec<TemplateNode>, ParseError> {
        let mut nodes = Vec::new();

        loop {
            match self.cursor.peek2() {
                (None, _) => break,
                (Some(_), None) => {
                    // Remainder is a single character
                    nodes.push(self.read_text());
                    break;
                }
                (Some('$'), Some(next)) if starts_variable(next) => {
                    self.cursor.read();
                    nodes.push(self.read_variable()?);
                }
                _ => nodes.push(self.read_text()),
            }
        }

        Ok(nodes)
    }

    /// Read literal text up to the next unescaped `$` that starts a
    /// variable.
    fn read_text(&mut self) -> TemplateNode {
        let mut prev = None;
        let mut text = String::new();

        while let Some(ch) = self.cursor.read() {
            if ch == '$' {
                if prev != Some('\\') {
                    if self.cursor.peek().is_some_and(starts_variable) {
                        self.cursor.unread();
                        break;
                    }
                } else if self.options.escape == EscapeMode::Strip {
                    text.pop();
                }
            }
            text.push(ch);
            prev = Some(ch);
        }

        TemplateNode::Text(text)
    }

    /// Read a variable name; the `$` has already been consumed.
    fn read_variable(&mut self) -> Result<TemplateNode, ParseError> {
        let brace = match self.cursor.peek() {
            Some('{') => {
                let pos = self.cursor.position();
                self.cursor.read();
                Some(pos)
            }
            _ => None,
        };

        let mut name = String::new();
        let mut closed = false;

        while let Some(ch) = self.cursor.read() {
            if brace.is_some() && ch == '}' {
                closed = true;
                break;
            } else if is_variable_char(ch) {
                name.push(ch);
            } else {
                self.cursor.unread();
                break;
            }
        }

        match brace {
            Some(pos) if !closed => Err(ParseError::UnbalancedBrace { pos }),
            _ => Ok(TemplateNode::Variable(name)),
        }
    }
}

fn is_variable_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn starts_variable(ch: char) -> bool {
    is_variable_char(ch) || ch == '{'
}
