use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, trace};

use crate::error::{LabelError, ParseError};
use crate::lexer::{is_ident_char, Tokenizer};
use crate::selector::{expect_end, parse_selector};
use crate::token::TokenType;

/// Reserved label holding the metric name.
pub const NAME_LABEL: &str = "__name__";

static LABEL_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// A name and value pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Label {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Check that the name is an identifier and the value is not empty.
    pub fn validate(&self) -> Result<(), LabelError> {
        if self.name.is_empty() {
            return Err(LabelError::EmptyName);
        }
        if !LABEL_NAME.is_match(&self.name) {
            return Err(LabelError::InvalidName(self.name.clone()));
        }
        if self.value.is_empty() {
            return Err(LabelError::EmptyValue {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, quote(&self.value))
    }
}

/// Label names mapped to values.
///
/// Names are unique. Iteration and serialization follow insertion order;
/// equality ignores it.
#[derive(Debug, Clone, Default)]
pub struct LabelSet {
    labels: Vec<Label>,
}

impl LabelSet {
    pub fn new() -> Self {
        LabelSet { labels: Vec::new() }
    }

    /// Parse `name`, `{key="value",...}` or `name{key="value",...}`.
    ///
    /// The whole input must be a selector. Only `=` matchers are accepted.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        trace!(input = text, "parsing label set");
        let mut tokenizer = Tokenizer::new(text);
        let result = Self::from_tokenizer(&mut tokenizer).and_then(|labels| {
            expect_end(&mut tokenizer)?;
            Ok(labels)
        });
        if let Err(err) = &result {
            debug!(input = text, error = %err, "label set rejected");
        }
        result
    }

    /// Parse a selector from `tokenizer`, leaving any following tokens
    /// unconsumed.
    pub fn from_tokenizer(tokenizer: &mut Tokenizer<'_>) -> Result<Self, ParseError> {
        let pairs = parse_selector(
            tokenizer,
            |name| (NAME_LABEL.to_string(), name),
            parse_label,
        )?;
        Ok(pairs.into_iter().collect())
    }

    /// Set `name` to `value`, returning the previous value. An existing
    /// label keeps its place in the iteration order.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        match self.labels.iter_mut().find(|l| l.name == name) {
            Some(label) => Some(std::mem::replace(&mut label.value, value)),
            None => {
                self.labels.push(Label { name, value });
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.value.as_str())
    }

    /// The metric name, if present.
    pub fn name(&self) -> Option<&str> {
        self.get(NAME_LABEL)
    }

    /// Delete a label, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self.labels.iter().position(|l| l.name == name)?;
        Some(self.labels.remove(idx).value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Label> {
        self.labels.iter()
    }

    /// Labels in insertion order, optionally skipping the metric name.
    pub fn labels(&self, include_name: bool) -> impl Iterator<Item = &Label> {
        self.labels
            .iter()
            .filter(move |l| include_name || l.name != NAME_LABEL)
    }

    pub fn validate(&self) -> Result<(), LabelError> {
        self.labels.iter().try_for_each(Label::validate)
    }
}

fn parse_label(tokenizer: &mut Tokenizer<'_>) -> Result<(String, String), ParseError> {
    let name = tokenizer.expect(TokenType::Ident)?.text;
    tokenizer.expect(TokenType::Eq)?;
    let value = tokenizer.expect(TokenType::String)?.text;
    Ok((name, value))
}

/// Double-quote `value`, escaping only what the tokenizer unescapes.
pub(crate) fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            out.push('\\');
        }
        out.push(ch);
    }
    out.push('"');
    out
}

/// Whether `name` reads back as a single identifier token.
fn is_bare_name(name: &str) -> bool {
    match name.chars().next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            name.chars().all(is_ident_char)
        }
        _ => false,
    }
}

/// `name{key="value",...}`: the metric name first and unquoted, then the
/// remaining labels in insertion order. Braces are omitted when no other
/// labels exist; an empty set renders as the empty string.
impl fmt::Display for LabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest: Vec<&Label> = self.labels(false).collect();

        if let Some(label) = self.labels.iter().find(|l| l.name == NAME_LABEL) {
            if is_bare_name(&label.value) {
                f.write_str(&label.value)?;
            } else {
                // Would not tokenize back as a name; keep it as the first matcher
                rest.insert(0, label);
            }
        }

        if rest.is_empty() {
            return Ok(());
        }

        f.write_str("{")?;
        for (idx, label) in rest.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", label)?;
        }
        f.write_str("}")
    }
}

impl FromStr for LabelSet {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LabelSet::parse(s)
    }
}

impl PartialEq for LabelSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .labels
                .iter()
                .all(|l| other.get(&l.name) == Some(l.value.as_str()))
    }
}

impl Eq for LabelSet {}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = LabelSet::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

impl<'a> IntoIterator for &'a LabelSet {
    type Item = &'a Label;
    type IntoIter = std::slice::Iter<'a, Label>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ── Serde: a JSON object in insertion order ─────────────────────────

impl Serialize for LabelSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.labels.len()))?;
        for label in &self.labels {
            map.serialize_entry(&label.name, &label.value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LabelSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LabelSetVisitor;

        impl<'de> Visitor<'de> for LabelSetVisitor {
            type Value = LabelSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of label names to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<LabelSet, A::Error> {
                let mut set = LabelSet::new();
                while let Some((name, value)) = access.next_entry::<String, String>()? {
                    set.insert(name, value);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(LabelSetVisitor)
    }
}
