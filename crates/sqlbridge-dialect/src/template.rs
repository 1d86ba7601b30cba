//! Function templates with named placeholders.
//!
//! A template is plain SQL text containing `{unit}`, `{expression}`, `{value}`,
//! `{type}`, `{list}`, `{alias}` or `{relation}` tokens. Rendering is a single
//! left-to-right scan, so substitution order never matters and substituted text
//! is never rescanned. Tokens without a substitution stay verbatim.

use std::collections::BTreeMap;
use std::fmt;

/// Placeholder names recognised in templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Placeholder {
    Unit,
    Expression,
    Value,
    Type,
    List,
    Alias,
    Relation,
}

impl Placeholder {
    pub const ALL: [Placeholder; 7] = [
        Placeholder::Unit,
        Placeholder::Expression,
        Placeholder::Value,
        Placeholder::Type,
        Placeholder::List,
        Placeholder::Alias,
        Placeholder::Relation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Placeholder::Unit => "unit",
            Placeholder::Expression => "expression",
            Placeholder::Value => "value",
            Placeholder::Type => "type",
            Placeholder::List => "list",
            Placeholder::Alias => "alias",
            Placeholder::Relation => "relation",
        }
    }

    /// The literal token, e.g. `{unit}`.
    pub fn token(self) -> String {
        format!("{{{}}}", self.name())
    }

    fn from_name(name: &str) -> Option<Self> {
        Placeholder::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.name())
    }
}

/// Values to substitute into a template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitutions {
    values: BTreeMap<Placeholder, String>,
}

impl Substitutions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, placeholder: Placeholder, value: impl Into<String>) -> Self {
        self.values.insert(placeholder, value.into());
        self
    }

    pub fn unit(self, value: impl Into<String>) -> Self {
        self.with(Placeholder::Unit, value)
    }

    pub fn expression(self, value: impl Into<String>) -> Self {
        self.with(Placeholder::Expression, value)
    }

    pub fn value(self, value: impl Into<String>) -> Self {
        self.with(Placeholder::Value, value)
    }

    pub fn type_name(self, value: impl Into<String>) -> Self {
        self.with(Placeholder::Type, value)
    }

    pub fn list(self, value: impl Into<String>) -> Self {
        self.with(Placeholder::List, value)
    }

    pub fn alias(self, value: impl Into<String>) -> Self {
        self.with(Placeholder::Alias, value)
    }

    pub fn relation(self, value: impl Into<String>) -> Self {
        self.with(Placeholder::Relation, value)
    }

    pub fn get(&self, placeholder: Placeholder) -> Option<&str> {
        self.values.get(&placeholder).map(|s| s.as_str())
    }

    pub fn placeholders(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.values.keys().copied()
    }
}

/// A borrowed template string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template<'a> {
    text: &'a str,
}

impl<'a> Template<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    pub fn as_str(&self) -> &'a str {
        self.text
    }

    /// Recognised placeholders in order of first appearance.
    pub fn placeholders(&self) -> Vec<Placeholder> {
        let mut found = Vec::new();
        let mut rest = self.text;
        while let Some(start) = rest.find('{') {
            let after = &rest[start + 1..];
            match after.find('}') {
                Some(end) => {
                    if let Some(p) = Placeholder::from_name(&after[..end]) {
                        if !found.contains(&p) {
                            found.push(p);
                        }
                    }
                    rest = &after[end + 1..];
                },
                None => break,
            }
        }
        found
    }

    /// Substitute every placeholder present in `subs`; leave the rest verbatim.
    pub fn render(&self, subs: &Substitutions) -> String {
        let mut out = String::with_capacity(self.text.len() + 32);
        let mut rest = self.text;

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let replaced = after.find('}').and_then(|end| {
                let name = &after[..end];
                Placeholder::from_name(name)
                    .and_then(|p| subs.get(p))
                    .map(|value| (value, end))
            });

            match replaced {
                Some((value, end)) => {
                    out.push_str(value);
                    rest = &after[end + 1..];
                },
                None => {
                    out.push('{');
                    rest = after;
                },
            }
        }

        out.push_str(rest);
        out
    }
}
