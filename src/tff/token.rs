//! The token model: a name plus an ordered list of value expressions.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::tff::error::ExprError;
use crate::tff::expression::ValueExpr;

/// A named, possibly multi-valued piece of text configuration.
///
/// A token with no values is "empty", with exactly one value "single", and
/// with more than one value "iterated"; iterated tokens drive combinatorial
/// expansion. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    name: String,
    values: Vec<ValueExpr>,
}

impl Token {
    /// Create a token from already-parsed value expressions.
    ///
    /// Panics on an empty name; the grammar cannot produce one.
    pub fn new(name: impl Into<String>, values: Vec<ValueExpr>) -> Self {
        let name = name.into();
        assert!(!name.is_empty(), "token name must be non-empty");
        Token { name, values }
    }

    /// Create a token by parsing each raw value for references.
    pub fn parse<S: AsRef<str>>(
        name: impl Into<String>,
        raw_values: &[S],
    ) -> Result<Self, ExprError> {
        let values = raw_values
            .iter()
            .map(|value| ValueExpr::parse(value.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Token::new(name, values))
    }

    /// The token name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The values the token can take, in definition order.
    pub fn values(&self) -> &[ValueExpr] {
        &self.values
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the token has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the token has exactly one value.
    pub fn is_single(&self) -> bool {
        self.values.len() == 1
    }

    /// Whether the token has more than one value.
    pub fn is_iterated(&self) -> bool {
        self.values.len() > 1
    }

    /// The union of reference names across all values.
    pub fn dependencies(&self) -> BTreeSet<String> {
        let mut dependencies = BTreeSet::new();
        for value in &self.values {
            dependencies.extend(value.references());
        }
        dependencies
    }

    /// The plain form of this token's values.
    pub fn value(&self) -> TokenValue {
        match self.values.as_slice() {
            [] => TokenValue::Empty,
            [single] => TokenValue::Single(single.text()),
            values => TokenValue::Iterated(values.iter().map(|value| value.text()).collect()),
        }
    }
}

/// The plain value form of a token crossing the boundary to the template
/// layer: `null` for an empty token, a bare string for a single value, an
/// ordered list for an iterated token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TokenValue {
    Empty,
    Single(String),
    Iterated(Vec<String>),
}
