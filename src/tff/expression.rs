//! Reference scanning and the value-expression model.
//!
//! A token value is an ordered sequence of literal fragments and `{name}`
//! references. The scanner is a small logos lexer: `{{` and `}}` are literal
//! braces, `{name}` is a reference, and a lone brace is an error. Reference
//! order and multiplicity are preserved for reconstruction; dependency sets
//! collapse duplicates.

use logos::Logos;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::tff::error::{ExprError, TokenError};

/// Raw scanner tokens for the `{}` reference syntax.
#[derive(Logos, Debug, Clone, PartialEq)]
enum RawSegment {
    #[token("{{")]
    EscapedOpen,

    #[token("}}")]
    EscapedClose,

    #[regex(r"\{[^{}]*\}")]
    Reference,

    #[regex(r"[^{}]+")]
    Text,
}

/// One segment of a token value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// A literal text fragment.
    Literal(String),
    /// A `{name}` reference to another token.
    Reference(String),
}

/// The parsed literal/reference structure of one token value.
///
/// Immutable once constructed from source text. Adjacent literal fragments
/// (including unescaped braces) are merged into a single segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueExpr {
    segments: Vec<Segment>,
}

fn push_literal(segments: &mut Vec<Segment>, text: &str) {
    if let Some(Segment::Literal(previous)) = segments.last_mut() {
        previous.push_str(text);
    } else {
        segments.push(Segment::Literal(text.to_string()));
    }
}

impl ValueExpr {
    /// Parse raw value text into literal and reference segments.
    pub fn parse(text: &str) -> Result<Self, ExprError> {
        let mut segments = Vec::new();
        let mut lexer = RawSegment::lexer(text);
        while let Some(result) = lexer.next() {
            let span = lexer.span();
            match result {
                Ok(RawSegment::EscapedOpen) => push_literal(&mut segments, "{"),
                Ok(RawSegment::EscapedClose) => push_literal(&mut segments, "}"),
                Ok(RawSegment::Reference) => {
                    let name = &text[span.start + 1..span.end - 1];
                    if name.is_empty() {
                        return Err(ExprError::EmptyReference {
                            position: span.start,
                        });
                    }
                    segments.push(Segment::Reference(name.to_string()));
                }
                Ok(RawSegment::Text) => push_literal(&mut segments, &text[span.clone()]),
                Err(()) => {
                    return Err(ExprError::UnmatchedBrace {
                        position: span.start,
                    })
                }
            }
        }
        Ok(ValueExpr { segments })
    }

    /// A value expression holding `text` verbatim, with no references.
    /// Empty text yields no segments, matching what parsing produces.
    pub fn literal(text: impl Into<String>) -> Self {
        let text = text.into();
        let segments = if text.is_empty() {
            Vec::new()
        } else {
            vec![Segment::Literal(text)]
        };
        ValueExpr { segments }
    }

    /// The ordered segments of this value.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// The distinct token names referenced by this value.
    pub fn references(&self) -> BTreeSet<String> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Reference(name) => Some(name.clone()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Whether the value contains no references.
    pub fn is_resolved(&self) -> bool {
        self.segments
            .iter()
            .all(|segment| matches!(segment, Segment::Literal(_)))
    }

    /// The raw text of the value: references rendered as `{name}`, literal
    /// braces unescaped.
    pub fn text(&self) -> String {
        let mut output = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Reference(name) => {
                    output.push('{');
                    output.push_str(name);
                    output.push('}');
                }
            }
        }
        output
    }

    /// Replace every reference with its mapped value.
    ///
    /// Fails with a `MissingTokens` error listing every referenced name
    /// absent from the mapping, not just the first.
    pub fn substitute(&self, mapping: &HashMap<String, String>) -> Result<String, TokenError> {
        let missing: BTreeSet<String> = self
            .references()
            .into_iter()
            .filter(|name| !mapping.contains_key(name))
            .collect();
        if !missing.is_empty() {
            return Err(TokenError::MissingTokens(missing));
        }
        let mut output = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Reference(name) => output.push_str(&mapping[name]),
            }
        }
        Ok(output)
    }
}

/// The source form of the value: literal braces re-escaped by doubling,
/// references as `{name}`. Parsing this form reproduces the expression.
impl fmt::Display for ValueExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => {
                    write!(f, "{}", text.replace('{', "{{").replace('}', "}}"))?;
                }
                Segment::Reference(name) => write!(f, "{{{}}}", name)?,
            }
        }
        Ok(())
    }
}

/// Extract the distinct reference names appearing in raw value text.
pub fn extract_references(text: &str) -> Result<BTreeSet<String>, ExprError> {
    Ok(ValueExpr::parse(text)?.references())
}
