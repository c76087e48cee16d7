//! Error types for TFF parsing and resolution.
//!
//! Token-level errors carry the exact set of offending names so callers can
//! render them without re-deriving anything from the dependency graph. Load
//! failures stay distinct from token errors so "your graph is broken" and
//! "a resource could not be fetched" remain distinguishable.

use std::collections::BTreeSet;
use std::fmt;

/// Join token names as a quoted, comma-separated list.
pub(crate) fn join_names(names: &BTreeSet<String>) -> String {
    names
        .iter()
        .map(|name| format!("\"{}\"", name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised while validating or resolving a token set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Resolution needs names that are not present in the set.
    MissingTokens(BTreeSet<String>),
    /// The internal dependency graph contains a cycle.
    CyclicDependencies(BTreeSet<String>),
    /// An iterated token was used where a single value is required.
    IteratedToken(String),
}

impl TokenError {
    /// The token names the error refers to.
    pub fn names(&self) -> BTreeSet<String> {
        match self {
            TokenError::MissingTokens(names) | TokenError::CyclicDependencies(names) => {
                names.clone()
            }
            TokenError::IteratedToken(name) => BTreeSet::from([name.clone()]),
        }
    }
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::MissingTokens(names) => {
                write!(f, "missing tokens: {}", join_names(names))
            }
            TokenError::CyclicDependencies(names) => {
                write!(f, "cyclic dependencies: {}", join_names(names))
            }
            TokenError::IteratedToken(name) => {
                write!(
                    f,
                    "token \"{}\" is iterated where a single value is required",
                    name
                )
            }
        }
    }
}

impl std::error::Error for TokenError {}

/// Malformed `{}` reference syntax inside a single value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprError {
    /// A `{` or `}` with no partner and not escaped by doubling.
    UnmatchedBrace { position: usize },
    /// A `{}` reference with no name inside.
    EmptyReference { position: usize },
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprError::UnmatchedBrace { position } => {
                write!(f, "unmatched brace at byte {}", position)
            }
            ExprError::EmptyReference { position } => {
                write!(f, "empty reference name at byte {}", position)
            }
        }
    }
}

impl std::error::Error for ExprError {}

/// Failure to read a file or fetch a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// A file could not be read.
    File { path: String, message: String },
    /// A URL could not be fetched or its body decoded.
    Url { url: String, message: String },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::File { path, message } => {
                write!(f, "cannot read file \"{}\": {}", path, message)
            }
            LoadError::Url { url, message } => {
                write!(f, "cannot fetch URL \"{}\": {}", url, message)
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// Errors raised while parsing TFF source.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// A statement that does not match the grammar.
    Syntax { line: usize, message: String },
    /// Malformed reference syntax in value text outside any statement.
    Value(ExprError),
    /// An import chain deeper than the configured limit.
    RecursionLimit(usize),
    /// A file or URL source could not be loaded.
    Load(LoadError),
    /// Token resolution failed while evaluating a function or import argument.
    Token(TokenError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Syntax { line, message } => {
                write!(f, "syntax error on line {}: {}", line, message)
            }
            ParseError::Value(error) => write!(f, "malformed value: {}", error),
            ParseError::RecursionLimit(limit) => {
                write!(f, "import depth exceeds the recursion limit ({})", limit)
            }
            ParseError::Load(error) => write!(f, "{}", error),
            ParseError::Token(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<ExprError> for ParseError {
    fn from(error: ExprError) -> Self {
        ParseError::Value(error)
    }
}

impl From<LoadError> for ParseError {
    fn from(error: LoadError) -> Self {
        ParseError::Load(error)
    }
}

impl From<TokenError> for ParseError {
    fn from(error: TokenError) -> Self {
        ParseError::Token(error)
    }
}
