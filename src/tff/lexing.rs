//! Statement-level tokenization for TFF source.
//!
//! The lexer handles quoting and comments so the statement parser can work
//! over a flat lexeme stream; keeping that complexity here keeps the parsing
//! stage simple. Newlines are lexemes of their own because statements are
//! line-delimited.

use logos::Logos;
use std::ops::Range;

use crate::tff::error::ParseError;

fn trim_quotes(slice: &str) -> String {
    slice[1..slice.len() - 1].to_string()
}

/// All possible lexemes in TFF source.
///
/// Bare words allow alphanumerics plus `. - _ { } / :` — braces so unquoted
/// values can carry `{name}` references, slashes and colons so paths and
/// URLs survive unquoted.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
pub enum Lexeme {
    #[token("=")]
    Equals,

    #[token(",")]
    Comma,

    #[token("(")]
    OpenParen,

    #[token(")")]
    CloseParen,

    #[token("\n")]
    Newline,

    // Comment to end of line
    #[regex(r"#[^\n]*")]
    Comment,

    #[regex(r#""[^"\n]*""#, |lex| trim_quotes(lex.slice()))]
    DoubleQuoted(String),

    #[regex(r"'[^'\n]*'", |lex| trim_quotes(lex.slice()))]
    SingleQuoted(String),

    #[regex(r"[A-Za-z0-9.\-_{}/:]+", |lex| lex.slice().to_owned())]
    Word(String),
}

/// Tokenize TFF source, reporting any unrecognized character with its line.
pub fn tokenize(source: &str) -> Result<Vec<(Lexeme, Range<usize>)>, ParseError> {
    let mut lexer = Lexeme::lexer(source);
    let mut lexemes = Vec::new();
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        match result {
            Ok(lexeme) => lexemes.push((lexeme, span)),
            Err(()) => {
                return Err(ParseError::Syntax {
                    line: line_of(source, span.start),
                    message: format!("unexpected character {:?}", &source[span.clone()]),
                })
            }
        }
    }
    Ok(lexemes)
}

/// 1-based line number of a byte offset.
pub(crate) fn line_of(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}
