//! The TFF grammar parser.
//!
//! Parses DSL source from files, URLs, or inline strings into a raw
//! [`TokenSet`], loading `FILE`/`SFILE`/`URL` function assignments and
//! recursively merging `IMPORT`ed sources up to a configured depth.
//! Function and import arguments may reference only tokens defined strictly
//! earlier in source order; value references may point anywhere in the final
//! set and are resolved later by the dependency engine.

use log::{debug, info};
use std::fs;
use std::ops::Range;

use crate::tff::error::{LoadError, ParseError};
use crate::tff::expression::ValueExpr;
use crate::tff::lexing::{self, Lexeme};
use crate::tff::set::TokenSet;
use crate::tff::token::Token;

/// Default bound on nested import depth.
pub const DEFAULT_RECURSION_LIMIT: usize = 16;

/// Parser configuration, passed at construction instead of ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Maximum nested import depth; exceeding it is a fatal parse error.
    pub recursion_limit: usize,
    /// Fallback text encoding for URL bodies that do not declare a charset.
    pub encoding: String,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            encoding: "utf-8".to_string(),
        }
    }
}

/// The closed set of value-loading functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFunction {
    /// Read lines from a file, skipping blank and `#` lines.
    File,
    /// Read every line of a file verbatim.
    SimpleFile,
    /// Fetch lines from a URL, with the `File` line rules.
    Url,
}

impl SourceFunction {
    fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_uppercase().as_str() {
            "FILE" => Some(SourceFunction::File),
            "SFILE" => Some(SourceFunction::SimpleFile),
            "URL" => Some(SourceFunction::Url),
            _ => None,
        }
    }
}

/// A single parsed TFF statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `name = v1, v2, ...`
    Assignment {
        name: String,
        values: Vec<ValueExpr>,
    },
    /// `name = FILE(arg)`, `name = SFILE(arg)` or `name = URL(arg)`
    FunctionAssignment {
        name: String,
        function: SourceFunction,
        argument: ValueExpr,
    },
    /// `IMPORT(path)`
    Import { path: ValueExpr },
}

/// A parser for TFF source.
#[derive(Debug, Clone, Default)]
pub struct TffParser {
    config: ParserConfig,
}

impl TffParser {
    pub fn new() -> Self {
        TffParser::default()
    }

    pub fn with_config(config: ParserConfig) -> Self {
        TffParser { config }
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parse a TFF file into a token set.
    pub fn parse_file(&self, path: &str) -> Result<TokenSet, ParseError> {
        self.parse_file_at_depth(path, 0)
    }

    /// Parse inline TFF source into a token set.
    pub fn parse_str(&self, source: &str) -> Result<TokenSet, ParseError> {
        self.parse_source(source, 0)
    }

    /// Fetch a URL and parse its body as TFF source.
    pub fn parse_url(&self, url: &str) -> Result<TokenSet, ParseError> {
        let body = fetch_url(url, &self.config.encoding)?;
        self.parse_source(&body, 0)
    }

    fn parse_file_at_depth(&self, path: &str, depth: usize) -> Result<TokenSet, ParseError> {
        debug!("parsing TFF file \"{}\"", path);
        let source = fs::read_to_string(path).map_err(|error| LoadError::File {
            path: path.to_string(),
            message: error.to_string(),
        })?;
        self.parse_source(&source, depth)
    }

    fn parse_source(&self, source: &str, depth: usize) -> Result<TokenSet, ParseError> {
        if depth > self.config.recursion_limit {
            return Err(ParseError::RecursionLimit(self.config.recursion_limit));
        }
        let mut set = TokenSet::new();
        for (statement, _line) in parse_statements(source)? {
            self.apply(&mut set, statement, depth)?;
        }
        Ok(set)
    }

    /// Apply one statement to the set built so far. Function and import
    /// arguments resolve against that same partial set.
    fn apply(&self, set: &mut TokenSet, statement: Statement, depth: usize) -> Result<(), ParseError> {
        match statement {
            Statement::Assignment { name, values } => {
                set.add(Token::new(name, values));
            }
            Statement::FunctionAssignment {
                name,
                function,
                argument,
            } => {
                for resolved in set.resolve_expr(&argument)? {
                    let token = match function {
                        SourceFunction::File => {
                            info!("reading data from file \"{}\"", resolved);
                            token_from_file(&name, &resolved, false)?
                        }
                        SourceFunction::SimpleFile => {
                            info!("reading data from simple file \"{}\"", resolved);
                            token_from_file(&name, &resolved, true)?
                        }
                        SourceFunction::Url => {
                            info!("reading data from URL \"{}\"", resolved);
                            token_from_url(&name, &resolved, &self.config.encoding)?
                        }
                    };
                    set.add(token);
                }
            }
            Statement::Import { path } => {
                for resolved in set.resolve_expr(&path)? {
                    info!("importing TFF source \"{}\"", resolved);
                    // Files and URLs are interchangeable as import sources.
                    let nested = if is_url(&resolved) {
                        let body = fetch_url(&resolved, &self.config.encoding)?;
                        self.parse_source(&body, depth + 1)?
                    } else {
                        self.parse_file_at_depth(&resolved, depth + 1)?
                    };
                    set.extend(nested);
                }
            }
        }
        Ok(())
    }
}

/// Split source into statements, one per non-empty line.
fn parse_statements(source: &str) -> Result<Vec<(Statement, usize)>, ParseError> {
    let lexemes = lexing::tokenize(source)?;
    let mut statements = Vec::new();
    let mut current: Vec<(Lexeme, Range<usize>)> = Vec::new();
    let mut line = 1usize;
    for (lexeme, span) in lexemes {
        match lexeme {
            Lexeme::Newline => {
                if !current.is_empty() {
                    statements.push((parse_statement(&current, line)?, line));
                    current.clear();
                }
                line += 1;
            }
            Lexeme::Comment => {}
            other => current.push((other, span)),
        }
    }
    if !current.is_empty() {
        statements.push((parse_statement(&current, line)?, line));
    }
    Ok(statements)
}

fn value_text(lexeme: &Lexeme) -> Option<&str> {
    match lexeme {
        Lexeme::Word(text) | Lexeme::DoubleQuoted(text) | Lexeme::SingleQuoted(text) => Some(text),
        _ => None,
    }
}

fn parse_statement(
    lexemes: &[(Lexeme, Range<usize>)],
    line: usize,
) -> Result<Statement, ParseError> {
    let syntax = |message: String| ParseError::Syntax { line, message };

    // IMPORT(path)
    if let [(Lexeme::Word(keyword), _), (Lexeme::OpenParen, _), argument, (Lexeme::CloseParen, _)] =
        lexemes
    {
        if keyword.eq_ignore_ascii_case("IMPORT") {
            let path = value_text(&argument.0)
                .ok_or_else(|| syntax("expected a path inside IMPORT(...)".to_string()))?;
            return Ok(Statement::Import {
                path: parse_value(path, line)?,
            });
        }
    }

    // Everything else starts `name =`.
    let name = match (lexemes.first(), lexemes.get(1)) {
        (Some((lexeme, _)), Some((Lexeme::Equals, _))) => value_text(lexeme),
        _ => None,
    }
    .ok_or_else(|| {
        syntax("expected `name = ...`, `name = FUNC(...)` or `IMPORT(...)`".to_string())
    })?;
    if name.is_empty() {
        return Err(syntax("empty token name".to_string()));
    }
    let rest = &lexemes[2..];

    // name = FUNC(arg)
    if let [(Lexeme::Word(keyword), _), (Lexeme::OpenParen, _), argument, (Lexeme::CloseParen, _)] =
        rest
    {
        if let Some(function) = SourceFunction::from_keyword(keyword) {
            let text = value_text(&argument.0).ok_or_else(|| {
                syntax(format!("expected an argument inside {}(...)", keyword))
            })?;
            return Ok(Statement::FunctionAssignment {
                name: name.to_string(),
                function,
                argument: parse_value(text, line)?,
            });
        }
    }

    // name = v1, v2, ...
    if rest.is_empty() {
        return Err(syntax("expected at least one value after `=`".to_string()));
    }
    let mut values = Vec::new();
    let mut expect_value = true;
    for (lexeme, _) in rest {
        if expect_value {
            let text = value_text(lexeme)
                .ok_or_else(|| syntax(format!("expected a value, found {:?}", lexeme)))?;
            values.push(parse_value(text, line)?);
            expect_value = false;
        } else {
            match lexeme {
                Lexeme::Comma => expect_value = true,
                other => {
                    return Err(syntax(format!(
                        "expected `,` between values, found {:?}",
                        other
                    )))
                }
            }
        }
    }
    if expect_value {
        return Err(syntax("trailing comma after value list".to_string()));
    }
    Ok(Statement::Assignment {
        name: name.to_string(),
        values,
    })
}

/// Parse raw value text, attaching the statement line to any brace error.
fn parse_value(text: &str, line: usize) -> Result<ValueExpr, ParseError> {
    ValueExpr::parse(text).map_err(|error| ParseError::Syntax {
        line,
        message: error.to_string(),
    })
}

/// Build a token from the lines of a file. With `simple` every line is kept
/// verbatim; otherwise lines are trimmed and blank or `#` lines skipped.
fn token_from_file(name: &str, path: &str, simple: bool) -> Result<Token, ParseError> {
    let content = fs::read_to_string(path).map_err(|error| LoadError::File {
        path: path.to_string(),
        message: error.to_string(),
    })?;
    token_from_lines(name, &content, path, simple)
}

/// Build a token from the lines of a URL body, with the non-simple rules.
fn token_from_url(name: &str, url: &str, encoding: &str) -> Result<Token, ParseError> {
    let body = fetch_url(url, encoding)?;
    token_from_lines(name, &body, url, false)
}

fn token_from_lines(
    name: &str,
    content: &str,
    origin: &str,
    simple: bool,
) -> Result<Token, ParseError> {
    let mut values = Vec::new();
    for (index, raw_line) in content.lines().enumerate() {
        let line = if simple { raw_line } else { raw_line.trim() };
        if !simple && (line.is_empty() || line.starts_with('#')) {
            continue;
        }
        let value = ValueExpr::parse(line).map_err(|error| ParseError::Syntax {
            line: index + 1,
            message: format!("in value from \"{}\": {}", origin, error),
        })?;
        values.push(value);
    }
    Ok(Token::new(name, values))
}

fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Fetch a URL body, decoding with `encoding` when the response does not
/// declare a charset. Non-success statuses are load errors.
fn fetch_url(url: &str, encoding: &str) -> Result<String, ParseError> {
    let load_error = |message: String| {
        ParseError::Load(LoadError::Url {
            url: url.to_string(),
            message,
        })
    };
    let response = reqwest::blocking::get(url)
        .and_then(|response| response.error_for_status())
        .map_err(|error| load_error(error.to_string()))?;
    response
        .text_with_charset(encoding)
        .map_err(|error| load_error(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statements(source: &str) -> Vec<Statement> {
        parse_statements(source)
            .unwrap()
            .into_iter()
            .map(|(statement, _)| statement)
            .collect()
    }

    fn value(text: &str) -> ValueExpr {
        ValueExpr::parse(text).unwrap()
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            statements("name = a, b"),
            vec![Statement::Assignment {
                name: "name".to_string(),
                values: vec![value("a"), value("b")],
            }]
        );
    }

    #[test]
    fn test_parse_quoted_name_and_values() {
        assert_eq!(
            statements(r#""a name" = "x y", 'z'"#),
            vec![Statement::Assignment {
                name: "a name".to_string(),
                values: vec![value("x y"), value("z")],
            }]
        );
    }

    #[test]
    fn test_parse_function_assignment_keywords_case_insensitive() {
        assert_eq!(
            statements("t = file(values.txt)"),
            vec![Statement::FunctionAssignment {
                name: "t".to_string(),
                function: SourceFunction::File,
                argument: value("values.txt"),
            }]
        );
        assert_eq!(
            statements("t = SFILE('data file.txt')"),
            vec![Statement::FunctionAssignment {
                name: "t".to_string(),
                function: SourceFunction::SimpleFile,
                argument: value("data file.txt"),
            }]
        );
        assert_eq!(
            statements("t = URL(http://example.com/tokens)"),
            vec![Statement::FunctionAssignment {
                name: "t".to_string(),
                function: SourceFunction::Url,
                argument: value("http://example.com/tokens"),
            }]
        );
    }

    #[test]
    fn test_parse_import() {
        assert_eq!(
            statements("IMPORT(common.tff)"),
            vec![Statement::Import {
                path: value("common.tff"),
            }]
        );
        assert_eq!(
            statements("import('more.tff')"),
            vec![Statement::Import {
                path: value("more.tff"),
            }]
        );
    }

    #[test]
    fn test_function_argument_may_reference_tokens() {
        assert_eq!(
            statements("t = FILE({dir}/values.txt)"),
            vec![Statement::FunctionAssignment {
                name: "t".to_string(),
                function: SourceFunction::File,
                argument: value("{dir}/values.txt"),
            }]
        );
    }

    #[test]
    fn test_comments_and_blank_lines_ignored() {
        let source = "# leading comment\n\na = 1 # trailing\n\n# another\nb = 2\n";
        assert_eq!(statements(source).len(), 2);
    }

    #[test]
    fn test_word_named_like_function_is_plain_value() {
        // Without parentheses FILE is just a value.
        assert_eq!(
            statements("a = FILE"),
            vec![Statement::Assignment {
                name: "a".to_string(),
                values: vec![value("FILE")],
            }]
        );
    }

    #[test]
    fn test_token_named_import_still_assignable() {
        assert_eq!(
            statements("import = x"),
            vec![Statement::Assignment {
                name: "import".to_string(),
                values: vec![value("x")],
            }]
        );
    }

    #[test]
    fn test_syntax_errors_carry_line_numbers() {
        match parse_statements("a = 1\nb = ") {
            Err(ParseError::Syntax { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected a syntax error, got {:?}", other),
        }
        match parse_statements("a = 1, ") {
            Err(ParseError::Syntax { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected a syntax error, got {:?}", other),
        }
        match parse_statements("= 1") {
            Err(ParseError::Syntax { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected a syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_unbalanced_braces_in_value_are_syntax_errors() {
        match parse_statements("a = {oops") {
            Err(ParseError::Syntax { line, message }) => {
                assert_eq!(line, 1);
                assert!(message.contains("unmatched brace"), "message was {:?}", message);
            }
            other => panic!("expected a syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_name_rejected() {
        assert!(parse_statements("\"\" = x").is_err());
    }

    #[test]
    fn test_parser_config_defaults() {
        let config = ParserConfig::default();
        assert_eq!(config.recursion_limit, DEFAULT_RECURSION_LIMIT);
        assert_eq!(config.encoding, "utf-8");
    }

    #[test]
    fn test_parse_str_builds_token_set() {
        let parser = TffParser::new();
        let set = parser.parse_str("a = 1\nb = {a}x\n").unwrap();
        assert_eq!(set.names(), vec!["a", "b"]);
        assert_eq!(set.get("b").unwrap().values()[0].text(), "{a}x");
    }

    #[test]
    fn test_token_from_lines_skips_comments_unless_simple() {
        let content = "one\n\n# comment\n  two  \n";
        let token = token_from_lines("t", content, "test", false).unwrap();
        let values: Vec<String> = token.values().iter().map(|v| v.text()).collect();
        assert_eq!(values, vec!["one".to_string(), "two".to_string()]);

        let token = token_from_lines("t", content, "test", true).unwrap();
        let values: Vec<String> = token.values().iter().map(|v| v.text()).collect();
        assert_eq!(
            values,
            vec![
                "one".to_string(),
                String::new(),
                "# comment".to_string(),
                "  two  ".to_string(),
            ]
        );
    }
}
