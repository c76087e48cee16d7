//! Serializations of token sets: TFF round-trip text, JSON, the plain
//! boundary mapping, and a DOT dependency graph.
//!
//! All of these are pure functions over a token set; none of them require
//! the set to be complete, acyclic or resolved.

use crate::tff::set::TokenSet;
use crate::tff::token::{Token, TokenValue};

/// Quote a raw value for TFF output, preferring double quotes and falling
/// back to single quotes when the value itself contains one. A value
/// containing both quote kinds is not representable in the grammar.
fn quote(text: &str) -> String {
    if text.contains('"') {
        format!("'{}'", text)
    } else {
        format!("\"{}\"", text)
    }
}

/// JSON-escape a string (string serialization cannot fail).
fn json_string(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

/// One token as a TFF assignment line, values in source form.
pub fn token_to_tff(token: &Token) -> String {
    let values: Vec<String> = token
        .values()
        .iter()
        .map(|value| quote(&value.to_string()))
        .collect();
    format!("\"{}\" = {}", token.name(), values.join(", "))
}

/// The whole set in TFF form, one assignment per line. Parsing the output
/// reproduces an equivalent set (for sets the grammar can produce).
pub fn to_tff(set: &TokenSet) -> String {
    set.iter().map(token_to_tff).collect::<Vec<_>>().join("\n")
}

/// The set as a JSON object mapping each name to its list of raw values,
/// in set order.
pub fn to_json(set: &TokenSet) -> String {
    let entries: Vec<String> = set
        .iter()
        .map(|token| {
            let values: Vec<String> = token
                .values()
                .iter()
                .map(|value| json_string(&value.text()))
                .collect();
            format!("\t{}: [{}]", json_string(token.name()), values.join(", "))
        })
        .collect();
    format!("{{\n{}\n}}", entries.join(",\n"))
}

/// The boundary mapping as JSON, in set order: empty tokens are `null`,
/// single tokens bare strings, iterated tokens lists.
pub fn mapping_to_json(set: &TokenSet) -> String {
    let entries: Vec<String> = set
        .as_mapping()
        .iter()
        .map(|(name, value)| {
            let rendered = match value {
                TokenValue::Empty => "null".to_string(),
                TokenValue::Single(text) => json_string(text),
                TokenValue::Iterated(texts) => {
                    let items: Vec<String> =
                        texts.iter().map(|text| json_string(text)).collect();
                    format!("[{}]", items.join(", "))
                }
            };
            format!("{}: {}", json_string(name), rendered)
        })
        .collect();
    format!("{{{}}}", entries.join(", "))
}

/// The dependency graph in DOT form: nodes are token names, edges point at
/// the names a token depends on.
pub fn to_dot(set: &TokenSet, graph_name: &str) -> String {
    let mut lines = Vec::new();
    lines.push(format!("digraph \"{}\" {{", graph_name));
    for token in set.iter() {
        lines.push(format!("\t\"{}\";", token.name()));
    }
    for token in set.iter() {
        for dependency in token.dependencies() {
            lines.push(format!("\t\"{}\" -> \"{}\";", token.name(), dependency));
        }
    }
    lines.push("}".to_string());
    lines.join("\n")
}
