//! The token collection and its dependency-resolution engine.
//!
//! A `TokenSet` preserves insertion order for deterministic output; order is
//! irrelevant to resolution correctness. The resolution pipeline validates
//! completeness and acyclicity, expands iterated tokens into every
//! combination of their values, and substitutes references round by round
//! until every value is concrete.

use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::tff::error::{ParseError, TokenError};
use crate::tff::expression::ValueExpr;
use crate::tff::token::{Token, TokenValue};

/// Base name for the synthetic token injected by [`TokenSet::resolve_string`].
const SYNTHETIC_NAME: &str = "_STR_";

fn values_text(token: &Token) -> String {
    token
        .values()
        .iter()
        .map(|value| format!("\"{}\"", value.text()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// An ordered collection of tokens with unique names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenSet {
    tokens: Vec<Token>,
}

impl TokenSet {
    pub fn new() -> Self {
        TokenSet::default()
    }

    /// Number of tokens in the set.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token names in insertion order.
    pub fn names(&self) -> Vec<&str> {
        self.tokens.iter().map(|token| token.name()).collect()
    }

    /// Tokens in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Token> {
        self.tokens.iter().find(|token| token.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Add a token, replacing any existing token of the same name in place.
    ///
    /// Re-definition is not an error: the new definition wins and the event
    /// is logged at warning level. Replacing a token with an identical
    /// definition logs at debug level only.
    pub fn add(&mut self, token: Token) {
        if let Some(position) = self
            .tokens
            .iter()
            .position(|existing| existing.name() == token.name())
        {
            if self.tokens[position] == token {
                debug!(
                    "token {} redefined with an identical definition",
                    token.name()
                );
            } else {
                warn!(
                    "redefining existing token {} ({} -> {})",
                    token.name(),
                    values_text(&self.tokens[position]),
                    values_text(&token)
                );
            }
            self.tokens[position] = token;
        } else {
            debug!("added token {} ({})", token.name(), values_text(&token));
            self.tokens.push(token);
        }
    }

    /// Merge all tokens from `other` into this set, in `other`'s order.
    pub fn extend(&mut self, other: TokenSet) {
        for token in other.tokens {
            self.add(token);
        }
    }

    fn name_set(&self) -> BTreeSet<String> {
        self.tokens
            .iter()
            .map(|token| token.name().to_string())
            .collect()
    }

    /// All reference names across the set, internal and external.
    pub fn dependencies(&self) -> BTreeSet<String> {
        let mut dependencies = BTreeSet::new();
        for token in &self.tokens {
            dependencies.extend(token.dependencies());
        }
        dependencies
    }

    /// Referenced names that are keys in this set.
    pub fn internal_dependencies(&self) -> BTreeSet<String> {
        let names = self.name_set();
        self.dependencies()
            .into_iter()
            .filter(|name| names.contains(name))
            .collect()
    }

    /// Referenced names that are not keys in this set.
    pub fn external_dependencies(&self) -> BTreeSet<String> {
        let names = self.name_set();
        self.dependencies()
            .into_iter()
            .filter(|name| !names.contains(name))
            .collect()
    }

    /// Direct dependency edges: each token name maps to the names its
    /// values reference.
    pub fn dependency_graph(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.tokens
            .iter()
            .map(|token| (token.name().to_string(), token.dependencies()))
            .collect()
    }

    /// The full transitive dependency set of `name`, excluding `name`.
    ///
    /// Fixpoint expansion: dependencies of already-collected internal names
    /// are unioned in until no new names appear. External names are
    /// collected but not expanded.
    pub fn transitive_dependencies(&self, name: &str) -> BTreeSet<String> {
        let mut collected = BTreeSet::from([name.to_string()]);
        loop {
            let mut fresh = BTreeSet::new();
            for member in &collected {
                if let Some(token) = self.get(member) {
                    for dependency in token.dependencies() {
                        if !collected.contains(&dependency) {
                            fresh.insert(dependency);
                        }
                    }
                }
            }
            if fresh.is_empty() {
                break;
            }
            collected.extend(fresh);
        }
        collected.remove(name);
        collected
    }

    /// Prune dependency-graph leaves until only the cyclic core remains.
    ///
    /// Each round removes every node with no remaining out-edges (external
    /// dependencies count as leaves) and erases its incoming edges from the
    /// rest of the graph; the loop stops when a round removes nothing. The
    /// returned graph and node set are empty iff the set is acyclic. At most
    /// one round per node is needed.
    pub fn cyclic_subgraph(&self) -> (BTreeMap<String, BTreeSet<String>>, BTreeSet<String>) {
        let mut graph = self.dependency_graph();
        loop {
            let mut leaves = BTreeSet::new();
            for targets in graph.values() {
                for target in targets {
                    if !graph.contains_key(target) {
                        leaves.insert(target.clone());
                    }
                }
            }
            for (node, targets) in &graph {
                if targets.is_empty() {
                    leaves.insert(node.clone());
                }
            }
            if leaves.is_empty() {
                break;
            }
            for targets in graph.values_mut() {
                targets.retain(|target| !leaves.contains(target));
            }
            for leaf in &leaves {
                graph.remove(leaf);
            }
        }
        let nodes: BTreeSet<String> = graph.keys().cloned().collect();
        (graph, nodes)
    }

    /// The sub-collection containing `name` and its transitive internal
    /// dependencies, in set order.
    pub fn minimal_subgraph(&self, name: &str) -> TokenSet {
        let mut wanted = self.transitive_dependencies(name);
        wanted.insert(name.to_string());
        let mut output = TokenSet::new();
        for token in &self.tokens {
            if wanted.contains(token.name()) {
                output.add(token.clone());
            }
        }
        output
    }

    /// Whether the set has no external dependencies.
    pub fn is_complete(&self) -> bool {
        self.external_dependencies().is_empty()
    }

    /// Whether the internal dependency graph contains a cycle.
    pub fn is_cyclic(&self) -> bool {
        !self.cyclic_subgraph().1.is_empty()
    }

    /// Whether any token has more than one value.
    pub fn is_iterated(&self) -> bool {
        self.tokens.iter().any(|token| token.is_iterated())
    }

    /// Check completeness, then acyclicity, reporting the full name sets.
    pub fn validate(&self) -> Result<(), TokenError> {
        let external = self.external_dependencies();
        if !external.is_empty() {
            return Err(TokenError::MissingTokens(external));
        }
        let (_, cyclic) = self.cyclic_subgraph();
        if !cyclic.is_empty() {
            return Err(TokenError::CyclicDependencies(cyclic));
        }
        Ok(())
    }

    /// Expand iterated tokens into every combination of their values.
    ///
    /// Combinations follow the standard product order: the last token in
    /// set order varies fastest. Each output set has exactly one (possibly
    /// still reference-bearing) value per token. A set containing an empty
    /// token contributes an empty factor and yields no combinations.
    pub fn singularize(&self) -> Result<Vec<TokenSet>, TokenError> {
        self.validate()?;
        let lists: Vec<&[ValueExpr]> = self.tokens.iter().map(|token| token.values()).collect();
        let total: usize = lists.iter().map(|values| values.len()).product();
        let mut output = Vec::with_capacity(total);
        for combination in 0..total {
            let mut picks = vec![0usize; lists.len()];
            let mut remainder = combination;
            for position in (0..lists.len()).rev() {
                picks[position] = remainder % lists[position].len();
                remainder /= lists[position].len();
            }
            let mut set = TokenSet::new();
            for (token, pick) in self.tokens.iter().zip(picks) {
                set.add(Token::new(token.name(), vec![token.values()[pick].clone()]));
            }
            output.push(set);
        }
        Ok(output)
    }

    /// Resolve the set into concrete, reference-free values, one resolved
    /// set per combination, in product order.
    ///
    /// Validates, singularizes, then substitutes iteratively: each round
    /// resolves every token whose references all map to already
    /// reference-free values. Acyclicity guarantees at least one token
    /// resolves per round, so rounds are bounded by the token count.
    pub fn resolve(&self) -> Result<Vec<TokenSet>, TokenError> {
        let mut output = Vec::new();
        for mut candidate in self.singularize()? {
            loop {
                let resolved: HashMap<String, String> = candidate
                    .tokens
                    .iter()
                    .filter(|token| token.values()[0].is_resolved())
                    .map(|token| (token.name().to_string(), token.values()[0].text()))
                    .collect();
                let dependent: Vec<String> = candidate
                    .tokens
                    .iter()
                    .filter(|token| !token.values()[0].is_resolved())
                    .map(|token| token.name().to_string())
                    .collect();
                if dependent.is_empty() {
                    break;
                }
                let mut replacements = Vec::new();
                for name in &dependent {
                    if let Some(token) = candidate.get(name) {
                        let value = &token.values()[0];
                        if value
                            .references()
                            .iter()
                            .all(|reference| resolved.contains_key(reference))
                        {
                            replacements.push((name.clone(), value.substitute(&resolved)?));
                        }
                    }
                }
                if replacements.is_empty() {
                    // No token became ready despite pending references; only
                    // a cycle can cause this, and validation already rules
                    // cycles out.
                    return Err(TokenError::CyclicDependencies(
                        dependent.into_iter().collect(),
                    ));
                }
                for (name, text) in replacements {
                    candidate.replace_value(&name, ValueExpr::literal(text));
                }
            }
            output.push(candidate);
        }
        Ok(output)
    }

    fn replace_value(&mut self, name: &str, value: ValueExpr) {
        if let Some(token) = self.tokens.iter_mut().find(|token| token.name() == name) {
            *token = Token::new(name, vec![value]);
        }
    }

    /// Resolve the possible values of a single token without requiring the
    /// whole set to be complete or acyclic, only the token's transitive
    /// closure.
    pub fn resolve_token(&self, name: &str) -> Result<Vec<String>, TokenError> {
        if !self.contains(name) {
            return Err(TokenError::MissingTokens(BTreeSet::from([
                name.to_string()
            ])));
        }
        let mut output = Vec::new();
        for set in self.minimal_subgraph(name).resolve()? {
            if let Some(token) = set.get(name) {
                output.push(token.values()[0].text());
            }
        }
        Ok(output)
    }

    /// Resolve an already-parsed value expression against this set.
    ///
    /// Builds the union of minimal subgraphs for the referenced names,
    /// injects the expression as a synthetic token under a name guaranteed
    /// not to collide, and resolves that set.
    pub fn resolve_expr(&self, expr: &ValueExpr) -> Result<Vec<String>, TokenError> {
        let mut set = TokenSet::new();
        for reference in expr.references() {
            set.extend(self.minimal_subgraph(&reference));
        }
        let mut synthetic = SYNTHETIC_NAME.to_string();
        while set.contains(&synthetic) {
            synthetic = format!("_{}", synthetic);
        }
        set.add(Token::new(synthetic.clone(), vec![expr.clone()]));
        set.resolve_token(&synthetic)
    }

    /// Resolve an arbitrary string against this set, one result per
    /// combination of the referenced tokens' values.
    pub fn resolve_string(&self, text: &str) -> Result<Vec<String>, ParseError> {
        let expr = ValueExpr::parse(text)?;
        Ok(self.resolve_expr(&expr)?)
    }

    /// The single resolved value of `name`: `None` for an empty token.
    ///
    /// Fails with `MissingTokens` when `name` is absent and with
    /// `IteratedToken` when the token still has several values.
    pub fn single_value(&self, name: &str) -> Result<Option<String>, TokenError> {
        let token = self.get(name).ok_or_else(|| {
            TokenError::MissingTokens(BTreeSet::from([name.to_string()]))
        })?;
        match token.values() {
            [] => Ok(None),
            [value] => Ok(Some(value.text())),
            _ => Err(TokenError::IteratedToken(name.to_string())),
        }
    }

    /// The plain name-to-value mapping crossing the boundary to the
    /// template layer, in set order.
    pub fn as_mapping(&self) -> Vec<(String, TokenValue)> {
        self.tokens
            .iter()
            .map(|token| (token.name().to_string(), token.value()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a TokenSet {
    type Item = &'a Token;
    type IntoIter = std::slice::Iter<'a, Token>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}
