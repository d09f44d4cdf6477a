//! Token filter algebra
//!
//! Two composable filters partition a token sequence:
//!
//! - [`FlagTable`] recognises flags by their two-character prefix and, depending
//!   on each flag's [`FlagSpec`], the argument that follows them.
//! - [`PatternSet`] recognises tokens matching any of a set of regular
//!   expressions (substring search).
//!
//! Both drop recognised tokens, or keep only recognised tokens when called with
//! `negate`. Applying a filter with and without `negate` to the same input
//! therefore yields two complementary, order-preserving partitions.

use super::error::Result;
use regex::Regex;

/// Common contract of every token filter
pub trait TokenFilter {
    /// Returns the surviving tokens in their original order
    fn apply(&self, tokens: &[String], negate: bool) -> Vec<String>;
}

/// Keeps everything, or nothing under `negate`
#[derive(Debug, Clone, Copy, Default)]
pub struct PassAll;

impl TokenFilter for PassAll {
    fn apply(&self, tokens: &[String], negate: bool) -> Vec<String> {
        if negate {
            Vec::new()
        } else {
            tokens.to_vec()
        }
    }
}

/// Condition evaluated against a single token
#[derive(Debug, Clone)]
pub enum TokenPredicate {
    Exactly(String),
    Matches(Regex),
}

impl TokenPredicate {
    pub fn is_match(&self, token: &str) -> bool {
        match self {
            TokenPredicate::Exactly(expected) => token == expected,
            TokenPredicate::Matches(regex) => regex.is_match(token),
        }
    }
}

/// Whether a flag swallows the token that follows it
#[derive(Debug, Clone)]
pub enum FlagSpec {
    NeverTakesArgument,
    AlwaysTakesArgument,
    /// The flag consumes its neighbour only when the flag token itself
    /// satisfies the predicate (e.g. a bare `-I` but not `-Ipath`)
    ConditionalOnPreviousToken(TokenPredicate),
}

impl FlagSpec {
    fn consumes_after(&self, previous: &str) -> bool {
        match self {
            FlagSpec::NeverTakesArgument => false,
            FlagSpec::AlwaysTakesArgument => true,
            FlagSpec::ConditionalOnPreviousToken(predicate) => predicate.is_match(previous),
        }
    }
}

#[derive(Debug, Clone)]
struct FlagEntry {
    key: Regex,
    spec: FlagSpec,
}

/// Flags keyed by two-character prefix, compiled once at construction
#[derive(Debug, Clone)]
pub struct FlagTable {
    entries: Vec<FlagEntry>,
}

impl FlagTable {
    pub fn new<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, FlagSpec)>,
    {
        let entries = entries
            .into_iter()
            .map(|(key, spec)| -> Result<FlagEntry> {
                Ok(FlagEntry {
                    key: Regex::new(key)?,
                    spec,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    fn is_flag(&self, token: &str) -> bool {
        let prefix = flag_prefix(token);
        self.entries.iter().any(|entry| entry.key.is_match(prefix))
    }

    fn is_argument(&self, previous: &str) -> bool {
        let prefix = flag_prefix(previous);
        self.entries
            .iter()
            .any(|entry| entry.spec.consumes_after(previous) && entry.key.is_match(prefix))
    }
}

impl TokenFilter for FlagTable {
    fn apply(&self, tokens: &[String], negate: bool) -> Vec<String> {
        tokens
            .iter()
            .enumerate()
            .filter(|(index, token)| {
                // The first token is its own predecessor
                let previous = &tokens[index.saturating_sub(1)];
                let recognised = self.is_flag(token) || self.is_argument(previous);
                recognised == negate
            })
            .map(|(_, token)| token.clone())
            .collect()
    }
}

/// First two characters of a token
fn flag_prefix(token: &str) -> &str {
    match token.char_indices().nth(2) {
        Some((end, _)) => &token[..end],
        None => token,
    }
}

/// Set of regular expressions searched anywhere within a token
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<Regex>,
}

impl PatternSet {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|pattern| Regex::new(pattern.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Patterns matching the given strings literally
    pub fn literals<I, S>(literals: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(literals.into_iter().map(|literal| regex::escape(literal.as_ref())))
    }

    pub fn matches_any(&self, item: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(item))
    }

    pub fn matches_all(&self, item: &str) -> bool {
        self.patterns.iter().all(|pattern| pattern.is_match(item))
    }
}

impl TokenFilter for PatternSet {
    fn apply(&self, tokens: &[String], negate: bool) -> Vec<String> {
        tokens
            .iter()
            .filter(|token| self.matches_any(token) == negate)
            .cloned()
            .collect()
    }
}

/// Applies `first`, then `then` to the survivors.
///
/// Negated, a chain returns exactly the tokens either stage drops.
pub struct Chain<'a> {
    first: &'a dyn TokenFilter,
    then: &'a dyn TokenFilter,
}

impl<'a> Chain<'a> {
    pub fn new(first: &'a dyn TokenFilter, then: &'a dyn TokenFilter) -> Self {
        Self { first, then }
    }
}

impl TokenFilter for Chain<'_> {
    fn apply(&self, tokens: &[String], negate: bool) -> Vec<String> {
        let survivors = self.then.apply(&self.first.apply(tokens, false), false);
        if !negate {
            return survivors;
        }

        let mut survivors = survivors.iter().peekable();
        tokens
            .iter()
            .filter(|token| {
                if survivors.peek() == Some(token) {
                    survivors.next();
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect()
    }
}
