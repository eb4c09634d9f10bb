//! Concept counting over a token sequence.
//!
//! Two matching policies are available behind [`ConceptMatcher`]:
//!
//! - [`AliasMatcher`] resolves each token through a per-call
//!   [`ReverseIndex`] built from an [`AliasTable`]. Matching is exact-string,
//!   token against lower-cased alias; concept labels are never stemmed.
//! - [`StemmedMatcher`] ignores aliases and counts a token for every
//!   requested keyword sharing its Snowball stem.
//!
//! The two policies give different counts for the same input and are kept
//! as separate strategies.

use super::tokenizer::{TokenizerMode, Tokens};
use indexmap::IndexMap;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, instrument};

/// Ordered concept -> surface forms table.
///
/// Registration order matters: when two concepts share a surface form, the
/// reverse index keeps the concept registered last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable(IndexMap<String, Vec<String>>);

/// A surface form claimed by more than one concept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasOverlap {
    /// The lower-cased surface form.
    pub alias: String,
    /// Concept that registered the form first.
    pub first: String,
    /// Concept that registered it later (and wins in the reverse index).
    pub second: String,
}

impl fmt::Display for AliasOverlap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is listed under both '{}' and '{}'", self.alias, self.first, self.second)
    }
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `aliases` to `concept`, registering the concept if needed.
    pub fn insert<I, S>(&mut self, concept: impl Into<String>, aliases: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0
            .entry(concept.into())
            .or_default()
            .extend(aliases.into_iter().map(Into::into));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains_concept(&self, concept: &str) -> bool {
        self.0.contains_key(concept)
    }

    /// Iterate `(concept, alias)` pairs in registration order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .flat_map(|(concept, aliases)| aliases.iter().map(move |a| (concept.as_str(), a.as_str())))
    }

    /// Every alias, in registration order.
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.pairs().map(|(_, alias)| alias)
    }

    /// Surface forms claimed by two different concepts.
    ///
    /// Repeats within a single concept's list are not overlaps.
    pub fn overlaps(&self) -> Vec<AliasOverlap> {
        let mut owner: HashMap<String, &str> = HashMap::new();
        let mut overlaps = Vec::new();
        for (concept, alias) in self.pairs() {
            let alias = alias.to_lowercase();
            match owner.get(&alias) {
                Some(&first) if first != concept => {
                    overlaps.push(AliasOverlap {
                        alias: alias.clone(),
                        first: first.to_string(),
                        second: concept.to_string(),
                    });
                    owner.insert(alias, concept);
                }
                Some(_) => {}
                None => {
                    owner.insert(alias, concept);
                }
            }
        }
        overlaps
    }
}

impl<K, V, S> FromIterator<(K, V)> for AliasTable
where
    K: Into<String>,
    V: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut table = AliasTable::new();
        for (concept, aliases) in iter {
            table.insert(concept, aliases);
        }
        table
    }
}

/// Lower-cased surface form -> concept lookup, built per analysis call.
#[derive(Debug, Default)]
pub struct ReverseIndex {
    lookup: HashMap<String, String>,
}

impl ReverseIndex {
    /// Build the index for one call.
    ///
    /// Table pairs are registered in order and later registrations overwrite
    /// earlier ones. Only an empty table falls back to the requested
    /// concepts themselves, each matching its own lower-cased label; with a
    /// non-empty table a label that is not listed as an alias never matches.
    pub fn build(table: &AliasTable, concepts: &[String]) -> Self {
        let lookup: HashMap<String, String> = if table.is_empty() {
            concepts
                .iter()
                .map(|concept| (concept.to_lowercase(), concept.clone()))
                .collect()
        } else {
            table
                .pairs()
                .map(|(concept, alias)| (alias.to_lowercase(), concept.to_string()))
                .collect()
        };
        Self { lookup }
    }

    pub fn resolve(&self, token: &str) -> Option<&str> {
        self.lookup.get(token).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

/// Concept -> occurrence count, in request order.
///
/// Every requested concept is present, with zero when it never matched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyResult(IndexMap<String, u64>);

impl FrequencyResult {
    /// A result with every concept at zero.
    pub fn zeroed(concepts: &[String]) -> Self {
        Self(concepts.iter().map(|c| (c.clone(), 0)).collect())
    }

    fn bump(&mut self, concept: &str) -> bool {
        match self.0.get_mut(concept) {
            Some(count) => {
                *count += 1;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, concept: &str) -> Option<u64> {
        self.0.get(concept).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn concepts(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// Largest single count, zero for an empty result.
    pub fn max_count(&self) -> u64 {
        self.0.values().copied().max().unwrap_or(0)
    }
}

impl<K: Into<String>> FromIterator<(K, u64)> for FrequencyResult {
    fn from_iter<I: IntoIterator<Item = (K, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Matching policy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MatchPolicy {
    /// Exact alias-table matching.
    #[default]
    Alias,
    /// Stemmed keyword matching, no alias table.
    Stemmed,
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MatchPolicy::Alias => "alias",
            MatchPolicy::Stemmed => "stemmed",
        })
    }
}

/// A concept counting strategy.
pub trait ConceptMatcher: fmt::Debug {
    /// Count `concepts` over `tokens`. Never fails; the result always holds
    /// exactly the requested concepts.
    fn count_concepts(&self, tokens: Tokens, concepts: &[String]) -> FrequencyResult;
}

/// Exact alias-table matching.
#[derive(Debug, Clone, Default)]
pub struct AliasMatcher {
    table: AliasTable,
}

impl AliasMatcher {
    pub fn new(table: AliasTable) -> Self {
        Self { table }
    }
}

impl ConceptMatcher for AliasMatcher {
    #[instrument(level = "debug", skip_all, fields(concepts = concepts.len()))]
    fn count_concepts(&self, tokens: Tokens, concepts: &[String]) -> FrequencyResult {
        count_concepts(tokens, concepts, &self.table)
    }
}

/// Count `concepts` over `tokens` through a fresh reverse index of `table`.
pub fn count_concepts<I, S>(tokens: I, concepts: &[String], table: &AliasTable) -> FrequencyResult
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result = FrequencyResult::zeroed(concepts);
    if concepts.is_empty() {
        return result;
    }

    let index = ReverseIndex::build(table, concepts);
    let mut seen = 0usize;
    let mut matched = 0usize;
    for token in tokens {
        seen += 1;
        if let Some(concept) = index.resolve(token.as_ref()) {
            if result.bump(concept) {
                matched += 1;
            }
        }
    }
    debug!(tokens = seen, matched, index_size = index.len(), "Counted concepts");
    result
}

/// Stemmed keyword matching.
///
/// Keywords are always stemmed. Tokens are stemmed too unless they already
/// come out of the `stemmed` tokenizer: Porter2 is not idempotent
/// (`agree` -> `agre` -> `agr`), so every token must be reduced exactly once.
pub struct StemmedMatcher {
    stemmer: Stemmer,
    stem_tokens: bool,
}

impl StemmedMatcher {
    /// Matcher for unstemmed tokens (`words` and `dictionary` modes).
    pub fn new() -> Self {
        Self {
            stemmer: Stemmer::create(Algorithm::English),
            stem_tokens: true,
        }
    }

    /// Matcher for tokens the tokenizer has already stemmed.
    pub fn for_stemmed_tokens() -> Self {
        Self {
            stem_tokens: false,
            ..Self::new()
        }
    }
}

impl Default for StemmedMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StemmedMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StemmedMatcher")
            .field("stem_tokens", &self.stem_tokens)
            .finish_non_exhaustive()
    }
}

impl ConceptMatcher for StemmedMatcher {
    #[instrument(level = "debug", skip_all, fields(concepts = concepts.len()))]
    fn count_concepts(&self, tokens: Tokens, concepts: &[String]) -> FrequencyResult {
        let mut result = FrequencyResult::zeroed(concepts);
        if concepts.is_empty() {
            return result;
        }

        let mut by_stem: HashMap<String, Vec<&str>> = HashMap::new();
        for concept in concepts {
            let stem = self.stemmer.stem(&concept.to_lowercase()).into_owned();
            let entry = by_stem.entry(stem).or_default();
            if !entry.contains(&concept.as_str()) {
                entry.push(concept);
            }
        }

        for token in tokens {
            let stem = if self.stem_tokens {
                self.stemmer.stem(&token)
            } else {
                Cow::Borrowed(token.as_str())
            };
            if let Some(keywords) = by_stem.get(&*stem) {
                for keyword in keywords {
                    result.bump(keyword);
                }
            }
        }
        result
    }
}

impl MatchPolicy {
    /// Build the matcher for this policy, paired with tokens from `mode`.
    /// The alias table is only used by [`MatchPolicy::Alias`].
    pub fn build(self, table: &AliasTable, mode: TokenizerMode) -> Box<dyn ConceptMatcher> {
        match (self, mode) {
            (MatchPolicy::Alias, _) => Box::new(AliasMatcher::new(table.clone())),
            (MatchPolicy::Stemmed, TokenizerMode::Stemmed) => {
                Box::new(StemmedMatcher::for_stemmed_tokens())
            }
            (MatchPolicy::Stemmed, _) => Box::new(StemmedMatcher::new()),
        }
    }
}
