//! Pluggable tokenization strategies.
//!
//! Every strategy runs the same [`normalize`] pass first and then segments
//! the normalized text its own way:
//!
//! | Mode | Strategy | Segmentation | Stop words | Stemming |
//! |------|----------|--------------|------------|----------|
//! | `words` | [`WordTokenizer`] | whitespace | kept | no |
//! | `stemmed` | [`WordTokenizer`] | whitespace | removed | Snowball English |
//! | `dictionary` | [`DictionaryTokenizer`] | jieba (HMM on) | kept | no |
//!
//! The mode is chosen at runtime through [`TokenizerMode::build`], so both
//! behaviours stay available side by side.

use super::normalize::normalize;
use jieba_rs::Jieba;
use once_cell::sync::Lazy;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, instrument};

/// A single-pass sequence of normalized tokens.
///
/// Produced once per [`Tokenizer::tokenize`] call and consumed once by a
/// matcher. Callers that need the tokens twice must tokenize again.
#[derive(Debug)]
pub struct Tokens {
    inner: std::vec::IntoIter<String>,
}

impl Iterator for Tokens {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Tokens {}

impl From<Vec<String>> for Tokens {
    fn from(tokens: Vec<String>) -> Self {
        Self {
            inner: tokens.into_iter(),
        }
    }
}

impl<'a> FromIterator<&'a str> for Tokens {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(str::to_string).collect::<Vec<_>>().into()
    }
}

/// A text segmentation strategy.
pub trait Tokenizer: fmt::Debug {
    /// Normalize `text` and split it into tokens.
    ///
    /// Empty or whitespace-only input yields an empty sequence.
    fn tokenize(&self, text: &str) -> Tokens;
}

/// Selector for the tokenization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TokenizerMode {
    /// Whitespace boundaries only.
    Words,
    /// Whitespace boundaries, stop-word removal, Snowball stemming.
    Stemmed,
    /// Dictionary-based statistical segmentation for Chinese text.
    #[default]
    Dictionary,
}

impl TokenizerMode {
    /// Build the strategy for this mode.
    ///
    /// `dictionary_words` are registered with the segmenter in
    /// `dictionary` mode so multi-character aliases survive segmentation
    /// intact; the word modes ignore them.
    #[instrument(level = "debug", skip(dictionary_words))]
    pub fn build<'a, I>(self, dictionary_words: I) -> Box<dyn Tokenizer>
    where
        I: IntoIterator<Item = &'a str>,
    {
        match self {
            TokenizerMode::Words => Box::new(WordTokenizer::plain()),
            TokenizerMode::Stemmed => Box::new(WordTokenizer::stemmed()),
            TokenizerMode::Dictionary => {
                let mut tokenizer = DictionaryTokenizer::new();
                let added = tokenizer.add_words(dictionary_words);
                debug!(added, "Registered aliases with the segmenter");
                Box::new(tokenizer)
            }
        }
    }
}

impl fmt::Display for TokenizerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenizerMode::Words => "words",
            TokenizerMode::Stemmed => "stemmed",
            TokenizerMode::Dictionary => "dictionary",
        };
        f.write_str(name)
    }
}

/// English stop words dropped by the `stemmed` mode.
pub(crate) fn stop_words() -> &'static HashSet<&'static str> {
    static SET: Lazy<HashSet<&'static str>> = Lazy::new(|| {
        [
            "a", "an", "the", "and", "or", "but", "if", "then", "else", "of", "to", "in", "on",
            "for", "with", "as", "by", "at", "from", "into", "over", "under", "about", "after",
            "before", "between", "during", "without", "within", "than", "is", "are", "was",
            "were", "be", "been", "being", "am", "do", "does", "did", "has", "have", "had",
            "that", "this", "these", "those", "it", "its", "he", "she", "they", "them", "we",
            "you", "i", "me", "my", "our", "your", "their", "his", "her", "not", "no", "so",
            "too", "very", "can", "will", "just", "more", "most", "some", "any", "such", "own",
            "same", "other", "only", "both", "each", "few", "all", "how", "what", "which",
            "who", "whom", "why", "when", "where", "there", "here", "up", "down", "out", "off",
            "again", "further", "once", "should", "would", "could",
        ]
        .into_iter()
        .collect()
    });
    &SET
}

/// Tokenizer for space-delimited languages.
pub struct WordTokenizer {
    stemmer: Option<Stemmer>,
    drop_stop_words: bool,
}

impl WordTokenizer {
    /// Split on whitespace and keep every token as-is.
    pub fn plain() -> Self {
        Self {
            stemmer: None,
            drop_stop_words: false,
        }
    }

    /// Split on whitespace, drop English stop words, stem the rest.
    pub fn stemmed() -> Self {
        Self {
            stemmer: Some(Stemmer::create(Algorithm::English)),
            drop_stop_words: true,
        }
    }
}

impl fmt::Debug for WordTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordTokenizer")
            .field("stemming", &self.stemmer.is_some())
            .field("drop_stop_words", &self.drop_stop_words)
            .finish()
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Tokens {
        let normalized = normalize(text);
        let stop = stop_words();
        normalized
            .split(' ')
            .filter(|w| !w.is_empty())
            .filter(|w| !(self.drop_stop_words && stop.contains(w)))
            .map(|w| match &self.stemmer {
                Some(stemmer) => stemmer.stem(w).into_owned(),
                None => w.to_string(),
            })
            .collect::<Vec<_>>()
            .into()
    }
}

/// Dictionary-based segmentation backed by jieba.
///
/// Each whitespace-delimited run is segmented separately, so Latin words
/// separated by spaces never merge into one token.
pub struct DictionaryTokenizer {
    jieba: Jieba,
}

impl DictionaryTokenizer {
    /// Load the bundled jieba dictionary.
    pub fn new() -> Self {
        Self {
            jieba: Jieba::new(),
        }
    }

    /// Register extra words with the segmenter and return how many were added.
    ///
    /// Only words containing non-ASCII characters are registered; ASCII
    /// entries would let the segmenter split Latin compounds such as
    /// `saasplatform`.
    pub fn add_words<'a, I>(&mut self, words: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut added = 0;
        for word in words {
            let word = word.trim().to_lowercase();
            if word.is_empty() || word.is_ascii() {
                continue;
            }
            self.jieba.add_word(&word, None, None);
            added += 1;
        }
        added
    }
}

impl Default for DictionaryTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DictionaryTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DictionaryTokenizer").finish_non_exhaustive()
    }
}

impl Tokenizer for DictionaryTokenizer {
    fn tokenize(&self, text: &str) -> Tokens {
        let normalized = normalize(text);
        normalized
            .split(' ')
            .filter(|run| !run.is_empty())
            .flat_map(|run| self.jieba.cut(run, true))
            .filter(|w| !w.trim().is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_tokenizer_splits_on_whitespace() {
        let tokens: Vec<String> = WordTokenizer::plain()
            .tokenize("AI is transforming AI research. AI-driven tools grow.")
            .collect();
        assert_eq!(
            tokens,
            vec!["ai", "is", "transforming", "ai", "research", "ai", "driven", "tools", "grow"]
        );
    }

    #[test]
    fn test_empty_input_yields_no_tokens() {
        assert_eq!(WordTokenizer::plain().tokenize("").count(), 0);
        assert_eq!(WordTokenizer::stemmed().tokenize("   \n").count(), 0);
        assert_eq!(DictionaryTokenizer::new().tokenize("\u{3000}\t").count(), 0);
    }

    #[test]
    fn test_stemmed_tokenizer_drops_stop_words_and_stems() {
        let tokens: Vec<String> = WordTokenizer::stemmed()
            .tokenize("The platforms are running on the network")
            .collect();
        assert_eq!(tokens, vec!["platform", "run", "network"]);
    }

    #[test]
    fn test_dictionary_tokenizer_segments_chinese() {
        let tokens: Vec<String> = DictionaryTokenizer::new()
            .tokenize("我们中出了一个叛徒")
            .collect();
        assert!(tokens.contains(&"我们".to_string()));
        assert!(tokens.contains(&"叛徒".to_string()));
        assert_eq!(tokens.concat(), "我们中出了一个叛徒");
    }

    #[test]
    fn test_dictionary_tokenizer_keeps_spaced_latin_words_apart() {
        let tokens: Vec<String> = DictionaryTokenizer::new().tokenize("SaaS platform").collect();
        assert_eq!(tokens, vec!["saas", "platform"]);
    }

    #[test]
    fn test_registered_words_survive_segmentation() {
        let mut tokenizer = DictionaryTokenizer::new();
        assert_eq!(tokenizer.add_words(["数字基础设施", "ai", " "]), 1);
        let tokens: Vec<String> = tokenizer.tokenize("加快建设数字基础设施").collect();
        assert!(tokens.contains(&"数字基础设施".to_string()));
    }

    #[test]
    fn test_mode_selector_builds_matching_strategy() {
        let words = TokenizerMode::Words.build([]);
        assert!(format!("{words:?}").contains("WordTokenizer"));
        let dict = TokenizerMode::Dictionary.build(["大模型"]);
        assert!(format!("{dict:?}").contains("DictionaryTokenizer"));
        assert_eq!(TokenizerMode::default(), TokenizerMode::Dictionary);
        assert_eq!(TokenizerMode::Stemmed.to_string(), "stemmed");
    }

    #[test]
    fn test_tokens_are_single_pass() {
        let mut tokens = Tokens::from(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens.by_ref().count(), 2);
        assert_eq!(tokens.next(), None);
    }
}
