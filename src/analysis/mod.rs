//! Keyword-frequency analysis: normalize, tokenize, resolve aliases, count.
//!
//! # Submodules
//!
//! - [`normalize`]: lower-casing and fixed-set character stripping
//! - [`tokenizer`]: word, stemmed-word and dictionary segmentation strategies
//! - [`aggregator`]: alias-table and stemmed concept counting
//!
//! [`Analyzer`] wires one tokenizer to one matcher. Nothing is shared
//! between calls: each [`Analyzer::analyze`] tokenizes afresh and the alias
//! matcher builds its reverse index inside the call.

pub mod aggregator;
pub mod normalize;
pub mod tokenizer;

pub use aggregator::{AliasTable, FrequencyResult, MatchPolicy};
pub use tokenizer::TokenizerMode;

use aggregator::ConceptMatcher;
use tokenizer::Tokenizer;
use tracing::{info, instrument};

/// A configured tokenizer + matcher pair.
#[derive(Debug)]
pub struct Analyzer {
    tokenizer: Box<dyn Tokenizer>,
    matcher: Box<dyn ConceptMatcher>,
}

impl Analyzer {
    /// Build an analyzer for `mode` and `policy`.
    ///
    /// In dictionary mode the aliases of `table` are registered with the
    /// segmenter so multi-character surface forms are not split apart.
    pub fn new(mode: TokenizerMode, policy: MatchPolicy, table: &AliasTable) -> Self {
        Self {
            tokenizer: mode.build(table.aliases()),
            matcher: policy.build(table, mode),
        }
    }

    /// Count `concepts` in `text`.
    #[instrument(level = "info", skip_all, fields(bytes = text.len(), concepts = concepts.len()))]
    pub fn analyze(&self, text: &str, concepts: &[String]) -> FrequencyResult {
        let tokens = self.tokenizer.tokenize(text);
        let result = self.matcher.count_concepts(tokens, concepts);
        info!(total = result.total(), "Keyword analysis complete");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concepts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_hyphenated_compound_counts_its_alias_part() {
        let table: AliasTable = [("人工智能", vec!["ai"])].into_iter().collect();
        let analyzer = Analyzer::new(TokenizerMode::Words, MatchPolicy::Alias, &table);
        let result = analyzer.analyze(
            "AI is transforming AI research. AI-driven tools grow.",
            &concepts(&["人工智能"]),
        );
        assert_eq!(result.get("人工智能"), Some(3));
    }

    #[test]
    fn test_literal_matching_without_aliases() {
        let analyzer = Analyzer::new(TokenizerMode::Words, MatchPolicy::Alias, &AliasTable::new());
        let result = analyzer.analyze("platform platform network", &concepts(&["platform", "network"]));
        assert_eq!(result.get("platform"), Some(2));
        assert_eq!(result.get("network"), Some(1));
    }

    #[test]
    fn test_empty_text_gives_all_zero_counts() {
        let table: AliasTable = [("人工智能", vec!["ai"])].into_iter().collect();
        for mode in [TokenizerMode::Words, TokenizerMode::Stemmed, TokenizerMode::Dictionary] {
            let analyzer = Analyzer::new(mode, MatchPolicy::Alias, &table);
            let result = analyzer.analyze("", &concepts(&["人工智能", "资本"]));
            assert_eq!(result.len(), 2);
            assert_eq!(result.total(), 0);
        }
    }

    #[test]
    fn test_uppercase_alias_matches_lowercased_token() {
        let table: AliasTable = [("人工智能", vec!["AI"])].into_iter().collect();
        let analyzer = Analyzer::new(TokenizerMode::Words, MatchPolicy::Alias, &table);
        let result = analyzer.analyze("New AI chips", &concepts(&["人工智能"]));
        assert_eq!(result.get("人工智能"), Some(1));
    }

    #[test]
    fn test_dictionary_mode_counts_chinese_aliases() {
        let table: AliasTable = [
            ("人工智能", vec!["人工智能", "大模型"]),
            ("数字化", vec!["数字基础设施"]),
        ]
        .into_iter()
        .collect();
        let analyzer = Analyzer::new(TokenizerMode::Dictionary, MatchPolicy::Alias, &table);
        let result = analyzer.analyze(
            "大模型公司加快建设数字基础设施\n人工智能，大模型",
            &concepts(&["人工智能", "数字化"]),
        );
        assert_eq!(result.get("人工智能"), Some(3));
        assert_eq!(result.get("数字化"), Some(1));
    }

    #[test]
    fn test_stemmed_mode_with_stemmed_policy_stems_once() {
        let wanted = concepts(&["agree", "platform"]);
        let text = "they agree agreed platforms";
        for mode in [TokenizerMode::Stemmed, TokenizerMode::Words] {
            let analyzer = Analyzer::new(mode, MatchPolicy::Stemmed, &AliasTable::new());
            let result = analyzer.analyze(text, &wanted);
            assert_eq!(result.get("agree"), Some(2), "mode {mode}");
            assert_eq!(result.get("platform"), Some(1), "mode {mode}");
        }
    }

    #[test]
    fn test_default_keywords_without_synonyms_count_zero() {
        let table: AliasTable = [("人工智能", vec!["人工智能", "ai"])].into_iter().collect();
        let analyzer = Analyzer::new(TokenizerMode::Words, MatchPolicy::Alias, &table);
        let result = analyzer.analyze("资本 创新 ai", &concepts(&["人工智能", "资本", "创新"]));
        assert_eq!(result.get("人工智能"), Some(1));
        assert_eq!(result.get("资本"), Some(0));
        assert_eq!(result.get("创新"), Some(0));
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let table: AliasTable = [("SaaS", vec!["saas", "云服务"])].into_iter().collect();
        let analyzer = Analyzer::new(TokenizerMode::Dictionary, MatchPolicy::Alias, &table);
        let wanted = concepts(&["SaaS"]);
        let text = "SaaS 云服务 saas";
        let runs: Vec<FrequencyResult> = (0..3).map(|_| analyzer.analyze(text, &wanted)).collect();
        assert!(runs.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(runs[0].get("SaaS"), Some(3));
    }
}
