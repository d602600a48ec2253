//! Term extraction and n-gram expansion on top of the tokenizer.

use compact_str::CompactString;
use fancy_regex::Regex;

use crate::constants::{NGRAM_SEPARATOR, TERM_PATTERN};
use crate::error::{Result, VectorizerError};
use crate::tokenizer::tokenize_to_string;

/// Turns a SMILES string into the n-gram features seen by the vocabulary.
///
/// The same analyzer is bound into a fitted model so that transform-time
/// feature extraction matches fit-time extraction exactly.
#[derive(Debug, Clone)]
pub struct Analyzer {
    max_ngram: usize,
    pattern: Regex,
}

impl Analyzer {
    pub fn new(max_ngram: usize) -> Result<Self> {
        if max_ngram == 0 {
            return Err(VectorizerError::Configuration(
                "max_ngram must be at least 1".to_string(),
            ));
        }
        let pattern = Regex::new(TERM_PATTERN)
            .map_err(|e| VectorizerError::Configuration(format!("Invalid term pattern: {}", e)))?;
        Ok(Self { max_ngram, pattern })
    }

    #[inline]
    pub fn max_ngram(&self) -> usize {
        self.max_ngram
    }

    /// Terms of the tokenized sentence, in order.
    pub fn terms(&self, smiles: &str) -> Vec<CompactString> {
        let sentence = tokenize_to_string(smiles);
        self.pattern
            .find_iter(&sentence)
            .flatten()
            .map(|m| CompactString::from(m.as_str()))
            .collect()
    }

    /// All n-grams for n = 1..=max_ngram: every unigram first, then every bigram, etc.
    pub fn analyze(&self, smiles: &str) -> Vec<CompactString> {
        let terms = self.terms(smiles);
        let n_terms = terms.len();
        if self.max_ngram == 1 || n_terms < 2 {
            return terms;
        }

        let max_n = self.max_ngram.min(n_terms);
        let mut ngrams = Vec::with_capacity(n_terms * max_n);
        ngrams.extend(terms.iter().cloned());
        for n in 2..=max_n {
            for window in terms.windows(n) {
                let mut gram = window[0].clone();
                for term in &window[1..] {
                    gram.push(NGRAM_SEPARATOR);
                    gram.push_str(term);
                }
                ngrams.push(gram);
            }
        }
        ngrams
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grams(items: &[&str]) -> Vec<CompactString> {
        items.iter().map(|s| CompactString::from(*s)).collect()
    }

    #[test]
    fn test_analyze_unigrams() {
        let analyzer = Analyzer::new(1).unwrap();
        assert_eq!(analyzer.analyze("CCl"), grams(&["C", "Cl"]));
    }

    #[test]
    fn test_analyze_bigrams_follow_unigrams() {
        let analyzer = Analyzer::new(2).unwrap();
        assert_eq!(
            analyzer.analyze("CCO"),
            grams(&["C", "C", "O", "C C", "C O"])
        );
    }

    #[test]
    fn test_analyze_max_ngram_longer_than_input() {
        let analyzer = Analyzer::new(5).unwrap();
        assert_eq!(analyzer.analyze("CO"), grams(&["C", "O", "C O"]));
        assert_eq!(analyzer.analyze("O"), grams(&["O"]));
        assert!(analyzer.analyze("").is_empty());
    }

    #[test]
    fn test_analyze_keeps_bracket_groups() {
        let analyzer = Analyzer::new(2).unwrap();
        assert_eq!(
            analyzer.analyze("[NH4+]Cl"),
            grams(&["[NH4+]", "Cl", "[NH4+] Cl"])
        );
    }

    #[test]
    fn test_backslash_is_not_a_term() {
        let analyzer = Analyzer::new(1).unwrap();
        assert_eq!(
            analyzer.analyze("F/C=C\\F"),
            grams(&["F", "/", "C", "=", "C", "F"])
        );
    }

    #[test]
    fn test_zero_ngram_rejected() {
        assert!(matches!(
            Analyzer::new(0),
            Err(VectorizerError::Configuration(_))
        ));
    }
}
