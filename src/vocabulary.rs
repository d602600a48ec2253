//! The ranked n-gram vocabulary shared by every encoder.

use ahash::AHashMap;
use compact_str::CompactString;

/// Bounded, ranked set of n-gram features.
///
/// Ids follow rank order (0 is the most label-informative n-gram) and are
/// fixed once the vocabulary is built.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    /// Reverse mapping: id to n-gram
    id_to_token: Vec<CompactString>,
    /// Mutual-information score, indexed by id
    scores: Vec<f64>,
    /// Maps n-gram strings to ids
    token_to_id: AHashMap<CompactString, u32>,
}

impl Vocabulary {
    /// Build from `(n-gram, score)` pairs already in rank order.
    ///
    /// Duplicate n-grams keep their first (highest ranked) position.
    pub fn from_ranked<I>(ranked: I) -> Self
    where
        I: IntoIterator<Item = (CompactString, f64)>,
    {
        let mut vocab = Self::default();
        for (token, score) in ranked {
            if vocab.token_to_id.contains_key(&token) {
                continue;
            }
            let id = vocab.id_to_token.len() as u32;
            vocab.token_to_id.insert(token.clone(), id);
            vocab.id_to_token.push(token);
            vocab.scores.push(score);
        }
        vocab
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.id_to_token.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.id_to_token.is_empty()
    }

    #[inline]
    pub fn get(&self, token: &str) -> Option<u32> {
        self.token_to_id.get(token).copied()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.token_to_id.contains_key(token)
    }

    /// Get the n-gram for an id.
    pub fn id_to_token(&self, id: u32) -> Option<&str> {
        self.id_to_token.get(id as usize).map(|t| t.as_str())
    }

    pub fn score(&self, id: u32) -> Option<f64> {
        self.scores.get(id as usize).copied()
    }

    /// `(n-gram, id, score)` in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32, f64)> + '_ {
        self.id_to_token
            .iter()
            .zip(self.scores.iter())
            .enumerate()
            .map(|(id, (token, &score))| (token.as_str(), id as u32, score))
    }

    /// Return the vocabulary as `(n-gram, id)` tuples in id order.
    pub fn entries(&self) -> Vec<(String, u32)> {
        self.id_to_token
            .iter()
            .enumerate()
            .map(|(id, token)| (token.to_string(), id as u32))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vocabulary {
        Vocabulary::from_ranked([
            (CompactString::from("Cl"), 0.9),
            (CompactString::from("C O"), 0.4),
            (CompactString::from("Cl"), 0.2),
            (CompactString::from("N"), 0.1),
        ])
    }

    #[test]
    fn test_from_ranked_skips_duplicates() {
        let vocab = sample();
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.get("Cl"), Some(0));
        assert_eq!(vocab.score(0), Some(0.9));
        assert_eq!(vocab.get("N"), Some(2));
    }

    #[test]
    fn test_entries() {
        let vocab = sample();
        assert_eq!(
            vocab.entries(),
            vec![
                ("Cl".to_string(), 0),
                ("C O".to_string(), 1),
                ("N".to_string(), 2)
            ]
        );
    }

    #[test]
    fn test_id_to_token() {
        let vocab = sample();
        assert_eq!(vocab.id_to_token(1), Some("C O"));
        assert!(vocab.id_to_token(999).is_none());
    }

    #[test]
    fn test_lookup() {
        let vocab = sample();
        assert_eq!(vocab.get("N"), Some(2));
        assert!(vocab.get("Br").is_none());
        assert!(!vocab.contains("Br"));
    }

    #[test]
    fn test_iter_in_id_order() {
        let vocab = sample();
        let ids: Vec<u32> = vocab.iter().map(|(_, id, _)| id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(Vocabulary::default().is_empty());
    }
}
