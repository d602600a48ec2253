//! Hyperparameters for chemical language models.
//!
//! # JSON shape
//!
//! Every field is optional; omitted fields keep their defaults.
//!
//! ```json
//! {
//!   "max_ngram": 2,
//!   "vector_algo": "bow",
//!   "max_vocab": 35000
//! }
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VectorizerError};

/// Encoding strategy used to turn vocabulary-filtered documents into vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorAlgo {
    /// Term counts over the vocabulary.
    Bow,
    /// Topic distributions from a latent Dirichlet allocation model.
    Lda,
    /// Paragraph vectors inferred per document.
    Embedding,
}

impl VectorAlgo {
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorAlgo::Bow => "bow",
            VectorAlgo::Lda => "lda",
            VectorAlgo::Embedding => "embedding",
        }
    }
}

impl fmt::Display for VectorAlgo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VectorAlgo {
    type Err = VectorizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bow" => Ok(VectorAlgo::Bow),
            "lda" => Ok(VectorAlgo::Lda),
            "embedding" => Ok(VectorAlgo::Embedding),
            other => Err(VectorizerError::Configuration(format!(
                "Unsupported algorithm: {}",
                other
            ))),
        }
    }
}

/// Hyperparameters for all chemical language models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Hyperparameters {
    /// Longest n-gram (in terms) considered as a feature.
    pub max_ngram: usize,
    pub vector_algo: VectorAlgo,
    /// Embedding output size.
    pub vec_dims: usize,
    /// Embedding context window (terms on each side).
    pub vec_window: usize,
    /// Upper bound on retained vocabulary entries.
    pub max_vocab: usize,
    /// Embedding passes over the corpus, also used per inferred document.
    pub train_epochs: usize,
    /// Initial embedding learning rate.
    pub learning_rate: f64,
    /// Topic count for `lda`.
    pub topics: usize,
    /// Seed for every random draw made while fitting or inferring.
    pub seed: u64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            max_ngram: 2,
            vector_algo: VectorAlgo::Embedding,
            vec_dims: 460,
            vec_window: 4,
            max_vocab: 35_000,
            train_epochs: 110,
            learning_rate: 0.05,
            topics: 16,
            seed: 18,
        }
    }
}

impl Hyperparameters {
    /// Default hyperparameters with the given strategy.
    pub fn with_algo(vector_algo: VectorAlgo) -> Self {
        Self {
            vector_algo,
            ..Self::default()
        }
    }

    /// Parse a (possibly partial) JSON object on top of the defaults and validate it.
    pub fn from_json(json: &str) -> Result<Self> {
        let hyperparams: Hyperparameters = serde_json::from_str(json)?;
        hyperparams.validate()?;
        Ok(hyperparams)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Check every range constraint, reporting the first violation.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("max_ngram", self.max_ngram),
            ("vec_dims", self.vec_dims),
            ("vec_window", self.vec_window),
            ("max_vocab", self.max_vocab),
            ("train_epochs", self.train_epochs),
            ("topics", self.topics),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(VectorizerError::Configuration(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(VectorizerError::Configuration(format!(
                "learning_rate must be a positive finite number, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }

    /// Stable key naming a model fitted with these hyperparameters.
    pub fn cache_key(&self) -> String {
        format!(
            "chemlang-{}-n{}-v{}-d{}-w{}-e{}-a{}-t{}-s{}",
            self.vector_algo,
            self.max_ngram,
            self.max_vocab,
            self.vec_dims,
            self.vec_window,
            self.train_epochs,
            self.learning_rate,
            self.topics,
            self.seed
        )
    }

    /// Width of the vectors produced by `transform` for a vocabulary of `vocab_len` entries.
    pub fn output_dim(&self, vocab_len: usize) -> usize {
        match self.vector_algo {
            VectorAlgo::Bow => vocab_len,
            VectorAlgo::Lda => self.topics,
            VectorAlgo::Embedding => self.vec_dims,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let hp = Hyperparameters::default();
        assert!(hp.validate().is_ok());
        assert_eq!(hp.vector_algo, VectorAlgo::Embedding);
        assert_eq!(hp.max_ngram, 2);
        assert_eq!(hp.topics, 16);
    }

    #[test]
    fn test_parse_algo() {
        assert_eq!("bow".parse::<VectorAlgo>().unwrap(), VectorAlgo::Bow);
        assert_eq!("lda".parse::<VectorAlgo>().unwrap(), VectorAlgo::Lda);
        assert_eq!(
            "embedding".parse::<VectorAlgo>().unwrap(),
            VectorAlgo::Embedding
        );
        let err = "doc2vec".parse::<VectorAlgo>().unwrap_err();
        assert!(matches!(err, VectorizerError::Configuration(_)));
        assert!(err.to_string().contains("Unsupported algorithm: doc2vec"));
    }

    #[test]
    fn test_from_json_partial() {
        let hp = Hyperparameters::from_json(r#"{"vector_algo": "lda", "topics": 4}"#).unwrap();
        assert_eq!(hp.vector_algo, VectorAlgo::Lda);
        assert_eq!(hp.topics, 4);
        assert_eq!(hp.max_vocab, 35_000);
    }

    #[test]
    fn test_from_json_rejects_unknown_algo() {
        let result = Hyperparameters::from_json(r#"{"vector_algo": "word2vec"}"#);
        assert!(matches!(result, Err(VectorizerError::Configuration(_))));
    }

    #[test]
    fn test_from_json_rejects_unknown_field() {
        let result = Hyperparameters::from_json(r#"{"alpha": 0.1}"#);
        assert!(matches!(result, Err(VectorizerError::Configuration(_))));
    }

    #[test]
    fn test_validate_ranges() {
        let hp = Hyperparameters {
            max_ngram: 0,
            ..Hyperparameters::default()
        };
        assert!(hp.validate().unwrap_err().to_string().contains("max_ngram"));

        let hp = Hyperparameters {
            learning_rate: 0.0,
            ..Hyperparameters::default()
        };
        assert!(hp.validate().is_err());

        let hp = Hyperparameters {
            learning_rate: f64::NAN,
            ..Hyperparameters::default()
        };
        assert!(hp.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip_and_cache_key() {
        let hp = Hyperparameters::with_algo(VectorAlgo::Bow);
        let json = hp.to_json().unwrap();
        assert!(json.contains("\"vector_algo\":\"bow\""));
        assert_eq!(Hyperparameters::from_json(&json).unwrap(), hp);

        let other = Hyperparameters {
            seed: 7,
            ..hp.clone()
        };
        assert_ne!(hp.cache_key(), other.cache_key());
        assert_eq!(hp.cache_key(), hp.clone().cache_key());
    }

    #[test]
    fn test_output_dim() {
        let mut hp = Hyperparameters::with_algo(VectorAlgo::Bow);
        assert_eq!(hp.output_dim(12), 12);
        hp.vector_algo = VectorAlgo::Lda;
        assert_eq!(hp.output_dim(12), 16);
        hp.vector_algo = VectorAlgo::Embedding;
        assert_eq!(hp.output_dim(12), 460);
    }
}
