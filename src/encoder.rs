//! The shared fit/transform contract of the encoding strategies.

use ndarray::Array2;

use crate::bow::CountEncoder;
use crate::config::{Hyperparameters, VectorAlgo};
use crate::document::Document;
use crate::embedding::EmbeddingEncoder;
use crate::error::Result;
use crate::topic::TopicEncoder;
use crate::vocabulary::Vocabulary;

/// An encoding strategy turning vocabulary-filtered documents into vectors.
///
/// # Contract
///
/// - `fit` learns from the unlabeled corpus, already encoded against the vocabulary.
/// - `transform` returns a `[documents.len(), dim()]` matrix. It is pure:
///   the same input always yields bit-identical output.
/// - Unknown n-grams never reach an encoder; an empty document is valid input.
pub trait Encoder: Send + Sync {
    fn fit(
        documents: &[Document],
        vocabulary: &Vocabulary,
        hyperparams: &Hyperparameters,
    ) -> Result<Self>
    where
        Self: Sized;

    /// Width of every output row.
    fn dim(&self) -> usize;

    fn transform(&self, documents: &[Document]) -> Array2<f64>;
}

/// Learned state of whichever strategy the hyperparameters selected.
#[derive(Debug, Clone)]
pub enum FittedEncoder {
    Count(CountEncoder),
    Topic(TopicEncoder),
    Embedding(EmbeddingEncoder),
}

impl FittedEncoder {
    /// Fit the strategy named by `hyperparams.vector_algo`.
    pub fn fit(
        documents: &[Document],
        vocabulary: &Vocabulary,
        hyperparams: &Hyperparameters,
    ) -> Result<Self> {
        log::info!(
            "Fitting {} encoder on {} documents",
            hyperparams.vector_algo,
            documents.len()
        );
        Ok(match hyperparams.vector_algo {
            VectorAlgo::Bow => {
                FittedEncoder::Count(CountEncoder::fit(documents, vocabulary, hyperparams)?)
            }
            VectorAlgo::Lda => {
                FittedEncoder::Topic(TopicEncoder::fit(documents, vocabulary, hyperparams)?)
            }
            VectorAlgo::Embedding => {
                FittedEncoder::Embedding(EmbeddingEncoder::fit(documents, vocabulary, hyperparams)?)
            }
        })
    }

    pub fn algo(&self) -> VectorAlgo {
        match self {
            FittedEncoder::Count(_) => VectorAlgo::Bow,
            FittedEncoder::Topic(_) => VectorAlgo::Lda,
            FittedEncoder::Embedding(_) => VectorAlgo::Embedding,
        }
    }

    pub fn dim(&self) -> usize {
        match self {
            FittedEncoder::Count(e) => e.dim(),
            FittedEncoder::Topic(e) => e.dim(),
            FittedEncoder::Embedding(e) => e.dim(),
        }
    }

    pub fn transform(&self, documents: &[Document]) -> Array2<f64> {
        match self {
            FittedEncoder::Count(e) => e.transform(documents),
            FittedEncoder::Topic(e) => e.transform(documents),
            FittedEncoder::Embedding(e) => e.transform(documents),
        }
    }
}
