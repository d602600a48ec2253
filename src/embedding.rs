//! Embedding strategy: paragraph vectors inferred per document.

use ndarray::{Array1, Array2};
use rayon::prelude::*;

use crate::config::Hyperparameters;
use crate::document::Document;
use crate::encoder::Encoder;
use crate::error::Result;
use crate::training::{training_threads, ParagraphModel, TrainingParams};
use crate::vocabulary::Vocabulary;

/// A trained paragraph-vector model.
///
/// `transform` is an optimisation pass per document (not a lookup), seeded by
/// the document itself so repeated calls agree bit for bit.
#[derive(Debug, Clone)]
pub struct EmbeddingEncoder {
    model: ParagraphModel,
}

impl Encoder for EmbeddingEncoder {
    fn fit(
        documents: &[Document],
        vocabulary: &Vocabulary,
        hyperparams: &Hyperparameters,
    ) -> Result<Self> {
        let params = TrainingParams {
            dims: hyperparams.vec_dims,
            window: hyperparams.vec_window,
            epochs: hyperparams.train_epochs,
            learning_rate: hyperparams.learning_rate,
            seed: hyperparams.seed,
        };
        let model =
            ParagraphModel::train(documents, vocabulary.len(), params, training_threads())?;
        Ok(Self { model })
    }

    #[inline]
    fn dim(&self) -> usize {
        self.model.params.dims
    }

    fn transform(&self, documents: &[Document]) -> Array2<f64> {
        let rows: Vec<Array1<f64>> = documents
            .par_iter()
            .map(|doc| self.model.infer(doc))
            .collect();

        let mut out = Array2::zeros((documents.len(), self.dim()));
        for (mut row, values) in out.outer_iter_mut().zip(rows) {
            row.assign(&values);
        }
        out
    }
}

impl EmbeddingEncoder {
    /// Learned vector of a vocabulary id.
    pub fn word_vector(&self, id: u32) -> Option<Array1<f64>> {
        if (id as usize) < self.model.word_vectors.nrows() {
            Some(self.model.word_vectors.row(id as usize).to_owned())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VectorAlgo;
    use crate::error::VectorizerError;
    use compact_str::CompactString;

    fn vocabulary() -> Vocabulary {
        Vocabulary::from_ranked((0..5).map(|i| (CompactString::from(format!("t{}", i)), 1.0)))
    }

    fn hyperparams() -> Hyperparameters {
        Hyperparameters {
            vec_dims: 6,
            vec_window: 2,
            train_epochs: 3,
            ..Hyperparameters::with_algo(VectorAlgo::Embedding)
        }
    }

    fn corpus() -> Vec<Document> {
        (0..50)
            .map(|i| Document::new(vec![i % 5, (i + 1) % 5, (i + 2) % 5]))
            .collect()
    }

    #[test]
    fn test_transform_shape_and_purity() {
        let encoder = EmbeddingEncoder::fit(&corpus(), &vocabulary(), &hyperparams()).unwrap();
        assert_eq!(encoder.dim(), 6);

        let docs = vec![Document::new(vec![0, 1]), Document::new(vec![2, 3, 4])];
        let first = encoder.transform(&docs);
        let second = encoder.transform(&docs);
        assert_eq!(first.shape(), &[2, 6]);
        assert_eq!(first, second);
        assert_eq!(encoder.transform(&[]).shape(), &[0, 6]);
    }

    #[test]
    fn test_fit_is_reproducible() {
        let a = EmbeddingEncoder::fit(&corpus(), &vocabulary(), &hyperparams()).unwrap();
        let b = EmbeddingEncoder::fit(&corpus(), &vocabulary(), &hyperparams()).unwrap();
        let docs = vec![Document::new(vec![4, 0, 1])];
        assert_eq!(a.transform(&docs), b.transform(&docs));
        assert_eq!(a.word_vector(2), b.word_vector(2));
        assert!(a.word_vector(99).is_none());
    }

    #[test]
    fn test_empty_document_is_near_zero() {
        let encoder = EmbeddingEncoder::fit(&corpus(), &vocabulary(), &hyperparams()).unwrap();
        let out = encoder.transform(&[Document::default()]);
        assert!(out.iter().all(|&x| x.is_finite() && x.abs() <= 0.5 / 6.0));
    }

    #[test]
    fn test_fit_without_tokens_fails() {
        let docs = vec![Document::default(); 4];
        assert!(matches!(
            EmbeddingEncoder::fit(&docs, &vocabulary(), &hyperparams()),
            Err(VectorizerError::Fitting(_))
        ));
    }
}
