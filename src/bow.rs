//! Count ("bow") strategy: per-document term counts over the vocabulary.

use ndarray::Array2;

use crate::config::Hyperparameters;
use crate::document::Document;
use crate::encoder::Encoder;
use crate::error::{Result, VectorizerError};
use crate::vocabulary::Vocabulary;

/// Column `i` counts occurrences of vocabulary id `i`.
#[derive(Debug, Clone)]
pub struct CountEncoder {
    n_features: usize,
}

impl Encoder for CountEncoder {
    fn fit(
        documents: &[Document],
        vocabulary: &Vocabulary,
        _hyperparams: &Hyperparameters,
    ) -> Result<Self> {
        if vocabulary.is_empty() {
            return Err(VectorizerError::Fitting(
                "Cannot fit a count encoder on an empty vocabulary".to_string(),
            ));
        }
        let covered = documents.iter().filter(|d| !d.is_empty()).count();
        log::debug!(
            "Count encoder: {} features, {}/{} unlabeled documents contain a vocabulary n-gram",
            vocabulary.len(),
            covered,
            documents.len()
        );
        Ok(Self {
            n_features: vocabulary.len(),
        })
    }

    #[inline]
    fn dim(&self) -> usize {
        self.n_features
    }

    fn transform(&self, documents: &[Document]) -> Array2<f64> {
        let mut out = Array2::zeros((documents.len(), self.n_features));
        for (mut row, doc) in out.outer_iter_mut().zip(documents) {
            for &id in &doc.ids {
                if let Some(cell) = row.get_mut(id as usize) {
                    *cell += 1.0;
                }
            }
        }
        out
    }
}
