//! The fit/transform pipeline: vocabulary selection, corpus encoding and the
//! configured encoder, plus the lifecycle that guards it.

use std::sync::Arc;

use ndarray::Array2;

use crate::analyzer::Analyzer;
use crate::cache::ModelCache;
use crate::config::Hyperparameters;
use crate::corpus::Corpus;
use crate::encoder::FittedEncoder;
use crate::encoding::{batch_encode, encode_corpus};
use crate::error::{Result, VectorizerError};
use crate::labels::LabelMatrix;
use crate::selection::VocabularySelector;
use crate::vocabulary::Vocabulary;

/// Everything learned by one successful fit. Immutable and shareable.
#[derive(Debug, Clone)]
pub struct FittedModel {
    hyperparams: Hyperparameters,
    analyzer: Analyzer,
    vocabulary: Vocabulary,
    encoder: FittedEncoder,
}

impl FittedModel {
    /// Select a vocabulary on the labeled corpus, then fit the configured
    /// encoder on the unlabeled corpus.
    ///
    /// # Arguments
    /// * `hyperparams` - Validated settings
    /// * `unlabeled` - Corpus the encoder learns from
    /// * `x` - Labeled SMILES used for vocabulary selection
    /// * `labels` - One row per entry of `x`
    pub fn fit<U, X>(
        hyperparams: &Hyperparameters,
        unlabeled: &U,
        x: &X,
        labels: &LabelMatrix,
    ) -> Result<Self>
    where
        U: Corpus + ?Sized,
        X: Corpus + ?Sized,
    {
        hyperparams.validate()?;
        if unlabeled.is_empty() {
            return Err(VectorizerError::Fitting(
                "Unlabeled corpus is empty".to_string(),
            ));
        }

        let analyzer = Analyzer::new(hyperparams.max_ngram)?;
        let vocabulary =
            VocabularySelector::new(&analyzer, hyperparams.max_vocab).select(x, labels)?;
        log::info!("Selected a vocabulary of {} n-grams", vocabulary.len());

        let documents = encode_corpus(unlabeled, &analyzer, &vocabulary);
        let encoder = FittedEncoder::fit(&documents, &vocabulary, hyperparams)?;
        log::info!(
            "Fitted {} encoder, output width {}",
            encoder.algo(),
            encoder.dim()
        );

        Ok(Self {
            hyperparams: hyperparams.clone(),
            analyzer,
            vocabulary,
            encoder,
        })
    }

    /// Encode each string into one row of width `dim()`.
    pub fn transform<S>(&self, smiles: &[S]) -> Array2<f64>
    where
        S: AsRef<str> + Sync,
    {
        let documents = batch_encode(smiles, &self.analyzer, &self.vocabulary);
        self.encoder.transform(&documents)
    }

    pub fn hyperparams(&self) -> &Hyperparameters {
        &self.hyperparams
    }

    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn encoder(&self) -> &FittedEncoder {
        &self.encoder
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.encoder.dim()
    }
}

#[derive(Debug, Clone)]
enum ModelState {
    Unfit,
    Fitting,
    Ready(Arc<FittedModel>),
}

/// Lifecycle wrapper: `Unfit -> Fitting -> Ready`.
///
/// A failed fit drops back to `Unfit`. `Ready` is terminal; build a new model
/// to refit.
#[derive(Debug, Clone)]
pub struct ChemicalLanguageModel {
    hyperparams: Hyperparameters,
    state: ModelState,
}

impl ChemicalLanguageModel {
    pub fn new(hyperparams: Hyperparameters) -> Result<Self> {
        hyperparams.validate()?;
        Ok(Self {
            hyperparams,
            state: ModelState::Unfit,
        })
    }

    pub fn hyperparams(&self) -> &Hyperparameters {
        &self.hyperparams
    }

    /// Key identifying a fit with these hyperparameters.
    pub fn cache_key(&self) -> String {
        self.hyperparams.cache_key()
    }

    pub fn fit<U, X>(&mut self, unlabeled: &U, x: &X, labels: &LabelMatrix) -> Result<()>
    where
        U: Corpus + ?Sized,
        X: Corpus + ?Sized,
    {
        self.begin_fit()?;
        let result = FittedModel::fit(&self.hyperparams, unlabeled, x, labels).map(Arc::new);
        self.finish_fit(result)
    }

    /// Like `fit`, but the fitted model is materialized through `cache` under `key`.
    pub fn fit_cached<M, U, X>(
        &mut self,
        cache: &M,
        key: &str,
        unlabeled: &U,
        x: &X,
        labels: &LabelMatrix,
    ) -> Result<()>
    where
        M: ModelCache + ?Sized,
        U: Corpus + ?Sized,
        X: Corpus + ?Sized,
    {
        self.begin_fit()?;
        let hyperparams = &self.hyperparams;
        let mut produce = || FittedModel::fit(hyperparams, unlabeled, x, labels);
        let result = cache.materialize(key, &mut produce).and_then(|model| {
            if model.hyperparams() != hyperparams {
                Err(VectorizerError::Configuration(format!(
                    "Cached model '{}' was fitted with different hyperparameters",
                    key
                )))
            } else {
                Ok(model)
            }
        });
        self.finish_fit(result)
    }

    fn begin_fit(&mut self) -> Result<()> {
        match self.state {
            ModelState::Unfit => {
                self.state = ModelState::Fitting;
                Ok(())
            }
            ModelState::Fitting => Err(VectorizerError::State(
                "A fit is already in progress".to_string(),
            )),
            ModelState::Ready(_) => Err(VectorizerError::State(
                "Model is already fitted; create a new model to refit".to_string(),
            )),
        }
    }

    fn finish_fit(&mut self, result: Result<Arc<FittedModel>>) -> Result<()> {
        match result {
            Ok(model) => {
                self.state = ModelState::Ready(model);
                Ok(())
            }
            Err(e) => {
                log::warn!("Fit failed, model stays unfit: {}", e);
                self.state = ModelState::Unfit;
                Err(e)
            }
        }
    }

    /// Shared handle on the fitted model, if any.
    pub fn fitted(&self) -> Option<&Arc<FittedModel>> {
        match &self.state {
            ModelState::Ready(model) => Some(model),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.fitted().is_some()
    }

    /// Output width, known once fitted.
    pub fn dim(&self) -> Option<usize> {
        self.fitted().map(|model| model.dim())
    }

    pub fn transform<S>(&self, smiles: &[S]) -> Result<Array2<f64>>
    where
        S: AsRef<str> + Sync,
    {
        match &self.state {
            ModelState::Ready(model) => Ok(model.transform(smiles)),
            _ => Err(VectorizerError::State(
                "transform called before a successful fit".to_string(),
            )),
        }
    }
}
