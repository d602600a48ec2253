//! Paragraph-vector (PV-DM) training and inference with negative sampling.
//!
//! Each epoch cuts the corpus into fixed-size shards. A shard trains its own
//! document vectors in place and records its word/output updates as sparse row
//! copies of the epoch-start weights; the row deltas are merged back in shard
//! order once every shard is done. Shard boundaries and per-shard RNG streams
//! do not depend on the worker count, so the learned parameters are the same
//! for any pool size.

use std::hash::Hasher;

use ahash::AHashMap;
use ndarray::{Array1, Array2, ArrayView1};
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use twox_hash::XxHash64;

use crate::constants::{MIN_LEARNING_RATE, NEGATIVE_SAMPLES, NOISE_EXPONENT, TRAINING_SHARD_SIZE};
use crate::document::Document;
use crate::error::{Result, VectorizerError};

/// Settings of one paragraph-vector model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TrainingParams {
    pub dims: usize,
    pub window: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    pub seed: u64,
}

impl TrainingParams {
    /// Linearly decayed learning rate for `epoch`.
    #[inline]
    fn alpha(&self, epoch: usize) -> f64 {
        let progress = epoch as f64 / self.epochs as f64;
        (self.learning_rate - (self.learning_rate - MIN_LEARNING_RATE) * progress)
            .max(MIN_LEARNING_RATE)
    }
}

/// Learned word and output weights plus the noise distribution.
#[derive(Debug, Clone)]
pub(crate) struct ParagraphModel {
    pub params: TrainingParams,
    pub word_vectors: Array2<f64>,
    pub output_weights: Array2<f64>,
    noise: WeightedIndex<f64>,
}

/// Epoch-start weights overlaid with the rows a shard has touched.
struct ShardWeights<'a> {
    words: &'a Array2<f64>,
    output: &'a Array2<f64>,
    word_rows: AHashMap<u32, Array1<f64>>,
    output_rows: AHashMap<u32, Array1<f64>>,
}

/// Row changes made by one shard.
struct ShardDelta {
    words: Vec<(u32, Array1<f64>)>,
    output: Vec<(u32, Array1<f64>)>,
}

impl<'a> ShardWeights<'a> {
    fn new(words: &'a Array2<f64>, output: &'a Array2<f64>) -> Self {
        Self {
            words,
            output,
            word_rows: AHashMap::new(),
            output_rows: AHashMap::new(),
        }
    }

    fn word(&self, id: u32) -> ArrayView1<'_, f64> {
        match self.word_rows.get(&id) {
            Some(row) => row.view(),
            None => self.words.row(id as usize),
        }
    }

    fn word_mut(&mut self, id: u32) -> &mut Array1<f64> {
        let base = self.words;
        self.word_rows
            .entry(id)
            .or_insert_with(|| base.row(id as usize).to_owned())
    }

    fn output(&self, id: u32) -> ArrayView1<'_, f64> {
        match self.output_rows.get(&id) {
            Some(row) => row.view(),
            None => self.output.row(id as usize),
        }
    }

    fn output_mut(&mut self, id: u32) -> &mut Array1<f64> {
        let base = self.output;
        self.output_rows
            .entry(id)
            .or_insert_with(|| base.row(id as usize).to_owned())
    }

    fn into_delta(self) -> ShardDelta {
        let ShardWeights {
            words,
            output,
            word_rows,
            output_rows,
        } = self;
        ShardDelta {
            words: word_rows
                .into_iter()
                .map(|(id, row)| (id, row - &words.row(id as usize)))
                .collect(),
            output: output_rows
                .into_iter()
                .map(|(id, row)| (id, row - &output.row(id as usize)))
                .collect(),
        }
    }
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Small uniform vector in `(-0.5 / dims, 0.5 / dims)`.
fn random_vector(dims: usize, rng: &mut ChaCha8Rng) -> Array1<f64> {
    let scale = dims as f64;
    Array1::from_shape_simple_fn(dims, || rng.gen_range(-0.5..0.5) / scale)
}

/// XxHash64 of the ids as little-endian `u32`s, keyed by `seed`.
///
/// Fed fixed-width bytes only, so the value is the same on every target.
fn inference_seed(seed: u64, ids: &[u32]) -> u64 {
    let mut hasher = XxHash64::with_seed(seed);
    for id in ids {
        hasher.write(&id.to_le_bytes());
    }
    hasher.finish()
}

/// Worker count for training: all cores but a reserved few, at least one.
pub(crate) fn training_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .saturating_sub(crate::constants::RESERVED_CORES)
        .max(1)
}

impl ParagraphModel {
    /// Train on `docs` using a dedicated pool of `threads` workers.
    ///
    /// # Arguments
    /// * `docs` - Vocabulary-filtered training documents
    /// * `vocab_len` - Number of rows in the word and output matrices
    /// * `params` - Model settings
    /// * `threads` - Worker count; does not affect the result
    pub fn train(
        docs: &[Document],
        vocab_len: usize,
        params: TrainingParams,
        threads: usize,
    ) -> Result<Self> {
        let counts = crate::document::count_terms_parallel(docs, vocab_len);
        let total: u64 = counts.iter().sum();
        if total == 0 {
            return Err(VectorizerError::Fitting(
                "No vocabulary n-gram occurs in the unlabeled corpus".to_string(),
            ));
        }
        let weights: Vec<f64> = counts
            .iter()
            .map(|&c| (c as f64).powf(NOISE_EXPONENT))
            .collect();
        let noise = WeightedIndex::new(&weights)
            .map_err(|e| VectorizerError::Fitting(format!("Invalid noise distribution: {}", e)))?;

        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
        let mut word_vectors = Array2::zeros((vocab_len, params.dims));
        for mut row in word_vectors.outer_iter_mut() {
            row.assign(&random_vector(params.dims, &mut rng));
        }
        let mut model = Self {
            params,
            word_vectors,
            output_weights: Array2::zeros((vocab_len, params.dims)),
            noise,
        };

        let mut doc_vectors: Vec<Array1<f64>> = (0..docs.len())
            .map(|_| random_vector(params.dims, &mut rng))
            .collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| VectorizerError::Fitting(format!("Cannot start training pool: {}", e)))?;

        let n_shards = docs.len().div_ceil(TRAINING_SHARD_SIZE).max(1) as u64;
        log::info!(
            "Training paragraph vectors: {} documents, {} words in {} tokens, {} dims, {} epochs, {} workers",
            docs.len(),
            vocab_len,
            total,
            params.dims,
            params.epochs,
            threads
        );

        let mut last_log_percent = 0usize;
        for epoch in 0..params.epochs {
            let alpha = params.alpha(epoch);
            let model_ref = &model;
            let deltas: Vec<ShardDelta> = pool.install(|| {
                doc_vectors
                    .par_chunks_mut(TRAINING_SHARD_SIZE)
                    .zip(docs.par_chunks(TRAINING_SHARD_SIZE))
                    .enumerate()
                    .map(|(shard, (vectors, shard_docs))| {
                        let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
                        rng.set_stream(epoch as u64 * n_shards + shard as u64 + 1);
                        let mut weights =
                            ShardWeights::new(&model_ref.word_vectors, &model_ref.output_weights);
                        for (vector, doc) in vectors.iter_mut().zip(shard_docs) {
                            model_ref.train_document(
                                vector,
                                doc,
                                alpha,
                                &mut weights,
                                &mut rng,
                                true,
                            );
                        }
                        weights.into_delta()
                    })
                    .collect()
            });

            for delta in deltas {
                for (id, change) in delta.words {
                    let mut row = model.word_vectors.row_mut(id as usize);
                    row += &change;
                }
                for (id, change) in delta.output {
                    let mut row = model.output_weights.row_mut(id as usize);
                    row += &change;
                }
            }

            // Log progress every 1%
            let current_percent = ((epoch + 1) * 100) / params.epochs;
            if current_percent > last_log_percent {
                log::info!(
                    "Progress: {}% ({}/{} epochs) - learning rate {:.5}",
                    current_percent,
                    epoch + 1,
                    params.epochs,
                    alpha
                );
                last_log_percent = current_percent;
            }
        }

        log::info!("Finished training: {} epochs completed", params.epochs);
        Ok(model)
    }

    /// One pass over `doc`, updating `doc_vector` and, when `learn` is set,
    /// the shard's word and output rows.
    fn train_document(
        &self,
        doc_vector: &mut Array1<f64>,
        doc: &Document,
        alpha: f64,
        weights: &mut ShardWeights<'_>,
        rng: &mut ChaCha8Rng,
        learn: bool,
    ) {
        let dims = self.params.dims;
        for pos in 0..doc.len() {
            let target = doc.ids[pos];
            let reduced = rng.gen_range(0..self.params.window);
            let context: Vec<u32> = doc.context(pos, self.params.window - reduced).collect();

            let mut hidden = doc_vector.clone();
            for &word in &context {
                hidden += &weights.word(word);
            }
            hidden /= (1 + context.len()) as f64;

            let mut error = Array1::<f64>::zeros(dims);
            for sample in 0..=NEGATIVE_SAMPLES {
                let (word, label) = if sample == 0 {
                    (target, 1.0)
                } else {
                    let word = self.noise.sample(rng) as u32;
                    if word == target {
                        continue;
                    }
                    (word, 0.0)
                };

                let gradient = {
                    let out = weights.output(word);
                    let g = (label - sigmoid(hidden.dot(&out))) * alpha;
                    error.scaled_add(g, &out);
                    g
                };
                if learn {
                    weights.output_mut(word).scaled_add(gradient, &hidden);
                }
            }

            *doc_vector += &error;
            if learn {
                for &word in &context {
                    *weights.word_mut(word) += &error;
                }
            }
        }
    }

    /// Infer a vector for an unseen document with the word and output weights frozen.
    ///
    /// The starting vector and the RNG are seeded from the document's ids, so
    /// the same document always yields the same vector.
    pub fn infer(&self, doc: &Document) -> Array1<f64> {
        let mut rng = ChaCha8Rng::seed_from_u64(inference_seed(self.params.seed, &doc.ids));

        let mut vector = random_vector(self.params.dims, &mut rng);
        if doc.is_empty() {
            return vector;
        }

        let mut weights = ShardWeights::new(&self.word_vectors, &self.output_weights);
        for epoch in 0..self.params.epochs {
            let alpha = self.params.alpha(epoch);
            self.train_document(&mut vector, doc, alpha, &mut weights, &mut rng, false);
        }
        vector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> TrainingParams {
        TrainingParams {
            dims: 8,
            window: 2,
            epochs: 4,
            learning_rate: 0.05,
            seed: 18,
        }
    }

    fn corpus() -> Vec<Document> {
        (0..600)
            .map(|i| {
                if i % 3 == 0 {
                    Document::new(vec![0, 1, 2, 1, 0])
                } else if i % 3 == 1 {
                    Document::new(vec![3, 4, 3, 4])
                } else {
                    Document::new(vec![])
                }
            })
            .collect()
    }

    #[test]
    fn test_alpha_schedule() {
        let p = params();
        assert_eq!(p.alpha(0), 0.05);
        assert!(p.alpha(3) < p.alpha(1));
        assert!(p.alpha(3) >= MIN_LEARNING_RATE);
    }

    #[test]
    fn test_training_independent_of_worker_count() {
        let docs = corpus();
        let one = ParagraphModel::train(&docs, 6, params(), 1).unwrap();
        let three = ParagraphModel::train(&docs, 6, params(), 3).unwrap();
        assert_eq!(one.word_vectors, three.word_vectors);
        assert_eq!(one.output_weights, three.output_weights);
    }

    #[test]
    fn test_training_moves_weights() {
        let docs = corpus();
        let model = ParagraphModel::train(&docs, 6, params(), 2).unwrap();
        // Output rows of words that occur are updated; id 5 never occurs and is never sampled.
        assert!(model.output_weights.row(0).iter().any(|&x| x != 0.0));
        assert!(model.output_weights.row(5).iter().all(|&x| x == 0.0));
        assert!(model.word_vectors.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn test_inference_seed_is_fixed() {
        assert_eq!(inference_seed(18, &[]), 8354336590748365959);
        assert_eq!(inference_seed(18, &[0, 1, 2]), 5603487840275350834);
        let ids: Vec<u32> = (0..20).collect();
        assert_eq!(inference_seed(7, &ids), 10342814289440157334);
    }

    #[test]
    fn test_infer_is_deterministic() {
        let docs = corpus();
        let model = ParagraphModel::train(&docs, 6, params(), 2).unwrap();
        let doc = Document::new(vec![0, 1, 2]);
        assert_eq!(model.infer(&doc), model.infer(&doc));
        assert_ne!(model.infer(&doc), model.infer(&Document::new(vec![3, 4])));
    }

    #[test]
    fn test_infer_empty_document_is_near_zero() {
        let docs = corpus();
        let model = ParagraphModel::train(&docs, 6, params(), 1).unwrap();
        let vector = model.infer(&Document::default());
        assert_eq!(vector.len(), 8);
        assert!(vector.iter().all(|&x| x.abs() <= 0.5 / 8.0));
    }

    #[test]
    fn test_train_without_tokens_fails() {
        let docs = vec![Document::default(); 3];
        assert!(matches!(
            ParagraphModel::train(&docs, 4, params(), 1),
            Err(VectorizerError::Fitting(_))
        ));
    }
}
