//! Topic ("lda") strategy: latent Dirichlet allocation fitted by batch variational Bayes.
//!
//! The dictionary is the subset of the vocabulary that actually occurs in the
//! unlabeled corpus. Fitting alternates a per-document E-step (parallel over
//! documents) with a closed-form update of the topic-word parameters `lambda`.
//! `transform` reruns the E-step against the fitted topics and normalises the
//! resulting `gamma` into a topic distribution.

use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Gamma};
use rayon::prelude::*;

use crate::config::Hyperparameters;
use crate::constants::{
    LDA_GAMMA_THRESHOLD, LDA_INIT_SCALE, LDA_INIT_SHAPE, LDA_ITERATIONS, LDA_PASSES,
};
use crate::document::{count_terms_parallel, Document};
use crate::encoder::Encoder;
use crate::error::{Result, VectorizerError};
use crate::vocabulary::Vocabulary;

/// Dictionary columns and counts of one document.
type Bow = Vec<(usize, f64)>;

/// Variational state of one document after the E-step.
struct DocInference {
    gamma: Array1<f64>,
    exp_elog_theta: Array1<f64>,
    /// `count / phinorm` per entry of the bow
    ratio: Array1<f64>,
}

#[derive(Debug, Clone)]
pub struct TopicEncoder {
    n_topics: usize,
    alpha: f64,
    /// Vocabulary id to dictionary column
    dictionary: Vec<Option<u32>>,
    /// exp(E[log beta]), topics x dictionary
    exp_elog_beta: Array2<f64>,
}

impl Encoder for TopicEncoder {
    fn fit(
        documents: &[Document],
        vocabulary: &Vocabulary,
        hyperparams: &Hyperparameters,
    ) -> Result<Self> {
        let n_topics = hyperparams.topics;
        let counts = count_terms_parallel(documents, vocabulary.len());

        let mut dictionary = vec![None; vocabulary.len()];
        let mut n_columns = 0u32;
        for (id, &count) in counts.iter().enumerate() {
            if count > 0 {
                dictionary[id] = Some(n_columns);
                n_columns += 1;
            }
        }
        if n_columns == 0 {
            return Err(VectorizerError::Fitting(
                "No vocabulary n-gram occurs in the unlabeled corpus".to_string(),
            ));
        }
        let n_columns = n_columns as usize;
        log::info!(
            "Fitting {} topics over a {}-entry dictionary ({} documents)",
            n_topics,
            n_columns,
            documents.len()
        );

        let alpha = 1.0 / n_topics as f64;
        let eta = 1.0 / n_topics as f64;
        let bows: Vec<Bow> = documents.iter().map(|d| to_bow(d, &dictionary)).collect();

        let init = Gamma::new(LDA_INIT_SHAPE, LDA_INIT_SCALE)
            .map_err(|e| VectorizerError::Fitting(format!("Invalid topic initialisation: {}", e)))?;
        let mut rng = ChaCha8Rng::seed_from_u64(hyperparams.seed);
        let mut lambda =
            Array2::from_shape_simple_fn((n_topics, n_columns), || init.sample(&mut rng));

        for pass in 0..LDA_PASSES {
            let exp_elog_beta = dirichlet_expectation_exp(&lambda);
            let inferred: Vec<DocInference> = bows
                .par_iter()
                .map(|bow| e_step(bow, &exp_elog_beta, alpha))
                .collect();

            let mut sstats = Array2::<f64>::zeros((n_topics, n_columns));
            for (bow, doc) in bows.iter().zip(&inferred) {
                for (&(col, _), &ratio) in bow.iter().zip(doc.ratio.iter()) {
                    let mut column = sstats.column_mut(col);
                    column.scaled_add(ratio, &doc.exp_elog_theta);
                }
            }
            sstats *= &exp_elog_beta;
            lambda = sstats + eta;

            log::info!("Topic model pass {}/{} complete", pass + 1, LDA_PASSES);
        }

        Ok(Self {
            n_topics,
            alpha,
            dictionary,
            exp_elog_beta: dirichlet_expectation_exp(&lambda),
        })
    }

    #[inline]
    fn dim(&self) -> usize {
        self.n_topics
    }

    fn transform(&self, documents: &[Document]) -> Array2<f64> {
        let rows: Vec<Array1<f64>> = documents
            .par_iter()
            .map(|doc| {
                let bow = to_bow(doc, &self.dictionary);
                let gamma = e_step(&bow, &self.exp_elog_beta, self.alpha).gamma;
                let total = gamma.sum();
                gamma / total
            })
            .collect();

        let mut out = Array2::zeros((documents.len(), self.n_topics));
        for (mut row, values) in out.outer_iter_mut().zip(rows) {
            row.assign(&values);
        }
        out
    }
}

impl TopicEncoder {
    /// Number of vocabulary n-grams the topic model knows.
    pub fn dictionary_len(&self) -> usize {
        self.exp_elog_beta.ncols()
    }
}

fn to_bow(doc: &Document, dictionary: &[Option<u32>]) -> Bow {
    doc.term_counts()
        .into_iter()
        .filter_map(|(id, count)| {
            dictionary
                .get(id as usize)
                .copied()
                .flatten()
                .map(|col| (col as usize, count as f64))
        })
        .collect()
}

/// Variational E-step for a single document against fixed topics.
fn e_step(bow: &[(usize, f64)], exp_elog_beta: &Array2<f64>, alpha: f64) -> DocInference {
    let n_topics = exp_elog_beta.nrows();
    if bow.is_empty() {
        let gamma = Array1::from_elem(n_topics, alpha);
        return DocInference {
            exp_elog_theta: dirichlet_expectation_exp_1d(&gamma),
            gamma,
            ratio: Array1::zeros(0),
        };
    }

    let cols: Vec<usize> = bow.iter().map(|&(col, _)| col).collect();
    let cts: Array1<f64> = bow.iter().map(|&(_, count)| count).collect();
    let beta_d = exp_elog_beta.select(Axis(1), &cols);

    let mut gamma = Array1::from_elem(n_topics, 1.0);
    let mut exp_elog_theta = dirichlet_expectation_exp_1d(&gamma);
    let mut phinorm = exp_elog_theta.dot(&beta_d) + 1e-100;

    for _ in 0..LDA_ITERATIONS {
        let last = gamma.clone();
        let ratio = &cts / &phinorm;
        gamma = &exp_elog_theta * &beta_d.dot(&ratio) + alpha;
        exp_elog_theta = dirichlet_expectation_exp_1d(&gamma);
        phinorm = exp_elog_theta.dot(&beta_d) + 1e-100;

        let change = (&gamma - &last).mapv(f64::abs).mean().unwrap_or(0.0);
        if change < LDA_GAMMA_THRESHOLD {
            break;
        }
    }

    DocInference {
        ratio: &cts / &phinorm,
        gamma,
        exp_elog_theta,
    }
}

/// exp(E[log X]) for X ~ Dir(row), applied to every row.
fn dirichlet_expectation_exp(params: &Array2<f64>) -> Array2<f64> {
    let mut out = params.clone();
    for mut row in out.outer_iter_mut() {
        let psi_total = digamma(row.sum());
        row.mapv_inplace(|x| (digamma(x) - psi_total).exp());
    }
    out
}

fn dirichlet_expectation_exp_1d(params: &Array1<f64>) -> Array1<f64> {
    let psi_total = digamma(params.sum());
    params.mapv(|x| (digamma(x) - psi_total).exp())
}

/// Digamma for positive arguments via recurrence plus the asymptotic series.
fn digamma(mut x: f64) -> f64 {
    let mut result = 0.0;
    while x < 6.0 {
        result -= 1.0 / x;
        x += 1.0;
    }
    let f = 1.0 / (x * x);
    result + x.ln()
        - 0.5 / x
        - f * (1.0 / 12.0 - f * (1.0 / 120.0 - f * (1.0 / 252.0 - f * (1.0 / 240.0 - f / 132.0))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use compact_str::CompactString;

    fn vocabulary(n: usize) -> Vocabulary {
        Vocabulary::from_ranked((0..n).map(|i| (CompactString::from(format!("t{}", i)), 1.0)))
    }

    fn two_theme_corpus() -> Vec<Document> {
        let mut docs = Vec::new();
        for i in 0..20 {
            if i % 2 == 0 {
                docs.push(Document::new(vec![0, 1, 0, 1, 0, 1, 0, 1]));
            } else {
                docs.push(Document::new(vec![2, 3, 2, 3, 2, 3, 2, 3]));
            }
        }
        docs
    }

    fn hyperparams(topics: usize) -> Hyperparameters {
        Hyperparameters {
            topics,
            ..Hyperparameters::with_algo(crate::config::VectorAlgo::Lda)
        }
    }

    #[test]
    fn test_digamma_known_values() {
        // psi(1) = -euler_gamma, psi(0.5) = -euler_gamma - 2 ln 2
        let euler = 0.577_215_664_901_532_9;
        assert_relative_eq!(digamma(1.0), -euler, epsilon = 1e-10);
        assert_relative_eq!(digamma(0.5), -euler - 2.0 * 2f64.ln(), epsilon = 1e-10);
        assert_relative_eq!(digamma(10.0), 2.251_752_589_066_721, epsilon = 1e-10);
    }

    #[test]
    fn test_transform_rows_are_distributions() {
        let docs = two_theme_corpus();
        let encoder = TopicEncoder::fit(&docs, &vocabulary(5), &hyperparams(3)).unwrap();
        assert_eq!(encoder.dim(), 3);
        // Id 4 never occurs in the unlabeled corpus.
        assert_eq!(encoder.dictionary_len(), 4);

        let out = encoder.transform(&docs[..4]);
        assert_eq!(out.shape(), &[4, 3]);
        for row in out.outer_iter() {
            assert_relative_eq!(row.sum(), 1.0, epsilon = 1e-9);
            assert!(row.iter().all(|&p| p >= 0.0));
        }
    }

    #[test]
    fn test_themes_get_different_topics() {
        let docs = two_theme_corpus();
        let encoder = TopicEncoder::fit(&docs, &vocabulary(4), &hyperparams(2)).unwrap();
        let out = encoder.transform(&docs[..2]);
        let distance: f64 = (&out.row(0) - &out.row(1)).mapv(f64::abs).sum();
        assert!(distance > 0.1, "topic rows too similar: {:?}", out);
    }

    #[test]
    fn test_unknown_document_gets_prior() {
        let docs = two_theme_corpus();
        let encoder = TopicEncoder::fit(&docs, &vocabulary(5), &hyperparams(4)).unwrap();
        let out = encoder.transform(&[Document::default(), Document::new(vec![4])]);
        for row in out.outer_iter() {
            for &p in row.iter() {
                assert_relative_eq!(p, 0.25, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_fit_and_transform_are_deterministic() {
        let docs = two_theme_corpus();
        let a = TopicEncoder::fit(&docs, &vocabulary(4), &hyperparams(2)).unwrap();
        let b = TopicEncoder::fit(&docs, &vocabulary(4), &hyperparams(2)).unwrap();
        assert_eq!(a.transform(&docs), b.transform(&docs));
        assert_eq!(a.transform(&docs), a.transform(&docs));
        assert_eq!(a.transform(&[]).shape(), &[0, 2]);
    }

    #[test]
    fn test_empty_dictionary_rejected() {
        let docs = vec![Document::default(), Document::default()];
        assert!(matches!(
            TopicEncoder::fit(&docs, &vocabulary(3), &hyperparams(2)),
            Err(VectorizerError::Fitting(_))
        ));
    }
}
