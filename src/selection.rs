//! Supervised vocabulary selection by mutual information.
//!
//! The labeled corpus is analyzed into n-grams, rare and ubiquitous n-grams
//! are pruned, the survivors are scored against every label column, and the
//! `max_vocab` best distinct n-grams become the [`Vocabulary`].

use std::cmp::{Ordering, Reverse};

use ahash::AHashMap;
use compact_str::CompactString;
use dary_heap::OctonaryHeap;

use crate::analyzer::Analyzer;
use crate::constants::{MAX_DOCUMENT_FRACTION, MAX_SCORED_FEATURES, MIN_DOCUMENT_COUNT};
use crate::corpus::Corpus;
use crate::error::{Result, VectorizerError};
use crate::labels::{class_indices, LabelMatrix};
use crate::vocabulary::Vocabulary;

/// Sparse n-gram statistics of the labeled corpus.
#[derive(Debug, Default)]
struct TermStats {
    terms: Vec<CompactString>,
    doc_freq: Vec<u32>,
    term_freq: Vec<u64>,
    /// Per document: `(term id, count)` sorted by term id
    docs: Vec<Vec<(u32, u32)>>,
}

/// Pruning candidate ranked by total count, ties broken toward the smaller n-gram.
#[derive(Debug, PartialEq, Eq)]
struct FrequencyRank<'a> {
    term_freq: u64,
    term: &'a str,
    id: u32,
}

impl PartialOrd for FrequencyRank<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrequencyRank<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.term_freq
            .cmp(&other.term_freq)
            .then_with(|| other.term.cmp(self.term))
    }
}

/// Selects the most label-informative n-grams of a labeled corpus.
pub struct VocabularySelector<'a> {
    analyzer: &'a Analyzer,
    max_vocab: usize,
}

impl<'a> VocabularySelector<'a> {
    pub fn new(analyzer: &'a Analyzer, max_vocab: usize) -> Self {
        Self {
            analyzer,
            max_vocab,
        }
    }

    /// Run the full selection. Deterministic for fixed inputs.
    ///
    /// Scores from several label columns are combined by taking the maximum
    /// per n-gram before ranking.
    pub fn select<C>(&self, corpus: &C, labels: &LabelMatrix) -> Result<Vocabulary>
    where
        C: Corpus + ?Sized,
    {
        if labels.n_columns() == 0 {
            return Err(VectorizerError::Fitting(
                "At least one label column is required".to_string(),
            ));
        }

        let stats = self.count_terms(corpus);
        let n_docs = stats.docs.len();
        if n_docs == 0 {
            return Err(VectorizerError::Fitting(
                "Labeled corpus is empty".to_string(),
            ));
        }
        if n_docs != labels.n_rows() {
            return Err(VectorizerError::Fitting(format!(
                "Labeled corpus has {} documents but the label table has {} rows",
                n_docs,
                labels.n_rows()
            )));
        }
        log::info!(
            "Selecting vocabulary from {} labeled documents, {} distinct n-grams",
            n_docs,
            stats.terms.len()
        );

        let kept = self.prune(&stats)?;
        log::info!("{} n-grams survive document-frequency pruning", kept.len());

        let postings = build_postings(&stats, &kept);
        let mut best = vec![0.0f64; kept.len()];
        for (name, values) in labels.columns() {
            let (classes, n_classes) = class_indices(values);
            let mut class_totals = vec![0u64; n_classes];
            for &c in &classes {
                class_totals[c] += 1;
            }
            if n_classes < 2 {
                log::warn!("Label column '{}' has a single class; every score is zero", name);
            }
            log::debug!("Scoring {} n-grams against label column '{}'", kept.len(), name);
            for (score, feature_postings) in best.iter_mut().zip(postings.iter()) {
                let mi = mutual_information(feature_postings, &classes, &class_totals);
                if mi > *score {
                    *score = mi;
                }
            }
        }

        let mut ranked: Vec<(CompactString, f64)> = kept
            .iter()
            .zip(best)
            .map(|(&id, score)| (stats.terms[id as usize].clone(), score))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.max_vocab);

        let vocabulary = Vocabulary::from_ranked(ranked);
        if vocabulary.is_empty() {
            return Err(VectorizerError::Fitting(
                "Vocabulary selection produced no n-grams".to_string(),
            ));
        }
        log::info!(
            "Retained {} n-grams (best score {:.4})",
            vocabulary.len(),
            vocabulary.score(0).unwrap_or(0.0)
        );
        Ok(vocabulary)
    }

    fn count_terms<C>(&self, corpus: &C) -> TermStats
    where
        C: Corpus + ?Sized,
    {
        let mut stats = TermStats::default();
        let mut term_to_id: AHashMap<CompactString, u32> = AHashMap::new();

        for smiles in corpus.documents() {
            let mut local: AHashMap<u32, u32> = AHashMap::new();
            for gram in self.analyzer.analyze(&smiles) {
                let id = match term_to_id.get(&gram) {
                    Some(&id) => id,
                    None => {
                        let id = stats.terms.len() as u32;
                        term_to_id.insert(gram.clone(), id);
                        stats.terms.push(gram);
                        stats.doc_freq.push(0);
                        stats.term_freq.push(0);
                        id
                    }
                };
                *local.entry(id).or_default() += 1;
            }

            let mut counts: Vec<(u32, u32)> = local.into_iter().collect();
            counts.sort_unstable_by_key(|&(id, _)| id);
            for &(id, count) in &counts {
                stats.doc_freq[id as usize] += 1;
                stats.term_freq[id as usize] += count as u64;
            }
            stats.docs.push(counts);
        }
        stats
    }

    /// Drop n-grams outside the document-frequency window, then keep the most
    /// frequent `min(max_vocab, MAX_SCORED_FEATURES)`. Returned ids are sorted.
    fn prune(&self, stats: &TermStats) -> Result<Vec<u32>> {
        let n_docs = stats.docs.len();
        let max_doc_count = MAX_DOCUMENT_FRACTION * n_docs as f64;
        if max_doc_count < MIN_DOCUMENT_COUNT as f64 {
            return Err(VectorizerError::Fitting(format!(
                "{} labeled documents are too few: n-grams must occur in at least {} and at most {:.2} documents",
                n_docs, MIN_DOCUMENT_COUNT, max_doc_count
            )));
        }

        let limit = self.max_vocab.min(MAX_SCORED_FEATURES);
        let mut heap = OctonaryHeap::with_capacity(limit + 1);
        for (id, &df) in stats.doc_freq.iter().enumerate() {
            let df = df as usize;
            if df < MIN_DOCUMENT_COUNT || df as f64 > max_doc_count {
                continue;
            }
            heap.push(Reverse(FrequencyRank {
                term_freq: stats.term_freq[id],
                term: stats.terms[id].as_str(),
                id: id as u32,
            }));
            if heap.len() > limit {
                heap.pop();
            }
        }

        if heap.is_empty() {
            return Err(VectorizerError::Fitting(
                "After pruning, no n-grams remain".to_string(),
            ));
        }
        let mut kept: Vec<u32> = heap
            .into_vec()
            .into_iter()
            .map(|Reverse(rank)| rank.id)
            .collect();
        kept.sort_unstable();
        Ok(kept)
    }
}

/// Per kept feature: `(document, count)` for the documents containing it.
fn build_postings(stats: &TermStats, kept: &[u32]) -> Vec<Vec<(u32, u32)>> {
    let mut position = vec![u32::MAX; stats.terms.len()];
    for (k, &id) in kept.iter().enumerate() {
        position[id as usize] = k as u32;
    }
    let mut postings = vec![Vec::new(); kept.len()];
    for (doc, counts) in stats.docs.iter().enumerate() {
        for &(id, count) in counts {
            let k = position[id as usize];
            if k != u32::MAX {
                postings[k as usize].push((doc as u32, count));
            }
        }
    }
    postings
}

/// Mutual information (nats) between a feature's per-document count and a class column.
///
/// Counts are discrete values; documents missing from `postings` have count zero.
pub(crate) fn mutual_information(
    postings: &[(u32, u32)],
    classes: &[usize],
    class_totals: &[u64],
) -> f64 {
    let n = classes.len() as f64;
    if classes.is_empty() {
        return 0.0;
    }

    let mut joint: AHashMap<(u32, usize), u64> = AHashMap::new();
    let mut value_totals: AHashMap<u32, u64> = AHashMap::new();
    let mut present_per_class = vec![0u64; class_totals.len()];
    for &(doc, count) in postings {
        let class = classes[doc as usize];
        *joint.entry((count, class)).or_default() += 1;
        *value_totals.entry(count).or_default() += 1;
        present_per_class[class] += 1;
    }

    let absent = classes.len() as u64 - postings.len() as u64;
    if absent > 0 {
        value_totals.insert(0, absent);
        for (class, &total) in class_totals.iter().enumerate() {
            let zeros = total - present_per_class[class];
            if zeros > 0 {
                joint.insert((0, class), zeros);
            }
        }
    }

    // Fixed summation order keeps scores bit-identical between runs.
    let mut cells: Vec<((u32, usize), u64)> = joint.into_iter().collect();
    cells.sort_unstable_by_key(|&(cell, _)| cell);

    let mut mi = 0.0;
    for ((value, class), n_vc) in cells {
        let n_vc = n_vc as f64;
        let a = value_totals.get(&value).copied().unwrap_or(1) as f64;
        let b = class_totals[class] as f64;
        mi += (n_vc / n) * ((n_vc * n) / (a * b)).ln();
    }
    mi.max(0.0)
}
