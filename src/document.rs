//! Vocabulary-filtered documents and corpus-wide term counting.

use rayon::prelude::*;

/// The vocabulary ids of one input's retained n-grams, in analyzer order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Document {
    pub ids: Vec<u32>,
}

impl Document {
    #[inline]
    pub fn new(ids: Vec<u32>) -> Self {
        Self { ids }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// `(id, count)` pairs sorted by id.
    pub fn term_counts(&self) -> Vec<(u32, u32)> {
        let mut sorted = self.ids.clone();
        sorted.sort_unstable();
        let mut counts: Vec<(u32, u32)> = Vec::new();
        for id in sorted {
            match counts.last_mut() {
                Some((last, count)) if *last == id => *count += 1,
                _ => counts.push((id, 1)),
            }
        }
        counts
    }

    /// Ids within `window` positions of `pos`, excluding `pos` itself.
    pub fn context(&self, pos: usize, window: usize) -> impl Iterator<Item = u32> + '_ {
        let start = pos.saturating_sub(window);
        let end = (pos + window + 1).min(self.ids.len());
        self.ids[start..end]
            .iter()
            .enumerate()
            .filter(move |&(i, _)| start + i != pos)
            .map(|(_, &id)| id)
    }
}

/// Count every id across all documents in parallel.
pub(crate) fn count_terms_parallel(docs: &[Document], vocab_len: usize) -> Vec<u64> {
    docs.par_iter()
        .fold(
            || vec![0u64; vocab_len],
            |mut acc, doc| {
                for &id in &doc.ids {
                    acc[id as usize] += 1;
                }
                acc
            },
        )
        .reduce(
            || vec![0u64; vocab_len],
            |mut acc, local| {
                for (a, b) in acc.iter_mut().zip(local) {
                    *a += b;
                }
                acc
            },
        )
}
