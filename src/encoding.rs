//! Map SMILES strings onto vocabulary ids.

use rayon::prelude::*;

use crate::analyzer::Analyzer;
use crate::constants::ENCODE_BUFFER_SIZE;
use crate::corpus::Corpus;
use crate::document::Document;
use crate::vocabulary::Vocabulary;

/// Encode a SMILES string into the ids of its in-vocabulary n-grams.
///
/// N-grams absent from the vocabulary are dropped silently.
pub(crate) fn encode(smiles: &str, analyzer: &Analyzer, vocabulary: &Vocabulary) -> Document {
    let ids = analyzer
        .analyze(smiles)
        .iter()
        .filter_map(|gram| vocabulary.get(gram))
        .collect();
    Document::new(ids)
}

/// Encode multiple SMILES strings in parallel using rayon.
pub(crate) fn batch_encode<S>(
    smiles_list: &[S],
    analyzer: &Analyzer,
    vocabulary: &Vocabulary,
) -> Vec<Document>
where
    S: AsRef<str> + Sync,
{
    smiles_list
        .par_iter()
        .map(|smi| encode(smi.as_ref(), analyzer, vocabulary))
        .collect()
}

/// Stream a corpus in fixed-size buffers, encoding each buffer in parallel.
pub(crate) fn encode_corpus<C>(
    corpus: &C,
    analyzer: &Analyzer,
    vocabulary: &Vocabulary,
) -> Vec<Document>
where
    C: Corpus + ?Sized,
{
    let mut docs = Vec::new();
    let mut buf: Vec<String> = Vec::with_capacity(ENCODE_BUFFER_SIZE);
    for smiles in corpus.documents() {
        buf.push(smiles.into_owned());
        if buf.len() >= ENCODE_BUFFER_SIZE {
            docs.extend(batch_encode(&buf, analyzer, vocabulary));
            buf.clear();
        }
    }
    if !buf.is_empty() {
        docs.extend(batch_encode(&buf, analyzer, vocabulary));
    }
    log::debug!("Encoded {} documents against the vocabulary", docs.len());
    docs
}

#[cfg(test)]
mod tests {
    use super::*;
    use compact_str::CompactString;

    fn setup() -> (Analyzer, Vocabulary) {
        let analyzer = Analyzer::new(2).unwrap();
        let vocabulary = Vocabulary::from_ranked([
            (CompactString::from("Cl"), 0.5),
            (CompactString::from("C O"), 0.4),
            (CompactString::from("O"), 0.3),
        ]);
        (analyzer, vocabulary)
    }

    #[test]
    fn test_encode_drops_unknown() {
        let (analyzer, vocabulary) = setup();
        // Unigrams C, C, O then bigrams "C C", "C O".
        assert_eq!(encode("CCO", &analyzer, &vocabulary).ids, vec![2, 1]);
        assert!(encode("NNN", &analyzer, &vocabulary).is_empty());
        assert!(encode("", &analyzer, &vocabulary).is_empty());
    }

    #[test]
    fn test_batch_encode_preserves_order() {
        let (analyzer, vocabulary) = setup();
        let docs = batch_encode(&["CCl", "N", "CO"], &analyzer, &vocabulary);
        assert_eq!(
            docs,
            vec![
                Document::new(vec![0]),
                Document::new(vec![]),
                Document::new(vec![2, 1])
            ]
        );
    }

    #[test]
    fn test_encode_corpus_matches_batch() {
        let (analyzer, vocabulary) = setup();
        let smiles = vec!["CCl", "OCO", "CCO"];
        assert_eq!(
            encode_corpus(&smiles, &analyzer, &vocabulary),
            batch_encode(&smiles, &analyzer, &vocabulary)
        );
    }
}
