//! Constants shared by the analyzer, the vocabulary selector and the encoders.

/// Term extraction pattern applied to the space-joined token sentence.
/// Matches runs of:
/// - Letters and digits (atoms, aromatic atoms, ring numbers)
/// - Brackets and branches: [ ] ( )
/// - Bonds: - = # : ~ / $
/// - Charges, stereo and misc: + @ % . * ? > < etc.
///
/// Anything else (whitespace, `\`, quotes, braces) separates terms and is dropped.
pub const TERM_PATTERN: &str = r"[a-zA-Z0-9$&+,:;=?@_/~#\[\]|<>.^*()%!-]+";

/// Separator used when joining tokens into a sentence and terms into n-grams.
pub const NGRAM_SEPARATOR: char = ' ';

/// N-grams present in more than this fraction of labeled documents are pruned.
pub const MAX_DOCUMENT_FRACTION: f64 = 0.95;

/// N-grams present in fewer than this many labeled documents are pruned.
pub const MIN_DOCUMENT_COUNT: usize = 2;

/// Hard cap on features scored for mutual information.
pub const MAX_SCORED_FEATURES: usize = 100_000;

/// Number of full variational passes over the corpus when fitting topics.
pub const LDA_PASSES: usize = 10;

/// Maximum E-step iterations per document.
pub const LDA_ITERATIONS: usize = 50;

/// Mean absolute change in gamma below which the E-step stops early.
pub const LDA_GAMMA_THRESHOLD: f64 = 1e-3;

/// Shape and scale of the Gamma distribution seeding the topic-word matrix.
pub const LDA_INIT_SHAPE: f64 = 100.0;
pub const LDA_INIT_SCALE: f64 = 0.01;

/// Noise words drawn per positive example in the embedding model.
pub const NEGATIVE_SAMPLES: usize = 5;

/// Exponent applied to unigram counts for the noise distribution.
pub const NOISE_EXPONENT: f64 = 0.75;

/// Floor of the linearly decaying learning rate.
pub const MIN_LEARNING_RATE: f64 = 1e-4;

/// Documents per training shard. Fixed so results do not depend on worker count.
pub const TRAINING_SHARD_SIZE: usize = 256;

/// Cores left free for the caller when sizing the training pool.
pub const RESERVED_CORES: usize = 2;

/// Strings buffered from a corpus before encoding them in parallel.
pub const ENCODE_BUFFER_SIZE: usize = 8192;
