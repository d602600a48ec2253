//! Chemical language vectorization for SMILES strings.
//!
//! SMILES strings are split into lexical tokens, expanded into n-gram terms and
//! filtered through a vocabulary chosen by mutual information against labels.
//! A fitted encoder then maps each string to a fixed-width vector: term counts
//! (`bow`), a topic distribution (`lda`) or a paragraph vector (`embedding`).
//!
//! ```no_run
//! use rustmolvec::{ChemicalLanguageModel, Hyperparameters, LabelMatrix, VectorAlgo};
//!
//! # fn main() -> rustmolvec::Result<()> {
//! let unlabeled = vec!["CCO", "CCN", "CCCl", "CCBr", "OCCO"];
//! let smiles = vec!["CCCl", "CCCCl", "CCO", "CCN"];
//! let labels = LabelMatrix::from_columns([("active", vec![1.0, 1.0, 0.0, 0.0])])?;
//!
//! let mut model = ChemicalLanguageModel::new(Hyperparameters::with_algo(VectorAlgo::Bow))?;
//! model.fit(&unlabeled, &smiles, &labels)?;
//! let vectors = model.transform(&["ClCCO"])?;
//! assert_eq!(vectors.nrows(), 1);
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod bow;
pub mod cache;
pub mod config;
pub mod constants;
pub mod corpus;
pub mod document;
pub mod embedding;
pub mod encoder;
mod encoding;
pub mod error;
pub mod labels;
pub mod model;
#[cfg(feature = "python")]
pub mod python;
pub mod selection;
pub mod tokenizer;
pub mod topic;
mod training;
pub mod vocabulary;

pub use analyzer::Analyzer;
pub use cache::{MemoryCache, ModelCache, NullCache};
pub use config::{Hyperparameters, VectorAlgo};
pub use corpus::{Corpus, ReplayableCorpus};
pub use document::Document;
pub use encoder::{Encoder, FittedEncoder};
pub use error::{Result, VectorizerError};
pub use labels::LabelMatrix;
pub use model::{ChemicalLanguageModel, FittedModel};
pub use selection::VocabularySelector;
pub use tokenizer::{tokenize, TokenizedMolecule};
pub use vocabulary::Vocabulary;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Chemical language vectorization with Python bindings
#[cfg(feature = "python")]
#[pymodule]
fn rustmolvec(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();
    m.add_class::<python::ChemicalLanguage>()?;
    m.add_function(wrap_pyfunction!(python::tokenize_py, m)?)?;
    Ok(())
}
