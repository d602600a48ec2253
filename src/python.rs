//! Python bindings.

use std::collections::BTreeMap;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use serde_json::{Map, Number, Value};

use crate::config::Hyperparameters;
use crate::error::VectorizerError;
use crate::labels::LabelMatrix;
use crate::model::ChemicalLanguageModel;
use crate::tokenizer::tokenize;

impl From<VectorizerError> for PyErr {
    fn from(err: VectorizerError) -> Self {
        match err {
            VectorizerError::Configuration(_) => PyValueError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}

/// Keyword arguments on top of the default hyperparameters.
fn hyperparameters_from_kwargs(kwargs: Option<&Bound<'_, PyDict>>) -> PyResult<Hyperparameters> {
    let mut fields = Map::new();
    if let Some(kwargs) = kwargs {
        for (key, value) in kwargs.iter() {
            let key: String = key.extract()?;
            let json = if let Ok(v) = value.extract::<u64>() {
                Value::from(v)
            } else if let Ok(v) = value.extract::<f64>() {
                Number::from_f64(v).map(Value::Number).ok_or_else(|| {
                    PyValueError::new_err(format!("{} must be a finite number", key))
                })?
            } else if let Ok(v) = value.extract::<String>() {
                Value::String(v)
            } else {
                return Err(PyValueError::new_err(format!(
                    "Unsupported value for hyperparameter '{}'",
                    key
                )));
            };
            fields.insert(key, json);
        }
    }
    Ok(Hyperparameters::from_json(&Value::Object(fields).to_string())?)
}

/// Tokenize a SMILES string into lexical tokens.
#[pyfunction]
#[pyo3(name = "tokenize")]
pub fn tokenize_py(smiles: &str) -> Vec<String> {
    tokenize(smiles).into_iter().map(|t| t.to_string()).collect()
}

/// A chemical language model vectorizing SMILES strings.
#[pyclass(module = "rustmolvec")]
pub struct ChemicalLanguage {
    inner: ChemicalLanguageModel,
}

#[pymethods]
impl ChemicalLanguage {
    #[new]
    #[pyo3(signature = (**hyperparameters))]
    pub fn new(hyperparameters: Option<&Bound<'_, PyDict>>) -> PyResult<Self> {
        let hyperparams = hyperparameters_from_kwargs(hyperparameters)?;
        Ok(Self {
            inner: ChemicalLanguageModel::new(hyperparams)?,
        })
    }

    /// Fit on an unlabeled corpus, selecting the vocabulary on labeled SMILES.
    ///
    /// # Arguments
    /// * `unlabeled` - SMILES strings the encoder learns from
    /// * `smiles` - Labeled SMILES strings
    /// * `labels` - Label name to one value per labeled string
    #[pyo3(signature = (unlabeled, smiles, labels))]
    pub fn fit(
        &mut self,
        py: Python<'_>,
        unlabeled: Vec<String>,
        smiles: Vec<String>,
        labels: BTreeMap<String, Vec<f64>>,
    ) -> PyResult<()> {
        let labels = LabelMatrix::from_columns(labels)?;
        let inner = &mut self.inner;
        py.detach(|| inner.fit(&unlabeled, &smiles, &labels))?;
        Ok(())
    }

    /// Vectorize SMILES strings, one row per input.
    pub fn transform(&self, py: Python<'_>, smiles: Vec<String>) -> PyResult<Vec<Vec<f64>>> {
        let inner = &self.inner;
        let matrix = py.detach(|| inner.transform(&smiles))?;
        Ok(matrix.outer_iter().map(|row| row.to_vec()).collect())
    }

    /// Output width, or None before fitting.
    #[getter]
    pub fn dim(&self) -> Option<usize> {
        self.inner.dim()
    }

    #[getter]
    pub fn is_fitted(&self) -> bool {
        self.inner.is_ready()
    }

    #[getter]
    pub fn cache_key(&self) -> String {
        self.inner.cache_key()
    }

    /// Hyperparameters as a JSON object string.
    pub fn hyperparameters(&self) -> PyResult<String> {
        Ok(self.inner.hyperparams().to_json()?)
    }

    /// Selected n-grams with their ids, in id order.
    pub fn vocabulary(&self) -> PyResult<Vec<(String, u32)>> {
        self.inner
            .fitted()
            .map(|model| model.vocabulary().entries())
            .ok_or_else(|| PyRuntimeError::new_err("Model is not fitted"))
    }

    fn __repr__(&self) -> String {
        let hp = self.inner.hyperparams();
        format!(
            "ChemicalLanguage(vector_algo='{}', max_ngram={}, max_vocab={}, fitted={})",
            hp.vector_algo,
            hp.max_ngram,
            hp.max_vocab,
            self.inner.is_ready()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VectorAlgo;

    #[test]
    fn test_kwargs_override_defaults() {
        pyo3::Python::initialize();

        Python::attach(|py| {
            let kwargs = PyDict::new(py);
            kwargs.set_item("vector_algo", "lda").unwrap();
            kwargs.set_item("topics", 8).unwrap();
            kwargs.set_item("learning_rate", 0.1).unwrap();

            let hp = hyperparameters_from_kwargs(Some(&kwargs)).unwrap();
            assert_eq!(hp.vector_algo, VectorAlgo::Lda);
            assert_eq!(hp.topics, 8);
            assert_eq!(hp.learning_rate, 0.1);
            assert_eq!(hp.max_vocab, Hyperparameters::default().max_vocab);

            assert_eq!(hyperparameters_from_kwargs(None).unwrap(), Hyperparameters::default());
        });
    }

    #[test]
    fn test_bad_kwargs_raise_value_error() {
        pyo3::Python::initialize();

        Python::attach(|py| {
            let kwargs = PyDict::new(py);
            kwargs.set_item("vector_algo", "word2vec").unwrap();
            let err = hyperparameters_from_kwargs(Some(&kwargs)).unwrap_err();
            assert!(err.is_instance_of::<PyValueError>(py));

            let kwargs = PyDict::new(py);
            kwargs.set_item("no_such_field", 1).unwrap();
            let err = hyperparameters_from_kwargs(Some(&kwargs)).unwrap_err();
            assert!(err.is_instance_of::<PyValueError>(py));
        });
    }

    #[test]
    fn test_tokenize_py() {
        assert_eq!(tokenize_py("CCl"), vec!["C", "Cl"]);
    }
}
