//! Row-aligned label columns used to rank vocabulary candidates.

use ahash::AHashMap;
use compact_str::CompactString;

use crate::error::{Result, VectorizerError};

/// Named label columns sharing one row count.
///
/// Row `i` of every column belongs to document `i` of the labeled corpus.
/// Each distinct value of a column is one class for mutual information, so
/// continuous scores should be thresholded first (see
/// [`LabelMatrix::with_threshold_column`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelMatrix {
    names: Vec<CompactString>,
    columns: Vec<Vec<f64>>,
    n_rows: usize,
}

impl LabelMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, values)` pairs.
    pub fn from_columns<N, I>(columns: I) -> Result<Self>
    where
        N: AsRef<str>,
        I: IntoIterator<Item = (N, Vec<f64>)>,
    {
        let mut labels = Self::new();
        for (name, values) in columns {
            labels.push_column(name.as_ref(), values)?;
        }
        Ok(labels)
    }

    /// Append a column. Its length must match the existing columns and its name must be new.
    pub fn push_column(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if !self.columns.is_empty() && values.len() != self.n_rows {
            return Err(VectorizerError::Configuration(format!(
                "Label column '{}' has {} rows, expected {}",
                name,
                values.len(),
                self.n_rows
            )));
        }
        if self.column(name).is_some() {
            return Err(VectorizerError::Configuration(format!(
                "Duplicate label column '{}'",
                name
            )));
        }
        self.n_rows = values.len();
        self.names.push(CompactString::from(name));
        self.columns.push(values);
        Ok(())
    }

    /// Add a binary column: `1.0` where `source > threshold`, else `0.0`.
    pub fn with_threshold_column(
        mut self,
        name: &str,
        source: &str,
        threshold: f64,
    ) -> Result<Self> {
        let binary: Vec<f64> = self
            .column(source)
            .ok_or_else(|| {
                VectorizerError::Configuration(format!("Unknown label column '{}'", source))
            })?
            .iter()
            .map(|&v| if v > threshold { 1.0 } else { 0.0 })
            .collect();
        if let Some(pos) = self.names.iter().position(|n| n == name) {
            self.columns[pos] = binary;
        } else {
            self.push_column(name, binary)?;
        }
        Ok(self)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// Columns in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[f64])> + '_ {
        self.names
            .iter()
            .map(|n| n.as_str())
            .zip(self.columns.iter().map(|c| c.as_slice()))
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[inline]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }
}

/// Map each row of a column to a dense class index. Values are compared bitwise
/// (with `-0.0` folded into `0.0`); class order follows first appearance.
pub(crate) fn class_indices(values: &[f64]) -> (Vec<usize>, usize) {
    let mut seen: AHashMap<u64, usize> = AHashMap::new();
    let mut classes = Vec::with_capacity(values.len());
    for &v in values {
        let bits = if v == 0.0 { 0u64 } else { v.to_bits() };
        let next = seen.len();
        classes.push(*seen.entry(bits).or_insert(next));
    }
    (classes, seen.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_columns() {
        let labels =
            LabelMatrix::from_columns([("a", vec![0.0, 1.0]), ("b", vec![1.0, 1.0])]).unwrap();
        assert_eq!(labels.n_rows(), 2);
        assert_eq!(labels.n_columns(), 2);
        assert_eq!(labels.column("b"), Some(&[1.0, 1.0][..]));
        assert!(labels.column("c").is_none());
        let names: Vec<_> = labels.columns().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_misaligned_column_rejected() {
        let result = LabelMatrix::from_columns([("a", vec![0.0, 1.0]), ("b", vec![1.0])]);
        assert!(matches!(result, Err(VectorizerError::Configuration(_))));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let result = LabelMatrix::from_columns([("a", vec![0.0]), ("a", vec![1.0])]);
        assert!(result.is_err());
    }

    #[test]
    fn test_threshold_column() {
        let labels = LabelMatrix::from_columns([("toxicity", vec![0.1, 0.5, 0.18])])
            .unwrap()
            .with_threshold_column("toxic", "toxicity", 0.18)
            .unwrap();
        assert_eq!(labels.column("toxic"), Some(&[0.0, 1.0, 0.0][..]));

        // Overwriting the source in place keeps the column count.
        let labels = labels
            .with_threshold_column("toxicity", "toxicity", 0.18)
            .unwrap();
        assert_eq!(labels.n_columns(), 2);
        assert_eq!(labels.column("toxicity"), Some(&[0.0, 1.0, 0.0][..]));
    }

    #[test]
    fn test_class_indices() {
        let (classes, n) = class_indices(&[1.0, 0.0, -0.0, 2.5, 1.0]);
        assert_eq!(classes, vec![0, 1, 1, 2, 0]);
        assert_eq!(n, 3);
    }
}
