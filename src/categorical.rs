//! Declared category levels for dictionary-encoded columns.
//!
//! A [`Levels`] is the ordered level set of a categorical column. It is
//! captured when a dictionary column is decoded, survives grouping and
//! pivoting, and is reapplied when typed output columns are rebuilt, so
//! categorical identity is never silently lost. Levels may declare labels
//! that no row observes; tabulation can materialize those as zero-count
//! rows.

use std::{collections::BTreeSet, sync::Arc};

use arrow::array::{ArrayRef, DictionaryArray, Int32Array, StringArray};
use arrow::datatypes::Int32Type;

use crate::{
    cell::CellValue,
    error::{Error, Result},
};

/// Ordered level labels of a categorical column, plus whether missing is
/// itself a declared level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Levels {
    labels: Vec<String>,
    explicit_na: bool,
}

impl Levels {
    /// Create a level set from ordered labels.
    pub fn new(labels: Vec<String>) -> Self {
        Self {
            labels,
            explicit_na: false,
        }
    }

    /// Mark whether missing is a declared level.
    #[must_use]
    pub fn with_explicit_na(mut self, explicit_na: bool) -> Self {
        self.explicit_na = explicit_na;
        self
    }

    /// Ordered level labels.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// True when missing is a declared level.
    pub fn has_explicit_na(&self) -> bool {
        self.explicit_na
    }

    /// Position of a label in the declared order.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Infer a level set from observed cells: the distinct non-missing
    /// values in natural order, rendered as labels.
    pub fn infer(values: &[Option<CellValue>]) -> Self {
        let distinct: BTreeSet<&CellValue> = values.iter().flatten().collect();
        Self::new(distinct.into_iter().map(CellValue::label).collect())
    }

    /// Build a dictionary array over this level set from per-row labels.
    ///
    /// The dictionary values are exactly the declared levels, in declared
    /// order, so unobserved levels survive. Missing rows (or rows whose
    /// label is not a declared level) become null keys.
    ///
    /// # Errors
    ///
    /// Returns an error if Arrow rejects the constructed dictionary.
    pub fn apply(&self, labels: &[Option<String>]) -> Result<ArrayRef> {
        let keys: Int32Array = labels
            .iter()
            .map(|label| {
                label
                    .as_ref()
                    .and_then(|l| self.position(l))
                    .map(|p| p as i32)
            })
            .collect();
        let values = Arc::new(StringArray::from(self.labels.clone()));
        let dict = DictionaryArray::<Int32Type>::try_new(keys, values).map_err(Error::Arrow)?;
        Ok(Arc::new(dict))
    }
}

#[cfg(test)]
mod tests {
    use arrow::array::Array;

    use super::*;

    #[test]
    fn test_infer_natural_order() {
        let values = vec![
            Some(CellValue::Int(10)),
            Some(CellValue::Int(2)),
            None,
            Some(CellValue::Int(10)),
        ];
        let levels = Levels::infer(&values);
        assert_eq!(levels.labels(), &["2", "10"]);
        assert!(!levels.has_explicit_na());
    }

    #[test]
    fn test_position() {
        let levels = Levels::new(vec!["lo".into(), "med".into(), "hi".into()]);
        assert_eq!(levels.position("med"), Some(1));
        assert_eq!(levels.position("none"), None);
    }

    #[test]
    fn test_apply_keeps_unobserved_levels() {
        let levels = Levels::new(vec!["lo".into(), "med".into(), "hi".into()]);
        let arr = levels
            .apply(&[Some("med".into()), None, Some("lo".into())])
            .unwrap();
        let dict = arr
            .as_any()
            .downcast_ref::<DictionaryArray<Int32Type>>()
            .unwrap();

        let labels = dict
            .values()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(labels.len(), 3);
        assert_eq!(labels.value(2), "hi");

        assert_eq!(dict.keys().value(0), 1);
        assert!(dict.keys().is_null(1));
        assert_eq!(dict.keys().value(2), 0);
    }

    #[test]
    fn test_apply_unknown_label_becomes_null() {
        let levels = Levels::new(vec!["a".into()]);
        let arr = levels.apply(&[Some("zzz".into())]).unwrap();
        assert!(arr.is_null(0));
    }
}
