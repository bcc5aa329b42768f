//! Column selectors.
//!
//! A selector names one existing column, optionally under a different
//! output alias (`alias -> source`). Resolution happens against the input
//! schema before any tabulation logic runs.

use arrow::datatypes::Schema;

use crate::error::{Error, Result};

/// A reference to one column of an input batch, with an output alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelector {
    alias: String,
    source: String,
}

impl ColumnSelector {
    /// Select a column under its own name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            source: name,
        }
    }

    /// Select `source` but name it `alias` in the output.
    pub fn renamed(alias: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            source: source.into(),
        }
    }

    /// Output name for the column.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Name of the column in the input schema.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Resolve to a column index in the schema.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ColumnNotFound`] when the source column does not
    /// exist.
    pub fn resolve(&self, schema: &Schema) -> Result<usize> {
        schema
            .fields()
            .iter()
            .position(|f| f.name() == &self.source)
            .ok_or_else(|| Error::column_not_found(&self.source))
    }
}

impl From<&str> for ColumnSelector {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ColumnSelector {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<(&str, &str)> for ColumnSelector {
    fn from((alias, source): (&str, &str)) -> Self {
        Self::renamed(alias, source)
    }
}

#[cfg(test)]
mod tests {
    use arrow::datatypes::{DataType, Field};

    use super::*;

    fn schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("species", DataType::Utf8, true),
        ])
    }

    #[test]
    fn test_resolve_bare() {
        let sel = ColumnSelector::from("species");
        assert_eq!(sel.alias(), "species");
        assert_eq!(sel.resolve(&schema()).unwrap(), 1);
    }

    #[test]
    fn test_resolve_renamed() {
        let sel = ColumnSelector::renamed("kind", "species");
        assert_eq!(sel.alias(), "kind");
        assert_eq!(sel.source(), "species");
        assert_eq!(sel.resolve(&schema()).unwrap(), 1);
    }

    #[test]
    fn test_resolve_missing() {
        let sel = ColumnSelector::from("habitat");
        let err = sel.resolve(&schema()).unwrap_err();
        assert!(err.to_string().contains("habitat"));
    }
}
