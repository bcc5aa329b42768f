//! Frequency tabulation ("tabyl") over Arrow batches.
//!
//! Builds 1-, 2-, or 3-way contingency tables from batch columns or a
//! standalone array. Missing-value handling (`show_na`) and missing
//! categorical levels (`show_missing_levels`) are configurable; every
//! result is tagged with its axis metadata so a downstream presentation
//! layer can label totals without re-deriving variable names.
//!
//! # Example
//!
//! ```ignore
//! use escoba::Tabulator;
//!
//! let freq = Tabulator::new().one_way(&batch, "species")?;
//! let cross = Tabulator::new().show_na(false).two_way(&batch, "species", "habitat")?;
//! let per_site = Tabulator::new().three_way(&batch, "species", "habitat", "site")?;
//! ```

mod one_way;
mod three_way;
mod two_way;

use arrow::array::{ArrayRef, RecordBatch};
use serde::{Deserialize, Serialize};

use crate::{
    cell::ColumnValues,
    error::{Error, Result},
    selector::ColumnSelector,
};

/// Reserved result-column names that a tabulated variable must not
/// shadow. Checked once at result assembly.
pub const RESERVED_NAMES: &[&str] = &["n", "percent", "valid_percent"];

/// Label of the dedicated missing-value output column and of the missing
/// partition in three-way results. Uniquified with trailing underscores
/// when a real value collides with it.
pub const NA_LABEL: &str = "NA_";

/// Disambiguate a reserved output column against the tabulated variable's
/// own name (`n` tabulated as a variable yields an `n_n` count column).
pub(crate) fn guarded_name(var: &str, reserved: &str) -> String {
    debug_assert!(RESERVED_NAMES.contains(&reserved));
    if var == reserved {
        format!("{reserved}_{reserved}")
    } else {
        reserved.to_string()
    }
}

/// Missing-marker label that collides with no existing name.
pub(crate) fn na_label(existing: &[String]) -> String {
    let mut label = NA_LABEL.to_string();
    while existing.iter().any(|name| name == &label) {
        label.push('_');
    }
    label
}

/// Axis metadata attached to every tabulation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabylKind {
    /// One-way frequency table.
    OneWay {
        /// Tabulated variable name.
        var: String,
    },
    /// Two-way contingency table.
    TwoWay {
        /// Row variable name.
        row_var: String,
        /// Column variable name.
        col_var: String,
    },
}

impl TabylKind {
    /// Number of tabulated axes.
    pub fn axes(&self) -> usize {
        match self {
            Self::OneWay { .. } => 1,
            Self::TwoWay { .. } => 2,
        }
    }
}

/// A tabulation result: the table plus its axis metadata.
#[derive(Debug, Clone)]
pub struct Tabyl {
    /// The result table.
    pub table: RecordBatch,
    /// Axis metadata for downstream formatters.
    pub kind: TabylKind,
}

impl Tabyl {
    /// True when the result has no data rows (the two-way soft condition
    /// or an empty one-way input).
    pub fn is_empty(&self) -> bool {
        self.table.num_rows() == 0
    }
}

/// One partition of a three-way tabulation, keyed by the third variable's
/// value. The missing partition is keyed [`NA_LABEL`], uniquified against
/// the observed split values.
#[derive(Debug, Clone)]
pub struct TabylPartition {
    /// Third variable's value for this partition, as text.
    pub key: String,
    /// Two-way table for the partition.
    pub tabyl: Tabyl,
}

/// Output of the arity dispatch: a closed set of operation variants.
#[derive(Debug, Clone)]
pub enum TabylOutput {
    /// One grouping column.
    OneWay(Tabyl),
    /// Two grouping columns.
    TwoWay(Tabyl),
    /// Three grouping columns.
    ThreeWay(Vec<TabylPartition>),
}

impl TabylOutput {
    /// Number of tabulated axes.
    pub fn axes(&self) -> usize {
        match self {
            Self::OneWay(_) => 1,
            Self::TwoWay(_) => 2,
            Self::ThreeWay(_) => 3,
        }
    }
}

/// Tabulation options and entry points.
///
/// Both options default to `true`: missing values get their own row,
/// column, or partition, and declared-but-unobserved categorical levels
/// are materialized with zero counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tabulator {
    show_na: bool,
    show_missing_levels: bool,
}

impl Default for Tabulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Tabulator {
    /// Create a tabulator with default options.
    pub fn new() -> Self {
        Self {
            show_na: true,
            show_missing_levels: true,
        }
    }

    /// Whether missing values appear in the output (default `true`).
    /// When `false`, rows with missing keys are dropped before counting
    /// and percentages are computed over the remainder.
    #[must_use]
    pub fn show_na(mut self, show: bool) -> Self {
        self.show_na = show;
        self
    }

    /// Whether declared-but-unobserved categorical levels appear with
    /// zero counts (default `true`).
    #[must_use]
    pub fn show_missing_levels(mut self, show: bool) -> Self {
        self.show_missing_levels = show;
        self
    }

    pub(crate) fn na_shown(&self) -> bool {
        self.show_na
    }

    pub(crate) fn levels_expanded(&self) -> bool {
        self.show_missing_levels
    }

    /// One-way frequency table of a batch column.
    ///
    /// # Errors
    ///
    /// Fails when the selector is unresolved or the column type is
    /// unsupported.
    pub fn one_way(
        &self,
        batch: &RecordBatch,
        var: impl Into<ColumnSelector>,
    ) -> Result<Tabyl> {
        let col = ColumnValues::from_batch(batch, &var.into())?;
        one_way::build(self, &col)
    }

    /// One-way frequency table of a bare array. The array has no inherent
    /// name, so the caller supplies the variable name used in the output.
    ///
    /// # Errors
    ///
    /// Fails when the array type is unsupported.
    pub fn one_way_values(&self, values: &ArrayRef, name: &str) -> Result<Tabyl> {
        let col = ColumnValues::from_array(name, values)?;
        one_way::build(self, &col)
    }

    /// Two-way contingency table (row variable x column variable).
    ///
    /// A filtered input with zero rows is not an error: a structurally
    /// valid zero-row table is returned and an informational notice is
    /// logged.
    ///
    /// # Errors
    ///
    /// Fails when a selector is unresolved or a column type is
    /// unsupported.
    pub fn two_way(
        &self,
        batch: &RecordBatch,
        row_var: impl Into<ColumnSelector>,
        col_var: impl Into<ColumnSelector>,
    ) -> Result<Tabyl> {
        let row = ColumnValues::from_batch(batch, &row_var.into())?;
        let col = ColumnValues::from_batch(batch, &col_var.into())?;
        two_way::build(self, row, col)
    }

    /// Three-way tabulation: one two-way table per distinct value of the
    /// third variable, in declared-level order when the third variable is
    /// categorical, first-observation order otherwise, missing last.
    ///
    /// # Errors
    ///
    /// Fails when a selector is unresolved or a column type is
    /// unsupported.
    pub fn three_way(
        &self,
        batch: &RecordBatch,
        row_var: impl Into<ColumnSelector>,
        col_var: impl Into<ColumnSelector>,
        split_var: impl Into<ColumnSelector>,
    ) -> Result<Vec<TabylPartition>> {
        let row = ColumnValues::from_batch(batch, &row_var.into())?;
        let col = ColumnValues::from_batch(batch, &col_var.into())?;
        let split = ColumnValues::from_batch(batch, &split_var.into())?;
        three_way::build(self, row, col, split)
    }

    /// Dispatch by selector count to the matching tabulation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingArguments`] for zero or more than three
    /// selectors, plus any error of the dispatched call.
    pub fn tabulate(
        &self,
        batch: &RecordBatch,
        selectors: &[ColumnSelector],
    ) -> Result<TabylOutput> {
        match selectors {
            [a] => Ok(TabylOutput::OneWay(self.one_way(batch, a.clone())?)),
            [a, b] => Ok(TabylOutput::TwoWay(
                self.two_way(batch, a.clone(), b.clone())?,
            )),
            [a, b, c] => Ok(TabylOutput::ThreeWay(self.three_way(
                batch,
                a.clone(),
                b.clone(),
                c.clone(),
            )?)),
            other => Err(Error::missing_arguments(other.len())),
        }
    }
}
