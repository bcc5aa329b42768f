//! Group counting over one or two columns.
//!
//! This is the engine underneath tabulation: it partitions rows by their
//! cell values (missing is a distinct key, never dropped here), counts
//! members per group, and emits the counts in long form with a fully
//! deterministic order. When level expansion is on and a grouped column is
//! categorical, the cross product of declared levels and the other
//! column's values is materialized with zero counts for unobserved
//! combinations.

use std::collections::{BTreeSet, HashMap, HashSet};

use arrow::array::RecordBatch;

use crate::{
    cell::{CellValue, ColumnValues},
    error::{Error, Result},
    selector::ColumnSelector,
};

/// One long-form group row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCount {
    /// First column's key (`None` for missing).
    pub first: Option<CellValue>,
    /// Second column's key, absent entirely for one-column grouping.
    pub second: Option<Option<CellValue>>,
    /// Number of rows in the group (zero only for expanded level
    /// combinations).
    pub count: i64,
}

/// Ordered long-form group counts, plus the ordered distinct values of
/// each grouped column.
#[derive(Debug, Clone)]
pub struct GroupedCounts {
    /// Long-form rows in output order.
    pub rows: Vec<GroupCount>,
    /// Ordered distinct values of the first column (missing last).
    pub first_axis: Vec<Option<CellValue>>,
    /// Ordered distinct values of the second column; empty for one-column
    /// grouping.
    pub second_axis: Vec<Option<CellValue>>,
}

impl GroupedCounts {
    /// Total of all group counts.
    pub fn total(&self) -> i64 {
        self.rows.iter().map(|r| r.count).sum()
    }
}

/// Count groups over one or two selected columns of a batch.
///
/// # Errors
///
/// Fails when a selector is unresolved, a selected column has an
/// unsupported type, or the selector count is not one or two.
pub fn count_groups(
    batch: &RecordBatch,
    selectors: &[ColumnSelector],
    show_missing_levels: bool,
) -> Result<GroupedCounts> {
    let cols = selectors
        .iter()
        .map(|s| ColumnValues::from_batch(batch, s))
        .collect::<Result<Vec<_>>>()?;
    let refs: Vec<&ColumnValues> = cols.iter().collect();
    count_columns(&refs, show_missing_levels)
}

/// Count groups over already-decoded columns.
pub(crate) fn count_columns(cols: &[&ColumnValues], expand: bool) -> Result<GroupedCounts> {
    match cols {
        [col] => Ok(count_one(col, expand)),
        [first, second] => {
            if first.len() != second.len() {
                return Err(Error::length_mismatch(format!(
                    "column '{}' has {} rows, column '{}' has {}",
                    first.name,
                    first.len(),
                    second.name,
                    second.len()
                )));
            }
            Ok(count_two(first, second, expand))
        }
        other => Err(Error::missing_arguments(other.len())),
    }
}

fn count_one(col: &ColumnValues, expand: bool) -> GroupedCounts {
    let mut counts: HashMap<&Option<CellValue>, i64> = HashMap::new();
    for value in &col.values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let axis = axis_values(col, expand);
    let keep_zeros = expand && col.levels.is_some();
    let rows = axis
        .iter()
        .filter_map(|key| {
            let count = counts.get(key).copied().unwrap_or(0);
            (keep_zeros || count > 0).then(|| GroupCount {
                first: key.clone(),
                second: None,
                count,
            })
        })
        .collect();

    GroupedCounts {
        rows,
        first_axis: axis,
        second_axis: Vec::new(),
    }
}

fn count_two(first: &ColumnValues, second: &ColumnValues, expand: bool) -> GroupedCounts {
    let mut counts: HashMap<(&Option<CellValue>, &Option<CellValue>), i64> = HashMap::new();
    for (a, b) in first.values.iter().zip(&second.values) {
        *counts.entry((a, b)).or_insert(0) += 1;
    }

    let first_axis = axis_values(first, expand);
    let second_axis = axis_values(second, expand);
    // The cross product is only materialized when a categorical column
    // contributes declared levels; otherwise zero combinations are elided.
    let keep_zeros = expand && (first.levels.is_some() || second.levels.is_some());

    let mut rows = Vec::new();
    for a in &first_axis {
        for b in &second_axis {
            let count = counts.get(&(a, b)).copied().unwrap_or(0);
            if keep_zeros || count > 0 {
                rows.push(GroupCount {
                    first: a.clone(),
                    second: Some(b.clone()),
                    count,
                });
            }
        }
    }

    GroupedCounts {
        rows,
        first_axis,
        second_axis,
    }
}

/// Ordered distinct values of a column: declared level order for
/// categorical columns (all levels when expanding, observed ones
/// otherwise), natural value order for everything else, missing last.
fn axis_values(col: &ColumnValues, expand: bool) -> Vec<Option<CellValue>> {
    let has_na = col.values.iter().any(|v| v.is_none());
    let mut axis: Vec<Option<CellValue>> = Vec::new();

    if let Some(levels) = &col.levels {
        let observed: HashSet<&str> = col
            .values
            .iter()
            .flatten()
            .map(|v| match v {
                CellValue::Text(s) => s.as_str(),
                _ => "",
            })
            .collect();
        for label in levels.labels() {
            if expand || observed.contains(label.as_str()) {
                axis.push(Some(CellValue::Text(label.clone())));
            }
        }
        // Values outside the declared levels violate the upstream
        // invariant; keep them anyway so counts still conserve.
        let undeclared: BTreeSet<&str> = observed
            .into_iter()
            .filter(|label| !label.is_empty() && levels.position(label).is_none())
            .collect();
        axis.extend(
            undeclared
                .into_iter()
                .map(|label| Some(CellValue::Text(label.to_string()))),
        );
        if has_na || (expand && levels.has_explicit_na()) {
            axis.push(None);
        }
    } else {
        let distinct: BTreeSet<&CellValue> = col.values.iter().flatten().collect();
        axis.extend(distinct.into_iter().map(|v| Some(v.clone())));
        if has_na {
            axis.push(None);
        }
    }

    axis
}
