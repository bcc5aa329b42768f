//! Duplicate-row detection.
//!
//! Groups records by a caller-chosen set of key columns and returns only
//! the rows belonging to groups with more than one member, annotated with
//! a per-group `dupe_count` column. With no key columns given, the whole
//! row is the key.

// Row indices fit u32; Arrow batches are bounded well below that here.
#![allow(clippy::cast_possible_truncation)]

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use arrow::{
    array::{ArrayRef, Int64Array, RecordBatch, UInt32Array},
    compute::take,
    datatypes::{DataType, Field, Schema},
};

use crate::{
    cell::{CellValue, ColumnValues},
    error::Result,
    selector::ColumnSelector,
};

/// Name of the per-group count column in the output.
pub const DUPE_COUNT: &str = "dupe_count";

/// Find duplicate rows by the given key columns.
///
/// The output batch holds the key columns first (under their selector
/// aliases), then [`DUPE_COUNT`], then the remaining input columns. Groups
/// are ordered by descending count, ties broken by key value with missing
/// keys last; rows keep their input order within a group. A batch with no
/// duplicates yields a valid zero-row result.
///
/// # Errors
///
/// Fails when a selector is unresolved or a key column's type is
/// unsupported for grouping.
pub fn find_dupes(batch: &RecordBatch, selectors: &[ColumnSelector]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let selectors: Vec<ColumnSelector> = if selectors.is_empty() {
        schema
            .fields()
            .iter()
            .map(|f| ColumnSelector::new(f.name()))
            .collect()
    } else {
        selectors.to_vec()
    };

    let key_indices: Vec<usize> = selectors
        .iter()
        .map(|s| s.resolve(&schema))
        .collect::<Result<_>>()?;
    let key_columns: Vec<ColumnValues> = selectors
        .iter()
        .map(|s| ColumnValues::from_batch(batch, s))
        .collect::<Result<_>>()?;

    let mut groups: HashMap<Vec<Option<CellValue>>, Vec<u32>> = HashMap::new();
    for row in 0..batch.num_rows() {
        let key: Vec<Option<CellValue>> = key_columns
            .iter()
            .map(|c| c.values[row].clone())
            .collect();
        groups.entry(key).or_default().push(row as u32);
    }

    let mut dupes: Vec<(Vec<Option<CellValue>>, Vec<u32>)> = groups
        .into_iter()
        .filter(|(_, rows)| rows.len() > 1)
        .collect();
    dupes.sort_by(|(ka, ra), (kb, rb)| {
        rb.len().cmp(&ra.len()).then_with(|| cmp_keys(ka, kb))
    });

    let mut indices: Vec<u32> = Vec::new();
    let mut counts: Vec<i64> = Vec::new();
    for (_, rows) in &dupes {
        for &row in rows {
            indices.push(row);
            counts.push(rows.len() as i64);
        }
    }
    let indices = UInt32Array::from(indices);

    // Key columns first (under their aliases), then the count, then the
    // rest of the input columns.
    let mut fields: Vec<Field> = Vec::new();
    let mut columns: Vec<ArrayRef> = Vec::new();
    for (selector, &index) in selectors.iter().zip(&key_indices) {
        let source = schema.field(index);
        fields.push(Field::new(
            selector.alias(),
            source.data_type().clone(),
            source.is_nullable(),
        ));
        columns.push(take(batch.column(index).as_ref(), &indices, None)?);
    }
    fields.push(Field::new(DUPE_COUNT, DataType::Int64, false));
    columns.push(Arc::new(Int64Array::from(counts)));
    for (index, field) in schema.fields().iter().enumerate() {
        if key_indices.contains(&index) {
            continue;
        }
        fields.push(field.as_ref().clone());
        columns.push(take(batch.column(index).as_ref(), &indices, None)?);
    }

    Ok(RecordBatch::try_new(
        Arc::new(Schema::new(fields)),
        columns,
    )?)
}

/// Key ordering: value order per cell, missing keys after present ones.
fn cmp_keys(a: &[Option<CellValue>], b: &[Option<CellValue>]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ord = match (x, y) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}
