//! One-way frequency tables.

use std::sync::Arc;

use arrow::{
    array::{ArrayRef, Float64Array, Int64Array, RecordBatch},
    datatypes::{DataType, Field, Schema},
};

use crate::{
    cell::{CellValue, ColumnValues},
    error::Result,
    group,
    tabyl::{guarded_name, Tabulator, Tabyl, TabylKind},
};

/// Build a one-way frequency table for a decoded column.
pub(crate) fn build(opts: &Tabulator, col: &ColumnValues) -> Result<Tabyl> {
    let var = col.name.clone();

    // An empty input yields an empty, well-typed table rather than a
    // single degenerate row.
    if col.is_empty() {
        return assemble(&var, col, &[], &[], &[], None);
    }

    let counted = group::count_columns(&[col], opts.levels_expanded())?;
    let mut rows: Vec<(Option<CellValue>, i64)> = counted
        .rows
        .into_iter()
        .map(|r| (r.first, r.count))
        .collect();

    let na_count: i64 = rows
        .iter()
        .filter(|(key, _)| key.is_none())
        .map(|(_, count)| count)
        .sum();

    if !opts.na_shown() {
        rows.retain(|(key, _)| key.is_some());
    }

    let total: i64 = rows.iter().map(|(_, count)| count).sum();
    let percent: Vec<f64> = rows
        .iter()
        .map(|(_, count)| ratio(*count, total))
        .collect();

    // valid_percent exists only when missing values are both present and
    // shown; its denominator excludes them and it is null on the missing
    // row itself.
    let valid = (opts.na_shown() && na_count > 0).then(|| {
        let valid_total = total - na_count;
        rows.iter()
            .map(|(key, count)| key.as_ref().map(|_| ratio(*count, valid_total)))
            .collect::<Vec<Option<f64>>>()
    });

    let keys: Vec<Option<CellValue>> = rows.iter().map(|(key, _)| key.clone()).collect();
    let counts: Vec<i64> = rows.iter().map(|(_, count)| *count).collect();
    assemble(&var, col, &keys, &counts, &percent, valid)
}

fn ratio(count: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

fn assemble(
    var: &str,
    col: &ColumnValues,
    keys: &[Option<CellValue>],
    counts: &[i64],
    percent: &[f64],
    valid: Option<Vec<Option<f64>>>,
) -> Result<Tabyl> {
    let value_array = col.build_array(keys)?;

    let mut fields = vec![
        Field::new(var, value_array.data_type().clone(), true),
        Field::new(guarded_name(var, "n"), DataType::Int64, false),
        Field::new(guarded_name(var, "percent"), DataType::Float64, false),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        value_array,
        Arc::new(Int64Array::from(counts.to_vec())),
        Arc::new(Float64Array::from(percent.to_vec())),
    ];
    if let Some(valid) = valid {
        fields.push(Field::new(
            guarded_name(var, "valid_percent"),
            DataType::Float64,
            true,
        ));
        columns.push(Arc::new(Float64Array::from(valid)));
    }

    let table = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
    Ok(Tabyl {
        table,
        kind: TabylKind::OneWay {
            var: var.to_string(),
        },
    })
}
