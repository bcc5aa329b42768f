//! Two-way contingency tables.

use std::{collections::HashMap, sync::Arc};

use arrow::{
    array::{ArrayRef, Int64Array, RecordBatch, StringArray},
    datatypes::{DataType, Field, Schema},
};

use crate::{
    cell::{CellValue, ColumnValues},
    error::{Error, Result},
    group,
    tabyl::{na_label, Tabulator, Tabyl, TabylKind},
};

/// Build a two-way contingency table from two decoded columns of equal
/// length.
pub(crate) fn build(opts: &Tabulator, row: ColumnValues, col: ColumnValues) -> Result<Tabyl> {
    if row.len() != col.len() {
        return Err(Error::length_mismatch(format!(
            "row variable '{}' has {} rows, column variable '{}' has {}",
            row.name,
            row.len(),
            col.name,
            col.len()
        )));
    }

    let (row, col) = if opts.na_shown() {
        (row, col)
    } else {
        let keep: Vec<usize> = (0..row.len())
            .filter(|&i| row.values[i].is_some() && col.values[i].is_some())
            .collect();
        let mut row = row.project(&keep);
        let mut col = col.project(&keep);
        // The filtered columns hold no missing cells, so a declared null
        // level must not resurface as an all-zero missing axis entry.
        row.levels = row.levels.take().map(|l| l.with_explicit_na(false));
        col.levels = col.levels.take().map(|l| l.with_explicit_na(false));
        (row, col)
    };

    // Soft condition: nothing to tabulate. Report and return a valid
    // zero-row table instead of failing.
    if row.is_empty() {
        log::info!(
            "two-way tabulation of '{}' by '{}' has no rows after missing-value filtering",
            row.name,
            col.name
        );
        return empty_result(&row, &col);
    }

    let surviving = row.len() as i64;
    let counted = group::count_columns(&[&row, &col], opts.levels_expanded())?;

    let mut counts: HashMap<(Option<CellValue>, Option<CellValue>), i64> = HashMap::new();
    for group in counted.rows {
        if let Some(second) = group.second {
            counts.insert((group.first, second), group.count);
        }
    }

    let value_array = row.build_array(&counted.first_axis)?;
    let mut fields = vec![Field::new(&row.name, value_array.data_type().clone(), true)];
    let mut columns: Vec<ArrayRef> = vec![value_array];

    let observed_labels: Vec<String> = std::iter::once(row.name.clone())
        .chain(counted.second_axis.iter().flatten().map(CellValue::label))
        .collect();
    let missing_label = na_label(&observed_labels);

    let mut cell_total = 0i64;
    for key in &counted.second_axis {
        let label = key.as_ref().map(CellValue::label).unwrap_or_else(|| missing_label.clone());
        let column: Vec<i64> = counted
            .first_axis
            .iter()
            .map(|row_key| {
                counts
                    .get(&(row_key.clone(), key.clone()))
                    .copied()
                    .unwrap_or(0)
            })
            .collect();
        cell_total += column.iter().sum::<i64>();
        fields.push(Field::new(label, DataType::Int64, false));
        columns.push(Arc::new(Int64Array::from(column)));
    }
    debug_assert_eq!(cell_total, surviving);

    let table = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
    Ok(Tabyl {
        table,
        kind: TabylKind::TwoWay {
            row_var: row.name,
            col_var: col.name,
        },
    })
}

/// Zero-row two-column result: row variable typed per its source column,
/// column variable as text.
fn empty_result(row: &ColumnValues, col: &ColumnValues) -> Result<Tabyl> {
    let value_array = row.build_array(&[])?;
    let fields = vec![
        Field::new(&row.name, value_array.data_type().clone(), true),
        Field::new(&col.name, DataType::Utf8, true),
    ];
    let columns: Vec<ArrayRef> = vec![value_array, Arc::new(StringArray::from(Vec::<&str>::new()))];
    let table = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
    Ok(Tabyl {
        table,
        kind: TabylKind::TwoWay {
            row_var: row.name.clone(),
            col_var: col.name.clone(),
        },
    })
}
