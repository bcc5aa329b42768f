//! Three-way tabulation: a two-way table per value of a third variable.

use std::{collections::HashSet, sync::Arc};

use arrow::{
    array::RecordBatch,
    datatypes::{Field, Schema},
};

use crate::{
    categorical::Levels,
    cell::{self, CellKind, ColumnValues},
    error::{Error, Result},
    tabyl::{na_label, two_way, Tabulator, Tabyl, TabylPartition},
};

/// Build one two-way table per distinct value of the split variable.
pub(crate) fn build(
    opts: &Tabulator,
    mut row: ColumnValues,
    mut col: ColumnValues,
    split: ColumnValues,
) -> Result<Vec<TabylPartition>> {
    if row.len() != split.len() || col.len() != split.len() {
        return Err(Error::length_mismatch(format!(
            "columns '{}', '{}', '{}' have lengths {}, {}, {}",
            row.name,
            col.name,
            split.name,
            row.len(),
            col.len(),
            split.len()
        )));
    }

    // The first column's identity is restored per partition after
    // pivoting, which can coerce it.
    let first_levels = row.levels.clone();
    let first_kind = row.kind;

    // Partition keys are plain text; the split variable's categorical
    // identity matters only for partition ordering.
    let split_keys: Vec<Option<String>> = split
        .values
        .iter()
        .map(|v| v.as_ref().map(|c| c.label()))
        .collect();

    let keys_in_order = partition_order(&split, &split_keys, opts.na_shown());
    // A split value literally named like the missing marker must stay
    // distinguishable from the missing partition itself.
    let observed_keys: Vec<String> = keys_in_order.iter().flatten().cloned().collect();
    let missing_key = na_label(&observed_keys);

    if opts.levels_expanded() {
        // Force both tabulated columns categorical before partitioning so
        // every partition expands the same level set.
        row.coerce_categorical();
        col.coerce_categorical();
    } else {
        row.strip_levels();
        col.strip_levels();
    }

    let mut partitions = Vec::with_capacity(keys_in_order.len());
    for key in keys_in_order {
        let rows: Vec<usize> = split_keys
            .iter()
            .enumerate()
            .filter(|(_, k)| **k == key)
            .map(|(i, _)| i)
            .collect();

        let tabyl = two_way::build(opts, row.project(&rows), col.project(&rows))?;
        let tabyl = restore_first_column(tabyl, first_levels.as_ref(), first_kind)?;
        partitions.push(TabylPartition {
            key: key.unwrap_or_else(|| missing_key.clone()),
            tabyl,
        });
    }

    Ok(partitions)
}

/// Ordered distinct partition keys: declared level order when the split
/// variable is categorical, first-observation order otherwise; the
/// missing partition last when shown, absent when hidden.
fn partition_order(
    split: &ColumnValues,
    keys: &[Option<String>],
    show_na: bool,
) -> Vec<Option<String>> {
    let observed: HashSet<&String> = keys.iter().flatten().collect();
    let has_na = keys.iter().any(|k| k.is_none());

    let mut ordered: Vec<Option<String>> = Vec::new();
    if let Some(levels) = &split.levels {
        for label in levels.labels() {
            if observed.contains(label) {
                ordered.push(Some(label.clone()));
            }
        }
        // Off-level values violate the upstream invariant; keep them so
        // partition row counts still conserve.
        let mut extras: Vec<&String> = observed
            .iter()
            .filter(|k| levels.position(k.as_str()).is_none())
            .copied()
            .collect();
        extras.sort();
        ordered.extend(extras.into_iter().map(|k| Some(k.clone())));
    } else {
        let mut seen: HashSet<&String> = HashSet::new();
        for key in keys.iter().flatten() {
            if seen.insert(key) {
                ordered.push(Some(key.clone()));
            }
        }
    }

    if show_na && has_na {
        ordered.push(None);
    }
    ordered
}

/// Reapply the first column's original type to a partition result.
fn restore_first_column(
    tabyl: Tabyl,
    levels: Option<&Levels>,
    kind: CellKind,
) -> Result<Tabyl> {
    let decoded = ColumnValues::from_array("first", tabyl.table.column(0))?;
    let labels: Vec<Option<String>> = decoded
        .values
        .iter()
        .map(|v| v.as_ref().map(|c| c.label()))
        .collect();

    let restored = match levels {
        Some(levels) => levels.apply(&labels)?,
        None => {
            let cells: Vec<Option<cell::CellValue>> = labels
                .iter()
                .map(|l| l.as_ref().map(|l| cell::parse_cell(kind, l)))
                .collect();
            cell::build_scalar_array(kind, &cells)
        }
    };

    let schema = tabyl.table.schema();
    let mut fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| f.as_ref().clone())
        .collect();
    let name = fields[0].name().clone();
    fields[0] = Field::new(name, restored.data_type().clone(), true);

    let mut columns = tabyl.table.columns().to_vec();
    columns[0] = restored;

    let table = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
    Ok(Tabyl {
        table,
        kind: tabyl.kind,
    })
}
