//! Integration tests for escoba.

#![allow(clippy::cast_precision_loss, clippy::uninlined_format_args)]

use std::sync::Arc;

use arrow::{
    array::{
        Array, ArrayRef, DictionaryArray, Float64Array, Int32Array, Int64Array, RecordBatch,
        StringArray,
    },
    datatypes::{DataType, Field, Int32Type, Schema},
};
use escoba::{find_dupes, ColumnSelector, Error, Tabulator, Tabyl, TabylKind, TabylOutput};
use proptest::prelude::*;

fn dict(keys: Vec<Option<i32>>, labels: Vec<&str>) -> ArrayRef {
    let array = DictionaryArray::<Int32Type>::try_new(
        Int32Array::from(keys),
        Arc::new(StringArray::from(labels)),
    )
    .unwrap();
    Arc::new(array)
}

fn dict_field(name: &str) -> Field {
    Field::new(
        name,
        DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8)),
        true,
    )
}

/// Six observations with missing values in both text columns, a grade
/// factor with an unobserved level, and a phase factor observed out of
/// declared order.
fn sample_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("species", DataType::Utf8, true),
        Field::new("habitat", DataType::Utf8, true),
        dict_field("grade"),
        dict_field("phase"),
    ]));
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec![
                Some("cat"),
                Some("cat"),
                Some("dog"),
                None,
                Some("cat"),
                Some("dog"),
            ])),
            Arc::new(StringArray::from(vec![
                Some("wood"),
                Some("urban"),
                None,
                Some("wood"),
                Some("wood"),
                Some("urban"),
            ])),
            dict(
                vec![Some(0), Some(1), Some(0), Some(1), Some(1), Some(0)],
                vec!["lo", "med", "hi"],
            ),
            dict(
                vec![Some(2), Some(0), Some(2), Some(0), Some(2), Some(0)],
                vec!["I", "II", "III"],
            ),
        ],
    )
    .unwrap()
}

fn counts(tabyl: &Tabyl) -> Vec<i64> {
    tabyl
        .table
        .column(1)
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap()
        .iter()
        .map(|v| v.unwrap())
        .collect()
}

fn cell_total(tabyl: &Tabyl) -> i64 {
    (1..tabyl.table.num_columns())
        .map(|c| {
            tabyl
                .table
                .column(c)
                .as_any()
                .downcast_ref::<Int64Array>()
                .unwrap()
                .iter()
                .flatten()
                .sum::<i64>()
        })
        .sum()
}

#[test]
fn test_one_way_count_conservation() {
    let batch = sample_batch();

    let shown = Tabulator::new().one_way(&batch, "species").unwrap();
    assert_eq!(counts(&shown).iter().sum::<i64>(), 6);

    let hidden = Tabulator::new()
        .show_na(false)
        .one_way(&batch, "species")
        .unwrap();
    assert_eq!(counts(&hidden).iter().sum::<i64>(), 5);
}

#[test]
fn test_one_way_percent_sums_to_one() {
    let batch = sample_batch();
    for tabulator in [Tabulator::new(), Tabulator::new().show_na(false)] {
        let tabyl = tabulator.one_way(&batch, "species").unwrap();
        let sum: f64 = tabyl
            .table
            .column(2)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap()
            .iter()
            .flatten()
            .sum();
        assert!((sum - 1.0).abs() < 1e-12);
    }
}

#[test]
fn test_one_way_missing_row_last() {
    let values: ArrayRef = Arc::new(StringArray::from(vec![
        Some("a"),
        Some("a"),
        Some("b"),
        None,
    ]));
    let tabyl = Tabulator::new().one_way_values(&values, "x").unwrap();

    assert_eq!(counts(&tabyl), vec![2, 1, 1]);
    let col = tabyl
        .table
        .column(0)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(col.value(0), "a");
    assert_eq!(col.value(1), "b");
    assert!(col.is_null(2));
}

#[test]
fn test_unobserved_level_in_declared_position() {
    // Levels lo/med/hi with only lo and med observed: "hi" appears with
    // count 0 in row 3, not appended after the missing row.
    let values = dict(vec![Some(0), Some(1), Some(0), None], vec!["lo", "med", "hi"]);
    let tabyl = Tabulator::new().one_way_values(&values, "grade").unwrap();

    assert_eq!(counts(&tabyl), vec![2, 1, 0, 1]);
    let col = tabyl
        .table
        .column(0)
        .as_any()
        .downcast_ref::<DictionaryArray<Int32Type>>()
        .unwrap();
    let labels = col
        .values()
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(labels.value(col.keys().value(2) as usize), "hi");
    assert!(col.is_null(3));
}

#[test]
fn test_one_way_name_collision() {
    let values: ArrayRef = Arc::new(StringArray::from(vec![Some("a"), Some("a")]));
    let tabyl = Tabulator::new().one_way_values(&values, "n").unwrap();
    let schema = tabyl.table.schema();
    assert_eq!(schema.field(0).name(), "n");
    assert_eq!(schema.field(1).name(), "n_n");
}

#[test]
fn test_two_way_cell_conservation_with_na_filter() {
    let batch = sample_batch();
    let tabyl = Tabulator::new()
        .show_na(false)
        .two_way(&batch, "species", "habitat")
        .unwrap();

    // 4 rows have both species and habitat present.
    assert_eq!(cell_total(&tabyl), 4);
    assert_eq!(
        tabyl.kind,
        TabylKind::TwoWay {
            row_var: "species".into(),
            col_var: "habitat".into()
        }
    );
}

#[test]
fn test_two_way_missing_column_last() {
    let batch = sample_batch();
    let tabyl = Tabulator::new().two_way(&batch, "species", "habitat").unwrap();

    let schema = tabyl.table.schema();
    let last = schema.field(schema.fields().len() - 1);
    assert_eq!(last.name(), "NA_");
    assert_eq!(cell_total(&tabyl), 6);
}

#[test]
fn test_two_way_hidden_na_with_declared_null_level() {
    // The flag dictionary declares null as a level; once missing rows are
    // filtered out, no NA_ column may remain.
    let schema = Arc::new(Schema::new(vec![
        Field::new("a", DataType::Utf8, true),
        dict_field("flag"),
    ]));
    let flag = DictionaryArray::<Int32Type>::try_new(
        Int32Array::from(vec![Some(0), Some(1), Some(2)]),
        Arc::new(StringArray::from(vec![Some("y"), Some("n"), None])),
    )
    .unwrap();
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec![Some("x"), Some("x"), Some("x")])) as ArrayRef,
            Arc::new(flag),
        ],
    )
    .unwrap();

    let tabyl = Tabulator::new()
        .show_na(false)
        .two_way(&batch, "a", "flag")
        .unwrap();
    let schema = tabyl.table.schema();
    assert!(schema.fields().iter().all(|f| f.name() != "NA_"));
    assert_eq!(cell_total(&tabyl), 2);
}

#[test]
fn test_two_way_empty_after_filter() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("a", DataType::Utf8, true),
        Field::new("b", DataType::Utf8, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from(vec![None::<&str>, None])),
            Arc::new(StringArray::from(vec![Some("1"), Some("2")])),
        ],
    )
    .unwrap();

    let tabyl = Tabulator::new()
        .show_na(false)
        .two_way(&batch, "a", "b")
        .unwrap();
    assert!(tabyl.is_empty());
    assert_eq!(tabyl.table.num_columns(), 2);
    assert_eq!(tabyl.table.schema().field(0).name(), "a");
    assert_eq!(tabyl.table.schema().field(1).name(), "b");
}

#[test]
fn test_three_way_declared_level_order() {
    // phase declares I, II, III but only III and I are observed; the
    // partitions come back in declared order.
    let batch = sample_batch();
    let parts = Tabulator::new()
        .three_way(&batch, "species", "habitat", "phase")
        .unwrap();

    let keys: Vec<&str> = parts.iter().map(|p| p.key.as_str()).collect();
    assert_eq!(keys, vec!["I", "III"]);
}

#[test]
fn test_three_way_row_count_conservation() {
    let batch = sample_batch();
    let parts = Tabulator::new()
        .three_way(&batch, "species", "habitat", "phase")
        .unwrap();
    let total: i64 = parts.iter().map(|p| cell_total(&p.tabyl)).sum();
    assert_eq!(total, 6);
}

#[test]
fn test_dispatch_by_arity() {
    let batch = sample_batch();
    let tabulator = Tabulator::new();

    let one = tabulator
        .tabulate(&batch, &[ColumnSelector::from("species")])
        .unwrap();
    assert_eq!(one.axes(), 1);

    let two = tabulator
        .tabulate(
            &batch,
            &[ColumnSelector::from("species"), ColumnSelector::from("habitat")],
        )
        .unwrap();
    assert_eq!(two.axes(), 2);

    let three = tabulator
        .tabulate(
            &batch,
            &[
                ColumnSelector::from("species"),
                ColumnSelector::from("habitat"),
                ColumnSelector::from("phase"),
            ],
        )
        .unwrap();
    assert_eq!(three.axes(), 3);
    if let TabylOutput::ThreeWay(parts) = three {
        assert!(!parts.is_empty());
    }

    let err = tabulator.tabulate(&batch, &[]).unwrap_err();
    assert!(matches!(err, Error::MissingArguments { got: 0 }));
}

#[test]
fn test_selector_rename_flows_to_output() {
    let batch = sample_batch();
    let tabyl = Tabulator::new()
        .one_way(&batch, ColumnSelector::renamed("animal", "species"))
        .unwrap();
    assert_eq!(tabyl.table.schema().field(0).name(), "animal");
    assert_eq!(tabyl.kind, TabylKind::OneWay { var: "animal".into() });
}

#[test]
fn test_unresolved_column() {
    let batch = sample_batch();
    let err = Tabulator::new().one_way(&batch, "color").unwrap_err();
    assert!(matches!(err, Error::ColumnNotFound { .. }));
}

#[test]
fn test_determinism() {
    let batch = sample_batch();
    let a = Tabulator::new().two_way(&batch, "grade", "habitat").unwrap();
    let b = Tabulator::new().two_way(&batch, "grade", "habitat").unwrap();
    assert_eq!(a.table, b.table);

    let pa = Tabulator::new()
        .three_way(&batch, "species", "habitat", "phase")
        .unwrap();
    let pb = Tabulator::new()
        .three_way(&batch, "species", "habitat", "phase")
        .unwrap();
    assert_eq!(pa.len(), pb.len());
    for (x, y) in pa.iter().zip(&pb) {
        assert_eq!(x.key, y.key);
        assert_eq!(x.tabyl.table, y.tabyl.table);
    }
}

#[test]
fn test_find_dupes_end_to_end() {
    let batch = sample_batch();
    let out = find_dupes(&batch, &[ColumnSelector::from("species")]).unwrap();

    // cat x3 then dog x2; the single missing-species row is unique.
    assert_eq!(out.num_rows(), 5);
    let counts = out
        .column_by_name("dupe_count")
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(counts.value(0), 3);
    assert_eq!(counts.value(3), 2);
}

proptest! {
    #[test]
    fn prop_one_way_conserves_counts(values in prop::collection::vec(
        prop::option::of(prop::sample::select(vec!["a", "b", "c", "d"])),
        0..60,
    )) {
        let array: ArrayRef = Arc::new(StringArray::from(values.clone()));
        let non_missing = values.iter().filter(|v| v.is_some()).count() as i64;

        let shown = Tabulator::new().one_way_values(&array, "x").unwrap();
        prop_assert_eq!(counts(&shown).iter().sum::<i64>(), values.len() as i64);

        let hidden = Tabulator::new().show_na(false).one_way_values(&array, "x").unwrap();
        prop_assert_eq!(counts(&hidden).iter().sum::<i64>(), non_missing);
    }

    #[test]
    fn prop_tabulation_is_deterministic(values in prop::collection::vec(
        prop::option::of(prop::sample::select(vec!["a", "b", "c"])),
        0..40,
    )) {
        let array: ArrayRef = Arc::new(StringArray::from(values));
        let first = Tabulator::new().one_way_values(&array, "x").unwrap();
        let second = Tabulator::new().one_way_values(&array, "x").unwrap();
        prop_assert_eq!(first.table, second.table);
    }
}
