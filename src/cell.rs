//! Cell values and column decoding.
//!
//! Tabulation treats every supported Arrow column as a sequence of
//! `Option<CellValue>` group keys: booleans, integers, floats, and text,
//! with `None` standing for a missing value. Dictionary columns over utf8
//! additionally carry a [`Levels`] describing their declared category set.

// Wide integer keys are narrowed for grouping; values this large are not
// realistic category labels.
#![allow(clippy::cast_possible_wrap)]

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use arrow::{
    array::{
        Array, ArrayRef, BooleanArray, DictionaryArray, Float32Array, Float64Array, Int16Array,
        Int32Array, Int64Array, Int8Array, LargeStringArray, RecordBatch, StringArray,
        UInt16Array, UInt32Array, UInt64Array, UInt8Array,
    },
    compute::cast,
    datatypes::{DataType, Int32Type},
};

use crate::{
    categorical::Levels,
    error::{Error, Result},
    selector::ColumnSelector,
};

/// A single non-missing cell value drawn from a supported column.
///
/// Values of different kinds never meet inside one column; the cross-kind
/// ordering exists only to make [`Ord`] total.
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Boolean cell.
    Bool(bool),
    /// Integer cell (all integer widths are widened to i64).
    Int(i64),
    /// Floating-point cell.
    Float(f64),
    /// Text cell, including categorical level labels.
    Text(String),
}

impl CellValue {
    fn rank(&self) -> u8 {
        match self {
            Self::Bool(_) => 0,
            Self::Int(_) => 1,
            Self::Float(_) => 2,
            Self::Text(_) => 3,
        }
    }

    /// Display label for this value, used for pivot column names and
    /// partition keys.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            // Bit equality keeps Eq consistent with total_cmp ordering.
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Self::Bool(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::Float(v) => v.to_bits().hash(state),
            Self::Text(v) => v.hash(state),
        }
    }
}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// The scalar kind of a decoded column, used to rebuild typed output
/// columns after grouping or partitioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    /// Boolean column.
    Bool,
    /// Integer column (rebuilt as Int64).
    Int,
    /// Floating-point column (rebuilt as Float64).
    Float,
    /// Text column.
    Text,
    /// Dictionary-encoded categorical column over utf8.
    Categorical,
}

/// A column decoded into cell values, with any categorical identity
/// captured alongside.
#[derive(Debug, Clone)]
pub struct ColumnValues {
    /// Output name for the column (the selector alias).
    pub name: String,
    /// Decoded cells, `None` for missing.
    pub values: Vec<Option<CellValue>>,
    /// Declared level set, present only for categorical columns.
    pub levels: Option<Levels>,
    /// Scalar kind of the source column.
    pub kind: CellKind,
}

impl ColumnValues {
    /// Decode the column a selector resolves to within a batch.
    pub fn from_batch(batch: &RecordBatch, selector: &ColumnSelector) -> Result<Self> {
        let index = selector.resolve(&batch.schema())?;
        Self::from_array(selector.alias(), batch.column(index))
    }

    /// Decode a bare array under a caller-supplied name.
    pub fn from_array(name: &str, array: &ArrayRef) -> Result<Self> {
        let (values, levels, kind) = decode_array(name, array)?;
        Ok(Self {
            name: name.to_string(),
            values,
            levels,
            kind,
        })
    }

    /// Number of cells in the column.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the column has no cells.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of missing cells.
    pub fn na_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    /// Remove categorical identity, leaving a plain text column.
    pub fn strip_levels(&mut self) {
        if self.levels.take().is_some() {
            self.kind = CellKind::Text;
        }
    }

    /// Force categorical identity, inferring levels from the observed
    /// distinct values in natural order when none are declared.
    pub fn coerce_categorical(&mut self) {
        if self.levels.is_some() {
            return;
        }
        let levels = Levels::infer(&self.values);
        self.values = self
            .values
            .iter()
            .map(|v| v.as_ref().map(|c| CellValue::Text(c.label())))
            .collect();
        self.levels = Some(levels);
        self.kind = CellKind::Categorical;
    }

    /// Keep only the cells at the given row positions.
    pub fn project(&self, rows: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            values: rows.iter().map(|&i| self.values[i].clone()).collect(),
            levels: self.levels.clone(),
            kind: self.kind,
        }
    }

    /// Arrow data type of the output column this decodes back into.
    pub fn output_data_type(&self) -> DataType {
        match (&self.levels, self.kind) {
            (Some(_), _) | (_, CellKind::Categorical) => DataType::Dictionary(
                Box::new(DataType::Int32),
                Box::new(DataType::Utf8),
            ),
            (None, CellKind::Bool) => DataType::Boolean,
            (None, CellKind::Int) => DataType::Int64,
            (None, CellKind::Float) => DataType::Float64,
            (None, CellKind::Text) => DataType::Utf8,
        }
    }

    /// Rebuild a typed Arrow array from a sequence of cells of this
    /// column's kind, reapplying declared levels when categorical.
    pub fn build_array(&self, cells: &[Option<CellValue>]) -> Result<ArrayRef> {
        if let Some(levels) = &self.levels {
            let labels: Vec<Option<String>> = cells
                .iter()
                .map(|v| v.as_ref().map(|c| c.label()))
                .collect();
            return levels.apply(&labels);
        }
        Ok(build_scalar_array(self.kind, cells))
    }
}

/// Parse a display label back into a cell of the given kind. Labels that
/// fail to parse fall back to text, which only happens for inputs that
/// were text to begin with.
pub fn parse_cell(kind: CellKind, label: &str) -> CellValue {
    match kind {
        CellKind::Bool => match label {
            "true" => CellValue::Bool(true),
            "false" => CellValue::Bool(false),
            _ => CellValue::Text(label.to_string()),
        },
        CellKind::Int => label
            .parse::<i64>()
            .map(CellValue::Int)
            .unwrap_or_else(|_| CellValue::Text(label.to_string())),
        CellKind::Float => label
            .parse::<f64>()
            .map(CellValue::Float)
            .unwrap_or_else(|_| CellValue::Text(label.to_string())),
        CellKind::Text | CellKind::Categorical => CellValue::Text(label.to_string()),
    }
}

/// Build a plain (non-categorical) Arrow array from cells of one kind.
/// Cells of a different kind become nulls; mixed kinds never occur in
/// columns decoded by this module.
pub fn build_scalar_array(kind: CellKind, cells: &[Option<CellValue>]) -> ArrayRef {
    match kind {
        CellKind::Bool => {
            let data: Vec<Option<bool>> = cells
                .iter()
                .map(|v| match v {
                    Some(CellValue::Bool(b)) => Some(*b),
                    _ => None,
                })
                .collect();
            Arc::new(BooleanArray::from(data))
        }
        CellKind::Int => {
            let data: Vec<Option<i64>> = cells
                .iter()
                .map(|v| match v {
                    Some(CellValue::Int(i)) => Some(*i),
                    _ => None,
                })
                .collect();
            Arc::new(Int64Array::from(data))
        }
        CellKind::Float => {
            let data: Vec<Option<f64>> = cells
                .iter()
                .map(|v| match v {
                    Some(CellValue::Float(f)) => Some(*f),
                    _ => None,
                })
                .collect();
            Arc::new(Float64Array::from(data))
        }
        CellKind::Text | CellKind::Categorical => {
            let data: Vec<Option<String>> = cells
                .iter()
                .map(|v| match v {
                    Some(CellValue::Text(s)) => Some(s.clone()),
                    Some(other) => Some(other.label()),
                    None => None,
                })
                .collect();
            Arc::new(StringArray::from(data))
        }
    }
}

type Decoded = (Vec<Option<CellValue>>, Option<Levels>, CellKind);

fn decode_array(name: &str, array: &ArrayRef) -> Result<Decoded> {
    if let Some(arr) = array.as_any().downcast_ref::<BooleanArray>() {
        let values = (0..arr.len())
            .map(|i| (!arr.is_null(i)).then(|| CellValue::Bool(arr.value(i))))
            .collect();
        return Ok((values, None, CellKind::Bool));
    }
    if let Some(arr) = array.as_any().downcast_ref::<StringArray>() {
        let values = (0..arr.len())
            .map(|i| (!arr.is_null(i)).then(|| CellValue::Text(arr.value(i).to_string())))
            .collect();
        return Ok((values, None, CellKind::Text));
    }
    if let Some(arr) = array.as_any().downcast_ref::<LargeStringArray>() {
        let values = (0..arr.len())
            .map(|i| (!arr.is_null(i)).then(|| CellValue::Text(arr.value(i).to_string())))
            .collect();
        return Ok((values, None, CellKind::Text));
    }
    if let Some(arr) = array.as_any().downcast_ref::<Int8Array>() {
        return Ok((int_cells(arr.len(), |i| arr.is_null(i), |i| arr.value(i) as i64), None, CellKind::Int));
    }
    if let Some(arr) = array.as_any().downcast_ref::<Int16Array>() {
        return Ok((int_cells(arr.len(), |i| arr.is_null(i), |i| arr.value(i) as i64), None, CellKind::Int));
    }
    if let Some(arr) = array.as_any().downcast_ref::<Int32Array>() {
        return Ok((int_cells(arr.len(), |i| arr.is_null(i), |i| arr.value(i) as i64), None, CellKind::Int));
    }
    if let Some(arr) = array.as_any().downcast_ref::<Int64Array>() {
        return Ok((int_cells(arr.len(), |i| arr.is_null(i), |i| arr.value(i)), None, CellKind::Int));
    }
    if let Some(arr) = array.as_any().downcast_ref::<UInt8Array>() {
        return Ok((int_cells(arr.len(), |i| arr.is_null(i), |i| arr.value(i) as i64), None, CellKind::Int));
    }
    if let Some(arr) = array.as_any().downcast_ref::<UInt16Array>() {
        return Ok((int_cells(arr.len(), |i| arr.is_null(i), |i| arr.value(i) as i64), None, CellKind::Int));
    }
    if let Some(arr) = array.as_any().downcast_ref::<UInt32Array>() {
        return Ok((int_cells(arr.len(), |i| arr.is_null(i), |i| arr.value(i) as i64), None, CellKind::Int));
    }
    if let Some(arr) = array.as_any().downcast_ref::<UInt64Array>() {
        return Ok((int_cells(arr.len(), |i| arr.is_null(i), |i| arr.value(i) as i64), None, CellKind::Int));
    }
    if let Some(arr) = array.as_any().downcast_ref::<Float32Array>() {
        let values = (0..arr.len())
            .map(|i| (!arr.is_null(i)).then(|| CellValue::Float(f64::from(arr.value(i)))))
            .collect();
        return Ok((values, None, CellKind::Float));
    }
    if let Some(arr) = array.as_any().downcast_ref::<Float64Array>() {
        let values = (0..arr.len())
            .map(|i| (!arr.is_null(i)).then(|| CellValue::Float(arr.value(i))))
            .collect();
        return Ok((values, None, CellKind::Float));
    }
    if let Some(arr) = array.as_any().downcast_ref::<DictionaryArray<Int32Type>>() {
        return decode_dictionary(name, arr);
    }
    // Dictionary columns with other key widths are normalized to Int32 keys.
    if let DataType::Dictionary(_, value) = array.data_type() {
        if **value == DataType::Utf8 {
            let dict_type =
                DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8));
            let recast = cast(array, &dict_type)?;
            if let Some(arr) = recast.as_any().downcast_ref::<DictionaryArray<Int32Type>>() {
                return decode_dictionary(name, arr);
            }
        }
    }
    Err(Error::unsupported_kind(name, array.data_type()))
}

fn decode_dictionary(name: &str, arr: &DictionaryArray<Int32Type>) -> Result<Decoded> {
    let Some(labels) = arr.values().as_any().downcast_ref::<StringArray>() else {
        return Err(Error::unsupported_kind(name, arr.data_type()));
    };
    let mut level_labels = Vec::with_capacity(labels.len());
    let mut explicit_na = false;
    for i in 0..labels.len() {
        if labels.is_null(i) {
            explicit_na = true;
        } else {
            level_labels.push(labels.value(i).to_string());
        }
    }
    let levels = Levels::new(level_labels).with_explicit_na(explicit_na);
    let keys = arr.keys();
    let values = (0..arr.len())
        .map(|i| {
            if keys.is_null(i) {
                return None;
            }
            let slot = keys.value(i) as usize;
            if labels.is_null(slot) {
                None
            } else {
                Some(CellValue::Text(labels.value(slot).to_string()))
            }
        })
        .collect();
    Ok((values, Some(levels), CellKind::Categorical))
}

fn int_cells(
    len: usize,
    is_null: impl Fn(usize) -> bool,
    value: impl Fn(usize) -> i64,
) -> Vec<Option<CellValue>> {
    (0..len)
        .map(|i| (!is_null(i)).then(|| CellValue::Int(value(i))))
        .collect()
}
