//! In-memory tabular data handed to the insight pipeline.
//!
//! A [`Dataset`] is a list of named, typed columns plus a declared row count.
//! Parsing raw file bytes happens before this point; everything here assumes
//! the caller already decided what each cell is.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::ProfilingError;

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Null and NaN both count as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    /// Numeric view of the cell, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) if !f.is_nan() => Some(*f),
            _ => None,
        }
    }

    /// Key used when counting category frequencies
    pub fn category_key(&self) -> Option<String> {
        if self.is_missing() {
            return None;
        }
        Some(self.to_string())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, ""),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => write!(f, "{}", s),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Declared storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    Int,
    Float,
    Bool,
    Text,
    /// Low-cardinality labels declared as such by the producer
    Category,
    DateTime,
    /// Cells of more than one incompatible type
    Mixed,
}

impl DType {
    /// Every dtype resolves to exactly one kind.
    pub fn kind(self) -> ColumnKind {
        match self {
            DType::Int | DType::Float => ColumnKind::Numeric,
            DType::Bool | DType::Text | DType::Category => ColumnKind::Categorical,
            DType::DateTime | DType::Mixed => ColumnKind::Other,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DType::Int => "int64",
            DType::Float => "float64",
            DType::Bool => "bool",
            DType::Text => "object",
            DType::Category => "category",
            DType::DateTime => "datetime64",
            DType::Mixed => "mixed",
        }
    }

    /// Narrowest dtype covering every non-missing value.
    ///
    /// Ints widen to float; any other mix is text. A column with no values
    /// at all is float, matching how delimited readers treat an empty column.
    pub fn infer(values: &[Value]) -> DType {
        let mut inferred: Option<DType> = None;
        for value in values {
            let current = match value {
                Value::Null => continue,
                Value::Float(f) if f.is_nan() => continue,
                Value::Bool(_) => DType::Bool,
                Value::Int(_) => DType::Int,
                Value::Float(_) => DType::Float,
                Value::Text(_) => DType::Text,
                Value::DateTime(_) => DType::DateTime,
            };
            inferred = Some(match (inferred, current) {
                (None, c) => c,
                (Some(prev), c) if prev == c => prev,
                (Some(DType::Int), DType::Float) | (Some(DType::Float), DType::Int) => DType::Float,
                _ => DType::Text,
            });
        }
        inferred.unwrap_or(DType::Float)
    }
}

/// How the insight pipeline treats a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Other,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Categorical => write!(f, "categorical"),
            ColumnKind::Other => write!(f, "other"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub dtype: DType,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, dtype: DType, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    /// Build a column whose dtype is inferred from its values
    pub fn inferred(name: impl Into<String>, values: Vec<Value>) -> Self {
        let dtype = DType::infer(&values);
        Self::new(name, dtype, values)
    }

    pub fn kind(&self) -> ColumnKind {
        self.dtype.kind()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_missing()).count()
    }

    /// Non-missing numeric values in row order
    pub fn numeric_values(&self) -> Vec<f64> {
        self.values.iter().filter_map(Value::as_f64).collect()
    }
}

/// Table of named columns sharing one row count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    row_count: usize,
    columns: Vec<Column>,
}

impl Dataset {
    /// Row count is taken from the first column (zero when there are none).
    ///
    /// Nothing is checked here; [`Dataset::validate`] reports structural
    /// problems so the pipeline can isolate them per dataset.
    pub fn new(columns: Vec<Column>) -> Self {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        Self { row_count, columns }
    }

    pub fn with_row_count(row_count: usize, columns: Vec<Column>) -> Self {
        Self { row_count, columns }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }

    /// Check the dataset is a usable table.
    pub fn validate(&self) -> Result<(), ProfilingError> {
        let mut seen = HashSet::new();
        for (index, column) in self.columns.iter().enumerate() {
            if column.name.trim().is_empty() {
                return Err(ProfilingError::EmptyColumnName { index });
            }
            if !seen.insert(column.name.as_str()) {
                return Err(ProfilingError::DuplicateColumn {
                    column: column.name.clone(),
                });
            }
            if column.len() != self.row_count {
                return Err(ProfilingError::RaggedColumn {
                    column: column.name.clone(),
                    expected: self.row_count,
                    found: column.len(),
                });
            }
        }
        Ok(())
    }

    /// Quick structural summary
    pub fn info(&self) -> DatasetInfo {
        DatasetInfo {
            rows: self.row_count,
            columns: self.columns.len(),
            column_names: self.columns.iter().map(|c| c.name.clone()).collect(),
            column_types: self
                .columns
                .iter()
                .map(|c| (c.name.clone(), c.dtype.name().to_string()))
                .collect(),
            has_nulls: self.columns.iter().any(|c| c.missing_count() > 0),
        }
    }
}

/// Metadata shown when inspecting loaded files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetInfo {
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    pub column_types: BTreeMap<String, String>,
    pub has_nulls: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_kind_is_total() {
        let all = [
            DType::Int,
            DType::Float,
            DType::Bool,
            DType::Text,
            DType::Category,
            DType::DateTime,
            DType::Mixed,
        ];
        let numeric = all.iter().filter(|d| d.kind() == ColumnKind::Numeric).count();
        let categorical = all
            .iter()
            .filter(|d| d.kind() == ColumnKind::Categorical)
            .count();
        let other = all.iter().filter(|d| d.kind() == ColumnKind::Other).count();
        assert_eq!(numeric + categorical + other, all.len());
        assert_eq!(DType::Bool.kind(), ColumnKind::Categorical);
    }

    #[test]
    fn test_infer_widens_int_to_float() {
        let values = vec![Value::Int(1), Value::Null, Value::Float(2.5)];
        assert_eq!(DType::infer(&values), DType::Float);
    }

    #[test]
    fn test_infer_mixed_falls_back_to_text() {
        let values = vec![Value::Int(1), Value::from("a")];
        assert_eq!(DType::infer(&values), DType::Text);
        assert_eq!(DType::infer(&[Value::Null]), DType::Float);
    }

    #[test]
    fn test_nan_counts_as_missing() {
        let column = Column::inferred("x", vec![Value::Float(f64::NAN), Value::Int(3)]);
        assert_eq!(column.missing_count(), 1);
        assert_eq!(column.numeric_values(), vec![3.0]);
    }

    #[test]
    fn test_validate_rejects_ragged_columns() {
        let dataset = Dataset::new(vec![
            Column::inferred("a", vec![Value::Int(1), Value::Int(2)]),
            Column::inferred("b", vec![Value::Int(1)]),
        ]);
        assert!(matches!(
            dataset.validate(),
            Err(ProfilingError::RaggedColumn { found: 1, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let dataset = Dataset::new(vec![
            Column::inferred("a", vec![Value::Int(1)]),
            Column::inferred("a", vec![Value::Int(2)]),
        ]);
        assert!(matches!(
            dataset.validate(),
            Err(ProfilingError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn test_info_reports_nulls() {
        let dataset = Dataset::new(vec![Column::inferred(
            "a",
            vec![Value::Int(1), Value::Null],
        )]);
        let info = dataset.info();
        assert_eq!(info.rows, 2);
        assert!(info.has_nulls);
        assert_eq!(info.column_types["a"], "int64");
    }
}
