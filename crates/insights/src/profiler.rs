//! Dataset profiler: shape, column kinds and missing values.

use serde::{Deserialize, Serialize};
use shared::settings::InsightLimits;
use shared::{ColumnKind, DType, Dataset, ProfilingError};
use std::collections::HashSet;

/// Whether a column passes the categorical cardinality gate.
///
/// Kept on the profile so later stages can report a skip instead of silently
/// dropping the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardinalityGate {
    /// Not a categorical column
    NotApplicable,
    Eligible,
    Skipped { unique_count: usize, limit: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    pub dtype: DType,
    pub kind: ColumnKind,
    pub missing_count: usize,
    /// missing / rows, 0.0 for an empty dataset
    pub missing_ratio: f64,
    /// Distinct non-missing values (categorical columns only)
    pub unique_count: usize,
    pub gate: CardinalityGate,
}

impl ColumnProfile {
    pub fn is_eligible_categorical(&self) -> bool {
        self.gate == CardinalityGate::Eligible
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.gate, CardinalityGate::Skipped { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingColumn {
    pub name: String,
    pub count: usize,
    pub ratio: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MissingSummary {
    pub total_missing: usize,
    /// Columns with at least one missing value, in column order
    pub columns: Vec<MissingColumn>,
}

impl MissingSummary {
    pub fn has_missing(&self) -> bool {
        !self.columns.is_empty()
    }
}

/// Column counts per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCounts {
    pub numeric: usize,
    pub categorical: usize,
    pub other: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub rows: usize,
    pub cols: usize,
    pub columns: Vec<ColumnProfile>,
    pub missing: MissingSummary,
}

impl DatasetProfile {
    pub fn numeric_columns(&self) -> impl Iterator<Item = &ColumnProfile> {
        self.columns.iter().filter(|c| c.kind == ColumnKind::Numeric)
    }

    pub fn categorical_columns(&self) -> impl Iterator<Item = &ColumnProfile> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Categorical)
    }

    /// Categorical columns that passed the cardinality gate
    pub fn eligible_categorical(&self) -> impl Iterator<Item = &ColumnProfile> {
        self.columns.iter().filter(|c| c.is_eligible_categorical())
    }

    pub fn kind_counts(&self) -> KindCounts {
        let mut counts = KindCounts::default();
        for column in &self.columns {
            match column.kind {
                ColumnKind::Numeric => counts.numeric += 1,
                ColumnKind::Categorical => counts.categorical += 1,
                ColumnKind::Other => counts.other += 1,
            }
        }
        counts
    }
}

/// Profile every column of a dataset.
///
/// Fails only when the dataset is not a usable table; an empty dataset
/// profiles to zero-filled statistics.
pub fn profile(dataset: &Dataset, limits: &InsightLimits) -> Result<DatasetProfile, ProfilingError> {
    dataset.validate()?;
    let rows = dataset.row_count();

    let mut columns = Vec::with_capacity(dataset.column_count());
    let mut missing = MissingSummary::default();

    for column in dataset.columns() {
        let kind = column.kind();
        let missing_count = column.missing_count();
        let missing_ratio = if rows == 0 {
            0.0
        } else {
            missing_count as f64 / rows as f64
        };

        let (unique_count, gate) = if kind == ColumnKind::Categorical {
            let unique = column
                .values
                .iter()
                .filter_map(|v| v.category_key())
                .collect::<HashSet<_>>()
                .len();
            let gate = if unique <= limits.cardinality_limit {
                CardinalityGate::Eligible
            } else {
                tracing::debug!(
                    "Column '{}' skipped: {} unique values exceeds {}",
                    column.name,
                    unique,
                    limits.cardinality_limit
                );
                CardinalityGate::Skipped {
                    unique_count: unique,
                    limit: limits.cardinality_limit,
                }
            };
            (unique, gate)
        } else {
            (0, CardinalityGate::NotApplicable)
        };

        if missing_count > 0 {
            missing.total_missing += missing_count;
            missing.columns.push(MissingColumn {
                name: column.name.clone(),
                count: missing_count,
                ratio: missing_ratio,
            });
        }

        columns.push(ColumnProfile {
            name: column.name.clone(),
            dtype: column.dtype,
            kind,
            missing_count,
            missing_ratio,
            unique_count,
            gate,
        });
    }

    tracing::info!(
        "Profiled dataset: {} rows, {} columns",
        rows,
        dataset.column_count()
    );

    Ok(DatasetProfile {
        rows,
        cols: dataset.column_count(),
        columns,
        missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Column, Value};

    fn limits() -> InsightLimits {
        InsightLimits::default()
    }

    #[test]
    fn test_kinds_and_missing_ratio() {
        let dataset = Dataset::new(vec![
            Column::inferred("age", vec![Value::Int(30), Value::Null, Value::Int(40), Value::Null]),
            Column::inferred("city", vec!["a".into(), "b".into(), "a".into(), Value::Null]),
            Column::new(
                "when",
                DType::DateTime,
                vec![Value::Null, Value::Null, Value::Null, Value::Null],
            ),
        ]);
        let profile = profile(&dataset, &limits()).unwrap();

        assert_eq!(profile.rows, 4);
        assert_eq!(profile.columns[0].kind, ColumnKind::Numeric);
        assert_eq!(profile.columns[0].missing_ratio, 0.5);
        assert_eq!(profile.columns[1].kind, ColumnKind::Categorical);
        assert_eq!(profile.columns[1].unique_count, 2);
        assert_eq!(profile.columns[2].kind, ColumnKind::Other);
        assert_eq!(profile.missing.total_missing, 7);
        assert_eq!(profile.missing.columns.len(), 3);
        assert_eq!(
            profile.kind_counts(),
            KindCounts {
                numeric: 1,
                categorical: 1,
                other: 1
            }
        );
    }

    #[test]
    fn test_empty_dataset_has_zero_missing_ratio() {
        let dataset = Dataset::new(vec![
            Column::new("n", DType::Float, Vec::new()),
            Column::new("c", DType::Text, Vec::new()),
        ]);
        let profile = profile(&dataset, &limits()).unwrap();

        assert_eq!(profile.rows, 0);
        assert!(profile.columns.iter().all(|c| c.missing_ratio == 0.0));
        assert!(!profile.missing.has_missing());
    }

    #[test]
    fn test_high_cardinality_is_marked_skipped() {
        let values: Vec<Value> = (0..25).map(|i| Value::Text(format!("id-{}", i))).collect();
        let dataset = Dataset::new(vec![Column::inferred("customer", values)]);
        let profile = profile(&dataset, &limits()).unwrap();

        assert_eq!(
            profile.columns[0].gate,
            CardinalityGate::Skipped {
                unique_count: 25,
                limit: 20
            }
        );
        assert_eq!(profile.eligible_categorical().count(), 0);
    }

    #[test]
    fn test_ragged_dataset_is_a_profiling_error() {
        let dataset = Dataset::with_row_count(
            3,
            vec![Column::inferred("a", vec![Value::Int(1)])],
        );
        assert!(profile(&dataset, &limits()).is_err());
    }
}
