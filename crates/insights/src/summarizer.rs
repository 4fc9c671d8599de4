//! Numeric descriptive statistics and categorical frequency summaries.

use serde::{Deserialize, Serialize};
use shared::settings::InsightLimits;
use shared::Dataset;
use std::collections::HashMap;

use crate::profiler::{CardinalityGate, DatasetProfile};
use crate::stats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub column: String,
    /// Non-missing values
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl NumericSummary {
    fn from_values(column: &str, values: &[f64]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        Self {
            column: column.to_string(),
            count: sorted.len(),
            mean: stats::mean(&sorted),
            std: stats::std_dev(&sorted),
            min: sorted.first().copied().unwrap_or(0.0),
            q1: stats::quantile(&sorted, 0.25),
            median: stats::quantile(&sorted, 0.5),
            q3: stats::quantile(&sorted, 0.75),
            max: sorted.last().copied().unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalSummary {
    pub column: String,
    pub unique_count: usize,
    /// Most frequent values, highest count first
    pub top_values: Vec<(String, usize)>,
}

impl CategoricalSummary {
    pub fn most_frequent(&self) -> Option<&(String, usize)> {
        self.top_values.first()
    }
}

/// A categorical column left out by the cardinality gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedColumn {
    pub column: String,
    pub unique_count: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub numeric: Vec<NumericSummary>,
    /// Numeric columns past the summary cap
    pub omitted_numeric: Vec<String>,
    pub categorical: Vec<CategoricalSummary>,
    pub skipped: Vec<SkippedColumn>,
}

impl SummaryStats {
    pub fn categorical(&self, column: &str) -> Option<&CategoricalSummary> {
        self.categorical.iter().find(|c| c.column == column)
    }
}

/// Frequency counts of a column's non-missing values, highest first.
///
/// Equal counts keep the order in which the values first appear.
pub fn value_counts(values: &[shared::Value]) -> Vec<(String, usize)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for key in values.iter().filter_map(|v| v.category_key()) {
        match index.get(&key) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(key.clone(), counts.len());
                counts.push((key, 1));
            }
        }
    }

    // stable sort keeps first-seen order among ties
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

pub fn top_values(values: &[shared::Value], n: usize) -> Vec<(String, usize)> {
    let mut counts = value_counts(values);
    counts.truncate(n);
    counts
}

pub fn summarize(dataset: &Dataset, profile: &DatasetProfile, limits: &InsightLimits) -> SummaryStats {
    let mut summary = SummaryStats::default();

    for (i, column) in profile.numeric_columns().enumerate() {
        if i >= limits.max_numeric_summary {
            summary.omitted_numeric.push(column.name.clone());
            continue;
        }
        let values = dataset
            .column(&column.name)
            .map(|c| c.numeric_values())
            .unwrap_or_default();
        summary
            .numeric
            .push(NumericSummary::from_values(&column.name, &values));
    }

    for column in profile.categorical_columns() {
        match column.gate {
            CardinalityGate::Eligible => {
                let values = dataset
                    .column(&column.name)
                    .map(|c| c.values.as_slice())
                    .unwrap_or(&[]);
                summary.categorical.push(CategoricalSummary {
                    column: column.name.clone(),
                    unique_count: column.unique_count,
                    top_values: top_values(values, limits.top_n),
                });
            }
            CardinalityGate::Skipped {
                unique_count,
                limit,
            } => summary.skipped.push(SkippedColumn {
                column: column.name.clone(),
                unique_count,
                limit,
            }),
            CardinalityGate::NotApplicable => {}
        }
    }

    if !summary.omitted_numeric.is_empty() {
        tracing::debug!(
            "{} numeric columns past the summary cap",
            summary.omitted_numeric.len()
        );
    }

    summary
}
