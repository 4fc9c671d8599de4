//! Chart synthesis: histograms, top-value bar charts and a correlation heatmap.
//!
//! Every cap in [`InsightLimits`] truncates; nothing here rejects a dataset.

use render::Figure;
use shared::settings::InsightLimits;
use shared::{ChartArtifact, ChartKind, Dataset, Provenance};
use std::sync::Arc;

use crate::profiler::DatasetProfile;
use crate::stats;
use crate::summarizer::top_values;

pub fn synthesize(
    dataset: &Dataset,
    profile: &DatasetProfile,
    limits: &InsightLimits,
) -> Vec<ChartArtifact> {
    let mut charts = Vec::new();

    // a zero-row table has nothing to plot
    if profile.rows == 0 {
        tracing::debug!("No charts for an empty dataset");
        return charts;
    }

    let numeric: Vec<&str> = profile.numeric_columns().map(|c| c.name.as_str()).collect();

    for name in numeric.iter().take(limits.max_histograms) {
        if let Some(chart) = histogram(dataset, name, limits) {
            charts.push(chart);
        }
    }

    for column in profile.eligible_categorical().take(limits.max_bar_charts) {
        if let Some(chart) = top_values_bar(dataset, &column.name, limits) {
            charts.push(chart);
        }
    }

    if numeric.len() >= 2 {
        let selected: Vec<&str> = numeric
            .iter()
            .take(limits.max_heatmap_columns)
            .copied()
            .collect();
        charts.push(correlation_heatmap(dataset, &selected));
    }

    tracing::info!("Synthesized {} charts", charts.len());
    charts
}

fn histogram(dataset: &Dataset, name: &str, limits: &InsightLimits) -> Option<ChartArtifact> {
    let values = dataset.column(name)?.numeric_values();
    if values.is_empty() {
        tracing::debug!("Column '{}' has no values to plot", name);
        return None;
    }

    let title = format!("Distribution of {}", name);
    let figure = Figure::histogram(&title, name, &values, limits.histogram_bins);
    let score = histogram_score(&values);
    let provenance =
        Provenance::new(ChartKind::Histogram, vec![name.to_string()], title).with_score(score);

    tracing::debug!("Histogram of '{}' (score {:.2})", name, score);
    Some(ChartArtifact::static_figure(Arc::new(figure), provenance))
}

fn top_values_bar(dataset: &Dataset, name: &str, limits: &InsightLimits) -> Option<ChartArtifact> {
    let top = top_values(&dataset.column(name)?.values, limits.top_n);
    if top.is_empty() {
        return None;
    }

    let counts: Vec<usize> = top.iter().map(|(_, c)| *c).collect();
    let score = bar_score(&counts);
    let (labels, values): (Vec<String>, Vec<f64>) =
        top.into_iter().map(|(label, c)| (label, c as f64)).unzip();

    let title = format!("Top {} Values in {}", limits.top_n, name);
    let figure = Figure::bars(&title, name, labels, values);
    let provenance =
        Provenance::new(ChartKind::Bar, vec![name.to_string()], title).with_score(score);

    tracing::debug!("Bar chart of '{}' (score {:.2})", name, score);
    Some(ChartArtifact::static_figure(Arc::new(figure), provenance))
}

fn correlation_heatmap(dataset: &Dataset, names: &[&str]) -> ChartArtifact {
    let columns: Vec<Vec<Option<f64>>> = names
        .iter()
        .map(|name| {
            dataset
                .column(name)
                .map(|c| c.values.iter().map(|v| v.as_f64()).collect())
                .unwrap_or_default()
        })
        .collect();
    let matrix = stats::correlation_matrix(&columns);
    let score = heatmap_score(&matrix);

    let labels: Vec<String> = names.iter().map(|n| n.to_string()).collect();
    let title = "Correlation Matrix".to_string();
    let figure = Figure::heatmap(&title, labels.clone(), matrix);
    let provenance = Provenance::new(ChartKind::Heatmap, labels, title).with_score(score);

    tracing::debug!("Correlation heatmap over {} columns", names.len());
    ChartArtifact::static_figure(Arc::new(figure), provenance)
}

/// Spread plus asymmetry
fn histogram_score(values: &[f64]) -> f64 {
    let variance = stats::variance(values);
    let std = variance.sqrt();
    variance / (std + 1e-10) + stats::skewness(values).abs() * 10.0
}

/// Diversity of the shown categories, rewarding no single dominant value
fn bar_score(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let max_share = counts.iter().copied().max().unwrap_or(0) as f64 / total as f64;
    stats::entropy(counts) + (1.0 - max_share) * 5.0
}

/// Strength of the off-diagonal correlations
fn heatmap_score(matrix: &[Vec<f64>]) -> f64 {
    let upper: Vec<f64> = matrix
        .iter()
        .enumerate()
        .flat_map(|(i, row)| row.iter().skip(i + 1).map(|r| r.abs()))
        .collect();
    if upper.is_empty() {
        return 0.0;
    }
    let max = upper.iter().copied().fold(0.0, f64::max);
    max * 50.0 + stats::mean(&upper) * 20.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiler::profile;
    use shared::{Column, DType, LibraryKind, Value};

    fn run(dataset: &Dataset) -> Vec<ChartArtifact> {
        let limits = InsightLimits::default();
        let profile = profile(dataset, &limits).unwrap();
        synthesize(dataset, &profile, &limits)
    }

    fn kinds(charts: &[ChartArtifact]) -> Vec<ChartKind> {
        charts.iter().map(|c| c.provenance.chart_kind).collect()
    }

    #[test]
    fn test_histogram_cap_and_heatmap_columns() {
        let columns: Vec<Column> = (0..11)
            .map(|i| {
                Column::inferred(
                    format!("n{}", i),
                    (0..5).map(|r| Value::Int(r * (i + 1) + (r % 2))).collect(),
                )
            })
            .collect();
        let charts = run(&Dataset::new(columns));

        let histograms = charts
            .iter()
            .filter(|c| c.provenance.chart_kind == ChartKind::Histogram)
            .count();
        assert_eq!(histograms, 6);

        let heatmap = charts.last().unwrap();
        assert_eq!(heatmap.provenance.chart_kind, ChartKind::Heatmap);
        let expected: Vec<String> = (0..10).map(|i| format!("n{}", i)).collect();
        assert_eq!(heatmap.provenance.columns, expected);
        assert_eq!(heatmap.library_kind(), LibraryKind::StaticFigure);
    }

    #[test]
    fn test_bar_charts_use_first_eligible_columns() {
        let wide: Vec<Value> = (0..30).map(|i| Value::Text(format!("w{}", i))).collect();
        let narrow = |p: &str| -> Vec<Value> {
            (0..30).map(|i| Value::Text(format!("{}{}", p, i % 3))).collect()
        };
        let dataset = Dataset::new(vec![
            Column::inferred("wide", wide),
            Column::inferred("a", narrow("a")),
            Column::inferred("b", narrow("b")),
            Column::inferred("c", narrow("c")),
            Column::inferred("d", narrow("d")),
        ]);
        let charts = run(&dataset);

        let columns: Vec<&str> = charts
            .iter()
            .map(|c| c.provenance.columns[0].as_str())
            .collect();
        assert_eq!(columns, vec!["a", "b", "c"]);
        assert!(charts.iter().all(|c| c.provenance.title.starts_with("Top 10 Values in")));
    }

    #[test]
    fn test_zero_rows_produce_no_charts() {
        let dataset = Dataset::new(vec![
            Column::new("x", DType::Float, Vec::new()),
            Column::new("y", DType::Float, Vec::new()),
            Column::new("label", DType::Text, Vec::new()),
        ]);
        assert!(run(&dataset).is_empty());
    }

    #[test]
    fn test_no_plottable_columns_is_empty_not_error() {
        let dataset = Dataset::new(vec![Column::new(
            "when",
            DType::DateTime,
            vec![Value::Null, Value::Null],
        )]);
        assert!(run(&dataset).is_empty());
    }

    #[test]
    fn test_all_missing_numeric_column_skips_histogram() {
        let dataset = Dataset::new(vec![
            Column::new("empty", DType::Float, vec![Value::Null, Value::Null, Value::Null]),
            Column::inferred("full", vec![Value::Int(1), Value::Int(2), Value::Int(4)]),
        ]);
        let charts = run(&dataset);
        assert_eq!(kinds(&charts), vec![ChartKind::Histogram, ChartKind::Heatmap]);
        assert_eq!(charts[0].provenance.columns, vec!["full".to_string()]);
    }

    #[test]
    fn test_scores_are_finite() {
        let dataset = Dataset::new(vec![
            Column::inferred("same", vec![Value::Int(3), Value::Int(3), Value::Int(3)]),
            Column::inferred("up", vec![Value::Int(1), Value::Int(2), Value::Int(9)]),
            Column::inferred("tag", vec!["x".into(), "y".into(), "x".into()]),
        ]);
        let charts = run(&dataset);
        assert_eq!(
            kinds(&charts),
            vec![
                ChartKind::Histogram,
                ChartKind::Histogram,
                ChartKind::Bar,
                ChartKind::Heatmap
            ]
        );
        assert!(charts.iter().all(|c| c.provenance.score.is_finite()));
        assert_eq!(charts[0].provenance.score, 0.0);
    }
}
