//! Runs the insight pipeline over a batch of datasets.

use shared::settings::InsightLimits;
use shared::{ChartArtifact, Dataset, InsightReport, ProfilingError, RenderableResponse};

use crate::composer::compose;
use crate::profiler::profile;
use crate::summarizer::summarize;
use crate::synthesizer::synthesize;

/// Narrative and charts for one dataset
#[derive(Debug, Clone)]
pub struct DatasetInsights {
    pub text: String,
    pub charts: Vec<ChartArtifact>,
}

/// Automatic exploratory analysis with fixed caps
#[derive(Debug, Clone, Default)]
pub struct AutoInsight {
    limits: InsightLimits,
}

impl AutoInsight {
    pub fn new(limits: InsightLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &InsightLimits {
        &self.limits
    }

    /// Profile, summarize, chart and describe a single dataset
    pub fn analyze(&self, name: &str, dataset: &Dataset) -> Result<DatasetInsights, ProfilingError> {
        let profile = profile(dataset, &self.limits)?;
        let stats = summarize(dataset, &profile, &self.limits);
        let charts = synthesize(dataset, &profile, &self.limits)
            .into_iter()
            .map(|mut chart| {
                chart.provenance.dataset = Some(name.to_string());
                chart
            })
            .collect();
        let text = compose(name, &profile, &stats);
        Ok(DatasetInsights { text, charts })
    }

    /// Report over every dataset in input order.
    ///
    /// Each dataset contributes its narrative followed by its charts. A dataset
    /// that fails to profile contributes a single error entry instead and the
    /// rest still run.
    pub fn generate_report(&self, datasets: &[(String, Dataset)]) -> InsightReport {
        let mut report = InsightReport::new();

        for (name, dataset) in datasets {
            match self.analyze(name, dataset) {
                Ok(insights) => {
                    tracing::info!(
                        "Generated insights for '{}': {} charts",
                        name,
                        insights.charts.len()
                    );
                    report.push(RenderableResponse::Text(insights.text));
                    for chart in insights.charts {
                        report.push(RenderableResponse::Chart(chart));
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to generate insights for '{}': {}", name, e);
                    report.push(RenderableResponse::Error(format!(
                        "Failed to generate insights for '{}': {}",
                        name, e
                    )));
                }
            }
        }

        report
    }
}

/// [`AutoInsight::generate_report`] with default limits
pub fn generate_report(datasets: &[(String, Dataset)]) -> InsightReport {
    AutoInsight::default().generate_report(datasets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Column, ResponseKind, Value};

    #[test]
    fn test_failure_is_isolated_per_dataset() {
        let broken = Dataset::with_row_count(5, vec![Column::inferred("x", vec![Value::Int(1)])]);
        let good = Dataset::new(vec![Column::inferred(
            "y",
            vec![Value::Int(1), Value::Int(2), Value::Int(3)],
        )]);
        let report = generate_report(&[
            ("broken.csv".to_string(), broken),
            ("good.csv".to_string(), good),
        ]);

        assert_eq!(
            report.kinds(),
            vec![ResponseKind::Error, ResponseKind::Text, ResponseKind::Chart]
        );
        assert!(report.entries[0]
            .as_error()
            .unwrap()
            .contains("'broken.csv'"));
        let chart = report.charts().next().unwrap();
        assert_eq!(chart.provenance.dataset.as_deref(), Some("good.csv"));
    }

    #[test]
    fn test_datasets_keep_input_order() {
        let make = |n: &str| Dataset::new(vec![Column::inferred(n, vec!["a".into(), "b".into()])]);
        let report = generate_report(&[
            ("first".to_string(), make("p")),
            ("second".to_string(), make("q")),
        ]);
        let texts: Vec<&str> = report.texts().collect();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].starts_with("## first"));
        assert!(texts[1].starts_with("## second"));
        assert_eq!(
            report.kinds(),
            vec![
                ResponseKind::Text,
                ResponseKind::Chart,
                ResponseKind::Text,
                ResponseKind::Chart
            ]
        );
    }

    #[test]
    fn test_empty_batch() {
        assert!(generate_report(&[]).is_empty());
    }
}
