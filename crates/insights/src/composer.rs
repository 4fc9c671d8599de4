//! Narrative report for one dataset.

use crate::profiler::DatasetProfile;
use crate::summarizer::SummaryStats;

/// Markdown narrative built from the profile and summary.
///
/// Everything iterates in column order, so the same input always yields the
/// same text.
pub fn compose(dataset_name: &str, profile: &DatasetProfile, stats: &SummaryStats) -> String {
    let mut output = String::new();

    output.push_str(&format!("## {}\n\n", dataset_name));
    output.push_str(&format!("- **Rows**: {}\n", thousands(profile.rows)));
    output.push_str(&format!("- **Columns**: {}\n", profile.cols));

    let counts = profile.kind_counts();
    output.push_str(&format!(
        "- **Column kinds**: {} numeric, {} categorical, {} other\n\n",
        counts.numeric, counts.categorical, counts.other
    ));

    if profile.missing.has_missing() {
        output.push_str("### Missing Values\n\n");
        for column in &profile.missing.columns {
            output.push_str(&format!(
                "- {}: {} ({:.1}%)\n",
                column.name,
                thousands(column.count),
                column.ratio * 100.0
            ));
        }
        output.push('\n');
    }

    if !stats.numeric.is_empty() {
        output.push_str("### Numeric Columns\n\n");
        output.push_str("| Column | Mean | Std | Min | Median | Max |\n");
        output.push_str("|--------|------|-----|-----|--------|-----|\n");
        for s in &stats.numeric {
            output.push_str(&format!(
                "| {} | {:.2} | {:.2} | {:.2} | {:.2} | {:.2} |\n",
                s.column, s.mean, s.std, s.min, s.median, s.max
            ));
        }
        if !stats.omitted_numeric.is_empty() {
            output.push_str(&format!(
                "\n... and {} more numeric columns\n",
                stats.omitted_numeric.len()
            ));
        }
        output.push('\n');
    }

    if !stats.categorical.is_empty() || !stats.skipped.is_empty() {
        output.push_str("### Categorical Columns\n\n");
        for c in &stats.categorical {
            match c.most_frequent() {
                Some((value, count)) => output.push_str(&format!(
                    "- {}: {} unique values, most frequent: {} ({})\n",
                    c.column,
                    c.unique_count,
                    value,
                    thousands(*count)
                )),
                None => output.push_str(&format!("- {}: no values\n", c.column)),
            }
        }
        for s in &stats.skipped {
            output.push_str(&format!(
                "- {}: skipped, {} unique values exceeds the limit of {}\n",
                s.column, s.unique_count, s.limit
            ));
        }
        output.push('\n');
    }

    output
}

/// 1234567 -> "1,234,567"
fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiler::profile;
    use crate::summarizer::summarize;
    use shared::settings::InsightLimits;
    use shared::{Column, Dataset, Value};

    fn report(dataset: &Dataset) -> String {
        let limits = InsightLimits::default();
        let profile = profile(dataset, &limits).unwrap();
        let stats = summarize(dataset, &profile, &limits);
        compose("sales.csv", &profile, &stats)
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_missing_section_only_when_needed() {
        let clean = Dataset::new(vec![Column::inferred("x", vec![Value::Int(1), Value::Int(2)])]);
        assert!(!report(&clean).contains("Missing Values"));

        let gappy = Dataset::new(vec![Column::inferred("x", vec![Value::Int(1), Value::Null])]);
        let text = report(&gappy);
        assert!(text.contains("### Missing Values"));
        assert!(text.contains("- x: 1 (50.0%)"));
    }

    #[test]
    fn test_names_skipped_columns() {
        let ids: Vec<Value> = (0..21).map(|i| Value::Text(format!("c{}", i))).collect();
        let dataset = Dataset::new(vec![Column::inferred("customer_id", ids)]);
        let text = report(&dataset);
        assert!(text.contains("- customer_id: skipped, 21 unique values exceeds the limit of 20"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let dataset = Dataset::new(vec![
            Column::inferred("k", vec!["b".into(), "a".into(), "b".into(), "a".into()]),
            Column::inferred("v", vec![Value::Float(1.5), Value::Null, Value::Int(3), Value::Int(4)]),
        ]);
        let first = report(&dataset);
        for _ in 0..5 {
            assert_eq!(report(&dataset), first);
        }
        assert!(first.starts_with("## sales.csv\n"));
        assert!(first.contains("- k: 2 unique values, most frequent: b (2)"));
    }
}
