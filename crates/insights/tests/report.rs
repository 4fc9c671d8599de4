use insights::{generate_report, profile, AutoInsight};
use shared::settings::InsightLimits;
use shared::{ChartKind, Column, DType, Dataset, ResponseKind, Value};

fn region_sales() -> Dataset {
    let mut region = Vec::new();
    for (name, count) in [("North", 350), ("South", 250), ("East", 200), ("West", 200)] {
        for _ in 0..count {
            region.push(Value::from(name));
        }
    }
    let sales = (0..region.len())
        .map(|i| Value::Float(100.0 + (i % 37) as f64 * 3.5))
        .collect();
    Dataset::new(vec![
        Column::inferred("Region", region),
        Column::inferred("Sales", sales),
    ])
}

#[test]
fn region_sales_report() {
    let report = generate_report(&[("sales.csv".to_string(), region_sales())]);

    assert_eq!(
        report.kinds(),
        vec![ResponseKind::Text, ResponseKind::Chart, ResponseKind::Chart]
    );
    let text = report.entries[0].as_text().unwrap();
    assert!(text.contains("4 unique values, most frequent: North (350)"));
    assert!(text.contains("- **Rows**: 1,000"));

    let kinds: Vec<ChartKind> = report.charts().map(|c| c.provenance.chart_kind).collect();
    assert_eq!(kinds, vec![ChartKind::Histogram, ChartKind::Bar]);
}

#[test]
fn synthesized_histogram_exports_as_png() {
    let report = generate_report(&[("sales.csv".to_string(), region_sales())]);
    let histogram = report
        .charts()
        .find(|c| c.provenance.chart_kind == ChartKind::Histogram)
        .unwrap();

    let bytes = render::export_png(histogram).unwrap();
    assert!(!bytes.is_empty());
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn zero_row_dataset() {
    let dataset = Dataset::new(vec![
        Column::new("a", DType::Int, Vec::new()),
        Column::new("b", DType::Float, Vec::new()),
        Column::new("c", DType::Text, Vec::new()),
    ]);
    let profile = profile(&dataset, &InsightLimits::default()).unwrap();
    assert!(profile.columns.iter().all(|c| c.missing_ratio == 0.0));

    let report = generate_report(&[("empty.csv".to_string(), dataset)]);
    assert_eq!(report.kinds(), vec![ResponseKind::Text]);
    assert!(!report.entries[0].as_text().unwrap().contains("Missing Values"));
}

#[test]
fn heatmap_limited_to_first_ten_numeric_columns() {
    for numeric_count in [11, 15] {
        let columns: Vec<Column> = (0..numeric_count)
            .map(|i| {
                Column::inferred(
                    format!("m{:02}", i),
                    (0..8).map(|r| Value::Int((r * r + i) % 7)).collect(),
                )
            })
            .collect();
        let report = generate_report(&[("wide.csv".to_string(), Dataset::new(columns))]);

        let heatmaps: Vec<_> = report
            .charts()
            .filter(|c| c.provenance.chart_kind == ChartKind::Heatmap)
            .collect();
        assert_eq!(heatmaps.len(), 1);
        let expected: Vec<String> = (0..10).map(|i| format!("m{:02}", i)).collect();
        assert_eq!(heatmaps[0].provenance.columns, expected);
    }
}

#[test]
fn high_cardinality_column_is_skipped_and_named() {
    let ids: Vec<Value> = (0..40).map(|i| Value::Text(format!("cust-{}", i))).collect();
    let tier: Vec<Value> = (0..40).map(|i| Value::from(if i % 2 == 0 { "gold" } else { "basic" })).collect();
    let dataset = Dataset::new(vec![
        Column::inferred("customer", ids),
        Column::inferred("tier", tier),
    ]);
    let report = generate_report(&[("customers.csv".to_string(), dataset)]);

    let bars: Vec<&str> = report
        .charts()
        .filter(|c| c.provenance.chart_kind == ChartKind::Bar)
        .map(|c| c.provenance.columns[0].as_str())
        .collect();
    assert_eq!(bars, vec!["tier"]);

    let text = report.texts().next().unwrap();
    assert!(text.contains("customer: skipped, 40 unique values"));
}

#[test]
fn numeric_and_eligible_categorical_yield_text_then_charts() {
    let dataset = Dataset::new(vec![
        Column::inferred("n", vec![Value::Int(1), Value::Int(5), Value::Int(2)]),
        Column::inferred("c", vec!["x".into(), "y".into(), "x".into()]),
    ]);
    let report = generate_report(&[("small.csv".to_string(), dataset)]);
    assert_eq!(report.kinds()[0], ResponseKind::Text);
    assert!(report.charts().count() >= 1);
}

#[test]
fn custom_limits_are_respected() {
    let limits = InsightLimits {
        max_histograms: 1,
        ..InsightLimits::default()
    };
    let dataset = Dataset::new(vec![
        Column::inferred("a", vec![Value::Int(1), Value::Int(2)]),
        Column::inferred("b", vec![Value::Int(3), Value::Int(1)]),
    ]);
    let report = AutoInsight::new(limits).generate_report(&[("x".to_string(), dataset)]);
    let kinds: Vec<ChartKind> = report.charts().map(|c| c.provenance.chart_kind).collect();
    assert_eq!(kinds, vec![ChartKind::Histogram, ChartKind::Heatmap]);
}

#[test]
fn charts_by_score_ranks_without_reordering_report() {
    let dataset = Dataset::new(vec![
        Column::inferred("flat", vec![Value::Int(1), Value::Int(1), Value::Int(1), Value::Int(2)]),
        Column::inferred("spread", vec![Value::Int(1), Value::Int(50), Value::Int(3), Value::Int(900)]),
    ]);
    let report = generate_report(&[("d".to_string(), dataset)]);

    let ranked = report.charts_by_score();
    assert_eq!(ranked.len(), report.charts().count());
    for pair in ranked.windows(2) {
        assert!(pair[0].provenance.score >= pair[1].provenance.score);
    }
    assert_eq!(
        report.charts().next().unwrap().provenance.columns,
        vec!["flat".to_string()]
    );
}
