use studio_metrics::aggregate::MetricPolicies;
use studio_metrics::loader;
use studio_metrics::output;
use studio_metrics::periods::CatalogSettings;
use studio_metrics::reports::{build_pivot, PivotTable, Selection};
use studio_metrics::types::{Dimension, Schema};
use studio_metrics::views::ViewMode;

fn gross_sales(view: ViewMode, expand_all: bool) -> PivotTable {
    let path = format!("{}/tests/fixtures/Metrics.csv", env!("CARGO_MANIFEST_DIR"));
    let (ds, _) = loader::load(&path, Schema::Package, &CatalogSettings::default()).unwrap();
    let mut sel = Selection::new("Gross Sales", Dimension::Category);
    sel.view = view;
    sel.expand_all = expand_all;
    build_pivot(&ds, &MetricPolicies::default(), &sel)
}

#[test]
fn csv_export_has_one_line_per_row() {
    let table = gross_sales(ViewMode::Chronological, true);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gross_sales.csv");
    output::write_pivot_csv(&path, &table).unwrap();

    let mut rdr = csv::ReaderBuilder::new().has_headers(false).from_path(&path).unwrap();
    let lines: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    // header + 3 group totals + 5 member rows + grand total
    assert_eq!(lines.len(), 10);
    assert_eq!(lines[0].get(0), Some("Category"));
    assert_eq!(lines[0].get(1), Some("Dec"));
    assert_eq!(lines[0].get(13), Some("Total"));
    assert_eq!(lines[1].get(0), Some("MEMBERSHIPS TOTAL"));
    assert_eq!(lines[9].get(0), Some("TOTALS"));
    assert!(lines[1].get(1).unwrap().starts_with("₹5.4L ▲13.7%"));
}

#[test]
fn json_export_keeps_numbers_and_layout() {
    let table = gross_sales(ViewMode::Quarterly, false);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gross_sales.json");
    output::write_json(&path, &table).unwrap();

    let v: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(v["metric"], "Gross Sales");
    assert_eq!(v["view"], "quarterly");
    assert_eq!(v["policy"], "sum");
    assert_eq!(v["groups"].as_array().unwrap().len(), 3);
    assert_eq!(v["groups"][0]["rows"].as_array().unwrap().len(), 0);
    assert_eq!(v["columns"][0]["group"], "Q4 2024");
    assert_eq!(v["groups"][0]["summary"]["cells"][0]["value"], 540000.0);
    assert!(v["groups"][0]["summary"]["cells"][0]["growth"].is_null());
}

#[test]
fn terminal_rendering_marks_groups_and_headers() {
    let collapsed = output::render_pivot(&gross_sales(ViewMode::Chronological, false));
    assert!(collapsed.starts_with("Gross Sales · Chronological"));
    assert!(collapsed.contains("2024 (12)"));
    assert!(collapsed.contains("▸ MEMBERSHIPS TOTAL"));
    assert!(!collapsed.contains("Studio Annual Unlimited"));

    let expanded = output::render_pivot(&gross_sales(ViewMode::Comparative, true));
    assert!(expanded.contains("Best 3 Months (3) | Recent 3 Months (3)"));
    assert!(expanded.contains("▾ MEMBERSHIPS TOTAL"));
    assert!(expanded.contains("Studio Annual Unlimited"));
    assert!(expanded.contains("⚠"));
}
