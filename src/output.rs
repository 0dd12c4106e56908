use crate::error::Result;
use crate::periods::HeaderSpan;
use crate::reports::{Cell, PivotRow, PivotTable};
use crate::util::format_int;
use crate::views::ViewMode;
use serde::Serialize;
use std::path::Path;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

const NEGATIVE_MARK: &str = "⚠";

#[derive(Debug, Clone, Tabled)]
pub struct LocationRow {
    #[tabled(rename = "Location")]
    pub location: String,
    #[tabled(rename = "Rows")]
    pub rows: String,
    #[tabled(rename = "Metrics")]
    pub metrics: String,
}

impl LocationRow {
    pub fn new(display_name: &str, rows: usize, metrics: &[String]) -> Self {
        Self {
            location: display_name.to_string(),
            rows: format_int(rows),
            metrics: metrics.join(", "),
        }
    }
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Flat CSV of a pivot: one line per displayed row, growth folded into the cell text.
pub fn write_pivot_csv(path: &Path, table: &PivotTable) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for record in pivot_records(table, true) {
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize) -> String
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        return "(no rows)\n".to_string();
    }
    Table::new(slice).with(Style::markdown()).to_string()
}

/// Markdown rendering of a pivot, preceded by the grouped header lines.
pub fn render_pivot(table: &PivotTable) -> String {
    let mut out = String::new();
    let heading = match &table.location {
        Some(loc) => format!("{} · {} ({})", table.metric, table.view, loc),
        None => format!("{} · {}", table.metric, table.view),
    };
    out.push_str(&heading);
    out.push('\n');
    if table.is_empty() {
        out.push_str("(no rows)\n");
        return out;
    }
    for row in &table.headers {
        out.push_str(&banner(row));
        out.push('\n');
    }
    out.push('\n');

    let mut builder = Builder::default();
    for record in pivot_records(table, false) {
        builder.push_record(record);
    }
    out.push_str(&builder.build().with(Style::markdown()).to_string());
    out.push('\n');
    out
}

fn banner(spans: &[HeaderSpan]) -> String {
    spans
        .iter()
        .map(|s| format!("{} ({})", s.label, s.span))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn pivot_records(table: &PivotTable, flat: bool) -> Vec<Vec<String>> {
    let mut header = vec![table.dimension.title().to_string()];
    for c in &table.columns {
        let label = match table.view {
            ViewMode::Chronological | ViewMode::YearOnYear => c.label.clone(),
            ViewMode::Quarterly | ViewMode::Comparative => format!("{}: {}", c.group, c.label),
        };
        header.push(label);
    }
    header.push("Total".to_string());

    let mut records = vec![header];
    for group in &table.groups {
        let marker = if group.expanded { "▾" } else { "▸" };
        let label = if flat {
            group.summary.label.clone()
        } else {
            format!("{marker} {}", group.summary.label)
        };
        records.push(row_record(label, &group.summary));
        for row in &group.rows {
            let label = if flat {
                row.label.clone()
            } else {
                format!("  {}", row.label)
            };
            records.push(row_record(label, row));
        }
    }
    records.push(row_record(table.totals.label.clone(), &table.totals));
    records
}

fn row_record(label: String, row: &PivotRow) -> Vec<String> {
    let mut record = Vec::with_capacity(row.cells.len() + 2);
    record.push(label);
    record.extend(row.cells.iter().map(cell_text));
    record.push(cell_text(&row.total));
    record
}

pub fn cell_text(cell: &Cell) -> String {
    let mut s = cell.display.clone();
    if cell.negative {
        s.push(' ');
        s.push_str(NEGATIVE_MARK);
    }
    if let Some(g) = &cell.growth {
        s.push_str(&format!(" {g}"));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::growth::Growth;

    #[test]
    fn cell_text_flags_negatives_and_growth() {
        let cell = Cell {
            value: Some(-500.0),
            display: "-₹500".into(),
            negative: true,
            growth: Growth::between(-500.0, 1000.0),
        };
        assert_eq!(cell_text(&cell), "-₹500 ⚠ ▼150.0%");
    }

    #[test]
    fn location_rows_render_as_markdown() {
        let rows = vec![LocationRow::new(
            "Supreme HQ, Bandra",
            1200,
            &["Gross Sales".to_string(), "Footfall".to_string()],
        )];
        let table = preview_table_rows(&rows, 5);
        assert!(table.contains("| Location"));
        assert!(table.contains("1,200"));
        assert!(table.contains("Gross Sales, Footfall"));
        assert_eq!(preview_table_rows::<LocationRow>(&[], 5), "(no rows)\n");
    }

    #[test]
    fn banner_lists_spans() {
        let spans = vec![
            HeaderSpan { label: "2025".into(), span: 6 },
            HeaderSpan { label: "2024".into(), span: 12 },
        ];
        assert_eq!(banner(&spans), "2025 (6) | 2024 (12)");
    }
}
