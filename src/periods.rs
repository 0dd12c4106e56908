// Reporting periods for a dataset.
//
// The catalog is fixed when the dataset layout is chosen, never derived from
// the rows. It always lists contiguous calendar months, newest first.
use crate::error::{Error, Result};
use crate::types::Schema;
use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodDescriptor {
    /// Column name as it appears in the export (`dec`, `jun-2025`).
    pub key: String,
    pub label: String,
    /// Short month name (`Jun`).
    pub month_name: String,
    pub month: u32,
    pub quarter: u32,
    pub year: i32,
    /// Position of this period inside `MetricRecord::values`.
    pub column: usize,
}

impl PeriodDescriptor {
    fn from_date(date: NaiveDate, key: String, label: String, column: usize) -> Self {
        let month = date.month();
        Self {
            key,
            label,
            month_name: date.format("%b").to_string(),
            month,
            quarter: (month - 1) / 3 + 1,
            year: date.year(),
            column,
        }
    }
}

/// Inputs that pin the catalog for a dataset layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSettings {
    /// Calendar year of the `jan..dec` columns.
    pub year: i32,
    /// Newest month column of the rolling layout (day is ignored).
    pub latest_month: NaiveDate,
    /// Number of month columns in the rolling layout.
    pub months: usize,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            year: 2024,
            latest_month: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap_or_default(),
            months: 18,
        }
    }
}

/// A run of consecutive catalog columns sharing a header cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderSpan {
    pub label: String,
    pub span: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodCatalog {
    periods: Vec<PeriodDescriptor>,
}

impl PeriodCatalog {
    pub fn for_schema(schema: Schema, settings: &CatalogSettings) -> Result<Self> {
        match schema {
            Schema::Package => Self::calendar_year(settings.year),
            Schema::Trainer => Self::rolling_months(settings.latest_month, settings.months),
        }
    }

    /// Twelve `jan..dec` columns of one year, listed Dec first. The file
    /// stores them Jan first, so column `i` of the file is month `i + 1`.
    pub fn calendar_year(year: i32) -> Result<Self> {
        let mut periods = Vec::with_capacity(12);
        for month in (1..=12u32).rev() {
            let date = NaiveDate::from_ymd_opt(year, month, 1)
                .ok_or_else(|| Error::config(format!("invalid year {year}")))?;
            let label = date.format("%b").to_string();
            periods.push(PeriodDescriptor::from_date(
                date,
                label.to_lowercase(),
                label,
                (month - 1) as usize,
            ));
        }
        Ok(Self { periods })
    }

    /// `count` months ending at `latest`, newest first, which is also the
    /// file's column order.
    pub fn rolling_months(latest: NaiveDate, count: usize) -> Result<Self> {
        let first = latest
            .with_day(1)
            .ok_or_else(|| Error::config("invalid latest month"))?;
        let mut periods = Vec::with_capacity(count);
        for i in 0..count {
            let date = first
                .checked_sub_months(Months::new(i as u32))
                .ok_or_else(|| Error::config(format!("month offset {i} out of range")))?;
            let key = date.format("%b-%Y").to_string().to_lowercase();
            let label = date.format("%b %Y").to_string();
            periods.push(PeriodDescriptor::from_date(date, key, label, i));
        }
        Ok(Self { periods })
    }

    pub fn periods(&self) -> &[PeriodDescriptor] {
        &self.periods
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn latest(&self) -> Option<&PeriodDescriptor> {
        self.periods.first()
    }

    pub fn get(&self, key: &str) -> Option<&PeriodDescriptor> {
        self.periods.iter().find(|p| p.key == key)
    }

    /// The chronologically preceding period, which is the next catalog entry.
    pub fn previous(&self, key: &str) -> Option<&PeriodDescriptor> {
        let idx = self.periods.iter().position(|p| p.key == key)?;
        self.periods.get(idx + 1)
    }

    /// Year header cells over the canonical column order.
    pub fn year_spans(&self) -> Vec<HeaderSpan> {
        spans(&self.periods, |p| p.year.to_string())
    }

    /// Quarter header cells over the canonical column order.
    pub fn quarter_spans(&self) -> Vec<HeaderSpan> {
        spans(&self.periods, |p| format!("Q{} {}", p.quarter, p.year))
    }
}

fn spans<F>(periods: &[PeriodDescriptor], label_of: F) -> Vec<HeaderSpan>
where
    F: Fn(&PeriodDescriptor) -> String,
{
    let mut out: Vec<HeaderSpan> = Vec::new();
    for p in periods {
        let label = label_of(p);
        match out.last_mut() {
            Some(last) if last.label == label => last.span += 1,
            _ => out.push(HeaderSpan { label, span: 1 }),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn june_2025() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn calendar_year_runs_december_to_january() {
        let catalog = PeriodCatalog::calendar_year(2024).unwrap();
        let keys: Vec<&str> = catalog.periods().iter().map(|p| p.key.as_str()).collect();
        assert_eq!(keys.first(), Some(&"dec"));
        assert_eq!(keys.last(), Some(&"jan"));
        let dec = catalog.get("dec").unwrap();
        assert_eq!(dec.column, 11);
        assert_eq!(dec.quarter, 4);
        assert_eq!(catalog.get("jan").unwrap().column, 0);
    }

    #[test]
    fn rolling_months_cross_year_boundary() {
        let catalog = PeriodCatalog::rolling_months(june_2025(), 18).unwrap();
        assert_eq!(catalog.len(), 18);
        let first = catalog.latest().unwrap();
        assert_eq!(first.key, "jun-2025");
        assert_eq!(first.label, "Jun 2025");
        assert_eq!(first.quarter, 2);
        let last = &catalog.periods()[17];
        assert_eq!(last.key, "jan-2024");
        assert_eq!(last.year, 2024);
        assert_eq!(last.column, 17);
    }

    #[test]
    fn previous_is_the_next_entry() {
        let catalog = PeriodCatalog::rolling_months(june_2025(), 18).unwrap();
        assert_eq!(catalog.previous("jan-2025").unwrap().key, "dec-2024");
        assert!(catalog.previous("jan-2024").is_none());
        assert!(catalog.previous("missing").is_none());
    }

    #[test]
    fn header_spans_follow_column_order() {
        let catalog = PeriodCatalog::rolling_months(june_2025(), 18).unwrap();
        let years = catalog.year_spans();
        assert_eq!(
            years,
            vec![
                HeaderSpan { label: "2025".into(), span: 6 },
                HeaderSpan { label: "2024".into(), span: 12 },
            ]
        );
        let quarters = catalog.quarter_spans();
        assert_eq!(quarters.first().unwrap().label, "Q2 2025");
        assert_eq!(quarters.iter().map(|s| s.span).sum::<usize>(), 18);
    }
}
