use crate::error::{Error, Result};
use crate::periods::{CatalogSettings, PeriodCatalog};
use crate::types::{Identity, MetricRecord, PackageIdentity, Schema, TrainerIdentity};
use csv::{ReaderBuilder, Trim};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    /// Rows with fewer cells than the layout expects; the gaps read as empty.
    pub short_rows: usize,
}

/// A loaded export: its layout, the period columns it carries and the rows.
/// Nothing mutates it after loading.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub schema: Schema,
    pub catalog: PeriodCatalog,
    pub records: Vec<MetricRecord>,
}

impl Dataset {
    pub fn from_text(raw: &str, schema: Schema, settings: &CatalogSettings) -> Result<(Self, LoadReport)> {
        let catalog = PeriodCatalog::for_schema(schema, settings)?;
        let (records, report) = parse(raw, schema, catalog.len())?;
        Ok((
            Self {
                schema,
                catalog,
                records,
            },
            report,
        ))
    }
}

/// Read a dataset from a local path or an `http(s)://` URL. One attempt, no
/// retry; any failure is returned to the caller as is.
pub fn load(source: &str, schema: Schema, settings: &CatalogSettings) -> Result<(Dataset, LoadReport)> {
    let raw = fetch_source(source)?;
    let (dataset, report) = Dataset::from_text(&raw, schema, settings)?;
    info!(
        source,
        rows = report.total_rows,
        short_rows = report.short_rows,
        periods = dataset.catalog.len(),
        "loaded metrics dataset"
    );
    Ok((dataset, report))
}

pub fn fetch_source(source: &str) -> Result<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        debug!(url = source, "fetching metrics over HTTP");
        let response = reqwest::blocking::get(source)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::http(format!("{source} returned {status}")));
        }
        Ok(response.text()?)
    } else {
        Ok(std::fs::read_to_string(source)?)
    }
}

/// Turn CSV text into records. The header row is skipped and columns are
/// taken by position; missing cells become empty strings.
pub fn parse(raw: &str, schema: Schema, periods: usize) -> Result<(Vec<MetricRecord>, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(raw.as_bytes());

    let lead = schema.leading_columns();
    let expected = lead + periods + 2;
    let mut records = Vec::new();
    let mut total_rows = 0usize;
    let mut short_rows = 0usize;

    for result in rdr.records() {
        let row = result?;
        total_rows += 1;
        if row.len() < expected {
            short_rows += 1;
        }

        let cell = |i: usize| row.get(i).unwrap_or("").to_string();
        let identity = match schema {
            Schema::Package => Identity::Package(PackageIdentity {
                location: cell(0),
                category: cell(1),
                package: cell(2),
            }),
            Schema::Trainer => Identity::Trainer(TrainerIdentity {
                location: cell(0),
                trainer: cell(1),
                is_new: cell(2),
                first_visit_location: cell(3),
            }),
        };
        records.push(MetricRecord {
            identity,
            values: (lead..lead + periods).map(cell).collect(),
            total: cell(lead + periods),
            metric: cell(lead + periods + 1),
        });
    }

    if short_rows > 0 {
        warn!(short_rows, expected, "rows with missing cells were padded");
    }
    Ok((records, LoadReport { total_rows, short_rows }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const PACKAGE_CSV: &str = "\
Location,Category,Package,Jan,Feb,Mar,Apr,May,Jun,Jul,Aug,Sep,Oct,Nov,Dec,Total,Metric
Kenkere House,Memberships,Studio 12,100,200,,,,,,,,,,\"1,500\",\"1,800\",Gross Sales
Kenkere House,Class Packs,Single Class,5,,,
";

    #[test]
    fn package_rows_map_by_position() {
        let (records, report) = parse(PACKAGE_CSV, Schema::Package, 12).unwrap();
        assert_eq!(report.total_rows, 2);
        assert_eq!(report.short_rows, 1);
        let first = &records[0];
        assert_eq!(first.location(), "Kenkere House");
        assert_eq!(first.label(), "Studio 12");
        assert_eq!(first.values[0], "100");
        assert_eq!(first.values[11], "1,500");
        assert_eq!(first.total, "1,800");
        assert_eq!(first.metric, "Gross Sales");
    }

    #[test]
    fn short_rows_default_to_empty_strings() {
        let (records, _) = parse(PACKAGE_CSV, Schema::Package, 12).unwrap();
        let short = &records[1];
        assert_eq!(short.values.len(), 12);
        assert_eq!(short.values[0], "5");
        assert_eq!(short.values[11], "");
        assert_eq!(short.total, "");
        assert_eq!(short.metric, "");
    }

    #[test]
    fn trainer_layout_reads_rolling_months() {
        let settings = CatalogSettings {
            year: 2024,
            latest_month: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            months: 3,
        };
        let raw = "\
location,trainer,is_new,first_visit_location,jun-2025,may-2025,apr-2025,grand_total,metric
Supreme HQ Bandra,Asha,Yes,Kenkere House,12,10,,22,Sessions
";
        let (dataset, _) = Dataset::from_text(raw, Schema::Trainer, &settings).unwrap();
        let r = &dataset.records[0];
        let jun = dataset.catalog.get("jun-2025").unwrap();
        assert_eq!(r.period_value(jun), "12");
        assert_eq!(r.total, "22");
        assert_eq!(r.metric, "Sessions");
        assert_eq!(r.label(), "Asha");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = fetch_source("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
