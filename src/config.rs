use crate::aggregate::{MetricPolicies, DEFAULT_AVERAGE_METRICS};
use crate::error::{Error, Result};
use crate::periods::CatalogSettings;
use crate::types::Schema;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    /// File path or `http(s)://` URL of the metrics export.
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub schema: Schema,
    /// Calendar year of the package layout.
    #[serde(default = "default_year")]
    pub year: i32,
    /// `YYYY-MM` of the newest month column in the trainer layout.
    #[serde(default = "default_latest_month")]
    pub latest_month: String,
    /// Number of month columns in the trainer layout.
    #[serde(default = "default_months")]
    pub months: usize,
    /// Metrics whose groups are averaged instead of summed.
    #[serde(default = "default_average_metrics")]
    pub average_metrics: Vec<String>,
    /// Display names for raw location values.
    #[serde(default = "default_location_names")]
    pub location_names: BTreeMap<String, String>,
}

// Defaults
fn default_source() -> String {
    "Metrics.csv".into()
}
fn default_average_metrics() -> Vec<String> {
    DEFAULT_AVERAGE_METRICS.iter().map(|m| m.to_string()).collect()
}
fn default_location_names() -> BTreeMap<String, String> {
    [
        ("Kwality House Kemps Corner", "Kwality House, Kemps Corner"),
        ("Supreme HQ Bandra", "Supreme HQ, Bandra"),
        ("Kenkere House", "Kenkere House"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
fn default_year() -> i32 {
    2024
}
fn default_latest_month() -> String {
    "2025-06".into()
}
fn default_months() -> usize {
    18
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: default_source(),
            schema: Schema::default(),
            year: default_year(),
            latest_month: default_latest_month(),
            months: default_months(),
            average_metrics: default_average_metrics(),
            location_names: default_location_names(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Failed to read config {}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| Error::config(format!("Failed to parse config: {e}")))
    }

    /// Load `path` when it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn catalog_settings(&self) -> Result<CatalogSettings> {
        let latest_month = NaiveDate::parse_from_str(&format!("{}-01", self.latest_month), "%Y-%m-%d")
            .map_err(|e| {
                Error::config(format!(
                    "latest_month '{}' is not YYYY-MM: {e}",
                    self.latest_month
                ))
            })?;
        if self.months == 0 {
            return Err(Error::config("months must be at least 1"));
        }
        Ok(CatalogSettings {
            year: self.year,
            latest_month,
            months: self.months,
        })
    }

    pub fn policies(&self) -> MetricPolicies {
        MetricPolicies::new(self.average_metrics.iter().cloned())
    }

    pub fn display_name<'a>(&'a self, location: &'a str) -> &'a str {
        self.location_names
            .get(location)
            .map(String::as_str)
            .unwrap_or(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AggregationPolicy;

    #[test]
    fn full_config_parses() {
        let toml = r#"
source = "https://example.com/Metrics.csv"
schema = "trainer"
average_metrics = ["Footfall"]
latest_month = "2024-12"
months = 12

[location_names]
"Kenkere House" = "Kenkere House, Bengaluru"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.schema, Schema::Trainer);
        assert_eq!(config.year, 2024);
        let settings = config.catalog_settings().unwrap();
        assert_eq!(settings.latest_month, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
        assert_eq!(settings.months, 12);
        assert_eq!(config.policies().policy_for("Footfall"), AggregationPolicy::Average);
        assert_eq!(config.policies().policy_for("Retention Rate"), AggregationPolicy::Sum);
        assert_eq!(config.display_name("Kenkere House"), "Kenkere House, Bengaluru");
        assert_eq!(config.display_name("Elsewhere"), "Elsewhere");
    }

    #[test]
    fn period_settings_are_top_level_keys() {
        let config: Config = toml::from_str("year = 2023\nlatest_month = \"2024-03\"\nmonths = 6\n").unwrap();
        let settings = config.catalog_settings().unwrap();
        assert_eq!(settings.year, 2023);
        assert_eq!(settings.latest_month, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(settings.months, 6);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.source, "Metrics.csv");
        assert_eq!(config.schema, Schema::Package);
        assert_eq!(config.months, 18);
        assert_eq!(config.display_name("Supreme HQ Bandra"), "Supreme HQ, Bandra");
        assert_eq!(config.policies().policy_for("Retention Rate"), AggregationPolicy::Average);
    }

    #[test]
    fn bad_latest_month_is_rejected() {
        let mut config = Config::default();
        config.latest_month = "June 2025".into();
        assert!(matches!(config.catalog_settings(), Err(Error::Config(_))));
        config.latest_month = "2025-06".into();
        config.months = 0;
        assert!(config.catalog_settings().is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load_or_default(Path::new("/no/such/studio.toml")).unwrap();
        assert_eq!(config.latest_month, "2025-06");
    }
}
