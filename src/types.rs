use crate::periods::PeriodDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column layout of a metrics export. Each layout has its own identity
/// columns; the period columns, total and metric name follow them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schema {
    /// `location, category, package, jan..dec, total, metric`
    #[default]
    Package,
    /// `location, trainer, is_new, first_visit_location, <months, newest first>, grand_total, metric`
    Trainer,
}

impl Schema {
    /// Number of identity columns before the first period column.
    pub fn leading_columns(self) -> usize {
        match self {
            Schema::Package => 3,
            Schema::Trainer => 4,
        }
    }

    pub fn dimensions(self) -> &'static [Dimension] {
        match self {
            Schema::Package => &[Dimension::Location, Dimension::Category, Dimension::Package],
            Schema::Trainer => &[
                Dimension::Location,
                Dimension::Trainer,
                Dimension::IsNew,
                Dimension::FirstVisitLocation,
            ],
        }
    }

    /// Dimension used when the caller does not pick one.
    pub fn default_dimension(self) -> Dimension {
        match self {
            Schema::Package => Dimension::Category,
            Schema::Trainer => Dimension::Trainer,
        }
    }
}

impl FromStr for Schema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "package" => Ok(Schema::Package),
            "trainer" => Ok(Schema::Trainer),
            other => Err(format!("unknown schema '{other}' (expected package or trainer)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Location,
    Category,
    Package,
    Trainer,
    IsNew,
    FirstVisitLocation,
}

impl Dimension {
    pub fn title(self) -> &'static str {
        match self {
            Dimension::Location => "Location",
            Dimension::Category => "Category",
            Dimension::Package => "Package",
            Dimension::Trainer => "Trainer",
            Dimension::IsNew => "New Client",
            Dimension::FirstVisitLocation => "First Visit Location",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "location" => Ok(Dimension::Location),
            "category" => Ok(Dimension::Category),
            "package" | "product" => Ok(Dimension::Package),
            "trainer" => Ok(Dimension::Trainer),
            "is_new" | "new" => Ok(Dimension::IsNew),
            "first_visit_location" | "first_visit" => Ok(Dimension::FirstVisitLocation),
            other => Err(format!("unknown dimension '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageIdentity {
    pub location: String,
    pub category: String,
    pub package: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainerIdentity {
    pub location: String,
    pub trainer: String,
    pub is_new: String,
    pub first_visit_location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "schema", rename_all = "lowercase")]
pub enum Identity {
    Package(PackageIdentity),
    Trainer(TrainerIdentity),
}

/// One row of the export: identity, one raw value per period column, the
/// precomputed row total and the name of the metric the row measures.
///
/// `values` keeps the file's column order; a `PeriodDescriptor::column`
/// indexes into it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRecord {
    pub identity: Identity,
    pub values: Vec<String>,
    pub total: String,
    pub metric: String,
}

impl MetricRecord {
    pub fn location(&self) -> &str {
        match &self.identity {
            Identity::Package(p) => &p.location,
            Identity::Trainer(t) => &t.location,
        }
    }

    /// `None` when this record's layout has no such column.
    pub fn dimension(&self, dimension: Dimension) -> Option<&str> {
        match (&self.identity, dimension) {
            (Identity::Package(p), Dimension::Location) => Some(&p.location),
            (Identity::Package(p), Dimension::Category) => Some(&p.category),
            (Identity::Package(p), Dimension::Package) => Some(&p.package),
            (Identity::Trainer(t), Dimension::Location) => Some(&t.location),
            (Identity::Trainer(t), Dimension::Trainer) => Some(&t.trainer),
            (Identity::Trainer(t), Dimension::IsNew) => Some(&t.is_new),
            (Identity::Trainer(t), Dimension::FirstVisitLocation) => Some(&t.first_visit_location),
            _ => None,
        }
    }

    /// Row heading inside a group: the package name, or the trainer.
    pub fn label(&self) -> &str {
        match &self.identity {
            Identity::Package(p) => &p.package,
            Identity::Trainer(t) => &t.trainer,
        }
    }

    pub fn period_value(&self, period: &PeriodDescriptor) -> &str {
        self.values
            .get(period.column)
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Records sharing one dimension value for the selected metric.
#[derive(Debug, Clone)]
pub struct Group<'a> {
    pub key: String,
    pub records: Vec<&'a MetricRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trainer_record() -> MetricRecord {
        MetricRecord {
            identity: Identity::Trainer(TrainerIdentity {
                location: "Kenkere House".into(),
                trainer: "Asha".into(),
                is_new: "Yes".into(),
                first_visit_location: "Supreme HQ Bandra".into(),
            }),
            values: vec!["10".into(), "".into()],
            total: "10".into(),
            metric: "Sessions".into(),
        }
    }

    #[test]
    fn dimension_missing_from_layout_is_none() {
        let r = trainer_record();
        assert_eq!(r.dimension(Dimension::Category), None);
        assert_eq!(r.dimension(Dimension::Trainer), Some("Asha"));
        assert_eq!(r.dimension(Dimension::FirstVisitLocation), Some("Supreme HQ Bandra"));
    }

    #[test]
    fn dimension_and_schema_parse_from_cli_text() {
        assert_eq!("first-visit".parse::<Dimension>(), Ok(Dimension::FirstVisitLocation));
        assert_eq!("Product".parse::<Dimension>(), Ok(Dimension::Package));
        assert_eq!("TRAINER".parse::<Schema>(), Ok(Schema::Trainer));
        assert!("region".parse::<Dimension>().is_err());
    }
}
