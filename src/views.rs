use crate::periods::{PeriodCatalog, PeriodDescriptor};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of periods shown in each comparative slice.
pub const COMPARATIVE_SLICE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Chronological,
    YearOnYear,
    Quarterly,
    Comparative,
}

impl ViewMode {
    /// Growth indicators are only shown where neighbouring columns are
    /// comparable month to month.
    pub fn shows_growth(self) -> bool {
        matches!(self, ViewMode::Chronological | ViewMode::YearOnYear)
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViewMode::Chronological => "Chronological",
            ViewMode::YearOnYear => "Year-on-Year",
            ViewMode::Quarterly => "Quarterly",
            ViewMode::Comparative => "Comparative Analysis",
        };
        f.write_str(s)
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "chronological" | "monthly" => Ok(ViewMode::Chronological),
            "year-on-year" | "yoy" => Ok(ViewMode::YearOnYear),
            "quarterly" | "quarter" => Ok(ViewMode::Quarterly),
            "comparative" | "compare" => Ok(ViewMode::Comparative),
            other => Err(format!("unknown view '{other}'")),
        }
    }
}

/// Consecutive output columns sharing a header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnGroup<'c> {
    pub label: String,
    pub periods: Vec<&'c PeriodDescriptor>,
}

/// Re-index the catalog for a view. No values are looked at.
pub fn compose(catalog: &PeriodCatalog, mode: ViewMode) -> Vec<ColumnGroup<'_>> {
    match mode {
        ViewMode::Chronological => vec![ColumnGroup {
            label: "All Months".to_string(),
            periods: catalog.periods().iter().collect(),
        }],
        ViewMode::YearOnYear => year_on_year(catalog),
        ViewMode::Quarterly => quarterly(catalog),
        ViewMode::Comparative => comparative(catalog),
    }
}

fn year_on_year(catalog: &PeriodCatalog) -> Vec<ColumnGroup<'_>> {
    let Some(latest) = catalog.latest() else {
        return Vec::new();
    };
    let mut groups = Vec::new();
    // Month numbers walking backwards from the newest month, wrapping at January.
    for step in 0..12u32 {
        let month = (latest.month + 11 - step) % 12 + 1;
        let mut periods: Vec<&PeriodDescriptor> =
            catalog.periods().iter().filter(|p| p.month == month).collect();
        if periods.is_empty() {
            continue;
        }
        periods.sort_by(|a, b| b.year.cmp(&a.year));
        groups.push(ColumnGroup {
            label: periods[0].month_name.clone(),
            periods,
        });
    }
    groups
}

fn quarterly(catalog: &PeriodCatalog) -> Vec<ColumnGroup<'_>> {
    let mut keys: Vec<(i32, u32)> = Vec::new();
    for p in catalog.periods() {
        if !keys.contains(&(p.year, p.quarter)) {
            keys.push((p.year, p.quarter));
        }
    }
    keys.sort_by(|a, b| b.cmp(a));
    keys.into_iter()
        .map(|(year, quarter)| {
            let mut periods: Vec<&PeriodDescriptor> = catalog
                .periods()
                .iter()
                .filter(|p| p.year == year && p.quarter == quarter)
                .collect();
            periods.sort_by(|a, b| b.month.cmp(&a.month));
            ColumnGroup {
                label: format!("Q{quarter} {year}"),
                periods,
            }
        })
        .collect()
}

// The "best" slice is the same three newest months as the "recent" one; no
// ranking by value happens here.
fn comparative(catalog: &PeriodCatalog) -> Vec<ColumnGroup<'_>> {
    let recent: Vec<&PeriodDescriptor> = catalog.periods().iter().take(COMPARATIVE_SLICE).collect();
    vec![
        ColumnGroup {
            label: format!("Best {COMPARATIVE_SLICE} Months"),
            periods: recent.clone(),
        },
        ColumnGroup {
            label: format!("Recent {COMPARATIVE_SLICE} Months"),
            periods: recent,
        },
    ]
}

/// Columns of a composed view in display order.
pub fn flatten<'c>(groups: &[ColumnGroup<'c>]) -> Vec<&'c PeriodDescriptor> {
    groups.iter().flat_map(|g| g.periods.iter().copied()).collect()
}
