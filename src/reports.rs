// Pivot tables: one metric, grouped by a dimension, laid out in a view.
//
// Everything is recomputed from the immutable dataset and a `Selection` on
// every call. There is no cache to invalidate.
use crate::aggregate::{aggregate, aggregate_all, extract, grand_total, row_value, AggregationPolicy, MetricPolicies};
use crate::growth::Growth;
use crate::grouping::{group_by_location, group_in_location, unique_metrics};
use crate::loader::Dataset;
use crate::periods::{HeaderSpan, PeriodCatalog, PeriodDescriptor};
use crate::types::{Dimension, Group, MetricRecord};
use crate::util::format_metric_value;
use crate::views::{compose, ColumnGroup, ViewMode};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// What the user has picked. Passed in explicitly on every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub metric: String,
    pub dimension: Dimension,
    pub view: ViewMode,
    pub expanded: HashSet<String>,
    pub expand_all: bool,
    pub location: Option<String>,
}

impl Selection {
    pub fn new(metric: impl Into<String>, dimension: Dimension) -> Self {
        Self {
            metric: metric.into(),
            dimension,
            view: ViewMode::default(),
            expanded: HashSet::new(),
            expand_all: false,
            location: None,
        }
    }

    pub fn is_expanded(&self, key: &str) -> bool {
        self.expand_all || self.expanded.contains(key)
    }

    /// Flip one group open or closed.
    pub fn toggle(&mut self, key: &str) {
        if !self.expanded.remove(key) {
            self.expanded.insert(key.to_string());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub group: String,
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub value: Option<f64>,
    pub display: String,
    pub negative: bool,
    pub growth: Option<Growth>,
}

impl Cell {
    fn new(metric: &str, value: Option<f64>, growth: Option<Growth>) -> Self {
        Self {
            value,
            display: format_metric_value(metric, value),
            negative: value.is_some_and(|v| v < 0.0),
            growth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Record,
    GroupTotal,
    GrandTotal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotRow {
    pub kind: RowKind,
    pub group: String,
    pub label: String,
    pub cells: Vec<Cell>,
    pub total: Cell,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotGroup {
    pub key: String,
    pub expanded: bool,
    pub summary: PivotRow,
    /// Member rows; left empty while the group is collapsed.
    pub rows: Vec<PivotRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub metric: String,
    pub dimension: Dimension,
    pub view: ViewMode,
    pub policy: AggregationPolicy,
    pub location: Option<String>,
    /// Header rows above the column labels, outermost first.
    pub headers: Vec<Vec<HeaderSpan>>,
    pub columns: Vec<Column>,
    pub groups: Vec<PivotGroup>,
    pub totals: PivotRow,
}

impl PivotTable {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Per-location overview used to list what a dataset contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationSummary {
    pub location: String,
    pub rows: usize,
    pub metrics: Vec<String>,
}

pub fn location_summaries(dataset: &Dataset) -> Vec<LocationSummary> {
    group_by_location(&dataset.records)
        .into_iter()
        .map(|g| LocationSummary {
            rows: g.records.len(),
            metrics: unique_metrics(g.records.iter().copied())
                .into_iter()
                .map(String::from)
                .collect(),
            location: g.key,
        })
        .collect()
}

pub fn build_pivot(dataset: &Dataset, policies: &MetricPolicies, selection: &Selection) -> PivotTable {
    let metric = selection.metric.as_str();
    let policy = policies.policy_for(metric);
    let catalog = &dataset.catalog;
    let layout = compose(catalog, selection.view);
    let columns: Vec<(&str, &PeriodDescriptor)> = layout
        .iter()
        .flat_map(|g| g.periods.iter().map(move |p| (g.label.as_str(), *p)))
        .collect();

    let groups = group_in_location(
        &dataset.records,
        metric,
        selection.location.as_deref(),
        selection.dimension,
    );
    debug!(metric, groups = groups.len(), view = %selection.view, "building pivot");

    let builder = RowBuilder {
        metric,
        policy,
        catalog,
        columns: columns.iter().map(|(_, p)| *p).collect(),
        growth: selection.view.shows_growth(),
    };

    let pivot_groups = groups
        .iter()
        .map(|g| {
            let expanded = selection.is_expanded(&g.key);
            let rows = if expanded {
                g.records.iter().map(|r| builder.record_row(&g.key, r)).collect()
            } else {
                Vec::new()
            };
            PivotGroup {
                key: g.key.clone(),
                expanded,
                summary: builder.group_row(g),
                rows,
            }
        })
        .collect();

    PivotTable {
        metric: metric.to_string(),
        dimension: selection.dimension,
        view: selection.view,
        policy,
        location: selection.location.clone(),
        headers: header_rows(catalog, selection.view, &layout),
        columns: columns
            .iter()
            .map(|(group, p)| Column {
                group: group.to_string(),
                key: p.key.clone(),
                label: p.label.clone(),
            })
            .collect(),
        groups: pivot_groups,
        totals: builder.totals_row(&groups),
    }
}

fn header_rows(catalog: &PeriodCatalog, view: ViewMode, layout: &[ColumnGroup<'_>]) -> Vec<Vec<HeaderSpan>> {
    match view {
        ViewMode::Chronological => vec![catalog.year_spans(), catalog.quarter_spans()],
        _ => vec![layout
            .iter()
            .map(|g| HeaderSpan {
                label: g.label.clone(),
                span: g.periods.len(),
            })
            .collect()],
    }
}

struct RowBuilder<'c> {
    metric: &'c str,
    policy: AggregationPolicy,
    catalog: &'c PeriodCatalog,
    columns: Vec<&'c PeriodDescriptor>,
    growth: bool,
}

impl RowBuilder<'_> {
    fn record_row(&self, group: &str, record: &MetricRecord) -> PivotRow {
        let cells = self
            .columns
            .iter()
            .map(|p| {
                let growth = self
                    .previous(p)
                    .and_then(|prev| Growth::from_raw(record.period_value(p), record.period_value(prev)));
                Cell::new(self.metric, row_value(record, p), growth)
            })
            .collect();
        PivotRow {
            kind: RowKind::Record,
            group: group.to_string(),
            label: record.label().to_string(),
            cells,
            total: Cell::new(self.metric, extract(&record.total), None),
        }
    }

    fn group_row(&self, group: &Group<'_>) -> PivotRow {
        let cells = self
            .columns
            .iter()
            .map(|p| {
                let current = aggregate(&group.records, p, self.policy);
                let growth = self
                    .previous(p)
                    .and_then(|prev| series_growth(current, aggregate(&group.records, prev, self.policy)));
                Cell::new(self.metric, current, growth)
            })
            .collect();
        PivotRow {
            kind: RowKind::GroupTotal,
            group: group.key.clone(),
            label: format!("{} TOTAL", group.key.to_uppercase()),
            cells,
            total: Cell::new(self.metric, Some(grand_total(&group.records, self.policy)), None),
        }
    }

    fn totals_row(&self, groups: &[Group<'_>]) -> PivotRow {
        let cells = self
            .columns
            .iter()
            .map(|p| {
                let current = aggregate_all(groups, p, self.policy);
                let growth = self
                    .previous(p)
                    .and_then(|prev| series_growth(current, aggregate_all(groups, prev, self.policy)));
                Cell::new(self.metric, current, growth)
            })
            .collect();
        let everything: Vec<&MetricRecord> = groups.iter().flat_map(|g| g.records.iter().copied()).collect();
        PivotRow {
            kind: RowKind::GrandTotal,
            group: String::new(),
            label: "TOTALS".to_string(),
            cells,
            total: Cell::new(self.metric, Some(grand_total(&everything, self.policy)), None),
        }
    }

    fn previous(&self, period: &PeriodDescriptor) -> Option<&PeriodDescriptor> {
        if !self.growth {
            return None;
        }
        self.catalog.previous(&period.key)
    }
}

// A period where no member had a value gives no comparison on either side.
fn series_growth(current: Option<f64>, previous: Option<f64>) -> Option<Growth> {
    Growth::between(current?, previous?)
}
