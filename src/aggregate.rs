use crate::periods::PeriodDescriptor;
use crate::types::{Group, MetricRecord};
use crate::util::average;
use serde::Serialize;
use std::collections::HashSet;

/// Metrics that are rates or per-transaction values. Their group value is a
/// mean, every other metric is summed.
pub const DEFAULT_AVERAGE_METRICS: &[&str] = &[
    "Average Transaction Value",
    "Average Spend Per Member",
    "Average Discount",
    "Retention Rate",
    "Conversion Rate",
    "Churn Rate",
    "Class Average",
    "Fill Rate",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationPolicy {
    Sum,
    Average,
}

#[derive(Debug, Clone)]
pub struct MetricPolicies {
    average: HashSet<String>,
}

impl Default for MetricPolicies {
    fn default() -> Self {
        Self::new(DEFAULT_AVERAGE_METRICS.iter().copied())
    }
}

impl MetricPolicies {
    pub fn new<I, S>(average_metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            average: average_metrics.into_iter().map(Into::into).collect(),
        }
    }

    pub fn policy_for(&self, metric: &str) -> AggregationPolicy {
        if self.average.contains(metric) {
            AggregationPolicy::Average
        } else {
            AggregationPolicy::Sum
        }
    }
}

/// Numeric value of a cell, or `None` for empty and unparseable text.
/// Currency symbols, thousands separators and a trailing `%` are ignored.
pub fn extract(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '₹' | '$' | ','))
        .collect();
    let cleaned = cleaned.trim();
    let cleaned = cleaned.strip_suffix('%').unwrap_or(cleaned).trim_end();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Fold extracted values under a policy.
///
/// - `Average`: mean of present values that are strictly positive, 0 when none.
/// - `Sum`: sum of present values, absent ones count as 0.
pub fn combine<I>(values: I, policy: AggregationPolicy) -> f64
where
    I: IntoIterator<Item = Option<f64>>,
{
    match policy {
        AggregationPolicy::Average => {
            let positives: Vec<f64> = values.into_iter().flatten().filter(|v| *v > 0.0).collect();
            average(&positives)
        }
        AggregationPolicy::Sum => values.into_iter().flatten().sum(),
    }
}

pub fn row_value(record: &MetricRecord, period: &PeriodDescriptor) -> Option<f64> {
    extract(record.period_value(period))
}

// `None` when no member has a value in the period at all.
fn combine_present<'r, I>(records: I, period: &PeriodDescriptor, policy: AggregationPolicy) -> Option<f64>
where
    I: IntoIterator<Item = &'r MetricRecord>,
{
    let values: Vec<Option<f64>> = records.into_iter().map(|r| row_value(r, period)).collect();
    if values.iter().all(Option::is_none) {
        return None;
    }
    Some(combine(values, policy))
}

/// Group value for one period; `None` when every member cell is empty.
pub fn aggregate(records: &[&MetricRecord], period: &PeriodDescriptor, policy: AggregationPolicy) -> Option<f64> {
    combine_present(records.iter().copied(), period, policy)
}

/// One value over every group at once, for the totals row.
pub fn aggregate_all(groups: &[Group<'_>], period: &PeriodDescriptor, policy: AggregationPolicy) -> Option<f64> {
    combine_present(
        groups.iter().flat_map(|g| g.records.iter().copied()),
        period,
        policy,
    )
}

/// Same policy applied to each record's precomputed total column.
pub fn grand_total(records: &[&MetricRecord], policy: AggregationPolicy) -> f64 {
    combine(records.iter().map(|r| extract(&r.total)), policy)
}
