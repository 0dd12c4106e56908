use crate::types::{Dimension, Group, MetricRecord};
use std::collections::HashMap;

/// Bucket used for records whose grouping value is empty or missing.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Keep records of `metric` (exact match) and bucket them by `key_of`.
///
/// Groups come back in the order their key first appears, so display order
/// follows the file rather than the alphabet.
pub fn group_records<'a, F>(records: &'a [MetricRecord], metric: &str, key_of: F) -> Vec<Group<'a>>
where
    F: Fn(&MetricRecord) -> Option<&str>,
{
    partition(records.iter().filter(|r| r.metric == metric), key_of)
}

pub fn group_by_dimension<'a>(
    records: &'a [MetricRecord],
    metric: &str,
    dimension: Dimension,
) -> Vec<Group<'a>> {
    group_records(records, metric, |r| r.dimension(dimension))
}

/// Like [`group_by_dimension`], restricted to one location when given.
pub fn group_in_location<'a>(
    records: &'a [MetricRecord],
    metric: &str,
    location: Option<&str>,
    dimension: Dimension,
) -> Vec<Group<'a>> {
    let matching = records
        .iter()
        .filter(|r| r.metric == metric && location.map_or(true, |l| r.location() == l));
    partition(matching, |r| r.dimension(dimension))
}

/// Split the whole dataset per location, regardless of metric.
pub fn group_by_location(records: &[MetricRecord]) -> Vec<Group<'_>> {
    partition(records.iter(), |r| Some(r.location()))
}

/// Distinct metric names in first-encounter order.
pub fn unique_metrics<'a, I>(records: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a MetricRecord>,
{
    let mut out: Vec<&'a str> = Vec::new();
    for r in records {
        if !out.contains(&r.metric.as_str()) {
            out.push(&r.metric);
        }
    }
    out
}

fn partition<'a, I, F>(records: I, key_of: F) -> Vec<Group<'a>>
where
    I: Iterator<Item = &'a MetricRecord>,
    F: Fn(&MetricRecord) -> Option<&str>,
{
    let mut groups: Vec<Group<'a>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for r in records {
        let key = match key_of(r).map(str::trim) {
            Some(k) if !k.is_empty() => k.to_string(),
            _ => UNCATEGORIZED.to_string(),
        };
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push(Group {
                key,
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].records.push(r);
    }
    groups
}
