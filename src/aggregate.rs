//! Summary statistics over the accumulated series.
//!
//! Mean and standard deviation are reported rounded to two decimals;
//! count, min and max are exact. The standard deviation is the sample
//! (n - 1) deviation, and 0 for a series of one value.

use crate::store::{AccumulatorStore, Group, GroupContext, Record};

/// Statistics over one non-empty series of values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricStats {
    pub count: usize,
    pub mean: f64,
    pub stddev: f64,
    pub min: u64,
    pub max: u64,
}

/// Round half away from zero to two decimals.
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Compute statistics over `values`, or `None` for an empty slice.
pub fn summarize_values(values: &[u64]) -> Option<MetricStats> {
    let min = *values.iter().min()?;
    let max = *values.iter().max()?;
    let count = values.len();

    let n = count as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let stddev = if count > 1 {
        let sq: f64 = values
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum();
        (sq / (n - 1.0)).sqrt()
    } else {
        0.0
    };

    Some(MetricStats {
        count,
        mean: round2(mean),
        stddev: round2(stddev),
        min,
        max,
    })
}

/// A non-empty series with its statistics and reported context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupSummary<'a> {
    pub category: &'a str,
    pub metric: &'a str,
    /// Context of the first record in the series.
    pub context: GroupContext,
    pub stats: MetricStats,
}

/// Summarize every non-empty (category, metric) series in store order.
///
/// Fails with [`AggregateError::NoData`] when no series holds a record, so
/// an input without a single match never turns into an empty table.
pub fn summarize_groups(store: &AccumulatorStore) -> Result<Vec<GroupSummary<'_>>, AggregateError> {
    if store.is_empty() {
        return Err(AggregateError::NoData);
    }
    Ok(store.groups().filter_map(summarize_group).collect())
}

fn summarize_group(group: Group<'_>) -> Option<GroupSummary<'_>> {
    let first = group.records.first()?;
    warn_on_mixed_context(&group, first);
    let values: Vec<u64> = group.records.iter().map(|r| r.value).collect();
    let stats = summarize_values(&values)?;
    Some(GroupSummary {
        category: group.category,
        metric: group.metric,
        context: first.context,
        stats,
    })
}

/// The first record's context is what gets reported; say so when the
/// series actually spans several contexts. Returns the number of records
/// whose context differs from the first.
fn warn_on_mixed_context(group: &Group<'_>, first: &Record) -> usize {
    let distinct = group
        .records
        .iter()
        .filter(|r| r.context != first.context)
        .count();
    if distinct > 0 {
        tracing::warn!(
            category = group.category,
            metric = group.metric,
            mismatched = distinct,
            total = group.records.len(),
            "records span several volume/works/time contexts; reporting the first"
        );
    }
    distinct
}

/// Errors from summarization.
#[derive(Debug, PartialEq, Eq)]
pub enum AggregateError {
    /// No line of the input matched any pattern.
    NoData,
}

impl std::fmt::Display for AggregateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateError::NoData => write!(f, "no matching log entries found"),
        }
    }
}

impl std::error::Error for AggregateError {}
