use super::{LogParser, Timestamp};
use crate::aggregate::{round2, summarize_groups, AggregateError};
use crate::patterns::{raw_sum_family, PatternRegistry};
use crate::store::AccumulatorStore;
use serde::{Deserialize, Serialize};

/// Parser for atomic-sum throughput reports.
///
/// Every captured field (`volume`, `time`, `works`, `sum`, `sum/s`) is kept
/// as its own series. The table gets one row per category: the first
/// report's volume and time, and the `sum` and `sum/s` of the category: the
/// captured integers when there is one report, their mean otherwise.
pub struct AtomicSum {
    registry: PatternRegistry,
}

impl AtomicSum {
    pub fn new() -> Self {
        AtomicSum {
            registry: raw_sum_family(),
        }
    }
}

impl Default for AtomicSum {
    fn default() -> Self {
        Self::new()
    }
}

/// One row of the raw-sum table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSumRow {
    pub timestamp: Timestamp,
    pub log_type: String,
    pub volume: u64,
    pub time: u64,
    pub sum: RawValue,
    pub sum_per_secs: RawValue,
}

/// A raw-sum cell: the exact captured integer, or the 2-decimal mean of
/// several reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Exact(u64),
    Mean(f64),
}

impl RawValue {
    /// Reduce a series of captured values. `None` for an empty series.
    pub fn from_values(values: &[u64]) -> Option<RawValue> {
        match values {
            [] => None,
            [only] => Some(RawValue::Exact(*only)),
            _ => {
                let total: u128 = values.iter().map(|&v| u128::from(v)).sum();
                Some(RawValue::Mean(round2(total as f64 / values.len() as f64)))
            }
        }
    }
}

impl std::fmt::Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawValue::Exact(v) => write!(f, "{v}"),
            RawValue::Mean(v) => write!(f, "{v}"),
        }
    }
}

fn series_value(store: &AccumulatorStore, category: &str, metric: &str) -> Option<RawValue> {
    let values: Vec<u64> = store
        .records(category, metric)
        .iter()
        .map(|r| r.value)
        .collect();
    RawValue::from_values(&values)
}

impl LogParser for AtomicSum {
    type Row = RawSumRow;

    fn name(&self) -> &'static str {
        "atomic-sum"
    }

    fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    fn aggregate_rows(
        &self,
        store: &AccumulatorStore,
        timestamp: Timestamp,
    ) -> Result<Vec<RawSumRow>, AggregateError> {
        let groups = summarize_groups(store)?;

        let mut rows = Vec::new();
        for category in store.categories() {
            // Every match records all five series, so `sum` exists whenever
            // the category does.
            let Some(first) = groups.iter().find(|g| g.category == category) else {
                continue;
            };
            let (Some(sum), Some(sum_per_secs)) = (
                series_value(store, category, "sum"),
                series_value(store, category, "sum_per_secs"),
            ) else {
                continue;
            };
            rows.push(RawSumRow {
                timestamp,
                log_type: category.to_string(),
                volume: first.context.volume,
                time: first.context.time,
                sum,
                sum_per_secs,
            });
        }
        Ok(rows)
    }

    fn format_summary(&self, row: &RawSumRow) -> String {
        format!(
            "--- {} ---\n  Volume: {}\n  Time: {} /s\n  Sum: {}\n  Sum/s: {}\n",
            row.log_type, row.volume, row.time, row.sum, row.sum_per_secs,
        )
    }
}
