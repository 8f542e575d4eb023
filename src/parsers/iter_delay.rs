use super::{LogParser, Timestamp};
use crate::aggregate::{summarize_groups, AggregateError};
use crate::patterns::{deviation_family, PatternRegistry};
use crate::store::AccumulatorStore;
use serde::{Deserialize, Serialize};

/// Parser for per-iteration delay reports.
///
/// Each report line carries an expected latency and two observed ones:
///
/// - `actual`: the time the task actually woke up
/// - `full`: the time the iteration finished end to end
///
/// Both are stored as absolute deviations from `expected`, one series per
/// metric, and summarized into one row per (category, metric).
pub struct IterDelay {
    registry: PatternRegistry,
}

impl IterDelay {
    pub fn new() -> Self {
        IterDelay {
            registry: deviation_family(),
        }
    }
}

impl Default for IterDelay {
    fn default() -> Self {
        Self::new()
    }
}

/// One row of the deviation table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationRow {
    pub timestamp: Timestamp,
    pub log_type: String,
    pub volume: u64,
    pub works: u64,
    pub time: u64,
    pub metric_name: String,
    pub count: usize,
    pub mean_absolute_deviation: f64,
    pub std_deviation: f64,
    pub min_deviation: u64,
    pub max_deviation: u64,
}

impl LogParser for IterDelay {
    type Row = DeviationRow;

    fn name(&self) -> &'static str {
        "iter-delay"
    }

    fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    fn aggregate_rows(
        &self,
        store: &AccumulatorStore,
        timestamp: Timestamp,
    ) -> Result<Vec<DeviationRow>, AggregateError> {
        let rows = summarize_groups(store)?
            .into_iter()
            .map(|g| DeviationRow {
                timestamp,
                log_type: g.category.to_string(),
                volume: g.context.volume,
                works: g.context.works,
                time: g.context.time,
                metric_name: g.metric.to_string(),
                count: g.stats.count,
                mean_absolute_deviation: g.stats.mean,
                std_deviation: g.stats.stddev,
                min_deviation: g.stats.min,
                max_deviation: g.stats.max,
            })
            .collect();
        Ok(rows)
    }

    fn format_summary(&self, row: &DeviationRow) -> String {
        let std_dev = if row.std_deviation > 0.0 {
            format!("    Std Dev: {:.2} ns", row.std_deviation)
        } else {
            "    Std Dev: N/A".to_string()
        };
        format!(
            "--- {} ---\n  Metric: {}\n    Volume: {}\n    Works: {}\n    Time: {} /s\n    Count: {}\n    Mean Absolute Deviation: {:.2} ns\n{}\n    Min: {} ns\n    Max: {} ns\n",
            row.log_type,
            row.metric_name,
            row.volume,
            row.works,
            row.time,
            row.count,
            row.mean_absolute_deviation,
            std_dev,
            row.min_deviation,
            row.max_deviation,
        )
    }
}
