pub mod atomic_sum;
pub mod iter_delay;

use crate::aggregate::AggregateError;
use crate::extract::extract_line;
use crate::patterns::PatternRegistry;
use crate::store::AccumulatorStore;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Capture-time instant shared by every row of one run.
pub type Timestamp = NaiveDateTime;

/// Which pattern family a run uses. Exactly one is active per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ParserKind {
    /// Per-iteration latency deviations (`actual_ns`, `full_ns`).
    IterDelay,
    /// Raw throughput sums (`sum`, `sum/s`).
    AtomicSum,
}

impl ParserKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParserKind::IterDelay => "iter-delay",
            ParserKind::AtomicSum => "atomic-sum",
        }
    }
}

impl std::fmt::Display for ParserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Turns benchmark log lines into summary rows for one pattern family.
pub trait LogParser {
    /// One persisted table row. Field order is the column order.
    type Row: Serialize + std::fmt::Debug;

    /// Family name as accepted on the command line.
    fn name(&self) -> &'static str;

    /// Patterns this family recognizes.
    fn registry(&self) -> &PatternRegistry;

    /// Extract one line into `store`. Returns `true` when the line matched.
    ///
    /// Unmatched lines leave the store untouched.
    fn parse_line(&self, line: &str, store: &mut AccumulatorStore) -> bool {
        let Some(extraction) = extract_line(line, self.registry()) else {
            return false;
        };
        for (metric, value) in extraction.values {
            store.record(extraction.category, metric, extraction.context, value);
        }
        true
    }

    /// Build the table rows for everything the store holds.
    fn aggregate_rows(
        &self,
        store: &AccumulatorStore,
        timestamp: Timestamp,
    ) -> Result<Vec<Self::Row>, AggregateError>;

    /// Human-readable block for one row, newline-terminated.
    fn format_summary(&self, row: &Self::Row) -> String;

    /// Header of the persisted table.
    fn column_headers(&self) -> &'static [&'static str] {
        self.registry().headers()
    }
}
