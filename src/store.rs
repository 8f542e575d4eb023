//! Accumulator store: category -> metric -> ordered records.
//!
//! Categories and metrics keep first-seen order so the aggregator emits
//! rows in the order the log introduced them.

/// Fields shared by every metric of one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupContext {
    pub volume: u64,
    pub works: u64,
    /// Rate (`times N/s`) for the deviation family, duration for raw-sum.
    pub time: u64,
}

/// One value appended to a metric's series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub context: GroupContext,
    pub value: u64,
}

#[derive(Debug, Default)]
struct MetricSeries {
    name: String,
    records: Vec<Record>,
}

#[derive(Debug, Default)]
struct CategoryEntry {
    name: String,
    metrics: Vec<MetricSeries>,
}

impl CategoryEntry {
    fn metric_mut(&mut self, metric: &str) -> &mut MetricSeries {
        let idx = match self.metrics.iter().position(|m| m.name == metric) {
            Some(idx) => idx,
            None => {
                self.metrics.push(MetricSeries {
                    name: metric.to_string(),
                    records: Vec::new(),
                });
                self.metrics.len() - 1
            }
        };
        &mut self.metrics[idx]
    }
}

/// Per-run grouping of extracted records.
#[derive(Debug, Default)]
pub struct AccumulatorStore {
    categories: Vec<CategoryEntry>,
}

/// A borrowed view of one (category, metric) series.
#[derive(Debug, Clone, Copy)]
pub struct Group<'a> {
    pub category: &'a str,
    pub metric: &'a str,
    pub records: &'a [Record],
}

impl AccumulatorStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn category_mut(&mut self, category: &str) -> &mut CategoryEntry {
        let idx = match self.categories.iter().position(|c| c.name == category) {
            Some(idx) => idx,
            None => {
                self.categories.push(CategoryEntry {
                    name: category.to_string(),
                    metrics: Vec::new(),
                });
                self.categories.len() - 1
            }
        };
        &mut self.categories[idx]
    }

    /// Append a value, creating the category and metric entries on first use.
    pub fn record(&mut self, category: &str, metric: &str, context: GroupContext, value: u64) {
        self.category_mut(category)
            .metric_mut(metric)
            .records
            .push(Record { context, value });
    }

    /// True when no series holds any record.
    pub fn is_empty(&self) -> bool {
        self.categories
            .iter()
            .all(|c| c.metrics.iter().all(|m| m.records.is_empty()))
    }

    /// Records of one series, or an empty slice when it was never created.
    pub fn records(&self, category: &str, metric: &str) -> &[Record] {
        self.categories
            .iter()
            .find(|c| c.name == category)
            .and_then(|c| c.metrics.iter().find(|m| m.name == metric))
            .map(|m| m.records.as_slice())
            .unwrap_or(&[])
    }

    /// Category names in first-seen order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// Every (category, metric) series in traversal order, empty ones included.
    pub fn groups(&self) -> impl Iterator<Item = Group<'_>> {
        self.categories.iter().flat_map(|c| {
            c.metrics.iter().map(move |m| Group {
                category: c.name.as_str(),
                metric: m.name.as_str(),
                records: m.records.as_slice(),
            })
        })
    }

    /// Total number of stored records across all series.
    pub fn len(&self) -> usize {
        self.groups().map(|g| g.records.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(volume: u64) -> GroupContext {
        GroupContext {
            volume,
            works: 4,
            time: 1000,
        }
    }

    #[test]
    fn new_store_is_empty() {
        let store = AccumulatorStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert_eq!(store.groups().count(), 0);
    }

    #[test]
    fn record_creates_entries_on_first_use() {
        let mut store = AccumulatorStore::new();
        store.record("native_report", "actual_ns", ctx(100), 7);
        assert!(!store.is_empty());
        assert_eq!(
            store.records("native_report", "actual_ns"),
            &[Record {
                context: ctx(100),
                value: 7
            }]
        );
    }

    #[test]
    fn unknown_series_reads_as_empty() {
        let store = AccumulatorStore::new();
        assert!(store.records("nope", "actual_ns").is_empty());
    }

    #[test]
    fn groups_follow_first_seen_order() {
        let mut store = AccumulatorStore::new();
        store.record("b", "full_ns", ctx(1), 1);
        store.record("a", "actual_ns", ctx(1), 2);
        store.record("b", "actual_ns", ctx(1), 3);
        store.record("b", "full_ns", ctx(1), 4);

        let order: Vec<(&str, &str, usize)> = store
            .groups()
            .map(|g| (g.category, g.metric, g.records.len()))
            .collect();
        assert_eq!(
            order,
            vec![("b", "full_ns", 2), ("b", "actual_ns", 1), ("a", "actual_ns", 1)]
        );
        assert_eq!(store.categories().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn records_keep_append_order() {
        let mut store = AccumulatorStore::new();
        for v in [30, 10, 20] {
            store.record("c", "m", ctx(v), v);
        }
        let values: Vec<u64> = store.records("c", "m").iter().map(|r| r.value).collect();
        assert_eq!(values, vec![30, 10, 20]);
    }
}
