/// Pattern registry: the fixed set of record categories a parser family
/// recognizes, with the regex and metric layout of each.
///
/// Every pattern uses named capture groups. `volume`, `works` and `time`
/// form the grouping context; each metric name is also the name of the
/// capture group it is read from. The deviation rule additionally reads
/// an `expected` group.
use regex::Regex;

/// Names of the capture groups that make up the grouping context.
pub const CONTEXT_GROUPS: [&str; 3] = ["volume", "works", "time"];

/// Capture group holding the baseline for the deviation rule.
pub const EXPECTED_GROUP: &str = "expected";

/// How captured metric values are turned into stored values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derivation {
    /// Store the captured value verbatim.
    Identity,
    /// Store `|captured - expected|`.
    AbsoluteDeviation,
}

/// One recognized record category.
#[derive(Debug, Clone)]
pub struct PatternSpec {
    name: &'static str,
    regex: Regex,
    metrics: &'static [&'static str],
    derivation: Derivation,
}

impl PatternSpec {
    /// Compile a category pattern.
    ///
    /// Panics if `pattern` is not a valid regex or lacks a group required by
    /// the layout. Patterns are compile-time constants of this crate, so a
    /// failure here is a bug rather than an input condition.
    fn new(
        name: &'static str,
        pattern: &str,
        metrics: &'static [&'static str],
        derivation: Derivation,
    ) -> Self {
        let regex = Regex::new(pattern).unwrap();
        let groups: Vec<&str> = regex.capture_names().flatten().collect();
        for required in CONTEXT_GROUPS.iter().chain(metrics.iter()) {
            assert!(
                groups.contains(required),
                "pattern {name} is missing capture group {required}"
            );
        }
        if derivation == Derivation::AbsoluteDeviation {
            assert!(
                groups.contains(&EXPECTED_GROUP),
                "pattern {name} is missing capture group {EXPECTED_GROUP}"
            );
        }
        Self {
            name,
            regex,
            metrics,
            derivation,
        }
    }

    /// Category identifier, reported as `log_type`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Metric names in the order values are produced per match.
    pub fn metrics(&self) -> &'static [&'static str] {
        self.metrics
    }

    pub fn derivation(&self) -> Derivation {
        self.derivation
    }
}

/// An immutable, ordered set of patterns plus the table header of the
/// family they belong to. Registry order is the tie-break when more than
/// one pattern could match a line.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    specs: Vec<PatternSpec>,
    headers: &'static [&'static str],
}

impl PatternRegistry {
    pub fn new(specs: Vec<PatternSpec>, headers: &'static [&'static str]) -> Self {
        Self { specs, headers }
    }

    pub fn specs(&self) -> &[PatternSpec] {
        &self.specs
    }

    /// Column header of the persisted table.
    pub fn headers(&self) -> &'static [&'static str] {
        self.headers
    }
}

/// Category names and the literal tags that introduce them in the log.
const CATEGORIES: [(&str, &str); 3] = [
    ("async_report_high", "ASYNC_TASK_REPORT_HIGH"),
    ("async_report_low", "ASYNC_TASK_REPORT_LOW"),
    ("native_report", "NATIVE_THREAD_REPORT"),
];

pub const DEVIATION_METRICS: &[&str] = &["actual_ns", "full_ns"];

pub const DEVIATION_HEADERS: &[&str] = &[
    "timestamp",
    "log_type",
    "volume",
    "works",
    "time",
    "metric_name",
    "count",
    "mean_absolute_deviation",
    "std_deviation",
    "min_deviation",
    "max_deviation",
];

pub const RAW_SUM_METRICS: &[&str] = &["volume", "time", "works", "sum", "sum_per_secs"];

pub const RAW_SUM_HEADERS: &[&str] = &[
    "timestamp",
    "log_type",
    "volume",
    "time",
    "sum",
    "sum_per_secs",
];

/// Build the deviation family: per-iteration latency reports where each
/// observed value is measured against the expected one.
pub fn deviation_family() -> PatternRegistry {
    let specs = CATEGORIES
        .iter()
        .map(|&(name, tag)| {
            let pattern = format!(
                r"{} (?P<id>\d+): volume (?P<volume>\d+), works (?P<works>\d+), times (?P<time>\d+)/s, iters (?P<iters>\d+), expected (?P<expected>\d+)/ns, actual (?P<actual_ns>\d+)/ns, full (?P<full_ns>\d+)/ns",
                regex::escape(tag)
            );
            PatternSpec::new(name, &pattern, DEVIATION_METRICS, Derivation::AbsoluteDeviation)
        })
        .collect();
    PatternRegistry::new(specs, DEVIATION_HEADERS)
}

/// Build the raw-sum family: throughput reports whose values are stored
/// as captured.
pub fn raw_sum_family() -> PatternRegistry {
    let specs = CATEGORIES
        .iter()
        .map(|&(name, tag)| {
            // `volume`, `time` and `works` double as context and metrics.
            let pattern = format!(
                r"{}: volume: (?P<volume>\d+), time: (?P<time>\d+)/s, works: (?P<works>\d+), sum: (?P<sum>\d+), sum/s: (?P<sum_per_secs>\d+)",
                regex::escape(tag)
            );
            PatternSpec::new(name, &pattern, RAW_SUM_METRICS, Derivation::Identity)
        })
        .collect();
    PatternRegistry::new(specs, RAW_SUM_HEADERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deviation_family_has_three_categories_in_order() {
        let reg = deviation_family();
        let names: Vec<&str> = reg.specs().iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            vec!["async_report_high", "async_report_low", "native_report"]
        );
        assert_eq!(reg.headers(), DEVIATION_HEADERS);
    }

    #[test]
    fn deviation_patterns_capture_eight_numbers() {
        let reg = deviation_family();
        for spec in reg.specs() {
            // Group 0 is the whole match.
            assert_eq!(spec.regex().captures_len(), 9);
            assert_eq!(spec.metrics(), &["actual_ns", "full_ns"]);
            assert_eq!(spec.derivation(), Derivation::AbsoluteDeviation);
        }
    }

    #[test]
    fn raw_sum_family_uses_identity() {
        let reg = raw_sum_family();
        assert_eq!(reg.specs().len(), 3);
        assert_eq!(reg.headers(), RAW_SUM_HEADERS);
        for spec in reg.specs() {
            assert_eq!(spec.regex().captures_len(), 6);
            assert_eq!(spec.derivation(), Derivation::Identity);
        }
    }

    #[test]
    fn tags_are_mutually_exclusive() {
        let reg = deviation_family();
        let line = "ASYNC_TASK_REPORT_LOW 3: volume 1, works 1, times 1/s, iters 1, expected 1/ns, actual 1/ns, full 1/ns";
        let matching: Vec<&str> = reg
            .specs()
            .iter()
            .filter(|s| s.regex().is_match(line))
            .map(|s| s.name())
            .collect();
        assert_eq!(matching, vec!["async_report_low"]);
    }

    #[test]
    #[should_panic(expected = "missing capture group expected")]
    fn deviation_spec_requires_expected_group() {
        PatternSpec::new(
            "broken",
            r"(?P<volume>\d+) (?P<works>\d+) (?P<time>\d+) (?P<actual_ns>\d+) (?P<full_ns>\d+)",
            DEVIATION_METRICS,
            Derivation::AbsoluteDeviation,
        );
    }
}
