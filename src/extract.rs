/// Line extraction: match one log line against a registry and produce the
/// category, grouping context, and (possibly derived) metric values.
use crate::patterns::{Derivation, PatternRegistry, PatternSpec, EXPECTED_GROUP};
use crate::store::GroupContext;
use regex::Captures;

/// The result of a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub category: &'static str,
    pub context: GroupContext,
    /// (metric name, stored value) in the pattern's declared metric order.
    pub values: Vec<(&'static str, u64)>,
}

/// Try each pattern of the registry in order and return the first match.
///
/// Lines that match nothing yield `None`. A line that matches but carries a
/// number too large for `u64` is skipped with a warning.
pub fn extract_line(line: &str, registry: &PatternRegistry) -> Option<Extraction> {
    for spec in registry.specs() {
        if let Some(caps) = spec.regex().captures(line) {
            return extract_captures(spec, &caps);
        }
    }
    None
}

fn extract_captures(spec: &PatternSpec, caps: &Captures<'_>) -> Option<Extraction> {
    let context = GroupContext {
        volume: capture_u64(spec, caps, "volume")?,
        works: capture_u64(spec, caps, "works")?,
        time: capture_u64(spec, caps, "time")?,
    };

    let expected = match spec.derivation() {
        Derivation::Identity => None,
        Derivation::AbsoluteDeviation => Some(capture_u64(spec, caps, EXPECTED_GROUP)?),
    };

    let mut values = Vec::with_capacity(spec.metrics().len());
    for &metric in spec.metrics() {
        let raw = capture_u64(spec, caps, metric)?;
        let value = match expected {
            Some(expected) => raw.abs_diff(expected),
            None => raw,
        };
        values.push((metric, value));
    }

    Some(Extraction {
        category: spec.name(),
        context,
        values,
    })
}

fn capture_u64(spec: &PatternSpec, caps: &Captures<'_>, group: &str) -> Option<u64> {
    let text = caps.name(group)?.as_str();
    match text.parse::<u64>() {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(
                category = spec.name(),
                group,
                value = text,
                error = %e,
                "captured number out of range, skipping line"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::{deviation_family, raw_sum_family};

    const HIGH_LINE: &str = "ASYNC_TASK_REPORT_HIGH 1: volume 100, works 4, times 1000/s, iters 50, expected 200/ns, actual 210/ns, full 260/ns";

    #[test]
    fn deviation_line_yields_context_and_deviations() {
        let reg = deviation_family();
        let ex = extract_line(HIGH_LINE, &reg).unwrap();
        assert_eq!(ex.category, "async_report_high");
        assert_eq!(
            ex.context,
            GroupContext {
                volume: 100,
                works: 4,
                time: 1000
            }
        );
        assert_eq!(ex.values, vec![("actual_ns", 10), ("full_ns", 60)]);
    }

    #[test]
    fn deviation_below_expected_is_absolute() {
        let reg = deviation_family();
        let line = "NATIVE_THREAD_REPORT 7: volume 8, works 2, times 10/s, iters 3, expected 500/ns, actual 480/ns, full 500/ns";
        let ex = extract_line(line, &reg).unwrap();
        assert_eq!(ex.category, "native_report");
        assert_eq!(ex.values, vec![("actual_ns", 20), ("full_ns", 0)]);
    }

    #[test]
    fn pattern_matches_inside_longer_line() {
        let reg = deviation_family();
        let line = format!("[  12.345 INFO  app] {HIGH_LINE} trailing");
        assert!(extract_line(&line, &reg).is_some());
    }

    #[test]
    fn unrelated_line_yields_none() {
        let reg = deviation_family();
        assert!(extract_line("booting kernel...", &reg).is_none());
        assert!(extract_line("", &reg).is_none());
    }

    #[test]
    fn families_do_not_cross_match() {
        let raw_line = "ASYNC_TASK_REPORT_LOW: volume: 10, time: 5/s, works: 3, sum: 999, sum/s: 199";
        assert!(extract_line(raw_line, &deviation_family()).is_none());
        assert!(extract_line(HIGH_LINE, &raw_sum_family()).is_none());
    }

    #[test]
    fn raw_sum_line_stores_values_verbatim() {
        let reg = raw_sum_family();
        let line = "ASYNC_TASK_REPORT_LOW: volume: 10, time: 5/s, works: 3, sum: 999, sum/s: 199";
        let ex = extract_line(line, &reg).unwrap();
        assert_eq!(ex.category, "async_report_low");
        assert_eq!(
            ex.context,
            GroupContext {
                volume: 10,
                works: 3,
                time: 5
            }
        );
        assert_eq!(
            ex.values,
            vec![
                ("volume", 10),
                ("time", 5),
                ("works", 3),
                ("sum", 999),
                ("sum_per_secs", 199)
            ]
        );
    }

    #[test]
    fn overflowing_capture_is_skipped() {
        let reg = raw_sum_family();
        let line = "NATIVE_THREAD_REPORT: volume: 1, time: 1/s, works: 1, sum: 99999999999999999999999, sum/s: 1";
        assert!(extract_line(line, &reg).is_none());
    }
}
