//! Aggregated error statistics for run summaries

use crate::constants::ERROR_SAMPLE_LIMIT;
use serde::Serialize;
use std::collections::HashMap;

/// Per-error-type frequency table with bounded message samples
///
/// Workers record every failure here; the run summary surfaces the counts
/// plus at most [`ERROR_SAMPLE_LIMIT`] distinct messages per type so that a
/// noisy provider cannot flood the report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorStats {
    counts: HashMap<String, usize>,
    samples: HashMap<String, Vec<String>>,
}

impl ErrorStats {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one failure of the given type
    pub fn record<T: Into<String>, M: AsRef<str>>(&mut self, error_type: T, message: M) {
        let error_type = error_type.into();
        *self.counts.entry(error_type.clone()).or_insert(0) += 1;
        let samples = self.samples.entry(error_type).or_default();
        let message = message.as_ref();
        if samples.len() < ERROR_SAMPLE_LIMIT && !samples.iter().any(|s| s == message) {
            samples.push(message.to_string());
        }
    }

    /// Merge another table into this one, keeping sample bounds
    pub fn merge(&mut self, other: &ErrorStats) {
        for (error_type, count) in &other.counts {
            *self.counts.entry(error_type.clone()).or_insert(0) += count;
        }
        for (error_type, messages) in &other.samples {
            let samples = self.samples.entry(error_type.clone()).or_default();
            for message in messages {
                if samples.len() >= ERROR_SAMPLE_LIMIT {
                    break;
                }
                if !samples.iter().any(|s| s == message) {
                    samples.push(message.clone());
                }
            }
        }
    }

    /// Total failures across all types
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Failures of one type
    pub fn count(&self, error_type: &str) -> usize {
        self.counts.get(error_type).copied().unwrap_or(0)
    }

    /// Frequency table, type to count
    pub fn counts(&self) -> &HashMap<String, usize> {
        &self.counts
    }

    /// Bounded message samples per type
    pub fn samples(&self) -> &HashMap<String, Vec<String>> {
        &self.samples
    }

    /// Whether anything was recorded
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_counts() {
        let mut stats = ErrorStats::new();
        stats.record("transient", "timeout a");
        stats.record("transient", "timeout b");
        stats.record("permanent", "bad request");
        assert_eq!(stats.count("transient"), 2);
        assert_eq!(stats.count("permanent"), 1);
        assert_eq!(stats.total(), 3);
    }

    #[test]
    fn samples_are_bounded_and_distinct() {
        let mut stats = ErrorStats::new();
        for i in 0..20 {
            stats.record("transient", format!("message {}", i));
        }
        stats.record("transient", "message 0");
        assert_eq!(stats.count("transient"), 21);
        assert_eq!(stats.samples()["transient"].len(), ERROR_SAMPLE_LIMIT);
    }

    #[test]
    fn merge_respects_bounds() {
        let mut a = ErrorStats::new();
        let mut b = ErrorStats::new();
        for i in 0..4 {
            a.record("transient", format!("a{}", i));
            b.record("transient", format!("b{}", i));
        }
        a.merge(&b);
        assert_eq!(a.count("transient"), 8);
        assert_eq!(a.samples()["transient"].len(), ERROR_SAMPLE_LIMIT);
    }
}
