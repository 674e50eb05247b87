//! Bounded session history.
//!
//! Readers always see samples oldest first (chronological).

use std::collections::vec_deque::Iter;
use std::collections::VecDeque;

use driver_wellness_core::WellnessSample;
use serde::Serialize;

/// Fixed-capacity FIFO of wellness samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionLog {
    /// Stored samples (oldest first).
    samples: VecDeque<WellnessSample>,
    /// Maximum number of samples to retain.
    capacity: usize,
}

impl SessionLog {
    /// Create an empty log. A capacity of zero is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    /// Append a sample, evicting and returning the oldest when full.
    pub fn push(&mut self, sample: WellnessSample) -> Option<WellnessSample> {
        let evicted = if self.samples.len() >= self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        debug_assert!(
            self.samples.len() <= self.capacity,
            "session log exceeded capacity: {} > {}",
            self.samples.len(),
            self.capacity
        );
        evicted
    }

    /// Most recent sample, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&WellnessSample> {
        self.samples.back()
    }

    /// Oldest retained sample, if any.
    #[must_use]
    pub fn oldest(&self) -> Option<&WellnessSample> {
        self.samples.front()
    }

    /// All samples, oldest first.
    pub fn iter(&self) -> Iter<'_, WellnessSample> {
        self.samples.iter()
    }

    /// The last `n` samples, oldest first.
    ///
    /// Yields fewer than `n` if the log holds fewer samples.
    pub fn recent(&self, n: usize) -> Iter<'_, WellnessSample> {
        let start = self.samples.len().saturating_sub(n);
        self.samples.range(start..)
    }

    /// Number of samples currently stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Maximum capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Remove every sample.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    /// Copy the samples out, oldest first.
    #[must_use]
    pub fn to_vec(&self) -> Vec<WellnessSample> {
        self.samples.iter().cloned().collect()
    }
}

impl<'a> IntoIterator for &'a SessionLog {
    type Item = &'a WellnessSample;
    type IntoIter = Iter<'a, WellnessSample>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn make_sample(secs: i64, fatigue: f64) -> WellnessSample {
        WellnessSample {
            fatigue_score: fatigue,
            ..WellnessSample::nominal(at(secs))
        }
    }

    #[test]
    fn empty_log() {
        let log = SessionLog::new(10);
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
        assert!(log.latest().is_none());
        assert!(log.oldest().is_none());
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let mut log = SessionLog::new(0);
        assert_eq!(log.capacity(), 1);
        log.push(make_sample(0, 0.1));
        log.push(make_sample(1, 0.2));
        assert_eq!(log.len(), 1);
        assert!((log.latest().unwrap().fatigue_score - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn eviction_at_capacity() {
        let mut log = SessionLog::new(3);
        assert!(log.push(make_sample(0, 0.10)).is_none());
        assert!(log.push(make_sample(1, 0.15)).is_none());
        assert!(log.push(make_sample(2, 0.20)).is_none());

        // Push one more; oldest should be evicted
        let evicted = log.push(make_sample(3, 0.25)).unwrap();
        assert_eq!(evicted.timestamp, at(0));
        assert_eq!(log.len(), 3);
        assert_eq!(log.oldest().unwrap().timestamp, at(1));
        assert_eq!(log.latest().unwrap().timestamp, at(3));
    }

    #[test]
    fn iteration_is_chronological() {
        let mut log = SessionLog::new(4);
        for i in 0..7 {
            log.push(make_sample(i, 0.1));
        }
        let times: Vec<_> = log.iter().map(|s| s.timestamp).collect();
        assert_eq!(times, vec![at(3), at(4), at(5), at(6)]);
    }

    #[test]
    fn recent_returns_last_n() {
        let mut log = SessionLog::new(10);
        for i in 0..5 {
            log.push(make_sample(i, 0.1 * i as f64));
        }
        let last3: Vec<_> = log.recent(3).collect();
        assert_eq!(last3.len(), 3);
        assert_eq!(last3[0].timestamp, at(2));
        assert_eq!(last3[2].timestamp, at(4));
    }

    #[test]
    fn recent_when_fewer_than_n() {
        let mut log = SessionLog::new(10);
        log.push(make_sample(0, 0.3));
        assert_eq!(log.recent(100).count(), 1);
        assert_eq!(log.recent(0).count(), 0);
    }

    #[test]
    fn clear_empties_log() {
        let mut log = SessionLog::new(10);
        log.push(make_sample(0, 0.3));
        log.push(make_sample(1, 0.4));
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.capacity(), 10);
    }
}
