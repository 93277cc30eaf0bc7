//! Sliding-window access tracking.

use chrono::{DateTime, Duration, Utc};
use proof_auth::clock::saturating_sub;
use std::collections::{HashMap, VecDeque};

/// Access timestamps inside a trailing window plus lifetime per-type totals.
///
/// Timestamps are kept non-decreasing, so eviction only ever pops from the
/// front.
#[derive(Debug, Clone)]
pub struct AccessPattern {
    /// Window size
    window: Duration,
    /// Access timestamps, oldest first
    access_times: VecDeque<DateTime<Utc>>,
    /// Accesses per type since creation
    access_types: HashMap<String, u64>,
}

impl AccessPattern {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            access_times: VecDeque::new(),
            access_types: HashMap::new(),
        }
    }

    /// Record an access at `at` and evict anything older than the window.
    ///
    /// An `at` earlier than the newest recorded access is clamped up to it.
    pub fn record(&mut self, access_type: &str, at: DateTime<Utc>) {
        let at = self.access_times.back().map_or(at, |&newest| at.max(newest));
        self.access_times.push_back(at);
        *self.access_types.entry(access_type.to_string()).or_insert(0) += 1;
        self.evict(at);
    }

    /// Drop timestamps that fell out of the window ending at `now`.
    pub fn evict(&mut self, now: DateTime<Utc>) {
        let cutoff = saturating_sub(now, self.window);
        while self.access_times.front().is_some_and(|&ts| ts < cutoff) {
            self.access_times.pop_front();
        }
    }

    /// Accesses inside the window ending at `now`.
    pub fn count_in_window(&mut self, now: DateTime<Utc>) -> usize {
        self.evict(now);
        self.access_times.len()
    }

    /// Time between the oldest retained access and `now`.
    pub fn span(&self, now: DateTime<Utc>) -> Duration {
        self.access_times
            .front()
            .map_or(Duration::zero(), |&oldest| now - oldest)
    }

    /// Lifetime totals per access type.
    pub fn access_types(&self) -> &HashMap<String, u64> {
        &self.access_types
    }

    /// Window size.
    pub fn window(&self) -> Duration {
        self.window
    }
}
