//! Per-source sliding-window rate limiting.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, VecDeque};

use crate::clock::saturating_sub;

/// Sliding-window limiter keyed by an opaque source id (IP, session, key).
///
/// Not synchronized on its own; the authenticator keeps it behind the same
/// lock as its challenge table.
#[derive(Debug)]
pub struct RateLimiter {
    /// Attempt timestamps per source, oldest first
    attempts: HashMap<String, VecDeque<DateTime<Utc>>>,
    /// Window size
    window: Duration,
    /// Max attempts per window
    max_attempts: usize,
}

impl RateLimiter {
    pub fn new(window: Duration, max_attempts: usize) -> Self {
        Self {
            attempts: HashMap::new(),
            window,
            max_attempts,
        }
    }

    /// Check if an attempt is allowed and record it.
    ///
    /// Allowed iff fewer than `max_attempts` attempts fall inside the trailing
    /// window; rejected attempts are not recorded.
    pub fn check_and_record(&mut self, source_id: &str, now: DateTime<Utc>) -> bool {
        let cutoff = saturating_sub(now, self.window);
        let entry = self.attempts.entry(source_id.to_string()).or_default();

        // Remove old attempts
        while entry.front().is_some_and(|&ts| ts <= cutoff) {
            entry.pop_front();
        }

        if entry.len() >= self.max_attempts {
            return false;
        }

        entry.push_back(now);
        true
    }

    /// Attempts currently inside the window for a source.
    pub fn attempts(&self, source_id: &str, now: DateTime<Utc>) -> usize {
        let cutoff = saturating_sub(now, self.window);
        self.attempts
            .get(source_id)
            .map_or(0, |entry| entry.iter().filter(|&&ts| ts > cutoff).count())
    }

    /// Drop expired attempts and sources with nothing left.
    pub fn cleanup(&mut self, now: DateTime<Utc>) {
        let cutoff = saturating_sub(now, self.window);
        self.attempts.retain(|_, entry| {
            entry.retain(|&ts| ts > cutoff);
            !entry.is_empty()
        });
    }

    /// Number of sources being tracked.
    pub fn tracked_sources(&self) -> usize {
        self.attempts.len()
    }

    /// Window size.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Max attempts per window.
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }
}
