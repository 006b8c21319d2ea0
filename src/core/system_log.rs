//! In-memory system log shown on the dashboard.
//!
//! Bounded: once full, the oldest entry is dropped for every new one.

use crate::domain::model::{clock, LogEntry};
use std::collections::VecDeque;
use std::sync::Mutex;

pub const DEFAULT_CAPACITY: usize = 1000;

pub struct SystemLog {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
}

impl SystemLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY))),
            capacity,
        }
    }

    pub fn push(&self, mut entry: LogEntry) {
        if entry.time.is_empty() {
            entry.time = clock();
        }
        if let Ok(mut buf) = self.entries.lock() {
            if buf.len() >= self.capacity {
                buf.pop_front();
            }
            buf.push_back(entry);
        }
    }

    pub fn record(&self, level: &str, message: impl Into<String>, source: &str) {
        self.push(LogEntry::new(level, message, source));
    }

    /// Takes the last `limit` entries (all of them when `limit` is 0), then keeps those from `source`.
    pub fn recent(&self, limit: usize, source: Option<&str>) -> Vec<LogEntry> {
        let Ok(buf) = self.entries.lock() else {
            return Vec::new();
        };
        let skip = match limit {
            0 => 0,
            n => buf.len().saturating_sub(n),
        };
        buf.iter()
            .skip(skip)
            .filter(|e| source.map_or(true, |s| e.source.as_deref() == Some(s)))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|buf| buf.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SystemLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_drops_oldest() {
        let log = SystemLog::new(3);
        for i in 0..5 {
            log.record("info", format!("message {}", i), "api");
        }
        let entries = log.recent(10, None);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].message, "message 2");
        assert_eq!(entries[2].message, "message 4");
    }

    #[test]
    fn test_limit_applies_before_source_filter() {
        let log = SystemLog::default();
        log.record("info", "old api entry", "api");
        log.record("warning", "gateway down", "system");
        log.record("info", "new api entry", "api");

        let api_only = log.recent(2, Some("api"));
        assert_eq!(api_only.len(), 1);
        assert_eq!(api_only[0].message, "new api entry");

        assert_eq!(log.recent(100, Some("api")).len(), 2);
        assert!(log.recent(100, Some("nobody")).is_empty());
    }

    #[test]
    fn test_zero_limit_returns_everything() {
        let log = SystemLog::new(5);
        for i in 0..4 {
            log.record("info", format!("message {}", i), "api");
        }
        let entries = log.recent(0, None);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].message, "message 0");
        assert_eq!(log.recent(0, Some("system")).len(), 0);
    }

    #[test]
    fn test_push_fills_missing_time() {
        let log = SystemLog::default();
        log.push(LogEntry {
            time: String::new(),
            level: "info".to_string(),
            message: "hello".to_string(),
            source: None,
        });
        let entry = &log.recent(1, None)[0];
        assert_eq!(entry.time.len(), 8);
        assert!(!log.is_empty());
    }
}
