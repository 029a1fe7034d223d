//! Per-generator record of failed runs.

use std::collections::VecDeque;
use std::time::SystemTime;

/// Failures kept per generator. Older ones are dropped.
pub const CAPACITY: usize = 50;

/// One failed run: when it ended and what went wrong.
#[derive(Debug, Clone)]
pub struct ErrorEntry {
    pub timestamp: SystemTime,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: VecDeque<ErrorEntry>,
}

impl ErrorLog {
    pub fn record(&mut self, message: String) {
        if self.entries.len() == CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(ErrorEntry {
            timestamp: SystemTime::now(),
            message,
        });
    }

    /// Copies of the last `n` failures, oldest first.
    pub fn recent(&self, n: usize) -> Vec<ErrorEntry> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(entries: &[ErrorEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.message.as_str()).collect()
    }

    #[test]
    fn recent_is_oldest_first() {
        let mut log = ErrorLog::default();
        for m in ["tone: [line 1] x", "tone: [line 2] y", "tone: [line 3] z"] {
            log.record(m.to_string());
        }
        assert_eq!(
            messages(&log.recent(2)),
            ["tone: [line 2] y", "tone: [line 3] z"]
        );
        assert_eq!(log.recent(10).len(), 3);
        assert!(log.recent(0).is_empty());
    }

    #[test]
    fn keeps_only_latest_failures() {
        let mut log = ErrorLog::default();
        for i in 0..CAPACITY + 7 {
            log.record(format!("run {i}"));
        }
        let all = log.recent(usize::MAX);
        assert_eq!(all.len(), CAPACITY);
        assert_eq!(all[0].message, "run 7");
        assert!(all[0].timestamp.elapsed().unwrap().as_secs() < 5);
    }
}
