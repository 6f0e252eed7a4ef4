//! Per-message-kind receipt counters.
//!
//! Diagnostics only; never consulted for correctness. Cheaply cloneable so
//! several connections can share one set of counters when an application
//! wants process-wide numbers.

use dashmap::DashMap;
use std::sync::Arc;

/// Counts received messages by name.
#[derive(Debug, Clone, Default)]
pub struct MessageCounters {
    counts: Arc<DashMap<String, u64>>,
}

impl MessageCounters {
    /// Create an empty counter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one receipt of the named message kind.
    pub fn record(&self, name: &str) {
        let mut entry = self.counts.entry(name.to_string()).or_insert(0);
        *entry += 1;
        tracing::trace!(name, count = *entry, "message counted");
    }

    /// The number of times the named kind was received.
    pub fn count(&self, name: &str) -> u64 {
        self.counts.get(name).map(|entry| *entry).unwrap_or(0)
    }

    /// All counts, unordered.
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        self.counts
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_count() {
        let counters = MessageCounters::new();
        counters.record("Peer");
        counters.record("Peer");
        counters.record("EndListPeers");
        assert_eq!(counters.count("Peer"), 2);
        assert_eq!(counters.count("EndListPeers"), 1);
        assert_eq!(counters.count("NodeHello"), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let counters = MessageCounters::new();
        let shared = counters.clone();
        counters.record("NodeHello");
        assert_eq!(shared.count("NodeHello"), 1);
    }
}
