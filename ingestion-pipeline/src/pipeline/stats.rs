use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters for work that was degraded instead of failed.
#[derive(Debug, Default)]
pub struct IndexingStats {
    pages_indexed: AtomicU64,
    fetch_failures: AtomicU64,
    embedding_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexingStatsSnapshot {
    pub pages_indexed: u64,
    pub fetch_failures: u64,
    pub embedding_failures: u64,
}

impl IndexingStats {
    pub(crate) fn record_page(&self) {
        self.pages_indexed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_embedding_failures(&self, count: usize) {
        self.embedding_failures
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> IndexingStatsSnapshot {
        IndexingStatsSnapshot {
            pages_indexed: self.pages_indexed.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            embedding_failures: self.embedding_failures.load(Ordering::Relaxed),
        }
    }
}
