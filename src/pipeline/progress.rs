//! Progress accounting for one collection export
//!
//! The tracker counts acknowledged documents against the total computed before
//! streaming and produces a [`ProgressEvent`] per document. It never touches
//! the documents and cannot fail.

use tracing::warn;

/// Progress notification for one acknowledged document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Source collection name
    pub collection: String,
    /// Documents processed so far, never above `total`
    pub processed: u64,
    /// Documents counted before streaming started
    pub total: u64,
    /// `floor(100 * processed / total)`, 100 when `total` is 0
    pub percentage: u8,
}

/// Counting stage keyed to one run
pub struct ProgressTracker {
    collection: String,
    total: u64,
    processed: u64,
    /// Documents seen beyond `total` (concurrent inserts on the source)
    overflow: u64,
}

impl ProgressTracker {
    /// Create a tracker for `collection` with a precomputed `total`
    pub fn new(collection: impl Into<String>, total: u64) -> Self {
        Self {
            collection: collection.into(),
            total,
            processed: 0,
            overflow: 0,
        }
    }

    /// Record one more document and describe the new position
    pub fn observe(&mut self) -> ProgressEvent {
        if self.processed < self.total {
            self.processed += 1;
        } else {
            self.overflow += 1;
            if self.overflow == 1 {
                warn!(
                    "Collection [{}] yielded more documents than the {} counted; progress is capped",
                    self.collection, self.total
                );
            }
        }

        ProgressEvent {
            collection: self.collection.clone(),
            processed: self.processed,
            total: self.total,
            percentage: percentage(self.processed, self.total),
        }
    }

    /// Documents counted so far (capped at the total)
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Documents seen beyond the precomputed total
    pub fn overflow(&self) -> u64 {
        self.overflow
    }
}

/// Whole-number completion percentage; an empty total counts as complete
pub fn percentage(processed: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (u128::from(processed) * 100) / u128::from(total);
    pct.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_floors() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 66);
        assert_eq!(percentage(3, 3), 100);
    }

    #[test]
    fn test_percentage_zero_total() {
        assert_eq!(percentage(0, 0), 100);
    }

    #[test]
    fn test_percentage_large_counts() {
        assert_eq!(percentage(u64::MAX / 2, u64::MAX), 49);
    }

    #[test]
    fn test_observe_counts() {
        let mut tracker = ProgressTracker::new("users", 4);
        let events: Vec<ProgressEvent> = (0..4).map(|_| tracker.observe()).collect();

        let processed: Vec<u64> = events.iter().map(|e| e.processed).collect();
        let pcts: Vec<u8> = events.iter().map(|e| e.percentage).collect();
        assert_eq!(processed, [1, 2, 3, 4]);
        assert_eq!(pcts, [25, 50, 75, 100]);
        assert_eq!(events[0].collection, "users");
    }

    #[test]
    fn test_processed_never_exceeds_total() {
        let mut tracker = ProgressTracker::new("users", 2);
        for _ in 0..5 {
            let event = tracker.observe();
            assert!(event.processed <= event.total);
        }
        assert_eq!(tracker.processed(), 2);
        assert_eq!(tracker.overflow(), 3);
    }
}
