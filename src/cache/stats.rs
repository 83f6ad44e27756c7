//! Cache Statistics Module
//!
//! Tracks cache effectiveness: hits, misses, insertions and evictions.

use serde::Serialize;

// == Cache Stats ==
/// Counters kept alongside the slot table, under the same lock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups that found a matching slot
    pub hits: u64,
    /// Lookups that found nothing
    pub misses: u64,
    /// Payloads stored (into a free slot or over a victim)
    pub insertions: u64,
    /// Inserts that overwrote an occupied slot
    pub evictions: u64,
    /// Inserts refused because the payload was empty or over the per-object cap
    pub skipped: u64,
    /// Slots currently occupied
    pub occupied_slots: usize,
    /// Sum of occupied payload sizes in bytes
    pub total_bytes: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// hits / (hits + misses), or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_insertion(&mut self, evicted: bool) {
        self.insertions += 1;
        if evicted {
            self.evictions += 1;
        }
    }

    pub fn record_skip(&mut self) {
        self.skipped += 1;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate_no_lookups() {
        assert_eq!(CacheStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_insertion_with_and_without_eviction() {
        let mut stats = CacheStats::new();
        stats.record_insertion(false);
        stats.record_insertion(true);
        stats.record_skip();
        assert_eq!(stats.insertions, 2);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.skipped, 1);
    }
}
