//! Cache Store Module
//!
//! Fixed number of slots behind one mutex, evicting by a logical LRU clock.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::cache::{CacheEntry, CacheStats};
use crate::config::CacheConfig;

// == Insert Outcome ==
/// What `insert` did with the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Placed into a free slot.
    Stored { slot: usize },
    /// Overwrote the least recently used slot.
    Evicted {
        slot: usize,
        evicted_key: String,
        evicted_size: usize,
    },
    /// Not cached at all.
    Skipped(SkipReason),
}

/// Why a payload was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Empty,
    TooLarge { size: usize, limit: usize },
}

// == Slot View ==
/// Read-only copy of one occupied slot's metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotView {
    pub index: usize,
    pub key: String,
    pub size: usize,
    pub last_use: u64,
}

#[derive(Debug)]
struct SlotTable {
    slots: Vec<CacheEntry>,
    /// Logical clock, bumped on every hit and insert.
    use_counter: u64,
    total_bytes: usize,
    stats: CacheStats,
}

impl SlotTable {
    fn tick(&mut self) -> u64 {
        self.use_counter += 1;
        self.use_counter
    }

    /// First free slot, else the occupied slot with the smallest `last_use`
    /// (lowest index wins a tie).
    fn choose_slot(&self) -> usize {
        let mut victim = 0;
        let mut oldest = u64::MAX;
        for (index, slot) in self.slots.iter().enumerate() {
            if !slot.occupied {
                return index;
            }
            if slot.last_use < oldest {
                oldest = slot.last_use;
                victim = index;
            }
        }
        victim
    }
}

// == Response Cache ==
/// Response cache shared by every connection worker.
///
/// Payloads are copied in and out; nothing handed to a caller aliases a slot,
/// so the lock is never held during network I/O.
#[derive(Debug)]
pub struct ResponseCache {
    table: Mutex<SlotTable>,
    max_object_size: usize,
    max_cache_size: usize,
}

impl ResponseCache {
    // == Constructor ==
    /// Creates a cache with `slots` slots (at least one).
    ///
    /// # Arguments
    /// * `slots` - Number of entries the cache can hold
    /// * `max_object_size` - Largest payload accepted by `insert`
    /// * `max_cache_size` - Aggregate budget, reported but not enforced
    pub fn new(slots: usize, max_object_size: usize, max_cache_size: usize) -> Self {
        Self {
            table: Mutex::new(SlotTable {
                slots: vec![CacheEntry::default(); slots.max(1)],
                use_counter: 0,
                total_bytes: 0,
                stats: CacheStats::new(),
            }),
            max_object_size,
            max_cache_size,
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.slots, config.max_object_size, config.max_cache_size)
    }

    fn table(&self) -> MutexGuard<'_, SlotTable> {
        // Every mutation leaves the table consistent before the next statement
        // can panic, so a poisoned lock is still usable.
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Lookup ==
    /// Returns a copy of the payload cached for `uri`, refreshing its recency.
    pub fn lookup(&self, uri: &str) -> Option<Vec<u8>> {
        let mut table = self.table();
        let Some(index) = table.slots.iter().position(|slot| slot.matches(uri)) else {
            table.stats.record_miss();
            return None;
        };

        let stamp = table.tick();
        table.stats.record_hit();
        let slot = &mut table.slots[index];
        slot.last_use = stamp;
        Some(slot.payload.clone())
    }

    // == Insert ==
    /// Stores `payload` under `uri`.
    ///
    /// Does not look for an existing entry with the same key: two workers
    /// that both missed on one URI will each insert, and both copies stay
    /// until evicted.
    pub fn insert(&self, uri: String, payload: Vec<u8>) -> InsertOutcome {
        let size = payload.len();
        let reason = if size == 0 {
            Some(SkipReason::Empty)
        } else if size > self.max_object_size {
            Some(SkipReason::TooLarge {
                size,
                limit: self.max_object_size,
            })
        } else {
            None
        };

        let mut table = self.table();
        if let Some(reason) = reason {
            table.stats.record_skip();
            return InsertOutcome::Skipped(reason);
        }

        let index = table.choose_slot();
        let stamp = table.tick();
        let previous = &table.slots[index];
        let evicted = previous
            .occupied
            .then(|| (previous.key.clone(), previous.size()));

        let freed = evicted.as_ref().map_or(0, |(_, bytes)| *bytes);
        table.total_bytes = table.total_bytes - freed + size;
        table.slots[index].fill(uri, payload, stamp);
        table.stats.record_insertion(evicted.is_some());

        if table.total_bytes > self.max_cache_size {
            tracing::debug!(
                total_bytes = table.total_bytes,
                max_cache_size = self.max_cache_size,
                "Cache above aggregate budget"
            );
        }

        match evicted {
            Some((evicted_key, evicted_size)) => InsertOutcome::Evicted {
                slot: index,
                evicted_key,
                evicted_size,
            },
            None => InsertOutcome::Stored { slot: index },
        }
    }

    // == Skip Oversized ==
    /// Records a response that outgrew `max_object_size` while it was being
    /// relayed, so it was never buffered whole for `insert`.
    pub fn skip_oversized(&self, size: usize) -> InsertOutcome {
        self.table().stats.record_skip();
        InsertOutcome::Skipped(SkipReason::TooLarge {
            size,
            limit: self.max_object_size,
        })
    }

    // == Admits ==
    /// Whether a payload of `size` bytes is small enough to cache.
    pub fn admits(&self, size: usize) -> bool {
        size <= self.max_object_size
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let table = self.table();
        let mut stats = table.stats.clone();
        stats.occupied_slots = table.slots.iter().filter(|s| s.occupied).count();
        stats.total_bytes = table.total_bytes;
        stats
    }

    // == Snapshot ==
    /// Metadata of every occupied slot, in slot order.
    pub fn snapshot(&self) -> Vec<SlotView> {
        self.table()
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.occupied)
            .map(|(index, slot)| SlotView {
                index,
                key: slot.key.clone(),
                size: slot.size(),
                last_use: slot.last_use,
            })
            .collect()
    }

    pub fn capacity(&self) -> usize {
        self.table().slots.len()
    }

    pub fn max_object_size(&self) -> usize {
        self.max_object_size
    }

    pub fn max_cache_size(&self) -> usize {
        self.max_cache_size
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.table().slots.iter().filter(|s| s.occupied).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn cache(slots: usize) -> ResponseCache {
        ResponseCache::new(slots, 1024, 1024 * slots)
    }

    #[test]
    fn test_lookup_empty_is_miss() {
        let cache = cache(3);
        assert_eq!(cache.lookup("/"), None);
        assert_eq!(cache.stats().misses, 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_then_lookup() {
        let cache = cache(3);
        let outcome = cache.insert("/a".into(), b"alpha".to_vec());
        assert_eq!(outcome, InsertOutcome::Stored { slot: 0 });
        assert_eq!(cache.lookup("/a"), Some(b"alpha".to_vec()));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_fills_free_slots_before_evicting() {
        let cache = cache(3);
        for (i, key) in ["/a", "/b", "/c"].iter().enumerate() {
            assert_eq!(
                cache.insert(key.to_string(), vec![1]),
                InsertOutcome::Stored { slot: i }
            );
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let cache = cache(3);
        cache.insert("/a".into(), vec![1]);
        cache.insert("/b".into(), vec![2]);
        cache.insert("/c".into(), vec![3]);

        // Touch /a so /b becomes the oldest
        assert!(cache.lookup("/a").is_some());

        let outcome = cache.insert("/d".into(), vec![4, 4]);
        assert_eq!(
            outcome,
            InsertOutcome::Evicted {
                slot: 1,
                evicted_key: "/b".into(),
                evicted_size: 1,
            }
        );
        assert_eq!(cache.lookup("/b"), None);
        assert!(cache.lookup("/a").is_some());
        assert!(cache.lookup("/c").is_some());
        assert_eq!(cache.lookup("/d"), Some(vec![4, 4]));
    }

    #[test]
    fn test_logical_clock_advances_on_every_touch() {
        let cache = cache(2);
        cache.insert("/a".into(), vec![1]);
        cache.insert("/b".into(), vec![1]);
        cache.lookup("/a");
        cache.lookup("/a");

        let views = cache.snapshot();
        assert_eq!(views[0].key, "/a");
        assert_eq!(views[0].last_use, 4);
        assert_eq!(views[1].last_use, 2);
    }

    #[test]
    fn test_miss_does_not_advance_clock() {
        let cache = cache(2);
        cache.insert("/a".into(), vec![1]);
        cache.lookup("/missing");
        cache.insert("/b".into(), vec![1]);
        let views = cache.snapshot();
        assert_eq!(views[1].last_use, 2);
    }

    #[test]
    fn test_too_large_is_skipped() {
        let cache = ResponseCache::new(2, 4, 8);
        let outcome = cache.insert("/big".into(), vec![0; 5]);
        assert_eq!(
            outcome,
            InsertOutcome::Skipped(SkipReason::TooLarge { size: 5, limit: 4 })
        );
        assert!(cache.is_empty());
        assert_eq!(cache.stats().skipped, 1);

        // Exactly at the cap is fine
        assert_eq!(
            cache.insert("/edge".into(), vec![0; 4]),
            InsertOutcome::Stored { slot: 0 }
        );
        assert!(cache.admits(4));
        assert!(!cache.admits(5));
    }

    #[test]
    fn test_skip_oversized_counts_without_touching_slots() {
        let cache = ResponseCache::new(2, 4, 8);
        cache.insert("/a".into(), vec![1]);
        assert_eq!(
            cache.skip_oversized(300),
            InsertOutcome::Skipped(SkipReason::TooLarge { size: 300, limit: 4 })
        );
        assert_eq!(cache.stats().skipped, 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.snapshot()[0].last_use, 1);
    }

    #[test]
    fn test_empty_payload_is_skipped() {
        let cache = cache(2);
        assert_eq!(
            cache.insert("/".into(), Vec::new()),
            InsertOutcome::Skipped(SkipReason::Empty)
        );
        assert!(cache.is_empty());
    }

    #[test]
    fn test_total_bytes_tracks_overwrites() {
        let cache = ResponseCache::new(2, 100, 150);
        cache.insert("/a".into(), vec![0; 60]);
        cache.insert("/b".into(), vec![0; 70]);
        assert_eq!(cache.stats().total_bytes, 130);

        cache.insert("/c".into(), vec![0; 90]);
        let stats = cache.stats();
        assert_eq!(stats.total_bytes, 160);
        assert_eq!(stats.occupied_slots, 2);
        assert_eq!(stats.evictions, 1);
    }

    #[test]
    fn test_aggregate_budget_does_not_reject() {
        // Aggregate size is tracked only; slot count is the real bound.
        let cache = ResponseCache::new(3, 100, 100);
        cache.insert("/a".into(), vec![0; 100]);
        let outcome = cache.insert("/b".into(), vec![0; 100]);
        assert_eq!(outcome, InsertOutcome::Stored { slot: 1 });
        assert!(cache.stats().total_bytes > cache.max_cache_size());
    }

    #[test]
    fn test_duplicate_insert_occupies_two_slots() {
        let cache = cache(3);
        cache.insert("/same".into(), b"one".to_vec());
        cache.insert("/same".into(), b"two".to_vec());

        let views = cache.snapshot();
        assert_eq!(views.len(), 2);
        assert!(views.iter().all(|v| v.key == "/same"));
        // First match in slot order wins
        assert_eq!(cache.lookup("/same"), Some(b"one".to_vec()));
    }

    #[test]
    fn test_lookup_then_insert_keeps_slots_consistent() {
        let cache = cache(2);
        cache.insert("/x".into(), b"first".to_vec());
        let hit = cache.lookup("/x").unwrap();
        cache.insert("/x".into(), b"second!".to_vec());

        assert_eq!(hit, b"first".to_vec());
        let stats = cache.stats();
        let views = cache.snapshot();
        assert_eq!(views.iter().map(|v| v.size).sum::<usize>(), stats.total_bytes);
        assert_eq!(views[0].size, 5);
        assert_eq!(views[1].size, 7);
    }

    #[test]
    fn test_zero_slots_clamped_to_one() {
        let cache = ResponseCache::new(0, 10, 10);
        assert_eq!(cache.capacity(), 1);
        cache.insert("/a".into(), vec![1]);
        assert!(matches!(
            cache.insert("/b".into(), vec![1]),
            InsertOutcome::Evicted { slot: 0, .. }
        ));
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(cache(4));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..200 {
                        let key = format!("/{}", (t + i) % 6);
                        if cache.lookup(&key).is_none() {
                            cache.insert(key, vec![t as u8; 1 + i % 16]);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.stats();
        let views = cache.snapshot();
        assert!(views.len() <= 4);
        assert_eq!(stats.hits + stats.misses, 1600);
        assert_eq!(views.iter().map(|v| v.size).sum::<usize>(), stats.total_bytes);
    }
}
