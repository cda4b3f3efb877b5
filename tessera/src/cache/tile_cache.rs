//! Bounded tile store with least-recently-used eviction.
//!
//! Entries can be marked active (currently drawn). Active entries are never
//! evicted; when nothing inactive remains the cache overfills rather than
//! dropping a drawn tile, and shrinks back once entries are released.

use lru::LruCache;
use tracing::{debug, warn};

use super::CacheStats;
use crate::coord::TileIndex;
use crate::tile::Tile;

struct Entry {
    tile: Tile,
    active: bool,
}

/// In-memory tile cache keyed by [`TileIndex::key`].
///
/// The backing `LruCache` is unbounded; capacity is enforced here so that
/// eviction can skip active entries.
pub struct TileCache {
    entries: LruCache<String, Entry>,
    capacity: usize,
    next_serial: u64,
    stats: CacheStats,
}

impl TileCache {
    /// Create a cache holding up to `capacity` inactive tiles.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: LruCache::unbounded(),
            capacity,
            next_serial: 1,
            stats: CacheStats::new(),
        }
    }

    /// Cache key for an index, usable to probe without fetching.
    pub fn hash(index: &TileIndex) -> String {
        index.key()
    }

    /// Look up a tile and mark it most recently used.
    ///
    /// `None` means "not cached"; a cached tile whose fetch failed is
    /// returned in [`TileState::Failed`](crate::tile::TileState::Failed).
    pub fn get(&mut self, key: &str) -> Option<&Tile> {
        match self.entries.get(key) {
            Some(entry) => {
                self.stats.hits += 1;
                Some(&entry.tile)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Mutable lookup; marks the entry most recently used.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Tile> {
        match self.entries.get_mut(key) {
            Some(entry) => {
                self.stats.hits += 1;
                Some(&mut entry.tile)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Look up a tile without touching recency or statistics.
    pub fn peek(&self, key: &str) -> Option<&Tile> {
        self.entries.peek(key).map(|entry| &entry.tile)
    }

    /// Mutable lookup without touching recency or statistics.
    pub fn peek_mut(&mut self, key: &str) -> Option<&mut Tile> {
        self.entries.peek_mut(key).map(|entry| &mut entry.tile)
    }

    /// Check whether a key is cached.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains(key)
    }

    /// Insert a tile under its index key.
    ///
    /// Replacing an existing key keeps that entry's active flag. When the
    /// cache is full the least recently used inactive entries are evicted
    /// first; if every entry is active the cache exceeds its capacity.
    ///
    /// Returns the evicted tiles.
    pub fn add(&mut self, mut tile: Tile) -> Vec<Tile> {
        let key = tile.key();
        tile.set_serial(self.next_serial);
        self.next_serial += 1;
        self.stats.insertions += 1;

        if let Some(entry) = self.entries.get_mut(&key) {
            debug!(key = %key, "Replacing cached tile");
            entry.tile = tile;
            return Vec::new();
        }

        let evicted = self.evict_until(self.capacity.saturating_sub(1));
        if self.entries.len() >= self.capacity {
            self.stats.overflows += 1;
            warn!(
                key = %key,
                entries = self.entries.len(),
                capacity = self.capacity,
                "Tile cache overflow: all entries are active"
            );
        }

        self.entries.put(key, Entry { tile, active: false });
        evicted
    }

    /// Remove a tile regardless of its active flag.
    pub fn remove(&mut self, key: &str) -> Option<Tile> {
        self.entries.pop(key).map(|entry| entry.tile)
    }

    /// Drop every entry, active or not.
    ///
    /// Callers that track drawn tiles must clear that set first.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Mark an entry active (exempt from eviction) or inactive.
    ///
    /// Returns `false` if the key is not cached.
    pub fn set_active(&mut self, key: &str, active: bool) -> bool {
        match self.entries.peek_mut(key) {
            Some(entry) => {
                entry.active = active;
                true
            }
            None => false,
        }
    }

    /// Check whether an entry is marked active.
    pub fn is_active(&self, key: &str) -> bool {
        self.entries.peek(key).is_some_and(|entry| entry.active)
    }

    /// Evict inactive entries until the cache is back within capacity.
    ///
    /// Returns the evicted tiles.
    pub fn shrink_to_capacity(&mut self) -> Vec<Tile> {
        self.evict_until(self.capacity)
    }

    /// Current number of entries (may exceed capacity while overfilled).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of entries currently marked active.
    pub fn active_count(&self) -> usize {
        self.entries.iter().filter(|(_, entry)| entry.active).count()
    }

    /// Keys ordered from most to least recently used.
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(key, _)| key.clone()).collect()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn evict_until(&mut self, target: usize) -> Vec<Tile> {
        let mut evicted = Vec::new();
        while self.entries.len() > target {
            let victim = self
                .entries
                .iter()
                .rev()
                .find(|(_, entry)| !entry.active)
                .map(|(key, _)| key.clone());

            let Some(key) = victim else {
                break;
            };
            if let Some(entry) = self.entries.pop(&key) {
                debug!(key = %key, state = %entry.tile.state(), "Evicted tile");
                self.stats.evictions += 1;
                evicted.push(entry.tile);
            }
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{TileSize, TileState};
    use proptest::prelude::*;

    fn make_tile(x: i32) -> Tile {
        let index = TileIndex::new(x, 0, 10);
        Tile::new(
            index,
            TileSize {
                width: 256,
                height: 256,
            },
            format!("10/{}/0", x),
        )
    }

    fn key(x: i32) -> String {
        TileIndex::new(x, 0, 10).key()
    }

    #[test]
    fn test_cache_new() {
        let cache = TileCache::new(3);
        assert_eq!(cache.capacity(), 3);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_hash_matches_tile_key() {
        let tile = make_tile(4);
        assert_eq!(TileCache::hash(&tile.index()), tile.key());
    }

    #[test]
    fn test_add_and_get() {
        let mut cache = TileCache::new(3);
        cache.add(make_tile(1));

        let tile = cache.get(&key(1)).unwrap();
        assert_eq!(tile.index(), TileIndex::new(1, 0, 10));
        assert_eq!(tile.state(), TileState::Pending);
    }

    #[test]
    fn test_get_absent_is_none() {
        let mut cache = TileCache::new(3);
        assert!(cache.get(&key(1)).is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_hit_miss_tracking() {
        let mut cache = TileCache::new(3);
        cache.add(make_tile(1));
        cache.get(&key(1));
        cache.get(&key(1));
        cache.get(&key(2));

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_peek_does_not_count() {
        let mut cache = TileCache::new(3);
        cache.add(make_tile(1));
        assert!(cache.peek(&key(1)).is_some());
        assert!(cache.peek(&key(2)).is_none());
        assert_eq!(cache.stats().hits, 0);
        assert_eq!(cache.stats().misses, 0);
    }

    #[test]
    fn test_lru_eviction_order() {
        let mut cache = TileCache::new(3);
        cache.add(make_tile(1));
        cache.add(make_tile(2));
        cache.add(make_tile(3));

        // Touch 1 so that 2 becomes least recently used
        cache.get(&key(1));

        let evicted = cache.add(make_tile(4));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].key(), key(2));
        assert_eq!(cache.len(), 3);
        assert!(cache.contains(&key(1)));
        assert!(!cache.contains(&key(2)));
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_active_entries_are_skipped() {
        let mut cache = TileCache::new(2);
        cache.add(make_tile(1));
        cache.add(make_tile(2));
        assert!(cache.set_active(&key(1), true));

        let evicted = cache.add(make_tile(3));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].key(), key(2));
        assert!(cache.contains(&key(1)));
        assert!(cache.is_active(&key(1)));
    }

    #[test]
    fn test_overflow_when_all_active() {
        let mut cache = TileCache::new(2);
        cache.add(make_tile(1));
        cache.add(make_tile(2));
        cache.set_active(&key(1), true);
        cache.set_active(&key(2), true);

        let evicted = cache.add(make_tile(3));
        assert!(evicted.is_empty());
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.stats().overflows, 1);

        // Releasing an entry lets the cache shrink back
        cache.set_active(&key(1), false);
        let evicted = cache.shrink_to_capacity();
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].key(), key(1));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_replace_keeps_active_flag() {
        let mut cache = TileCache::new(2);
        cache.add(make_tile(1));
        cache.set_active(&key(1), true);
        let old_serial = cache.peek(&key(1)).unwrap().serial();

        let evicted = cache.add(make_tile(1));
        assert!(evicted.is_empty());
        assert_eq!(cache.len(), 1);
        assert!(cache.is_active(&key(1)));
        assert!(cache.peek(&key(1)).unwrap().serial() > old_serial);
    }

    #[test]
    fn test_serials_are_unique() {
        let mut cache = TileCache::new(4);
        cache.add(make_tile(1));
        cache.add(make_tile(2));
        let a = cache.peek(&key(1)).unwrap().serial();
        let b = cache.peek(&key(2)).unwrap().serial();
        assert_ne!(a, b);
    }

    #[test]
    fn test_set_active_absent_key() {
        let mut cache = TileCache::new(2);
        assert!(!cache.set_active(&key(9), true));
        assert!(!cache.is_active(&key(9)));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cache = TileCache::new(3);
        cache.add(make_tile(1));
        cache.add(make_tile(2));
        cache.set_active(&key(2), true);

        assert!(cache.remove(&key(1)).is_some());
        assert!(cache.remove(&key(1)).is_none());

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.active_count(), 0);
    }

    #[test]
    fn test_keys_in_recency_order() {
        let mut cache = TileCache::new(3);
        cache.add(make_tile(1));
        cache.add(make_tile(2));
        cache.add(make_tile(3));
        cache.get(&key(1));
        assert_eq!(cache.keys(), vec![key(1), key(3), key(2)]);
    }

    proptest! {
        #[test]
        fn prop_inactive_cache_respects_capacity(
            capacity in 1usize..16,
            inserts in proptest::collection::vec(0i32..64, 0..128),
        ) {
            let mut cache = TileCache::new(capacity);
            for x in inserts {
                cache.add(make_tile(x));
                prop_assert!(cache.len() <= capacity);
            }
        }

        #[test]
        fn prop_active_tiles_never_evicted(
            capacity in 2usize..8,
            inserts in proptest::collection::vec(1i32..64, 0..64),
        ) {
            let mut cache = TileCache::new(capacity);
            cache.add(make_tile(0));
            cache.set_active(&key(0), true);
            for x in inserts {
                cache.add(make_tile(x));
                prop_assert!(cache.contains(&key(0)));
                prop_assert!(cache.len() <= capacity);
            }
        }
    }
}
