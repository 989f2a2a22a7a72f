use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Default number of pair scores kept before LRU eviction kicks in.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Null link marker in the recency list.
const NIL: usize = usize::MAX;

/// Order-independent cache key for a company pair. Construction sorts the
/// two ids lexicographically, so `key(a, b) == key(b, a)` and the cache
/// holds exactly one entry per unordered pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey {
  lo: String,
  hi: String,
}

impl PairKey {
  pub fn new(a: &str, b: &str) -> Self {
    if a <= b {
      Self { lo: a.to_string(), hi: b.to_string() }
    } else {
      Self { lo: b.to_string(), hi: a.to_string() }
    }
  }

  pub fn contains(&self, id: &str) -> bool {
    self.lo == id || self.hi == id
  }
}

/// One cached pair score.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityEntry {
  pub score: f32,
  pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
  pub hits: u64,
  pub misses: u64,
  pub evictions: u64,
  pub insertions: u64,
}

impl CacheStats {
  /// Hit rate in [0, 1]; 0 before any lookup.
  pub fn hit_rate(&self) -> f64 {
    let total = self.hits + self.misses;
    if total == 0 {
      0.0
    } else {
      self.hits as f64 / total as f64
    }
  }
}

#[derive(Debug)]
struct Node {
  key: PairKey,
  entry: Option<SimilarityEntry>,
  prev: usize,
  next: usize,
}

/// Bounded LRU cache of combined similarity scores, keyed symmetrically.
///
/// Recency is an arena-backed doubly-linked list (index links, no unsafe):
/// head = most recent, tail = next to evict. `get` promotes; `set` of a new
/// pair at capacity evicts the tail first. There is no TTL; entries stay
/// valid until `invalidate`/`clear`.
///
/// Single-threaded by design. A multi-threaded port must wrap this in a
/// mutex or shard it; promotion makes even reads mutating.
#[derive(Debug)]
pub struct SimilarityCache {
  capacity: usize,
  map: HashMap<PairKey, usize>,
  arena: Vec<Node>,
  head: usize,
  tail: usize,
  free_head: usize,
  stats: CacheStats,
}

impl Default for SimilarityCache {
  fn default() -> Self {
    Self::new(DEFAULT_CACHE_CAPACITY)
  }
}

impl SimilarityCache {
  /// # Panics
  /// Panics if `capacity` is 0.
  pub fn new(capacity: usize) -> Self {
    assert!(capacity > 0, "SimilarityCache capacity must be > 0");
    Self {
      capacity,
      map: HashMap::with_capacity(capacity),
      arena: Vec::new(),
      head: NIL,
      tail: NIL,
      free_head: NIL,
      stats: CacheStats::default(),
    }
  }

  pub fn capacity(&self) -> usize {
    self.capacity
  }

  pub fn len(&self) -> usize {
    self.map.len()
  }

  pub fn is_empty(&self) -> bool {
    self.map.is_empty()
  }

  pub fn stats(&self) -> CacheStats {
    self.stats
  }

  /// Cached score for the unordered pair, promoting it to most recent.
  pub fn get(&mut self, id_a: &str, id_b: &str) -> Option<f32> {
    let key = PairKey::new(id_a, id_b);
    if let Some(&idx) = self.map.get(&key) {
      self.move_to_head(idx);
      self.stats.hits += 1;
      self.arena[idx].entry.as_ref().map(|e| e.score)
    } else {
      self.stats.misses += 1;
      None
    }
  }

  /// Store a score for the unordered pair, evicting the least-recently-used
  /// entry when full. Re-setting an existing pair overwrites and promotes.
  pub fn set(&mut self, id_a: &str, id_b: &str, score: f32) {
    let key = PairKey::new(id_a, id_b);
    let entry = SimilarityEntry { score, computed_at: Utc::now() };

    if let Some(&idx) = self.map.get(&key) {
      self.arena[idx].entry = Some(entry);
      self.move_to_head(idx);
      return;
    }

    if self.map.len() >= self.capacity {
      self.evict_tail();
    }

    let idx = self.alloc(key.clone(), entry);
    self.push_head(idx);
    self.map.insert(key, idx);
    self.stats.insertions += 1;
  }

  /// Drop every entry whose key involves `id`. Called when a company is
  /// added, removed, or re-embedded; unrelated pairs stay cached.
  pub fn invalidate(&mut self, id: &str) -> usize {
    let stale: Vec<PairKey> =
      self.map.keys().filter(|key| key.contains(id)).cloned().collect();
    for key in &stale {
      self.remove(key);
    }
    if !stale.is_empty() {
      tracing::debug!(company = %id, dropped = stale.len(), "cache entries invalidated");
    }
    stale.len()
  }

  /// Drop everything. The conservative answer to any corpus mutation.
  pub fn clear(&mut self) {
    self.map.clear();
    self.arena.clear();
    self.head = NIL;
    self.tail = NIL;
    self.free_head = NIL;
  }

  fn remove(&mut self, key: &PairKey) {
    if let Some(idx) = self.map.remove(key) {
      self.unlink(idx);
      self.arena[idx].entry = None;
      self.arena[idx].next = self.free_head;
      self.free_head = idx;
    }
  }

  fn alloc(&mut self, key: PairKey, entry: SimilarityEntry) -> usize {
    let node = Node { key, entry: Some(entry), prev: NIL, next: NIL };
    if self.free_head != NIL {
      let idx = self.free_head;
      self.free_head = self.arena[idx].next;
      self.arena[idx] = node;
      idx
    } else {
      self.arena.push(node);
      self.arena.len() - 1
    }
  }

  fn unlink(&mut self, idx: usize) {
    let prev = self.arena[idx].prev;
    let next = self.arena[idx].next;

    if prev != NIL {
      self.arena[prev].next = next;
    } else {
      self.head = next;
    }

    if next != NIL {
      self.arena[next].prev = prev;
    } else {
      self.tail = prev;
    }

    self.arena[idx].prev = NIL;
    self.arena[idx].next = NIL;
  }

  fn push_head(&mut self, idx: usize) {
    self.arena[idx].prev = NIL;
    self.arena[idx].next = self.head;

    if self.head != NIL {
      self.arena[self.head].prev = idx;
    }
    self.head = idx;

    if self.tail == NIL {
      self.tail = idx;
    }
  }

  fn move_to_head(&mut self, idx: usize) {
    if self.head == idx {
      return;
    }
    self.unlink(idx);
    self.push_head(idx);
  }

  fn evict_tail(&mut self) {
    if self.tail == NIL {
      return;
    }
    let idx = self.tail;
    let key = self.arena[idx].key.clone();
    self.unlink(idx);
    self.map.remove(&key);
    self.arena[idx].entry = None;
    self.arena[idx].next = self.free_head;
    self.free_head = idx;
    self.stats.evictions += 1;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn key_is_order_independent() {
    assert_eq!(PairKey::new("beta", "alpha"), PairKey::new("alpha", "beta"));
  }

  #[test]
  fn get_after_set_either_order() {
    let mut cache = SimilarityCache::new(4);
    cache.set("a", "b", 0.8);
    assert_eq!(cache.get("a", "b"), Some(0.8));
    assert_eq!(cache.get("b", "a"), Some(0.8));
    assert_eq!(cache.len(), 1);
  }

  #[test]
  fn miss_returns_none() {
    let mut cache = SimilarityCache::new(4);
    cache.set("a", "b", 0.8);
    assert_eq!(cache.get("a", "c"), None);
    assert_eq!(cache.stats().misses, 1);
  }

  #[test]
  fn overwrite_same_pair_keeps_one_entry() {
    let mut cache = SimilarityCache::new(4);
    cache.set("a", "b", 0.8);
    cache.set("b", "a", 0.4);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.get("a", "b"), Some(0.4));
  }

  #[test]
  fn evicts_least_recently_used() {
    let mut cache = SimilarityCache::new(2);
    cache.set("a", "b", 0.1);
    cache.set("c", "d", 0.2);
    cache.set("e", "f", 0.3); // evicts (a, b)

    assert_eq!(cache.get("a", "b"), None);
    assert_eq!(cache.get("c", "d"), Some(0.2));
    assert_eq!(cache.get("e", "f"), Some(0.3));
    assert_eq!(cache.stats().evictions, 1);
  }

  #[test]
  fn get_promotes_entry() {
    let mut cache = SimilarityCache::new(2);
    cache.set("a", "b", 0.1);
    cache.set("c", "d", 0.2);

    cache.get("a", "b"); // (c, d) is now the LRU
    cache.set("e", "f", 0.3);

    assert_eq!(cache.get("a", "b"), Some(0.1));
    assert_eq!(cache.get("c", "d"), None);
  }

  #[test]
  fn exceeding_capacity_by_one_drops_exactly_the_oldest() {
    let mut cache = SimilarityCache::new(100);
    for i in 0..101 {
      cache.set(&format!("x{i}"), &format!("y{i}"), i as f32 / 101.0);
    }
    assert_eq!(cache.len(), 100);
    assert_eq!(cache.get("x0", "y0"), None);
    for i in 1..101 {
      assert!(cache.get(&format!("x{i}"), &format!("y{i}")).is_some());
    }
  }

  #[test]
  fn invalidate_drops_only_entries_touching_the_id() {
    let mut cache = SimilarityCache::new(8);
    cache.set("a", "b", 0.1);
    cache.set("a", "c", 0.2);
    cache.set("b", "c", 0.3);

    let dropped = cache.invalidate("a");
    assert_eq!(dropped, 2);
    assert_eq!(cache.get("a", "b"), None);
    assert_eq!(cache.get("a", "c"), None);
    assert_eq!(cache.get("b", "c"), Some(0.3));
  }

  #[test]
  fn clear_empties_the_cache() {
    let mut cache = SimilarityCache::new(4);
    cache.set("a", "b", 0.1);
    cache.clear();
    assert!(cache.is_empty());
    assert_eq!(cache.get("a", "b"), None);
  }

  #[test]
  fn slots_are_reused_after_invalidation() {
    let mut cache = SimilarityCache::new(2);
    cache.set("a", "b", 0.1);
    cache.set("c", "d", 0.2);
    cache.invalidate("a");
    cache.set("e", "f", 0.3);
    cache.set("g", "h", 0.4); // evicts (c, d)

    assert_eq!(cache.len(), 2);
    assert!(cache.arena.len() <= 3);
    assert_eq!(cache.get("c", "d"), None);
    assert_eq!(cache.get("e", "f"), Some(0.3));
    assert_eq!(cache.get("g", "h"), Some(0.4));
  }

  #[test]
  fn hit_rate_tracks_lookups() {
    let mut cache = SimilarityCache::new(4);
    cache.set("a", "b", 0.1);
    cache.get("a", "b");
    cache.get("a", "z");
    assert!((cache.stats().hit_rate() - 0.5).abs() < 1e-9);
  }

  #[test]
  #[should_panic(expected = "capacity must be > 0")]
  fn zero_capacity_panics() {
    SimilarityCache::new(0);
  }
}
