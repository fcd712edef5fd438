//! Top-K heavy-hitters tracker backed by a [`CountMinSketch`]
//!
//! Maintains a bounded set of at most `k` candidate heavy hitters with their
//! estimated counts. Every update flows through an internally owned
//! [`CountMinSketch`] first; the tracker then promotes, updates, demotes, or
//! evicts an entry in the tracked set from the resulting estimate. Control
//! flow is strictly top-down — the tracker drives the sketch, never the other
//! way around.
//!
//! # Algorithm
//!
//! - `increment` adds a positive delta, re-estimates the key, and either
//!   updates an already-tracked key, promotes an untracked key if there is
//!   free capacity, demotes the current minimum if the new estimate beats it,
//!   or drops the update entirely.
//! - `decrement` adds a negative delta and, if the key is already tracked,
//!   updates its stored count or evicts it once the estimate falls to zero or
//!   below. A decremented key that was never tracked is **never** promoted by
//!   this alone, even though its sketch cells have been mutated — promotion
//!   only happens through `increment`.
//! - `remove` unconditionally evicts a key from the tracked set without
//!   touching its sketch counters; a later `increment` can re-promote it from
//!   whatever the sketch still remembers.
//!
//! The tracked set is implemented as an indexed binary min-heap (array plus a
//! key→index back-map) rather than [`std::collections::BinaryHeap`], because
//! the tracker needs O(log k) updates to an arbitrary key's priority, not just
//! push/pop of the minimum.

use crate::common::hash::KeyBytes;
use crate::common::validation;
use crate::common::Result;
use crate::frequency::CountMinSketch;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Clone, Debug)]
struct HeapEntry<K> {
    key: K,
    count: i64,
    seq: u64,
}

#[inline]
fn heap_less<K>(a: &HeapEntry<K>, b: &HeapEntry<K>) -> bool {
    (a.count, a.seq) < (b.count, b.seq)
}

/// Indexed binary min-heap over `(count, insertion order)`, with O(log n)
/// arbitrary-key removal and priority updates via a key→index back-map.
#[derive(Clone, Debug)]
struct IndexedMinHeap<K: Eq + Hash + Clone> {
    entries: Vec<HeapEntry<K>>,
    index: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone> IndexedMinHeap<K> {
    fn new() -> Self {
        IndexedMinHeap {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    fn count_of(&self, key: &K) -> Option<i64> {
        self.index.get(key).map(|&i| self.entries[i].count)
    }

    fn peek_min(&self) -> Option<(&K, i64)> {
        self.entries.first().map(|e| (&e.key, e.count))
    }

    fn iter(&self) -> impl Iterator<Item = &HeapEntry<K>> {
        self.entries.iter()
    }

    fn swap_entries(&mut self, i: usize, j: usize) {
        self.entries.swap(i, j);
        self.index.insert(self.entries[i].key.clone(), i);
        self.index.insert(self.entries[j].key.clone(), j);
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if heap_less(&self.entries[i], &self.entries[parent]) {
                self.swap_entries(i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * i + 1;
            let right = 2 * i + 2;
            let mut smallest = i;
            if left < len && heap_less(&self.entries[left], &self.entries[smallest]) {
                smallest = left;
            }
            if right < len && heap_less(&self.entries[right], &self.entries[smallest]) {
                smallest = right;
            }
            if smallest == i {
                break;
            }
            self.swap_entries(i, smallest);
            i = smallest;
        }
    }

    fn push(&mut self, key: K, count: i64, seq: u64) {
        self.entries.push(HeapEntry { key: key.clone(), count, seq });
        let idx = self.entries.len() - 1;
        self.index.insert(key, idx);
        self.sift_up(idx);
    }

    fn update_count(&mut self, key: &K, new_count: i64) {
        let Some(&idx) = self.index.get(key) else {
            return;
        };
        let old_count = self.entries[idx].count;
        self.entries[idx].count = new_count;
        match new_count.cmp(&old_count) {
            std::cmp::Ordering::Less => self.sift_down(idx),
            std::cmp::Ordering::Greater => self.sift_up(idx),
            std::cmp::Ordering::Equal => {}
        }
    }

    fn remove(&mut self, key: &K) -> Option<HeapEntry<K>> {
        let idx = self.index.remove(key)?;
        let last = self.entries.len() - 1;
        if idx != last {
            self.entries.swap(idx, last);
            self.index.insert(self.entries[idx].key.clone(), idx);
        }
        let removed = self.entries.pop();
        if idx < self.entries.len() {
            self.sift_up(idx);
            self.sift_down(idx);
        }
        removed
    }
}

/// Bounded top-K heavy-hitters tracker.
///
/// Wraps a [`CountMinSketch`]; every operation below first applies its delta
/// to the sketch, then adjusts at most one entry of the tracked set. See the
/// module docs for the full promotion/demotion/eviction rules.
///
/// # Examples
/// ```
/// use heavy_hitters::frequency::TopKElements;
///
/// let mut top_k = TopKElements::new(2, 1000, 4).unwrap();
/// top_k.increment(&"apple", 10);
/// top_k.increment(&"banana", 3);
/// top_k.increment(&"cherry", 50);
///
/// assert_eq!(top_k.size(), 2);
/// assert_eq!(top_k.sorted_top_keys(), vec!["cherry", "apple"]);
/// ```
#[derive(Clone, Debug)]
pub struct TopKElements<K: Eq + Hash + Clone + KeyBytes> {
    k: usize,
    heap: IndexedMinHeap<K>,
    sketch: CountMinSketch,
    next_seq: u64,
}

impl<K: Eq + Hash + Clone + KeyBytes> TopKElements<K> {
    /// Creates a tracker of at most `k` keys, backed by a `width x depth`
    /// Count-Min Sketch.
    ///
    /// # Errors
    /// Returns [`crate::common::SketchError::InvalidShape`] if `k == 0`,
    /// `width == 0`, or `depth == 0`.
    pub fn new(k: usize, width: usize, depth: usize) -> Result<Self> {
        Self::new_seeded(k, width, depth, None)
    }

    /// Same as [`TopKElements::new`], with an explicit hash seed for the
    /// underlying sketch.
    pub fn new_seeded(k: usize, width: usize, depth: usize, seed: Option<u64>) -> Result<Self> {
        validation::validate_dimension("k", k)?;
        let sketch = CountMinSketch::new_seeded(width, depth, seed)?;
        Ok(TopKElements {
            k,
            heap: IndexedMinHeap::new(),
            sketch,
            next_seq: 0,
        })
    }

    /// Creates a tracker of at most `k` keys, with the underlying sketch sized
    /// from `(epsilon, delta)` error targets.
    ///
    /// # Errors
    /// Returns [`crate::common::SketchError::InvalidShape`] if `k == 0` or
    /// `epsilon`/`delta` is outside `(0, 1)`.
    pub fn with_epsilon_delta(k: usize, epsilon: f64, delta: f64) -> Result<Self> {
        Self::with_epsilon_delta_seeded(k, epsilon, delta, None)
    }

    /// Same as [`TopKElements::with_epsilon_delta`], with an explicit hash seed.
    pub fn with_epsilon_delta_seeded(
        k: usize,
        epsilon: f64,
        delta: f64,
        seed: Option<u64>,
    ) -> Result<Self> {
        validation::validate_dimension("k", k)?;
        let sketch = CountMinSketch::with_epsilon_delta_seeded(epsilon, delta, seed)?;
        Ok(TopKElements {
            k,
            heap: IndexedMinHeap::new(),
            sketch,
            next_seq: 0,
        })
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Adds `delta` occurrences of `key` to the stream.
    ///
    /// Updates the underlying sketch, then promotes, updates, or demotes the
    /// tracked set per the module-level rules.
    ///
    /// # Time Complexity
    /// O(d + log k)
    pub fn increment(&mut self, key: &K, delta: u64) {
        let signed = delta.min(i64::MAX as u64) as i64;
        self.sketch.update(key, signed);
        let est = self.sketch.estimate(key);

        if est <= 0 {
            if self.heap.contains(key) {
                self.heap.remove(key);
                log::debug!("evicted tracked key: estimate fell to {}", est);
            }
            return;
        }

        if self.heap.contains(key) {
            self.heap.update_count(key, est);
            log::trace!("refreshed tracked key: estimate now {}", est);
            return;
        }

        if self.heap.len() < self.k {
            let seq = self.take_seq();
            self.heap.push(key.clone(), est, seq);
            log::debug!(
                "promoted new key: estimate {}, tracked set now {}/{}",
                est,
                self.heap.len(),
                self.k
            );
            return;
        }

        if let Some((min_key, min_count)) = self.heap.peek_min() {
            if est > min_count {
                let min_key = min_key.clone();
                self.heap.remove(&min_key);
                let seq = self.take_seq();
                self.heap.push(key.clone(), est, seq);
                log::debug!(
                    "demoted heap-min candidate (count={}) in favor of new candidate (count={})",
                    min_count,
                    est
                );
            } else {
                log::trace!(
                    "dropped candidate: estimate {} does not exceed heap-min {}",
                    est,
                    min_count
                );
            }
        }
    }

    /// Removes `delta` occurrences of `key` from the stream.
    ///
    /// Updates the underlying sketch regardless of whether `key` is tracked.
    /// If `key` is tracked, its stored count is refreshed or it is evicted
    /// once its estimate falls to zero or below. A key that is **not**
    /// currently tracked is never promoted by a decrement, no matter how the
    /// delta interacts with its sketch cells.
    ///
    /// # Time Complexity
    /// O(d + log k)
    pub fn decrement(&mut self, key: &K, delta: u64) {
        let signed = delta.min(i64::MAX as u64) as i64;
        self.sketch.update(key, -signed);

        if !self.heap.contains(key) {
            return;
        }

        let est = self.sketch.estimate(key);
        if est <= 0 {
            self.heap.remove(key);
            log::debug!("evicted tracked key via decrement: estimate fell to {}", est);
        } else {
            self.heap.update_count(key, est);
            log::trace!("refreshed tracked key via decrement: estimate now {}", est);
        }
    }

    /// Unconditionally evicts `key` from the tracked set, if present.
    ///
    /// Does not touch the underlying sketch's counters for `key`: the same
    /// cells are shared with other keys, so zeroing them would corrupt
    /// unrelated estimates.
    ///
    /// # Time Complexity
    /// O(log k)
    pub fn remove(&mut self, key: &K) {
        if self.heap.remove(key).is_some() {
            log::debug!("explicitly removed tracked key, tracked set now {}", self.heap.len());
        }
    }

    /// Returns the best available estimate for `key`.
    ///
    /// If `key` is tracked, returns its stored count (the estimate as of its
    /// last update). Otherwise returns the raw sketch estimate, which may be
    /// at or below zero.
    pub fn estimate(&self, key: &K) -> i64 {
        self.heap
            .count_of(key)
            .unwrap_or_else(|| self.sketch.estimate(key))
    }

    /// Number of keys currently tracked (`<= k`).
    #[inline]
    pub fn size(&self) -> usize {
        self.heap.len()
    }

    /// The configured maximum number of tracked keys.
    #[inline]
    pub fn get_k(&self) -> usize {
        self.k
    }

    /// Snapshot of tracked keys ordered by descending stored count.
    ///
    /// Ties are broken by insertion order: among keys with equal counts, the
    /// one promoted earlier sorts first.
    pub fn sorted_top_keys(&self) -> Vec<K> {
        let mut entries: Vec<&HeapEntry<K>> = self.heap.iter().collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then(a.seq.cmp(&b.seq)));
        entries.into_iter().map(|e| e.key.clone()).collect()
    }

    /// Formats the tracked set as `[key: count]` lines, one per key, in
    /// `sorted_top_keys` order. Intended for diagnostic logging only.
    pub fn fmt_top_keys(&self) -> String
    where
        K: std::fmt::Display,
    {
        log::trace!("formatting {} tracked keys for diagnostics", self.heap.len());
        self.sorted_top_keys()
            .into_iter()
            .map(|key| {
                let count = self.estimate(&key);
                format!("[{}: {}]", key, count)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_k() {
        assert!(TopKElements::<String>::new(0, 1000, 4).is_err());
    }

    #[test]
    fn size_cap_holds() {
        let mut top_k = TopKElements::new(3, 1000, 4).unwrap();
        for i in 0..10u64 {
            top_k.increment(&i, 1);
        }
        assert!(top_k.size() <= 3);
        assert_eq!(top_k.sorted_top_keys().len(), top_k.size());
    }

    #[test]
    fn sorted_top_keys_is_non_increasing() {
        let mut top_k = TopKElements::new(5, 1000, 4).unwrap();
        top_k.increment(&"a", 1);
        top_k.increment(&"b", 10);
        top_k.increment(&"c", 5);

        let keys = top_k.sorted_top_keys();
        let counts: Vec<i64> = keys.iter().map(|k| top_k.estimate(k)).collect();
        assert!(counts.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn decrement_to_non_positive_evicts() {
        let mut top_k = TopKElements::new(5, 1000, 4).unwrap();
        top_k.increment(&"a", 3);
        assert_eq!(top_k.size(), 1);

        top_k.decrement(&"a", 10);
        assert_eq!(top_k.size(), 0);
        assert!(!top_k.sorted_top_keys().contains(&"a"));
    }

    #[test]
    fn decrement_never_promotes_untracked_key() {
        let mut top_k = TopKElements::new(2, 1000, 4).unwrap();
        top_k.increment(&"a", 1);
        top_k.increment(&"b", 1);
        assert_eq!(top_k.size(), 2);

        top_k.decrement(&"never_seen", 1);
        top_k.decrement(&"never_seen", 1);
        assert_eq!(top_k.size(), 2);
        assert!(!top_k.sorted_top_keys().contains(&"never_seen"));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut top_k = TopKElements::new(5, 1000, 4).unwrap();
        top_k.increment(&"a", 10);
        top_k.remove(&"a");
        let after_first = top_k.size();
        top_k.remove(&"a");
        assert_eq!(top_k.size(), after_first);
        assert_eq!(top_k.size(), 0);
    }

    #[test]
    fn promotion_by_stronger_candidate_evicts_current_minimum() {
        let mut top_k = TopKElements::new(2, 1000, 4).unwrap();
        top_k.increment(&"low", 1);
        top_k.increment(&"mid", 5);
        assert_eq!(top_k.size(), 2);

        top_k.increment(&"high", 100);
        assert_eq!(top_k.size(), 2);
        let keys = top_k.sorted_top_keys();
        assert!(keys.contains(&"high"));
        assert!(keys.contains(&"mid"));
        assert!(!keys.contains(&"low"));
    }

    #[test]
    fn full_set_drops_weaker_candidate() {
        let mut top_k = TopKElements::new(2, 1000, 4).unwrap();
        top_k.increment(&"a", 100);
        top_k.increment(&"b", 100);
        top_k.increment(&"weak", 1);

        assert_eq!(top_k.size(), 2);
        assert!(!top_k.sorted_top_keys().contains(&"weak"));
    }

    #[test]
    fn estimate_of_untracked_key_falls_back_to_sketch() {
        let mut top_k = TopKElements::new(1, 1000, 4).unwrap();
        top_k.increment(&"tracked", 100);
        top_k.increment(&"untracked", 1);

        // "untracked" lost to "tracked" for the single slot but its sketch
        // cells were still bumped, so estimate() must see that, not zero.
        assert!(top_k.estimate(&"untracked") >= 1);
    }

    #[test]
    fn fmt_top_keys_orders_like_sorted_top_keys() {
        let mut top_k = TopKElements::new(3, 1000, 4).unwrap();
        top_k.increment(&"a", 1);
        top_k.increment(&"b", 5);
        let formatted = top_k.fmt_top_keys();
        let b_pos = formatted.find("b:").unwrap();
        let a_pos = formatted.find("a:").unwrap();
        assert!(b_pos < a_pos);
    }
}
