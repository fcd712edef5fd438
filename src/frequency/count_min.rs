//! Count-Min Sketch implementation for signed frequency estimation
//!
//! Count-Min Sketch (Cormode & Muthukrishnan, 2003) is the standard algorithm
//! for point query frequency estimation. For positive-only streams it provides
//! a one-sided guarantee:
//! - Never underestimates (only overestimates)
//! - Error bounded by ε with probability 1-δ
//! - Space: O((e/ε) * ln(1/δ))
//! - Time: O(ln(1/δ)) per operation
//!
//! This sketch additionally accepts negative deltas (turnstile updates), which
//! gives up the one-sided guarantee above but lets [`TopKElements`] track
//! decrements and removals. The estimate for any key remains the minimum over
//! the `d` rows, never the median: with signed cells the median has no such
//! guarantee, and switching to it would change which keys demotion and
//! eviction select in the turnstile tests.
//!
//! # Optimizations
//! - **Single-hash-derive pattern**: hash the key once, derive `d` positions by
//!   mixing the digest with each row's seed ([`HashFamily`])
//! - **Power-of-2 width with bitmask**: use `& mask` instead of `% width`
//! - **Flat table layout**: better cache locality than `Vec<Vec<_>>`
//!
//! # References
//! - Cormode, G., & Muthukrishnan, S. (2003). "An improved data stream summary:
//!   the count-min sketch and its applications"
//!
//! [`TopKElements`]: crate::frequency::TopKElements

use crate::common::hash::{HashFamily, KeyBytes};
use crate::common::validation;
use crate::common::{Result, SketchError};

/// Count-Min Sketch for signed frequency estimation
///
/// A space-efficient probabilistic data structure for estimating item
/// frequencies in a stream of positive or negative `(key, delta)` updates.
///
/// For positive-only streams: never underestimates, and error is bounded by
/// εN with probability 1-δ. Once a key receives a negative update, its
/// estimate may itself go negative or fall below the true count; see
/// module docs.
///
/// # Examples
/// ```
/// use heavy_hitters::frequency::CountMinSketch;
///
/// let mut cms = CountMinSketch::with_epsilon_delta(0.01, 0.01).unwrap();
///
/// cms.update(&"apple", 1);
/// cms.update(&"apple", 1);
/// cms.update(&"banana", 1);
///
/// assert!(cms.estimate(&"apple") >= 2);
/// assert!(cms.estimate(&"banana") >= 1);
/// assert_eq!(cms.estimate(&"cherry"), 0);
/// ```
#[derive(Clone, Debug)]
pub struct CountMinSketch {
    /// Width of each row (power of 2 for fast modulo)
    width: usize,
    /// Number of rows (hash functions)
    depth: usize,
    /// Flat table of counters: depth x width (row-major for cache locality)
    table: Vec<i64>,
    /// Hash family providing the `d` column indices per key
    hashes: HashFamily,
    /// Cumulative sum of positive deltas ever applied (diagnostic only)
    total_count: i64,
}

impl CountMinSketch {
    /// Creates a new Count-Min Sketch with explicit dimensions.
    ///
    /// # Errors
    /// Returns [`SketchError::InvalidShape`] if `width == 0` or `depth == 0`.
    pub fn new(width: usize, depth: usize) -> Result<Self> {
        Self::new_seeded(width, depth, None)
    }

    /// Creates a new Count-Min Sketch with explicit dimensions and an explicit
    /// hash seed, for callers that need reproducible sketches across processes.
    ///
    /// # Errors
    /// Returns [`SketchError::InvalidShape`] if `width == 0` or `depth == 0`.
    pub fn new_seeded(width: usize, depth: usize, seed: Option<u64>) -> Result<Self> {
        validation::validate_dimension("width", width)?;
        validation::validate_dimension("depth", depth)?;

        let hashes = HashFamily::new(depth, seed);
        Ok(CountMinSketch {
            width,
            depth,
            table: vec![0i64; depth * width],
            hashes,
            total_count: 0,
        })
    }

    /// Creates a new Count-Min Sketch sized from error targets.
    ///
    /// `width = ceil(e/epsilon)`, rounded up to the next power of two so column
    /// selection can use a bitmask; `depth = ceil(ln(1/delta))`.
    ///
    /// # Errors
    /// Returns [`SketchError::InvalidShape`] if `epsilon` or `delta` is not in
    /// `(0, 1)`.
    pub fn with_epsilon_delta(epsilon: f64, delta: f64) -> Result<Self> {
        Self::with_epsilon_delta_seeded(epsilon, delta, None)
    }

    /// Same as [`CountMinSketch::with_epsilon_delta`], with an explicit hash seed.
    pub fn with_epsilon_delta_seeded(epsilon: f64, delta: f64, seed: Option<u64>) -> Result<Self> {
        validation::validate_probability("epsilon", epsilon)?;
        validation::validate_probability("delta", delta)?;

        let width = ((std::f64::consts::E / epsilon).ceil() as usize)
            .max(1)
            .next_power_of_two();
        let depth = ((1.0 / delta).ln().ceil() as usize).max(1);

        Self::new_seeded(width, depth, seed)
    }

    /// Updates the sketch with a signed delta for `key`.
    ///
    /// `delta` may be negative; counters saturate rather than overflow.
    ///
    /// # Time Complexity
    /// O(d)
    pub fn update<K: KeyBytes + ?Sized>(&mut self, key: &K, delta: i64) {
        if delta > 0 {
            self.total_count = self.total_count.saturating_add(delta);
        }
        for (row, col) in self.hashes.columns(key, self.width).into_iter().enumerate() {
            let idx = row * self.width + col;
            self.table[idx] = self.table[idx].saturating_add(delta);
        }
    }

    /// Estimates the frequency of `key` as the minimum counter across all rows.
    ///
    /// May be negative after a key has been driven below its true count by
    /// decrements. Returns `0` for a key that was never observed in an
    /// otherwise-empty sketch.
    ///
    /// # Time Complexity
    /// O(d)
    pub fn estimate<K: KeyBytes + ?Sized>(&self, key: &K) -> i64 {
        self.hashes
            .columns(key, self.width)
            .into_iter()
            .enumerate()
            .map(|(row, col)| self.table[row * self.width + col])
            .min()
            .unwrap_or(0)
    }

    /// Cumulative sum of positive deltas applied via [`CountMinSketch::update`].
    ///
    /// Diagnostic only; not used by any estimate computation.
    #[inline]
    pub fn total_count(&self) -> i64 {
        self.total_count
    }

    /// Width of each row.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns `true` if every counter is zero.
    pub fn is_empty(&self) -> bool {
        self.table.iter().all(|&count| count == 0)
    }

    /// Zeroes all counters, discarding all prior updates.
    pub fn clear(&mut self) {
        self.table.iter_mut().for_each(|c| *c = 0);
        self.total_count = 0;
    }

    /// Merges `other`'s counters into `self` cell-wise.
    ///
    /// # Errors
    /// Returns [`SketchError::IncompatibleShape`] if `self` and `other` have a
    /// different width, depth, or hash seed — a shape mismatch means the two
    /// sketches hash keys to different columns and cannot be combined
    /// meaningfully.
    pub fn merge(&mut self, other: &Self) -> Result<()> {
        if self.width != other.width {
            return Err(SketchError::IncompatibleShape {
                reason: format!("width mismatch: {} vs {}", self.width, other.width),
            });
        }
        if self.depth != other.depth {
            return Err(SketchError::IncompatibleShape {
                reason: format!("depth mismatch: {} vs {}", self.depth, other.depth),
            });
        }
        if self.hashes.row_seeds() != other.hashes.row_seeds() {
            return Err(SketchError::IncompatibleShape {
                reason: "hash seed mismatch".to_string(),
            });
        }

        for (a, &b) in self.table.iter_mut().zip(other.table.iter()) {
            *a = a.saturating_add(b);
        }
        self.total_count = self.total_count.saturating_add(other.total_count);

        Ok(())
    }
}
