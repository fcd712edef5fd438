//! Count-Min Sketch backed Top-K heavy-hitters tracker
//!
//! Estimates the most frequent keys in a stream of positive or negative
//! `(key, delta)` updates without storing per-key exact counts. Frequency
//! estimation is delegated to a [`frequency::CountMinSketch`]; the tracked
//! top-k set on top of it is [`frequency::TopKElements`].
//!
//! # Examples
//! ```
//! use heavy_hitters::frequency::TopKElements;
//!
//! let mut top_k = TopKElements::new(10, 2048, 5).unwrap();
//! top_k.increment(&"select * from orders", 120);
//! top_k.increment(&"select * from customers", 4);
//!
//! for key in top_k.sorted_top_keys() {
//!     println!("{}: {}", key, top_k.estimate(&key));
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod common;
pub mod frequency;

pub use common::hash::{HashFamily, KeyBytes};
pub use common::{Result, SketchError};
pub use frequency::{CountMinSketch, TopKElements};
