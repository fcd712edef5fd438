//! Frequency estimation: the Count-Min Sketch and the Top-K heavy-hitters
//! tracker built on top of it

mod count_min;
mod topk;

pub use count_min::CountMinSketch;
pub use topk::TopKElements;
