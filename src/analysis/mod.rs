//! Analysis modules.
//!
//! Aggregation is kept free of any presentation concerns so it can be
//! tested on plain record values.

pub mod aggregator;

pub use aggregator::*;
