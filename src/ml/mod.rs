//! Machine learning building blocks for training and inference.
//!
//! Training is deterministic: the same inputs and seed always give the same
//! model and the same metrics.

pub mod fast_tree;
pub mod metrics;
