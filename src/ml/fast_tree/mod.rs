//! Gradient-boosted regression trees for binary classification.
//!
//! Training follows the FastTree recipe:
//! - Logistic loss with Newton leaf outputs.
//! - Best-first growth bounded by `num_leaves` and `min_docs_per_leaf`.
//! - Histogram split search over sparse columns, implicit zeros included.
//! - Reproducible JSON model export/load.

mod model;
mod train;

pub use model::{FastTreeModel, RegressionTree, TreeNode, sigmoid};
pub use train::{FastTreeOptions, TrainDataset, TrainError, train_fast_tree};
