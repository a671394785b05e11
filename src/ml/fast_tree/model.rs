use serde::{Deserialize, Serialize};

use crate::featurize::SparseVector;

/// Node of a regression tree; children are indices into the owning tree's node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        /// Feature index used for the split.
        feature: u32,
        /// Threshold in feature units.
        threshold: f32,
        /// Node for `feature <= threshold`.
        left: u32,
        /// Node for `feature > threshold`.
        right: u32,
    },
    Leaf {
        value: f32,
    },
}

/// Binary regression tree rooted at node 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Walk the tree for a feature vector and return the leaf value.
    pub fn predict(&self, features: &SparseVector) -> f32 {
        match self.leaf_index(features).and_then(|idx| self.nodes.get(idx)) {
            Some(TreeNode::Leaf { value }) => *value,
            _ => 0.0,
        }
    }

    /// Index of the leaf node a feature vector lands in.
    pub fn leaf_index(&self, features: &SparseVector) -> Option<usize> {
        let mut idx = 0usize;
        // Bounded by node count so malformed trees cannot loop forever.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(idx)? {
                TreeNode::Leaf { .. } => return Some(idx),
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features.get(*feature) <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
            }
        }
        None
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, TreeNode::Leaf { .. }))
            .count()
    }

    fn validate(&self, feature_count: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }
        let n = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature as usize >= feature_count {
                    return Err(format!(
                        "Node {idx} splits on feature {feature} but model has {feature_count}"
                    ));
                }
                for child in [*left as usize, *right as usize] {
                    if child <= idx || child >= n {
                        return Err(format!("Node {idx} has invalid child {child}"));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Gradient-boosted regression trees scoring the positive class in log-odds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastTreeModel {
    /// Model format version.
    pub model_version: i64,
    /// Width of the feature space the trees index into.
    pub feature_count: usize,
    /// Shrinkage applied to every tree output.
    pub learning_rate: f32,
    /// Log-odds prior before any tree is applied.
    pub init_score: f32,
    pub trees: Vec<RegressionTree>,
}

impl FastTreeModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.feature_count == 0 {
            return Err("Model must have at least one feature".to_string());
        }
        if !self.init_score.is_finite() || !self.learning_rate.is_finite() {
            return Err("Model scores must be finite".to_string());
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_count)
                .map_err(|err| format!("Tree {tree_idx}: {err}"))?;
        }
        Ok(())
    }

    /// Raw log-odds score; positive means the positive class.
    pub fn predict_raw(&self, features: &SparseVector) -> f32 {
        let boosted: f32 = self.trees.iter().map(|tree| tree.predict(features)).sum();
        self.init_score + self.learning_rate * boosted
    }

    /// Probability of the positive class.
    pub fn predict_probability(&self, features: &SparseVector) -> f32 {
        sigmoid(self.predict_raw(features))
    }

    pub fn predict_label(&self, features: &SparseVector) -> bool {
        self.predict_raw(features) > 0.0
    }
}

/// Logistic function, stable for large magnitudes.
pub fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}
