use rand::rngs::StdRng;
use rand::{SeedableRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::{FastTreeModel, RegressionTree, TreeNode, sigmoid};
use crate::featurize::SparseVector;
use crate::ml::metrics::log_loss;

/// Largest absolute leaf output, before shrinkage.
const MAX_LEAF_OUTPUT: f64 = 8.0;
/// Keeps Newton steps finite when every row in a leaf is already confident.
const HESSIAN_FLOOR: f64 = 1e-6;
const MIN_SPLIT_GAIN: f64 = 1e-12;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("Training dataset is empty")]
    EmptyDataset,
    #[error("Training dataset has {rows} rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },
    #[error("Training dataset has no features")]
    NoFeatures,
    #[error("Training dataset contains a single class; need both positive and negative rows")]
    SingleClass,
    #[error("Row {row} references feature {index} but the dataset has {feature_count}")]
    FeatureOutOfRange {
        row: usize,
        index: u32,
        feature_count: usize,
    },
    #[error("Invalid trainer options: {0}")]
    InvalidOptions(String),
}

/// Hyperparameters for boosted-tree training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FastTreeOptions {
    /// Number of boosting rounds, one tree per round.
    pub num_trees: usize,
    /// Maximum leaves per tree.
    pub num_leaves: usize,
    /// Minimum training rows that must land in every leaf.
    pub min_docs_per_leaf: usize,
    /// Shrinkage applied to every tree.
    pub learning_rate: f32,
    /// Number of bins used for split search.
    pub max_bins: usize,
    /// Share of features offered to each tree.
    pub feature_fraction: f32,
    /// Seed for feature sampling.
    pub seed: u64,
}

impl Default for FastTreeOptions {
    fn default() -> Self {
        Self {
            num_trees: 100,
            num_leaves: 20,
            min_docs_per_leaf: 10,
            learning_rate: 0.2,
            max_bins: 255,
            feature_fraction: 1.0,
            seed: 42,
        }
    }
}

impl FastTreeOptions {
    pub fn validate(&self) -> Result<(), TrainError> {
        let invalid = |msg: &str| Err(TrainError::InvalidOptions(msg.to_string()));
        if self.num_trees == 0 {
            return invalid("num_trees must be at least 1");
        }
        if self.num_leaves < 2 {
            return invalid("num_leaves must be at least 2");
        }
        if self.min_docs_per_leaf == 0 {
            return invalid("min_docs_per_leaf must be at least 1");
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return invalid("learning_rate must be a positive number");
        }
        if self.max_bins < 2 {
            return invalid("max_bins must be at least 2");
        }
        if !(self.feature_fraction > 0.0 && self.feature_fraction <= 1.0) {
            return invalid("feature_fraction must be in (0, 1]");
        }
        Ok(())
    }
}

/// In-memory featurized dataset used for training.
#[derive(Debug, Clone, Default)]
pub struct TrainDataset {
    /// Width of the feature space.
    pub feature_count: usize,
    /// Feature rows.
    pub rows: Vec<SparseVector>,
    /// Positive-class flags aligned with `rows`.
    pub labels: Vec<bool>,
}

impl TrainDataset {
    fn validate(&self) -> Result<(), TrainError> {
        if self.rows.len() != self.labels.len() {
            return Err(TrainError::LengthMismatch {
                rows: self.rows.len(),
                labels: self.labels.len(),
            });
        }
        if self.rows.is_empty() {
            return Err(TrainError::EmptyDataset);
        }
        if self.feature_count == 0 {
            return Err(TrainError::NoFeatures);
        }
        let positives = self.labels.iter().filter(|&&y| y).count();
        if positives == 0 || positives == self.labels.len() {
            return Err(TrainError::SingleClass);
        }
        for (row_idx, row) in self.rows.iter().enumerate() {
            if let Some(&index) = row.indices.last()
                && index as usize >= self.feature_count
            {
                return Err(TrainError::FeatureOutOfRange {
                    row: row_idx,
                    index,
                    feature_count: self.feature_count,
                });
            }
        }
        Ok(())
    }
}

/// Train a binary boosted-tree classifier with logistic loss.
///
/// Each round fits one regression tree, grown best-first, to the residuals
/// `y - p`; leaves output a Newton step `Σg / Σh`. Deterministic for a fixed
/// dataset and options.
pub fn train_fast_tree(
    dataset: &TrainDataset,
    options: &FastTreeOptions,
) -> Result<FastTreeModel, TrainError> {
    options.validate()?;
    dataset.validate()?;

    let n = dataset.rows.len();
    let targets: Vec<f64> = dataset
        .labels
        .iter()
        .map(|&y| if y { 1.0 } else { 0.0 })
        .collect();
    let prior = targets.iter().sum::<f64>() / n as f64;
    let init_score = (prior / (1.0 - prior)).ln() as f32;

    let binned = BinnedColumns::build(dataset, options.max_bins);
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut raw = vec![init_score; n];
    let mut trees = Vec::with_capacity(options.num_trees);

    for tree_idx in 0..options.num_trees {
        let mut gradients = Vec::with_capacity(n);
        let mut hessians = Vec::with_capacity(n);
        for (i, &score) in raw.iter().enumerate() {
            let p = sigmoid(score) as f64;
            gradients.push(targets[i] - p);
            hessians.push(p * (1.0 - p));
        }

        let features = sample_features(dataset.feature_count, options.feature_fraction, &mut rng);
        let grower = TreeGrower {
            dataset,
            binned: &binned,
            features: &features,
            gradients: &gradients,
            hessians: &hessians,
            min_docs_per_leaf: options.min_docs_per_leaf,
        };
        let (tree, row_outputs) = grower.grow(options.num_leaves);
        for (score, output) in raw.iter_mut().zip(row_outputs) {
            *score += options.learning_rate * output;
        }
        tracing::debug!(
            "Tree {tree_idx}: {} leaves, training log-loss {:.4}",
            tree.leaf_count(),
            mean_log_loss(&raw, &dataset.labels)
        );
        trees.push(tree);
    }

    Ok(FastTreeModel {
        model_version: 1,
        feature_count: dataset.feature_count,
        learning_rate: options.learning_rate,
        init_score,
        trees,
    })
}

fn sample_features(feature_count: usize, fraction: f32, rng: &mut StdRng) -> Vec<u32> {
    let mut features: Vec<u32> = (0..feature_count as u32).collect();
    if fraction < 1.0 {
        let keep = ((feature_count as f32 * fraction).ceil() as usize).clamp(1, feature_count);
        features.shuffle(rng);
        features.truncate(keep);
        features.sort_unstable();
    }
    features
}

fn mean_log_loss(raw: &[f32], labels: &[bool]) -> f64 {
    let probabilities: Vec<f32> = raw.iter().map(|&score| sigmoid(score)).collect();
    log_loss(&probabilities, labels)
}

/// Column-major binned view of the stored (non-zero) feature values.
struct BinnedColumns {
    /// Per feature: `(row, bin)` for every stored value.
    columns: Vec<Vec<(u32, u8)>>,
    /// Bin that implicit zeros fall into, per feature.
    zero_bins: Vec<u8>,
    mins: Vec<f32>,
    maxs: Vec<f32>,
    bins: usize,
}

impl BinnedColumns {
    fn build(dataset: &TrainDataset, max_bins: usize) -> Self {
        let d = dataset.feature_count;
        let n = dataset.rows.len();
        let bins = max_bins.clamp(2, 256);

        let mut mins = vec![f32::INFINITY; d];
        let mut maxs = vec![f32::NEG_INFINITY; d];
        let mut stored = vec![0usize; d];
        for row in &dataset.rows {
            for (j, v) in row.iter() {
                let j = j as usize;
                if v.is_finite() {
                    mins[j] = mins[j].min(v);
                    maxs[j] = maxs[j].max(v);
                }
                stored[j] += 1;
            }
        }
        for j in 0..d {
            if stored[j] < n {
                mins[j] = mins[j].min(0.0);
                maxs[j] = maxs[j].max(0.0);
            }
            if !mins[j].is_finite() || !maxs[j].is_finite() {
                mins[j] = 0.0;
                maxs[j] = 0.0;
            }
            if mins[j] == maxs[j] {
                maxs[j] = mins[j] + 1.0;
            }
        }

        let mut columns: Vec<Vec<(u32, u8)>> = stored.iter().map(|&c| Vec::with_capacity(c)).collect();
        for (i, row) in dataset.rows.iter().enumerate() {
            for (j, v) in row.iter() {
                let j = j as usize;
                columns[j].push((i as u32, bin_value(v, mins[j], maxs[j], bins)));
            }
        }
        let zero_bins = (0..d)
            .map(|j| bin_value(0.0, mins[j], maxs[j], bins))
            .collect();

        Self {
            columns,
            zero_bins,
            mins,
            maxs,
            bins,
        }
    }

    /// Upper edge of `bin` in feature units; rows at or below it go left.
    fn threshold(&self, feature: usize, bin: usize) -> f32 {
        let t = (bin as f32 + 0.5) / (self.bins as f32 - 1.0);
        self.mins[feature] + t * (self.maxs[feature] - self.mins[feature])
    }
}

fn bin_value(v: f32, min: f32, max: f32, bins: usize) -> u8 {
    let t = if max > min && v.is_finite() {
        ((v - min) / (max - min)).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (t * (bins as f32 - 1.0)).round() as u8
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    gain: f64,
    feature: usize,
    bin: usize,
}

struct LeafState {
    node: usize,
    rows: Vec<u32>,
    sum_grad: f64,
    sum_hess: f64,
    best: Option<SplitCandidate>,
}

struct TreeGrower<'a> {
    dataset: &'a TrainDataset,
    binned: &'a BinnedColumns,
    features: &'a [u32],
    gradients: &'a [f64],
    hessians: &'a [f64],
    min_docs_per_leaf: usize,
}

impl TreeGrower<'_> {
    /// Grow one tree best-first; returns it with each training row's leaf output.
    fn grow(&self, num_leaves: usize) -> (RegressionTree, Vec<f32>) {
        let n = self.dataset.rows.len();
        let mut nodes = vec![TreeNode::Leaf { value: 0.0 }];
        let mut leaf_of = vec![0u32; n];
        let mut leaves = vec![self.make_leaf(0, (0..n as u32).collect())];
        leaves[0].best = self.find_best_split(&leaves[0], 0, &leaf_of);

        while leaves.len() < num_leaves {
            let Some(slot) = pick_leaf_to_split(&leaves) else {
                break;
            };
            let Some(split) = leaves[slot].best else {
                break;
            };
            let threshold = self.binned.threshold(split.feature, split.bin);
            let (left_rows, right_rows): (Vec<u32>, Vec<u32>) = leaves[slot]
                .rows
                .iter()
                .partition(|&&r| {
                    self.dataset.rows[r as usize].get(split.feature as u32) <= threshold
                });
            if left_rows.len() < self.min_docs_per_leaf || right_rows.len() < self.min_docs_per_leaf
            {
                leaves[slot].best = None;
                continue;
            }

            let left_node = nodes.len();
            let right_node = left_node + 1;
            nodes[leaves[slot].node] = TreeNode::Split {
                feature: split.feature as u32,
                threshold,
                left: left_node as u32,
                right: right_node as u32,
            };
            nodes.push(TreeNode::Leaf { value: 0.0 });
            nodes.push(TreeNode::Leaf { value: 0.0 });

            let right_slot = leaves.len();
            for &r in &right_rows {
                leaf_of[r as usize] = right_slot as u32;
            }
            leaves[slot] = self.make_leaf(left_node, left_rows);
            leaves.push(self.make_leaf(right_node, right_rows));
            leaves[slot].best = self.find_best_split(&leaves[slot], slot, &leaf_of);
            leaves[right_slot].best = self.find_best_split(&leaves[right_slot], right_slot, &leaf_of);
        }

        let mut row_outputs = vec![0.0f32; n];
        for leaf in &leaves {
            let value = (leaf.sum_grad / leaf.sum_hess.max(HESSIAN_FLOOR))
                .clamp(-MAX_LEAF_OUTPUT, MAX_LEAF_OUTPUT) as f32;
            nodes[leaf.node] = TreeNode::Leaf { value };
            for &r in &leaf.rows {
                row_outputs[r as usize] = value;
            }
        }
        (RegressionTree { nodes }, row_outputs)
    }

    fn make_leaf(&self, node: usize, rows: Vec<u32>) -> LeafState {
        let sum_grad = rows.iter().map(|&r| self.gradients[r as usize]).sum();
        let sum_hess = rows.iter().map(|&r| self.hessians[r as usize]).sum();
        LeafState {
            node,
            rows,
            sum_grad,
            sum_hess,
            best: None,
        }
    }

    /// Best variance-reducing split of a leaf over the sampled features.
    ///
    /// Implicit zeros are accounted for as the leaf totals minus the stored
    /// entries, so each feature costs only its stored values.
    fn find_best_split(
        &self,
        leaf: &LeafState,
        slot: usize,
        leaf_of: &[u32],
    ) -> Option<SplitCandidate> {
        let total_count = leaf.rows.len();
        if total_count < 2 * self.min_docs_per_leaf {
            return None;
        }
        let total_grad = leaf.sum_grad;
        let parent_score = total_grad * total_grad / total_count as f64;

        let mut counts = vec![0usize; self.binned.bins];
        let mut grads = vec![0f64; self.binned.bins];
        let mut touched: Vec<usize> = Vec::new();
        let mut best: Option<SplitCandidate> = None;

        for &feature in self.features {
            let j = feature as usize;
            let mut stored_count = 0usize;
            let mut stored_grad = 0f64;
            for &(row, bin) in &self.binned.columns[j] {
                if leaf_of[row as usize] as usize != slot {
                    continue;
                }
                let b = bin as usize;
                if counts[b] == 0 {
                    touched.push(b);
                }
                counts[b] += 1;
                grads[b] += self.gradients[row as usize];
                stored_count += 1;
                stored_grad += self.gradients[row as usize];
            }
            if stored_count == 0 {
                continue;
            }
            let zero_count = total_count - stored_count;
            if zero_count > 0 {
                let b = self.binned.zero_bins[j] as usize;
                if counts[b] == 0 {
                    touched.push(b);
                }
                counts[b] += zero_count;
                grads[b] += total_grad - stored_grad;
            }

            touched.sort_unstable();
            let mut left_count = 0usize;
            let mut left_grad = 0f64;
            for &b in &touched[..touched.len() - 1] {
                left_count += counts[b];
                left_grad += grads[b];
                let right_count = total_count - left_count;
                if left_count < self.min_docs_per_leaf || right_count < self.min_docs_per_leaf {
                    continue;
                }
                let right_grad = total_grad - left_grad;
                let gain = left_grad * left_grad / left_count as f64
                    + right_grad * right_grad / right_count as f64
                    - parent_score;
                if gain > MIN_SPLIT_GAIN && best.is_none_or(|current| gain > current.gain) {
                    best = Some(SplitCandidate {
                        gain,
                        feature: j,
                        bin: b,
                    });
                }
            }

            for b in touched.drain(..) {
                counts[b] = 0;
                grads[b] = 0.0;
            }
        }
        best
    }
}

fn pick_leaf_to_split(leaves: &[LeafState]) -> Option<usize> {
    let mut chosen: Option<(usize, f64)> = None;
    for (slot, leaf) in leaves.iter().enumerate() {
        if let Some(split) = leaf.best
            && chosen.is_none_or(|(_, gain)| split.gain > gain)
        {
            chosen = Some((slot, split.gain));
        }
    }
    chosen.map(|(slot, _)| slot)
}
