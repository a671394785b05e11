use serde::{Deserialize, Serialize};

/// Sparse feature vector with strictly increasing indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    pub indices: Vec<u32>,
    pub values: Vec<f32>,
}

impl SparseVector {
    /// Build from `(index, value)` pairs already sorted by index.
    ///
    /// Zero values are dropped.
    pub fn from_sorted(pairs: impl IntoIterator<Item = (u32, f32)>) -> Self {
        let mut out = Self::default();
        for (idx, value) in pairs {
            if value == 0.0 {
                continue;
            }
            debug_assert!(out.indices.last().is_none_or(|&last| last < idx));
            out.indices.push(idx);
            out.values.push(value);
        }
        out
    }

    /// Value at `idx`, or `0.0` when the entry is implicit.
    pub fn get(&self, idx: u32) -> f32 {
        match self.indices.binary_search(&idx) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Number of explicitly stored entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate stored `(index, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    pub fn l2_norm(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }
}
