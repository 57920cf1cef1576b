//! # Workspace Pattern for Window Scratch Buffers
//!
//! Pre-allocated buffers for the windowed least-squares search, reused
//! across windows by the same worker. Buffers grow to the largest
//! representative count a worker encounters and never shrink.
//!
//! ## Design Philosophy
//! Instead of storing mutable buffers inside model structs (which causes
//! borrow checker issues), a separate Workspace owns all temporaries and is
//! passed as `&mut` to computation functions.

use crate::model::pair_search::PairCandidate;

/// Scratch space for one worker in the windowed pass
#[derive(Debug, Default)]
pub struct Workspace {
    /// Window sub-panel restricted to representatives, column-major
    /// (n_classes x window length)
    pub hw: Vec<f32>,

    /// Squared norm of each representative column
    pub normsq: Vec<f32>,

    /// Pairwise cross-term matrix, upper triangle of n_classes x n_classes
    pub m: Vec<f32>,

    /// Target-against-representative inner products for the current sample
    pub n_k: Vec<f32>,

    /// Working copy of the current sample's window genotypes; missing slots
    /// hold the running imputation
    pub xfloat: Vec<f32>,

    /// The current sample's window genotypes with NaN at missing slots
    pub x_orig: Vec<f32>,

    /// Window-local indices of the current sample's missing entries
    pub missing: Vec<u32>,

    /// Candidate pairs retained by the search policy
    pub trail: Vec<PairCandidate>,

    /// Indices into `trail` surviving the observed-entry rescore
    pub kept: Vec<u32>,

    /// Mean observed dosage per window row
    pub row_means: Vec<f32>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow buffers for a window of `w_len` rows and `n_classes`
    /// representatives
    pub fn prepare_window(&mut self, w_len: usize, n_classes: usize) {
        grow(&mut self.hw, w_len * n_classes);
        grow(&mut self.normsq, n_classes);
        grow(&mut self.m, n_classes * n_classes);
        grow(&mut self.n_k, n_classes);
        grow(&mut self.xfloat, w_len);
        grow(&mut self.x_orig, w_len);
        grow(&mut self.row_means, w_len);
        self.missing.clear();
        self.trail.clear();
        self.kept.clear();
    }
}

fn grow(buf: &mut Vec<f32>, len: usize) {
    if buf.len() < len {
        buf.resize(len, 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grow_only() {
        let mut ws = Workspace::new();
        ws.prepare_window(400, 128);
        assert!(ws.hw.len() >= 400 * 128);

        let cap = ws.hw.capacity();
        ws.prepare_window(100, 16);
        assert_eq!(ws.hw.capacity(), cap);
    }
}
