//! # Redundancy Expander
//!
//! Expands a selected (representative, representative) pair back into all
//! reference columns of the two equivalence classes, producing the
//! per-(sample, window) candidate structure consumed by the stitcher.
//!
//! The fast stitcher takes one bitset per strand over all haplotype indices;
//! the DP stitcher takes an explicit list of ordered pairs, truncated to a
//! cap by seeded uniform sampling so runs are reproducible.

use bitvec::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::model::unique::UniqueHaplotypeMap;

/// Candidate structure for one (sample, window)
#[derive(Clone, Debug)]
pub enum WindowCandidates {
    /// One bitset per strand over all haplotype indices
    Bitset {
        strand1: BitVec<u64, Lsb0>,
        strand2: BitVec<u64, Lsb0>,
    },

    /// Ordered (left, right) haplotype tuples
    Pairs(Vec<(u32, u32)>),
}

/// Expand the selected pair into per-strand class bitsets.
///
/// With `unique_only` the classes collapse to the representatives
/// themselves.
pub fn expand_fast(
    umap: &UniqueHaplotypeMap,
    rep1: u32,
    rep2: u32,
    unique_only: bool,
) -> WindowCandidates {
    let n_haps = umap.n_haplotypes();
    let mut strand1 = bitvec![u64, Lsb0; 0; n_haps];
    let mut strand2 = bitvec![u64, Lsb0; 0; n_haps];

    if unique_only {
        strand1.set(rep1 as usize, true);
        strand2.set(rep2 as usize, true);
    } else {
        for h in 0..n_haps {
            let class = umap.class_of(h);
            if class == rep1 {
                strand1.set(h, true);
            }
            if class == rep2 {
                strand2.set(h, true);
            }
        }
    }

    WindowCandidates::Bitset { strand1, strand2 }
}

/// Expand every tying representative pair into ordered haplotype tuples,
/// capped at `max_candidates` by uniform sampling without replacement.
///
/// `seed` must be stable per (sample, window) so the truncation is
/// deterministic across runs and worker counts.
pub fn expand_pairs(
    umap: &UniqueHaplotypeMap,
    tied_reps: &[(u32, u32)],
    unique_only: bool,
    max_candidates: usize,
    seed: u64,
) -> Vec<(u32, u32)> {
    let mut pairs = Vec::new();

    if unique_only {
        pairs.extend_from_slice(tied_reps);
    } else {
        for &(rep1, rep2) in tied_reps {
            let left: Vec<u32> = umap.members(rep1).collect();
            let right: Vec<u32> = umap.members(rep2).collect();
            for &l in &left {
                for &r in &right {
                    pairs.push((l, r));
                }
            }
        }
    }

    if pairs.len() > max_candidates {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut picks = rand::seq::index::sample(&mut rng, pairs.len(), max_candidates)
            .into_vec();
        picks.sort_unstable();
        let sampled: Vec<(u32, u32)> = picks.into_iter().map(|i| pairs[i]).collect();
        pairs = sampled;
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::matrix::HaplotypePanel;
    use crate::model::windows::WindowPlan;

    fn umap() -> UniqueHaplotypeMap {
        // Classes on all four markers: {0, 2}, {1, 3}, {4}
        let panel = HaplotypePanel::from_columns(&[
            vec![0, 0, 1, 1],
            vec![0, 1, 0, 1],
            vec![0, 0, 1, 1],
            vec![0, 1, 0, 1],
            vec![1, 1, 1, 1],
        ])
        .unwrap();
        let plan = WindowPlan::new(4, 0, 4).unwrap();
        UniqueHaplotypeMap::build(&panel, plan.window(0))
    }

    #[test]
    fn test_fast_expansion_marks_class_members() {
        let umap = umap();
        let WindowCandidates::Bitset { strand1, strand2 } = expand_fast(&umap, 0, 1, false)
        else {
            panic!("expected bitsets");
        };

        assert_eq!(strand1.iter_ones().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(strand2.iter_ones().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_unique_only_is_singleton() {
        let umap = umap();
        let WindowCandidates::Bitset { strand1, strand2 } = expand_fast(&umap, 0, 4, true)
        else {
            panic!("expected bitsets");
        };

        assert_eq!(strand1.count_ones(), 1);
        assert_eq!(strand2.count_ones(), 1);
        assert!(strand1[0]);
        assert!(strand2[4]);
    }

    #[test]
    fn test_pair_expansion_is_cartesian() {
        let umap = umap();
        let pairs = expand_pairs(&umap, &[(0, 1)], false, 1000, 7);
        assert_eq!(pairs, vec![(0, 1), (0, 3), (2, 1), (2, 3)]);
    }

    #[test]
    fn test_cap_is_deterministic() {
        let umap = umap();
        let a = expand_pairs(&umap, &[(0, 1)], false, 2, 99);
        let b = expand_pairs(&umap, &[(0, 1)], false, 2, 99);
        assert_eq!(a.len(), 2);
        assert_eq!(a, b);

        // Sampled entries preserve emission order
        let full = expand_pairs(&umap, &[(0, 1)], false, 1000, 99);
        let pos: Vec<usize> = a
            .iter()
            .map(|p| full.iter().position(|q| q == p).unwrap())
            .collect();
        assert!(pos.windows(2).all(|w| w[0] < w[1]));
    }
}
