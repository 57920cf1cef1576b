//! # Haplotype Pair Search
//!
//! Scans the upper triangle of the pair objective for one target and retains
//! candidates according to the configured policy. The default best-so-far
//! trail keeps every pair that was optimal at the moment it was scanned, so
//! the final best is the last element and earlier entries provide the tie
//! material consumed by the observed-entry rescorer.
//!
//! Emission order is fixed (`j` outer, `i` inner, `i <= j`); combined with
//! the strict improvement test this gives lower `(j,i)` lexicographic
//! precedence everywhere ties matter.

use crate::config::TiePolicy;
use crate::model::objective::pair_score;

/// One scored candidate pair of class slots (`i <= j`)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PairCandidate {
    pub i: u32,
    pub j: u32,
    pub score: f32,
}

/// Scan all ordered pairs of class slots for one target.
///
/// `out` is cleared and filled according to `policy`; it is never empty when
/// `n_classes >= 1`.
pub fn search_pairs(
    m: &[f32],
    n_k: &[f32],
    n_classes: usize,
    policy: TiePolicy,
    out: &mut Vec<PairCandidate>,
) {
    out.clear();
    let mut best = f32::INFINITY;

    for j in 0..n_classes {
        for i in 0..=j {
            let score = pair_score(m, n_k, n_classes, i, j);
            let cand = PairCandidate {
                i: i as u32,
                j: j as u32,
                score,
            };
            match policy {
                TiePolicy::BestOnly => {
                    if score < best {
                        best = score;
                        out.clear();
                        out.push(cand);
                    }
                }
                TiePolicy::EqualBest => {
                    if score < best {
                        best = score;
                        out.clear();
                        out.push(cand);
                    } else if score == best {
                        out.push(cand);
                    }
                }
                TiePolicy::Trail => {
                    if score <= best {
                        best = score;
                        out.push(cand);
                    }
                }
            }
        }
    }
}

/// Observed-entry rescorer.
///
/// Computes the exact squared error of each candidate over non-missing
/// target positions only (NaN marks missing in `x_orig`) and records into
/// `kept` the candidate indices attaining the minimum. Returns that minimum
/// error, or 0.0 when `candidates` is empty.
pub fn rescore_observed(
    x_orig: &[f32],
    hw: &[f32],
    w_len: usize,
    candidates: &[PairCandidate],
    kept: &mut Vec<u32>,
) -> f32 {
    kept.clear();
    let mut best = f32::INFINITY;

    for (idx, cand) in candidates.iter().enumerate() {
        let err = observed_error(x_orig, hw, w_len, cand.i as usize, cand.j as usize);
        if err < best {
            best = err;
            kept.clear();
            kept.push(idx as u32);
        } else if err == best {
            kept.push(idx as u32);
        }
    }

    if kept.is_empty() {
        0.0
    } else {
        best
    }
}

/// Squared error of pair `(i,j)` against observed entries only
pub fn observed_error(x_orig: &[f32], hw: &[f32], w_len: usize, i: usize, j: usize) -> f32 {
    let col_i = &hw[i * w_len..(i + 1) * w_len];
    let col_j = &hw[j * w_len..(j + 1) * w_len];
    let mut err = 0.0;
    for p in 0..w_len {
        let x = x_orig[p];
        if x.is_nan() {
            continue;
        }
        let d = x - col_i[p] - col_j[p];
        err += d * d;
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two classes; scores in emission order: (0,0) = -6, (0,1) = -4,
    // (1,1) = 0
    fn tied_setup() -> (Vec<f32>, Vec<f32>) {
        let m = vec![2.0, 2.0, 0.0, 4.0];
        let n_k = vec![4.0, 2.0];
        (m, n_k)
    }

    #[test]
    fn test_trail_keeps_non_worsening() {
        let (m, n_k) = tied_setup();
        let mut out = Vec::new();
        search_pairs(&m, &n_k, 2, TiePolicy::Trail, &mut out);

        let scores: Vec<f32> = out.iter().map(|c| c.score).collect();
        assert!(!out.is_empty());
        // Trail scores never increase
        assert!(scores.windows(2).all(|w| w[1] <= w[0]));
        // The final element is the overall best
        let best = scores.last().copied().unwrap();
        assert!(scores.iter().all(|&s| s >= best));
    }

    #[test]
    fn test_equal_best_retains_all_ties() {
        // Scores: (0,0) = 2-8 = -6, (0,1) = 2-6 = -4, (1,1) = 4-4 = 0
        let (m, n_k) = tied_setup();
        let mut out = Vec::new();
        search_pairs(&m, &n_k, 2, TiePolicy::EqualBest, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!((out[0].i, out[0].j), (0, 0));

        // Force an exact tie between (0,0) and (1,1)
        let m = vec![2.0, 2.0, 0.0, 2.0];
        let n_k = vec![2.0, 2.0];
        search_pairs(&m, &n_k, 2, TiePolicy::EqualBest, &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!((out[0].i, out[0].j), (0, 0));
        assert_eq!((out[1].i, out[1].j), (1, 1));
    }

    #[test]
    fn test_best_only_keeps_first_minimum() {
        let m = vec![2.0, 2.0, 0.0, 2.0];
        let n_k = vec![2.0, 2.0];
        let mut out = Vec::new();
        search_pairs(&m, &n_k, 2, TiePolicy::BestOnly, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!((out[0].i, out[0].j), (0, 0));
    }

    #[test]
    fn test_rescore_prunes_by_observed_error() {
        // Window of 2 rows, two classes: col0 = [1,0], col1 = [0,1]
        let hw = vec![1.0, 0.0, 0.0, 1.0];
        // Target observed only at row 0, dosage 2: (0,0) fits exactly
        let x = vec![2.0, f32::NAN];
        let candidates = vec![
            PairCandidate { i: 0, j: 0, score: 0.0 },
            PairCandidate { i: 0, j: 1, score: 0.0 },
            PairCandidate { i: 1, j: 1, score: 0.0 },
        ];
        let mut kept = Vec::new();
        let err = rescore_observed(&x, &hw, 2, &candidates, &mut kept);
        assert_eq!(err, 0.0);
        assert_eq!(kept, vec![0]);
    }

    #[test]
    fn test_rescore_keeps_ties() {
        let hw = vec![1.0, 0.0, 0.0, 1.0];
        // No observations at all: every candidate ties at zero error
        let x = vec![f32::NAN, f32::NAN];
        let candidates = vec![
            PairCandidate { i: 0, j: 0, score: 0.0 },
            PairCandidate { i: 1, j: 1, score: 0.0 },
        ];
        let mut kept = Vec::new();
        let err = rescore_observed(&x, &hw, 2, &candidates, &mut kept);
        assert_eq!(err, 0.0);
        assert_eq!(kept, vec![0, 1]);
    }
}
