//! # Mosaic Stitcher
//!
//! Connects the windowed candidate sets of one individual across the marker
//! axis, choosing one haplotype per strand per window so reuse across
//! adjacent windows is maximized.
//!
//! Two interchangeable strategies:
//! - the fast intersection-chain over per-strand candidate bitsets, and
//! - dynamic programming over explicit candidate-pair lists.
//!
//! Both fix the strand labeling at window 1 (first set bit, or the first
//! candidate pair); the labels are a deterministic convention without
//! maternal/paternal meaning.

use bitvec::prelude::*;

use crate::error::{MosaixError, Result};

/// Chosen haplotype per window for both strands
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StitchedStrands {
    pub haps1: Vec<u32>,
    pub haps2: Vec<u32>,
}

/// Fast intersection-chain stitcher over per-window candidate bitsets.
///
/// Maintains a running intersection per strand. When the intersection with
/// the next window's candidates would become empty, the finished run is
/// overwritten with its surviving set and a new run starts. Each window may
/// first have its strand sets swapped when the crossed overlap with the
/// running sets is strictly larger than the direct one.
pub fn stitch_intersection(
    cands: &mut [(BitVec<u64, Lsb0>, BitVec<u64, Lsb0>)],
) -> Result<StitchedStrands> {
    if cands.is_empty() {
        return Err(MosaixError::algorithm("No windows to stitch"));
    }

    let n = cands.len();
    let mut surv1 = cands[0].0.clone();
    let mut surv2 = cands[0].1.clone();
    let mut run_start1 = 0usize;
    let mut run_start2 = 0usize;

    for w in 1..n {
        // Orientation: swap this window's strand sets if the crossed overlap
        // is strictly larger.
        let direct = and_count(&surv1, &cands[w].0) + and_count(&surv2, &cands[w].1);
        let crossed = and_count(&surv1, &cands[w].1) + and_count(&surv2, &cands[w].0);
        if crossed > direct {
            let pair = &mut cands[w];
            std::mem::swap(&mut pair.0, &mut pair.1);
        }

        let next1 = and_bits(&surv1, &cands[w].0);
        if next1.not_any() {
            for prev in cands[run_start1..w].iter_mut() {
                prev.0 = surv1.clone();
            }
            surv1 = cands[w].0.clone();
            run_start1 = w;
        } else {
            surv1 = next1;
        }

        let next2 = and_bits(&surv2, &cands[w].1);
        if next2.not_any() {
            for prev in cands[run_start2..w].iter_mut() {
                prev.1 = surv2.clone();
            }
            surv2 = cands[w].1.clone();
            run_start2 = w;
        } else {
            surv2 = next2;
        }
    }

    // Flush the final runs.
    for prev in cands[run_start1..n].iter_mut() {
        prev.0 = surv1.clone();
    }
    for prev in cands[run_start2..n].iter_mut() {
        prev.1 = surv2.clone();
    }

    let mut haps1 = Vec::with_capacity(n);
    let mut haps2 = Vec::with_capacity(n);
    for (s1, s2) in cands.iter() {
        let h1 = s1
            .first_one()
            .ok_or_else(|| MosaixError::algorithm("Empty candidate set after stitching"))?;
        let h2 = s2
            .first_one()
            .ok_or_else(|| MosaixError::algorithm("Empty candidate set after stitching"))?;
        haps1.push(h1 as u32);
        haps2.push(h2 as u32);
    }

    Ok(StitchedStrands { haps1, haps2 })
}

/// Strand mismatches between two consecutive ordered pairs, allowing the
/// second pair to be swapped: 0 when the pair carries over, 1 when exactly
/// one strand does, 2 otherwise.
#[inline]
pub fn switch_cost(prev: (u32, u32), next: (u32, u32)) -> u32 {
    let direct = (prev.0 != next.0) as u32 + (prev.1 != next.1) as u32;
    let crossed = (prev.0 != next.1) as u32 + (prev.1 != next.0) as u32;
    direct.min(crossed)
}

/// Dynamic-programming stitcher over per-window candidate-pair lists.
///
/// Finds the sequence of pairs minimizing the weighted sum of switch costs;
/// ties resolve toward the lower candidate index at every step.
pub fn stitch_dp(lists: &[Vec<(u32, u32)>], lambda: f64) -> Result<Vec<(u32, u32)>> {
    if lists.is_empty() {
        return Err(MosaixError::algorithm("No windows to stitch"));
    }
    if let Some(w) = lists.iter().position(|l| l.is_empty()) {
        return Err(MosaixError::algorithm(format!(
            "Window {} has no candidate pairs",
            w
        )));
    }

    let n = lists.len();
    let mut cost: Vec<f64> = vec![0.0; lists[0].len()];
    let mut back: Vec<Vec<u32>> = Vec::with_capacity(n);
    back.push(Vec::new());

    for w in 1..n {
        let prev_list = &lists[w - 1];
        let cur_list = &lists[w];
        let mut next_cost = vec![f64::INFINITY; cur_list.len()];
        let mut next_back = vec![0u32; cur_list.len()];

        for (c, &cur) in cur_list.iter().enumerate() {
            let mut best = f64::INFINITY;
            let mut best_p = 0u32;
            for (p, &prev) in prev_list.iter().enumerate() {
                let candidate = cost[p] + lambda * switch_cost(prev, cur) as f64;
                if candidate < best {
                    best = candidate;
                    best_p = p as u32;
                }
            }
            next_cost[c] = best;
            next_back[c] = best_p;
        }

        cost = next_cost;
        back.push(next_back);
    }

    // Lowest tying index at the last window, then backtrack.
    let mut best_c = 0usize;
    for (c, &v) in cost.iter().enumerate() {
        if v < cost[best_c] {
            best_c = c;
        }
    }

    let mut choice = vec![0usize; n];
    choice[n - 1] = best_c;
    for w in (1..n).rev() {
        choice[w - 1] = back[w][choice[w]] as usize;
    }

    Ok(choice
        .into_iter()
        .enumerate()
        .map(|(w, c)| lists[w][c])
        .collect())
}

fn and_count(a: &BitVec<u64, Lsb0>, b: &BitVec<u64, Lsb0>) -> usize {
    a.iter_ones().filter(|&i| b[i]).count()
}

fn and_bits(a: &BitVec<u64, Lsb0>, b: &BitVec<u64, Lsb0>) -> BitVec<u64, Lsb0> {
    let mut out = bitvec![u64, Lsb0; 0; a.len()];
    for i in a.iter_ones() {
        if b[i] {
            out.set(i, true);
        }
    }
    out
}
