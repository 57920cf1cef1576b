//! # Missing-Value Refinement
//!
//! Per (target, window): initialize missing genotypes from the per-marker
//! mean dosage, then alternate pair search, observed-entry rescoring, and
//! re-imputation from the current pair until the objective stabilizes or the
//! iteration bound is reached.
//!
//! Non-convergence is not an error; it is reported through the returned
//! metrics and bounded by `max_iters`.

use crate::config::TiePolicy;
use crate::data::matrix::GenotypeMatrix;
use crate::data::marker::MISSING;
use crate::model::objective::fill_target_products;
use crate::model::pair_search::{rescore_observed, search_pairs};
use crate::model::windows::Window;
use crate::utils::workspace::Workspace;

/// Outcome of the refinement loop for one (target, window)
#[derive(Clone, Debug)]
pub struct Refinement {
    /// The persisted pair of class slots, `i <= j`
    pub pair: (u32, u32),

    /// All tying pairs of class slots after the observed-entry rescore, in
    /// emission order; the persisted pair is among them
    pub tied: Vec<(u32, u32)>,

    /// Exact squared error over observed entries for the tying set
    pub observed_error: f32,

    /// Iterations actually run
    pub iterations: usize,

    /// Whether the objective met the tolerance before `max_iters`
    pub converged: bool,

    /// Final objective (pair score minus imputation discrepancy)
    pub objective: f64,
}

/// Compute the mean observed dosage of each window row across all targets.
/// Rows with no observed entry get 0.0.
pub fn fill_row_means(x: &GenotypeMatrix, window: Window, row_means: &mut [f32]) {
    for (slot, m) in window.core().enumerate() {
        let mut sum = 0.0f32;
        let mut count = 0u32;
        for &g in x.row(m) {
            if g != MISSING {
                sum += g as f32;
                count += 1;
            }
        }
        row_means[slot] = if count > 0 { sum / count as f32 } else { 0.0 };
    }
}

/// Run the refinement loop for one sample over one window.
///
/// Requires `ws.hw`, `ws.m`, and `ws.row_means` to be filled for this
/// window; uses the remaining workspace buffers as scratch.
#[allow(clippy::too_many_arguments)]
pub fn refine_sample(
    x: &GenotypeMatrix,
    sample: usize,
    window: Window,
    n_classes: usize,
    policy: TiePolicy,
    max_iters: usize,
    tolfun: f64,
    ws: &mut Workspace,
) -> Refinement {
    let rows = window.core();
    let w_len = rows.len();

    // Split borrows: the panel-side buffers are read-only below.
    let Workspace {
        hw,
        m,
        n_k,
        xfloat,
        x_orig,
        missing,
        trail,
        kept,
        row_means,
        ..
    } = ws;
    let hw = &hw[..w_len * n_classes];
    let m = &m[..n_classes * n_classes];
    let n_k = &mut n_k[..n_classes];
    let xfloat = &mut xfloat[..w_len];
    let x_orig = &mut x_orig[..w_len];

    x.fill_sample_column(sample, rows.clone(), x_orig);
    missing.clear();
    for (slot, m_idx) in rows.clone().enumerate() {
        if x.is_missing(m_idx, sample) {
            missing.push(slot as u32);
            xfloat[slot] = row_means[slot];
        } else {
            xfloat[slot] = x_orig[slot];
        }
    }

    let mut obj_prev = f64::INFINITY;
    let mut iterations = 0;
    let mut converged = false;
    let mut objective = 0.0f64;
    let mut selected = (0u32, 0u32);
    let mut observed_error = 0.0f32;

    for _ in 0..max_iters {
        iterations += 1;

        fill_target_products(xfloat, hw, w_len, n_classes, n_k);
        search_pairs(m, n_k, n_classes, policy, trail);
        observed_error = rescore_observed(x_orig, hw, w_len, trail, kept);

        // Among tying candidates, persist the imputation whose values move
        // least from the current ones at the missing slots.
        let mut best_disc = f64::INFINITY;
        let mut best_idx = kept[0] as usize;
        for &k in kept.iter() {
            let cand = trail[k as usize];
            let (ci, cj) = (cand.i as usize, cand.j as usize);
            let mut disc = 0.0f64;
            for &p in missing.iter() {
                let p = p as usize;
                let pred = hw[ci * w_len + p] + hw[cj * w_len + p];
                let d = (xfloat[p] - pred) as f64;
                disc += d * d;
            }
            if disc < best_disc {
                best_disc = disc;
                best_idx = k as usize;
            }
        }

        let chosen = trail[best_idx];
        selected = (chosen.i, chosen.j);
        let (ci, cj) = (chosen.i as usize, chosen.j as usize);
        for &p in missing.iter() {
            let p = p as usize;
            xfloat[p] = hw[ci * w_len + p] + hw[cj * w_len + p];
        }

        objective = chosen.score as f64 - best_disc;

        if missing.is_empty() {
            converged = true;
            break;
        }
        if (objective - obj_prev).abs() < tolfun * (obj_prev.abs() + 1.0) {
            converged = true;
            break;
        }
        obj_prev = objective;
    }

    let tied: Vec<(u32, u32)> = kept
        .iter()
        .map(|&k| {
            let c = trail[k as usize];
            (c.i, c.j)
        })
        .collect();

    Refinement {
        pair: selected,
        tied,
        observed_error,
        iterations,
        converged,
        objective,
    }
}
