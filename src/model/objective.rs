//! # Objective Assembler
//!
//! Builds the dense matrices scoring every ordered haplotype pair against a
//! target within one window.
//!
//! With `H~` the window sub-panel restricted to class representatives:
//!
//! - `M[i,j] = |H~i|^2 + |H~j|^2 + 2 H~i.H~j` for `i < j`, and
//!   `M[j,j] = 4 |H~j|^2` on the diagonal;
//! - `N[k,i] = 2 Xfloat[:,k].H~i` per target `k`.
//!
//! The sum-of-squares error of pair `(i,j)` for target `k` is, up to a
//! constant independent of the pair, `M[i,j] - N[k,i] - N[k,j]`.

use crate::data::matrix::HaplotypePanel;
use crate::model::unique::UniqueHaplotypeMap;

/// Copy the representative columns of one window into a column-major float
/// panel and record each column's squared norm.
///
/// `hw` is laid out as `n_classes` consecutive columns of `w_len` entries.
pub fn fill_window_panel(
    panel: &HaplotypePanel,
    umap: &UniqueHaplotypeMap,
    hw: &mut [f32],
    normsq: &mut [f32],
) {
    let rows = umap.window.core();
    let w_len = rows.len();
    debug_assert!(hw.len() >= w_len * umap.n_classes());

    for slot in 0..umap.n_classes() {
        let hap = umap.rep(slot) as usize;
        let col = &mut hw[slot * w_len..(slot + 1) * w_len];
        panel.fill_column_f32(hap, rows.clone(), col);
        normsq[slot] = col.iter().map(|&a| a * a).sum();
    }
}

/// Fill the upper triangle (diagonal included) of the cross-term matrix `M`.
pub fn fill_cross_terms(hw: &[f32], w_len: usize, n_classes: usize, normsq: &[f32], m: &mut [f32]) {
    for j in 0..n_classes {
        let col_j = &hw[j * w_len..(j + 1) * w_len];
        m[j * n_classes + j] = 4.0 * normsq[j];
        for i in 0..j {
            let col_i = &hw[i * w_len..(i + 1) * w_len];
            let dot: f32 = col_i.iter().zip(col_j).map(|(&a, &b)| a * b).sum();
            m[i * n_classes + j] = normsq[i] + normsq[j] + 2.0 * dot;
        }
    }
}

/// Fill one target's inner-product row `N[k,:]` from its working genotypes.
pub fn fill_target_products(xfloat: &[f32], hw: &[f32], w_len: usize, n_classes: usize, n_k: &mut [f32]) {
    debug_assert_eq!(xfloat.len(), w_len);
    for slot in 0..n_classes {
        let col = &hw[slot * w_len..(slot + 1) * w_len];
        let dot: f32 = xfloat.iter().zip(col).map(|(&x, &h)| x * h).sum();
        n_k[slot] = 2.0 * dot;
    }
}

/// Pair score for class slots `i <= j`
#[inline]
pub fn pair_score(m: &[f32], n_k: &[f32], n_classes: usize, i: usize, j: usize) -> f32 {
    m[i * n_classes + j] - n_k[i] - n_k[j]
}
