//! # Imputer
//!
//! Walks a finalized mosaic pair and fills the target's alleles from the two
//! selected reference columns at every marker. Missing entries always
//! receive the sum of the strand contributions; observed entries are kept or
//! replaced according to the configured mode.
//!
//! Also computes the per-marker quality signal: at typed markers the mean
//! squared residual between observed dosage and the selected haplotype sum,
//! and at untyped markers the average of the two nearest typed scores.

use crate::config::ImputeMode;
use crate::data::marker::MISSING;
use crate::data::matrix::{GenotypeMatrix, HaplotypePanel};
use crate::data::mosaic::{HaplotypeMosaic, HaplotypeMosaicPair};

/// Materialize one strand's allele sequence by walking its segments
pub fn strand_alleles(panel: &HaplotypePanel, mosaic: &HaplotypeMosaic, n_markers: usize) -> Vec<u8> {
    let mut alleles = Vec::with_capacity(n_markers);
    let segments = mosaic.segments();

    for (idx, seg) in segments.iter().enumerate() {
        let start = (seg.start - 1) as usize;
        let end = segments
            .get(idx + 1)
            .map(|next| (next.start - 1) as usize)
            .unwrap_or(n_markers);
        for p in start..end {
            alleles.push(panel.allele(p, seg.hap.as_usize()));
        }
    }

    debug_assert_eq!(alleles.len(), n_markers);
    alleles
}

/// Fill one sample's genotypes from its mosaic.
///
/// Returns the imputed dosage column plus the two strand allele sequences.
pub fn impute_sample(
    x: &GenotypeMatrix,
    sample: usize,
    panel: &HaplotypePanel,
    mosaic: &HaplotypeMosaicPair,
    mode: ImputeMode,
) -> (Vec<u8>, Vec<u8>, Vec<u8>) {
    let n_markers = x.n_markers();
    let a1 = strand_alleles(panel, &mosaic.strand1, n_markers);
    let a2 = strand_alleles(panel, &mosaic.strand2, n_markers);

    let mut dosages = Vec::with_capacity(n_markers);
    for p in 0..n_markers {
        let observed = x.get(p, sample);
        let predicted = a1[p] + a2[p];
        let filled = match mode {
            ImputeMode::Overwrite => predicted,
            ImputeMode::Preserve => {
                if observed == MISSING {
                    predicted
                } else {
                    observed
                }
            }
        };
        dosages.push(filled);
    }

    (dosages, a1, a2)
}

/// Mean squared residual per marker between observed dosages and the
/// selected haplotype sums.
///
/// Markers with no observed entry inherit the average of their nearest typed
/// neighbors (one-sided at the edges, 0.0 when nothing is typed).
pub fn quality_scores(
    x: &GenotypeMatrix,
    panel: &HaplotypePanel,
    mosaics: &[HaplotypeMosaicPair],
) -> Vec<f32> {
    let n_markers = x.n_markers();
    let n_samples = x.n_samples();
    debug_assert_eq!(mosaics.len(), n_samples);

    let mut scores = vec![f32::NAN; n_markers];
    for p in 0..n_markers {
        let mut sum = 0.0f32;
        let mut count = 0u32;
        for (k, mosaic) in mosaics.iter().enumerate() {
            let g = x.get(p, k);
            if g == MISSING {
                continue;
            }
            let (h1, h2) = mosaic.haps_at(p);
            let predicted = panel.allele(p, h1.as_usize()) + panel.allele(p, h2.as_usize());
            let d = g as f32 - predicted as f32;
            sum += d * d;
            count += 1;
        }
        if count > 0 {
            scores[p] = sum / count as f32;
        }
    }

    interpolate_untyped(&mut scores);
    scores
}

/// Replace NaN slots with the average of the nearest typed scores on either
/// side.
fn interpolate_untyped(scores: &mut [f32]) {
    let n = scores.len();

    // Nearest typed score at or before each marker
    let mut prev = vec![None; n];
    let mut last = None;
    for p in 0..n {
        if !scores[p].is_nan() {
            last = Some(scores[p]);
        }
        prev[p] = last;
    }

    // Nearest typed score at or after each marker
    let mut next = vec![None; n];
    let mut ahead = None;
    for p in (0..n).rev() {
        if !scores[p].is_nan() {
            ahead = Some(scores[p]);
        }
        next[p] = ahead;
    }

    for p in 0..n {
        if scores[p].is_nan() {
            scores[p] = match (prev[p], next[p]) {
                (Some(a), Some(b)) => 0.5 * (a + b),
                (Some(a), None) => a,
                (None, Some(b)) => b,
                (None, None) => 0.0,
            };
        }
    }
}
