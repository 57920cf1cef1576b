//! # Target Matrix and Reference Panel
//!
//! The two core data structures: the unphased target genotype matrix
//! (markers x samples, dosages in {0,1,2,missing}) and the phased reference
//! haplotype panel (markers x haplotypes, alleles in {0,1}).
//!
//! The target matrix is marker-major: one contiguous row of sample dosages
//! per marker. The panel is haplotype-major with one bit vector per
//! haplotype, so window equality tests compare contiguous bit slices.

use std::ops::Range;
use std::sync::Arc;

use bitvec::prelude::*;

use crate::data::haplotype::Samples;
use crate::data::marker::MISSING;
use crate::error::{MosaixError, Result};

/// Unphased target genotypes with optional missing entries.
///
/// Immutable after construction; the refinement loop works on per-window
/// float copies owned by worker scratch space.
#[derive(Clone, Debug)]
pub struct GenotypeMatrix {
    /// Dosage rows, marker-major: `data[m * n_samples + s]`
    data: Vec<u8>,

    /// Number of markers (rows)
    n_markers: usize,

    /// Sample metadata
    samples: Arc<Samples>,
}

impl GenotypeMatrix {
    /// Create a matrix from a marker-major dosage buffer.
    ///
    /// Every entry must be 0, 1, 2, or the missing sentinel.
    pub fn new(n_markers: usize, samples: Arc<Samples>, data: Vec<u8>) -> Result<Self> {
        let n_samples = samples.len();
        if data.len() != n_markers * n_samples {
            return Err(MosaixError::invalid_data(format!(
                "Genotype buffer holds {} entries, expected {} markers x {} samples",
                data.len(),
                n_markers,
                n_samples
            )));
        }
        if let Some(&bad) = data.iter().find(|&&g| g > 2 && g != MISSING) {
            return Err(MosaixError::invalid_data(format!(
                "Genotype dosage {} is not in {{0, 1, 2, missing}}",
                bad
            )));
        }
        Ok(Self {
            data,
            n_markers,
            samples,
        })
    }

    /// Create a matrix from per-marker rows (test and provider convenience)
    pub fn from_rows(rows: &[Vec<u8>], samples: Arc<Samples>) -> Result<Self> {
        let n_samples = samples.len();
        let mut data = Vec::with_capacity(rows.len() * n_samples);
        for row in rows {
            if row.len() != n_samples {
                return Err(MosaixError::invalid_data(format!(
                    "Genotype row holds {} entries, expected {}",
                    row.len(),
                    n_samples
                )));
            }
            data.extend_from_slice(row);
        }
        Self::new(rows.len(), samples, data)
    }

    /// Number of markers
    pub fn n_markers(&self) -> usize {
        self.n_markers
    }

    /// Number of samples
    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Get dosage at (marker, sample)
    #[inline]
    pub fn get(&self, marker: usize, sample: usize) -> u8 {
        self.data[marker * self.samples.len() + sample]
    }

    /// Whether the entry at (marker, sample) is missing
    #[inline]
    pub fn is_missing(&self, marker: usize, sample: usize) -> bool {
        self.get(marker, sample) == MISSING
    }

    /// All sample dosages at one marker
    #[inline]
    pub fn row(&self, marker: usize) -> &[u8] {
        let n = self.samples.len();
        &self.data[marker * n..(marker + 1) * n]
    }

    /// Copy one sample's dosages over a marker range into `out`
    pub fn fill_sample_column(&self, sample: usize, rows: Range<usize>, out: &mut [f32]) {
        debug_assert_eq!(out.len(), rows.len());
        for (slot, m) in rows.enumerate() {
            let g = self.get(m, sample);
            out[slot] = if g == MISSING { f32::NAN } else { g as f32 };
        }
    }

    /// Get samples reference
    pub fn samples(&self) -> &Samples {
        &self.samples
    }

    /// Get samples Arc
    pub fn samples_arc(&self) -> Arc<Samples> {
        Arc::clone(&self.samples)
    }

    /// Restrict to a range of markers (used by the chunked driver)
    pub fn restrict(&self, start: usize, end: usize) -> Self {
        let n = self.samples.len();
        Self {
            data: self.data[start * n..end * n].to_vec(),
            n_markers: end - start,
            samples: Arc::clone(&self.samples),
        }
    }
}

/// Phased reference haplotypes, one bit vector per haplotype column.
#[derive(Clone, Debug)]
pub struct HaplotypePanel {
    /// Allele bits per haplotype, indexed by marker
    columns: Vec<BitVec<u64, Lsb0>>,

    /// Number of markers (bits per column)
    n_markers: usize,
}

impl HaplotypePanel {
    /// Create a panel from haplotype-major allele columns (entries 0/1)
    pub fn from_columns(cols: &[Vec<u8>]) -> Result<Self> {
        let n_markers = cols.first().map(|c| c.len()).unwrap_or(0);
        let mut columns = Vec::with_capacity(cols.len());
        for col in cols {
            if col.len() != n_markers {
                return Err(MosaixError::invalid_data(
                    "Reference haplotypes differ in marker count",
                ));
            }
            let mut bits = bitvec![u64, Lsb0; 0; n_markers];
            for (m, &allele) in col.iter().enumerate() {
                match allele {
                    0 => {}
                    1 => bits.set(m, true),
                    other => {
                        return Err(MosaixError::invalid_data(format!(
                            "Reference allele {} is not biallelic",
                            other
                        )));
                    }
                }
            }
            columns.push(bits);
        }
        Ok(Self { columns, n_markers })
    }

    /// Create a panel from marker-major rows (test and provider convenience)
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self> {
        let n_haps = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut cols = vec![Vec::with_capacity(rows.len()); n_haps];
        for row in rows {
            if row.len() != n_haps {
                return Err(MosaixError::invalid_data(
                    "Reference rows differ in haplotype count",
                ));
            }
            for (h, &allele) in row.iter().enumerate() {
                cols[h].push(allele);
            }
        }
        Self::from_columns(&cols)
    }

    /// Number of markers
    pub fn n_markers(&self) -> usize {
        self.n_markers
    }

    /// Number of haplotypes
    pub fn n_haplotypes(&self) -> usize {
        self.columns.len()
    }

    /// Get allele at (marker, haplotype)
    #[inline]
    pub fn allele(&self, marker: usize, hap: usize) -> u8 {
        self.columns[hap][marker] as u8
    }

    /// Bit slice of one haplotype over a marker range
    #[inline]
    pub fn window_bits(&self, hap: usize, rows: Range<usize>) -> &BitSlice<u64, Lsb0> {
        &self.columns[hap][rows]
    }

    /// Copy one haplotype's alleles over a marker range into `out` as floats
    pub fn fill_column_f32(&self, hap: usize, rows: Range<usize>, out: &mut [f32]) {
        debug_assert_eq!(out.len(), rows.len());
        let bits = &self.columns[hap];
        for (slot, m) in rows.enumerate() {
            out[slot] = bits[m] as u8 as f32;
        }
    }

    /// Restrict to a range of markers (used by the chunked driver)
    pub fn restrict(&self, start: usize, end: usize) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|c| c[start..end].to_bitvec())
            .collect();
        Self {
            columns,
            n_markers: end - start,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::marker::MISSING;

    fn samples(n: usize) -> Arc<Samples> {
        Arc::new(Samples::from_ids(
            (0..n).map(|i| format!("S{}", i)).collect(),
        ))
    }

    #[test]
    fn test_genotype_access() {
        let x = GenotypeMatrix::from_rows(
            &[vec![0, 1], vec![2, MISSING], vec![1, 0]],
            samples(2),
        )
        .unwrap();

        assert_eq!(x.n_markers(), 3);
        assert_eq!(x.n_samples(), 2);
        assert_eq!(x.get(1, 0), 2);
        assert!(x.is_missing(1, 1));
        assert_eq!(x.row(2), &[1, 0]);
    }

    #[test]
    fn test_genotype_rejects_bad_dosage() {
        assert!(GenotypeMatrix::from_rows(&[vec![3]], samples(1)).is_err());
    }

    #[test]
    fn test_panel_round_trip() {
        let h = HaplotypePanel::from_rows(&[
            vec![0, 1, 0],
            vec![1, 1, 0],
            vec![0, 0, 1],
        ])
        .unwrap();

        assert_eq!(h.n_markers(), 3);
        assert_eq!(h.n_haplotypes(), 3);
        assert_eq!(h.allele(0, 1), 1);
        assert_eq!(h.allele(2, 2), 1);
        assert_eq!(h.allele(2, 0), 0);
    }

    #[test]
    fn test_window_bits_equality() {
        let h = HaplotypePanel::from_rows(&[
            vec![0, 1, 0, 1],
            vec![0, 1, 1, 0],
            vec![0, 1, 0, 0],
        ])
        .unwrap();

        // Haplotypes 0 and 2 agree on the first two markers only
        assert_eq!(h.window_bits(0, 0..2), h.window_bits(2, 0..2));
        assert_ne!(h.window_bits(0, 0..4), h.window_bits(2, 0..4));
    }

    #[test]
    fn test_restrict() {
        let x = GenotypeMatrix::from_rows(
            &[vec![0, 1], vec![2, 0], vec![1, 1], vec![0, 0]],
            samples(2),
        )
        .unwrap();
        let sub = x.restrict(1, 3);
        assert_eq!(sub.n_markers(), 2);
        assert_eq!(sub.row(0), &[2, 0]);

        let h = HaplotypePanel::from_rows(&[vec![0, 1], vec![1, 0], vec![1, 1], vec![0, 1]])
            .unwrap();
        let sub = h.restrict(1, 4);
        assert_eq!(sub.n_markers(), 3);
        assert_eq!(sub.allele(0, 0), 1);
        assert_eq!(sub.allele(2, 1), 1);
    }
}
