//! # Provider and Sink Interfaces
//!
//! ## Role
//! The engine's boundary with its collaborators. Variant-file parsing and
//! writing live outside this crate; the pipeline consumes anything that can
//! deliver aligned target and reference matrices and emits per-sample
//! results to a sink.
//!
//! In-memory implementations of each trait back the test suites and small
//! embeddings.

use std::sync::Arc;

use crate::data::haplotype::{SampleIdx, Samples};
use crate::data::matrix::{GenotypeMatrix, HaplotypePanel};
use crate::data::mosaic::HaplotypeMosaicPair;
use crate::error::Result;

/// Delivers the unphased target matrix and its sample identifiers.
///
/// Implementations must present markers in the same row order as the
/// reference provider; alignment by position is enforced upstream.
pub trait GenotypeSource {
    /// The target matrix, markers x samples
    fn genotypes(&self) -> Result<GenotypeMatrix>;

    /// Sample identifiers in stable order
    fn samples(&self) -> Arc<Samples>;
}

/// Delivers the phased reference haplotype panel.
pub trait HaplotypeSource {
    /// The reference panel, markers x haplotypes
    fn haplotypes(&self) -> Result<HaplotypePanel>;
}

/// Receives phased output, one sample at a time, in sample order.
pub trait PhasedSink {
    /// Deliver one sample's mosaic pair and its per-strand allele sequences
    fn write_sample(
        &mut self,
        sample: SampleIdx,
        mosaic: &HaplotypeMosaicPair,
        strand1_alleles: &[u8],
        strand2_alleles: &[u8],
    ) -> Result<()>;

    /// Called once after the last sample
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Genotype source backed by an already-loaded matrix
pub struct InMemoryGenotypes {
    matrix: GenotypeMatrix,
}

impl InMemoryGenotypes {
    pub fn new(matrix: GenotypeMatrix) -> Self {
        Self { matrix }
    }
}

impl GenotypeSource for InMemoryGenotypes {
    fn genotypes(&self) -> Result<GenotypeMatrix> {
        Ok(self.matrix.clone())
    }

    fn samples(&self) -> Arc<Samples> {
        self.matrix.samples_arc()
    }
}

/// Haplotype source backed by an already-loaded panel
pub struct InMemoryPanel {
    panel: HaplotypePanel,
}

impl InMemoryPanel {
    pub fn new(panel: HaplotypePanel) -> Self {
        Self { panel }
    }
}

impl HaplotypeSource for InMemoryPanel {
    fn haplotypes(&self) -> Result<HaplotypePanel> {
        Ok(self.panel.clone())
    }
}

/// Sink collecting phased output in memory
#[derive(Default)]
pub struct VecSink {
    /// (sample, mosaic, strand-1 alleles, strand-2 alleles) per sample
    pub records: Vec<(SampleIdx, HaplotypeMosaicPair, Vec<u8>, Vec<u8>)>,
    pub finished: bool,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PhasedSink for VecSink {
    fn write_sample(
        &mut self,
        sample: SampleIdx,
        mosaic: &HaplotypeMosaicPair,
        strand1_alleles: &[u8],
        strand2_alleles: &[u8],
    ) -> Result<()> {
        self.records.push((
            sample,
            mosaic.clone(),
            strand1_alleles.to_vec(),
            strand2_alleles.to_vec(),
        ));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}
