//! # Data Module
//!
//! ## Role
//! In-memory representations of the phasing engine's inputs and outputs.
//!
//! ## Design Philosophy: Data-Oriented Design
//! - **Marker-major layouts:** the target matrix stores one contiguous row of
//!   sample dosages per marker for cache-friendly window scans.
//! - **Bit-packed haplotypes:** the reference panel stores one bit vector per
//!   haplotype so window-equality tests and class bitsets stay word-parallel.
//! - **Zero-cost newtypes:** `MarkerIdx`, `HapIdx`, `SampleIdx` prevent index
//!   bugs at compile time with no runtime overhead.
//!
//! ## Sub-modules
//! - `marker`: marker indices and dosage encoding
//! - `haplotype`: index types for samples and haplotypes
//! - `matrix`: target genotype matrix and reference haplotype panel
//! - `mosaic`: per-strand haplotype mosaics produced by stitching

pub mod haplotype;
pub mod marker;
pub mod matrix;
pub mod mosaic;

pub use haplotype::{HapIdx, SampleIdx, Samples};
pub use marker::{MarkerIdx, MISSING};
pub use matrix::{GenotypeMatrix, HaplotypePanel};
pub use mosaic::{HaplotypeMosaic, HaplotypeMosaicPair, MosaicSegment};
