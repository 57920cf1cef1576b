//! # Mosaix Library
//!
//! Window-based least-squares genotype phasing and imputation.
//!
//! Given a panel of fully-phased reference haplotypes and unphased,
//! partially-missing target genotypes at the same biallelic markers, mosaix
//! reconstructs each target individual's two haplotypes as a mosaic of
//! reference-panel segments and imputes every missing allele from that
//! mosaic.
//!
//! ## Modules
//! - `config`: recognized options and validation
//! - `data`: in-memory representations of targets, panels, and mosaics
//! - `error`: error types and result aliases
//! - `io`: provider and sink interfaces for collaborators
//! - `model`: the windowed pair search, stitcher, and imputer
//! - `pipelines`: high-level workflow orchestration
//! - `utils`: worker scratch space, threading, telemetry

pub mod config;
pub mod data;
pub mod error;
pub mod io;
pub mod model;
pub mod pipelines;
pub mod utils;

// Re-export commonly used types
pub use config::{Config, ImputeMode, TiePolicy};
pub use data::{
    GenotypeMatrix, HapIdx, HaplotypeMosaic, HaplotypeMosaicPair, HaplotypePanel, MarkerIdx,
    SampleIdx, Samples, MISSING,
};
pub use error::{MosaixError, Result};
pub use io::{GenotypeSource, HaplotypeSource, PhasedSink};
pub use pipelines::{PhasingPipeline, PhasingResult, SampleMetrics};
pub use utils::Workspace;
