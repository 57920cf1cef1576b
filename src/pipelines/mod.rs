//! # Pipelines Module
//!
//! High-level orchestration of the phasing workflow: the parallel windowed
//! pass, cross-window stitching, and final imputation.

pub mod phasing;

pub use phasing::{PhasingPipeline, PhasingResult, SampleMetrics};
