//! # Model Module
//!
//! The window-based least-squares phasing machinery.
//!
//! ## Core Algorithms
//! - `windows`: fixed-width partition of the marker axis with flanks
//! - `unique`: per-window haplotype equivalence classes
//! - `objective`: dense cross-term matrices scoring every haplotype pair
//! - `pair_search`: upper-triangle scan with candidate retention policies
//! - `refine`: iterative imputation of missing genotypes during search
//! - `candidates`: redundancy expansion into per-window candidate sets
//! - `stitch`: cross-window mosaic assembly (intersection-chain and DP)
//! - `breakpoint`: exact switch-offset location between adjacent windows
//! - `impute`: final allele fill from the frozen mosaic

pub mod breakpoint;
pub mod candidates;
pub mod impute;
pub mod objective;
pub mod pair_search;
pub mod refine;
pub mod stitch;
pub mod unique;
pub mod windows;
