//! # Configuration Logic
//!
//! Recognized options for the phasing engine and their validation, using
//! clap derive so an embedding CLI can flatten `Config` into its own
//! argument surface.

use clap::{Parser, ValueEnum};

use crate::error::{MosaixError, Result};

/// Strategy for retaining candidate pairs during the window pair search.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TiePolicy {
    /// Keep only the single best pair (first on ties)
    BestOnly,
    /// Keep every pair whose score equals the final best
    EqualBest,
    /// Keep every pair that was best-so-far when it was scanned
    #[default]
    Trail,
}

/// Behavior of the imputer at non-missing target entries.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImputeMode {
    /// Keep observed genotypes, fill only missing slots
    #[default]
    Preserve,
    /// Replace every entry with the mosaic's predicted dosage
    Overwrite,
}

/// Mosaix: window-based least-squares genotype phasing and imputation
#[derive(Parser, Debug, Clone)]
#[command(name = "mosaix")]
#[command(about = "Window-based least-squares genotype phasing and imputation", long_about = None)]
pub struct Config {
    // ============ Window Parameters ============
    /// Window size in markers
    #[arg(long, default_value = "400")]
    pub width: usize,

    /// Flanking markers on each side of a window, used only for the
    /// haplotype equivalence test (default: width / 10)
    #[arg(long)]
    pub flankwidth: Option<usize>,

    // ============ Search Parameters ============
    /// Candidate-pair retention policy for the pair search
    #[arg(long, value_enum, default_value = "trail")]
    pub tie_policy: TiePolicy,

    /// Maximum refinement iterations for missing-genotype imputation
    #[arg(long = "max-iters", default_value = "1")]
    pub max_iters: usize,

    /// Relative objective tolerance terminating refinement early
    #[arg(long, default_value = "1e-3")]
    pub tolfun: f64,

    // ============ Stitching Parameters ============
    /// Use the intersection-chain stitcher instead of dynamic programming
    #[arg(long = "fast-method", default_value = "true")]
    pub fast_method: bool,

    /// Skip redundancy expansion; stitch over class representatives only
    #[arg(long = "unique-only", default_value = "false")]
    pub unique_only: bool,

    /// Upper bound on the per-window candidate list for the DP stitcher
    #[arg(long = "max-candidates", default_value = "1000")]
    pub max_candidates: usize,

    /// Linear weight applied to strand-switch costs in the DP stitcher
    #[arg(long, default_value = "1.0")]
    pub lambda: f64,

    // ============ Output Parameters ============
    /// Whether observed genotypes are preserved or overwritten on output
    #[arg(long = "impute-mode", value_enum, default_value = "preserve")]
    pub impute_mode: ImputeMode,

    // ============ General Parameters ============
    /// Random seed for candidate-list truncation
    #[arg(long, default_value = "987654321")]
    pub seed: u64,

    /// Number of threads (default: all available cores)
    #[arg(long)]
    pub nthreads: Option<usize>,
}

impl Config {
    /// Flanking width in markers, defaulting to a tenth of the window
    pub fn flank(&self) -> usize {
        self.flankwidth.unwrap_or(self.width / 10)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(MosaixError::config("Window width must be positive"));
        }

        if let Some(flank) = self.flankwidth {
            if flank >= self.width {
                return Err(MosaixError::config(
                    "Flanking width must be smaller than the window width",
                ));
            }
        }

        if self.max_candidates == 0 {
            return Err(MosaixError::config(
                "The candidate-list cap must be at least 1",
            ));
        }

        if self.max_iters == 0 {
            return Err(MosaixError::config(
                "At least one refinement iteration is required",
            ));
        }

        if !(self.tolfun > 0.0) {
            return Err(MosaixError::config(
                "The refinement tolerance must be positive",
            ));
        }

        if self.lambda < 0.0 {
            return Err(MosaixError::config(
                "The switch-cost weight cannot be negative",
            ));
        }

        Ok(())
    }

    /// Get the number of threads to use
    pub fn nthreads(&self) -> usize {
        self.nthreads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            width: 400,
            flankwidth: None,
            tie_policy: TiePolicy::Trail,
            max_iters: 1,
            tolfun: 1e-3,
            fast_method: true,
            unique_only: false,
            max_candidates: 1000,
            lambda: 1.0,
            impute_mode: ImputeMode::Preserve,
            seed: 987_654_321,
            nthreads: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_flank_is_tenth_of_width() {
        let config = Config::default();
        assert_eq!(config.flank(), 40);

        let config = Config {
            width: 50,
            ..Config::default()
        };
        assert_eq!(config.flank(), 5);
    }

    #[test]
    fn test_validate_rejects_zero_width() {
        let config = Config {
            width: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_flank() {
        let config = Config {
            width: 10,
            flankwidth: Some(10),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }
}
