//! # Haplotype and Sample Index Types
//!
//! Type-safe indices for samples and haplotypes, plus the sample registry
//! exposed to output sinks.

use std::collections::HashMap;

/// Zero-cost newtype for sample indices
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SampleIdx(pub u32);

/// Zero-cost newtype for reference haplotype indices
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct HapIdx(pub u32);

impl SampleIdx {
    pub fn new(idx: u32) -> Self {
        Self(idx)
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl HapIdx {
    pub fn new(idx: u32) -> Self {
        Self(idx)
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// The reference sample this haplotype belongs to (two haplotypes per
    /// reference individual)
    pub fn to_sample(self) -> SampleIdx {
        SampleIdx(self.0 / 2)
    }
}

/// Registry of target sample identifiers in stable input order
#[derive(Clone, Debug, Default)]
pub struct Samples {
    ids: Vec<String>,
    index: HashMap<String, SampleIdx>,
}

impl Samples {
    /// Build a registry from sample IDs, preserving order
    pub fn from_ids(ids: Vec<String>) -> Self {
        let index = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), SampleIdx(i as u32)))
            .collect();
        Self { ids, index }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Sample ID by index
    pub fn id(&self, idx: SampleIdx) -> &str {
        &self.ids[idx.as_usize()]
    }

    /// All sample IDs in input order
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Look up a sample by ID
    pub fn find(&self, id: &str) -> Option<SampleIdx> {
        self.index.get(id).copied()
    }
}
