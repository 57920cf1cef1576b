//! # Unique-Haplotype Indexer
//!
//! Groups the reference panel's columns into equivalence classes by exact
//! equality on one window's flanked rows. Scoring then runs over class
//! representatives only, and the stitcher expands a representative back to
//! its full class when it needs freedom to extend a neighboring window.

use std::collections::HashMap;

use bitvec::prelude::*;

use crate::data::matrix::HaplotypePanel;
use crate::model::windows::Window;

/// Per-window equivalence classes of reference haplotypes.
///
/// The representative of a class is the smallest haplotype index in it.
#[derive(Clone, Debug)]
pub struct UniqueHaplotypeMap {
    /// The window this map was built for
    pub window: Window,

    /// For each haplotype, the representative of its class
    class_of: Vec<u32>,

    /// Distinct representatives in ascending order
    reps: Vec<u32>,

    /// For each haplotype, the position of its representative in `reps`
    slot_of: Vec<u32>,
}

impl UniqueHaplotypeMap {
    /// Classify panel columns by equality on the window's flanked rows
    pub fn build(panel: &HaplotypePanel, window: Window) -> Self {
        let n_haps = panel.n_haplotypes();
        let rows = window.flanked();

        let mut seen: HashMap<BitVec<u64, Lsb0>, u32> = HashMap::new();
        let mut class_of = Vec::with_capacity(n_haps);
        let mut slot_of = Vec::with_capacity(n_haps);
        let mut reps = Vec::new();

        for h in 0..n_haps {
            let key = panel.window_bits(h, rows.clone()).to_bitvec();
            match seen.get(&key) {
                Some(&rep) => {
                    class_of.push(rep);
                    slot_of.push(slot_of[rep as usize]);
                }
                None => {
                    seen.insert(key, h as u32);
                    class_of.push(h as u32);
                    slot_of.push(reps.len() as u32);
                    reps.push(h as u32);
                }
            }
        }

        Self {
            window,
            class_of,
            reps,
            slot_of,
        }
    }

    /// Number of distinct classes in this window
    pub fn n_classes(&self) -> usize {
        self.reps.len()
    }

    /// Total haplotype count
    pub fn n_haplotypes(&self) -> usize {
        self.class_of.len()
    }

    /// Representative haplotype of `hap`'s class
    #[inline]
    pub fn class_of(&self, hap: usize) -> u32 {
        self.class_of[hap]
    }

    /// Compressed class slot of `hap` (index into the representative list)
    #[inline]
    pub fn slot_of(&self, hap: usize) -> u32 {
        self.slot_of[hap]
    }

    /// Representative haplotype at a class slot
    #[inline]
    pub fn rep(&self, slot: usize) -> u32 {
        self.reps[slot]
    }

    /// All representatives in ascending haplotype order
    pub fn reps(&self) -> &[u32] {
        &self.reps
    }

    /// Haplotype indices belonging to the class of `rep`
    pub fn members(&self, rep: u32) -> impl Iterator<Item = u32> + '_ {
        self.class_of
            .iter()
            .enumerate()
            .filter(move |(_, &c)| c == rep)
            .map(|(h, _)| h as u32)
    }

    /// Mark every member of `rep`'s class in a bitset over all haplotypes
    pub fn fill_class_bits(&self, rep: u32, bits: &mut BitVec<u64, Lsb0>) {
        bits.clear();
        bits.resize(self.class_of.len(), false);
        for (h, &c) in self.class_of.iter().enumerate() {
            if c == rep {
                bits.set(h, true);
            }
        }
    }
}
