//! # Breakpoint Locator
//!
//! Given the selected pairs of two adjacent windows, finds the exact marker
//! offset at which each strand's switch should occur over the joined rows.
//!
//! A breakpoint `b` over a join of length `L` means the old haplotype covers
//! rows `0..b` and the new one covers `b..L`; `b = 0` switches immediately
//! at the join start and `b = L` suppresses the switch entirely. Offsets are
//! scanned from `L` downward so that among tying offsets the switch lands as
//! late as the observations allow, and a zero-error match short-circuits the
//! scan. Missing target entries contribute no error, and rows where the old
//! and new alleles agree are skipped since they cannot move the objective.

use std::ops::Range;

use crate::data::matrix::HaplotypePanel;

/// Resolution of one window join for a single target
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinDecision {
    /// Both strands carry over (possibly with swapped labels)
    Continue,

    /// Exactly one strand switches haplotype
    Single {
        /// Which strand switches: 0 or 1
        strand: u8,
        /// Haplotype the strand switches to
        new_hap: u32,
        /// Switch offset within the join; `len` suppresses the record
        breakpoint: usize,
    },

    /// Both strands switch independently
    Double {
        new1: u32,
        new2: u32,
        b1: usize,
        b2: usize,
    },
}

/// Decide how the strands of `prev` become the strands of `next` across the
/// join rows, and where.
///
/// `x_join` holds the target's observed dosages over `rows`, NaN at missing
/// entries.
pub fn locate_join(
    x_join: &[f32],
    panel: &HaplotypePanel,
    rows: Range<usize>,
    prev: (u32, u32),
    next: (u32, u32),
) -> JoinDecision {
    debug_assert_eq!(x_join.len(), rows.len());
    let (i, j) = prev;
    let (k, l) = next;

    if (i == k && j == l) || (i == l && j == k) {
        return JoinDecision::Continue;
    }

    // Exactly one strand carries over: fix it and scan the other.
    if i == k {
        let (b, _) = single_scan(x_join, panel, rows, i, j, l);
        return JoinDecision::Single {
            strand: 1,
            new_hap: l,
            breakpoint: b,
        };
    }
    if j == l {
        let (b, _) = single_scan(x_join, panel, rows, j, i, k);
        return JoinDecision::Single {
            strand: 0,
            new_hap: k,
            breakpoint: b,
        };
    }
    if i == l {
        let (b, _) = single_scan(x_join, panel, rows, i, j, k);
        return JoinDecision::Single {
            strand: 1,
            new_hap: k,
            breakpoint: b,
        };
    }
    if j == k {
        let (b, _) = single_scan(x_join, panel, rows, j, i, l);
        return JoinDecision::Single {
            strand: 0,
            new_hap: l,
            breakpoint: b,
        };
    }

    // Double switch: try both orientations, direct preferred on ties.
    let direct = double_scan(x_join, panel, rows.clone(), i, k, j, l);
    let crossed = double_scan(x_join, panel, rows, i, l, j, k);

    if crossed.2 < direct.2 {
        JoinDecision::Double {
            new1: l,
            new2: k,
            b1: crossed.0,
            b2: crossed.1,
        }
    } else {
        JoinDecision::Double {
            new1: k,
            new2: l,
            b1: direct.0,
            b2: direct.1,
        }
    }
}

#[inline]
fn sq_err(x: f32, a: u8, b: u8) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    let d = x as f64 - (a + b) as f64;
    d * d
}

/// Scan a single breakpoint for the switching strand while `fixed` stays.
///
/// Starts from `b = L` (old haplotype throughout, switch suppressed) and
/// walks the offset down, so the largest tying offset wins. Returns the
/// offset and its observed error.
fn single_scan(
    x_join: &[f32],
    panel: &HaplotypePanel,
    rows: Range<usize>,
    fixed: u32,
    old: u32,
    new: u32,
) -> (usize, f64) {
    let start = rows.start;
    let len = rows.len();

    let mut err = 0.0;
    for (s, p) in rows.clone().enumerate() {
        err += sq_err(x_join[s], panel.allele(p, fixed as usize), panel.allele(p, old as usize));
    }

    let mut best = (len, err);
    if best.1 == 0.0 {
        return best;
    }

    for s in (0..len).rev() {
        let p = start + s;
        let a_old = panel.allele(p, old as usize);
        let a_new = panel.allele(p, new as usize);
        if a_old == a_new {
            continue;
        }
        let f = panel.allele(p, fixed as usize);
        err += sq_err(x_join[s], f, a_new) - sq_err(x_join[s], f, a_old);
        if err < best.1 {
            best = (s, err);
            if err == 0.0 {
                break;
            }
        }
    }

    best
}

/// Scan a pair of independent breakpoints for a double switch, nested
/// `(b1 outer, b2 inner)`, both descending. Returns `(b1, b2, err)` with the
/// largest tying offsets.
fn double_scan(
    x_join: &[f32],
    panel: &HaplotypePanel,
    rows: Range<usize>,
    old1: u32,
    new1: u32,
    old2: u32,
    new2: u32,
) -> (usize, usize, f64) {
    let start = rows.start;
    let len = rows.len();
    let mut best = (len, len, f64::INFINITY);

    for b1 in (0..=len).rev() {
        // Strand-1 allele at row s under this b1
        let strand1 = |s: usize| {
            let p = start + s;
            if s < b1 {
                panel.allele(p, old1 as usize)
            } else {
                panel.allele(p, new1 as usize)
            }
        };

        let mut err = 0.0;
        for s in 0..len {
            err += sq_err(x_join[s], strand1(s), panel.allele(start + s, old2 as usize));
        }
        if err < best.2 {
            best = (b1, len, err);
        }

        for s in (0..len).rev() {
            let p = start + s;
            let a_old = panel.allele(p, old2 as usize);
            let a_new = panel.allele(p, new2 as usize);
            if a_old != a_new {
                let f = strand1(s);
                err += sq_err(x_join[s], f, a_new) - sq_err(x_join[s], f, a_old);
                if err < best.2 {
                    best = (b1, s, err);
                }
            }
        }

        if best.2 == 0.0 {
            break;
        }
    }

    best
}
