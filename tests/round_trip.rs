//! End-to-end scenarios: known haplotype mixtures phased and imputed back.

use std::sync::Arc;

use mosaix::config::{Config, TiePolicy};
use mosaix::data::{GenotypeMatrix, HaplotypePanel, Samples, MISSING};
use mosaix::model::refine::{fill_row_means, refine_sample};
use mosaix::model::unique::UniqueHaplotypeMap;
use mosaix::model::windows::WindowPlan;
use mosaix::pipelines::PhasingPipeline;
use mosaix::utils::Workspace;

fn samples(n: usize) -> Arc<Samples> {
    Arc::new(Samples::from_ids((0..n).map(|i| format!("S{}", i)).collect()))
}

/// Four haplotypes over eight markers
fn reference_panel() -> HaplotypePanel {
    HaplotypePanel::from_columns(&[
        vec![0, 0, 0, 0, 1, 1, 1, 1],
        vec![0, 1, 0, 1, 0, 1, 0, 1],
        vec![0, 0, 1, 1, 0, 0, 1, 1],
        vec![1, 1, 1, 1, 0, 0, 0, 0],
    ])
    .unwrap()
}

fn config_w4() -> Config {
    Config {
        width: 4,
        flankwidth: Some(0),
        nthreads: Some(2),
        ..Config::default()
    }
}

/// One-sample target equal to the sum of two panel columns
fn mixture(panel: &HaplotypePanel, h1: usize, h2: usize) -> Vec<Vec<u8>> {
    (0..panel.n_markers())
        .map(|p| vec![panel.allele(p, h1) + panel.allele(p, h2)])
        .collect()
}

#[test]
fn identity_round_trip() {
    let panel = reference_panel();
    let x = GenotypeMatrix::from_rows(&mixture(&panel, 0, 2), samples(1)).unwrap();

    let pipeline = PhasingPipeline::new(config_w4()).unwrap();
    let result = pipeline.run(&x, &panel).unwrap();

    // Constant pair: one segment per strand, starting at marker 1
    let mosaic = &result.mosaics[0];
    assert_eq!(mosaic.strand1.len(), 1);
    assert_eq!(mosaic.strand2.len(), 1);
    assert!(mosaic.strand1.is_well_formed(1));
    assert!(mosaic.strand2.is_well_formed(1));

    let (h1, h2) = mosaic.haps_at(0);
    let mut selected = [h1.0, h2.0];
    selected.sort_unstable();
    assert_eq!(selected, [0, 2]);

    for m in 0..8 {
        assert_eq!(result.genotypes.get(m, 0), x.get(m, 0));
    }
    assert!(result.quality.iter().all(|&q| q == 0.0));
}

#[test]
fn single_missing_entry() {
    let panel = reference_panel();
    let mut rows = mixture(&panel, 0, 2);
    rows[4][0] = MISSING;
    let x = GenotypeMatrix::from_rows(&rows, samples(1)).unwrap();

    let pipeline = PhasingPipeline::new(config_w4()).unwrap();
    let result = pipeline.run(&x, &panel).unwrap();

    let (h1, h2) = result.mosaics[0].haps_at(4);
    let mut selected = [h1.0, h2.0];
    selected.sort_unstable();
    assert_eq!(selected, [0, 2]);

    // The missing slot receives the sum of the selected columns
    let expected = panel.allele(4, 0) + panel.allele(4, 2);
    assert_eq!(result.genotypes.get(4, 0), expected);

    // All observed entries survive under the preserve policy
    for m in (0..8).filter(|&m| m != 4) {
        assert_eq!(result.genotypes.get(m, 0), x.get(m, 0));
    }
}

#[test]
fn single_breakpoint_located() {
    let panel = reference_panel();
    // Strand 1 switches haplotype 0 -> 1 after marker 4; strand 2 stays on 2
    let rows: Vec<Vec<u8>> = (0..8)
        .map(|p| {
            let s1 = if p < 4 { 0 } else { 1 };
            vec![panel.allele(p, s1) + panel.allele(p, 2)]
        })
        .collect();
    let x = GenotypeMatrix::from_rows(&rows, samples(1)).unwrap();

    let pipeline = PhasingPipeline::new(config_w4()).unwrap();
    let result = pipeline.run(&x, &panel).unwrap();

    let mosaic = &result.mosaics[0];
    let segs1 = mosaic.strand1.segments();
    assert_eq!(segs1.len(), 2);
    assert_eq!((segs1[0].start, segs1[0].hap.0), (1, 0));
    assert_eq!((segs1[1].start, segs1[1].hap.0), (5, 1));

    assert_eq!(mosaic.strand2.len(), 1);
    assert_eq!(mosaic.strand2.segments()[0].hap.0, 2);

    for m in 0..8 {
        assert_eq!(result.genotypes.get(m, 0), x.get(m, 0));
    }
}

#[test]
fn double_switch_located() {
    let panel = reference_panel();
    // Strand 1: 0 -> 1 after marker 3; strand 2: 2 -> 3 after marker 6
    let rows: Vec<Vec<u8>> = (0..8)
        .map(|p| {
            let s1 = if p < 3 { 0 } else { 1 };
            let s2 = if p < 6 { 2 } else { 3 };
            vec![panel.allele(p, s1) + panel.allele(p, s2)]
        })
        .collect();
    let x = GenotypeMatrix::from_rows(&rows, samples(1)).unwrap();

    let pipeline = PhasingPipeline::new(config_w4()).unwrap();
    let result = pipeline.run(&x, &panel).unwrap();

    let mosaic = &result.mosaics[0];
    let segs1 = mosaic.strand1.segments();
    let segs2 = mosaic.strand2.segments();
    assert_eq!(segs1.len(), 2);
    assert_eq!(segs2.len(), 2);

    // Direct orientation: the strand-1 run stays on strand 1
    assert_eq!((segs1[0].start, segs1[0].hap.0), (1, 0));
    assert_eq!((segs1[1].start, segs1[1].hap.0), (4, 1));
    assert_eq!((segs2[0].start, segs2[0].hap.0), (1, 2));
    assert_eq!((segs2[1].start, segs2[1].hap.0), (7, 3));

    for m in 0..8 {
        assert_eq!(result.genotypes.get(m, 0), x.get(m, 0));
    }
}

#[test]
fn duplicate_column_is_invariant() {
    let panel = reference_panel();
    let x = GenotypeMatrix::from_rows(&mixture(&panel, 0, 2), samples(1)).unwrap();

    let pipeline = PhasingPipeline::new(config_w4()).unwrap();
    let baseline = pipeline.run(&x, &panel).unwrap();

    // Duplicate haplotype 0 as a new column 4
    let duplicated = HaplotypePanel::from_columns(&[
        vec![0, 0, 0, 0, 1, 1, 1, 1],
        vec![0, 1, 0, 1, 0, 1, 0, 1],
        vec![0, 0, 1, 1, 0, 0, 1, 1],
        vec![1, 1, 1, 1, 0, 0, 0, 0],
        vec![0, 0, 0, 0, 1, 1, 1, 1],
    ])
    .unwrap();
    let result = pipeline.run(&x, &duplicated).unwrap();

    // Imputed genotypes are unchanged and the representative stays the
    // lowest index of the duplicated class
    for m in 0..8 {
        assert_eq!(result.genotypes.get(m, 0), baseline.genotypes.get(m, 0));
    }
    for p in 0..8 {
        let (h1, h2) = result.mosaics[0].haps_at(p);
        let mut selected = [h1.0, h2.0];
        selected.sort_unstable();
        assert_eq!(selected, [0, 2]);
    }
}

#[test]
fn tie_retained_and_broken_by_lower_index() {
    // Three distinct columns, each one observed mismatch from the target
    let panel = HaplotypePanel::from_columns(&[
        vec![1, 1, 0, 0],
        vec![1, 0, 1, 0],
        vec![0, 0, 0, 0],
    ])
    .unwrap();
    let samples1 = samples(1);
    let x = GenotypeMatrix::from_rows(
        &[vec![1], vec![0], vec![0], vec![0]],
        Arc::clone(&samples1),
    )
    .unwrap();

    // The search trail retains the three tying pairs
    let plan = WindowPlan::new(4, 0, 4).unwrap();
    let window = plan.window(0);
    let umap = UniqueHaplotypeMap::build(&panel, window);
    let n = umap.n_classes();

    let mut ws = Workspace::new();
    ws.prepare_window(window.len(), n);
    mosaix::model::objective::fill_window_panel(&panel, &umap, &mut ws.hw, &mut ws.normsq);
    {
        let hw = &ws.hw[..window.len() * n];
        mosaix::model::objective::fill_cross_terms(
            hw,
            window.len(),
            n,
            &ws.normsq[..n],
            &mut ws.m[..n * n],
        );
    }
    fill_row_means(&x, window, &mut ws.row_means);
    let refinement = refine_sample(&x, 0, window, n, TiePolicy::Trail, 1, 1e-3, &mut ws);

    assert_eq!(refinement.tied, vec![(0, 2), (1, 2), (2, 2)]);
    assert_eq!(refinement.pair, (0, 2));

    // The stitcher resolves the tie toward the lower-index pair
    let config = Config {
        width: 4,
        flankwidth: Some(0),
        nthreads: Some(1),
        ..Config::default()
    };
    let pipeline = PhasingPipeline::new(config).unwrap();
    let result = pipeline.run(&x, &panel).unwrap();
    let (h1, h2) = result.mosaics[0].haps_at(0);
    assert_eq!((h1.0, h2.0), (0, 2));
}

#[test]
fn fast_and_dp_stitchers_agree_on_clean_data() {
    let panel = reference_panel();
    let rows: Vec<Vec<u8>> = (0..8)
        .map(|p| {
            let s1 = if p < 4 { 0 } else { 1 };
            vec![panel.allele(p, s1) + panel.allele(p, 2)]
        })
        .collect();
    let x = GenotypeMatrix::from_rows(&rows, samples(1)).unwrap();

    let fast = PhasingPipeline::new(config_w4()).unwrap();
    let dp = PhasingPipeline::new(Config {
        fast_method: false,
        ..config_w4()
    })
    .unwrap();

    let fast_result = fast.run(&x, &panel).unwrap();
    let dp_result = dp.run(&x, &panel).unwrap();

    for m in 0..8 {
        assert_eq!(
            fast_result.genotypes.get(m, 0),
            dp_result.genotypes.get(m, 0)
        );
    }
    assert_eq!(fast_result.mosaics[0], dp_result.mosaics[0]);
}

#[test]
fn deterministic_across_worker_counts() {
    let panel = reference_panel();
    let mut rows = mixture(&panel, 1, 2);
    rows[2][0] = MISSING;
    rows[6][0] = MISSING;
    let x = GenotypeMatrix::from_rows(&rows, samples(1)).unwrap();

    let serial = PhasingPipeline::new(Config {
        nthreads: Some(1),
        ..config_w4()
    })
    .unwrap();
    let parallel = PhasingPipeline::new(Config {
        nthreads: Some(4),
        ..config_w4()
    })
    .unwrap();

    let a = serial.run(&x, &panel).unwrap();
    let b = parallel.run(&x, &panel).unwrap();

    assert_eq!(a.mosaics, b.mosaics);
    for m in 0..8 {
        assert_eq!(a.genotypes.get(m, 0), b.genotypes.get(m, 0));
    }
    assert_eq!(a.quality, b.quality);
}
