//! # Phasing Pipeline
//!
//! Orchestrates the full workflow:
//! 1. Validate the target matrix against the reference panel
//! 2. Windowed pass (parallel over windows): classify haplotypes, assemble
//!    the pair objective, search with missing-value refinement, expand the
//!    selected representatives into candidate sets
//! 3. Stitch + impute (parallel over samples): chain candidates across
//!    windows, locate breakpoints, fill alleles from the frozen mosaic
//! 4. Per-marker quality scores
//!
//! Results are deterministic for a fixed configuration regardless of worker
//! count: windows and samples are independent tasks, and every tie-break is
//! a documented rule rather than a race.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::info_span;

use crate::config::Config;
use crate::data::haplotype::HapIdx;
use crate::data::matrix::{GenotypeMatrix, HaplotypePanel};
use crate::data::mosaic::{HaplotypeMosaic, HaplotypeMosaicPair};
use crate::error::{MosaixError, Result};
use crate::io::{GenotypeSource, HaplotypeSource, PhasedSink};
use crate::model::breakpoint::{locate_join, JoinDecision};
use crate::model::candidates::{expand_fast, expand_pairs, WindowCandidates};
use crate::model::impute::{impute_sample, quality_scores};
use crate::model::objective::{fill_cross_terms, fill_window_panel};
use crate::model::refine::{fill_row_means, refine_sample};
use crate::model::stitch::{stitch_dp, stitch_intersection};
use crate::model::unique::UniqueHaplotypeMap;
use crate::model::windows::{Window, WindowPlan};
use crate::utils::telemetry::{Stage, TelemetryBlackboard};
use crate::utils::threading::build_thread_pool;
use crate::utils::workspace::Workspace;

/// Per-sample refinement summary across all windows
#[derive(Clone, Copy, Debug, Default)]
pub struct SampleMetrics {
    /// Largest iteration count any window needed
    pub iterations: usize,
    /// Whether every window met the refinement tolerance
    pub converged: bool,
    /// Summed final objective across windows
    pub objective: f64,
}

/// Output of a phasing run
#[derive(Clone, Debug)]
pub struct PhasingResult {
    /// One mosaic pair per sample, starts translated by the chunk offset
    pub mosaics: Vec<HaplotypeMosaicPair>,

    /// The imputed target matrix
    pub genotypes: GenotypeMatrix,

    /// Per-sample strand-1 allele sequences
    pub strand1: Vec<Vec<u8>>,

    /// Per-sample strand-2 allele sequences
    pub strand2: Vec<Vec<u8>>,

    /// Per-marker quality scores
    pub quality: Vec<f32>,

    /// Per-sample refinement metrics
    pub metrics: Vec<SampleMetrics>,
}

/// Everything the windowed pass produces for one (window, sample)
struct SampleOutcome {
    candidates: WindowCandidates,
    iterations: usize,
    converged: bool,
    objective: f64,
}

/// The phasing pipeline
pub struct PhasingPipeline {
    config: Config,
    telemetry: Option<Arc<TelemetryBlackboard>>,
}

impl PhasingPipeline {
    /// Create a pipeline, validating the configuration
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            telemetry: None,
        })
    }

    /// Attach a progress blackboard
    pub fn with_telemetry(mut self, telemetry: Arc<TelemetryBlackboard>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Phase and impute the full marker axis
    pub fn run(&self, x: &GenotypeMatrix, panel: &HaplotypePanel) -> Result<PhasingResult> {
        let pool = build_thread_pool(self.config.nthreads())?;
        let result = pool.install(|| self.phase_chunk(x, panel, 0));
        if let Some(telemetry) = &self.telemetry {
            telemetry.set_stage(Stage::Complete);
        }
        result
    }

    /// Load from providers, run, and stream the output to a sink
    pub fn run_sources(
        &self,
        genotypes: &dyn GenotypeSource,
        reference: &dyn HaplotypeSource,
        sink: &mut dyn PhasedSink,
    ) -> Result<PhasingResult> {
        let x = genotypes.genotypes()?;
        let panel = reference.haplotypes()?;
        let result = self.run(&x, &panel)?;

        for (k, mosaic) in result.mosaics.iter().enumerate() {
            sink.write_sample(
                crate::data::SampleIdx::new(k as u32),
                mosaic,
                &result.strand1[k],
                &result.strand2[k],
            )?;
        }
        sink.finish()?;
        Ok(result)
    }

    /// Phase the marker axis in row chunks of at most `max_rows` and
    /// concatenate the results.
    ///
    /// Each chunk is stitched independently, so a switch record may appear
    /// at a chunk boundary that a whole-axis run would have avoided.
    pub fn run_chunked(
        &self,
        x: &GenotypeMatrix,
        panel: &HaplotypePanel,
        max_rows: usize,
    ) -> Result<PhasingResult> {
        if max_rows < self.config.width {
            return Err(MosaixError::config(format!(
                "Chunk bound {} is below the window width {}",
                max_rows, self.config.width
            )));
        }
        if x.n_markers() != panel.n_markers() {
            return Err(MosaixError::invalid_data(format!(
                "Target has {} markers but the reference panel has {}",
                x.n_markers(),
                panel.n_markers()
            )));
        }

        let n_markers = x.n_markers();
        let n_samples = x.n_samples();
        let pool = build_thread_pool(self.config.nthreads())?;

        let mut mosaics = vec![HaplotypeMosaicPair::default(); n_samples];
        let mut strand1 = vec![Vec::new(); n_samples];
        let mut strand2 = vec![Vec::new(); n_samples];
        let mut data = Vec::with_capacity(n_markers * n_samples);
        let mut quality = Vec::with_capacity(n_markers);
        let mut metrics = vec![
            SampleMetrics {
                converged: true,
                ..SampleMetrics::default()
            };
            n_samples
        ];

        let mut start = 0;
        while start < n_markers {
            let mut end = (start + max_rows).min(n_markers);
            // A tail shorter than one window cannot stand alone.
            if n_markers - end < self.config.width {
                end = n_markers;
            }

            let x_chunk = x.restrict(start, end);
            let panel_chunk = panel.restrict(start, end);
            let chunk =
                pool.install(|| self.phase_chunk(&x_chunk, &panel_chunk, start as u32))?;

            for k in 0..n_samples {
                for seg in chunk.mosaics[k].strand1.segments() {
                    mosaics[k].strand1.push(seg.start, seg.hap);
                }
                for seg in chunk.mosaics[k].strand2.segments() {
                    mosaics[k].strand2.push(seg.start, seg.hap);
                }
                strand1[k].extend_from_slice(&chunk.strand1[k]);
                strand2[k].extend_from_slice(&chunk.strand2[k]);
                metrics[k].iterations = metrics[k].iterations.max(chunk.metrics[k].iterations);
                metrics[k].converged &= chunk.metrics[k].converged;
                metrics[k].objective += chunk.metrics[k].objective;
            }
            for m in 0..chunk.genotypes.n_markers() {
                data.extend_from_slice(chunk.genotypes.row(m));
            }
            quality.extend_from_slice(&chunk.quality);

            start = end;
        }

        if let Some(telemetry) = &self.telemetry {
            telemetry.set_stage(Stage::Complete);
        }

        Ok(PhasingResult {
            mosaics,
            genotypes: GenotypeMatrix::new(n_markers, x.samples_arc(), data)?,
            strand1,
            strand2,
            quality,
            metrics,
        })
    }

    /// Phase one chunk of the marker axis; `offset` translates every mosaic
    /// start so that chunk concatenation yields global positions.
    fn phase_chunk(
        &self,
        x: &GenotypeMatrix,
        panel: &HaplotypePanel,
        offset: u32,
    ) -> Result<PhasingResult> {
        if x.n_markers() != panel.n_markers() {
            return Err(MosaixError::invalid_data(format!(
                "Target has {} markers but the reference panel has {}",
                x.n_markers(),
                panel.n_markers()
            )));
        }
        if panel.n_haplotypes() == 0 {
            return Err(MosaixError::invalid_data("Reference panel is empty"));
        }

        let plan = WindowPlan::new(self.config.width, self.config.flank(), x.n_markers())?;
        let n_windows = plan.n_windows();
        let n_samples = x.n_samples();

        if let Some(telemetry) = &self.telemetry {
            telemetry.set_stage(Stage::WindowedSearch);
            telemetry.set_totals(n_windows as u64, n_samples as u64);
        }

        // Windowed pass: one task per window, read-only access to X and H.
        let windows: Vec<Window> = plan.iter().collect();
        let outcomes: Vec<Vec<SampleOutcome>> = {
            let _span = info_span!("windowed_search").entered();
            windows
                .par_iter()
                .map_init(Workspace::new, |ws, &window| {
                    self.process_window(x, panel, window, ws)
                })
                .collect()
        };

        // Transpose to per-sample sequences of window candidates.
        let mut per_sample: Vec<Vec<WindowCandidates>> = (0..n_samples)
            .map(|_| Vec::with_capacity(n_windows))
            .collect();
        let mut metrics = vec![
            SampleMetrics {
                converged: true,
                ..SampleMetrics::default()
            };
            n_samples
        ];
        for window_outcomes in outcomes {
            for (k, outcome) in window_outcomes.into_iter().enumerate() {
                metrics[k].iterations = metrics[k].iterations.max(outcome.iterations);
                metrics[k].converged &= outcome.converged;
                metrics[k].objective += outcome.objective;
                per_sample[k].push(outcome.candidates);
            }
        }

        if let Some(telemetry) = &self.telemetry {
            telemetry.set_stage(Stage::Stitching);
        }

        // Stitch and impute: one task per sample.
        let telemetry = self.telemetry.clone();
        let sample_results: Result<Vec<_>> = {
            let _span = info_span!("stitch_and_impute").entered();
            per_sample
                .into_par_iter()
                .enumerate()
                .map_init(Vec::new, |join_buf, (k, cands)| {
                    let out = self.stitch_sample(x, panel, &plan, k, cands, join_buf);
                    if let Some(board) = &telemetry {
                        board.add_samples(1);
                    }
                    out
                })
                .collect()
        };
        let sample_results = sample_results?;

        if let Some(telemetry) = &self.telemetry {
            telemetry.set_stage(Stage::Imputation);
        }

        // Assemble the imputed matrix and mosaic list.
        let mut mosaics = Vec::with_capacity(n_samples);
        let mut strand1 = Vec::with_capacity(n_samples);
        let mut strand2 = Vec::with_capacity(n_samples);
        let mut columns = Vec::with_capacity(n_samples);
        for (mosaic, dosages, a1, a2) in sample_results {
            mosaics.push(mosaic);
            columns.push(dosages);
            strand1.push(a1);
            strand2.push(a2);
        }

        let quality = quality_scores(x, panel, &mosaics);

        let mut data = Vec::with_capacity(x.n_markers() * n_samples);
        for m in 0..x.n_markers() {
            for column in &columns {
                data.push(column[m]);
            }
        }
        let genotypes = GenotypeMatrix::new(x.n_markers(), x.samples_arc(), data)?;

        for mosaic in &mut mosaics {
            mosaic.offset_by(offset);
        }

        Ok(PhasingResult {
            mosaics,
            genotypes,
            strand1,
            strand2,
            quality,
            metrics,
        })
    }

    /// Components C1-C6 for one window: classify, assemble, search, refine,
    /// and expand candidates for every sample.
    fn process_window(
        &self,
        x: &GenotypeMatrix,
        panel: &HaplotypePanel,
        window: Window,
        ws: &mut Workspace,
    ) -> Vec<SampleOutcome> {
        let umap = UniqueHaplotypeMap::build(panel, window);
        let n_classes = umap.n_classes();
        let w_len = window.len();

        ws.prepare_window(w_len, n_classes);
        fill_window_panel(panel, &umap, &mut ws.hw, &mut ws.normsq);
        {
            let hw = &ws.hw[..w_len * n_classes];
            fill_cross_terms(
                hw,
                w_len,
                n_classes,
                &ws.normsq[..n_classes],
                &mut ws.m[..n_classes * n_classes],
            );
        }
        fill_row_means(x, window, &mut ws.row_means);

        let mut outcomes = Vec::with_capacity(x.n_samples());
        for k in 0..x.n_samples() {
            let refinement = refine_sample(
                x,
                k,
                window,
                n_classes,
                self.config.tie_policy,
                self.config.max_iters,
                self.config.tolfun,
                ws,
            );

            let rep1 = umap.rep(refinement.pair.0 as usize);
            let rep2 = umap.rep(refinement.pair.1 as usize);

            let candidates = if self.config.fast_method {
                expand_fast(&umap, rep1, rep2, self.config.unique_only)
            } else {
                let tied_reps: Vec<(u32, u32)> = refinement
                    .tied
                    .iter()
                    .map(|&(i, j)| (umap.rep(i as usize), umap.rep(j as usize)))
                    .collect();
                WindowCandidates::Pairs(expand_pairs(
                    &umap,
                    &tied_reps,
                    self.config.unique_only,
                    self.config.max_candidates,
                    sample_window_seed(self.config.seed, k, window.index),
                ))
            };

            outcomes.push(SampleOutcome {
                candidates,
                iterations: refinement.iterations,
                converged: refinement.converged,
                objective: refinement.objective,
            });
        }

        if let Some(telemetry) = &self.telemetry {
            telemetry.add_windows(1);
        }

        outcomes
    }

    /// Components C7-C9 for one sample: chain candidates across windows,
    /// locate breakpoints, and fill alleles from the frozen mosaic.
    fn stitch_sample(
        &self,
        x: &GenotypeMatrix,
        panel: &HaplotypePanel,
        plan: &WindowPlan,
        sample: usize,
        cands: Vec<WindowCandidates>,
        join_buf: &mut Vec<f32>,
    ) -> Result<(HaplotypeMosaicPair, Vec<u8>, Vec<u8>, Vec<u8>)> {
        let window_pairs: Vec<(u32, u32)> = if self.config.fast_method {
            let mut bitsets = Vec::with_capacity(cands.len());
            for cand in cands {
                match cand {
                    WindowCandidates::Bitset { strand1, strand2 } => {
                        bitsets.push((strand1, strand2));
                    }
                    WindowCandidates::Pairs(_) => {
                        return Err(MosaixError::algorithm(
                            "Pair candidates fed to the intersection stitcher",
                        ));
                    }
                }
            }
            let stitched = stitch_intersection(&mut bitsets)?;
            stitched
                .haps1
                .into_iter()
                .zip(stitched.haps2)
                .collect()
        } else {
            let mut lists = Vec::with_capacity(cands.len());
            for cand in cands {
                match cand {
                    WindowCandidates::Pairs(pairs) => lists.push(pairs),
                    WindowCandidates::Bitset { .. } => {
                        return Err(MosaixError::algorithm(
                            "Bitset candidates fed to the DP stitcher",
                        ));
                    }
                }
            }
            stitch_dp(&lists, self.config.lambda)?
        };

        let mosaic = self.materialize(x, panel, plan, sample, &window_pairs, join_buf);
        let (dosages, a1, a2) =
            impute_sample(x, sample, panel, &mosaic, self.config.impute_mode);
        Ok((mosaic, dosages, a1, a2))
    }

    /// Turn per-window haplotype choices into a mosaic pair by locating the
    /// breakpoint of every switch between adjacent windows.
    fn materialize(
        &self,
        x: &GenotypeMatrix,
        panel: &HaplotypePanel,
        plan: &WindowPlan,
        sample: usize,
        window_pairs: &[(u32, u32)],
        join_buf: &mut Vec<f32>,
    ) -> HaplotypeMosaicPair {
        let (mut cur1, mut cur2) = window_pairs[0];
        let mut strand1 = HaplotypeMosaic::new();
        let mut strand2 = HaplotypeMosaic::new();
        strand1.push(1, HapIdx::new(cur1));
        strand2.push(1, HapIdx::new(cur2));

        for (w, &next) in window_pairs.iter().enumerate().skip(1) {
            if next == (cur1, cur2) || next == (cur2, cur1) {
                continue;
            }

            let rows = plan.window(w - 1).start..plan.window(w).end;
            join_buf.resize(rows.len(), 0.0);
            x.fill_sample_column(sample, rows.clone(), join_buf);

            match locate_join(join_buf, panel, rows.clone(), (cur1, cur2), next) {
                JoinDecision::Continue => {}
                JoinDecision::Single {
                    strand,
                    new_hap,
                    breakpoint,
                } => {
                    if breakpoint < rows.len() {
                        let start = (rows.start + breakpoint + 1) as u32;
                        if strand == 0 {
                            push_clamped(&mut strand1, start, new_hap);
                            cur1 = new_hap;
                        } else {
                            push_clamped(&mut strand2, start, new_hap);
                            cur2 = new_hap;
                        }
                    }
                }
                JoinDecision::Double { new1, new2, b1, b2 } => {
                    if b1 < rows.len() {
                        push_clamped(&mut strand1, (rows.start + b1 + 1) as u32, new1);
                        cur1 = new1;
                    }
                    if b2 < rows.len() {
                        push_clamped(&mut strand2, (rows.start + b2 + 1) as u32, new2);
                        cur2 = new2;
                    }
                }
            }
        }

        HaplotypeMosaicPair::new(strand1, strand2)
    }
}

/// Deterministic per-(sample, window) seed for candidate-list truncation
fn sample_window_seed(seed: u64, sample: usize, window: usize) -> u64 {
    seed.wrapping_add((sample as u64) << 32).wrapping_add(window as u64)
}

/// Clamp a segment start past the previous record before pushing, so starts
/// stay strictly increasing even when a join places a switch before an
/// earlier one.
fn push_clamped(mosaic: &mut HaplotypeMosaic, start: u32, hap: u32) {
    let start = match mosaic.last_start() {
        Some(last) => start.max(last + 1),
        None => start,
    };
    mosaic.push(start, HapIdx::new(hap));
}
