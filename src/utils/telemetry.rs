//! # Telemetry Blackboard
//!
//! Thread-safe progress tracking for the phasing pipeline. Worker threads
//! update atomic counters with minimal overhead; an optional background
//! heartbeat thread periodically reads them and emits `tracing` events.
//!
//! The blackboard pattern decouples work execution from progress reporting,
//! which keeps the rayon hot loops free of locks and I/O.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Processing stage for high-level progress tracking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Stage {
    Initializing = 0,
    WindowedSearch = 1,
    Stitching = 2,
    Imputation = 3,
    Complete = 4,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Initializing => "Initializing",
            Stage::WindowedSearch => "Windowed search",
            Stage::Stitching => "Stitching",
            Stage::Imputation => "Imputation",
            Stage::Complete => "Complete",
        }
    }

    fn from_u64(val: u64) -> Self {
        match val {
            0 => Stage::Initializing,
            1 => Stage::WindowedSearch,
            2 => Stage::Stitching,
            3 => Stage::Imputation,
            _ => Stage::Complete,
        }
    }
}

/// Global progress state, designed for cheap relaxed-ordering updates from
/// parallel iterators. The heartbeat reads approximate values.
pub struct TelemetryBlackboard {
    stage: AtomicU64,

    windows_done: AtomicU64,
    total_windows: AtomicU64,

    samples_done: AtomicU64,
    total_samples: AtomicU64,

    start_time: Instant,
    shutdown: AtomicBool,
}

impl TelemetryBlackboard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            stage: AtomicU64::new(Stage::Initializing as u64),
            windows_done: AtomicU64::new(0),
            total_windows: AtomicU64::new(0),
            samples_done: AtomicU64::new(0),
            total_samples: AtomicU64::new(0),
            start_time: Instant::now(),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Enter a stage, resetting the per-stage counters
    pub fn set_stage(&self, stage: Stage) {
        self.stage.store(stage as u64, Ordering::Relaxed);
        self.windows_done.store(0, Ordering::Relaxed);
        self.samples_done.store(0, Ordering::Relaxed);
    }

    pub fn stage(&self) -> Stage {
        Stage::from_u64(self.stage.load(Ordering::Relaxed))
    }

    pub fn set_totals(&self, windows: u64, samples: u64) {
        self.total_windows.store(windows, Ordering::Relaxed);
        self.total_samples.store(samples, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_windows(&self, delta: u64) {
        self.windows_done.fetch_add(delta, Ordering::Relaxed);
    }

    #[inline]
    pub fn add_samples(&self, delta: u64) {
        self.samples_done.fetch_add(delta, Ordering::Relaxed);
    }

    pub fn windows_done(&self) -> u64 {
        self.windows_done.load(Ordering::Relaxed)
    }

    pub fn samples_done(&self) -> u64 {
        self.samples_done.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Spawn a heartbeat thread emitting a progress event at `interval`.
    /// The thread exits once `stop_heartbeat` is called.
    pub fn start_heartbeat(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let board = Arc::clone(self);
        thread::spawn(move || {
            while !board.shutdown.load(Ordering::Relaxed) {
                thread::sleep(interval);
                let stage = board.stage();
                if stage == Stage::Complete {
                    break;
                }
                tracing::info!(
                    stage = stage.as_str(),
                    windows = board.windows_done(),
                    total_windows = board.total_windows.load(Ordering::Relaxed),
                    samples = board.samples_done(),
                    total_samples = board.total_samples.load(Ordering::Relaxed),
                    elapsed_s = board.elapsed().as_secs(),
                    "progress"
                );
            }
        })
    }

    /// Signal the heartbeat thread to exit
    pub fn stop_heartbeat(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}
