//! Sliding-window sweep over an ordered series.
//!
//! For every window start `lo` the accumulator is grown one sample at a time
//! up to `max_size`; every length in `[min_size, max_size]` is scored and
//! offered to the tracker. A break stops the inner loop since any longer
//! window from the same start contains it as well. Cost is
//! O(N·(max_size − min_size)) per series.
//!
//! With the `parallel` feature the window starts are split into contiguous
//! chunks swept on the rayon pool, each into its own tracker; merging the
//! trackers in chunk order reproduces the sequential result exactly.

use crate::breaks::BreakIndex;
use crate::diagnostics::SweepStats;
use crate::error::{SneError, WindowRejection};
use crate::scoring::{SegmentScorer, WindowAccumulator};
use crate::series::OrderedSeries;
use crate::tracker::{MapTracker, SurfaceEstimates};
use log::debug;
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Window starts handed to one rayon task, at minimum.
#[cfg(feature = "parallel")]
const MIN_CHUNK_STARTS: usize = 16;

/// Cooperative cancellation and progress reporting for a sweep.
///
/// Polled once per window start; the sweep stops with
/// [`SneError::Cancelled`] as soon as `is_cancelled` returns true.
pub trait SweepMonitor: Sync {
    fn is_cancelled(&self) -> bool;

    /// Called after each window start with the number of starts completed
    /// so far and the total, both counted over every series sharing the
    /// same [`SweepProgress`]. Calls are serialized and `done` increases by
    /// one each time.
    fn on_progress(&self, _done: usize, _total: usize) {}
}

/// Monitor that never cancels.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverCancel;

impl SweepMonitor for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl SweepMonitor for AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

/// Window-start counter shared by every sweep reporting to one monitor.
#[derive(Debug)]
pub struct SweepProgress {
    done: Mutex<usize>,
    total: usize,
}

impl SweepProgress {
    pub fn new(total: usize) -> Self {
        Self {
            done: Mutex::new(0),
            total,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn done(&self) -> usize {
        *self.done.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count one window start and report it while holding the lock.
    fn step<M: SweepMonitor + ?Sized>(&self, monitor: &M) {
        let mut done = self.done.lock().unwrap_or_else(PoisonError::into_inner);
        *done += 1;
        monitor.on_progress(*done, self.total);
    }
}

/// Result of a completed sweep.
#[derive(Clone, Debug)]
pub struct SweepOutcome {
    pub estimates: SurfaceEstimates,
    pub stats: SweepStats,
}

/// Drives [`SegmentScorer`] and [`MapTracker`] over every candidate window
/// of a series.
#[derive(Clone, Debug)]
pub struct NormalEstimationEngine {
    scorer: SegmentScorer,
}

impl NormalEstimationEngine {
    pub fn new(scorer: SegmentScorer) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &SegmentScorer {
        &self.scorer
    }

    /// Sweep `series`, in parallel when the `parallel` feature is enabled.
    pub fn run<M>(
        &self,
        series: &OrderedSeries,
        breaks: &BreakIndex,
        monitor: &M,
    ) -> Result<SweepOutcome, SneError>
    where
        M: SweepMonitor + ?Sized,
    {
        let progress = SweepProgress::new(self.outer_steps(series.len()));
        self.run_with_progress(series, breaks, monitor, &progress)
    }

    /// Like [`run`](Self::run), counting window starts into a progress
    /// shared with other sweeps.
    pub fn run_with_progress<M>(
        &self,
        series: &OrderedSeries,
        breaks: &BreakIndex,
        monitor: &M,
        progress: &SweepProgress,
    ) -> Result<SweepOutcome, SneError>
    where
        M: SweepMonitor + ?Sized,
    {
        #[cfg(feature = "parallel")]
        {
            self.run_chunked(series, breaks, monitor, progress)
        }
        #[cfg(not(feature = "parallel"))]
        {
            self.run_ordered(series, breaks, monitor, progress)
        }
    }

    /// Number of window starts a series of `len` samples is swept with.
    pub fn outer_steps(&self, len: usize) -> usize {
        self.window_starts(len).len()
    }

    /// Single-threaded sweep, window starts in ascending order.
    pub fn run_sequential<M>(
        &self,
        series: &OrderedSeries,
        breaks: &BreakIndex,
        monitor: &M,
    ) -> Result<SweepOutcome, SneError>
    where
        M: SweepMonitor + ?Sized,
    {
        let progress = SweepProgress::new(self.outer_steps(series.len()));
        self.run_ordered(series, breaks, monitor, &progress)
    }

    fn run_ordered<M>(
        &self,
        series: &OrderedSeries,
        breaks: &BreakIndex,
        monitor: &M,
        progress: &SweepProgress,
    ) -> Result<SweepOutcome, SneError>
    where
        M: SweepMonitor + ?Sized,
    {
        let t0 = Instant::now();
        let starts = self.window_starts(series.len());
        let (tracker, mut stats) = self.sweep_starts(series, breaks, starts, monitor, progress)?;
        stats.chunks = 1;
        self.finish(tracker, stats, t0)
    }

    #[cfg(feature = "parallel")]
    fn run_chunked<M>(
        &self,
        series: &OrderedSeries,
        breaks: &BreakIndex,
        monitor: &M,
        progress: &SweepProgress,
    ) -> Result<SweepOutcome, SneError>
    where
        M: SweepMonitor + ?Sized,
    {
        let t0 = Instant::now();
        let starts = self.window_starts(series.len());
        let total = starts.len();
        let threads = rayon::current_num_threads().max(1);
        let chunk = total.div_ceil(threads * 4).max(MIN_CHUNK_STARTS);
        let chunks: Vec<Range<usize>> = (starts.start..starts.end)
            .step_by(chunk)
            .map(|lo| lo..(lo + chunk).min(starts.end))
            .collect();

        let parts: Vec<(MapTracker, SweepStats)> = chunks
            .into_par_iter()
            .map(|range| self.sweep_starts(series, breaks, range, monitor, progress))
            .collect::<Result<_, _>>()?;

        let mut tracker = MapTracker::new(series.len());
        let mut stats = SweepStats::default();
        for (part, part_stats) in parts {
            tracker.merge(part);
            stats.absorb(&part_stats);
            stats.chunks += 1;
        }
        self.finish(tracker, stats, t0)
    }

    /// Every valid window start: `lo` in `[0, N − min_size]`.
    fn window_starts(&self, len: usize) -> Range<usize> {
        match len.checked_sub(self.scorer.min_size()) {
            Some(last) => 0..last + 1,
            None => 0..0,
        }
    }

    fn sweep_starts<M>(
        &self,
        series: &OrderedSeries,
        breaks: &BreakIndex,
        starts: Range<usize>,
        monitor: &M,
        progress: &SweepProgress,
    ) -> Result<(MapTracker, SweepStats), SneError>
    where
        M: SweepMonitor + ?Sized,
    {
        let n = series.len();
        let min_size = self.scorer.min_size();
        let max_size = self.scorer.max_size();
        let mut tracker = MapTracker::new(n);
        let mut stats = SweepStats::default();
        let mut acc = WindowAccumulator::new(starts.start);

        for lo in starts {
            acc.reset(lo);
            let end = n.min(lo + max_size);
            for pos in lo..end {
                acc.push(series.get(pos), breaks.is_break(pos));
                if acc.first_break().is_some() {
                    stats.break_stops += 1;
                    break;
                }
                if acc.len() < min_size {
                    continue;
                }
                match self.scorer.score_accumulated(&acc) {
                    Ok(window) => {
                        tracker.offer(&window);
                        stats.windows_scored += 1;
                    }
                    Err(WindowRejection::Degenerate(_)) => stats.windows_degenerate += 1,
                    Err(_) => {}
                }
            }
            stats.outer_steps += 1;
            progress.step(monitor);
            if monitor.is_cancelled() {
                return Err(SneError::Cancelled);
            }
        }
        Ok((tracker, stats))
    }

    fn finish(
        &self,
        tracker: MapTracker,
        mut stats: SweepStats,
        t0: Instant,
    ) -> Result<SweepOutcome, SneError> {
        stats.elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0;
        debug!(
            "NormalEstimationEngine: starts={} scored={} degenerate={} break_stops={} chunks={} elapsed_ms={:.3}",
            stats.outer_steps,
            stats.windows_scored,
            stats.windows_degenerate,
            stats.break_stops,
            stats.chunks,
            stats.elapsed_ms
        );
        let estimates = tracker.finalize()?;
        Ok(SweepOutcome { estimates, stats })
    }
}
