//! Batch driver: datasets in, per-sample channels out.
//!
//! For every dataset each boundary surface is ordered, split at pinch nodes,
//! and swept independently; both surfaces of a geological object run
//! concurrently under the `parallel` feature. When an object has two
//! surfaces and thickness is enabled, each surface is measured against the
//! other once both sweeps succeeded.
//!
//! Region-level failures (too few points, no scorable window) become
//! [`RegionWarning`]s and the run moves on. Cancellation stops the run; the
//! report keeps every surface finished before it.

mod output;

pub use output::{BatchReport, DatasetReport, OutputChannels, RegionWarning, SurfaceOutput};

use crate::breaks::BreakIndex;
use crate::config::EstimatorParams;
use crate::diagnostics::{SurfaceDiagnostics, TimingBreakdown};
use crate::engine::{NormalEstimationEngine, SweepMonitor, SweepProgress};
use crate::error::SneError;
use crate::input::{Dataset, Region, SurfaceKind};
use crate::scoring::SegmentScorer;
use crate::series::{OrderedSeries, OrderedSeriesBuilder};
use crate::spatial::RTreeIndex;
use crate::thickness::ThicknessEstimator;
use crate::tracker::SurfaceEstimates;
use log::{debug, warn};
use nalgebra::Vector3;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A surface ordered, split at pinch nodes, and ready to sweep.
struct PreparedSurface {
    kind: SurfaceKind,
    series: OrderedSeries,
    breaks: BreakIndex,
    engine: NormalEstimationEngine,
    prepare_ms: f64,
}

/// A surface whose sweep completed.
struct SurfaceRun {
    kind: SurfaceKind,
    series: OrderedSeries,
    estimates: SurfaceEstimates,
    diagnostics: SurfaceDiagnostics,
    elapsed_ms: f64,
}

pub struct StructureNormalEstimator {
    params: EstimatorParams,
}

impl StructureNormalEstimator {
    /// Fails with [`SneError::BadConfiguration`] before any work is done.
    pub fn new(params: EstimatorParams) -> Result<Self, SneError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &EstimatorParams {
        &self.params
    }

    /// Process every dataset in order.
    pub fn run<M>(&self, datasets: &[Dataset], monitor: &M) -> BatchReport
    where
        M: SweepMonitor + ?Sized,
    {
        let total_start = Instant::now();
        let mut report = BatchReport::default();
        for (index, dataset) in datasets.iter().enumerate() {
            let ds_start = Instant::now();
            let (dataset_report, cancelled) =
                self.process_dataset(index, dataset, monitor, &mut report.warnings);
            report.timings.push(
                format!("dataset:{index}"),
                ds_start.elapsed().as_secs_f64() * 1000.0,
            );
            if !dataset_report.surfaces.is_empty() {
                report.datasets.push(dataset_report);
            }
            if cancelled {
                warn!("Estimation cancelled during dataset {index}");
                report.cancelled = true;
                break;
            }
        }
        report.timings.total_ms = total_start.elapsed().as_secs_f64() * 1000.0;
        debug!(
            "StructureNormalEstimator: datasets={} warnings={} cancelled={} total_ms={:.3}",
            report.datasets.len(),
            report.warnings.len(),
            report.cancelled,
            report.timings.total_ms
        );
        report
    }

    /// Estimate normals for one region. `pinch_nodes` mark discontinuities
    /// no window may span.
    pub fn estimate_region<M>(
        &self,
        kind: SurfaceKind,
        region: &Region,
        pinch_nodes: &[Vector3<f64>],
        monitor: &M,
    ) -> Result<SurfaceOutput, SneError>
    where
        M: SweepMonitor + ?Sized,
    {
        let surface = self.prepare_surface(kind, region, pinch_nodes)?;
        let progress = SweepProgress::new(surface.engine.outer_steps(surface.series.len()));
        let run = self.sweep_prepared(surface, monitor, &progress)?;
        Ok(SurfaceOutput {
            surface: run.kind,
            channels: OutputChannels::from_estimates(&run.series, &run.estimates),
            diagnostics: run.diagnostics,
        })
    }

    /// Returns the report and whether cancellation interrupted the dataset.
    fn process_dataset<M>(
        &self,
        index: usize,
        dataset: &Dataset,
        monitor: &M,
        warnings: &mut Vec<RegionWarning>,
    ) -> (DatasetReport, bool)
    where
        M: SweepMonitor + ?Sized,
    {
        let name = dataset.name().map(str::to_owned);
        let surfaces = dataset.surfaces();
        let results = self.sweep_surfaces(&surfaces, dataset.pinch_nodes(), monitor);

        let mut cancelled = false;
        let mut runs = Vec::with_capacity(results.len());
        for ((kind, _), result) in surfaces.iter().zip(results) {
            match result {
                Ok(run) => runs.push(run),
                Err(SneError::Cancelled) => cancelled = true,
                Err(err) => {
                    warn!("Skipping {kind} surface of dataset {index}: {err}");
                    warnings.push(RegionWarning {
                        dataset: index,
                        name: name.clone(),
                        surface: *kind,
                        message: err.to_string(),
                    });
                }
            }
        }

        let mut timings = TimingBreakdown::default();
        for run in &runs {
            timings.push(format!("sweep:{}", run.kind), run.elapsed_ms);
        }

        let mut outputs: Vec<SurfaceOutput> = runs
            .iter()
            .map(|run| SurfaceOutput {
                surface: run.kind,
                channels: OutputChannels::from_estimates(&run.series, &run.estimates),
                diagnostics: run.diagnostics.clone(),
            })
            .collect();

        if !cancelled
            && self.params.compute_thickness
            && dataset.has_two_surfaces()
            && runs.len() == 2
        {
            let t0 = Instant::now();
            self.apply_thickness(&mut runs, &mut outputs);
            timings.push("thickness", t0.elapsed().as_secs_f64() * 1000.0);
        }
        timings.total_ms = timings.stages.iter().map(|s| s.elapsed_ms).sum();

        (
            DatasetReport {
                index,
                name,
                surfaces: outputs,
                timings,
            },
            cancelled,
        )
    }

    /// Sweep every surface of a dataset. Progress is reported against the
    /// window starts of all surfaces together.
    fn sweep_surfaces<M>(
        &self,
        surfaces: &[(SurfaceKind, Region)],
        pinch_nodes: &[Vector3<f64>],
        monitor: &M,
    ) -> Vec<Result<SurfaceRun, SneError>>
    where
        M: SweepMonitor + ?Sized,
    {
        let prepared: Vec<Result<PreparedSurface, SneError>> = surfaces
            .iter()
            .map(|(kind, region)| self.prepare_surface(*kind, region, pinch_nodes))
            .collect();
        let total = prepared
            .iter()
            .flatten()
            .map(|s| s.engine.outer_steps(s.series.len()))
            .sum();
        let progress = SweepProgress::new(total);

        #[cfg(feature = "parallel")]
        {
            prepared
                .into_par_iter()
                .map(|surface| self.sweep_prepared(surface?, monitor, &progress))
                .collect()
        }
        #[cfg(not(feature = "parallel"))]
        {
            prepared
                .into_iter()
                .map(|surface| {
                    if monitor.is_cancelled() {
                        return Err(SneError::Cancelled);
                    }
                    self.sweep_prepared(surface?, monitor, &progress)
                })
                .collect()
        }
    }

    fn prepare_surface(
        &self,
        kind: SurfaceKind,
        region: &Region,
        pinch_nodes: &[Vector3<f64>],
    ) -> Result<PreparedSurface, SneError> {
        let t0 = Instant::now();
        let series = OrderedSeriesBuilder::new(self.params.min_size).build(region.points())?;
        let breaks = BreakIndex::locate(&series, pinch_nodes);

        let mut use_prior = self.params.use_bias_correction;
        if use_prior && !series.has_normals() {
            warn!("{kind} surface has no sampled normals; bias correction disabled");
            use_prior = false;
        }

        Ok(PreparedSurface {
            kind,
            series,
            breaks,
            engine: NormalEstimationEngine::new(SegmentScorer::new(&self.params, use_prior)),
            prepare_ms: t0.elapsed().as_secs_f64() * 1000.0,
        })
    }

    fn sweep_prepared<M>(
        &self,
        surface: PreparedSurface,
        monitor: &M,
        progress: &SweepProgress,
    ) -> Result<SurfaceRun, SneError>
    where
        M: SweepMonitor + ?Sized,
    {
        let PreparedSurface {
            kind,
            series,
            breaks,
            engine,
            prepare_ms,
        } = surface;
        let outcome = engine.run_with_progress(&series, &breaks, monitor, progress)?;

        let diagnostics = SurfaceDiagnostics {
            surface: kind.to_string(),
            input_points: series.input_len(),
            usable_points: series.len(),
            breaks: breaks.count(),
            bias_correction: engine.scorer().uses_prior(),
            assigned: outcome.estimates.assigned(),
            sweep: outcome.stats,
        };
        debug!(
            "{kind} surface: points={} usable={} breaks={} assigned={}",
            diagnostics.input_points,
            diagnostics.usable_points,
            diagnostics.breaks,
            diagnostics.assigned
        );
        Ok(SurfaceRun {
            kind,
            series,
            elapsed_ms: prepare_ms + diagnostics.sweep.elapsed_ms,
            estimates: outcome.estimates,
            diagnostics,
        })
    }

    /// Measure each surface against the other and orient normals toward it.
    fn apply_thickness(&self, runs: &mut [SurfaceRun], outputs: &mut [SurfaceOutput]) {
        let estimator = ThicknessEstimator::new(self.params.cutoff_distance);
        let indices: Vec<RTreeIndex> = runs
            .iter()
            .map(|run| RTreeIndex::from_points(run.series.positions()))
            .collect();

        for (i, (run, output)) in runs.iter_mut().zip(outputs.iter_mut()).enumerate() {
            let opposite = &indices[1 - i];
            let points: Vec<Vector3<f64>> = run.series.positions().collect();
            let mut normals: Vec<Option<Vector3<f64>>> =
                run.estimates.estimates().iter().map(|e| e.normal).collect();
            let samples = estimator.apply(&points, &mut normals, opposite);

            for (est, normal) in run.estimates.estimates_mut().iter_mut().zip(normals) {
                est.normal = normal;
            }
            output.channels = OutputChannels::from_estimates(&run.series, &run.estimates);
            output.channels.set_thickness(&run.series, &samples);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::NeverCancel;
    use crate::input::{Trace, TracePoint};

    fn params() -> EstimatorParams {
        EstimatorParams {
            min_size: 10,
            max_size: 60,
            ..Default::default()
        }
    }

    fn wavy_region(n: usize, z0: f64) -> Region {
        let pts = (0..n)
            .map(|i| {
                let t = i as f64 * 0.2;
                let y = (t * 0.8).sin();
                let jitter = 0.001 * ((i * 13 % 5) as f64 - 2.0);
                TracePoint::new(
                    Vector3::new(t, y, z0 + 0.1 * t + jitter),
                    Some(Vector3::new(0.0, -1.0, 0.1).normalize()),
                )
            })
            .collect();
        Trace::new(pts).into()
    }

    #[test]
    fn rejects_bad_configuration_up_front() {
        let bad = EstimatorParams {
            min_size: 2,
            ..params()
        };
        assert!(matches!(
            StructureNormalEstimator::new(bad),
            Err(SneError::BadConfiguration(_))
        ));
    }

    #[test]
    fn writes_channels_in_input_order() {
        let est = StructureNormalEstimator::new(params()).unwrap();
        let mut region = wavy_region(80, 0.0);
        region.traces[0].points.reverse();
        let out = est
            .estimate_region(SurfaceKind::Lower, &region, &[], &NeverCancel)
            .unwrap();
        assert_eq!(out.channels.len(), 80);
        assert!(out.channels.normal.iter().all(Option::is_some));
        assert!(out.channels.weight.iter().all(|w| w.is_finite()));
        assert!(out.channels.thickness.is_none());
        let n = 80i64;
        for (i, &id) in out.channels.segment_id.iter().enumerate() {
            let (lo, hi) = (out.channels.start_point[i], out.channels.end_point[i]);
            assert_eq!(id, hi as i64 * n + lo as i64);
        }
    }

    #[test]
    fn two_surface_object_gets_thickness() {
        let est = StructureNormalEstimator::new(params()).unwrap();
        let ds = Dataset::GeoObject {
            name: Some("bed".into()),
            lower: wavy_region(80, 0.0),
            upper: Some(wavy_region(80, 2.0)),
            pinch_nodes: vec![],
        };
        let report = est.run(&[ds], &NeverCancel);
        assert!(report.warnings.is_empty());
        let lower = report.datasets[0].surface(SurfaceKind::Lower).unwrap();
        let upper = report.datasets[0].surface(SurfaceKind::Upper).unwrap();
        let t = lower.channels.thickness.as_ref().unwrap();
        assert!(t.iter().all(|&v| (v - 2.0).abs() < 0.05));
        assert!(lower.channels.normal.iter().flatten().all(|n| n.z > 0.0));
        assert!(upper.channels.normal.iter().flatten().all(|n| n.z < 0.0));
    }
}
