#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod estimator;
pub mod input;
pub mod io;
pub mod thickness;

// Building blocks of the sweep. Public for tools and tests that drive a
// single series directly.
pub mod angle;
pub mod breaks;
pub mod eigen;
pub mod engine;
pub mod scoring;
pub mod series;
pub mod spatial;
pub mod tracker;

// --- High-level re-exports -------------------------------------------------

// Main entry points: estimator + report.
pub use crate::config::{AlphaTreatment, EstimatorParams};
pub use crate::estimator::{BatchReport, StructureNormalEstimator};
pub use crate::input::{Dataset, Region, SurfaceKind, Trace, TracePoint};

// Error taxonomy.
pub use crate::error::{SneError, WindowRejection};

// Cancellation.
pub use crate::engine::{NeverCancel, SweepMonitor};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use structure_normals::prelude::*;
/// use nalgebra::Vector3;
///
/// # fn main() -> Result<(), SneError> {
/// let points = (0..300)
///     .map(|i| {
///         let t = i as f64 * 0.1;
///         TracePoint::new(Vector3::new(t, t.sin(), 0.2 * t), None)
///     })
///     .collect();
/// let dataset = Dataset::Trace { name: None, trace: Trace::new(points) };
///
/// let estimator = StructureNormalEstimator::new(EstimatorParams {
///     min_size: 20,
///     max_size: 80,
///     ..Default::default()
/// })?;
/// let report = estimator.run(&[dataset], &NeverCancel);
/// println!("datasets={} warnings={}", report.datasets.len(), report.warnings.len());
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::{
        Dataset, EstimatorParams, NeverCancel, SneError, StructureNormalEstimator, Trace,
        TracePoint,
    };
}

// --- Sweep-level API (for tools & advanced users) --------------------------

pub mod stages {
    pub use crate::breaks::BreakIndex;
    pub use crate::engine::{NormalEstimationEngine, SweepOutcome, SweepProgress};
    pub use crate::scoring::{ScoredWindow, SegmentScorer, WindowAccumulator};
    pub use crate::series::{OrderedSeries, OrderedSeriesBuilder};
    pub use crate::spatial::{RTreeIndex, SpatialIndex};
    pub use crate::thickness::{ThicknessEstimator, ThicknessSample};
    pub use crate::tracker::{Estimate, MapTracker, SurfaceEstimates};
}
