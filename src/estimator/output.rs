use crate::diagnostics::{SurfaceDiagnostics, TimingBreakdown};
use crate::input::SurfaceKind;
use crate::series::OrderedSeries;
use crate::thickness::{ThicknessSample, SENTINEL_THICKNESS};
use crate::tracker::{SurfaceEstimates, UNASSIGNED_SEGMENT};
use nalgebra::Vector3;
use serde::Serialize;

/// Per-sample output channels of one surface, in input order.
///
/// Samples that were dropped (non-finite coordinates) or never covered by a
/// scored window have no normal, start/end `0`, segment id `-1` and weight
/// `-∞` (serialized as `null`).
#[derive(Clone, Debug, Default, Serialize)]
pub struct OutputChannels {
    #[serde(rename = "Normal")]
    pub normal: Vec<Option<Vector3<f64>>>,
    /// Start of the winning window, in sorted positions.
    #[serde(rename = "StartPoint")]
    pub start_point: Vec<usize>,
    /// Exclusive end of the winning window, in sorted positions.
    #[serde(rename = "EndPoint")]
    pub end_point: Vec<usize>,
    #[serde(rename = "SegmentID")]
    pub segment_id: Vec<i64>,
    /// Log posterior of the winning window.
    #[serde(rename = "Weight")]
    pub weight: Vec<f64>,
    #[serde(rename = "Thickness", skip_serializing_if = "Option::is_none")]
    pub thickness: Option<Vec<f64>>,
}

impl OutputChannels {
    fn unassigned(len: usize) -> Self {
        Self {
            normal: vec![None; len],
            start_point: vec![0; len],
            end_point: vec![0; len],
            segment_id: vec![UNASSIGNED_SEGMENT; len],
            weight: vec![f64::NEG_INFINITY; len],
            thickness: None,
        }
    }

    /// Write sorted-order estimates back to input order.
    pub fn from_estimates(series: &OrderedSeries, estimates: &SurfaceEstimates) -> Self {
        let mut out = Self::unassigned(series.input_len());
        for (sample, est) in series.samples().iter().zip(estimates.estimates()) {
            let i = sample.original_index;
            out.normal[i] = est.normal;
            if let Some((lo, hi)) = est.window {
                out.start_point[i] = lo;
                out.end_point[i] = hi;
            }
            out.segment_id[i] = est.segment_id;
            out.weight[i] = est.log_score;
        }
        out
    }

    /// Write sorted-order thickness samples back to input order.
    pub fn set_thickness(&mut self, series: &OrderedSeries, samples: &[ThicknessSample]) {
        let mut thickness = vec![SENTINEL_THICKNESS; series.input_len()];
        for (sample, t) in series.samples().iter().zip(samples) {
            thickness[sample.original_index] = t.thickness;
        }
        self.thickness = Some(thickness);
    }

    pub fn len(&self) -> usize {
        self.normal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normal.is_empty()
    }
}

/// Estimates for one boundary surface.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceOutput {
    pub surface: SurfaceKind,
    pub channels: OutputChannels,
    pub diagnostics: SurfaceDiagnostics,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetReport {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Surfaces that completed; skipped surfaces appear as warnings instead.
    pub surfaces: Vec<SurfaceOutput>,
    pub timings: TimingBreakdown,
}

impl DatasetReport {
    pub fn surface(&self, kind: SurfaceKind) -> Option<&SurfaceOutput> {
        self.surfaces.iter().find(|s| s.surface == kind)
    }
}

/// A region that was skipped without aborting the run.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionWarning {
    pub dataset: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub surface: SurfaceKind,
    pub message: String,
}

/// Everything produced by [`StructureNormalEstimator::run`].
///
/// [`StructureNormalEstimator::run`]: super::StructureNormalEstimator::run
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub datasets: Vec<DatasetReport>,
    pub warnings: Vec<RegionWarning>,
    /// True when the run stopped early; `datasets` then holds the surfaces
    /// finished before cancellation.
    pub cancelled: bool,
    pub timings: TimingBreakdown,
}
