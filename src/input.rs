//! Input model: traces, boundary regions, and datasets.
//!
//! A dataset is resolved once into a closed variant: either a geological
//! object bounded by a lower and (optionally) an upper surface with pinch
//! nodes marking discontinuities, or a single standalone trace. Consumers
//! only ever see flat sequences of [`TracePoint`]s.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// One digitized point with the outcrop normal sampled at that location.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TracePoint {
    pub position: Vector3<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal: Option<Vector3<f64>>,
}

impl TracePoint {
    pub fn new(position: Vector3<f64>, normal: Option<Vector3<f64>>) -> Self {
        Self { position, normal }
    }
}

/// An ordered polyline digitized along a surface.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub points: Vec<TracePoint>,
}

impl Trace {
    pub fn new(points: Vec<TracePoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// All traces digitized along one boundary surface.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub traces: Vec<Trace>,
}

impl Region {
    pub fn new(traces: Vec<Trace>) -> Self {
        Self { traces }
    }

    /// Flat sequence of the points of every trace, in trace order.
    pub fn points(&self) -> impl Iterator<Item = TracePoint> + '_ {
        self.traces.iter().flat_map(|t| t.points.iter().copied())
    }

    pub fn point_count(&self) -> usize {
        self.traces.iter().map(Trace::len).sum()
    }
}

impl From<Trace> for Region {
    fn from(trace: Trace) -> Self {
        Self {
            traces: vec![trace],
        }
    }
}

/// Which boundary of a geological object a surface belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceKind {
    Lower,
    Upper,
}

impl std::fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceKind::Lower => f.write_str("lower"),
            SurfaceKind::Upper => f.write_str("upper"),
        }
    }
}

/// A unit of work for the estimator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Dataset {
    /// Geological object. `upper` is `None` for single-surface objects.
    GeoObject {
        #[serde(default)]
        name: Option<String>,
        lower: Region,
        #[serde(default)]
        upper: Option<Region>,
        #[serde(default)]
        pinch_nodes: Vec<Vector3<f64>>,
    },
    /// A standalone trace; never has pinch nodes.
    Trace {
        #[serde(default)]
        name: Option<String>,
        trace: Trace,
    },
}

impl Dataset {
    pub fn name(&self) -> Option<&str> {
        match self {
            Dataset::GeoObject { name, .. } | Dataset::Trace { name, .. } => name.as_deref(),
        }
    }

    /// Boundary surfaces to process, lower first.
    pub fn surfaces(&self) -> Vec<(SurfaceKind, Region)> {
        match self {
            Dataset::GeoObject { lower, upper, .. } => {
                let mut out = vec![(SurfaceKind::Lower, lower.clone())];
                if let Some(upper) = upper {
                    out.push((SurfaceKind::Upper, upper.clone()));
                }
                out
            }
            Dataset::Trace { trace, .. } => vec![(SurfaceKind::Lower, Region::from(trace.clone()))],
        }
    }

    pub fn pinch_nodes(&self) -> &[Vector3<f64>] {
        match self {
            Dataset::GeoObject { pinch_nodes, .. } => pinch_nodes,
            Dataset::Trace { .. } => &[],
        }
    }

    pub fn has_two_surfaces(&self) -> bool {
        matches!(self, Dataset::GeoObject { upper: Some(_), .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64) -> TracePoint {
        TracePoint::new(Vector3::new(x, 0.0, 0.0), None)
    }

    #[test]
    fn region_flattens_traces_in_order() {
        let region = Region::new(vec![
            Trace::new(vec![point(0.0), point(1.0)]),
            Trace::new(vec![point(2.0)]),
        ]);
        let xs: Vec<f64> = region.points().map(|p| p.position.x).collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0]);
        assert_eq!(region.point_count(), 3);
    }

    #[test]
    fn single_surface_object_has_one_surface() {
        let ds = Dataset::GeoObject {
            name: None,
            lower: Region::default(),
            upper: None,
            pinch_nodes: vec![],
        };
        assert_eq!(ds.surfaces().len(), 1);
        assert!(!ds.has_two_surfaces());
    }

    #[test]
    fn parses_tagged_json() {
        let json = r#"{
            "kind": "trace",
            "trace": { "points": [ { "position": [0.0, 1.0, 2.0], "normal": [0.0, 0.0, 1.0] } ] }
        }"#;
        let ds: Dataset = serde_json::from_str(json).unwrap();
        match ds {
            Dataset::Trace { trace, .. } => {
                assert_eq!(trace.points[0].position, Vector3::new(0.0, 1.0, 2.0));
                assert_eq!(trace.points[0].normal, Some(Vector3::new(0.0, 0.0, 1.0)));
            }
            other => panic!("unexpected dataset {other:?}"),
        }
    }
}
