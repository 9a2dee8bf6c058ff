mod common;

use approx::assert_abs_diff_eq;
use common::synthetic::{init_logging, plane_pair, PlaneSpec};
use structure_normals::stages::{RTreeIndex, ThicknessEstimator};
use structure_normals::thickness::SENTINEL_THICKNESS;
use structure_normals::{
    Dataset, EstimatorParams, NeverCancel, Region, StructureNormalEstimator, SurfaceKind,
};

fn run_pair(separation: f64, cutoff: f64) -> structure_normals::BatchReport {
    let plane = PlaneSpec::new(60.0, 20.0);
    let (lower, upper) = plane_pair(&plane, 200, separation, 0.002, 99);
    let dataset = Dataset::GeoObject {
        name: Some("unit".into()),
        lower: Region::from(lower),
        upper: Some(Region::from(upper)),
        pinch_nodes: Vec::new(),
    };
    let estimator = StructureNormalEstimator::new(EstimatorParams {
        min_size: 20,
        max_size: 60,
        cutoff_distance: cutoff,
        ..Default::default()
    })
    .unwrap();
    estimator.run(&[dataset], &NeverCancel)
}

#[test]
fn thickness_matches_separation_within_cutoff() {
    init_logging();
    let report = run_pair(3.0, 10.0);
    assert!(report.warnings.is_empty());
    let ds = &report.datasets[0];
    for kind in [SurfaceKind::Lower, SurfaceKind::Upper] {
        let surface = ds.surface(kind).unwrap();
        let thickness = surface.channels.thickness.as_ref().unwrap();
        assert_eq!(thickness.len(), 200);
        for &t in thickness {
            assert_abs_diff_eq!(t, 3.0, epsilon = 0.05);
        }
    }
    assert!(ds.timings.stages.iter().any(|s| s.label == "thickness"));
}

#[test]
fn normals_face_the_opposite_surface() {
    let plane = PlaneSpec::new(60.0, 20.0);
    let pole = plane.pole();
    let report = run_pair(3.0, 10.0);
    let ds = &report.datasets[0];
    // Upper lies against the downward pole from lower.
    let lower = ds.surface(SurfaceKind::Lower).unwrap();
    assert!(lower.channels.normal.iter().flatten().all(|n| n.dot(&pole) < 0.0));
    let upper = ds.surface(SurfaceKind::Upper).unwrap();
    assert!(upper.channels.normal.iter().flatten().all(|n| n.dot(&pole) > 0.0));
}

#[test]
fn sentinel_beyond_cutoff() {
    let report = run_pair(15.0, 10.0);
    let ds = &report.datasets[0];
    for kind in [SurfaceKind::Lower, SurfaceKind::Upper] {
        let thickness = ds.surface(kind).unwrap().channels.thickness.as_ref().unwrap();
        assert!(thickness.iter().all(|&t| t == SENTINEL_THICKNESS));
    }
}

#[test]
fn explicit_normals_on_flat_planes() {
    let plane = PlaneSpec::new(0.0, 45.0);
    let pole = plane.pole();
    let (lower, upper) = plane_pair(&plane, 100, 2.5, 0.0, 1);
    let upper_positions: Vec<_> = upper.points.iter().map(|p| p.position).collect();
    let index = RTreeIndex::new(&upper_positions);

    let points: Vec<_> = lower.points.iter().map(|p| p.position).collect();
    let mut normals = vec![Some(pole); points.len()];
    let samples = ThicknessEstimator::new(5.0).apply(&points, &mut normals, &index);
    for (s, n) in samples.iter().zip(&normals) {
        assert!(s.matched);
        assert!(s.flip);
        assert_abs_diff_eq!(s.thickness, 2.5, epsilon = 1e-9);
        assert_abs_diff_eq!(n.unwrap().dot(&pole), -1.0, epsilon = 1e-12);
    }
}

#[test]
fn single_surface_objects_have_no_thickness() {
    let plane = PlaneSpec::new(60.0, 20.0);
    let (lower, _) = plane_pair(&plane, 120, 3.0, 0.002, 4);
    let dataset = Dataset::GeoObject {
        name: None,
        lower: Region::from(lower),
        upper: None,
        pinch_nodes: Vec::new(),
    };
    let estimator = StructureNormalEstimator::new(EstimatorParams {
        min_size: 20,
        max_size: 60,
        ..Default::default()
    })
    .unwrap();
    let report = estimator.run(&[dataset], &NeverCancel);
    let lower = report.datasets[0].surface(SurfaceKind::Lower).unwrap();
    assert!(lower.channels.thickness.is_none());
}
