mod common;

use common::synthetic::{init_logging, noisy_plane_trace, without_normals, PlaneSpec};
use nalgebra::Vector3;
use structure_normals::config::load_config;
use structure_normals::io::{parse_datasets, write_json_file};
use structure_normals::{
    AlphaTreatment, Dataset, EstimatorParams, NeverCancel, Region, SneError,
    StructureNormalEstimator, SurfaceKind,
};

fn params() -> EstimatorParams {
    EstimatorParams {
        min_size: 20,
        max_size: 60,
        ..Default::default()
    }
}

fn trace_dataset(name: &str, n: usize, seed: u64) -> Dataset {
    let plane = PlaneSpec::new(140.0, 30.0);
    Dataset::Trace {
        name: Some(name.into()),
        trace: noisy_plane_trace(&plane, Vector3::zeros(), n, 0.005, seed),
    }
}

#[test]
fn region_failures_become_warnings() {
    init_logging();
    let plane = PlaneSpec::new(140.0, 30.0);
    let walled = noisy_plane_trace(&plane, Vector3::zeros(), 80, 0.005, 8);
    // A pinch node on every sample leaves no window to score.
    let pinch_nodes = walled.points.iter().map(|p| p.position).collect();
    let datasets = vec![
        trace_dataset("short", 10, 1),
        Dataset::GeoObject {
            name: Some("walled".into()),
            lower: Region::from(walled),
            upper: None,
            pinch_nodes,
        },
        trace_dataset("good", 150, 2),
    ];

    let estimator = StructureNormalEstimator::new(params()).unwrap();
    let report = estimator.run(&datasets, &NeverCancel);

    assert!(!report.cancelled);
    assert_eq!(report.warnings.len(), 2);
    assert_eq!(report.warnings[0].dataset, 0);
    assert!(report.warnings[0].message.starts_with("insufficient data"));
    assert_eq!(report.warnings[1].dataset, 1);
    assert_eq!(report.warnings[1].surface, SurfaceKind::Lower);
    assert_eq!(report.warnings[1].message, SneError::NoValidWindow.to_string());

    assert_eq!(report.datasets.len(), 1);
    assert_eq!(report.datasets[0].index, 2);
    assert_eq!(report.datasets[0].name.as_deref(), Some("good"));
    assert_eq!(report.timings.stages.len(), 3);
}

#[test]
fn bad_configuration_aborts_before_work() {
    let cases = [
        EstimatorParams {
            min_size: 4,
            ..params()
        },
        EstimatorParams {
            max_size: 40,
            ..params()
        },
        EstimatorParams {
            min_size: 80,
            max_size: 60,
            ..params()
        },
        EstimatorParams {
            cutoff_distance: f64::NAN,
            ..params()
        },
        EstimatorParams {
            alpha: AlphaTreatment::Marginalize { steps: 0 },
            ..params()
        },
    ];
    for p in cases {
        let err = StructureNormalEstimator::new(p.clone()).err();
        assert!(
            matches!(err, Some(SneError::BadConfiguration(_))),
            "{p:?} should be rejected"
        );
    }
}

#[test]
fn bias_correction_is_disabled_without_normals() {
    let plane = PlaneSpec::new(140.0, 30.0);
    let trace = noisy_plane_trace(&plane, Vector3::zeros(), 120, 0.005, 4);
    let bare = without_normals(&trace);
    let estimator = StructureNormalEstimator::new(params()).unwrap();

    let with = estimator
        .estimate_region(SurfaceKind::Lower, &Region::from(trace), &[], &NeverCancel)
        .unwrap();
    let without = estimator
        .estimate_region(SurfaceKind::Lower, &Region::from(bare), &[], &NeverCancel)
        .unwrap();
    assert!(with.diagnostics.bias_correction);
    assert!(!without.diagnostics.bias_correction);
    assert!(without.channels.normal.iter().all(Option::is_some));
}

#[test]
fn marginalized_alpha_recovers_the_plane() {
    let plane = PlaneSpec::new(140.0, 30.0);
    let trace = noisy_plane_trace(&plane, Vector3::zeros(), 150, 0.005, 6);
    let estimator = StructureNormalEstimator::new(EstimatorParams {
        alpha: AlphaTreatment::Marginalize { steps: 16 },
        ..params()
    })
    .unwrap();
    let out = estimator
        .estimate_region(SurfaceKind::Lower, &Region::from(trace), &[], &NeverCancel)
        .unwrap();
    let pole = plane.pole();
    for n in out.channels.normal[20..130].iter().flatten() {
        assert!(structure_normals::angle::angle_between_dirless(n, &pole).to_degrees() < 5.0);
    }
}

#[test]
fn runs_from_config_and_json_files() {
    let dir = std::env::temp_dir()
        .join(format!("structure-normals-pipeline-{}", std::process::id()));
    let datasets_path = dir.join("datasets.json");
    let report_path = dir.join("out").join("report.json");
    let config_path = dir.join("config.json");

    write_json_file(&datasets_path, &vec![trace_dataset("cfg", 100, 12)]).unwrap();
    let config = serde_json::json!({
        "input": datasets_path,
        "output": report_path,
        "params": { "min_size": 20, "max_size": 60 }
    });
    write_json_file(&config_path, &config).unwrap();

    let config = load_config(&config_path).unwrap();
    assert_eq!(config.params.min_size, 20);
    assert!(config.params.use_bias_correction);

    let json = std::fs::read_to_string(&config.input).unwrap();
    let datasets = parse_datasets(&json).unwrap();
    let estimator = StructureNormalEstimator::new(config.params.clone()).unwrap();
    let report = estimator.run(&datasets, &NeverCancel);
    write_json_file(&config.output, &report).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    let channels = &written["datasets"][0]["surfaces"][0]["channels"];
    assert_eq!(channels["SegmentID"].as_array().unwrap().len(), 100);
    assert_eq!(channels["Weight"].as_array().unwrap().len(), 100);
    assert!(channels.get("Thickness").is_none());
    let _ = std::fs::remove_dir_all(dir);
}
