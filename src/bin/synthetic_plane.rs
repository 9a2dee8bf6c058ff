use nalgebra::Vector3;
use structure_normals::angle::{angle_between_dirless, pole_from_dip};
use structure_normals::io::write_json_file;
use structure_normals::{
    Dataset, EstimatorParams, NeverCancel, Region, StructureNormalEstimator, SurfaceKind, Trace,
    TracePoint,
};
use std::path::Path;

const SAMPLES: usize = 600;
const DIP_DIRECTION_DEG: f64 = 135.0;
const DIP_DEG: f64 = 30.0;
const THICKNESS: f64 = 4.0;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let pole = pole_from_dip(DIP_DIRECTION_DEG.to_radians(), DIP_DEG.to_radians());
    let lower = wavy_trace(&pole, Vector3::zeros());
    // Upper contact sits THICKNESS above the lower one, opposite the downward pole.
    let upper = wavy_trace(&pole, -pole * THICKNESS);

    let dataset = Dataset::GeoObject {
        name: Some("synthetic-plane".into()),
        lower: Region::from(lower),
        upper: Some(Region::from(upper)),
        pinch_nodes: Vec::new(),
    };

    let params = EstimatorParams {
        min_size: 30,
        max_size: 120,
        cutoff_distance: 2.0 * THICKNESS,
        ..Default::default()
    };
    let estimator = StructureNormalEstimator::new(params).map_err(|e| e.to_string())?;
    let report = estimator.run(std::slice::from_ref(&dataset), &NeverCancel);

    let ds = report.datasets.first().ok_or("No dataset produced estimates")?;
    for kind in [SurfaceKind::Lower, SurfaceKind::Upper] {
        let Some(surface) = ds.surface(kind) else {
            println!("{kind}: skipped");
            continue;
        };
        let errors: Vec<f64> = surface
            .channels
            .normal
            .iter()
            .flatten()
            .map(|n| angle_between_dirless(n, &pole).to_degrees())
            .collect();
        let mean_err = errors.iter().sum::<f64>() / errors.len().max(1) as f64;
        let thickness = surface
            .channels
            .thickness
            .as_ref()
            .map(|t| t.iter().sum::<f64>() / t.len().max(1) as f64);
        println!(
            "{kind}: estimated={}/{} mean_normal_error_deg={:.3} mean_thickness={}",
            errors.len(),
            surface.channels.len(),
            mean_err,
            thickness.map_or("-".to_string(), |t| format!("{t:.3}"))
        );
    }

    let out = Path::new("out/synthetic_plane.json");
    write_json_file(out, &report)?;
    println!("Saved report to {}", out.display());
    Ok(())
}

/// Sinusoidal trace lying in the plane with downward pole `pole`, shifted by
/// `offset`, with a small deterministic off-plane wobble.
fn wavy_trace(pole: &Vector3<f64>, offset: Vector3<f64>) -> Trace {
    let strike = pole.cross(&Vector3::z()).normalize();
    let dip_line = pole.cross(&strike).normalize();
    let points = (0..SAMPLES)
        .map(|i| {
            let s = i as f64 * 0.1;
            let wobble = 0.01 * (s * 7.3).sin() * (s * 2.1).cos();
            let position = offset + strike * s + dip_line * (2.0 * (s * 0.4).sin()) + pole * wobble;
            // Outcrop faces horizontally, across the strike.
            let outcrop = Vector3::new(dip_line.x, dip_line.y, 0.0).normalize();
            TracePoint::new(position, Some(outcrop))
        })
        .collect();
    Trace::new(points)
}
