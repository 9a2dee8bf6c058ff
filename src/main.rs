use structure_normals::config::load_config;
use structure_normals::io::{read_datasets, write_json_file};
use structure_normals::{NeverCancel, StructureNormalEstimator};
use std::env;
use std::path::Path;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    let estimator =
        StructureNormalEstimator::new(config.params.clone()).map_err(|e| e.to_string())?;
    let datasets = read_datasets(&config.input)?;
    let report = estimator.run(&datasets, &NeverCancel);

    write_json_file(&config.output, &report)?;

    for warning in &report.warnings {
        eprintln!(
            "warning: dataset {} ({}) {} surface skipped: {}",
            warning.dataset,
            warning.name.as_deref().unwrap_or("-"),
            warning.surface,
            warning.message
        );
    }
    let surfaces: usize = report.datasets.iter().map(|d| d.surfaces.len()).sum();
    println!(
        "datasets={} surfaces={} warnings={} total_ms={:.3}",
        datasets.len(),
        surfaces,
        report.warnings.len(),
        report.timings.total_ms
    );
    println!("Saved report to {}", config.output.display());
    Ok(())
}

fn usage() -> String {
    "Usage: structure-normals <config.json>".to_string()
}
