//! JSON I/O for datasets and reports.
//!
//! - `read_datasets`: load a JSON array of datasets, or a single dataset.
//! - `write_json_file`: pretty-print a serializable value to disk.
use crate::input::Dataset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum DatasetDocument {
    Many(Vec<Dataset>),
    One(Dataset),
}

/// Read the datasets stored in a JSON file.
pub fn read_datasets(path: &Path) -> Result<Vec<Dataset>, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read datasets {}: {e}", path.display()))?;
    parse_datasets(&contents)
        .map_err(|e| format!("Failed to parse datasets {}: {e}", path.display()))
}

/// Parse datasets from JSON text.
pub fn parse_datasets(json: &str) -> Result<Vec<Dataset>, serde_json::Error> {
    Ok(match serde_json::from_str::<DatasetDocument>(json)? {
        DatasetDocument::Many(datasets) => datasets,
        DatasetDocument::One(dataset) => vec![dataset],
    })
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_single_dataset_or_array() {
        let one = r#"{ "kind": "trace", "trace": { "points": [] } }"#;
        assert_eq!(parse_datasets(one).unwrap().len(), 1);
        let many = format!("[{one}, {one}]");
        assert_eq!(parse_datasets(&many).unwrap().len(), 2);
        assert!(parse_datasets("{}").is_err());
    }

    #[test]
    fn writes_into_missing_directories() {
        let dir = std::env::temp_dir().join(format!("structure-normals-io-{}", std::process::id()));
        let path = dir.join("nested").join("out.json");
        write_json_file(&path, &vec![1, 2, 3]).unwrap();
        let back: Vec<i32> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, vec![1, 2, 3]);
        let _ = fs::remove_dir_all(dir);
    }
}
