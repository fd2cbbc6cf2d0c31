use fund_pair_core::returns::dataset::{Dataset, Row};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Read a JSON file as a generic serde_json::Value.
pub fn read_json_value(path: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: Value = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Read a CSV file with a header row into a dataset.
///
/// Cells are kept as raw strings; blank cells become missing observations
/// when the return matrix is built.
pub fn read_csv_dataset(path: &str) -> Result<Dataset, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;

    let columns: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut rows: Vec<Row> = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| format!("Failed to parse '{}' row {}: {}", canonical.display(), idx + 2, e))?;
        let row: Row = columns
            .iter()
            .zip(record.iter())
            .map(|(col, cell)| (col.clone(), Value::String(cell.to_string())))
            .collect();
        rows.push(row);
    }

    Ok(Dataset::new(columns, rows))
}

/// True when the path names a CSV file.
pub fn is_csv(path: &str) -> bool {
    Path::new(path)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Resolve and validate the path, preventing directory traversal.
fn resolve_path(path: &str) -> Result<std::path::PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    // Basic existence check
    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}
