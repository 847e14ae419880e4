//! String → input parsing rules.
//!
//! - Vectors use the bracketed literal form, e.g. `[1.0, 2.0, 3.0]`
//! - Metadata and filters must be JSON objects
//! - Payloads are stored as their UTF-8 bytes

use hippocampus::Vector;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::path::Path;

/// Parse a vector literal like `[1.0, 2.0, 3.0]`.
pub fn parse_vector(s: &str) -> Result<Vector, String> {
    Vector::parse(s).map_err(|e| format!("Invalid vector literal: {}", e))
}

/// Strict JSON object parsing for metadata and filters.
pub fn parse_json_object(s: &str) -> Result<JsonValue, String> {
    let json: JsonValue = serde_json::from_str(s).map_err(|e| format!("Invalid JSON: {}", e))?;
    if !json.is_object() {
        return Err("Expected a JSON object".to_string());
    }
    Ok(json)
}

/// One entry of an `insert-json` batch file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BatchFileItem {
    pub vector: Vec<f32>,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub metadata: Option<JsonValue>,
}

/// Read a batch file: a JSON array of [`BatchFileItem`].
pub fn load_batch_file(path: &Path) -> Result<Vec<BatchFileItem>, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    parse_batch(&content).map_err(|e| format!("{}: {}", path.display(), e))
}

fn parse_batch(content: &str) -> Result<Vec<BatchFileItem>, String> {
    serde_json::from_str(content).map_err(|e| format!("Invalid batch file: {}", e))
}
