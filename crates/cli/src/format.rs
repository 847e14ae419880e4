//! Outcome → human/json string formatting.
//!
//! Two modes:
//! - **Human** (default): short text lines, e.g. `(id) 3`, `1) #0 d=0.000000 "payload"`
//! - **JSON** (`--json`): `serde_json::to_string_pretty`

use hippocampus::{IndexInfo, RecordId, SearchMatch};
use serde_json::json;

/// Output formatting mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Result of one executed command.
#[derive(Debug, Clone)]
pub enum Outcome {
    Created(IndexInfo),
    Inserted(Vec<RecordId>),
    Matches(Vec<SearchMatch>),
    Info(IndexInfo),
    List(Vec<String>),
    Dropped(String),
}

/// Format a successful outcome.
pub fn format_outcome(outcome: &Outcome, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => format_json(outcome),
        OutputMode::Human => format_human(outcome),
    }
}

/// Format an error.
pub fn format_error(message: &str, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => serde_json::to_string_pretty(&json!({ "error": message }))
            .unwrap_or_else(|_| format!("{{\"error\": {:?}}}", message)),
        OutputMode::Human => format!("(error) {}", message),
    }
}

fn format_human(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Created(info) => format!(
            "OK {} (dim={}, metric={})",
            info.name, info.dim, info.metric
        ),
        Outcome::Inserted(ids) if ids.len() == 1 => format!("(id) {}", ids[0]),
        Outcome::Inserted(ids) => match (ids.first(), ids.last()) {
            (Some(first), Some(last)) => {
                format!("(inserted) {} records, ids {}..={}", ids.len(), first, last)
            }
            _ => "(inserted) 0 records".to_string(),
        },
        Outcome::Matches(matches) if matches.is_empty() => "(empty)".to_string(),
        Outcome::Matches(matches) => matches
            .iter()
            .enumerate()
            .map(|(i, m)| {
                let mut line = format!(
                    "{}) #{} d={:.6} {:?}",
                    i + 1,
                    m.record_id,
                    m.distance,
                    String::from_utf8_lossy(&m.value)
                );
                if let Some(meta) = &m.metadata {
                    line.push(' ');
                    line.push_str(&meta.to_string());
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Outcome::Info(info) => format!(
            "name: {}\ndim: {}\nmetric: {}\nrecords: {}\ncreated: {}",
            info.name,
            info.dim,
            info.metric,
            info.record_count,
            info.created_at.to_rfc3339()
        ),
        Outcome::List(names) if names.is_empty() => "(empty)".to_string(),
        Outcome::List(names) => names
            .iter()
            .enumerate()
            .map(|(i, n)| format!("{}) {}", i + 1, n))
            .collect::<Vec<_>>()
            .join("\n"),
        Outcome::Dropped(name) => format!("OK dropped {}", name),
    }
}

fn format_json(outcome: &Outcome) -> String {
    let value = match outcome {
        Outcome::Created(info) | Outcome::Info(info) => info_json(info),
        Outcome::Inserted(ids) => {
            json!({ "ids": ids.iter().map(RecordId::as_u64).collect::<Vec<_>>() })
        }
        Outcome::Matches(matches) => json!(matches
            .iter()
            .map(|m| json!({
                "id": m.record_id.as_u64(),
                "distance": m.distance,
                "value": String::from_utf8_lossy(&m.value),
                "metadata": m.metadata,
            }))
            .collect::<Vec<_>>()),
        Outcome::List(names) => json!(names),
        Outcome::Dropped(name) => json!({ "dropped": name }),
    };
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}

fn info_json(info: &IndexInfo) -> serde_json::Value {
    json!({
        "name": info.name,
        "dim": info.dim,
        "metric": info.metric.name(),
        "record_count": info.record_count,
        "created_at": info.created_at.to_rfc3339(),
    })
}
