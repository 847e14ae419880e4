//! ArgMatches → CliAction conversion.
//!
//! Literal inputs (vectors, JSON documents) are parsed here so that a typo is
//! reported before the catalog is opened.

use std::path::PathBuf;

use clap::ArgMatches;
use hippocampus::{DistanceMetric, Vector, DEFAULT_TOP_K};
use serde_json::Value as JsonValue;

use crate::value::{parse_json_object, parse_vector};

/// The result of parsing user input.
#[derive(Debug, Clone, PartialEq)]
pub enum CliAction {
    Create {
        name: String,
        dim: u32,
        metric: Option<DistanceMetric>,
    },
    Insert {
        name: String,
        vector: Vector,
        value: Vec<u8>,
        metadata: Option<JsonValue>,
    },
    InsertJson {
        name: String,
        file: PathBuf,
    },
    Search {
        name: String,
        vector: Vector,
        epsilon: f32,
        threshold: f32,
        top_k: u32,
        filter: Option<JsonValue>,
    },
    Info {
        name: String,
    },
    List,
    Drop {
        name: String,
    },
}

/// Convert clap ArgMatches into a CliAction.
pub fn matches_to_action(matches: &ArgMatches) -> Result<CliAction, String> {
    let (sub_name, sub) = matches
        .subcommand()
        .ok_or_else(|| "No command provided".to_string())?;

    match sub_name {
        "create" => Ok(CliAction::Create {
            name: name_arg(sub)?,
            dim: *sub
                .get_one::<u32>("dim")
                .ok_or_else(|| "Missing dimension".to_string())?,
            metric: sub
                .get_one::<String>("metric")
                .map(|m| {
                    DistanceMetric::parse(m).ok_or_else(|| format!("Unknown metric: {}", m))
                })
                .transpose()?,
        }),
        "insert" => Ok(CliAction::Insert {
            name: name_arg(sub)?,
            vector: parse_vector(string_arg(sub, "vector")?)?,
            value: string_arg(sub, "value")?.as_bytes().to_vec(),
            metadata: optional_json(sub, "metadata")?,
        }),
        "insert-json" => Ok(CliAction::InsertJson {
            name: name_arg(sub)?,
            file: PathBuf::from(string_arg(sub, "file")?),
        }),
        "search" => Ok(CliAction::Search {
            name: name_arg(sub)?,
            vector: parse_vector(string_arg(sub, "vector")?)?,
            epsilon: sub.get_one::<f32>("epsilon").copied().unwrap_or(f32::INFINITY),
            threshold: sub
                .get_one::<f32>("threshold")
                .copied()
                .unwrap_or(f32::INFINITY),
            top_k: sub.get_one::<u32>("top-k").copied().unwrap_or(DEFAULT_TOP_K),
            filter: optional_json(sub, "filter")?,
        }),
        "info" => Ok(CliAction::Info {
            name: name_arg(sub)?,
        }),
        "list" => Ok(CliAction::List),
        "drop" => Ok(CliAction::Drop {
            name: name_arg(sub)?,
        }),
        other => Err(format!("Unknown command: {}", other)),
    }
}

fn string_arg<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a str, String> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .ok_or_else(|| format!("Missing argument: {}", id))
}

fn name_arg(matches: &ArgMatches) -> Result<String, String> {
    string_arg(matches, "name").map(str::to_string)
}

fn optional_json(matches: &ArgMatches, id: &str) -> Result<Option<JsonValue>, String> {
    matches
        .get_one::<String>(id)
        .map(|s| parse_json_object(s))
        .transpose()
}
