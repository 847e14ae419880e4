//! hippo: command-line client for Hippocampus.
//!
//! Shell mode only: `hippo [--db DIR] [--json] COMMAND`, one command per
//! process. Logs go to stderr, filtered by `HIPPO_LOG` (default `warn`).

mod commands;
mod format;
mod parse;
mod value;

use std::path::Path;
use std::process;

use anyhow::Context;
use hippocampus::{BatchItem, Hippocampus};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{format_error, format_outcome, Outcome, OutputMode};
use parse::{matches_to_action, CliAction};
use value::load_batch_file;

const DEFAULT_DB_PATH: &str = ".hippocampus";

fn main() {
    init_logging();

    let matches = build_cli().get_matches();
    let output_mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    // Parse literals before touching the catalog
    let action = match matches_to_action(&matches) {
        Ok(action) => action,
        Err(e) => {
            eprintln!("{}", format_error(&e, output_mode));
            process::exit(2);
        }
    };

    let path = matches
        .get_one::<String>("db")
        .map(|s| s.as_str())
        .unwrap_or(DEFAULT_DB_PATH);

    let result = Hippocampus::open(path)
        .with_context(|| format!("Failed to open catalog at {}", path))
        .and_then(|db| execute(&db, action));

    match result {
        Ok(outcome) => {
            println!("{}", format_outcome(&outcome, output_mode));
        }
        Err(e) => {
            eprintln!("{}", format_error(&format!("{:#}", e), output_mode));
            process::exit(1);
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("HIPPO_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(db: &Hippocampus, action: CliAction) -> anyhow::Result<Outcome> {
    debug!(target: "hippocampus::cli", ?action, "Executing");
    let outcome = match action {
        CliAction::Create { name, dim, metric } => {
            match metric {
                Some(metric) => db.create_index_with_metric(&name, dim, metric)?,
                None => db.create_index(&name, dim)?,
            }
            Outcome::Created(db.index_info(&name)?)
        }
        CliAction::Insert {
            name,
            vector,
            value,
            metadata,
        } => {
            let id = db.insert(&name, &vector.encode(), &value, metadata.as_ref())?;
            Outcome::Inserted(vec![id])
        }
        CliAction::InsertJson { name, file } => insert_json(db, &name, &file)?,
        CliAction::Search {
            name,
            vector,
            epsilon,
            threshold,
            top_k,
            filter,
        } => Outcome::Matches(db.search(
            &name,
            &vector.encode(),
            epsilon,
            threshold,
            top_k,
            filter.as_ref(),
        )?),
        CliAction::Info { name } => Outcome::Info(db.index_info(&name)?),
        CliAction::List => Outcome::List(db.list_indexes()?),
        CliAction::Drop { name } => {
            db.drop_index(&name)?;
            Outcome::Dropped(name)
        }
    };
    db.flush()?;
    Ok(outcome)
}

fn insert_json(db: &Hippocampus, name: &str, file: &Path) -> anyhow::Result<Outcome> {
    let items = load_batch_file(file).map_err(anyhow::Error::msg)?;
    let encoded: Vec<Vec<u8>> = items
        .iter()
        .map(|item| hippocampus::Vector::new(item.vector.clone()).encode())
        .collect();
    let batch: Vec<BatchItem<'_>> = items
        .iter()
        .zip(&encoded)
        .map(|(item, vector)| BatchItem {
            vector,
            value: item.value.as_bytes(),
            metadata: item.metadata.as_ref(),
        })
        .collect();

    let ids = db
        .batch_insert(name, &batch)
        .with_context(|| format!("Batch from {} rejected", file.display()))?;
    Ok(Outcome::Inserted(ids))
}
