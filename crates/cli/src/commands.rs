//! Clap command tree definition.

use clap::{Arg, ArgAction, Command};

/// Build the complete CLI command tree.
pub fn build_cli() -> Command {
    Command::new("hippo")
        .about("Command-line client for Hippocampus vector indexes")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("db")
                .long("db")
                .help("Catalog directory (default: .hippocampus)")
                .global(true),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output mode")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(build_create())
        .subcommand(build_insert())
        .subcommand(build_insert_json())
        .subcommand(build_search())
        .subcommand(build_info())
        .subcommand(build_list())
        .subcommand(build_drop())
}

fn build_create() -> Command {
    Command::new("create")
        .about("Create an index (no-op if it exists with the same dimension)")
        .arg(Arg::new("name").required(true))
        .arg(
            Arg::new("dim")
                .required(true)
                .value_parser(clap::value_parser!(u32).range(1..)),
        )
        .arg(
            Arg::new("metric")
                .long("metric")
                .help("euclidean (default) or cosine")
                .value_parser(["euclidean", "cosine"]),
        )
}

fn build_insert() -> Command {
    Command::new("insert")
        .about("Insert one record")
        .arg(Arg::new("name").required(true))
        .arg(
            Arg::new("vector")
                .required(true)
                .help("Vector literal, e.g. \"[0.1, 0.2, 0.3]\"")
                .allow_hyphen_values(true),
        )
        .arg(Arg::new("value").required(true).help("Payload (stored as UTF-8)"))
        .arg(
            Arg::new("metadata")
                .long("metadata")
                .help("Metadata as a JSON object"),
        )
}

fn build_insert_json() -> Command {
    Command::new("insert-json")
        .about("Insert a batch read from a JSON file")
        .long_about(
            "Insert a batch read from a JSON file.\n\n\
             The file holds an array of {\"vector\": [..], \"value\": \"..\", \"metadata\": {..}}.\n\
             The batch is all-or-nothing.",
        )
        .arg(Arg::new("name").required(true))
        .arg(Arg::new("file").required(true))
}

fn build_search() -> Command {
    Command::new("search")
        .about("Nearest records within a distance bound")
        .arg(Arg::new("name").required(true))
        .arg(
            Arg::new("vector")
                .required(true)
                .help("Query vector literal")
                .allow_hyphen_values(true),
        )
        .arg(
            Arg::new("epsilon")
                .long("epsilon")
                .help("Maximum distance (default: unbounded)")
                .value_parser(clap::value_parser!(f32))
                .allow_hyphen_values(true),
        )
        .arg(
            Arg::new("threshold")
                .long("threshold")
                .help("Acceptance distance (default: unbounded)")
                .value_parser(clap::value_parser!(f32))
                .allow_hyphen_values(true),
        )
        .arg(
            Arg::new("top-k")
                .long("top-k")
                .short('k')
                .help("Maximum number of results (default: 10)")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            Arg::new("filter")
                .long("filter")
                .help("Exact-match metadata filter as a JSON object"),
        )
}

fn build_info() -> Command {
    Command::new("info")
        .about("Show index dimension, metric and record count")
        .arg(Arg::new("name").required(true))
}

fn build_list() -> Command {
    Command::new("list").about("List indexes")
}

fn build_drop() -> Command {
    Command::new("drop")
        .about("Drop an index and delete its data")
        .arg(Arg::new("name").required(true))
}
