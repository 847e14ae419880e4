//! Integration tests for the Hippocampus facade

#[path = "../common/mod.rs"]
mod common;

mod boundary;
mod crash_recovery;
mod search_properties;
