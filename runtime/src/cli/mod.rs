//! CLI subcommand implementations for the `bazaar-ingest` binary.

pub mod doctor;
pub mod inspect_cmd;
pub mod output;
pub mod pipeline_cmd;
