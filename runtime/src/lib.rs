// Copyright 2026 Bazaar Assistant Contributors
// SPDX-License-Identifier: Apache-2.0

//! Bazaar ingest runtime: reference-data acquisition for the Bazaar assistant.
//!
//! Pages are fetched from the static wiki over HTTP and from the companion
//! site through a headless browser, extracted into normalized records,
//! checkpointed as JSON, and imported idempotently into SQLite.

#![allow(clippy::new_without_default)]

pub mod acquisition;
pub mod checkpoint;
pub mod cli;
pub mod config;
pub mod error;
pub mod extraction;
pub mod import;
pub mod pipeline;
pub mod renderer;
pub mod scrape;
pub mod store;
