//! Batch mirror for JVO ALMA FITS Archive projects.
//!
//! Pipeline: fetch the per-project results page, extract dataset
//! records from the authoritative table, derive thumbnail and data
//! portal links, then download idempotently with per-item outcome
//! reporting.

pub mod app;
pub mod archive;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod links;
pub mod output;
pub mod store;
