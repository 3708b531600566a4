//! CLI support for sift-lang
//!
//! Runs queries against JSON documents, with the record type inferred from
//! the documents themselves.

mod check;
mod filter;

pub use check::{CheckOptions, execute_check};
pub use filter::{FilterOptions, execute_filter};

use std::io;

use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::CompileError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Compile(#[from] CompileError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,
}

/// The documents to query: the elements of a top-level array, or the single
/// top-level value.
pub fn documents(input: Option<&str>) -> Result<Vec<JsonValue>, CliError> {
    let text = input.ok_or(CliError::NoInput)?;
    Ok(match serde_json::from_str(text)? {
        JsonValue::Array(items) => items,
        other => vec![other],
    })
}
