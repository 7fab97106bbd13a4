#![warn(missing_docs)]
//! # photomosaic-contract-tests
//!
//! ## Purpose
//! Locates and loads the frozen JSON contracts under the workspace
//! `contracts/` directory.
//!
//! ## Responsibilities
//! - Resolve schema and fixture paths independent of the test's working
//!   directory.
//! - Load JSON documents for validation with `jsonschema`.
//!
//! ## Error model
//! Loading failures are returned as [`ContractError`]; the tests decide how to
//! report them.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

/// Schema of the dry-run request manifest.
pub const PAYLOAD_MANIFEST_SCHEMA: &str = "payload-manifest.schema.json";
/// Schema of the service's JSON error body.
pub const SERVICE_ERROR_SCHEMA: &str = "service-error.schema.json";

/// Returns the workspace `contracts/` directory.
pub fn contracts_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../contracts")
}

/// Returns the path of a schema file.
pub fn schema_path(name: &str) -> PathBuf {
    contracts_dir().join(name)
}

/// Returns the path of a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
    contracts_dir().join("fixtures").join(name)
}

/// Reads and parses one JSON document.
///
/// # Errors
/// Returns [`ContractError::Read`] or [`ContractError::Parse`].
pub fn load_json(path: &Path) -> Result<Value, ContractError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ContractError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ContractError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Contract loading error.
#[derive(Debug, Error)]
pub enum ContractError {
    /// The file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid JSON.
    #[error("invalid json in {path}: {source}")]
    Parse {
        /// Offending path.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}
