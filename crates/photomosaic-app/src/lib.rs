#![warn(missing_docs)]
//! # photomosaic-app
//!
//! ## Purpose
//! Orchestrates acquisition, packaging, dispatch and result presentation for
//! `photomosaic`.
//!
//! ## Responsibilities
//! - Own the generation workflow state machine ([`WorkflowController`]).
//! - Own the lifetime of the generated image reference ([`ResultPresenter`]).
//! - Dispatch requests off the owning thread ([`DispatchRuntime`]).
//! - Resolve runtime configuration ([`AppConfig`]).
//!
//! ## Data flow
//! Capture hand-off or file selection + pool selection -> controller slots ->
//! `submit` -> worker thread -> service -> `settle` -> presenter -> view.
//!
//! ## Ownership and lifetimes
//! All workflow state lives on one thread. Worker threads only see an owned
//! [`photomosaic_request::GenerationRequest`] and send back an owned outcome.
//!
//! ## Error model
//! Failed attempts are recorded on the controller and never abort the
//! process. [`AppError`] is reserved for setup failures around the workflow.

mod config;
mod controller;
mod presenter;
mod runtime;

use std::path::{Path, PathBuf};

use log::{info, warn};
use photomosaic_capture::{
    CameraDevice, CaptureError, CaptureSession, Handoff, acquire_from_file, expand_selection,
};
use photomosaic_core::{ImageArtifact, ValidationError};
use photomosaic_transport::TransportError;
use thiserror::Error;

pub use config::{AppConfig, OUT_DIR_ENV, SERVICE_URL_ENV};
pub use controller::{Dispatch, RequestToken, Settlement, WorkflowController};
pub use presenter::{BlobRegistry, ObjectUrl, ResultPresenter};
pub use runtime::{Completion, DispatchRuntime};

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("PHOTOMOSAIC_VERSION");

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Reads a pool selection of files and directories.
///
/// # Errors
/// Returns [`AppError::Capture`] when a path cannot be listed or read.
pub fn acquire_pool(paths: &[PathBuf]) -> Result<Vec<ImageArtifact>, AppError> {
    let files = expand_selection(paths)?;
    let mut images = Vec::with_capacity(files.len());
    for path in &files {
        images.push(acquire_from_file(path)?);
    }
    info!("acquired {} pool images", images.len());
    Ok(images)
}

/// Runs one capture-and-accept pass on the capture screen.
///
/// Returns `Ok(None)` when the device had no frame or produced a still that
/// does not decode; the caller stays on the capture screen. A bad still is
/// only logged.
///
/// # Errors
/// Returns [`AppError::Capture`] for capture failures other than a malformed
/// still.
pub fn capture_handoff(device: &dyn CameraDevice) -> Result<Option<Handoff>, AppError> {
    let mut session = CaptureSession::new();
    if !session.capture(device) {
        return Ok(None);
    }
    match session.accept() {
        Ok(handoff) => Ok(handoff),
        Err(CaptureError::InvalidDataUri(reason)) => {
            warn!(
                "discarding undecodable still from {}: {reason}",
                device.describe().id
            );
            Ok(None)
        }
        Err(other) => Err(other.into()),
    }
}

/// Writes an artifact into `dir` under its own file name.
///
/// # Errors
/// Returns [`AppError::Io`] when the directory or file cannot be written.
pub fn save_artifact(artifact: &ImageArtifact, dir: &Path) -> Result<PathBuf, AppError> {
    write_file(dir, artifact.file_name(), artifact.bytes())
}

pub(crate) fn write_file(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
    std::fs::create_dir_all(dir).map_err(|source| AppError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(file_name);
    std::fs::write(&path, bytes).map_err(|source| AppError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Acquisition failure.
    #[error("capture error: {0}")]
    Capture(#[from] CaptureError),
    /// Transport setup or endpoint failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Submission rejected before reaching the network.
    #[error("{0}")]
    Validation(#[from] ValidationError),
    /// Download requested before any mosaic was generated.
    #[error("no generated mosaic to download")]
    NothingToDownload,
    /// Filesystem failure while saving output.
    #[error("cannot write {path}: {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The request manifest could not be rendered.
    #[error("cannot render request manifest: {0}")]
    Manifest(#[from] serde_json::Error),
    /// The command line names an impossible combination.
    #[error("{0}")]
    Usage(String),
    /// A dispatch worker could not be started.
    #[error("dispatch worker failure: {0}")]
    Worker(String),
}
