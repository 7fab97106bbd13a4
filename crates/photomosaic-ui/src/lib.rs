#![warn(missing_docs)]
//! # photomosaic-ui
//!
//! ## Purpose
//! Defines the UI-facing state model for the generation and capture screens.
//!
//! ## Responsibilities
//! - Derive the single [`WorkflowState`] from in-flight status and the last
//!   settled outcome.
//! - Project controller state into display-ready [`GeneratorView`] and
//!   [`CaptureView`] values.
//! - Hold the user-facing copy (button labels, generic failure message).
//!
//! ## Data flow
//! Controller events -> app projection -> [`GeneratorView`] -> rendered by a
//! front-end (the CLI prints it line by line).
//!
//! ## Ownership and lifetimes
//! Views own all strings so front-ends can keep them across event-loop turns.
//!
//! ## Error model
//! This crate favors explicit state over recoverable errors.

use photomosaic_core::DOWNLOAD_FILE_NAME;

/// Message shown for every failed generation attempt.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "An error occurred while generating the mosaic. Please try again.";
/// Submit button label while idle.
pub const SUBMIT_LABEL: &str = "Generate Mosaic";
/// Submit button label while a request is in flight.
pub const SUBMITTING_LABEL: &str = "Generating...";
/// Capture button label.
pub const CAPTURE_LABEL: &str = "Capture Photo";
/// Retake button label.
pub const RETAKE_LABEL: &str = "Retake";
/// Accept button label.
pub const ACCEPT_LABEL: &str = "Use Photo";

/// Kind of the last settled generation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// The service returned an image.
    Success,
    /// The attempt failed.
    Failed,
}

/// Generation workflow state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// Nothing submitted yet.
    Idle,
    /// A request is in flight.
    Submitting,
    /// The last request returned an image.
    Success,
    /// The last request failed.
    Failed,
}

impl WorkflowState {
    /// Derives the state; an in-flight request masks any earlier outcome.
    pub fn derive(in_flight: bool, last_outcome: Option<OutcomeKind>) -> Self {
        if in_flight {
            return Self::Submitting;
        }
        match last_outcome {
            None => Self::Idle,
            Some(OutcomeKind::Success) => Self::Success,
            Some(OutcomeKind::Failed) => Self::Failed,
        }
    }

    /// Returns `true` while a request is in flight.
    pub fn is_busy(self) -> bool {
        self == Self::Submitting
    }
}

/// Display projection of the generation screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorView {
    /// Current workflow state.
    pub state: WorkflowState,
    /// Input slot status line.
    pub input_status: String,
    /// Pool slot status line.
    pub pool_status: String,
    /// Stride field text.
    pub stride_text: String,
    /// Output width field text.
    pub output_width_text: String,
    /// Submit button label.
    pub submit_label: &'static str,
    /// Whether the submit button is enabled.
    pub submit_enabled: bool,
    /// Error line, if any.
    pub error: Option<String>,
    /// Reference to the rendered result, if any.
    pub result_url: Option<String>,
    /// Suggested download file name.
    pub download_name: &'static str,
}

impl GeneratorView {
    /// Creates the projection of an untouched generation screen.
    pub fn new(stride_text: impl Into<String>, output_width_text: impl Into<String>) -> Self {
        Self {
            state: WorkflowState::Idle,
            input_status: input_status_text(None),
            pool_status: pool_status_text(0),
            stride_text: stride_text.into(),
            output_width_text: output_width_text.into(),
            submit_label: SUBMIT_LABEL,
            submit_enabled: true,
            error: None,
            result_url: None,
            download_name: DOWNLOAD_FILE_NAME,
        }
    }

    /// Applies the workflow state to the submit affordance.
    pub fn set_state(&mut self, state: WorkflowState) {
        self.state = state;
        self.submit_enabled = !state.is_busy();
        self.submit_label = if state.is_busy() {
            SUBMITTING_LABEL
        } else {
            SUBMIT_LABEL
        };
    }

    /// Renders the view as plain text lines.
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Input Image: {}", self.input_status),
            format!("Pool Images: {}", self.pool_status),
            format!("Stride: {}", self.stride_text),
            format!("Output Width: {}", self.output_width_text),
            format!(
                "[{}]{}",
                self.submit_label,
                if self.submit_enabled { "" } else { " (disabled)" }
            ),
        ];
        if let Some(error) = &self.error {
            lines.push(format!("Error: {error}"));
        }
        if let Some(url) = &self.result_url {
            lines.push(format!("Generated Mosaic: {url}"));
            lines.push(format!("Download Mosaic as {}", self.download_name));
        }
        lines
    }
}

/// Returns the input slot status line.
pub fn input_status_text(selected_file: Option<&str>) -> String {
    match selected_file {
        Some(name) => format!("Image selected ({name})"),
        None => "No image selected".to_string(),
    }
}

/// Returns the pool slot status line.
pub fn pool_status_text(count: usize) -> String {
    match count {
        0 => "No pool images".to_string(),
        1 => "1 pool image".to_string(),
        n => format!("{n} pool images"),
    }
}

/// Display projection of the capture screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureView {
    /// Whether a still is shown instead of the live preview.
    pub showing_still: bool,
    /// Available actions, in display order.
    pub actions: Vec<&'static str>,
}

impl CaptureView {
    /// Projects the capture screen from whether a still is pending.
    pub fn new(has_still: bool) -> Self {
        let actions = if has_still {
            vec![RETAKE_LABEL, ACCEPT_LABEL]
        } else {
            vec![CAPTURE_LABEL]
        };
        Self {
            showing_still: has_still,
            actions,
        }
    }
}
