//! Generation workflow state machine.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use photomosaic_capture::Handoff;
use photomosaic_core::{
    DEFAULT_OUTPUT_WIDTH, DEFAULT_STRIDE, GeneratedImage, GenerationParameters, ImageArtifact,
    PoolCollection, ValidationError,
};
use photomosaic_request::{GenerationRequest, build_request_from_text, request_fingerprint};
use photomosaic_transport::{GenerationClient, TransportError};
use photomosaic_ui::{
    GENERIC_FAILURE_MESSAGE, GeneratorView, OutcomeKind, WorkflowState, input_status_text,
    pool_status_text,
};

use crate::AppError;
use crate::presenter::{ObjectUrl, ResultPresenter};

/// Identity of one dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(u64);

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request accepted for dispatch.
#[derive(Debug, Clone)]
pub struct Dispatch {
    /// Token that must accompany the outcome.
    pub token: RequestToken,
    /// Request fingerprint, for log correlation.
    pub fingerprint: String,
    /// Immutable request to send.
    pub request: GenerationRequest,
}

/// What happened to a delivered outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// The outcome belonged to the latest dispatch and was applied.
    Applied(WorkflowState),
    /// A newer dispatch superseded this one; the outcome was dropped.
    Stale,
}

/// Owner of the generation screen's state.
///
/// Lifecycle: `Idle -> Submitting -> Success | Failed -> Submitting -> ...`.
/// There is no terminal state.
#[derive(Debug)]
pub struct WorkflowController {
    input: Option<ImageArtifact>,
    pool: Option<PoolCollection>,
    stride_text: String,
    output_width_text: String,
    error: Option<String>,
    in_flight: Option<RequestToken>,
    dispatched: u64,
    last_outcome: Option<OutcomeKind>,
    presenter: ResultPresenter,
}

impl WorkflowController {
    /// Creates an empty generation screen with default parameters.
    pub fn new() -> Self {
        Self {
            input: None,
            pool: None,
            stride_text: DEFAULT_STRIDE.to_string(),
            output_width_text: DEFAULT_OUTPUT_WIDTH.to_string(),
            error: None,
            in_flight: None,
            dispatched: 0,
            last_outcome: None,
            presenter: ResultPresenter::new(),
        }
    }

    /// Creates the generation screen from a capture hand-off.
    ///
    /// The hand-off is consumed here and treated like a file selection.
    pub fn with_handoff(handoff: Handoff) -> Self {
        let mut controller = Self::new();
        controller.select_input(handoff.into_artifact());
        controller
    }

    /// Puts an artifact in the input slot, replacing any previous one.
    pub fn select_input(&mut self, artifact: ImageArtifact) {
        info!("input selected: {artifact:?}");
        self.input = Some(artifact);
    }

    /// Applies a single-file picker selection.
    ///
    /// Returns `false` and keeps the current input when the selection is empty.
    pub fn select_input_files(&mut self, selection: Vec<ImageArtifact>) -> bool {
        match selection.into_iter().next() {
            Some(artifact) => {
                self.select_input(artifact);
                true
            }
            None => {
                warn!("ignoring empty input selection");
                false
            }
        }
    }

    /// Clears the input slot.
    pub fn remove_input(&mut self) {
        self.input = None;
    }

    /// Replaces the pool with a picker selection.
    ///
    /// Returns `false` and keeps the current pool when the selection is empty.
    pub fn set_pool(&mut self, selection: Vec<ImageArtifact>) -> bool {
        if selection.is_empty() {
            warn!("ignoring empty pool selection");
            return false;
        }
        info!("pool selected: {} images", selection.len());
        self.pool = Some(PoolCollection::from_selection(selection));
        true
    }

    /// Sets the stride field text as typed.
    pub fn set_stride_text(&mut self, text: impl Into<String>) {
        self.stride_text = text.into();
    }

    /// Sets the output width field text as typed.
    pub fn set_output_width_text(&mut self, text: impl Into<String>) {
        self.output_width_text = text.into();
    }

    /// Sets both numeric fields from values.
    pub fn set_parameters(&mut self, params: GenerationParameters) {
        self.stride_text = params.stride.to_string();
        self.output_width_text = params.output_width.to_string();
    }

    /// Returns the input slot.
    pub fn input(&self) -> Option<&ImageArtifact> {
        self.input.as_ref()
    }

    /// Returns the pool slot.
    pub fn pool(&self) -> Option<&PoolCollection> {
        self.pool.as_ref()
    }

    /// Returns the user-facing error line.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the token of the request in flight.
    pub fn in_flight(&self) -> Option<RequestToken> {
        self.in_flight
    }

    /// Returns the derived workflow state.
    pub fn state(&self) -> WorkflowState {
        WorkflowState::derive(self.in_flight.is_some(), self.last_outcome)
    }

    /// Returns whether the submit affordance is enabled.
    ///
    /// This is advisory: [`WorkflowController::submit`] does not refuse a
    /// second submission, but only the latest dispatch's outcome is applied.
    pub fn submit_enabled(&self) -> bool {
        self.in_flight.is_none()
    }

    /// Returns the reference to the rendered result.
    pub fn result_url(&self) -> Option<&ObjectUrl> {
        self.presenter.current()
    }

    /// Returns the rendered result's bytes.
    pub fn result_bytes(&self) -> Option<&[u8]> {
        self.presenter.inline_bytes()
    }

    /// Returns the result presenter.
    pub fn presenter(&self) -> &ResultPresenter {
        &self.presenter
    }

    /// Saves the rendered result as `mosaic.jpg` inside `dir`.
    ///
    /// # Errors
    /// See [`ResultPresenter::download`].
    pub fn download(&self, dir: &Path) -> Result<PathBuf, AppError> {
        self.presenter.download(dir)
    }

    /// Builds the request the current slots would submit, without submitting.
    ///
    /// # Errors
    /// Returns the first failing [`ValidationError`].
    pub fn preview_request(&self) -> Result<GenerationRequest, ValidationError> {
        build_request_from_text(
            self.input.as_ref(),
            self.pool.as_ref(),
            &self.stride_text,
            &self.output_width_text,
        )
    }

    /// Validates the slots and enters `Submitting`.
    ///
    /// On success the previous result reference is revoked and the error line
    /// cleared before the returned [`Dispatch`] is handed to a transport.
    ///
    /// # Errors
    /// Returns the [`ValidationError`] and records its message; state and the
    /// rendered result are left untouched.
    pub fn submit(&mut self) -> Result<Dispatch, ValidationError> {
        let request = match self.preview_request() {
            Ok(request) => request,
            Err(rejected) => {
                warn!("submission rejected: {rejected}");
                self.error = Some(rejected.to_string());
                return Err(rejected);
            }
        };

        self.error = None;
        self.presenter.release();
        self.last_outcome = None;
        self.dispatched += 1;
        let token = RequestToken(self.dispatched);
        if let Some(superseded) = self.in_flight.replace(token) {
            warn!("request {token} supersedes {superseded} still in flight");
        }

        let fingerprint = request_fingerprint(&request);
        let params = request.params();
        info!(
            "request {token} ({}) submitted: stride={} output_width={} pool={}",
            &fingerprint[..12],
            params.stride,
            params.output_width,
            request.pool().len()
        );

        Ok(Dispatch {
            token,
            fingerprint,
            request,
        })
    }

    /// Applies the outcome of a dispatched request.
    ///
    /// Outcomes for any token other than the latest dispatch are dropped.
    pub fn settle(
        &mut self,
        token: RequestToken,
        outcome: Result<GeneratedImage, TransportError>,
    ) -> Settlement {
        if self.in_flight != Some(token) {
            warn!("dropping outcome of superseded request {token}");
            return Settlement::Stale;
        }
        self.in_flight = None;

        match outcome {
            Ok(image) => {
                let url = self.presenter.present(image);
                info!("request {token} succeeded; result at {url}");
                self.last_outcome = Some(OutcomeKind::Success);
            }
            Err(failure) => {
                error!("request {token} failed: {failure}");
                self.error = Some(GENERIC_FAILURE_MESSAGE.to_string());
                self.last_outcome = Some(OutcomeKind::Failed);
            }
        }
        Settlement::Applied(self.state())
    }

    /// Submits and waits on the calling thread.
    ///
    /// # Errors
    /// Returns the [`ValidationError`] when nothing was sent; transport
    /// failures are recorded on the controller and reported as `Failed`.
    pub fn generate_blocking(
        &mut self,
        client: &GenerationClient,
    ) -> Result<WorkflowState, ValidationError> {
        let dispatch = self.submit()?;
        let outcome = client.generate(&dispatch.request);
        self.settle(dispatch.token, outcome);
        Ok(self.state())
    }

    /// Projects the generation screen for rendering.
    pub fn view(&self) -> GeneratorView {
        let mut view = GeneratorView::new(&self.stride_text, &self.output_width_text);
        view.set_state(self.state());
        view.input_status = input_status_text(self.input.as_ref().map(ImageArtifact::file_name));
        view.pool_status = pool_status_text(self.pool.as_ref().map_or(0, PoolCollection::len));
        view.error = self.error.clone();
        view.result_url = self.result_url().map(ToString::to_string);
        view
    }
}

impl Default for WorkflowController {
    fn default() -> Self {
        Self::new()
    }
}
