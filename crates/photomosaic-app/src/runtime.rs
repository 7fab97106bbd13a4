//! Off-thread dispatch of generation requests.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use log::{debug, error};
use photomosaic_core::GeneratedImage;
use photomosaic_transport::{GenerationClient, TransportError};

use crate::AppError;
use crate::controller::{RequestToken, Settlement, WorkflowController};

/// Outcome reported by a dispatch worker.
#[derive(Debug)]
pub struct Completion {
    /// Token of the request this outcome belongs to.
    pub token: RequestToken,
    /// Service response or transport failure.
    pub outcome: Result<GeneratedImage, TransportError>,
}

/// Owns a [`WorkflowController`] and runs its requests on worker threads.
///
/// The owning thread stays free while a request is in flight; it drains
/// completions with [`DispatchRuntime::poll`] or blocks with
/// [`DispatchRuntime::wait`]. Requests are not cancellable, so workers are
/// detached and report whenever the service answers.
pub struct DispatchRuntime {
    controller: WorkflowController,
    client: Arc<GenerationClient>,
    completion_tx: Sender<Completion>,
    completion_rx: Receiver<Completion>,
}

impl DispatchRuntime {
    /// Wraps a controller and the client its requests are sent with.
    pub fn new(controller: WorkflowController, client: GenerationClient) -> Self {
        let (completion_tx, completion_rx) = mpsc::channel();
        Self {
            controller,
            client: Arc::new(client),
            completion_tx,
            completion_rx,
        }
    }

    /// Returns the controller.
    pub fn controller(&self) -> &WorkflowController {
        &self.controller
    }

    /// Returns the controller for slot edits between dispatches.
    pub fn controller_mut(&mut self) -> &mut WorkflowController {
        &mut self.controller
    }

    /// Releases the controller.
    pub fn into_controller(self) -> WorkflowController {
        self.controller
    }

    /// Submits the controller's slots and sends the request on a worker.
    ///
    /// # Errors
    /// Returns [`AppError::Validation`] when nothing was dispatched and
    /// [`AppError::Worker`] when the worker thread could not be started; in
    /// the latter case the attempt is settled as failed.
    pub fn submit(&mut self) -> Result<RequestToken, AppError> {
        let dispatch = self.controller.submit()?;
        let token = dispatch.token;
        let client = Arc::clone(&self.client);
        let completion_tx = self.completion_tx.clone();

        let spawned = std::thread::Builder::new()
            .name(format!("photomosaic-dispatch-{token}"))
            .spawn(move || {
                debug!("worker sending request {token} ({})", dispatch.fingerprint);
                let outcome = client.generate(&dispatch.request);
                // The receiver only goes away with the runtime.
                let _ = completion_tx.send(Completion { token, outcome });
            });

        if let Err(spawn_error) = spawned {
            error!("failed to spawn dispatch worker for {token}: {spawn_error}");
            let reason = format!("cannot spawn dispatch worker: {spawn_error}");
            self.controller
                .settle(token, Err(TransportError::Connect(reason.clone())));
            return Err(AppError::Worker(reason));
        }
        Ok(token)
    }

    /// Applies every completion that has already arrived.
    pub fn poll(&mut self) -> Vec<Settlement> {
        let mut settled = Vec::new();
        loop {
            match self.completion_rx.try_recv() {
                Ok(completion) => settled.push(self.apply(completion)),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        settled
    }

    /// Blocks until the latest dispatch settles.
    ///
    /// Stale completions that arrive first are dropped along the way. Returns
    /// `None` when nothing is in flight.
    pub fn wait(&mut self) -> Option<Settlement> {
        while self.controller.in_flight().is_some() {
            let completion = self.completion_rx.recv().ok()?;
            if let settled @ Settlement::Applied(_) = self.apply(completion) {
                return Some(settled);
            }
        }
        None
    }

    fn apply(&mut self, completion: Completion) -> Settlement {
        self.controller.settle(completion.token, completion.outcome)
    }
}

impl std::fmt::Debug for DispatchRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchRuntime")
            .field("controller", &self.controller)
            .field("endpoint", &self.client.endpoint().as_str())
            .finish()
    }
}
