//! Shared fixtures for app integration tests.

use std::collections::VecDeque;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

use photomosaic_app::WorkflowController;
use photomosaic_core::{GeneratedImage, ImageArtifact};
use photomosaic_request::MultipartPayload;
use photomosaic_transport::{GenerationClient, GenerationTransport, TransportError};
use url::Url;

/// Creates a small input image fixture.
#[allow(dead_code)]
pub fn input_artifact() -> ImageArtifact {
    ImageArtifact::new("photo.png", "image/png", b"input-bytes".to_vec())
}

/// Creates `count` deterministic pool images.
#[allow(dead_code)]
pub fn pool_artifacts(count: usize) -> Vec<ImageArtifact> {
    (0..count)
        .map(|index| {
            ImageArtifact::new(
                format!("tile-{index}.jpg"),
                "image/jpeg",
                vec![index as u8; 4],
            )
        })
        .collect()
}

/// Creates a controller with input and a 3-image pool selected.
#[allow(dead_code)]
pub fn ready_controller() -> WorkflowController {
    let mut controller = WorkflowController::new();
    controller.select_input(input_artifact());
    assert!(controller.set_pool(pool_artifacts(3)));
    controller
}

/// Creates a successful service answer.
#[allow(dead_code)]
pub fn mosaic(fill: u8) -> GeneratedImage {
    GeneratedImage::new(vec![fill; 16], Some("image/jpeg".to_string()))
}

/// Transport that replays scripted outcomes and records what it was sent.
#[allow(dead_code)]
#[derive(Default)]
pub struct ScriptedTransport {
    outcomes: Mutex<VecDeque<Result<GeneratedImage, TransportError>>>,
    sent: Mutex<Vec<MultipartPayload>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    /// Creates a transport answering with `outcomes` in order.
    pub fn new(outcomes: Vec<Result<GeneratedImage, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// Returns how many payloads were sent.
    pub fn sent_count(&self) -> usize {
        self.sent.lock().expect("sent lock").len()
    }

    /// Returns a copy of the payload sent at `index`.
    pub fn sent(&self, index: usize) -> MultipartPayload {
        self.sent.lock().expect("sent lock")[index].clone()
    }
}

impl GenerationTransport for ScriptedTransport {
    fn send(
        &self,
        _endpoint: &Url,
        payload: MultipartPayload,
    ) -> Result<GeneratedImage, TransportError> {
        self.sent.lock().expect("sent lock").push(payload);
        self.outcomes
            .lock()
            .expect("outcome lock")
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connect("script exhausted".to_string())))
    }
}

/// Transport that blocks each send until the test releases an outcome.
#[allow(dead_code)]
pub struct GatedTransport {
    gate: Mutex<Receiver<Result<GeneratedImage, TransportError>>>,
}

#[allow(dead_code)]
impl GatedTransport {
    /// Creates a transport fed by `gate`.
    pub fn new(gate: Receiver<Result<GeneratedImage, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            gate: Mutex::new(gate),
        })
    }
}

impl GenerationTransport for GatedTransport {
    fn send(
        &self,
        _endpoint: &Url,
        _payload: MultipartPayload,
    ) -> Result<GeneratedImage, TransportError> {
        self.gate
            .lock()
            .expect("gate lock")
            .recv()
            .unwrap_or_else(|_| Err(TransportError::Connect("gate closed".to_string())))
    }
}

/// Builds a client over any transport.
#[allow(dead_code)]
pub fn client_over(transport: Arc<dyn GenerationTransport>) -> GenerationClient {
    GenerationClient::new("http://mosaic.test", transport).expect("client should build")
}
