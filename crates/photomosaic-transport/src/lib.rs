#![warn(missing_docs)]
//! # photomosaic-transport
//!
//! ## Purpose
//! Implements the wire contract with the mosaic-generation service.
//!
//! ## Responsibilities
//! - Resolve and validate the `POST /generate_mosaic` endpoint.
//! - Send multipart payloads through an injectable transport abstraction.
//! - Turn the service answer into a [`GeneratedImage`] or a [`TransportError`].
//!
//! ## Data flow
//! [`GenerationRequest`] -> [`GenerationClient::generate`] ->
//! [`GenerationTransport::send`] -> service -> image bytes.
//!
//! ## Ownership and lifetimes
//! Payloads are handed to the transport by value so the HTTP form can take
//! the part buffers without another copy.
//!
//! ## Error model
//! Network failures, non-2xx statuses and unusable bodies all surface as
//! [`TransportError`]. Callers treat every variant the same way; the variants
//! exist for logs. No retry happens at this layer.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use photomosaic_core::{GeneratedImage, POOL_FIELD};
use photomosaic_request::{GenerationRequest, MultipartPayload, PartBody};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Path segment of the generation route, relative to the service base URL.
pub const GENERATE_PATH: &str = "generate_mosaic";

/// Service base URL used when nothing else is configured.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5000";

/// Resolves the generation endpoint below a service base URL.
///
/// A base path is kept (`http://host/api` -> `http://host/api/generate_mosaic`);
/// query and fragment are dropped.
///
/// # Errors
/// Returns [`TransportError::InvalidEndpoint`] for unparsable URLs and for
/// schemes other than `http`/`https`.
pub fn generate_endpoint(service_url: &str) -> Result<Url, TransportError> {
    let mut base = Url::parse(service_url.trim())
        .map_err(|error| TransportError::InvalidEndpoint(format!("invalid service url: {error}")))?;

    if !matches!(base.scheme(), "http" | "https") {
        return Err(TransportError::InvalidEndpoint(format!(
            "service url must use http or https, got {}",
            base.scheme()
        )));
    }
    if base.cannot_be_a_base() || base.host_str().is_none() {
        return Err(TransportError::InvalidEndpoint(
            "service url must include a host".to_string(),
        ));
    }

    base.set_query(None);
    base.set_fragment(None);
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join(GENERATE_PATH)
        .map_err(|error| TransportError::InvalidEndpoint(format!("cannot join route: {error}")))
}

/// Abstract transport used by the generation client.
pub trait GenerationTransport: Send + Sync {
    /// Sends one multipart payload and returns the image the service produced.
    fn send(
        &self,
        endpoint: &Url,
        payload: MultipartPayload,
    ) -> Result<GeneratedImage, TransportError>;
}

/// Blocking HTTP transport backed by `reqwest`.
///
/// No client-side timeout is set; the service's own connection behaviour
/// governs liveness.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Creates an HTTP transport.
    ///
    /// # Errors
    /// Returns [`TransportError::Setup`] when the HTTP client cannot be built.
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .user_agent(concat!("photomosaic/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| TransportError::Setup(error.to_string()))?;
        Ok(Self { client })
    }
}

impl GenerationTransport for HttpTransport {
    fn send(
        &self,
        endpoint: &Url,
        payload: MultipartPayload,
    ) -> Result<GeneratedImage, TransportError> {
        let form = build_form(payload)?;

        let response = self
            .client
            .post(endpoint.as_str())
            .multipart(form)
            .send()
            .map_err(|error| TransportError::Connect(error.to_string()))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                detail: service_error_detail(&body),
            });
        }

        let bytes = response.bytes().map_err(|error| {
            TransportError::MalformedResponse(format!("failed to read body: {error}"))
        })?;
        if bytes.is_empty() {
            return Err(TransportError::MalformedResponse(
                "service returned an empty body".to_string(),
            ));
        }

        Ok(GeneratedImage::new(bytes.to_vec(), content_type))
    }
}

fn build_form(payload: MultipartPayload) -> Result<Form, TransportError> {
    let mut form = Form::new();
    for part in payload.into_parts() {
        form = match part.body {
            PartBody::File {
                file_name,
                mime_type,
                bytes,
            } => {
                let file_part = Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str(&mime_type)
                    .map_err(|error| {
                        TransportError::InvalidPart(format!(
                            "{}: bad content type {mime_type:?}: {error}",
                            part.name
                        ))
                    })?;
                form.part(part.name, file_part)
            }
            PartBody::Text(value) => form.text(part.name, value),
        };
    }
    Ok(form)
}

#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error: String,
}

/// Extracts the message of the service's `{"error": "..."}` body.
pub fn service_error_detail(body: &str) -> Option<String> {
    serde_json::from_str::<ServiceErrorBody>(body)
        .ok()
        .map(|parsed| parsed.error)
        .filter(|message| !message.trim().is_empty())
}

/// Generation client bound to one service endpoint.
#[derive(Clone)]
pub struct GenerationClient {
    endpoint: Url,
    transport: Arc<dyn GenerationTransport>,
}

impl GenerationClient {
    /// Creates a client over a caller-provided transport.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidEndpoint`] for an unusable service URL.
    pub fn new(
        service_url: &str,
        transport: Arc<dyn GenerationTransport>,
    ) -> Result<Self, TransportError> {
        Ok(Self {
            endpoint: generate_endpoint(service_url)?,
            transport,
        })
    }

    /// Creates a client using [`HttpTransport`].
    ///
    /// # Errors
    /// Returns endpoint validation or HTTP setup failures.
    pub fn http(service_url: &str) -> Result<Self, TransportError> {
        Self::new(service_url, Arc::new(HttpTransport::new()?))
    }

    /// Returns the resolved generation endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Sends one request and waits for the service answer.
    ///
    /// # Errors
    /// Propagates the transport failure unchanged.
    pub fn generate(&self, request: &GenerationRequest) -> Result<GeneratedImage, TransportError> {
        let payload = request.to_payload();
        debug!(
            "posting {} parts ({} pool, {} file bytes) to {}",
            payload.parts().len(),
            payload.parts_named(POOL_FIELD),
            payload.file_bytes(),
            self.endpoint
        );

        match self.transport.send(&self.endpoint, payload) {
            Ok(image) => {
                info!(
                    "service returned {} bytes ({})",
                    image.bytes.len(),
                    image.content_type.as_deref().unwrap_or("no content type")
                );
                Ok(image)
            }
            Err(failure) => {
                error!("generation request to {} failed: {failure}", self.endpoint);
                Err(failure)
            }
        }
    }
}

impl std::fmt::Debug for GenerationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

/// Transport error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Service URL is unusable.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// HTTP client could not be initialised.
    #[error("http client setup failure: {0}")]
    Setup(String),
    /// A multipart part could not be encoded.
    #[error("invalid multipart part: {0}")]
    InvalidPart(String),
    /// The request did not complete (connection refused, reset, aborted).
    #[error("request failed: {0}")]
    Connect(String),
    /// The service answered with a non-2xx status.
    #[error("service returned status {status}{}", detail_suffix(.detail))]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message from the service's JSON error body, when present.
        detail: Option<String>,
    },
    /// A 2xx answer whose body is not usable as an image.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|detail| format!(": {detail}"))
        .unwrap_or_default()
}
