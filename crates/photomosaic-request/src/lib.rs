#![warn(missing_docs)]
//! # photomosaic-request
//!
//! ## Purpose
//! Packages the input image, the tile pool and the numeric parameters into
//! one immutable generation request and its multipart form.
//!
//! ## Responsibilities
//! - Validate the submission in a fixed order and report the first failure.
//! - Build the multipart part list expected by the generation service.
//! - Summarise a payload as a serialisable manifest for logs and dry runs.
//! - Derive a stable fingerprint used to correlate log lines per request.
//!
//! ## Data flow
//! Controller slots -> [`build_request_from_text`] -> [`GenerationRequest`]
//! -> [`GenerationRequest::to_payload`] -> transport.
//!
//! ## Ownership and lifetimes
//! A request clones the slot contents at submission time, so later slot
//! changes never alter a request already in flight.
//!
//! ## Error model
//! Validation failures are [`ValidationError`] values; packaging a valid
//! request cannot fail.
//!
//! ## Example
//! ```rust
//! use photomosaic_core::{GenerationParameters, ImageArtifact, PoolCollection};
//! use photomosaic_request::build_request;
//!
//! let input = ImageArtifact::new("photo.png", "image/png", vec![1]);
//! let pool = PoolCollection::from_selection(vec![input.clone()]);
//! let request = build_request(Some(&input), Some(&pool), GenerationParameters::new(30, 1000))
//!     .expect("request should build");
//! assert_eq!(request.to_payload().parts_named("pool"), 1);
//! ```

use photomosaic_core::{
    GenerationParameters, INPUT_FIELD, ImageArtifact, OCTET_STREAM_MIME_TYPE, OUTPUT_WIDTH_FIELD,
    POOL_FIELD, ParameterField, PoolCollection, STRIDE_FIELD, ValidationError, check_output_width,
    check_stride, parse_parameter,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Immutable generation request, built only at submission time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    input: ImageArtifact,
    pool: PoolCollection,
    params: GenerationParameters,
}

impl GenerationRequest {
    /// Returns the input image.
    pub fn input(&self) -> &ImageArtifact {
        &self.input
    }

    /// Returns the tile pool.
    pub fn pool(&self) -> &PoolCollection {
        &self.pool
    }

    /// Returns the validated parameters.
    pub fn params(&self) -> GenerationParameters {
        self.params
    }

    /// Builds the multipart form for this request.
    ///
    /// Part order: `input`, one `pool` part per pool image, `stride`,
    /// `output_width`.
    pub fn to_payload(&self) -> MultipartPayload {
        let mut parts = Vec::with_capacity(self.pool.len() + 3);
        parts.push(FormPart::file(INPUT_FIELD, &self.input));
        for image in self.pool.images() {
            parts.push(FormPart::file(POOL_FIELD, image));
        }
        parts.push(FormPart::text(STRIDE_FIELD, self.params.stride.to_string()));
        parts.push(FormPart::text(
            OUTPUT_WIDTH_FIELD,
            self.params.output_width.to_string(),
        ));
        MultipartPayload { parts }
    }
}

/// Builds a request from already-numeric parameters.
///
/// Checks run in order: input present, pool present and non-empty,
/// stride, output width. Only the first failure is reported.
///
/// # Errors
/// Returns the first failing [`ValidationError`].
pub fn build_request(
    input: Option<&ImageArtifact>,
    pool: Option<&PoolCollection>,
    params: GenerationParameters,
) -> Result<GenerationRequest, ValidationError> {
    let (input, pool) = check_slots(input, pool)?;
    params.validate()?;

    Ok(GenerationRequest {
        input: input.clone(),
        pool: pool.clone(),
        params,
    })
}

/// Builds a request from the numeric fields as typed.
///
/// Same order as [`build_request`]; each field is parsed right before its
/// range check, so a non-numeric stride is only reported once the input and
/// pool checks have passed.
///
/// # Errors
/// Returns the first failing [`ValidationError`].
pub fn build_request_from_text(
    input: Option<&ImageArtifact>,
    pool: Option<&PoolCollection>,
    stride_text: &str,
    output_width_text: &str,
) -> Result<GenerationRequest, ValidationError> {
    let (input, pool) = check_slots(input, pool)?;

    let stride = parse_parameter(ParameterField::Stride, stride_text)?;
    check_stride(stride)?;
    let output_width = parse_parameter(ParameterField::OutputWidth, output_width_text)?;
    check_output_width(output_width)?;

    Ok(GenerationRequest {
        input: input.clone(),
        pool: pool.clone(),
        params: GenerationParameters::new(stride, output_width),
    })
}

fn check_slots<'a>(
    input: Option<&'a ImageArtifact>,
    pool: Option<&'a PoolCollection>,
) -> Result<(&'a ImageArtifact, &'a PoolCollection), ValidationError> {
    let input = input.ok_or(ValidationError::MissingInput)?;
    let pool = pool.ok_or(ValidationError::MissingPool)?;
    if pool.is_empty() {
        return Err(ValidationError::EmptyPool);
    }
    Ok((input, pool))
}

/// Body of one multipart part.
#[derive(Clone, PartialEq, Eq)]
pub enum PartBody {
    /// Binary file part.
    File {
        /// File name sent in the part's content disposition.
        file_name: String,
        /// Part content type.
        mime_type: String,
        /// Raw bytes.
        bytes: Vec<u8>,
    },
    /// Plain text part.
    Text(String),
}

impl std::fmt::Debug for PartBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File {
                file_name,
                mime_type,
                bytes,
            } => f
                .debug_struct("File")
                .field("file_name", file_name)
                .field("mime_type", mime_type)
                .field("len", &bytes.len())
                .finish(),
            Self::Text(value) => f.debug_tuple("Text").field(value).finish(),
        }
    }
}

/// One named multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormPart {
    /// Form field name.
    pub name: &'static str,
    /// Part body.
    pub body: PartBody,
}

impl FormPart {
    fn file(name: &'static str, artifact: &ImageArtifact) -> Self {
        // Pickers report "" for unknown types; the service still expects a part type.
        let mime_type = match artifact.mime_type().trim() {
            "" => OCTET_STREAM_MIME_TYPE,
            declared => declared,
        };
        Self {
            name,
            body: PartBody::File {
                file_name: artifact.file_name().to_string(),
                mime_type: mime_type.to_string(),
                bytes: artifact.bytes().to_vec(),
            },
        }
    }

    fn text(name: &'static str, value: String) -> Self {
        Self {
            name,
            body: PartBody::Text(value),
        }
    }
}

/// Ordered multipart form sent to the generation service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPayload {
    parts: Vec<FormPart>,
}

impl MultipartPayload {
    /// Returns all parts in wire order.
    pub fn parts(&self) -> &[FormPart] {
        &self.parts
    }

    /// Consumes the payload into its parts.
    pub fn into_parts(self) -> Vec<FormPart> {
        self.parts
    }

    /// Counts parts sharing a field name.
    pub fn parts_named(&self, name: &str) -> usize {
        self.parts.iter().filter(|part| part.name == name).count()
    }

    /// Returns the value of the first text part with this name.
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|part| match &part.body {
            PartBody::Text(value) if part.name == name => Some(value.as_str()),
            _ => None,
        })
    }

    /// Returns the summed size of all file parts.
    pub fn file_bytes(&self) -> usize {
        self.parts
            .iter()
            .map(|part| match &part.body {
                PartBody::File { bytes, .. } => bytes.len(),
                PartBody::Text(_) => 0,
            })
            .sum()
    }

    /// Summarises the payload without its bytes.
    pub fn manifest(&self) -> PayloadManifest {
        let parts = self
            .parts
            .iter()
            .map(|part| match &part.body {
                PartBody::File {
                    file_name,
                    mime_type,
                    bytes,
                } => ManifestEntry {
                    field: part.name.to_string(),
                    file_name: Some(file_name.clone()),
                    mime_type: Some(mime_type.clone()),
                    byte_len: Some(bytes.len()),
                    value: None,
                },
                PartBody::Text(value) => ManifestEntry {
                    field: part.name.to_string(),
                    file_name: None,
                    mime_type: None,
                    byte_len: None,
                    value: Some(value.clone()),
                },
            })
            .collect();

        PayloadManifest {
            file_bytes: self.file_bytes(),
            parts,
        }
    }
}

/// Byte-free description of a multipart payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadManifest {
    /// Summed size of all file parts.
    pub file_bytes: usize,
    /// One entry per part, in wire order.
    pub parts: Vec<ManifestEntry>,
}

impl PayloadManifest {
    /// Renders the manifest as pretty JSON.
    ///
    /// # Errors
    /// Returns the serializer error, which only occurs on writer failure.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Manifest entry for one part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Form field name.
    pub field: String,
    /// File name, for file parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Content type, for file parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Byte length, for file parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub byte_len: Option<usize>,
    /// Text value, for text parts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Computes a stable SHA-256 fingerprint for a request.
///
/// Identical requests produce identical fingerprints; any change to a part
/// name, file name, content type, byte or parameter changes it.
pub fn request_fingerprint(request: &GenerationRequest) -> String {
    let mut hasher = Sha256::new();
    for part in request.to_payload().parts() {
        hasher.update(part.name.as_bytes());
        hasher.update([0]);
        match &part.body {
            PartBody::File {
                file_name,
                mime_type,
                bytes,
            } => {
                hasher.update(b"file\0");
                hasher.update(file_name.as_bytes());
                hasher.update([0]);
                hasher.update(mime_type.as_bytes());
                hasher.update([0]);
                hasher.update((bytes.len() as u64).to_le_bytes());
                hasher.update(bytes);
            }
            PartBody::Text(value) => {
                hasher.update(b"text\0");
                hasher.update(value.as_bytes());
            }
        }
        hasher.update([0xFF]);
    }
    hex::encode(hasher.finalize())
}
