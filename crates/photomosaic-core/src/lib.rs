#![warn(missing_docs)]
//! # photomosaic-core
//!
//! ## Purpose
//! Defines the pure data model used across the `photomosaic` workspace.
//!
//! ## Responsibilities
//! - Represent source-agnostic image artifacts and the tile pool.
//! - Hold generation parameters and their validation bounds.
//! - Parse numeric parameter text into validated values.
//! - Fix the wire-level field names and file names shared with the
//!   mosaic-generation service.
//!
//! ## Data flow
//! Acquisition code emits [`ImageArtifact`] values into the input slot and a
//! [`PoolCollection`]. At submission time packaging combines both with
//! [`GenerationParameters`]; the service answers with a [`GeneratedImage`].
//!
//! ## Ownership and lifetimes
//! Artifacts and generated images own their backing buffers (`Vec<u8>`) so
//! they can cross the worker-thread boundary of the dispatch runtime without
//! borrow coupling.
//!
//! ## Error model
//! Submission-time validation failures are reported as [`ValidationError`].
//! Exactly one error is reported per attempt.
//!
//! ## Example
//! ```rust
//! use photomosaic_core::{GenerationParameters, ImageArtifact, PoolCollection};
//!
//! let tile = ImageArtifact::new("tile.png", "image/png", vec![1, 2, 3]);
//! let pool = PoolCollection::from_selection(vec![tile]);
//! assert_eq!(pool.len(), 1);
//! assert!(GenerationParameters::default().validate().is_ok());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Multipart field carrying the source image.
pub const INPUT_FIELD: &str = "input";
/// Multipart field repeated once per pool image.
pub const POOL_FIELD: &str = "pool";
/// Multipart text field carrying the stride.
pub const STRIDE_FIELD: &str = "stride";
/// Multipart text field carrying the output width.
pub const OUTPUT_WIDTH_FIELD: &str = "output_width";

/// File name assigned to every camera-sourced artifact.
pub const CAPTURED_IMAGE_FILE_NAME: &str = "captured_image.jpg";
/// MIME type assigned to every camera-sourced artifact.
pub const JPEG_MIME_TYPE: &str = "image/jpeg";
/// MIME type sent for files whose type is unknown or blank.
pub const OCTET_STREAM_MIME_TYPE: &str = "application/octet-stream";
/// Suggested file name for downloading a generated mosaic.
pub const DOWNLOAD_FILE_NAME: &str = "mosaic.jpg";

/// Default stride used by the generation form.
pub const DEFAULT_STRIDE: u32 = 30;
/// Default output width used by the generation form.
pub const DEFAULT_OUTPUT_WIDTH: u32 = 1000;
/// Smallest accepted stride.
pub const MIN_STRIDE: u32 = 1;
/// Smallest accepted output width.
pub const MIN_OUTPUT_WIDTH: u32 = 100;

/// One image held in memory, independent of how it was acquired.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageArtifact {
    file_name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

impl ImageArtifact {
    /// Wraps bytes with their declared file name and MIME type verbatim.
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Returns the file name sent with the multipart part.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Returns the declared MIME type.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Returns the raw image bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the byte length of the image.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` when the artifact holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// Bytes are left out on purpose so artifacts can be logged.
impl fmt::Debug for ImageArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageArtifact")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Candidate tile images submitted alongside the input image.
///
/// A collection is replaced wholesale on every selection; there is no
/// incremental add/remove. It may be empty here, emptiness is rejected when a
/// request is built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PoolCollection {
    images: Vec<ImageArtifact>,
}

impl PoolCollection {
    /// Creates a pool from one picker selection.
    pub fn from_selection(images: Vec<ImageArtifact>) -> Self {
        Self { images }
    }

    /// Returns the pool images in selection order.
    pub fn images(&self) -> &[ImageArtifact] {
        &self.images
    }

    /// Returns the number of pool images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Returns `true` when no pool image is selected.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Returns the total byte size of the pool.
    pub fn total_bytes(&self) -> usize {
        self.images.iter().map(ImageArtifact::len).sum()
    }
}

/// Numeric parameters forwarded to the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParameters {
    /// Tile stride in pixels.
    pub stride: u32,
    /// Width of the generated mosaic in pixels.
    pub output_width: u32,
}

impl GenerationParameters {
    /// Creates an unvalidated parameter pair.
    pub fn new(stride: u32, output_width: u32) -> Self {
        Self {
            stride,
            output_width,
        }
    }

    /// Checks both parameters, stride first.
    ///
    /// # Errors
    /// Returns [`ValidationError::StrideOutOfRange`] when `stride < 1` and
    /// [`ValidationError::OutputWidthOutOfRange`] when `output_width < 100`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_stride(self.stride)?;
        check_output_width(self.output_width)
    }
}

impl Default for GenerationParameters {
    fn default() -> Self {
        Self::new(DEFAULT_STRIDE, DEFAULT_OUTPUT_WIDTH)
    }
}

/// Numeric form field identity, used to tag parse failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterField {
    /// The stride field.
    Stride,
    /// The output width field.
    OutputWidth,
}

impl ParameterField {
    /// Returns the wire field name of this parameter.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Stride => STRIDE_FIELD,
            Self::OutputWidth => OUTPUT_WIDTH_FIELD,
        }
    }
}

impl fmt::Display for ParameterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stride => f.write_str("stride"),
            Self::OutputWidth => f.write_str("output width"),
        }
    }
}

/// Parses one numeric form field.
///
/// Surrounding whitespace is ignored; anything else that is not a base-10
/// unsigned integer is rejected instead of being admitted as an invalid
/// number.
///
/// # Errors
/// Returns [`ValidationError::NotANumber`] for non-numeric or overflowing text.
pub fn parse_parameter(field: ParameterField, raw: &str) -> Result<u32, ValidationError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ValidationError::NotANumber {
            field,
            raw: raw.to_string(),
        })
}

/// Checks the stride lower bound.
///
/// # Errors
/// Returns [`ValidationError::StrideOutOfRange`] when `stride < 1`.
pub fn check_stride(stride: u32) -> Result<(), ValidationError> {
    if stride < MIN_STRIDE {
        return Err(ValidationError::StrideOutOfRange { value: stride });
    }
    Ok(())
}

/// Checks the output width lower bound.
///
/// # Errors
/// Returns [`ValidationError::OutputWidthOutOfRange`] when `output_width < 100`.
pub fn check_output_width(output_width: u32) -> Result<(), ValidationError> {
    if output_width < MIN_OUTPUT_WIDTH {
        return Err(ValidationError::OutputWidthOutOfRange {
            value: output_width,
        });
    }
    Ok(())
}

/// Image bytes returned by the generation service.
#[derive(Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Content type declared by the service, if any. Informational only.
    pub content_type: Option<String>,
    /// Raw image bytes, treated as opaque.
    pub bytes: Vec<u8>,
}

impl GeneratedImage {
    /// Wraps service response bytes.
    pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            content_type,
            bytes,
        }
    }
}

impl fmt::Debug for GeneratedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedImage")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Submission-time validation failures.
///
/// Messages are user-facing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No input image was acquired.
    #[error("Please select an input image.")]
    MissingInput,
    /// No pool selection was made.
    #[error("Please select pool images.")]
    MissingPool,
    /// The pool selection holds no images.
    #[error("The pool must contain at least one image.")]
    EmptyPool,
    /// Stride is below its minimum.
    #[error("Stride must be at least 1 (got {value}).")]
    StrideOutOfRange {
        /// Rejected value.
        value: u32,
    },
    /// Output width is below its minimum.
    #[error("Output width must be at least 100 (got {value}).")]
    OutputWidthOutOfRange {
        /// Rejected value.
        value: u32,
    },
    /// A numeric field did not hold a whole number.
    #[error("The {field} must be a whole number (got {raw:?}).")]
    NotANumber {
        /// Field that failed to parse.
        field: ParameterField,
        /// Text as entered.
        raw: String,
    },
}
