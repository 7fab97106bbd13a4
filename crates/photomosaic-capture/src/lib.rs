#![warn(missing_docs)]
//! # photomosaic-capture
//!
//! ## Purpose
//! Acquires the single input image, either from a file selection or from a
//! camera still, and normalises both into one [`ImageArtifact`] shape.
//!
//! ## Responsibilities
//! - Read file selections verbatim (bytes, file name, declared MIME type).
//! - Define a device-agnostic camera trait producing JPEG data URIs.
//! - Decode camera stills into artifacts named `captured_image.jpg`.
//! - Model the capture screen (preview, retake, accept) and the one-shot
//!   hand-off to the generation screen.
//! - Expand pool selections at the selection boundary.
//!
//! ## Data flow
//! [`CameraDevice::screenshot`] -> [`CaptureSession::capture`] ->
//! [`CaptureSession::accept`] -> [`Handoff`] -> generation controller.
//! File selections go straight through [`acquire_from_file`].
//!
//! ## Ownership and lifetimes
//! Artifacts own their bytes. A [`Handoff`] is consumed by value, so the
//! receiving side can read it exactly once.
//!
//! ## Error model
//! A camera that yields no frame is not an error: acquisition returns
//! `Ok(None)` and the session stays in preview. I/O and malformed stills are
//! reported as [`CaptureError`].

mod data_uri;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, warn};
use photomosaic_core::{
    CAPTURED_IMAGE_FILE_NAME, ImageArtifact, JPEG_MIME_TYPE, OCTET_STREAM_MIME_TYPE,
};
use thiserror::Error;

pub use data_uri::{DataUri, decode_data_uri, encode_data_uri};

/// JPEG quality used for synthetic camera stills.
pub const CAMERA_JPEG_QUALITY: u8 = 85;

/// MIME type used when a file extension is not recognised.
pub const FALLBACK_MIME_TYPE: &str = OCTET_STREAM_MIME_TYPE;

/// Wraps an in-memory picker selection verbatim.
pub fn acquire_from_selection(
    file_name: impl Into<String>,
    mime_type: impl Into<String>,
    bytes: Vec<u8>,
) -> ImageArtifact {
    ImageArtifact::new(file_name, mime_type, bytes)
}

/// Reads one selected file into an artifact.
///
/// The bytes are not transcoded; the MIME type is the one declared by the
/// file extension.
///
/// # Errors
/// Returns [`CaptureError::Io`] when the file cannot be read.
pub fn acquire_from_file(path: &Path) -> Result<ImageArtifact, CaptureError> {
    let bytes = std::fs::read(path).map_err(|source| CaptureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("image")
        .to_string();
    let mime_type = mime_for_path(path).unwrap_or(FALLBACK_MIME_TYPE);

    debug!(
        "acquired file {file_name} ({mime_type}, {} bytes)",
        bytes.len()
    );
    Ok(ImageArtifact::new(file_name, mime_type, bytes))
}

/// Normalises a raw camera still into an artifact.
///
/// # Returns
/// - `Ok(None)` when the device produced no frame or an empty frame.
/// - `Ok(Some(artifact))` named `captured_image.jpg` with MIME `image/jpeg`,
///   whatever type the data URI declared.
///
/// # Errors
/// Returns [`CaptureError::InvalidDataUri`] for malformed stills.
pub fn acquire_from_camera(raw_frame: Option<&str>) -> Result<Option<ImageArtifact>, CaptureError> {
    let Some(raw_frame) = raw_frame.filter(|frame| !frame.trim().is_empty()) else {
        debug!("camera produced no frame; nothing acquired");
        return Ok(None);
    };

    let decoded = decode_data_uri(raw_frame)?;
    if decoded.bytes.is_empty() {
        debug!("camera frame decoded to zero bytes; nothing acquired");
        return Ok(None);
    }

    Ok(Some(ImageArtifact::new(
        CAPTURED_IMAGE_FILE_NAME,
        JPEG_MIME_TYPE,
        decoded.bytes,
    )))
}

/// Returns the image MIME type declared by a file extension.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "tif" | "tiff" => Some("image/tiff"),
        _ => None,
    }
}

/// Returns `true` when the path has an image extension.
pub fn is_image_path(path: &Path) -> bool {
    mime_for_path(path).is_some()
}

/// Expands a selection of files and directories into image file paths.
///
/// Files are kept as given. Directories contribute their image files (not
/// recursive), sorted by name.
///
/// # Errors
/// Returns [`CaptureError::Io`] when a directory cannot be listed.
pub fn expand_selection(paths: &[PathBuf]) -> Result<Vec<PathBuf>, CaptureError> {
    let mut expanded = Vec::new();
    for path in paths {
        if !path.is_dir() {
            expanded.push(path.clone());
            continue;
        }

        let entries = std::fs::read_dir(path).map_err(|source| CaptureError::Io {
            path: path.clone(),
            source,
        })?;
        let mut images = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| CaptureError::Io {
                path: path.clone(),
                source,
            })?;
            let candidate = entry.path();
            if candidate.is_file() && is_image_path(&candidate) {
                images.push(candidate);
            }
        }
        images.sort();
        expanded.extend(images);
    }
    Ok(expanded)
}

/// Metadata describing one camera device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraInfo {
    /// Stable device identifier.
    pub id: String,
    /// Human-readable device name.
    pub name: String,
    /// Still width in pixels.
    pub width: u32,
    /// Still height in pixels.
    pub height: u32,
}

/// Trait implemented by camera providers.
pub trait CameraDevice: Send + Sync {
    /// Describes the device.
    fn describe(&self) -> CameraInfo;

    /// Takes one still encoded as a JPEG data URI.
    ///
    /// Returns `None` when the device is not ready to deliver a frame.
    fn screenshot(&self) -> Option<String>;
}

/// Deterministic camera for tests and offline use.
#[derive(Debug)]
pub struct SyntheticCamera {
    info: CameraInfo,
    ready: bool,
    sequence: Mutex<u64>,
}

impl SyntheticCamera {
    /// Creates a ready 64x48 synthetic camera.
    pub fn new() -> Self {
        Self::with_size(64, 48)
    }

    /// Creates a ready synthetic camera with the given still size.
    pub fn with_size(width: u32, height: u32) -> Self {
        Self {
            info: CameraInfo {
                id: "synthetic-camera".to_string(),
                name: "Synthetic Camera".to_string(),
                width: width.max(1),
                height: height.max(1),
            },
            ready: true,
            sequence: Mutex::new(0),
        }
    }

    /// Creates a camera that never delivers a frame.
    pub fn not_ready() -> Self {
        Self {
            ready: false,
            ..Self::new()
        }
    }

    fn render_frame(&self, sequence: u64) -> Vec<u8> {
        let width = self.info.width as usize;
        let height = self.info.height as usize;
        let shift = (sequence % 255) as u8;
        let mut rgb = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                rgb.push(((x * 255) / width) as u8 ^ shift);
                rgb.push(((y * 255) / height) as u8);
                rgb.push(shift);
            }
        }
        rgb
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraDevice for SyntheticCamera {
    fn describe(&self) -> CameraInfo {
        self.info.clone()
    }

    fn screenshot(&self) -> Option<String> {
        if !self.ready {
            return None;
        }

        let sequence = {
            let mut sequence = self.sequence.lock().ok()?;
            *sequence += 1;
            *sequence
        };

        let rgb = self.render_frame(sequence);
        match encode_jpeg(&rgb, self.info.width, self.info.height, CAMERA_JPEG_QUALITY) {
            Ok(jpeg) => Some(encode_data_uri(JPEG_MIME_TYPE, &jpeg)),
            Err(error) => {
                warn!("synthetic camera failed to encode still: {error}");
                None
            }
        }
    }
}

/// Camera that replays one JPEG file from disk as its still.
///
/// Other formats are refused at [`StillFrameCamera::open`].
#[derive(Debug, Clone)]
pub struct StillFrameCamera {
    path: PathBuf,
    info: CameraInfo,
}

impl StillFrameCamera {
    /// Opens a still-frame camera over an existing image file.
    ///
    /// # Errors
    /// Returns [`CaptureError::Device`] when the file is not a readable JPEG.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CaptureError> {
        let path = path.into();
        let unreadable = |error: &dyn std::fmt::Display| {
            CaptureError::Device(format!("cannot open still {}: {error}", path.display()))
        };
        let reader = image::ImageReader::open(&path)
            .and_then(image::ImageReader::with_guessed_format)
            .map_err(|error| unreadable(&error))?;
        // Stills are announced as image/jpeg, so the file must be one.
        if reader.format() != Some(image::ImageFormat::Jpeg) {
            return Err(CaptureError::Device(format!(
                "still {} is not a JPEG (detected {:?})",
                path.display(),
                reader.format()
            )));
        }
        let (width, height) = reader
            .into_dimensions()
            .map_err(|error| unreadable(&error))?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("still")
            .to_string();

        Ok(Self {
            info: CameraInfo {
                id: format!("still-frame:{}", path.display()),
                name: format!("Still frame {name}"),
                width,
                height,
            },
            path,
        })
    }
}

impl CameraDevice for StillFrameCamera {
    fn describe(&self) -> CameraInfo {
        self.info.clone()
    }

    fn screenshot(&self) -> Option<String> {
        match std::fs::read(&self.path) {
            Ok(bytes) if !bytes.is_empty() => Some(encode_data_uri(JPEG_MIME_TYPE, &bytes)),
            Ok(_) => None,
            Err(error) => {
                warn!("still frame {} unavailable: {error}", self.path.display());
                None
            }
        }
    }
}

/// Encodes packed RGB8 pixels as JPEG.
///
/// # Errors
/// Returns [`CaptureError::Encode`] when the buffer does not match the
/// geometry or the encoder fails.
pub fn encode_jpeg(rgb: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>, CaptureError> {
    let expected = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(3))
        .ok_or_else(|| CaptureError::Encode("frame dimensions overflow".to_string()))?;
    if rgb.len() != expected {
        return Err(CaptureError::Encode(format!(
            "invalid RGB buffer: expected {expected} bytes, got {}",
            rgb.len()
        )));
    }

    let mut jpeg = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, quality)
        .encode(rgb, width, height, image::ColorType::Rgb8.into())
        .map_err(|error| CaptureError::Encode(format!("jpeg encoding failed: {error}")))?;
    Ok(jpeg)
}

/// Capture screen state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureState {
    /// Live preview; no still taken yet.
    Previewing,
    /// A still was taken and awaits retake or accept.
    Captured {
        /// Still as returned by the device.
        data_uri: String,
    },
}

/// Capture screen state machine: capture, retake, accept.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    state: CaptureState,
}

impl CaptureSession {
    /// Creates a session in preview.
    pub fn new() -> Self {
        Self {
            state: CaptureState::Previewing,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    /// Returns the pending still, if any.
    pub fn still(&self) -> Option<&str> {
        match &self.state {
            CaptureState::Captured { data_uri } => Some(data_uri),
            CaptureState::Previewing => None,
        }
    }

    /// Takes a still from `device`.
    ///
    /// Returns `false` and stays in preview when the device has no frame, or
    /// when a still is already pending.
    pub fn capture(&mut self, device: &dyn CameraDevice) -> bool {
        if !matches!(self.state, CaptureState::Previewing) {
            return false;
        }

        match device.screenshot().filter(|frame| !frame.trim().is_empty()) {
            Some(data_uri) => {
                debug!("captured still from {}", device.describe().id);
                self.state = CaptureState::Captured { data_uri };
                true
            }
            None => {
                debug!("{} returned no frame", device.describe().id);
                false
            }
        }
    }

    /// Drops the pending still and returns to preview.
    pub fn retake(&mut self) {
        self.state = CaptureState::Previewing;
    }

    /// Normalises the pending still into a hand-off for the generation screen.
    ///
    /// Returns `Ok(None)` while previewing.
    ///
    /// # Errors
    /// Returns [`CaptureError::InvalidDataUri`] when the still is malformed.
    pub fn accept(&self) -> Result<Option<Handoff>, CaptureError> {
        Ok(acquire_from_camera(self.still())?.map(Handoff::new))
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot transfer of the input image between screens.
///
/// A hand-off cannot be duplicated:
///
/// ```compile_fail
/// use photomosaic_capture::Handoff;
/// use photomosaic_core::ImageArtifact;
///
/// let handoff = Handoff::new(ImageArtifact::new("captured_image.jpg", "image/jpeg", vec![1]));
/// let _second = handoff.clone();
/// ```
#[derive(Debug, PartialEq, Eq)]
pub struct Handoff {
    artifact: ImageArtifact,
}

impl Handoff {
    /// Wraps the artifact handed to the generation screen.
    pub fn new(artifact: ImageArtifact) -> Self {
        Self { artifact }
    }

    /// Peeks at the transferred artifact.
    pub fn artifact(&self) -> &ImageArtifact {
        &self.artifact
    }

    /// Consumes the hand-off.
    pub fn into_artifact(self) -> ImageArtifact {
        self.artifact
    }
}

/// Acquisition error type.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// A selected file or directory could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// Offending path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A camera still was not a valid data URI.
    #[error("invalid data uri: {0}")]
    InvalidDataUri(String),
    /// A frame could not be encoded.
    #[error("frame encoding failure: {0}")]
    Encode(String),
    /// Camera device failure.
    #[error("camera device failure: {0}")]
    Device(String),
}
