//! Result presentation and the revocable references behind it.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use log::debug;
use photomosaic_core::{DOWNLOAD_FILE_NAME, GeneratedImage};

use crate::{AppError, write_file};

/// Revocable handle to an in-memory binary buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    /// Returns the reference as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store of binary buffers addressed by [`ObjectUrl`].
///
/// A buffer stays alive until its reference is revoked.
#[derive(Default)]
pub struct BlobRegistry {
    next_id: u64,
    blobs: HashMap<ObjectUrl, Vec<u8>>,
}

impl BlobRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a buffer and returns a fresh reference to it.
    pub fn create(&mut self, bytes: Vec<u8>) -> ObjectUrl {
        self.next_id += 1;
        let url = ObjectUrl(format!("blob:photomosaic/{}", self.next_id));
        self.blobs.insert(url.clone(), bytes);
        url
    }

    /// Resolves a live reference.
    pub fn resolve(&self, url: &ObjectUrl) -> Option<&[u8]> {
        self.blobs.get(url).map(Vec::as_slice)
    }

    /// Frees the buffer behind `url`. Returns `false` if it was not live.
    pub fn revoke(&mut self, url: &ObjectUrl) -> bool {
        self.blobs.remove(url).is_some()
    }

    /// Returns the number of live references.
    pub fn live_count(&self) -> usize {
        self.blobs.len()
    }
}

impl fmt::Debug for BlobRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobRegistry")
            .field("next_id", &self.next_id)
            .field("live", &self.blobs.len())
            .finish()
    }
}

/// Owner of the single reference to the latest generated mosaic.
///
/// The previous reference is revoked exactly once: when a new result
/// replaces it, when [`ResultPresenter::release`] is called for a new
/// submission, or when the presenter is dropped.
#[derive(Debug, Default)]
pub struct ResultPresenter {
    registry: BlobRegistry,
    current: Option<ObjectUrl>,
    content_type: Option<String>,
}

impl ResultPresenter {
    /// Creates a presenter with nothing on screen.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows a new result, revoking the one it supersedes.
    pub fn present(&mut self, image: GeneratedImage) -> ObjectUrl {
        self.release();
        let url = self.registry.create(image.bytes);
        debug!("presenting result as {url}");
        self.content_type = image.content_type;
        self.current = Some(url.clone());
        url
    }

    /// Revokes the current reference, if any.
    pub fn release(&mut self) -> bool {
        self.content_type = None;
        match self.current.take() {
            Some(url) => {
                debug!("revoking {url}");
                self.registry.revoke(&url)
            }
            None => false,
        }
    }

    /// Returns the current reference.
    pub fn current(&self) -> Option<&ObjectUrl> {
        self.current.as_ref()
    }

    /// Returns the bytes for inline rendering.
    pub fn inline_bytes(&self) -> Option<&[u8]> {
        self.current
            .as_ref()
            .and_then(|url| self.registry.resolve(url))
    }

    /// Returns the content type the service declared for the current result.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns how many references are live; never more than one.
    pub fn live_references(&self) -> usize {
        self.registry.live_count()
    }

    /// Saves the current result as `mosaic.jpg` inside `dir`.
    ///
    /// # Errors
    /// Returns [`AppError::NothingToDownload`] when no result is shown and
    /// [`AppError::Io`] when the file cannot be written.
    pub fn download(&self, dir: &Path) -> Result<PathBuf, AppError> {
        let bytes = self.inline_bytes().ok_or(AppError::NothingToDownload)?;
        write_file(dir, DOWNLOAD_FILE_NAME, bytes)
    }
}

impl Drop for ResultPresenter {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for reference lifetimes.

    use super::*;

    fn image(fill: u8) -> GeneratedImage {
        GeneratedImage::new(vec![fill; 8], Some("image/jpeg".to_string()))
    }

    #[test]
    fn present_supersedes_previous_reference() {
        let mut presenter = ResultPresenter::new();
        let first = presenter.present(image(1));
        let second = presenter.present(image(2));

        assert_ne!(first, second);
        assert_eq!(presenter.live_references(), 1);
        assert_eq!(presenter.inline_bytes(), Some(&[2; 8][..]));
    }

    #[test]
    fn release_revokes_once() {
        let mut presenter = ResultPresenter::new();
        presenter.present(image(1));
        assert!(presenter.release());
        assert!(!presenter.release());
        assert_eq!(presenter.live_references(), 0);
        assert!(presenter.current().is_none());
        assert!(presenter.content_type().is_none());
    }

    #[test]
    fn registry_revoke_of_unknown_reference_is_noop() {
        let mut registry = BlobRegistry::new();
        let url = registry.create(vec![1]);
        assert!(registry.revoke(&url));
        assert!(!registry.revoke(&url));
        assert!(registry.resolve(&url).is_none());
    }
}
