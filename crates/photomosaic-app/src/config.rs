//! Runtime configuration resolved from defaults, environment and flags.

use std::path::PathBuf;

use photomosaic_transport::{DEFAULT_SERVICE_URL, TransportError, generate_endpoint};

/// Environment variable overriding the service base URL.
pub const SERVICE_URL_ENV: &str = "PHOTOMOSAIC_SERVICE_URL";
/// Environment variable overriding the download directory.
pub const OUT_DIR_ENV: &str = "PHOTOMOSAIC_OUT_DIR";

/// Resolved runtime settings.
///
/// Precedence, lowest first: built-in defaults, environment, command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Base URL of the mosaic-generation service.
    pub service_url: String,
    /// Directory the generated mosaic is saved into.
    pub out_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            out_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    /// Loads defaults overlaid with non-blank environment values.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(url) = non_blank_env(SERVICE_URL_ENV) {
            config.service_url = url;
        }
        if let Some(dir) = non_blank_env(OUT_DIR_ENV) {
            config.out_dir = PathBuf::from(dir);
        }
        config
    }

    /// Applies command-line overrides.
    pub fn with_overrides(mut self, service_url: Option<String>, out_dir: Option<PathBuf>) -> Self {
        if let Some(url) = service_url {
            self.service_url = url;
        }
        if let Some(dir) = out_dir {
            self.out_dir = dir;
        }
        self
    }

    /// Checks that the service URL resolves to a usable endpoint.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidEndpoint`].
    pub fn validate(&self) -> Result<(), TransportError> {
        generate_endpoint(&self.service_url).map(|_| ())
    }
}

fn non_blank_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
