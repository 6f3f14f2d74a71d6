//! Error types for assetscan.
//!
//! This module defines all error types used throughout the assetscan crate.
//! Each variant maps to one class of failure: query validation, lookups that
//! find nothing, startup data loads, camera sessions, and batch conversion.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for assetscan operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Lookup Errors ===
    /// The query was empty or whitespace-only.
    #[error("please enter an asset tag or QR code")]
    Validation,

    /// No record matched the query.
    #[error("asset not found: \"{query}\"")]
    NotFound {
        /// The query that produced no match.
        query: String,
    },

    /// The lookup mapping could not be loaded at startup.
    #[error("failed to load asset database from {path}: {source}. Please reload.")]
    Load {
        /// Path of the mapping file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The lookup service was initialized a second time.
    #[error("lookup service is already initialized")]
    AlreadyInitialized,

    // === Scan Errors ===
    /// The camera could not be acquired or the decoder failed to start.
    #[error("unable to access camera: {message}")]
    Camera {
        /// Description of what went wrong.
        message: String,
    },

    /// A scan session is already holding the camera.
    #[error("a scan session is already active")]
    ScanInProgress,

    // === Conversion Errors ===
    /// The raw export does not have the expected shape.
    #[error("invalid input format: {message}")]
    Format {
        /// Description of the structural problem.
        message: String,
    },

    /// The raw export could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Source path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The converted output could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Destination path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for assetscan operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new format error.
    #[must_use]
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Create a new camera error.
    #[must_use]
    pub fn camera(message: impl Into<String>) -> Self {
        Self::Camera {
            message: message.into(),
        }
    }

    /// Create a not-found error for the given query.
    #[must_use]
    pub fn not_found(query: impl Into<String>) -> Self {
        Self::NotFound {
            query: query.into(),
        }
    }

    /// Create a load error for the mapping at `path`.
    #[must_use]
    pub fn load(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Load {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Check if this error is an absence signal rather than a fault.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this error came from the camera or decoder.
    #[must_use]
    pub fn is_camera_error(&self) -> bool {
        matches!(self, Self::Camera { .. })
    }

    /// Check if this error should end a batch conversion run.
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::Format { .. })
    }
}
