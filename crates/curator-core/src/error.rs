//! Error types for the curation pipeline.
//!
//! Errors are organized by the component that raises them. Provider errors
//! are per-item and never abort a run; configuration errors block a run from
//! starting; export errors only fail the export action.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for curator operations.
#[derive(Error, Debug)]
pub enum CuratorError {
    /// Configuration-related errors, including unmet start preconditions
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Image queue errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Dataset export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// `start` was called while a run is still in progress
    #[error("A curation run is already in progress")]
    AlreadyRunning,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// The concept is empty or whitespace
    #[error("A concept must be defined before analysis can start")]
    EmptyConcept,

    /// There are no images to analyze
    #[error("The image queue is empty")]
    EmptyQueue,

    /// The provider connection has not been validated successfully
    #[error("The provider connection has not been validated")]
    ConnectionNotValidated,
}

/// Errors raised while building the image queue.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// File could not be read
    #[error("Failed to read {path}: {message}")]
    Read { path: PathBuf, message: String },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Content is not JPEG, PNG or WEBP
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },
}

/// Errors from a single inference call.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider answered with a non-success HTTP status
    #[error("{provider} request failed with status {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    /// The request never produced a response (connect failure, timeout, ...)
    #[error("{provider} request failed: {message}")]
    Transport { provider: String, message: String },

    /// The response was not the expected JSON shape
    #[error("Failed to parse {provider} response: {message}")]
    Parse { provider: String, message: String },

    /// The response contained no text
    #[error("{provider} returned an empty response")]
    EmptyResponse { provider: String },

    /// No credential is available for a provider that requires one
    #[error("A valid API key is required to perform analysis")]
    MissingCredential,
}

impl ProviderError {
    /// HTTP status code, when the failure came from a non-success response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ProviderError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Dataset export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    /// Writing the archive to disk failed
    #[error("Failed to write archive: {0}")]
    Io(#[from] std::io::Error),

    /// The archiver rejected an entry
    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Convenience type alias for curator results.
pub type Result<T> = std::result::Result<T, CuratorError>;

/// Convenience type alias for provider call results.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
