//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

use crate::types::{AnnotationMode, ProviderKind};

/// Default curation settings for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurationConfig {
    /// Minimum score for an image to be accepted
    pub threshold: f32,

    /// Annotation style for accepted images
    pub mode: AnnotationMode,

    /// File extensions picked up when scanning directories
    pub supported_formats: Vec<String>,
}

impl Default for CurationConfig {
    fn default() -> Self {
        Self {
            threshold: 0.80,
            mode: AnnotationMode::Caption,
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
            ],
        }
    }
}

/// Inference provider selection and per-backend settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Backend used when none is given on the command line
    pub kind: ProviderKind,

    /// Cloud API settings
    pub cloud: CloudConfig,

    /// Local OpenAI-compatible server settings
    pub local: LocalConfig,
}

/// Cloud vision API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// API base URL
    pub endpoint: String,

    /// Model used for the flash tier and for key validation
    pub flash_model: String,

    /// Model used for the pro tier
    pub pro_model: String,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            api_key: "${GEMINI_API_KEY}".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            flash_model: "gemini-2.5-flash".to_string(),
            pro_model: "gemini-2.5-pro".to_string(),
        }
    }
}

/// Local server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    /// Server base URL (without the /v1 suffix)
    pub endpoint: String,

    /// Model name sent in chat requests; most local servers ignore it
    pub model: String,

    /// Completion token budget per request
    pub max_tokens: u32,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:1234".to_string(),
            model: "local-model".to_string(),
            max_tokens: 512,
        }
    }
}

/// Resource limits and timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum image file size in megabytes
    pub max_file_size_mb: u64,

    /// Timeout for scoring and annotation calls in milliseconds
    pub request_timeout_ms: u64,

    /// Timeout for the local server model discovery call in milliseconds
    pub discovery_timeout_ms: u64,

    /// Quiet period before a connection validation fires
    pub validation_debounce_ms: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 50,
            request_timeout_ms: 120_000,
            discovery_timeout_ms: 90_000,
            validation_debounce_ms: 500,
        }
    }
}

/// Dataset export settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory the archive is written to
    pub output_dir: String,

    /// Archive file name
    pub archive_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: ".".to_string(),
            archive_name: crate::export::ARCHIVE_NAME.to_string(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
