//! Core data types for the curation pipeline.
//!
//! These types describe the images being curated, the per-run configuration
//! supplied by the caller, and the per-image outcomes the pipeline produces.

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::ConfigError;

/// How accepted images are annotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationMode {
    /// A single descriptive sentence
    #[default]
    Caption,
    /// A comma-separated, deduplicated keyword list
    Tags,
}

impl std::fmt::Display for AnnotationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnnotationMode::Caption => write!(f, "caption"),
            AnnotationMode::Tags => write!(f, "tags"),
        }
    }
}

/// Which inference backend scores and annotates images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Cloud API, fast model
    #[default]
    CloudFlash,
    /// Cloud API, pro model
    CloudPro,
    /// Self-hosted OpenAI-compatible server
    LocalServer,
}

impl ProviderKind {
    /// Whether this backend needs an API key.
    pub fn is_cloud(&self) -> bool {
        matches!(self, ProviderKind::CloudFlash | ProviderKind::CloudPro)
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::CloudFlash => write!(f, "cloud-flash"),
            ProviderKind::CloudPro => write!(f, "cloud-pro"),
            ProviderKind::LocalServer => write!(f, "local-server"),
        }
    }
}

/// An image in the curation queue.
///
/// The raw bytes are shared, so cloning an item (for example into every
/// published result snapshot) never copies image data.
#[derive(Debug, Clone, Serialize)]
pub struct ImageItem {
    /// Stable identity derived from file name and modification time
    pub id: String,

    /// Just the filename portion
    pub file_name: String,

    /// Path the image was loaded from
    pub file_path: PathBuf,

    /// MIME type ("image/jpeg", "image/png", "image/webp")
    pub media_type: String,

    /// File size in bytes
    pub file_size: u64,

    #[serde(skip)]
    bytes: Arc<[u8]>,
}

impl ImageItem {
    /// Create an item from already-loaded file contents.
    pub fn new(
        file_path: impl Into<PathBuf>,
        media_type: impl Into<String>,
        modified: SystemTime,
        bytes: Vec<u8>,
    ) -> Self {
        let file_path = file_path.into();
        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let modified_ms = modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);

        Self {
            id: format!("{file_name}-{modified_ms}"),
            file_name,
            file_path,
            media_type: media_type.into(),
            file_size: bytes.len() as u64,
            bytes: Arc::from(bytes),
        }
    }

    /// Raw file contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Base64 encoding of the raw contents.
    pub fn base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    /// Preview representation: a `data:` URL of the original bytes.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.base64())
    }

    /// File name without its final extension.
    pub fn stem(&self) -> &str {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.file_name)
    }
}

/// Per-run settings supplied by the caller. Immutable while a run is active.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Description of the subject the dataset is curated for
    pub concept: String,

    /// Annotation style for accepted images
    pub mode: AnnotationMode,

    /// Minimum score (inclusive) for an image to be kept
    pub threshold: f32,
}

impl PipelineConfig {
    pub fn new(concept: impl Into<String>, mode: AnnotationMode, threshold: f32) -> Self {
        Self {
            concept: concept.into(),
            mode,
            threshold,
        }
    }

    /// Check the run settings before a run is allowed to start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concept.trim().is_empty() {
            return Err(ConfigError::EmptyConcept);
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ConfigError::ValidationError(format!(
                "threshold must be between 0.0 and 1.0, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Suitability score returned by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    /// Suitability from 0.0 to 1.0
    pub score: f32,

    /// Brief justification for the score
    pub reason: String,
}

/// Outcome classification of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    Pending,
    Accepted,
    Rejected,
    Error,
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Pending => write!(f, "Pending"),
            ItemStatus::Accepted => write!(f, "Accepted"),
            ItemStatus::Rejected => write!(f, "Rejected"),
            ItemStatus::Error => write!(f, "Error"),
        }
    }
}

/// The finalized outcome for one image.
///
/// Only terminal results can be constructed, and an annotation exists
/// exactly when the image was accepted.
#[derive(Debug, Clone, Serialize)]
pub struct ItemResult {
    #[serde(flatten)]
    image: ImageItem,
    status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotation: Option<String>,
}

impl ItemResult {
    pub fn accepted(image: ImageItem, outcome: ScoreOutcome, annotation: String) -> Self {
        Self {
            image,
            status: ItemStatus::Accepted,
            score: Some(outcome.score),
            reason: Some(outcome.reason),
            annotation: Some(annotation),
        }
    }

    pub fn rejected(image: ImageItem, outcome: ScoreOutcome) -> Self {
        Self {
            image,
            status: ItemStatus::Rejected,
            score: Some(outcome.score),
            reason: Some(outcome.reason),
            annotation: None,
        }
    }

    pub fn error(image: ImageItem, message: impl Into<String>) -> Self {
        Self {
            image,
            status: ItemStatus::Error,
            score: None,
            reason: Some(message.into()),
            annotation: None,
        }
    }

    pub fn image(&self) -> &ImageItem {
        &self.image
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn score(&self) -> Option<f32> {
        self.score
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn annotation(&self) -> Option<&str> {
        self.annotation.as_deref()
    }

    pub fn is_accepted(&self) -> bool {
        self.status == ItemStatus::Accepted
    }
}
