//! Inference provider trait and shared request types.
//!
//! Defines the capability interface both backends implement, plus the
//! factory that builds the right backend from a [`ProviderKind`] and config.

use crate::config::Config;
use crate::error::ProviderResult;
use crate::types::{AnnotationMode, ImageItem, ProviderKind, ScoreOutcome};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Base64-encoded image ready to send to an inference API.
#[derive(Debug, Clone)]
pub struct ImageInput {
    /// Base64-encoded image bytes
    pub data: String,
    /// MIME type (e.g., "image/jpeg", "image/png")
    pub media_type: String,
}

impl ImageInput {
    /// Encode a queued image once per call.
    pub fn from_item(image: &ImageItem) -> Self {
        Self {
            data: image.base64(),
            media_type: image.media_type.clone(),
        }
    }

    /// Return a data URL suitable for OpenAI-style APIs.
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// Outcome of a connectivity/credential check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionCheck {
    pub is_valid: bool,
    /// Model identifiers reported by the backend (local server only)
    pub available_models: Vec<String>,
}

impl ConnectionCheck {
    pub fn valid(available_models: Vec<String>) -> Self {
        Self {
            is_valid: true,
            available_models,
        }
    }

    pub fn invalid() -> Self {
        Self::default()
    }
}

/// Capability interface shared by the cloud and local backends.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the pipeline holds an `Arc<dyn InferenceProvider>`).
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Provider name for logs and error messages.
    fn name(&self) -> &str;

    /// Which backend this is.
    fn kind(&self) -> ProviderKind;

    /// Check credentials/reachability. Never fails: any transport or auth
    /// problem is reported as an invalid connection with no models.
    async fn validate_connection(&self) -> ConnectionCheck;

    /// Grade how well the image fits the concept.
    async fn score_image(&self, image: &ImageItem, concept: &str) -> ProviderResult<ScoreOutcome>;

    /// Describe the image while leaving the concept out.
    async fn annotate_image(
        &self,
        image: &ImageItem,
        concept: &str,
        mode: AnnotationMode,
    ) -> ProviderResult<String>;
}

/// Resolve `${ENV_VAR}` references in config strings.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Factory that creates the appropriate provider from a kind and config.
pub struct ProviderFactory;

impl ProviderFactory {
    /// Create a provider.
    ///
    /// # Arguments
    /// * `kind` - Which backend to talk to
    /// * `config` - Full configuration (endpoints, models, timeouts)
    /// * `api_key` - Cloud credential; ignored by the local server
    pub fn create(kind: ProviderKind, config: &Config, api_key: &str) -> Arc<dyn InferenceProvider> {
        let request_timeout = Duration::from_millis(config.limits.request_timeout_ms);
        match kind {
            ProviderKind::CloudFlash | ProviderKind::CloudPro => {
                let cloud = &config.provider.cloud;
                let model = if kind == ProviderKind::CloudPro {
                    &cloud.pro_model
                } else {
                    &cloud.flash_model
                };
                Arc::new(super::gemini::GeminiProvider::new(
                    kind,
                    &cloud.endpoint,
                    api_key,
                    model,
                    &cloud.flash_model,
                    request_timeout,
                ))
            }
            ProviderKind::LocalServer => {
                let local = &config.provider.local;
                Arc::new(super::local::LocalServerProvider::new(
                    &local.endpoint,
                    &local.model,
                    local.max_tokens,
                    request_timeout,
                    Duration::from_millis(config.limits.discovery_timeout_ms),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    #[test]
    fn test_image_input_data_url() {
        let item = ImageItem::new("/tmp/a.jpg", "image/jpeg", UNIX_EPOCH, vec![1, 2, 3]);
        let input = ImageInput::from_item(&item);
        assert_eq!(input.media_type, "image/jpeg");
        assert!(input.data_url().starts_with("data:image/jpeg;base64,"));
        assert_eq!(input.data_url(), item.data_url());
    }

    #[test]
    fn test_resolve_env_var() {
        // Non-env-var strings pass through
        assert_eq!(resolve_env_var("plain-key"), Some("plain-key".to_string()));
        // Empty returns None
        assert_eq!(resolve_env_var(""), None);
        // Unset env var returns None
        assert_eq!(resolve_env_var("${DEFINITELY_NOT_SET_XYZ_123}"), None);
    }

    #[test]
    fn test_factory_selects_backend() {
        let config = Config::default();
        let local = ProviderFactory::create(ProviderKind::LocalServer, &config, "");
        assert_eq!(local.kind(), ProviderKind::LocalServer);

        let pro = ProviderFactory::create(ProviderKind::CloudPro, &config, "key");
        assert_eq!(pro.kind(), ProviderKind::CloudPro);
        assert!(pro.name().contains("gemini-2.5-pro"));
    }
}
