//! Provider selection and connection validation shared by `run` and `check`.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use curator_core::{
    Config, ConnectionMonitor, ConnectionStatus, InferenceProvider, KeyState, ProviderFactory,
    ProviderKind,
};

use super::types::Provider;

/// Options selecting and configuring the inference backend.
#[derive(Args, Debug, Default)]
pub struct ProviderArgs {
    /// Inference backend (defaults to provider.kind from the config file)
    #[arg(long, value_enum)]
    pub provider: Option<Provider>,

    /// Cloud API key (defaults to the config value, then GEMINI_API_KEY / API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Override the endpoint of the selected backend
    #[arg(long)]
    pub endpoint: Option<String>,
}

impl ProviderArgs {
    /// Resolve the backend kind and apply the endpoint override to `config`.
    pub fn apply(&self, config: &mut Config) -> ProviderKind {
        let kind = self
            .provider
            .map(ProviderKind::from)
            .unwrap_or(config.provider.kind);

        if let Some(endpoint) = &self.endpoint {
            if kind.is_cloud() {
                config.provider.cloud.endpoint = endpoint.clone();
            } else {
                config.provider.local.endpoint = endpoint.clone();
            }
        }
        kind
    }
}

/// A validated provider ready for use.
pub struct Connection {
    pub provider: Arc<dyn InferenceProvider>,
    pub status: ConnectionStatus,
}

/// Build the selected provider and validate it.
///
/// Fails with a user-facing hint when the backend is unreachable or the
/// key is rejected. An environment key that fails validation is discarded,
/// so the hint asks for one explicitly.
pub async fn connect(args: &ProviderArgs, config: &mut Config) -> anyhow::Result<Connection> {
    let kind = args.apply(config);

    let mut key = if kind.is_cloud() {
        KeyState::resolve(args.api_key.as_deref(), &config.provider.cloud.api_key)
    } else {
        KeyState::user("")
    };
    if kind.is_cloud() && key.is_empty() {
        anyhow::bail!(
            "A valid API key is required to perform analysis.\n\n  \
             Hint: Pass --api-key or set GEMINI_API_KEY."
        );
    }

    let provider = ProviderFactory::create(kind, config, key.key());
    tracing::debug!("Validating connection to {}", provider.name());

    let monitor =
        ConnectionMonitor::new(Duration::from_millis(config.limits.validation_debounce_ms));
    let status = monitor.validate_now(provider.clone()).await;

    if !status.is_valid() {
        if kind.is_cloud() {
            if key.on_invalid() {
                anyhow::bail!(
                    "The API key from the environment was rejected by {}.\n\n  \
                     Hint: Pass a valid key with --api-key.",
                    provider.name()
                );
            }
            anyhow::bail!(
                "The API key was rejected by {}.\n\n  Hint: Check the key and try again.",
                provider.name()
            );
        }
        anyhow::bail!(
            "Could not reach the local server at {}.\n\n  \
             Hint: Start the server and load a vision model, or pass --endpoint.",
            config.provider.local.endpoint
        );
    }

    Ok(Connection { provider, status })
}
