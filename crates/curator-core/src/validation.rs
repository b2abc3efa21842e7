//! Connection validation with debouncing and stale-result discarding.
//!
//! Every request bumps a generation counter. A validation task only commits
//! its outcome when its generation is still the newest, so a slow check that
//! was superseded by a later request can never overwrite the later result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::llm::{resolve_env_var, ConnectionCheck, InferenceProvider};

/// Environment variables consulted for a cloud key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

/// Validation state of the currently selected provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No validation has been requested yet
    #[default]
    Unchecked,
    /// A validation is pending or in flight
    Validating,
    /// The provider answered; `models` is only populated by the local server
    Valid { models: Vec<String> },
    Invalid,
}

impl ConnectionStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, ConnectionStatus::Valid { .. })
    }

    pub fn models(&self) -> &[String] {
        match self {
            ConnectionStatus::Valid { models } => models,
            _ => &[],
        }
    }
}

impl From<ConnectionCheck> for ConnectionStatus {
    fn from(check: ConnectionCheck) -> Self {
        if check.is_valid {
            ConnectionStatus::Valid {
                models: check.available_models,
            }
        } else {
            ConnectionStatus::Invalid
        }
    }
}

/// Debounced connection validator.
pub struct ConnectionMonitor {
    debounce: Duration,
    generation: Arc<AtomicU64>,
    status: Arc<watch::Sender<ConnectionStatus>>,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionMonitor {
    pub fn new(debounce: Duration) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Unchecked);
        Self {
            debounce,
            generation: Arc::new(AtomicU64::new(0)),
            status: Arc::new(status),
            pending: Mutex::new(None),
        }
    }

    /// Live view of the connection status.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    pub fn current(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    /// Schedule a validation after the debounce period.
    ///
    /// Any earlier pending or in-flight validation is abandoned. Must be
    /// called from within a tokio runtime.
    pub fn request(&self, provider: Arc<dyn InferenceProvider>) {
        let generation = self.begin();
        let debounce = self.debounce;
        let current = self.generation.clone();
        let status = self.status.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if current.load(Ordering::SeqCst) != generation {
                return;
            }
            let check = provider.validate_connection().await;
            commit(&status, &current, generation, provider.name(), check);
        });

        self.replace_pending(Some(handle));
    }

    /// Validate immediately and return the committed status.
    pub async fn validate_now(&self, provider: Arc<dyn InferenceProvider>) -> ConnectionStatus {
        let generation = self.begin();
        self.replace_pending(None);

        let check = provider.validate_connection().await;
        commit(&self.status, &self.generation, generation, provider.name(), check);
        self.current()
    }

    /// Wait until no validation is pending and return the final status.
    pub async fn settled(&self) -> ConnectionStatus {
        let mut rx = self.status.subscribe();
        let status = match rx
            .wait_for(|s| !matches!(s, ConnectionStatus::Validating))
            .await
        {
            Ok(status) => status.clone(),
            Err(_) => self.current(),
        };
        status
    }

    /// Start a new generation and mark the status as validating.
    fn begin(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.status.send_replace(ConnectionStatus::Validating);
        generation
    }

    fn replace_pending(&self, handle: Option<JoinHandle<()>>) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.take() {
            previous.abort();
        }
        *pending = handle;
    }
}

impl Drop for ConnectionMonitor {
    fn drop(&mut self) {
        self.replace_pending(None);
    }
}

/// Publish `check` only if `generation` is still the newest request.
fn commit(
    status: &watch::Sender<ConnectionStatus>,
    current: &AtomicU64,
    generation: u64,
    provider: &str,
    check: ConnectionCheck,
) {
    let committed = status.send_if_modified(|s| {
        if current.load(Ordering::SeqCst) != generation {
            return false;
        }
        *s = check.into();
        true
    });
    if committed {
        tracing::debug!("{provider} connection: {:?}", *status.borrow());
    } else {
        tracing::trace!("Discarding stale validation result from {provider}");
    }
}

/// Where the cloud API key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Provided by the environment at startup
    Environment,
    /// Entered by the user (flag, config file or prompt)
    User,
}

/// The cloud API key together with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyState {
    key: String,
    source: CredentialSource,
}

impl KeyState {
    /// Resolve the key from, in order: an explicit value, the config value
    /// (which may be a `${VAR}` reference), then [`API_KEY_ENV_VARS`].
    pub fn resolve(explicit: Option<&str>, configured: &str) -> Self {
        if let Some(key) = explicit.filter(|k| !k.trim().is_empty()) {
            return Self::user(key);
        }
        if let Some(key) = resolve_env_var(configured) {
            let source = if configured.starts_with("${") {
                CredentialSource::Environment
            } else {
                CredentialSource::User
            };
            return Self { key, source };
        }
        environment_key(|var| std::env::var(var).ok())
            .map(Self::environment)
            .unwrap_or_else(|| Self::user(""))
    }

    pub fn environment(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: CredentialSource::Environment,
        }
    }

    pub fn user(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: CredentialSource::User,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn is_empty(&self) -> bool {
        self.key.trim().is_empty()
    }

    /// Replace the key with one the user entered.
    pub fn set_user_key(&mut self, key: impl Into<String>) {
        self.key = key.into();
        self.source = CredentialSource::User;
    }

    /// React to a failed validation. An environment key is discarded and the
    /// source switches to user entry; returns `true` when that happened.
    pub fn on_invalid(&mut self) -> bool {
        if self.source != CredentialSource::Environment {
            return false;
        }
        tracing::warn!("API key from the environment is invalid; a key must be entered");
        self.key.clear();
        self.source = CredentialSource::User;
        true
    }
}

/// First non-empty value among [`API_KEY_ENV_VARS`].
fn environment_key(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    API_KEY_ENV_VARS
        .iter()
        .find_map(|var| lookup(var).filter(|v| !v.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderResult;
    use crate::types::{AnnotationMode, ImageItem, ProviderKind, ScoreOutcome};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicU32;

    /// Validation-only mock with a fixed answer and latency.
    struct MockProvider {
        check: ConnectionCheck,
        delay: Duration,
        call_count: Arc<AtomicU32>,
    }

    impl MockProvider {
        fn new(check: ConnectionCheck, delay: Duration) -> Self {
            Self {
                check,
                delay,
                call_count: Arc::new(AtomicU32::new(0)),
            }
        }

        fn call_count_handle(&self) -> Arc<AtomicU32> {
            self.call_count.clone()
        }
    }

    #[async_trait]
    impl InferenceProvider for MockProvider {
        fn name(&self) -> &str {
            "mock"
        }

        fn kind(&self) -> ProviderKind {
            ProviderKind::LocalServer
        }

        async fn validate_connection(&self) -> ConnectionCheck {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.check.clone()
        }

        async fn score_image(&self, _: &ImageItem, _: &str) -> ProviderResult<ScoreOutcome> {
            unreachable!("validation tests never score")
        }

        async fn annotate_image(
            &self,
            _: &ImageItem,
            _: &str,
            _: AnnotationMode,
        ) -> ProviderResult<String> {
            unreachable!("validation tests never annotate")
        }
    }

    fn valid(models: &[&str]) -> ConnectionCheck {
        ConnectionCheck::valid(models.iter().map(|m| m.to_string()).collect())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rapid_requests_validate_once() {
        let monitor = ConnectionMonitor::new(Duration::from_millis(50));
        let provider = MockProvider::new(valid(&["m1"]), Duration::ZERO);
        let calls = provider.call_count_handle();
        let provider: Arc<dyn InferenceProvider> = Arc::new(provider);

        for _ in 0..5 {
            monitor.request(provider.clone());
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(monitor.current(), ConnectionStatus::Validating);

        let status = monitor.settled().await;
        assert_eq!(
            status,
            ConnectionStatus::Valid {
                models: vec!["m1".to_string()]
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_superseded_in_flight_result_is_discarded() {
        let monitor = ConnectionMonitor::new(Duration::from_millis(10));

        // Slow invalid check that will be in flight when superseded
        let slow = MockProvider::new(ConnectionCheck::invalid(), Duration::from_millis(200));
        let slow_calls = slow.call_count_handle();
        monitor.request(Arc::new(slow));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(slow_calls.load(Ordering::SeqCst), 1);

        let fast = MockProvider::new(valid(&["m2"]), Duration::ZERO);
        monitor.request(Arc::new(fast));

        let status = monitor.settled().await;
        assert!(status.is_valid());
        assert_eq!(status.models().to_vec(), vec!["m2".to_string()]);

        // Outlive the slow check; its result must never land
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(monitor.current().is_valid());
    }

    #[tokio::test]
    async fn test_validate_now_skips_debounce() {
        let monitor = ConnectionMonitor::new(Duration::from_secs(60));
        let provider = Arc::new(MockProvider::new(ConnectionCheck::invalid(), Duration::ZERO));

        let status = monitor.validate_now(provider).await;
        assert_eq!(status, ConnectionStatus::Invalid);
        assert_eq!(monitor.settled().await, ConnectionStatus::Invalid);
    }

    #[tokio::test]
    async fn test_validate_now_cancels_pending_request() {
        let monitor = ConnectionMonitor::new(Duration::from_millis(30));
        let pending = MockProvider::new(ConnectionCheck::invalid(), Duration::ZERO);
        let pending_calls = pending.call_count_handle();
        monitor.request(Arc::new(pending));

        let now = Arc::new(MockProvider::new(valid(&[]), Duration::ZERO));
        assert!(monitor.validate_now(now).await.is_valid());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(pending_calls.load(Ordering::SeqCst), 0);
        assert!(monitor.current().is_valid());
    }

    #[tokio::test]
    async fn test_settled_without_pending_returns_current() {
        let monitor = ConnectionMonitor::new(Duration::from_millis(500));
        assert_eq!(monitor.settled().await, ConnectionStatus::Unchecked);
    }

    #[test]
    fn test_environment_key_prefers_api_key() {
        let both = |var: &str| match var {
            "API_KEY" => Some("generic".to_string()),
            "GEMINI_API_KEY" => Some("gemini".to_string()),
            _ => None,
        };
        assert_eq!(environment_key(both).as_deref(), Some("generic"));

        let gemini_only = |var: &str| match var {
            "API_KEY" => Some(String::new()),
            "GEMINI_API_KEY" => Some("gemini".to_string()),
            _ => None,
        };
        assert_eq!(environment_key(gemini_only).as_deref(), Some("gemini"));
        assert_eq!(environment_key(|_| None), None);
    }

    #[test]
    fn test_initial_status_is_unchecked() {
        let monitor = ConnectionMonitor::new(Duration::from_millis(500));
        assert_eq!(monitor.current(), ConnectionStatus::Unchecked);
        assert!(!monitor.current().is_valid());
    }

    #[test]
    fn test_invalid_environment_key_is_cleared() {
        let mut state = KeyState::environment("stale-key");
        assert!(state.on_invalid());
        assert!(state.is_empty());
        assert_eq!(state.source(), CredentialSource::User);

        // A user key is kept for the user to correct
        let mut state = KeyState::user("typo-key");
        assert!(!state.on_invalid());
        assert_eq!(state.key(), "typo-key");
    }

    #[test]
    fn test_explicit_key_wins() {
        let state = KeyState::resolve(Some("from-flag"), "${DEFINITELY_NOT_SET_XYZ_123}");
        assert_eq!(state.key(), "from-flag");
        assert_eq!(state.source(), CredentialSource::User);
    }

    #[test]
    fn test_literal_config_key_is_user_supplied() {
        let state = KeyState::resolve(None, "literal-key");
        assert_eq!(state.key(), "literal-key");
        assert_eq!(state.source(), CredentialSource::User);
    }
}
