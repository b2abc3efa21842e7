//! Inference backends for scoring and annotating images.
//!
//! Provides a provider abstraction over a cloud backend (Gemini) and a
//! self-hosted OpenAI-compatible server, plus the prompt text and response
//! parsing both share.

pub(crate) mod gemini;
pub(crate) mod local;
pub mod prompts;
pub mod provider;
pub mod tags;

pub use provider::{
    resolve_env_var, ConnectionCheck, ImageInput, InferenceProvider, ProviderFactory,
};
pub use tags::dedup_tags;
