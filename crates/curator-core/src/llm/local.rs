//! Local server provider using the OpenAI-compatible Chat Completions API.
//!
//! Talks to a self-hosted server (LM Studio and similar) over plain HTTP.
//! Images travel as data URLs in the user message content array. There is
//! no structured-output mode, so score replies are parsed as free text JSON.

use super::prompts;
use super::provider::{ConnectionCheck, ImageInput, InferenceProvider};
use crate::error::{ProviderError, ProviderResult};
use crate::types::{AnnotationMode, ImageItem, ProviderKind, ScoreOutcome};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const PROVIDER_NAME: &str = "Local server";

/// OpenAI-compatible local inference server.
pub struct LocalServerProvider {
    endpoint: String,
    model: String,
    max_tokens: u32,
    client: reqwest::Client,
    request_timeout: Duration,
    discovery_timeout: Duration,
}

impl LocalServerProvider {
    pub fn new(
        endpoint: &str,
        model: &str,
        max_tokens: u32,
        request_timeout: Duration,
        discovery_timeout: Duration,
    ) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            max_tokens,
            client: reqwest::Client::new(),
            request_timeout,
            discovery_timeout,
        }
    }

    /// Discover the models the server has loaded.
    async fn list_models(&self) -> Result<Vec<String>, String> {
        let url = format!("{}/v1/models", self.endpoint);
        let resp = self
            .client
            .get(&url)
            .timeout(self.discovery_timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = resp.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }

        let models: ModelList = resp.json().await.map_err(|e| e.to_string())?;
        Ok(models.data.into_iter().map(|m| m.id).collect())
    }

    /// Send a chat completion and return the first choice's text.
    async fn complete(&self, messages: Vec<ChatMessage>) -> ProviderResult<String> {
        let url = format!("{}/v1/chat/completions", self.endpoint);
        let body = ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
        };

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
                provider: PROVIDER_NAME.to_string(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: PROVIDER_NAME.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        let chat_resp: ChatResponse = resp.json().await.map_err(|e| ProviderError::Parse {
            provider: PROVIDER_NAME.to_string(),
            message: e.to_string(),
        })?;

        let text = chat_resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Parse {
                provider: PROVIDER_NAME.to_string(),
                message: "response has no choices[0].message.content".to_string(),
            })?;

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse {
                provider: PROVIDER_NAME.to_string(),
            });
        }
        Ok(text)
    }

    fn user_message(prompt: String, image: &ImageInput) -> ChatMessage {
        ChatMessage {
            role: "user".to_string(),
            content: MessageContent::Parts(vec![
                ChatContent::Text { text: prompt },
                ChatContent::ImageUrl {
                    image_url: ImageUrl {
                        url: image.data_url(),
                    },
                },
            ]),
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: MessageContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ChatContent>),
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[async_trait]
impl InferenceProvider for LocalServerProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::LocalServer
    }

    async fn validate_connection(&self) -> ConnectionCheck {
        if self.endpoint.is_empty() {
            return ConnectionCheck::invalid();
        }
        match self.list_models().await {
            Ok(models) => {
                tracing::debug!("{PROVIDER_NAME} reports {} model(s)", models.len());
                ConnectionCheck::valid(models)
            }
            Err(e) => {
                tracing::warn!("{PROVIDER_NAME} validation failed for {}: {e}", self.endpoint);
                ConnectionCheck::invalid()
            }
        }
    }

    async fn score_image(&self, image: &ImageItem, concept: &str) -> ProviderResult<ScoreOutcome> {
        let start = Instant::now();
        let input = ImageInput::from_item(image);
        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: MessageContent::Text(prompts::score_system_instruction(concept)),
            },
            Self::user_message(prompts::SCORE_PROMPT_STRICT.to_string(), &input),
        ];

        let text = self.complete(messages).await?;
        let outcome = prompts::parse_score(&text, PROVIDER_NAME)?;
        tracing::debug!(
            "Scored {} at {:.2} in {}ms",
            image.file_name,
            outcome.score,
            start.elapsed().as_millis()
        );
        Ok(outcome)
    }

    async fn annotate_image(
        &self,
        image: &ImageItem,
        concept: &str,
        mode: AnnotationMode,
    ) -> ProviderResult<String> {
        let input = ImageInput::from_item(image);
        let messages = vec![Self::user_message(
            prompts::annotation_prompt(ProviderKind::LocalServer, mode, concept),
            &input,
        )];

        let text = self.complete(messages).await?;
        Ok(prompts::finish_annotation(&text, mode))
    }
}
