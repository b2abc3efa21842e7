//! Gemini provider using the Generative Language REST API.
//!
//! Scoring uses a response schema so the model is forced to emit
//! `{score, reason}`; annotation is plain text.

use super::prompts;
use super::provider::{ConnectionCheck, ImageInput, InferenceProvider};
use crate::error::{ProviderError, ProviderResult};
use crate::types::{AnnotationMode, ImageItem, ProviderKind, ScoreOutcome};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Cloud provider backed by a Gemini model.
pub struct GeminiProvider {
    kind: ProviderKind,
    endpoint: String,
    api_key: String,
    model: String,
    /// Model used for the lightweight credential check
    validation_model: String,
    name: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl GeminiProvider {
    pub fn new(
        kind: ProviderKind,
        endpoint: &str,
        api_key: &str,
        model: &str,
        validation_model: &str,
        timeout: Duration,
    ) -> Self {
        Self {
            kind,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            validation_model: validation_model.to_string(),
            name: format!("Gemini ({model})"),
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// POST a `generateContent` request and return the concatenated text parts.
    async fn generate(&self, model: &str, request: &GenerateRequest) -> ProviderResult<String> {
        if self.api_key.is_empty() {
            return Err(ProviderError::MissingCredential);
        }

        let url = format!("{}/models/{}:generateContent", self.endpoint, model);
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ProviderError::Transport {
                provider: self.name.clone(),
                message: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider: self.name.clone(),
                status: status.as_u16(),
                body: text,
            });
        }

        let gen_resp: GenerateResponse = resp.json().await.map_err(|e| ProviderError::Parse {
            provider: self.name.clone(),
            message: e.to_string(),
        })?;

        let text: String = gen_resp
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse {
                provider: self.name.clone(),
            });
        }
        Ok(text)
    }

    fn image_parts(prompt: String, image: &ImageInput) -> Vec<Part> {
        vec![
            Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.media_type.clone(),
                    data: image.data.clone(),
                },
            },
            Part::Text { text: prompt },
        ]
    }
}

// --- Request types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: serde_json::Value,
}

impl GenerationConfig {
    fn score_schema() -> Self {
        Self {
            response_mime_type: "application/json".to_string(),
            response_schema: serde_json::json!({
                "type": "OBJECT",
                "properties": {
                    "score": {
                        "type": "NUMBER",
                        "description": "A score from 0.0 to 1.0 based on the rubric."
                    },
                    "reason": {
                        "type": "STRING",
                        "description": "A brief justification for the score."
                    }
                },
                "required": ["score", "reason"]
            }),
        }
    }
}

// --- Response types ---

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[async_trait]
impl InferenceProvider for GeminiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn validate_connection(&self) -> ConnectionCheck {
        if self.api_key.trim().is_empty() {
            return ConnectionCheck::invalid();
        }

        let request = GenerateRequest {
            system_instruction: None,
            contents: vec![Content {
                parts: vec![Part::Text {
                    text: "hello".to_string(),
                }],
            }],
            generation_config: None,
        };

        match self.generate(&self.validation_model, &request).await {
            Ok(_) => ConnectionCheck::valid(Vec::new()),
            Err(e) => {
                tracing::warn!("{} key validation failed: {e}", self.name);
                ConnectionCheck::invalid()
            }
        }
    }

    async fn score_image(&self, image: &ImageItem, concept: &str) -> ProviderResult<ScoreOutcome> {
        let start = Instant::now();
        let input = ImageInput::from_item(image);
        let request = GenerateRequest {
            system_instruction: Some(Content {
                parts: vec![Part::Text {
                    text: prompts::score_system_instruction(concept),
                }],
            }),
            contents: vec![Content {
                parts: Self::image_parts(prompts::SCORE_PROMPT.to_string(), &input),
            }],
            generation_config: Some(GenerationConfig::score_schema()),
        };

        let text = self.generate(&self.model, &request).await?;
        let outcome = prompts::parse_score(&text, &self.name)?;
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
        let request = GenerateRequest {
            system_instruction: None,
            contents: vec![Content {
                parts: Self::image_parts(
                    prompts::annotation_prompt(self.kind, mode, concept),
                    &input,
                ),
            }],
            generation_config: None,
        };

        let text = self.generate(&self.model, &request).await?;
        Ok(prompts::finish_annotation(&text, mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};
    use std::time::UNIX_EPOCH;

    /// (path param, api key header, body) per request
    type Captured = Arc<Mutex<Vec<(String, String, Value)>>>;

    async fn serve(reply: &'static str, status: StatusCode, captured: Captured) -> String {
        let router = Router::new()
            .route(
                "/models/:call",
                post(
                    move |State(captured): State<Captured>,
                          Path(call): Path<String>,
                          headers: HeaderMap,
                          Json(body): Json<Value>| async move {
                        let key = headers
                            .get("x-goog-api-key")
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or_default()
                            .to_string();
                        captured.lock().unwrap().push((call, key, body));
                        if status.is_success() {
                            Json(json!({
                                "candidates": [{ "content": { "parts": [{ "text": reply }] } }]
                            }))
                            .into_response()
                        } else {
                            (status, reply).into_response()
                        }
                    },
                ),
            )
            .with_state(captured);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn provider(endpoint: &str, key: &str, kind: ProviderKind) -> GeminiProvider {
        let model = if kind == ProviderKind::CloudPro {
            "gemini-2.5-pro"
        } else {
            "gemini-2.5-flash"
        };
        GeminiProvider::new(
            kind,
            endpoint,
            key,
            model,
            "gemini-2.5-flash",
            Duration::from_secs(5),
        )
    }

    fn sample_image() -> ImageItem {
        ImageItem::new("/photos/bus.jpg", "image/jpeg", UNIX_EPOCH, vec![0xFF, 0xD8, 0xFF])
    }

    #[tokio::test]
    async fn test_score_sends_schema_and_inline_image() {
        let captured: Captured = Arc::default();
        let base = serve(
            r#"{"score": 0.92, "reason": "bus is the subject"}"#,
            StatusCode::OK,
            captured.clone(),
        )
        .await;

        let outcome = provider(&base, "secret", ProviderKind::CloudPro)
            .score_image(&sample_image(), "school bus")
            .await
            .unwrap();
        assert!((outcome.score - 0.92).abs() < 1e-6);

        let requests = captured.lock().unwrap();
        let (call, key, body) = &requests[0];
        assert_eq!(call, "gemini-2.5-pro:generateContent");
        assert_eq!(key, "secret");
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("'school bus'"));
        assert_eq!(
            body["contents"][0]["parts"][0]["inlineData"]["mimeType"],
            "image/jpeg"
        );
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(
            body["generationConfig"]["responseSchema"]["required"],
            json!(["score", "reason"])
        );
    }

    #[tokio::test]
    async fn test_validate_uses_flash_model() {
        let captured: Captured = Arc::default();
        let base = serve("hi", StatusCode::OK, captured.clone()).await;

        let check = provider(&base, "secret", ProviderKind::CloudPro)
            .validate_connection()
            .await;
        assert_eq!(check, ConnectionCheck::valid(Vec::new()));

        let requests = captured.lock().unwrap();
        assert_eq!(requests[0].0, "gemini-2.5-flash:generateContent");
        assert_eq!(requests[0].2["contents"][0]["parts"][0]["text"], "hello");
    }

    #[tokio::test]
    async fn test_validate_rejected_key_is_invalid() {
        let base = serve("API key not valid", StatusCode::BAD_REQUEST, Arc::default()).await;

        let check = provider(&base, "bad", ProviderKind::CloudFlash)
            .validate_connection()
            .await;
        assert!(!check.is_valid);
    }

    #[tokio::test]
    async fn test_validate_empty_key_makes_no_request() {
        let captured: Captured = Arc::default();
        let base = serve("hi", StatusCode::OK, captured.clone()).await;

        let check = provider(&base, "  ", ProviderKind::CloudFlash)
            .validate_connection()
            .await;
        assert!(!check.is_valid);
        assert!(captured.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_score_without_key_is_missing_credential() {
        let err = provider("http://127.0.0.1:9", "", ProviderKind::CloudFlash)
            .score_image(&sample_image(), "school bus")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredential));
    }

    #[tokio::test]
    async fn test_status_error_surfaces_code() {
        let base = serve("quota exceeded", StatusCode::TOO_MANY_REQUESTS, Arc::default()).await;

        let err = provider(&base, "secret", ProviderKind::CloudFlash)
            .score_image(&sample_image(), "school bus")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), Some(429));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_annotate_tags_deduplicated() {
        let captured: Captured = Arc::default();
        let base = serve("street, dusk, street, trees", StatusCode::OK, captured.clone()).await;

        let tags = provider(&base, "secret", ProviderKind::CloudFlash)
            .annotate_image(&sample_image(), "school bus", AnnotationMode::Tags)
            .await
            .unwrap();
        assert_eq!(tags, "street, dusk, trees");

        let requests = captured.lock().unwrap();
        let body = &requests[0].2;
        assert!(body.get("generationConfig").is_none());
        assert!(body["contents"][0]["parts"][1]["text"]
            .as_str()
            .unwrap()
            .contains("'school bus'"));
    }
}
