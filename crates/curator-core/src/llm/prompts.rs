//! Prompt text and response parsing shared by both providers.
//!
//! The rubric and the concept-exclusion instructions are sent as context only;
//! nothing here checks that a model actually followed them.

use crate::error::{ProviderError, ProviderResult};
use crate::types::{AnnotationMode, ProviderKind, ScoreOutcome};

/// Five-tier grading guideline sent with every scoring request.
pub const GRADING_RUBRIC: &str = "
- 1.0 (Excellent): The user's concept is the clear, unambiguous, primary subject. High technical quality (in focus, well-lit). Subject is not occluded. Neutral/unobtrusive background.
- 0.8 - 0.9 (Good): The concept is clear but may share focus or have minor occlusions. Good technical quality. A solid, usable training image.
- 0.6 - 0.7 (Average): The concept is present but may be small, part of a group, or in a \"busy\" scene. Still usable, but not ideal.
- 0.4 - 0.5 (Mediocre): The concept is present but heavily occluded, out of focus, or distant. Poor image quality (blurry, noise, watermarks, heavy text).
- 0.1 - 0.3 (Bad): The concept is technically present but not the subject (e.g., tiny in the background). Near-duplicate of another image.
- 0.0 (Very Bad): The concept is not present. The file is corrupted.
";

/// User prompt for schema-constrained scoring.
pub const SCORE_PROMPT: &str = "Analyze the attached image and return a JSON object with a 'score' \
(a float from 0.0 to 1.0) and a 'reason' (a brief justification for the score), based on the \
concept and rubric.";

/// User prompt for scoring when the backend has no structured-output mode.
pub const SCORE_PROMPT_STRICT: &str = "Analyze the attached image and return ONLY a valid JSON \
object with a 'score' (a float from 0.0 to 1.0) and a 'reason' (a brief justification for the \
score), based on the concept and rubric provided in the system prompt.";

/// System instruction embedding the concept and rubric.
pub fn score_system_instruction(concept: &str) -> String {
    format!(
        "You are a LoRA dataset expert. Analyze the attached image for its suitability to train \
         a LoRA for the concept: '{concept}'. Use this rubric:\n{GRADING_RUBRIC}"
    )
}

/// Annotation prompt that forbids mentioning the concept.
///
/// The cloud backend gets a shorter tags prompt; local models are also told
/// not to repeat tags.
pub fn annotation_prompt(kind: ProviderKind, mode: AnnotationMode, concept: &str) -> String {
    match mode {
        AnnotationMode::Caption => format!(
            "Describe this image in a single sentence. IMPORTANT: You must NOT use the words or \
             describe the concept of '{concept}'. Focus only on the background, composition, \
             lighting, and other secondary objects."
        ),
        AnnotationMode::Tags if kind.is_cloud() => format!(
            "List descriptive tags for this image. IMPORTANT: You must NOT include tags related \
             to '{concept}'. Focus only on background, composition, lighting, and other \
             secondary objects. Separate tags with a comma."
        ),
        AnnotationMode::Tags => format!(
            "List descriptive, comma-separated tags for this image. IMPORTANT: Do NOT repeat \
             tags. You must NOT include tags related to '{concept}'. Focus only on background, \
             composition, lighting, and other secondary objects."
        ),
    }
}

/// Post-process raw annotation text for the requested mode.
pub fn finish_annotation(text: &str, mode: AnnotationMode) -> String {
    match mode {
        AnnotationMode::Caption => text.trim().to_string(),
        AnnotationMode::Tags => super::tags::dedup_tags(text),
    }
}

/// Parse a `{score, reason}` object out of model output.
///
/// Tolerates a surrounding Markdown code fence. Scores outside [0, 1] are
/// clamped into range.
pub fn parse_score(text: &str, provider: &str) -> ProviderResult<ScoreOutcome> {
    let json = strip_code_fence(text);
    let mut outcome: ScoreOutcome =
        serde_json::from_str(json).map_err(|e| ProviderError::Parse {
            provider: provider.to_string(),
            message: format!("{e} in {json:?}"),
        })?;

    if !outcome.score.is_finite() {
        return Err(ProviderError::Parse {
            provider: provider.to_string(),
            message: format!("score is not a finite number: {}", outcome.score),
        });
    }
    if !(0.0..=1.0).contains(&outcome.score) {
        tracing::warn!(
            "{provider} returned out-of-range score {}, clamping",
            outcome.score
        );
        outcome.score = outcome.score.clamp(0.0, 1.0);
    }
    Ok(outcome)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence line
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    body.trim_end().trim_end_matches("```").trim()
}
