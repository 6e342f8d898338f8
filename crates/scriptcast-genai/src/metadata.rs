//! YouTube metadata generation from a video script.
//!
//! One structured-output request per script: the model is constrained to a
//! JSON schema with `title`, `keywords` and `description`, and the reply is
//! parsed and validated all-or-nothing.

use std::sync::Arc;

use scriptcast_models::GeneratedMetadata;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};
use validator::Validate;

use crate::client::GeminiClient;
use crate::error::{GenAiError, GenAiResult};
use crate::metrics;

/// generateContent request.
#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: Value,
}

/// generateContent response.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: ResponseContent,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

/// Generates title, keywords and description for a script.
pub struct MetadataGenerator {
    client: Arc<GeminiClient>,
}

impl MetadataGenerator {
    pub fn new(client: Arc<GeminiClient>) -> Self {
        Self { client }
    }

    /// Generate metadata for `script`.
    ///
    /// Single round trip, no retries. Fails with `RemoteService` when the
    /// call errors and `MalformedResponse` when the reply does not match the
    /// schema; never returns a partially populated result.
    pub async fn generate_metadata(&self, script: &str) -> GenAiResult<GeneratedMetadata> {
        let model = self.client.config().content_model.clone();
        let result = self.request(&model, script).await;

        match &result {
            Ok(meta) => {
                metrics::record_metadata_request(&model, "ok");
                info!(model = %model, keywords = meta.keywords.len(), "Generated metadata");
                for advisory in meta.advisories() {
                    warn!(model = %model, "Metadata outside recommended bounds: {}", advisory);
                }
            }
            Err(e) => {
                metrics::record_metadata_request(&model, e.kind());
                warn!(model = %model, kind = e.kind(), "Metadata generation failed: {}", e);
            }
        }

        result
    }

    async fn request(&self, model: &str, script: &str) -> GenAiResult<GeneratedMetadata> {
        if script.trim().is_empty() {
            return Err(GenAiError::EmptyScript);
        }

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_metadata_prompt(script),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: metadata_response_schema(),
            },
        };

        let url = self.client.model_url(model, "generateContent");
        let body = self.client.post_json(&url, &request).await?;

        let envelope: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            GenAiError::malformed(format!("unexpected generateContent envelope: {}", e), body.as_str())
        })?;

        let text = envelope
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| GenAiError::malformed("no content in response", body.as_str()))?;

        parse_metadata(text)
    }
}

/// Build the natural-language prompt, embedding the script verbatim.
pub fn build_metadata_prompt(script: &str) -> String {
    format!(
        r#"Based on the following video script, generate an optimized YouTube title, keywords, and description.

Script:
---
{script}
---
"#
    )
}

/// Structured-output schema: all three fields required.
pub fn metadata_response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": {
                "type": "STRING",
                "description": "An eye-catching, SEO-friendly YouTube title, under 60 characters."
            },
            "keywords": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "A list of 10-15 relevant keywords (tags) for the video."
            },
            "description": {
                "type": "STRING",
                "description": "A detailed, well-structured YouTube video description of 200-300 words, including hashtags."
            }
        },
        "required": ["title", "keywords", "description"]
    })
}

/// Parse and validate the model's JSON text.
pub fn parse_metadata(raw: &str) -> GenAiResult<GeneratedMetadata> {
    // Tolerate a markdown code fence around the JSON
    let text = raw.trim();
    let text = text.strip_prefix("```json").unwrap_or(text);
    let text = text.strip_prefix("```").unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);

    let metadata: GeneratedMetadata = serde_json::from_str(text.trim())
        .map_err(|e| GenAiError::malformed(format!("invalid metadata JSON: {}", e), raw))?;

    metadata
        .validate()
        .map_err(|e| GenAiError::malformed(format!("invalid metadata: {}", e), raw))?;

    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_script_verbatim() {
        let script = "Line one\n  indented line two";
        let prompt = build_metadata_prompt(script);
        assert!(prompt.contains("Script:\n---\nLine one\n  indented line two\n---"));
    }

    #[test]
    fn test_schema_requires_all_fields() {
        let schema = metadata_response_schema();
        assert_eq!(schema["required"], json!(["title", "keywords", "description"]));
        assert_eq!(schema["properties"]["keywords"]["items"]["type"], "STRING");
    }

    #[test]
    fn test_parse_exact_payload() {
        let meta = parse_metadata(r#"{"title":"T","keywords":["a","b"],"description":"D"}"#).unwrap();
        assert_eq!(meta.title, "T");
        assert_eq!(meta.keywords, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(meta.description, "D");
    }

    #[test]
    fn test_parse_strips_code_fence() {
        let raw = "```json\n{\"title\":\"T\",\"keywords\":[\"a\"],\"description\":\"D\"}\n```";
        assert_eq!(parse_metadata(raw).unwrap().title, "T");
    }

    #[test]
    fn test_parse_missing_description_is_malformed() {
        let raw = r#"{"title":"T","keywords":["a","b"]}"#;
        let err = parse_metadata(raw).unwrap_err();
        assert!(matches!(err, GenAiError::MalformedResponse { .. }));
        assert_eq!(err.raw_payload(), Some(raw));
    }

    #[test]
    fn test_parse_empty_fields_are_malformed() {
        for raw in [
            r#"{"title":"","keywords":["a"],"description":"D"}"#,
            r#"{"title":"T","keywords":[],"description":"D"}"#,
            r#"{"title":"T","keywords":["a"],"description":""}"#,
            "not json at all",
        ] {
            assert!(
                matches!(parse_metadata(raw), Err(GenAiError::MalformedResponse { .. })),
                "expected malformed for {}",
                raw
            );
        }
    }
}
