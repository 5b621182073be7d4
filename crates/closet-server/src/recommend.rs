//! Outfit recommendations via the Gemini `generateContent` REST endpoint.
//!
//! The proxy is stateless: one prompt out, one reply back, no retries. The
//! API key and model are resolved per request so that a key added to the
//! environment takes effect without a restart, and a missing key is a 500
//! rather than a startup failure.
//!
//! Reply text is pulled out of a closed set of recognized shapes (see
//! [`CandidateContent`]). When none yields text the caller gets a
//! diagnostic sentence instead of an error.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use closet_shared::constants::{DEFAULT_GEMINI_MODEL, RECOMMENDATION_MAX_OUTPUT_TOKENS};
use closet_shared::protocol::{
    RecommendItem, RecommendRequest, RecommendResponse, StructuredRecommendation,
    TextRecommendation,
};

use crate::error::ServerError;

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeminiCredentials {
    pub api_key: String,
    pub model: String,
}

/// Where the API key and model come from.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// `GEMINI_API_KEY` / `GEMINI_MODEL`, read on every request.
    Env,
    /// Fixed values; `api_key: None` behaves like an unset variable.
    Fixed {
        api_key: Option<String>,
        model: String,
    },
}

impl CredentialSource {
    fn resolve(&self) -> Result<GeminiCredentials, ServerError> {
        let (api_key, model) = match self {
            CredentialSource::Env => (
                std::env::var("GEMINI_API_KEY").ok(),
                std::env::var("GEMINI_MODEL").ok(),
            ),
            CredentialSource::Fixed { api_key, model } => {
                (api_key.clone(), Some(model.clone()))
            }
        };

        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ServerError::Misconfigured("missing API key".into()))?;
        let model = model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string());

        Ok(GeminiCredentials { api_key, model })
    }
}

// ---------------------------------------------------------------------------
// Request body
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    thinking_config: ThinkingConfig,
    response_mime_type: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

impl GenerateContentRequest {
    fn new(prompt: String, response_mime_type: &'static str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 1.0,
                max_output_tokens: RECOMMENDATION_MAX_OUTPUT_TOKENS,
                thinking_config: ThinkingConfig { thinking_budget: 0 },
                response_mime_type,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Response shapes
// ---------------------------------------------------------------------------

/// The shapes a candidate's `content` has been seen in. Fields inside are
/// read leniently: a non-string `text` is skipped, not fatal.
#[derive(Debug)]
enum CandidateContent {
    /// `{ "parts": [{ "text": ... }] }`
    Single(Content),
    /// `[{ "parts": [...] }, ...]`
    Many(Vec<Content>),
    Unrecognized,
}

impl CandidateContent {
    fn classify(value: &Value) -> Self {
        match value {
            Value::Object(_) => CandidateContent::Single(Content::from_value(value)),
            Value::Array(contents) => {
                CandidateContent::Many(contents.iter().map(Content::from_value).collect())
            }
            other => {
                debug!(content = %other, "Unrecognized candidate content");
                CandidateContent::Unrecognized
            }
        }
    }

    fn text(&self) -> Option<String> {
        match self {
            CandidateContent::Single(content) => non_blank(content.joined_text()),
            CandidateContent::Many(contents) => non_blank(
                contents
                    .iter()
                    .map(Content::joined_text)
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            CandidateContent::Unrecognized => None,
        }
    }
}

#[derive(Debug)]
struct Content {
    /// One entry per part; `None` where the part carries no string text.
    parts: Vec<Option<String>>,
}

impl Content {
    fn from_value(value: &Value) -> Self {
        let parts = value
            .get("parts")
            .and_then(Value::as_array)
            .map(|parts| {
                parts
                    .iter()
                    .map(|p| p.get("text").and_then(Value::as_str).map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();
        Content { parts }
    }

    fn joined_text(&self) -> String {
        self.parts
            .iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// What the upstream reply boiled down to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamReply {
    Text(String),
    NoText { finish_reason: Option<String> },
}

impl UpstreamReply {
    /// The reply text, or a diagnostic sentence when there was none.
    /// Never empty.
    pub fn into_text(self) -> String {
        match self {
            UpstreamReply::Text(text) => text,
            UpstreamReply::NoText { finish_reason } => diagnostic_message(finish_reason.as_deref()),
        }
    }
}

fn non_blank(text: String) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Classify a decoded `generateContent` body.
///
/// Order: the first candidate's content (single object, then array form),
/// then the candidate-level `text` field. Later candidates and fields of
/// the wrong type are ignored. Anything else is `NoText`, carrying
/// whichever `finishReason` the body reports.
pub fn extract_reply(body: Value) -> UpstreamReply {
    let finish_reason = body
        .pointer("/candidates/0/finishReason")
        .or_else(|| body.get("finishReason"))
        .and_then(Value::as_str)
        .map(str::to_string);

    // Only the first candidate matters; whatever follows it is never read.
    let Some(candidate) = body.pointer("/candidates/0") else {
        return UpstreamReply::NoText { finish_reason };
    };

    candidate
        .get("content")
        .map(CandidateContent::classify)
        .and_then(|content| content.text())
        .or_else(|| {
            candidate
                .get("text")
                .and_then(Value::as_str)
                .map(str::to_string)
                .and_then(non_blank)
        })
        .map(UpstreamReply::Text)
        .unwrap_or(UpstreamReply::NoText { finish_reason })
}

pub fn diagnostic_message(finish_reason: Option<&str>) -> String {
    let mut msg = String::from("The model returned no text in the expected fields.");
    if let Some(reason) = finish_reason {
        msg.push_str(&format!(" Finish reason: {reason}."));
        if reason == "MAX_TOKENS" {
            msg.push_str(
                " The response was truncated (MAX_TOKENS). Try a shorter request or raise the output token limit.",
            );
        }
    }
    msg
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

pub fn text_prompt(occasion: &str, style: &str) -> String {
    format!(
        "You are a professional fashion stylist. Recommend one outfit using only the \
information below. Do not refer to specific wardrobe items; give general advice \
anyone could follow.

Occasion: {occasion}
Preferred style: {style}

Include: 1) a short description of the outfit (pieces and colors), 2) a brief \
explanation of why it works, and 3) two concise styling tips. Answer in plain text, \
not JSON."
    )
}

pub fn structured_prompt(occasion: &str, style: &str, items: &[RecommendItem]) -> String {
    let mut wardrobe = String::new();
    for (index, item) in items.iter().enumerate() {
        let key = item
            .id
            .clone()
            .unwrap_or_else(|| (index + 1).to_string());
        let details = [&item.category, &item.color, &item.style, &item.brand]
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("; ");
        wardrobe.push_str(&format!("- [{key}] {} ({details})\n", item.name));
    }

    format!(
        "You are a professional fashion stylist. Pick an outfit for the occasion below \
using only items from this wardrobe.

Occasion: {occasion}
Preferred style: {style}

Wardrobe (each line starts with the item key in brackets):
{wardrobe}
Respond with a JSON object with exactly these fields:
  \"recommendedItems\": array of the chosen item keys,
  \"reasoning\": short explanation of why the outfit works,
  \"stylingTips\": array of two concise styling tips."
    )
}

// ---------------------------------------------------------------------------
// Structured reply
// ---------------------------------------------------------------------------

#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct StructuredReply {
    recommended_items: Vec<String>,
    reasoning: String,
    styling_tips: Vec<String>,
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (e.g. "json") on the opening fence line.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().trim_end_matches("```").trim()
}

/// Parse model text as the structured answer; anything that is not the
/// expected JSON object becomes the `reasoning` verbatim.
pub fn parse_structured(text: String) -> StructuredRecommendation {
    match serde_json::from_str::<StructuredReply>(strip_code_fence(&text)) {
        Ok(reply)
            if !reply.reasoning.trim().is_empty()
                || !reply.recommended_items.is_empty()
                || !reply.styling_tips.is_empty() =>
        {
            StructuredRecommendation {
                recommended_items: reply.recommended_items,
                reasoning: reply.reasoning,
                styling_tips: reply.styling_tips,
            }
        }
        _ => StructuredRecommendation {
            recommended_items: Vec::new(),
            reasoning: text,
            styling_tips: Vec::new(),
        },
    }
}

// ---------------------------------------------------------------------------
// Recommender
// ---------------------------------------------------------------------------

pub struct Recommender {
    client: Client,
    base_url: String,
    credentials: CredentialSource,
}

impl Recommender {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ServerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServerError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials: CredentialSource::Env,
        })
    }

    pub fn with_credentials(mut self, credentials: CredentialSource) -> Self {
        self.credentials = credentials;
        self
    }

    /// Validate the request, call the model, and shape the answer.
    pub async fn recommend(
        &self,
        request: &RecommendRequest,
    ) -> Result<RecommendResponse, ServerError> {
        let occasion = request.occasion.trim();
        let style = request.style.trim();
        if occasion.is_empty() || style.is_empty() {
            return Err(ServerError::BadRequest(
                "Missing required fields: occasion and style".into(),
            ));
        }

        let credentials = self.credentials.resolve()?;

        match request.items.as_deref() {
            Some(items) if !items.is_empty() => {
                let prompt = structured_prompt(occasion, style, items);
                let reply = self
                    .generate(&credentials, prompt, "application/json")
                    .await?;
                info!(items = items.len(), "Structured recommendation generated");
                Ok(RecommendResponse::Structured(parse_structured(
                    reply.into_text(),
                )))
            }
            _ => {
                let prompt = text_prompt(occasion, style);
                let reply = self.generate(&credentials, prompt, "text/plain").await?;
                info!("Recommendation generated");
                Ok(RecommendResponse::Text(TextRecommendation {
                    recommendation: reply.into_text(),
                }))
            }
        }
    }

    async fn generate(
        &self,
        credentials: &GeminiCredentials,
        prompt: String,
        response_mime_type: &'static str,
    ) -> Result<UpstreamReply, ServerError> {
        let url = format!("{}/{}:generateContent", self.base_url, credentials.model);
        let body = GenerateContentRequest::new(prompt, response_mime_type);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &credentials.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServerError::Upstream(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            warn!(status = %status, body = %text, "Gemini API error");
            return Err(ServerError::Upstream(format!("status {status}")));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| ServerError::Upstream(format!("unparseable response: {e}")))?;

        let reply = extract_reply(value);
        if let UpstreamReply::NoText { finish_reason } = &reply {
            warn!(finish_reason = ?finish_reason, model = %credentials.model, "Model returned no text");
        }
        Ok(reply)
    }
}
