//! Google Gemini backend (`models/{model}:generateContent`).

use std::time::Duration;

use async_trait::async_trait;

use crate::backend::{check_response_status, LlmBackend, LlmError, LlmRequest, LlmResponse, ResponseFormat};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

pub struct GeminiBackend {
    pub model: String,
    pub base_url: String,
    pub timeout: Option<Duration>,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiBackend {
    /// An empty `api_key` is accepted; the service rejects the call instead.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        )
    }

    /// Translate a chat-style request into Gemini's `contents` body.
    pub fn request_body(req: &LlmRequest) -> serde_json::Value {
        // System message → systemInstruction
        let system_text = req.messages.iter()
            .find(|m| m.role == "system")
            .map(|m| m.content.clone());

        let contents: Vec<serde_json::Value> = req.messages.iter()
            .filter(|m| m.role != "system")
            .map(|m| {
                let role = if m.role == "assistant" { "model" } else { "user" };
                serde_json::json!({
                    "role": role,
                    "parts": [{ "text": m.content }]
                })
            })
            .collect();

        let mut generation_config = serde_json::Map::new();
        if req.response_format == ResponseFormat::Json {
            generation_config.insert("responseMimeType".into(), "application/json".into());
        }
        if let Some(max) = req.max_tokens {
            generation_config.insert("maxOutputTokens".into(), max.into());
        }
        if let Some(t) = req.temperature {
            generation_config.insert("temperature".into(), serde_json::json!(t));
        }

        let mut body = serde_json::json!({ "contents": contents });
        if !generation_config.is_empty() {
            body["generationConfig"] = serde_json::Value::Object(generation_config);
        }
        if let Some(sys) = system_text {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": sys }]
            });
        }
        body
    }
}

#[async_trait]
impl LlmBackend for GeminiBackend {
    async fn complete(&self, req: LlmRequest) -> Result<LlmResponse, LlmError> {
        let model = req.model.as_deref().unwrap_or(&self.model);
        let body = Self::request_body(&req);

        let mut call = self.client
            .post(self.endpoint(model))
            .query(&[("key", self.api_key.as_str())])
            .json(&body);
        if let Some(timeout) = self.timeout {
            call = call.timeout(timeout);
        }

        tracing::debug!(model, "Gemini generateContent request");
        let resp = call.send().await?;
        let json = check_response_status(resp).await?;

        let content: String = json["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(LlmError::EmptyCompletion);
        }

        let prompt_tokens = json["usageMetadata"]["promptTokenCount"]
            .as_u64().unwrap_or(0) as u32;
        let completion_tokens = json["usageMetadata"]["candidatesTokenCount"]
            .as_u64().unwrap_or(0) as u32;

        Ok(LlmResponse {
            content,
            model: json["modelVersion"].as_str().unwrap_or(model).to_string(),
            prompt_tokens,
            completion_tokens,
        })
    }

    fn model_id(&self) -> &str { &self.model }
    fn is_local(&self) -> bool { false }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
