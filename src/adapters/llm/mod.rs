//! OpenAI-compatible chat-completions adapter for both narrative ports.

mod prompt;

use std::time::Duration;

use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::LlmConfig;
use crate::domain::{ImageAnalysis, ImageType, Narrative};
use crate::ports::{ImageInterpreter, NarrativeError, NarrativeGenerator, NarrativeRequest};

pub use prompt::{narrative_prompt, parse_image_analysis, parse_narrative, strip_code_fence};

const NARRATIVE_TEMPERATURE: f64 = 0.3;
const NARRATIVE_MAX_TOKENS: u32 = 2000;
const IMAGE_TEMPERATURE: f64 = 0.2;
const IMAGE_MAX_TOKENS: u32 = 1500;

/// Blocking client for `POST {base_url}/v1/chat/completions`.
///
/// Without an API key every call fails fast with `NotConfigured`.
pub struct ChatCompletionsClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout_secs: u64,
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionsClient {
    /// Build a client. Must not be called from inside an async context.
    ///
    /// # Errors
    /// `Unreachable` if the HTTP client cannot be constructed.
    pub fn new(config: &LlmConfig) -> Result<Self, NarrativeError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NarrativeError::Unreachable(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
            client,
        })
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn complete(
        &self,
        system: &str,
        user: Value,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String, NarrativeError> {
        let api_key = self.api_key.as_deref().ok_or(NarrativeError::NotConfigured)?;
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "temperature": temperature,
            "max_tokens": max_tokens,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    tracing::warn!("LLM request timed out after {}s", self.timeout_secs);
                    NarrativeError::Timeout
                } else if e.is_connect() {
                    NarrativeError::Unreachable(self.base_url.clone())
                } else {
                    NarrativeError::Unreachable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(NarrativeError::Status(status.as_u16()));
        }

        let parsed: ChatResponse = response.json().map_err(|e| {
            if e.is_timeout() {
                NarrativeError::Timeout
            } else {
                NarrativeError::Malformed(e.to_string())
            }
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| NarrativeError::Malformed("no content in response".into()))
    }
}

impl NarrativeGenerator for ChatCompletionsClient {
    fn generate(&self, request: NarrativeRequest<'_>) -> Result<Narrative, NarrativeError> {
        let user = narrative_prompt(request.prediction, request.patient);
        let content = self.complete(
            prompt::NARRATIVE_SYSTEM,
            Value::String(user),
            NARRATIVE_TEMPERATURE,
            NARRATIVE_MAX_TOKENS,
        )?;
        parse_narrative(&content)
    }
}

impl ImageInterpreter for ChatCompletionsClient {
    fn interpret(
        &self,
        image: &[u8],
        mime_type: &str,
        image_type: ImageType,
    ) -> Result<ImageAnalysis, NarrativeError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image);
        let user = json!([
            {"type": "text", "text": prompt::image_prompt(image_type)},
            {
                "type": "image_url",
                "image_url": {
                    "url": format!("data:{mime_type};base64,{encoded}"),
                    "detail": "high",
                },
            },
        ]);
        let content = self.complete(prompt::IMAGE_SYSTEM, user, IMAGE_TEMPERATURE, IMAGE_MAX_TOKENS)?;
        parse_image_analysis(&content)
    }
}
