use std::time::Duration;

use log::debug;

use crate::config::{DEFAULT_API_TIMEOUT_SECS, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use crate::error::PipelineError;

const PROMPT_PREFIX: &str = "Summarize this: ";

/// Connection details for the Gemini `generateContent` endpoint
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Debug, Clone)]
pub struct Summarizer {
    client: reqwest::Client,
    settings: GeminiSettings,
}

impl Summarizer {
    pub fn new(client: reqwest::Client, settings: GeminiSettings) -> Self {
        Self { client, settings }
    }

    /// Ask Gemini to summarize `text`.
    ///
    /// Blank input is rejected without calling the API.
    pub async fn summarize(&self, text: &str) -> Result<String, PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::NoText);
        }

        debug!(
            "Summarizing {} characters via Gemini model {}",
            text.len(),
            self.settings.model
        );

        let body = serde_json::json!({
            "contents": [
                {
                    "parts": [
                        { "text": format!("{PROMPT_PREFIX}{text}") }
                    ]
                }
            ]
        });

        let resp = self
            .client
            .post(self.settings.endpoint())
            .query(&[("key", self.settings.api_key.as_str())])
            .timeout(self.settings.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| PipelineError::request(e.without_url()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(PipelineError::Request(format!("Gemini API returned {status}: {body}")));
        }

        let raw = resp.text().await.map_err(|e| PipelineError::request(e.without_url()))?;
        let json: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| PipelineError::ResponseShape(e.to_string()))?;
        extract_summary(&json).map_err(PipelineError::ResponseShape)
    }
}

/// Read `candidates[0].content.parts[0].text` from a `generateContent` response
pub fn extract_summary(json: &serde_json::Value) -> Result<String, String> {
    let candidate = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .ok_or("response has no candidates")?;
    let part = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .ok_or("candidate has no content parts")?;
    let text = part
        .get("text")
        .and_then(|t| t.as_str())
        .ok_or("content part has no text")?;
    Ok(text.to_string())
}
