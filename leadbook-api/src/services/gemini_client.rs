//! Gemini lead generator
//!
//! Asks a generative model for a handful of fictional leads around a
//! location and returns the JSON array it produced. Models like to wrap
//! JSON in markdown fences even when told not to, so those are stripped
//! before parsing.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini errors
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("GEMINI_API_KEY not configured")]
    MissingApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Gemini API error {0}: {1}")]
    Api(u16, String),

    /// Model answered, but not with a JSON array
    #[error("Invalid model output: {0}")]
    InvalidOutput(String),
}

impl From<reqwest::Error> for GeminiError {
    fn from(e: reqwest::Error) -> Self {
        // Error text reaches HTTP callers; never echo the request URL
        GeminiError::Network(e.without_url().to_string())
    }
}

/// A text-in, text-out generative model
#[async_trait]
pub trait TextModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GeminiError>;
}

/// Prompt sent for `location`
pub fn lead_prompt(location: &str) -> String {
    format!(
        r#"Generate 3 fictional but realistic business leads located in {location}.
Ensure the phone numbers are formatted for the region.
The category must be one of: 'Transporte', 'Software', 'Consultoría', 'Industrial', or 'Otros'.

Return ONLY a raw JSON array. Do not include markdown formatting like ```json ... ```.
The JSON objects must have this exact structure:
{{
    "name": "string",
    "address": "string",
    "phone": "string",
    "website": "string",
    "category": "string"
}}"#
    )
}

/// Remove a leading ```` ```json ```` / ```` ``` ```` marker and a trailing
/// ```` ``` ```` marker.
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parse model output into the list of generated leads
pub fn parse_generated_leads(text: &str) -> Result<Vec<Value>, GeminiError> {
    let cleaned = strip_code_fences(text);
    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Array(leads)) => Ok(leads),
        Ok(other) => Err(GeminiError::InvalidOutput(format!(
            "expected a JSON array, got {}",
            other
        ))),
        Err(e) => Err(GeminiError::InvalidOutput(format!("{}: {}", e, cleaned))),
    }
}

/// Generate leads for `location` with `model`
pub async fn generate_leads(model: &dyn TextModel, location: &str) -> Result<Vec<Value>, GeminiError> {
    let text = model.generate(&lead_prompt(location)).await?;
    let leads = parse_generated_leads(&text)?;
    tracing::info!(location, count = leads.len(), "Generated leads");
    Ok(leads)
}

/// Gemini `generateContent` client
pub struct GeminiClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Result<Self, GeminiError> {
        Self::with_base_url(api_key, model, GEMINI_API_BASE_URL.to_string())
    }

    pub fn with_base_url(api_key: String, model: String, base_url: String) -> Result<Self, GeminiError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GeminiError> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let body = json!({"contents": [{"parts": [{"text": prompt}]}]});

        tracing::debug!(model = %self.model, "Calling Gemini");
        let response = self
            .http_client
            .post(url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api(status.as_u16(), text));
        }

        let payload: Value = response.json().await?;
        let text: String = payload["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<Vec<_>>()
                    .concat()
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GeminiError::InvalidOutput("empty response".to_string()));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedModel(&'static str);

    #[async_trait]
    impl TextModel for CannedModel {
        async fn generate(&self, _prompt: &str) -> Result<String, GeminiError> {
            Ok(self.0.to_string())
        }
    }

    const LEADS: &str = r#"[{"name": "Fletes Bajío", "category": "Transporte"}]"#;

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("```\n[1]\n```\n"), "[1]");
        assert_eq!(strip_code_fences("  [1]  "), "[1]");
    }

    #[test]
    fn test_fenced_output_parses_like_plain() {
        let plain = parse_generated_leads(LEADS).unwrap();
        let fenced = parse_generated_leads(&format!("```json\n{}\n```", LEADS)).unwrap();
        assert_eq!(plain, fenced);
        assert_eq!(plain[0]["name"], "Fletes Bajío");
    }

    #[test]
    fn test_non_array_is_invalid() {
        assert!(matches!(
            parse_generated_leads(r#"{"name": "x"}"#),
            Err(GeminiError::InvalidOutput(_))
        ));
        assert!(matches!(
            parse_generated_leads("Lo siento, no puedo"),
            Err(GeminiError::InvalidOutput(_))
        ));
    }

    #[test]
    fn test_prompt_embeds_location() {
        assert!(lead_prompt("Monterrey, NL").contains("located in Monterrey, NL."));
    }

    #[tokio::test]
    async fn test_network_error_hides_api_key() {
        let client = GeminiClient::with_base_url(
            "SECRET_KEY_123".to_string(),
            "gemini-pro".to_string(),
            "http://127.0.0.1:9".to_string(),
        )
        .unwrap();

        let message = client.generate("hola").await.unwrap_err().to_string();

        assert!(!message.contains("SECRET_KEY_123"), "{}", message);
    }

    #[tokio::test]
    async fn test_generate_leads_with_model() {
        let model = CannedModel("```\n[{\"name\": \"A\"}, {\"name\": \"B\"}]\n```");
        let leads = generate_leads(&model, "Puebla").await.unwrap();
        assert_eq!(leads.len(), 2);
    }
}
