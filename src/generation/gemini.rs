use async_trait::async_trait;
use log::{error, info};
use reqwest::Client;
use serde_json::Value;

use super::{GenerationClient, GenerationError, Result};

const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub enum GeminiModel {
    Flash,
    Pro,
    Custom(String),
}

impl GeminiModel {
    pub fn as_str(&self) -> &str {
        match self {
            GeminiModel::Flash => "gemini-1.5-flash",
            GeminiModel::Pro => "gemini-1.5-pro",
            GeminiModel::Custom(s) => s.as_str(),
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "gemini-1.5-flash" | "flash" => Some(GeminiModel::Flash),
            "gemini-1.5-pro" | "pro" => Some(GeminiModel::Pro),
            "" => None,
            other => Some(GeminiModel::Custom(other.to_string())),
        }
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: GeminiModel,
}

impl GeminiClient {
    pub fn new(api_key: String, model: GeminiModel) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model,
        }
    }

    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| GenerationError::Unavailable("GEMINI_API_KEY is not set".to_string()))?;
        Ok(Self::new(api_key, GeminiModel::Flash))
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, prompt: &str, schema: &Value, temperature: f64) -> Result<String> {
        let payload = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": temperature,
                "responseMimeType": "application/json",
                "responseSchema": schema,
            }
        });

        info!(
            "Sending generation request to model {} (temperature {})",
            self.model.as_str(),
            temperature
        );

        let response = self
            .client
            .post(&format!(
                "{}/models/{}:generateContent?key={}",
                self.base_url,
                self.model.as_str(),
                self.api_key
            ))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(REQUEST_TIMEOUT_SECS)
                } else {
                    error!("Generation request failed: {}", e);
                    GenerationError::Unavailable(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(GenerationError::Unavailable(format!(
                "generation API error: {}",
                response.status()
            )));
        }

        let response_json: Value = response.json().await.map_err(|e| {
            GenerationError::Unavailable(format!("unreadable generation response: {}", e))
        })?;

        let text = response_json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                GenerationError::Unavailable("no candidate text in generation response".to_string())
            })?
            .trim()
            .to_string();

        Ok(text)
    }
}
